//! `doc` and `log`: send a local file to the model

use crate::cmd::render::print_panel;
use crate::cmd::{ask_llm, print_saved};
use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use crate::report::save_to;
use clap::Args;
use colored::Color;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_FILE_CHARS: usize = 20_000;

const CONTENT_TRUNCATED: &str = "\n[Content truncated due to size]";
const LOG_TRUNCATED: &str = "\n[Log truncated due to size]";

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Path to the file to read
    pub file: PathBuf,

    /// Save the response to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

/// Read `path` lossily, keeping at most [`MAX_FILE_CHARS`] characters and
/// appending `note` when anything was cut.
pub fn read_truncated(path: &Path, note: &str) -> Result<String> {
    if !path.is_file() {
        return Err(AiItError::FileNotFound(path.display().to_string()));
    }
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);

    match content.char_indices().nth(MAX_FILE_CHARS) {
        Some((cut, _)) => Ok(format!("{}{}", &content[..cut], note)),
        None => Ok(content.into_owned()),
    }
}

async fn run_file_prompt(
    config: &AppConfig,
    args: FileArgs,
    prompt_name: &str,
    note: &str,
    title: &str,
) -> Result<()> {
    let content = read_truncated(&args.file, note)?;
    tracing::debug!(file = %args.file.display(), chars = content.chars().count(), "sending file to model");

    let response = ask_llm(config, prompt_name, &content).await?;
    print_panel(title, &response, Color::Blue);

    if let Some(path) = &args.save {
        save_to(path, &response)?;
        print_saved(path);
    }
    Ok(())
}

/// Structured documentation for a script or configuration file
pub async fn doc(config: &AppConfig, args: FileArgs) -> Result<()> {
    run_file_prompt(config, args, "documentation", CONTENT_TRUNCATED, "Generated Documentation").await
}

/// Root cause and remediation analysis for a log file
pub async fn log(config: &AppConfig, args: FileArgs) -> Result<()> {
    run_file_prompt(config, args, "log_analyzer", LOG_TRUNCATED, "Log Analysis").await
}
