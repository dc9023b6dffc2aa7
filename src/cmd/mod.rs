//! Command implementations behind the `ai-it` subcommands

pub mod analyze;
pub mod analyze_log;
pub mod copilot;
pub mod doc_intune;
pub mod documentation;
pub mod graph;
pub mod permissions;
pub mod progress;
pub mod render;
pub mod suggest_fixes;
pub mod trend_summary;

use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use crate::graph::{GraphClient, IntuneSnapshot, Limitations};
use crate::llm::ChatClient;
use crate::prompts::PromptStore;
use colored::Colorize;
use progress::{create_spinner, finish_spinner_error, finish_spinner_success};
use std::path::Path;

pub const PERMISSION_MSG: &str =
    "Insufficient Graph API permissions to perform this action. Contact admin.";

pub const SNAPSHOT_UNAVAILABLE: &str =
    "Graph data unavailable (all endpoints failed or no permission). Cannot generate report.";

/// Print the permission warning when any Graph call was downgraded
pub fn warn_limitations(limitations: &Limitations) {
    if !limitations.is_empty() {
        println!("{} {}", "!".yellow(), PERMISSION_MSG.yellow());
    }
}

pub fn print_saved(path: &Path) {
    println!("{} Saved to {}", "✓".green(), path.display());
}

/// Load the named system prompt and send `user_text` to the model
pub async fn ask_llm(config: &AppConfig, prompt_name: &str, user_text: &str) -> Result<String> {
    let system_prompt = PromptStore::from_config(config).load(prompt_name)?;
    generate(config, &system_prompt, user_text).await
}

/// Send an already-built system prompt to the model behind a spinner
pub async fn generate(config: &AppConfig, system_prompt: &str, user_text: &str) -> Result<String> {
    let client = ChatClient::new(config)?;
    let spinner = create_spinner(&format!("Waiting for {}...", client.model()));

    match client.generate(system_prompt, user_text).await {
        Ok(text) => {
            finish_spinner_success(&spinner, "Response received");
            Ok(text)
        }
        Err(e) => {
            finish_spinner_error(&spinner, "Model request failed");
            Err(e)
        }
    }
}

/// Build the Intune snapshot, failing the command when no collection could
/// be read at all.
pub async fn pull_snapshot(
    graph: &mut GraphClient,
    limitations: &mut Limitations,
    top: usize,
) -> Result<IntuneSnapshot> {
    let spinner = create_spinner("Pulling Intune data from Microsoft Graph...");

    match graph.build_snapshot(limitations, top).await {
        Some(snapshot) => {
            finish_spinner_success(
                &spinner,
                &format!(
                    "Snapshot ready: {} devices, {} apps, {} configurations",
                    snapshot.total_devices, snapshot.app_count, snapshot.config_count
                ),
            );
            Ok(snapshot)
        }
        None => {
            finish_spinner_error(&spinner, "No Intune data could be read");
            Err(AiItError::Unavailable(SNAPSHOT_UNAVAILABLE.into()))
        }
    }
}
