//! `copilot`: free-form IT assistant
//!
//! Prompts that mention Intune topics get a compact snapshot of the tenant
//! appended to the system prompt. Failing to build that context never fails
//! the command.

use crate::cmd::render::print_panel;
use crate::cmd::{generate, print_saved};
use crate::config::AppConfig;
use crate::error::Result;
use crate::graph::snapshot::DEFAULT_SNAPSHOT_TOP;
use crate::graph::{GraphClient, IntuneSnapshot, Limitations};
use crate::prompts::PromptStore;
use crate::report::save_to;
use clap::Args;
use colored::{Color, Colorize};
use std::path::PathBuf;

pub const INTUNE_KEYWORDS: [&str; 8] = [
    "intune",
    "device",
    "compliance",
    "mdm",
    "endpoint",
    "app deployment",
    "configuration",
    "managed",
];

#[derive(Args, Debug)]
pub struct CopilotArgs {
    /// Your request for the IT assistant
    pub prompt: String,

    /// Save the response to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

pub fn mentions_intune(prompt: &str) -> bool {
    let prompt = prompt.to_lowercase();
    INTUNE_KEYWORDS.iter().any(|k| prompt.contains(k))
}

/// Context block appended to the system prompt
pub fn snapshot_context(snapshot: &IntuneSnapshot) -> String {
    let top_os = if snapshot.top_non_compliant_os.is_empty() {
        "none".to_string()
    } else {
        snapshot
            .top_non_compliant_os
            .iter()
            .map(|entry| format!("{} ({})", entry.os, entry.count))
            .collect::<Vec<_>>()
            .join(", ")
    };

    [
        "Current Intune environment snapshot (for context only):".to_string(),
        format!("- Total managed devices: {}", snapshot.total_devices),
        format!(
            "- Compliant: {}, Non-compliant: {}, Unknown: {}",
            snapshot.compliant, snapshot.non_compliant, snapshot.unknown
        ),
        format!("- Top non-compliant OS: {}", top_os),
        format!("- Device configurations: {}", snapshot.config_count),
        format!("- Mobile apps: {}", snapshot.app_count),
    ]
    .join("\n")
}

async fn intune_context(config: &AppConfig, prompt: &str) -> Option<String> {
    if !mentions_intune(prompt) {
        return None;
    }

    let mut graph = match GraphClient::new(config) {
        Ok(graph) => graph,
        Err(e) => {
            tracing::debug!(error = %e, "skipping Intune context");
            return None;
        }
    };

    let mut limitations = Limitations::new();
    let snapshot = graph
        .build_snapshot(&mut limitations, DEFAULT_SNAPSHOT_TOP)
        .await?;
    Some(snapshot_context(&snapshot))
}

pub async fn run(config: &AppConfig, args: CopilotArgs) -> Result<()> {
    let mut system_prompt = PromptStore::from_config(config).load("copilot")?;

    let context = intune_context(config, &args.prompt).await;
    if let Some(block) = &context {
        system_prompt.push_str("\n\n");
        system_prompt.push_str(block);
    }

    let response = generate(config, &system_prompt, &args.prompt).await?;
    print_panel("AI Copilot Response", &response, Color::Blue);

    let status = if context.is_some() { "included" } else { "unavailable" };
    println!("{}", format!("Intune context: {}", status).dimmed());

    if let Some(path) = &args.save {
        save_to(path, &response)?;
        print_saved(path);
    }

    Ok(())
}
