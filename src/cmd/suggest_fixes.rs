//! `suggest-fixes`: remediation suggestions from an Intune snapshot

use crate::cmd::render::{print_panel, section_text};
use crate::cmd::{ask_llm, print_saved, pull_snapshot, warn_limitations};
use crate::config::AppConfig;
use crate::error::Result;
use crate::graph::snapshot::DEFAULT_SNAPSHOT_TOP;
use crate::graph::{GraphClient, Limitations};
use crate::report::save_report;
use clap::Args;
use colored::Color;

const SECTIONS: [(&str, Color); 3] = [
    ("Immediate Actions", Color::Red),
    ("Self-Remediation", Color::Green),
    ("Escalation Required", Color::Yellow),
];

#[derive(Args, Debug)]
pub struct SuggestFixesArgs {
    /// Save output to <reports_dir>/suggest_fixes_<timestamp>.txt
    #[arg(long)]
    pub save: bool,
}

/// The three remediation sections that have content, in display order
pub fn remediation_sections(response: &str) -> Vec<(&'static str, Color, String)> {
    SECTIONS
        .iter()
        .map(|(title, color)| (*title, *color, section_text(response, title)))
        .filter(|(_, _, text)| !text.is_empty())
        .collect()
}

pub async fn run(config: &AppConfig, args: SuggestFixesArgs) -> Result<()> {
    let mut graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let snapshot = pull_snapshot(&mut graph, &mut limitations, DEFAULT_SNAPSHOT_TOP).await?;
    warn_limitations(&limitations);

    let payload = serde_json::to_string_pretty(&snapshot)?;
    let response = ask_llm(config, "suggest_fixes", &payload).await?;

    let sections = remediation_sections(&response);
    if sections.is_empty() {
        print_panel("Remediation Suggestions", &response, Color::Blue);
    }
    for (title, color, text) in &sections {
        print_panel(title, text, *color);
    }

    if args.save {
        let path = save_report(&config.reports_dir, "suggest_fixes", &response)?;
        print_saved(&path);
    }

    Ok(())
}
