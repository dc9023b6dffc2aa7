//! `trend-summary`: top trends and an executive summary from an Intune snapshot

use crate::cmd::render::{parse_trend_response, print_panel, print_table};
use crate::cmd::{ask_llm, print_saved, pull_snapshot, warn_limitations};
use crate::config::AppConfig;
use crate::error::Result;
use crate::graph::snapshot::DEFAULT_SNAPSHOT_TOP;
use crate::graph::{GraphClient, Limitations};
use crate::report::save_report;
use clap::Args;
use colored::Color;

#[derive(Args, Debug)]
pub struct TrendSummaryArgs {
    /// Save output to <reports_dir>/trend_summary_<timestamp>.txt
    #[arg(long)]
    pub save: bool,
}

pub async fn run(config: &AppConfig, args: TrendSummaryArgs) -> Result<()> {
    let mut graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let snapshot = pull_snapshot(&mut graph, &mut limitations, DEFAULT_SNAPSHOT_TOP).await?;
    warn_limitations(&limitations);

    let payload = serde_json::to_string_pretty(&snapshot)?;
    let response = ask_llm(config, "trend_summary", &payload).await?;

    let (rows, executive_summary) = parse_trend_response(&response);
    if rows.is_empty() {
        print_panel("Trend summary", &response, Color::Blue);
    } else {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|(trend, insight, action)| vec![trend, insight, action])
            .collect();
        print_table("Top trends", &["Trend", "Insight", "Suggested Action"], &rows);
    }

    if !executive_summary.is_empty() {
        print_panel("Executive Summary", &executive_summary, Color::Blue);
    }

    if args.save {
        let path = save_report(&config.reports_dir, "trend_summary", &response)?;
        print_saved(&path);
    }

    Ok(())
}
