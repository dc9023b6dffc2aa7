//! `check-permissions`: probe every registered Graph endpoint once

use crate::cmd::print_saved;
use crate::cmd::render::truncate;
use crate::config::AppConfig;
use crate::error::Result;
use crate::graph::{GraphClient, ProbeStatus, endpoint_registry};
use crate::report::save_report;
use chrono::Local;
use clap::Args;
use colored::{ColoredString, Colorize};

#[derive(Args, Debug)]
pub struct CheckPermissionsArgs {
    /// Save a plain-text report to <reports_dir>/check_permissions_<timestamp>.txt
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRow {
    pub area: String,
    pub endpoint: String,
    pub status: ProbeStatus,
    pub note: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeCounts {
    pub available: usize,
    pub denied: usize,
    pub errors: usize,
}

impl ProbeCounts {
    pub fn tally(rows: &[ProbeRow]) -> Self {
        rows.iter().fold(Self::default(), |mut counts, row| {
            match row.status {
                ProbeStatus::Available => counts.available += 1,
                ProbeStatus::Denied => counts.denied += 1,
                ProbeStatus::Error => counts.errors += 1,
            }
            counts
        })
    }
}

pub fn summary_line(checked: usize, counts: ProbeCounts) -> String {
    format!(
        "Checked {} endpoints. Available: {}  |  Denied: {}  |  Errors: {}",
        checked, counts.available, counts.denied, counts.errors
    )
}

fn status_label(status: ProbeStatus) -> &'static str {
    match status {
        ProbeStatus::Available => "✓ Available",
        ProbeStatus::Denied => "✗ Denied",
        ProbeStatus::Error => "⚠ Error",
    }
}

fn colored_status(status: ProbeStatus) -> ColoredString {
    let label = format!("{:<12}", status_label(status));
    match status {
        ProbeStatus::Available => label.green(),
        ProbeStatus::Denied => label.red(),
        ProbeStatus::Error => label.yellow(),
    }
}

/// Tab-separated report written by `--save`
pub fn plain_report(rows: &[ProbeRow], summary: &str, probed_at: &str, tenant_preview: &str) -> String {
    let mut lines = vec![
        "Graph Permission Check".to_string(),
        String::new(),
        "Permission Area\tEndpoint\tStatus\tNotes".to_string(),
        String::new(),
    ];
    lines.extend(rows.iter().map(|row| {
        format!(
            "{}\t{}\t{}\t{}",
            row.area,
            row.endpoint,
            status_label(row.status),
            row.note
        )
    }));
    lines.push(String::new());
    lines.push(summary.to_string());
    lines.push(String::new());
    lines.push(format!("Probed at {} | Tenant: {}", probed_at, tenant_preview));
    lines.join("\n")
}

pub async fn run(config: &AppConfig, args: CheckPermissionsArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let tenant_preview = config.tenant_preview();
    let registry = endpoint_registry();

    println!("\n{}", "Graph Permission Check".blue().bold());
    println!("{}", "═".repeat(100).blue());
    println!(
        "{:<24} {:<36} {:<12} {}",
        "PERMISSION AREA".bold(),
        "ENDPOINT".bold(),
        "STATUS".bold(),
        "NOTES".bold()
    );
    println!("{}", "-".repeat(100));

    let mut rows = Vec::with_capacity(registry.len());
    let mut all_granted_ok = true;

    for (i, descriptor) in registry.iter().enumerate() {
        let (status, note) = graph.probe_endpoint(descriptor).await;
        if descriptor.currently_granted && status != ProbeStatus::Available {
            all_granted_ok = false;
        }

        let endpoint = truncate(descriptor.short_path(), 36);
        let line = format!("{:<24} {:<36}", descriptor.area, endpoint);
        let line = if i % 2 == 1 { line.dimmed() } else { line.normal() };
        println!("{} {} {}", line, colored_status(status), note.green());

        rows.push(ProbeRow {
            area: descriptor.area.to_string(),
            endpoint,
            status,
            note,
        });
    }

    let summary = summary_line(registry.len(), ProbeCounts::tally(&rows));
    println!("{}", "-".repeat(100));
    if all_granted_ok {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.yellow().bold());
    }

    let probed_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    println!(
        "{}",
        format!("Probed at {} | Tenant: {}", probed_at, tenant_preview).dimmed()
    );

    if args.save {
        let report = plain_report(&rows, &summary, &probed_at, &tenant_preview);
        let path = save_report(&config.reports_dir, "check_permissions", &report)?;
        print_saved(&path);
    }

    Ok(())
}
