//! `doc-intune`: documentation generated from an Intune snapshot

use crate::cmd::render::{parse_sections, print_panel};
use crate::cmd::{ask_llm, print_saved, pull_snapshot, warn_limitations};
use crate::config::AppConfig;
use crate::error::Result;
use crate::graph::snapshot::DEFAULT_SNAPSHOT_TOP;
use crate::graph::{GraphClient, Limitations};
use crate::report::save_report;
use clap::{Args, ValueEnum};
use colored::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportType {
    Executive,
    Audit,
    Sop,
    ComplianceGap,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Executive => "executive",
            Self::Audit => "audit",
            Self::Sop => "sop",
            Self::ComplianceGap => "compliance-gap",
        }
    }

    pub fn prompt_name(self) -> &'static str {
        match self {
            Self::Executive => "doc_executive",
            Self::Audit => "doc_audit",
            Self::Sop => "doc_sop",
            Self::ComplianceGap => "doc_compliance_gap",
        }
    }

    /// File stem used by `--save`, e.g. `doc_compliance-gap`
    pub fn report_stem(self) -> String {
        format!("doc_{}", self.as_str())
    }
}

#[derive(Args, Debug)]
pub struct DocIntuneArgs {
    /// Report type
    #[arg(long = "type", value_enum, default_value_t = ReportType::Executive)]
    pub report_type: ReportType,

    /// Save output to <reports_dir>/doc_<type>_<timestamp>.txt
    #[arg(long)]
    pub save: bool,

    /// Max devices, apps and configurations to fetch (paginates past 999)
    #[arg(long, default_value_t = DEFAULT_SNAPSHOT_TOP)]
    pub top: usize,
}

pub async fn run(config: &AppConfig, args: DocIntuneArgs) -> Result<()> {
    let mut graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let snapshot = pull_snapshot(&mut graph, &mut limitations, args.top).await?;
    warn_limitations(&limitations);

    let payload = serde_json::to_string_pretty(&snapshot)?;
    let text = ask_llm(config, args.report_type.prompt_name(), &payload).await?;

    if args.report_type == ReportType::Executive {
        print_panel("Executive Summary", &text, Color::Blue);
    } else {
        for (title, content) in parse_sections(&text) {
            if !content.is_empty() {
                print_panel(&title, &content, Color::Blue);
            }
        }
    }

    if args.save {
        let path = save_report(&config.reports_dir, &args.report_type.report_stem(), &text)?;
        print_saved(&path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_names() {
        assert_eq!(ReportType::ComplianceGap.prompt_name(), "doc_compliance_gap");
        assert_eq!(ReportType::ComplianceGap.report_stem(), "doc_compliance-gap");
        assert_eq!(ReportType::Sop.report_stem(), "doc_sop");
    }

    #[test]
    fn test_report_type_parses_kebab_case() {
        let parsed = ReportType::from_str("compliance-gap", true).unwrap();
        assert_eq!(parsed, ReportType::ComplianceGap);
        assert_eq!(ReportType::from_str("Executive", true).unwrap(), ReportType::Executive);
        assert!(ReportType::from_str("weekly", true).is_err());
    }
}
