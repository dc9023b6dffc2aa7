//! `analyze-log`: local pre-scan of a log tail, then a severity-graded
//! analysis from the model

use crate::cmd::render::{parse_sections, print_panel, print_table};
use crate::cmd::{ask_llm, print_saved};
use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use crate::report::save_report;
use clap::{Args, ValueEnum};
use colored::{Color, Colorize};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DEFAULT_TAIL_LINES: usize = 200;

/// Lines inspected when guessing the log type
const DETECTION_SAMPLE: usize = 50;
const MAX_REPEATED: usize = 3;
const MAX_REPEATED_CHARS: usize = 80;
const TIME_RANGE_CHARS: usize = 30;

const INTUNE_KEYWORDS: [&str; 6] = [
    "EnrollmentService",
    "MDMAgent",
    "IntuneManagement",
    "DeviceManagement",
    "ComplianceEngine",
    "PolicyManager",
];

const MONTHS: &str = "Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("log scan patterns are valid regexes")
}

static SYSLOG_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)\b({})\s+\d{{1,2}}\s+\d{{1,2}}:\d{{2}}:\d{{2}}(?:\s|\.|$)",
        MONTHS
    ))
});

static ISO_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^\s*\d{4}-\d{2}-\d{2}[\sT]\d{2}:\d{2}:\d{2}(?:\.\d+)?\s*")
});

static SYSLOG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^\s*({})\s+\d{{1,2}}\s+\d{{1,2}}:\d{{2}}:\d{{2}}\S*\s*",
        MONTHS
    ))
});

static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(ERROR|Error|error|CRITICAL|FATAL)\b"));

static WARNING_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(WARNING|Warning|WARN)\b"));

static SUSPICIOUS_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("authentication failure", r"authentication failure|failed password|failed login"),
        ("enrollment failed", r"enrollment failed|enrollment error"),
        ("policy not applied", r"policy not applied|policy failed"),
        ("device not compliant", r"device not compliant|compliance failed"),
        ("timeout", r"timeout|connection timed out"),
        ("access denied", r"access denied|permission denied"),
        (
            "certificate issue",
            r"certificate.*(?:expired|invalid|failed)|(?:expired|invalid|failed).*certificate",
        ),
        ("disk space", r"disk.*(?:full|space)|(?:full|space).*disk"),
        ("memory exhausted", r"exhausted|out of memory"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, compile(&format!("(?i){}", pattern))))
    .collect()
});

/// `--type` hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTypeHint {
    Auto,
    Intune,
    Syslog,
}

/// Log type after detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Intune,
    Syslog,
    Generic,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intune => "intune",
            Self::Syslog => "syslog",
            Self::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Critical => Color::Red,
            Self::High | Self::Medium => Color::Yellow,
            Self::Low => Color::Green,
            Self::Unknown => Color::White,
        }
    }
}

static SEVERITY_WORDS: LazyLock<Vec<(Severity, Regex)>> = LazyLock::new(|| {
    [Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
        .into_iter()
        .map(|level| (level, compile(&format!(r"(?i)\b{}\b", level.as_str()))))
        .collect()
});

#[derive(Args, Debug)]
pub struct AnalyzeLogArgs {
    /// Path to the log file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Log format hint
    #[arg(short = 't', long = "type", value_enum, default_value_t = LogTypeHint::Auto)]
    pub log_type: LogTypeHint,

    /// Save output to <reports_dir>/analyze_log_<timestamp>.txt
    #[arg(short, long)]
    pub save: bool,

    /// Max number of log lines sent to the model
    #[arg(short = 'n', long, default_value_t = DEFAULT_TAIL_LINES)]
    pub top: usize,
}

/// Local findings sent alongside the log lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prescan {
    pub error_count: usize,
    pub warning_count: usize,
    pub repeated_messages: Vec<String>,
    pub suspicious_patterns: Vec<&'static str>,
    pub time_range: Option<String>,
}

/// Non-blank, trimmed lines of `content`
pub fn non_blank_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the log type from the hint, or from the first lines when `Auto`
pub fn detect_log_type(lines: &[String], hint: LogTypeHint) -> LogType {
    match hint {
        LogTypeHint::Intune => return LogType::Intune,
        LogTypeHint::Syslog => return LogType::Syslog,
        LogTypeHint::Auto => {}
    }

    let sample = &lines[..lines.len().min(DETECTION_SAMPLE)];
    let joined = sample.join(" ");
    if INTUNE_KEYWORDS.iter().any(|kw| joined.contains(kw)) {
        LogType::Intune
    } else if sample.iter().any(|line| SYSLOG_STAMP.is_match(line)) {
        LogType::Syslog
    } else {
        LogType::Generic
    }
}

/// The last `top` lines
pub fn tail(mut lines: Vec<String>, top: usize) -> Vec<String> {
    let skip = lines.len().saturating_sub(top);
    lines.drain(..skip);
    lines
}

/// Strip a leading ISO or syslog timestamp so repeats of one message group together
pub fn normalize_message(line: &str) -> String {
    let stripped = ISO_PREFIX.replace(line, "");
    let stripped = SYSLOG_PREFIX.replace(&stripped, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        line.to_string()
    } else {
        stripped.to_string()
    }
}

fn most_repeated(lines: &[String]) -> Vec<String> {
    // first-seen order breaks ties
    let mut counts: Vec<(String, usize)> = Vec::new();
    for line in lines {
        let message = normalize_message(line);
        match counts.iter_mut().find(|(m, _)| *m == message) {
            Some((_, count)) => *count += 1,
            None => counts.push((message, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(MAX_REPEATED)
        .map(|(message, _)| {
            if message.chars().count() > MAX_REPEATED_CHARS {
                let kept: String = message.chars().take(MAX_REPEATED_CHARS).collect();
                format!("{}...", kept)
            } else {
                message
            }
        })
        .collect()
}

fn time_range(lines: &[String]) -> Option<String> {
    let first = lines.first()?;
    let last = lines.last()?;
    let head = |line: &str| line.chars().take(TIME_RANGE_CHARS).collect::<String>();
    Some(format!("{} -> {}", head(first), head(last)))
}

/// Count errors and warnings, find repeated messages and known failure patterns
pub fn prescan(lines: &[String]) -> Prescan {
    Prescan {
        error_count: lines.iter().filter(|l| ERROR_LINE.is_match(l)).count(),
        warning_count: lines.iter().filter(|l| WARNING_LINE.is_match(l)).count(),
        repeated_messages: most_repeated(lines),
        suspicious_patterns: SUSPICIOUS_PATTERNS
            .iter()
            .filter(|(_, re)| lines.iter().any(|l| re.is_match(l)))
            .map(|(name, _)| *name)
            .collect(),
        time_range: time_range(lines),
    }
}

/// First severity level named in `text`, checked from most to least severe
pub fn extract_severity(text: &str) -> Severity {
    SEVERITY_WORDS
        .iter()
        .find(|(_, word)| word.is_match(text))
        .map(|(level, _)| *level)
        .unwrap_or(Severity::Unknown)
}

/// Severity from the first section whose title mentions severity
pub fn response_severity(sections: &[(String, String)]) -> Severity {
    sections
        .iter()
        .find(|(title, _)| title.to_lowercase().contains("severity"))
        .map(|(_, content)| extract_severity(content))
        .unwrap_or(Severity::Unknown)
}

fn read_log(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(AiItError::FileNotFound(path.display().to_string()));
    }
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Plain-text report: a header block of local findings, then the model's text
pub fn report_text(
    response: &str,
    scan: &Prescan,
    severity: Severity,
    log_type: LogType,
    line_count: usize,
) -> String {
    format!(
        "Log Analysis Report\nSeverity: {}\nLog type: {}\nLines analyzed: {}\n\
         Errors: {} | Warnings: {}\nTime range: {}\n\n{}",
        severity.as_str(),
        log_type.as_str(),
        line_count,
        scan.error_count,
        scan.warning_count,
        scan.time_range.as_deref().unwrap_or("-"),
        response
    )
}

fn print_prescan(scan: &Prescan) {
    let rows = vec![
        vec!["Errors".to_string(), scan.error_count.to_string()],
        vec!["Warnings".to_string(), scan.warning_count.to_string()],
        vec![
            "Suspicious Patterns".to_string(),
            scan.suspicious_patterns.len().to_string(),
        ],
        vec![
            "Repeated Messages (top 1)".to_string(),
            scan.repeated_messages.first().cloned().unwrap_or_else(|| "-".into()),
        ],
        vec![
            "Time Range".to_string(),
            scan.time_range.clone().unwrap_or_else(|| "-".into()),
        ],
    ];
    print_table("Pre-scan summary", &["Metric", "Value"], &rows);
}

pub async fn run(config: &AppConfig, args: AnalyzeLogArgs) -> Result<()> {
    let content = read_log(&args.file)?;
    let all_lines = non_blank_lines(&content);
    if all_lines.is_empty() {
        return Err(AiItError::Unavailable(
            "Log file is empty or contains no non-blank lines. Nothing to analyze.".into(),
        ));
    }

    let log_type = detect_log_type(&all_lines, args.log_type);
    let lines = tail(all_lines, args.top);
    let scan = prescan(&lines);
    tracing::debug!(
        log_type = log_type.as_str(),
        lines = lines.len(),
        errors = scan.error_count,
        warnings = scan.warning_count,
        "log pre-scan complete"
    );

    let payload = json!({
        "log_type_detected": log_type,
        "line_count": lines.len(),
        "prescan_summary": scan,
        "log_lines": lines,
    });
    let response = ask_llm(config, "analyze_log", &serde_json::to_string_pretty(&payload)?).await?;

    let sections = parse_sections(&response);
    let severity = response_severity(&sections);

    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());
    println!("\n{}", format!("Log Analysis: {}", file_name).blue().bold());
    println!("{}", "=".repeat(60).blue());
    println!(
        "{}",
        format!("● {}", severity.as_str().to_uppercase())
            .color(severity.color())
            .bold()
    );

    print_prescan(&scan);
    for (title, text) in sections.iter().filter(|(_, text)| !text.is_empty()) {
        print_panel(title, text, severity.color());
    }
    println!(
        "{}",
        format!(
            "Lines analyzed: {} | Log type: {} | Model: {}",
            lines.len(),
            log_type.as_str(),
            config.azure_openai_deployment
        )
        .dimmed()
    );

    if args.save {
        let report = report_text(&response, &scan, severity, log_type, lines.len());
        let path = save_report(&config.reports_dir, "analyze_log", &report)?;
        print_saved(&path);
    }

    Ok(())
}
