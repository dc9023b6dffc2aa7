//! Console output helpers and parsing of structured model responses

use colored::{Color, Colorize};
use serde_json::Value;

const RULE_WIDTH: usize = 60;
const MAX_COLUMN_WIDTH: usize = 48;

/// Print `content` under a titled rule, in the given border color
pub fn print_panel(title: &str, content: &str, color: Color) {
    let header = format!("── {} ", title);
    let fill = RULE_WIDTH.saturating_sub(header.chars().count());
    println!("\n{}{}", header.color(color).bold(), "─".repeat(fill).color(color));
    for line in content.trim().lines() {
        println!("  {}", line);
    }
    println!("{}", "─".repeat(RULE_WIDTH).color(color));
}

/// Fixed-width table. Cells longer than the column cap are cut with "...".
pub fn print_table(title: &str, headers: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    println!("\n{}", title.bold());

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<width$}", h.to_uppercase(), width = *w))
        .collect();
    println!("{}", header_line.join("  ").bold());

    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    println!("{}", "-".repeat(total));

    for row in rows {
        let line: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}", truncate(cell, *w), width = *w)
            })
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - 3).collect();
    format!("{}...", kept)
}

/// String field of a Graph object, or "" when absent or not a string
pub fn text_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or("")
}

fn header_title(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("##")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then_some(title)
}

/// Split a response into `(title, content)` pairs on `## ` headers.
///
/// Text without any header becomes a single "Report" section; empty text
/// yields no sections.
pub fn parse_sections(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some(title) = header_title(line) {
            if let Some((t, body)) = current.take() {
                sections.push((t, body.join("\n").trim().to_string()));
            }
            current = Some((title.to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((t, body)) = current {
        sections.push((t, body.join("\n").trim().to_string()));
    }

    if sections.is_empty() && !text.trim().is_empty() {
        sections.push(("Report".to_string(), text.trim().to_string()));
    }
    sections
}

/// Content under `## <header>` (case-insensitive) up to the next `##` header
pub fn section_text(text: &str, header: &str) -> String {
    let wanted = header.trim().to_lowercase();
    let mut lines = text.lines();

    for line in lines.by_ref() {
        let Some(rest) = line.trim_start().strip_prefix("##") else {
            continue;
        };
        if rest.trim().to_lowercase() == wanted {
            break;
        }
    }

    let body: Vec<&str> = lines
        .take_while(|line| header_title(line.trim_start()).is_none())
        .collect();
    body.join("\n").trim().to_string()
}

/// One row of the trend table: trend, insight, suggested action
pub type TrendRow = (String, String, String);

fn is_separator_row(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '-' | '|' | ':') || c.is_whitespace())
}

fn is_column_name(cell: &str) -> bool {
    let cell = cell.to_ascii_lowercase();
    ["trend", "insight", "action"].iter().any(|name| cell.starts_with(name))
}

fn executive_summary(text: &str) -> String {
    const MARKER: &str = "executive summary:";
    let lowered = text.to_ascii_lowercase();
    let Some(start) = lowered.find(MARKER) else {
        return String::new();
    };
    text[start + MARKER.len()..]
        .trim_start()
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Pull the trend table rows and the "Executive Summary:" line out of a
/// trend-summary response.
///
/// Rows come from pipe-delimited lines with at least three cells; leading and
/// trailing pipes are ignored. Separator rows and a header row naming the
/// columns are skipped.
pub fn parse_trend_response(text: &str) -> (Vec<TrendRow>, String) {
    let mut rows = Vec::new();

    for line in text.lines().map(str::trim) {
        if !line.contains('|') || is_separator_row(line) {
            continue;
        }
        let inner = line.strip_prefix('|').unwrap_or(line);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        let cells: Vec<&str> = inner.split('|').map(str::trim).collect();
        if cells.len() < 3 {
            continue;
        }
        if is_column_name(cells[0]) && is_column_name(cells[1]) {
            continue;
        }
        rows.push((cells[0].to_string(), cells[1].to_string(), cells[2].to_string()));
    }

    (rows, executive_summary(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_sections_splits_on_headers() {
        let text = "intro ignored\n## Scope\nAll devices\n\n## Findings\n- one\n- two\n";
        let sections = parse_sections(text);
        assert_eq!(
            sections,
            vec![
                ("Scope".to_string(), "All devices".to_string()),
                ("Findings".to_string(), "- one\n- two".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_sections_without_headers() {
        assert_eq!(
            parse_sections("  plain answer \n"),
            vec![("Report".to_string(), "plain answer".to_string())]
        );
        assert!(parse_sections("   \n").is_empty());
        // ### is not a level-two header
        assert_eq!(parse_sections("### Deep\nx")[0].0, "Report");
    }

    #[test]
    fn test_section_text_is_case_insensitive() {
        let text = "## Immediate Actions\n- patch iOS\n## self-remediation\n- reboot\n## Escalation Required\n- call vendor";
        assert_eq!(section_text(text, "Immediate Actions"), "- patch iOS");
        assert_eq!(section_text(text, "Self-Remediation"), "- reboot");
        assert_eq!(section_text(text, "escalation required"), "- call vendor");
        assert_eq!(section_text(text, "Missing"), "");
    }

    #[test]
    fn test_parse_trend_response() {
        let text = "\
| Trend | Insight | Suggested Action |
|-------|---------|------------------|
| Windows drift | 40% non-compliant | Push update ring |
iOS lag | Old versions | Enforce minimum OS
only | two
Executive Summary: Compliance is slipping on Windows. Act this week.
";
        let (rows, summary) = parse_trend_response(text);
        assert_eq!(
            rows,
            vec![
                (
                    "Windows drift".to_string(),
                    "40% non-compliant".to_string(),
                    "Push update ring".to_string()
                ),
                (
                    "iOS lag".to_string(),
                    "Old versions".to_string(),
                    "Enforce minimum OS".to_string()
                ),
            ]
        );
        assert_eq!(summary, "Compliance is slipping on Windows. Act this week.");
    }

    #[test]
    fn test_executive_summary_on_next_line() {
        let (rows, summary) = parse_trend_response("EXECUTIVE SUMMARY:\n  Stable fleet.\nmore");
        assert!(rows.is_empty());
        assert_eq!(summary, "Stable fleet.");
        assert_eq!(parse_trend_response("no summary here").1, "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_text_field() {
        let item = json!({"displayName": "Alice", "id": 7});
        assert_eq!(text_field(&item, "displayName"), "Alice");
        assert_eq!(text_field(&item, "id"), "");
        assert_eq!(text_field(&item, "missing"), "");
    }
}
