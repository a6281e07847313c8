//! Reporting adapter
//!
//! Maps violations and corrections to user-facing entries and renders them as grouped,
//! coloured text or as JSON.

use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{LintResult, Severity};
use crate::rules::closure_end_indentation;

/// Rule info with description and fix suggestion
pub struct RuleInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub fix: &'static str,
}

pub fn get_rule_info(rule_id: &str) -> RuleInfo {
    match rule_id {
        closure_end_indentation::RULE_ID => RuleInfo {
            name: "Closure End Indentation",
            description: "The closing brace of a multi-line closure is not at the indentation of the line its call started on.",
            fix: "Align the `}` with the start of the call (or with the `.method {` line of a chain), or run with `--fix`.",
        },
        _ => RuleInfo {
            name: "Unknown Rule",
            description: "Unknown rule violation.",
            fix: "Check the documentation for more information.",
        },
    }
}

/// One reported violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub file: String,
    pub byte_offset: usize,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
}

/// One applied correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionEntry {
    pub file: String,
    pub byte_offset: usize,
    pub line: usize,
    pub column: usize,
    pub rule_id: String,
}

/// Per-severity totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub corrections: usize,
    pub failed_files: usize,
}

impl Summary {
    pub fn from_results(results: &[LintResult]) -> Self {
        let mut summary = Summary::default();
        for result in results {
            for v in &result.violations {
                match v.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
            }
            summary.corrections += result.corrections.len();
            if result.error.is_some() {
                summary.failed_files += 1;
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

/// Report entries for every violation, in file order
pub fn entries(results: &[LintResult]) -> Vec<ReportEntry> {
    let mut entries = Vec::new();

    for result in results {
        if result.violations.is_empty() {
            continue;
        }
        let lines = read_source_lines(&result.file_path);

        for v in &result.violations {
            let source = lines
                .get(v.location.line.saturating_sub(1))
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            entries.push(ReportEntry {
                file: result.file_path.clone(),
                byte_offset: v.location.offset,
                line: v.location.line,
                column: v.location.column,
                severity: v.severity,
                rule_id: v.rule_id.clone(),
                message: v.message.clone(),
                source,
            });
        }
    }

    entries
}

pub fn correction_entries(results: &[LintResult]) -> Vec<CorrectionEntry> {
    results
        .iter()
        .flat_map(|result| {
            result.corrections.iter().map(move |c| CorrectionEntry {
                file: result.file_path.clone(),
                byte_offset: c.location.offset,
                line: c.location.line,
                column: c.location.column,
                rule_id: c.rule_id.clone(),
            })
        })
        .collect()
}

/// Lines of a file, empty when it cannot be read
pub fn read_source_lines(file_path: &str) -> Vec<String> {
    std::fs::read_to_string(file_path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Truncate a source line to `max_chars` characters
pub fn truncate_source_line(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}

/// Grouped, coloured text report
pub fn render_text(results: &[LintResult]) -> String {
    let mut out = String::new();

    for result in results {
        if let Some(error) = &result.error {
            out.push_str(&format!("{}: {}\n", result.file_path.red(), error));
        }
    }

    // Group violations by rule ID
    let mut grouped: BTreeMap<String, Vec<ReportEntry>> = BTreeMap::new();
    for entry in entries(results) {
        grouped.entry(entry.rule_id.clone()).or_default().push(entry);
    }

    for (rule_id, violations) in &grouped {
        let rule_info = get_rule_info(rule_id);
        let count = violations.len();

        let severity = violations.first().map(|v| v.severity).unwrap_or_default();
        let header_color = match severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };

        out.push_str(&format!(
            "\n{} {} - {} ({} occurrence{})\n",
            header_color,
            rule_id.cyan().bold(),
            rule_info.name.white().bold(),
            count,
            if count == 1 { "" } else { "s" }
        ));
        out.push_str(&format!("{}\n", "─".repeat(80).dimmed()));
        out.push_str(&format!("  {} {}\n", "What:".bright_white(), rule_info.description));
        out.push_str(&format!("  {}  {}\n\n", "Fix:".bright_green(), rule_info.fix));

        for v in violations {
            out.push_str(&format!(
                "    {}:{}:{} {}\n",
                v.file.dimmed(),
                v.line.to_string().yellow(),
                v.column,
                v.message
            ));
            if !v.source.is_empty() {
                out.push_str(&format!("      {}\n", v.source.bright_white()));
            }
        }
    }

    let corrections = correction_entries(results);
    if !corrections.is_empty() {
        out.push_str(&format!(
            "\n{} {} closing brace{}\n",
            "corrected".green().bold(),
            corrections.len(),
            if corrections.len() == 1 { "" } else { "s" }
        ));
        for c in &corrections {
            out.push_str(&format!("    {}:{}:{}\n", c.file.dimmed(), c.line, c.column));
        }
    }

    out
}

/// JSON report: violations grouped by rule plus applied corrections
pub fn render_json(results: &[LintResult]) -> serde_json::Value {
    let mut grouped: BTreeMap<String, Vec<ReportEntry>> = BTreeMap::new();
    for entry in entries(results) {
        grouped.entry(entry.rule_id.clone()).or_default().push(entry);
    }

    let rules: Vec<serde_json::Value> = grouped
        .into_iter()
        .map(|(rule_id, violations)| {
            let rule_info = get_rule_info(&rule_id);
            serde_json::json!({
                "rule": rule_id,
                "name": rule_info.name,
                "description": rule_info.description,
                "fix": rule_info.fix,
                "count": violations.len(),
                "violations": violations,
            })
        })
        .collect();

    let errors: Vec<serde_json::Value> = results
        .iter()
        .filter_map(|r| {
            r.error
                .as_ref()
                .map(|e| serde_json::json!({ "file": r.file_path, "error": e }))
        })
        .collect();

    serde_json::json!({
        "rules": rules,
        "corrections": correction_entries(results),
        "errors": errors,
        "summary": Summary::from_results(results),
    })
}
