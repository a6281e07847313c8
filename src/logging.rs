//! Run log for closure-indent
//!
//! Appends one JSON Lines entry per run (violations left plus corrections applied) to a file
//! for later analysis.

use crate::models::{CorrectionStatus, LintResult, Severity};
use crate::report::{read_source_lines, truncate_source_line};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const MAX_SOURCE_LINE: usize = 200;

/// A single log entry representing one run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// Unix timestamp of when the run happened
    pub timestamp: i64,
    /// ISO 8601 formatted date string
    pub datetime: String,
    /// Run mode (check, fix)
    pub run_mode: String,
    pub files_scanned: usize,
    pub total_violations: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub total_corrections: usize,
    /// Files whose correction loop did not converge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unconverged_files: Vec<String>,
    pub violations: Vec<ViolationLogEntry>,
    pub corrections: Vec<CorrectionLogEntry>,
}

/// Log entry for a single violation
#[derive(Debug, Serialize, Deserialize)]
pub struct ViolationLogEntry {
    pub rule_id: String,
    pub file_path: String,
    pub line: usize,
    pub column: usize,
    pub severity: String,
    pub message: String,
    /// Source line content (truncated if too long)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
}

/// Log entry for a single applied correction
#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectionLogEntry {
    pub rule_id: String,
    pub file_path: String,
    /// Position before the edit
    pub line: usize,
    pub column: usize,
}

impl RunLogEntry {
    /// Create a new log entry from lint results
    pub fn from_results(results: &[LintResult], run_mode: &str) -> Self {
        let now = chrono::Utc::now();

        let mut violations = Vec::new();
        let mut corrections = Vec::new();
        let mut unconverged_files = Vec::new();
        let mut error_count = 0;
        let mut warning_count = 0;
        let mut info_count = 0;

        for result in results {
            let lines = if result.violations.is_empty() {
                Vec::new()
            } else {
                read_source_lines(&result.file_path)
            };

            for v in &result.violations {
                match v.severity {
                    Severity::Error => error_count += 1,
                    Severity::Warning => warning_count += 1,
                    Severity::Info => info_count += 1,
                }

                let source_line = lines
                    .get(v.location.line.saturating_sub(1))
                    .map(|l| l.trim())
                    .filter(|l| !l.is_empty())
                    .map(|l| truncate_source_line(l, MAX_SOURCE_LINE));

                violations.push(ViolationLogEntry {
                    rule_id: v.rule_id.clone(),
                    file_path: result.file_path.clone(),
                    line: v.location.line,
                    column: v.location.column,
                    severity: v.severity.to_string(),
                    message: v.message.clone(),
                    source_line,
                });
            }

            corrections.extend(result.corrections.iter().map(|c| CorrectionLogEntry {
                rule_id: c.rule_id.clone(),
                file_path: result.file_path.clone(),
                line: c.location.line,
                column: c.location.column,
            }));

            if result.status != CorrectionStatus::Converged {
                unconverged_files.push(result.file_path.clone());
            }
        }

        Self {
            timestamp: now.timestamp(),
            datetime: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            run_mode: run_mode.to_string(),
            files_scanned: results.len(),
            total_violations: violations.len(),
            error_count,
            warning_count,
            info_count,
            total_corrections: corrections.len(),
            unconverged_files,
            violations,
            corrections,
        }
    }
}

/// Logger that appends run entries to a file
pub struct RunLogger {
    writer: BufWriter<File>,
    log_path: PathBuf,
}

impl RunLogger {
    /// Open the log for appending, creating it and its parent directories if needed
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path: log_path.to_path_buf(),
        })
    }

    /// Append one run to the file
    pub fn log(&mut self, entry: &RunLogEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Correction, Location};
    use crate::rules::get_all_rules;
    use crate::structure::SwiftSyntax;
    use tempfile::TempDir;

    fn result_for(dir: &TempDir, code: &str) -> LintResult {
        let path = dir.path().join("View.swift");
        std::fs::write(&path, code).unwrap();
        crate::lint_file(&path, &get_all_rules(Severity::Error), &SwiftSyntax)
    }

    #[test]
    fn test_run_log_entry_creation() {
        let dir = TempDir::new().unwrap();
        let mut result = result_for(&dir, "foo(x: 1,\n  y: 2) { bar in\n  baz()\n  }");
        result.corrections.push(Correction {
            rule_id: "closure_end_indentation".to_string(),
            location: Location {
                offset: 0,
                line: 1,
                column: 1,
            },
        });
        result.status = CorrectionStatus::PassLimit;

        let entry = RunLogEntry::from_results(&[result], "fix");

        assert_eq!(entry.files_scanned, 1);
        assert_eq!(entry.total_violations, 1);
        assert_eq!(entry.error_count, 1);
        assert_eq!(entry.warning_count, 0);
        assert_eq!(entry.total_corrections, 1);
        assert_eq!(entry.unconverged_files.len(), 1);
        assert_eq!(entry.run_mode, "fix");

        let violation = &entry.violations[0];
        assert_eq!(violation.line, 4);
        assert_eq!(violation.column, 3);
        assert_eq!(violation.source_line.as_deref(), Some("}"));
    }

    #[test]
    fn test_logger_creation_and_write() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("runs.jsonl");

        let mut logger = RunLogger::new(&log_path).unwrap();
        assert_eq!(logger.log_path(), log_path.as_path());

        logger.log(&RunLogEntry::from_results(&[], "check")).unwrap();
        logger.log(&RunLogEntry::from_results(&[], "fix")).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let entries: Vec<RunLogEntry> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].run_mode, "check");
        assert_eq!(entries[1].run_mode, "fix");
        assert!(entries[0].datetime.ends_with('Z'));
    }
}
