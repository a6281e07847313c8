//! closure-indent: checks and corrects the indentation of closing closure braces
//!
//! A closure passed to a call should close at the indentation of the line the call
//! started on. This crate provides:
//! - detection over a call/argument structure tree (`rules`)
//! - cascading, offset-safe correction of the text (`correction`)
//! - structure providers: an external SourceKit-style command or tree-sitter-swift

pub mod config;
pub mod correction;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod rules;
pub mod structure;
pub mod suppression;
pub mod text;

use correction::{correct_until_stable, detect, DEFAULT_MAX_PASSES};
use error::LintError;
use models::{CorrectionStatus, LintResult};
use rayon::prelude::*;
use rules::base::LintRule;
use std::path::{Path, PathBuf};
use structure::StructureProvider;
use suppression::{SuppressionIndex, Suppressions};
use text::SourceView;
use walkdir::WalkDir;

/// What to do with each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Report only
    #[default]
    Check,
    /// Rewrite files in place, then report what is left
    Fix { max_passes: usize },
}

impl Mode {
    pub fn fix() -> Self {
        Mode::Fix {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Lint a single file and return the results
pub fn lint_file(
    file_path: &Path,
    rules: &[Box<dyn LintRule>],
    provider: &dyn StructureProvider,
) -> LintResult {
    let path_str = file_path.to_string_lossy().to_string();

    match read_source(file_path) {
        Ok(source) => lint_source(file_path, &source, rules, provider),
        Err(e) => LintResult::with_error(path_str, e.to_string()),
    }
}

/// Lint source code and return the results.
///
/// Violations whose closing brace lies in a suppressed region are dropped.
pub fn lint_source(
    file_path: &Path,
    source: &str,
    rules: &[Box<dyn LintRule>],
    provider: &dyn StructureProvider,
) -> LintResult {
    let path_str = file_path.to_string_lossy().to_string();

    let nodes = match provider.structure(file_path, source) {
        Ok(nodes) => nodes,
        Err(e) => return LintResult::with_error(path_str, LintError::from(e).to_string()),
    };

    let view = SourceView::new(source);
    let suppressions = Suppressions::parse(source);
    let mut result = LintResult::new(path_str);

    result.violations = detect(&result.file_path, &view, &nodes, rules)
        .into_iter()
        .filter(|v| {
            let offset = v.location.offset;
            suppressions.is_active(&v.rule_id, offset..offset + 1)
        })
        .collect();

    result
}

/// Correct a single file in place, then report the violations that remain
pub fn fix_file(
    file_path: &Path,
    rules: &[Box<dyn LintRule>],
    provider: &dyn StructureProvider,
    max_passes: usize,
) -> LintResult {
    let path_str = file_path.to_string_lossy().to_string();

    let source = match read_source(file_path) {
        Ok(source) => source,
        Err(e) => return LintResult::with_error(path_str, e.to_string()),
    };

    let mut persist = |text: &str| {
        std::fs::write(file_path, text).map_err(|source| {
            let kind = source.kind();
            let error = LintError::Write {
                path: file_path.to_path_buf(),
                source,
            };
            std::io::Error::new(kind, error)
        })
    };
    fix_source(file_path, source, rules, provider, max_passes, &mut persist)
}

/// Correct `source` until stable, persisting after every pass, then re-lint the final text
pub fn fix_source(
    file_path: &Path,
    source: String,
    rules: &[Box<dyn LintRule>],
    provider: &dyn StructureProvider,
    max_passes: usize,
    persist: &mut dyn FnMut(&str) -> std::io::Result<()>,
) -> LintResult {
    let outcome = correct_until_stable(file_path, source, rules, provider, max_passes, persist);

    let mut result = lint_source(file_path, &outcome.text, rules, provider);
    result.corrections = outcome.corrections;
    result.status = outcome.status;

    if let CorrectionStatus::Failed(reason) = &result.status {
        if result.error.is_none() {
            result.error = Some(format!("correction stopped: {}", reason));
        }
    }

    result
}

fn read_source(file_path: &Path) -> Result<String, LintError> {
    std::fs::read_to_string(file_path).map_err(|source| LintError::Read {
        path: file_path.to_path_buf(),
        source,
    })
}

/// Collect source files with one of `extensions` from paths
pub fn collect_files(
    paths: &[String],
    extensions: &[String],
    exclude_patterns: &[String],
) -> Vec<PathBuf> {
    let has_extension = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| extensions.iter().any(|ext| ext == e))
    };
    let mut files = Vec::new();

    for path in paths {
        let p = Path::new(path);
        if p.is_file() {
            if has_extension(p) {
                files.push(p.to_path_buf());
            }
        } else if p.is_dir() {
            for entry in WalkDir::new(p)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !should_exclude(e.path(), exclude_patterns))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && has_extension(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            log::warn!("{}: no such file or directory", path);
        }
    }

    files
}

fn should_exclude(path: &Path, patterns: &[String]) -> bool {
    for pattern in patterns {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name == pattern || name.contains(pattern.as_str()) {
                return true;
            }
        }
        // Check if any path component matches
        if path
            .components()
            .any(|c| c.as_os_str().to_str() == Some(pattern.as_str()))
        {
            return true;
        }
    }
    false
}

/// Lint or fix multiple files in parallel
pub fn lint_files_parallel(
    files: &[PathBuf],
    rules: &[Box<dyn LintRule>],
    provider: &dyn StructureProvider,
    mode: Mode,
) -> Vec<LintResult> {
    files
        .par_iter()
        .map(|file| match mode {
            Mode::Check => lint_file(file, rules, provider),
            Mode::Fix { max_passes } => fix_file(file, rules, provider, max_passes),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Node, StructureError, SwiftSyntax};

    fn rules() -> Vec<Box<dyn LintRule>> {
        rules::get_all_rules(models::Severity::Warning)
    }

    #[test]
    fn test_lint_source() {
        let code = "foo(x: 1,\n  y: 2) { bar in\n  baz()\n  }";
        let result = lint_source(Path::new("a.swift"), code, &rules(), &SwiftSyntax);
        assert!(result.error.is_none());
        assert_eq!(result.file_path, "a.swift");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn test_lint_source_respects_suppression() {
        let code = "foo(x: 1,\n  y: 2) { bar in\n  baz()\n  } // closure-indent:disable:this";
        let result = lint_source(Path::new("a.swift"), code, &rules(), &SwiftSyntax);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_lint_source_reports_structure_errors() {
        let failing = |_: &Path, _: &str| -> Result<Vec<Node>, StructureError> {
            Err(StructureError::EmptyCommand)
        };
        let result = lint_source(Path::new("a.swift"), "foo()", &rules(), &failing);
        assert!(result.error.is_some());
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_fix_source() {
        let code = "foo {\n  }.bar {\n}".to_string();
        let mut last = String::new();
        let result = fix_source(
            Path::new("a.swift"),
            code,
            &rules(),
            &SwiftSyntax,
            DEFAULT_MAX_PASSES,
            &mut |text| {
                last = text.to_string();
                Ok(())
            },
        );
        assert!(result.converged());
        assert_eq!(result.corrections.len(), 2);
        assert!(result.violations.is_empty());
        assert_eq!(last, "foo {\n}.bar {\n}");
    }

    #[test]
    fn test_fix_source_reports_write_failure() {
        let code = "foo(x: 1,\n  y: 2) { bar in\n  baz()\n  }".to_string();
        let result = fix_source(
            Path::new("a.swift"),
            code,
            &rules(),
            &SwiftSyntax,
            DEFAULT_MAX_PASSES,
            &mut |_| Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
        );
        assert!(!result.converged());
        assert!(result.error.as_deref().is_some_and(|e| e.contains("disk full")));
        // the original text is re-linted, so the violation is still reported
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn test_should_exclude() {
        let patterns = vec!["Pods".to_string(), "Generated".to_string()];
        assert!(should_exclude(Path::new("App/Pods/Lib.swift"), &patterns));
        assert!(should_exclude(Path::new("App/Model+Generated.swift"), &patterns));
        assert!(!should_exclude(Path::new("App/Sources/View.swift"), &patterns));
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(Mode::default(), Mode::Check);
        assert_eq!(
            Mode::fix(),
            Mode::Fix {
                max_passes: DEFAULT_MAX_PASSES
            }
        );
    }
}
