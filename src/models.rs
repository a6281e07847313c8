//! Core data models for closure-indent

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::str::FromStr;

use crate::structure::Node;
use crate::text::SourceView;

/// Severity level of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity `{}` (expected error, warning or info)", other)),
        }
    }
}

/// A position in a buffer: byte offset plus 1-indexed line and character column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn in_source(source: &SourceView, offset: usize) -> Option<Self> {
        let (line, column) = source.line_and_column(offset)?;
        Some(Self {
            offset,
            line,
            column,
        })
    }
}

/// Indentation of one line as seen by the rule.
///
/// For the expected side `span` is the line's leading whitespace; for the actual side it
/// runs from the line start up to the closing brace. `width` counts characters in `span`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndentationRange {
    pub line: usize,
    /// Full content range of the line
    pub line_range: Range<usize>,
    pub span: Range<usize>,
    pub width: usize,
}

impl IndentationRange {
    /// Leading whitespace of `line`
    pub fn leading(source: &SourceView, line: usize) -> Option<Self> {
        let line_range = source.line_range(line)?;
        let (span, width) = source.indentation(line)?;
        Some(Self {
            line,
            line_range,
            span,
            width,
        })
    }

    /// Everything on `line` before `offset`
    pub fn before(source: &SourceView, line: usize, offset: usize) -> Option<Self> {
        let line_range = source.line_range(line)?;
        if offset < line_range.start || offset > line_range.end {
            return None;
        }
        let width = source.slice(line_range.start..offset)?.chars().count();
        Some(Self {
            line,
            span: line_range.start..offset,
            line_range,
            width,
        })
    }
}

/// A closing brace whose column does not match the line its call started on
#[derive(Debug, Clone)]
pub struct Violation {
    pub rule_id: String,
    pub message: String,
    /// Position of the closing brace
    pub location: Location,
    pub severity: Severity,
    pub expected: IndentationRange,
    pub actual: IndentationRange,
    /// Byte span of the whole call
    pub range: Range<usize>,
}

/// One applied edit. `location` is the pre-edit position of the rewritten span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub rule_id: String,
    pub location: Location,
}

/// Context passed to each rule for checking
pub struct RuleContext<'a> {
    pub nodes: &'a [Node],
    pub file_path: &'a str,
    pub source: &'a SourceView<'a>,
}

/// How a detect-correct cycle ended
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorrectionStatus {
    /// The last pass found nothing eligible
    #[default]
    Converged,
    /// The pass cap was reached with violations left
    PassLimit,
    /// A pass found violations but none of its edits could be applied
    Stalled,
    /// Structure lookup or persistence failed between passes
    Failed(String),
}

/// Result of linting a single file
#[derive(Debug, Default)]
pub struct LintResult {
    pub file_path: String,
    pub violations: Vec<Violation>,
    pub corrections: Vec<Correction>,
    pub status: CorrectionStatus,
    pub error: Option<String>,
}

impl LintResult {
    pub fn new(file_path: String) -> Self {
        Self {
            file_path,
            ..Default::default()
        }
    }

    pub fn with_error(file_path: String, error: String) -> Self {
        Self {
            file_path,
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn converged(&self) -> bool {
        self.status == CorrectionStatus::Converged
    }
}
