//! Lint rules for closure-indent

pub mod base;

// Rule implementations
pub mod closure_end_indentation;

use crate::models::Severity;
use base::LintRule;

/// Get all available rules at the given severity
pub fn get_all_rules(severity: Severity) -> Vec<Box<dyn LintRule>> {
    vec![Box::new(
        closure_end_indentation::ClosureEndIndentationRule::with_severity(severity),
    )]
}
