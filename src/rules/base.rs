//! Base trait for all lint rules

use crate::models::{RuleContext, Violation};

/// Base trait that all lint rules must implement
pub trait LintRule: Send + Sync {
    /// The unique identifier for this rule (e.g., "closure_end_indentation")
    fn rule_id(&self) -> &str;

    /// Short description of what the rule checks
    fn description(&self) -> &str;

    /// Check every node of one structure snapshot.
    ///
    /// Violations returned here feed the correction engine, so their `expected` and
    /// `actual` ranges must refer to the same buffer as `context.source`.
    fn check(&self, context: &RuleContext) -> Vec<Violation>;
}
