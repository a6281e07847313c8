//! closure_end_indentation: Closure End Indentation
//!
//! The closing brace of a closure passed to a call sits at the indentation of the line the
//! call started on. For a chained call that line is the continuation line (`.map {`), not
//! the line holding the start of the chain.

use crate::models::{IndentationRange, Location, RuleContext, Severity, Violation};
use crate::rules::base::LintRule;
use crate::structure::{query, Node};
use crate::text::SourceView;

pub const RULE_ID: &str = "closure_end_indentation";

const DESCRIPTION: &str = "Closure end should have the same indentation as the line that started it";

pub struct ClosureEndIndentationRule {
    severity: Severity,
}

impl ClosureEndIndentationRule {
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    pub fn with_severity(severity: Severity) -> Self {
        Self { severity }
    }

    /// Post-order walk: nested calls first, then the node's own closure and its arguments.
    fn visit(&self, node: &Node, source: &SourceView, violations: &mut Vec<Violation>) {
        for child in node.children() {
            self.visit(child, source, violations);
        }

        if !query::is_call(node) {
            return;
        }

        if let Some(violation) = self.validate_call(node, source) {
            violations.push(violation);
        }
        violations.extend(self.validate_arguments(node, source));
    }

    /// The call's trailing closure, or the closure that is its final argument
    fn validate_call(&self, call: &Node, source: &SourceView) -> Option<Violation> {
        let start = query::logical_start_offset(call, source)?;
        let closure = query::trailing_closure(call, source).unwrap_or(call);
        self.validate(call, start, closure, source)
    }

    /// Closure arguments of a call whose argument list starts on its own line
    fn validate_arguments(&self, call: &Node, source: &SourceView) -> Vec<Violation> {
        if !query::is_first_argument_on_newline(call, source) {
            return Vec::new();
        }

        let mut closures = query::closure_arguments(call, source);
        // the last one is the trailing closure, checked as the call's own closure
        if query::has_trailing_closure(call, source) && closures.len() > 1 {
            closures.pop();
        }

        closures
            .into_iter()
            .filter_map(|argument| self.validate(argument, argument.offset, argument, source))
            .collect()
    }

    /// Shared eligibility test and comparison. `node` supplies the name, body and end of
    /// the span being checked, `start` the line it should align with, `closure` the body
    /// used for the single-line carve-out.
    fn validate(
        &self,
        node: &Node,
        start: usize,
        closure: &Node,
        source: &SourceView,
    ) -> Option<Violation> {
        let body = node.body?;
        let name = node.name?;
        if body.length == 0 {
            return None;
        }

        let end_offset = node.end().checked_sub(1)?;
        if source.byte_at(end_offset)? != b'}' {
            return None;
        }

        let start_line = source.line_of(start)?;
        let (end_line, end_column) = source.line_and_column(end_offset)?;
        let name_end_line = source.line_of(name.end())?;
        if start_line == end_line || name_end_line == end_line {
            return None;
        }
        if query::is_single_line_closure(closure, end_offset, source) {
            return None;
        }

        let expected = IndentationRange::leading(source, start_line)?;
        let actual = IndentationRange::before(source, end_line, end_offset)?;
        debug_assert_eq!(actual.width, end_column - 1);
        if expected.width == actual.width {
            return None;
        }

        Some(Violation {
            rule_id: RULE_ID.to_string(),
            message: format!(
                "{}; expected {}, got {}",
                DESCRIPTION, expected.width, actual.width
            ),
            location: Location {
                offset: end_offset,
                line: end_line,
                column: end_column,
            },
            severity: self.severity,
            expected,
            actual,
            range: node.range(),
        })
    }
}

impl Default for ClosureEndIndentationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRule for ClosureEndIndentationRule {
    fn rule_id(&self) -> &str {
        RULE_ID
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn check(&self, context: &RuleContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for node in context.nodes {
            self.visit(node, context.source, &mut violations);
        }
        violations
    }
}
