//! Correction engine
//!
//! One pass turns `(text, violations)` into `(new text, corrections)`:
//! 1. chain resolution: a violation whose reference line is itself about to be rewritten
//!    borrows that line's own target indentation instead
//! 2. edits are applied from the end of the buffer towards its start, so an edit never
//!    moves an offset that is still queued
//!
//! Fixing one brace can change what an enclosing brace has to match, so passes repeat on
//! freshly derived structure until nothing eligible is left or the pass cap is hit.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::Path;

use crate::models::{
    Correction, CorrectionStatus, IndentationRange, Location, RuleContext, Violation,
};
use crate::rules::base::LintRule;
use crate::structure::{Node, StructureProvider};
use crate::suppression::{SuppressionIndex, Suppressions};
use crate::text::{self, SourceView};

pub const DEFAULT_MAX_PASSES: usize = 16;

/// Output of a single correction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionPass {
    pub text: String,
    pub corrections: Vec<Correction>,
}

/// Output of a full detect-correct-redetect cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub text: String,
    pub corrections: Vec<Correction>,
    /// Passes that applied edits
    pub passes: usize,
    pub status: CorrectionStatus,
}

/// Maps each violation's brace line to the violation, so that a violation copying its
/// indentation from that line can follow the link.
struct ChainResolver<'v> {
    by_actual_line: HashMap<Range<usize>, &'v Violation>,
}

impl<'v> ChainResolver<'v> {
    fn new(violations: &[&'v Violation]) -> Self {
        let mut by_actual_line = HashMap::new();
        for violation in violations {
            by_actual_line
                .entry(violation.actual.line_range.clone())
                .or_insert(*violation);
        }
        Self { by_actual_line }
    }

    /// Follows `expected line == other.actual line` links to the final reference line.
    /// A line seen twice ends the chase.
    fn resolve(&self, violation: &'v Violation) -> &'v IndentationRange {
        let mut visited = HashSet::new();
        visited.insert(violation.actual.line_range.clone());

        let mut current = violation;
        while let Some(next) = self.by_actual_line.get(&current.expected.line_range) {
            if !visited.insert(next.actual.line_range.clone()) {
                break;
            }
            current = next;
        }
        &current.expected
    }
}

/// Apply one pass of edits for `violations` (already filtered for suppression) to `text`.
///
/// Violations whose edit cannot be mapped onto the live buffer are skipped.
pub fn apply_corrections(text: &str, violations: &[Violation]) -> CorrectionPass {
    let source = SourceView::new(text);

    let mut ordered: Vec<&Violation> = violations.iter().collect();
    // the edit point is the end of the actual span; latest first
    ordered.sort_by(|a, b| {
        b.actual
            .span
            .end
            .cmp(&a.actual.span.end)
            .then(b.range.start.cmp(&a.range.start))
    });
    ordered.dedup_by(|a, b| a.actual.span == b.actual.span);

    let resolver = ChainResolver::new(&ordered);
    let mut buffer = text.to_string();
    let mut corrections = Vec::new();
    // nothing at or after this offset may be touched again
    let mut barrier = text.len() + 1;

    for violation in ordered {
        let actual = &violation.actual;
        if actual.span.end > barrier {
            log::debug!(
                "skipping overlapping correction at line {} ({})",
                actual.line,
                violation.rule_id
            );
            continue;
        }

        let expected = resolver.resolve(violation);
        let Some(indentation) = source.slice(expected.span.clone()) else {
            log::debug!("expected indentation of line {} is unavailable", expected.line);
            continue;
        };

        let Some(edit_start) = apply_edit(&mut buffer, text, actual, indentation) else {
            log::debug!("could not rewrite line {} ({})", actual.line, violation.rule_id);
            continue;
        };
        barrier = edit_start;

        if let Some(location) = Location::in_source(&source, actual.span.start) {
            corrections.push(Correction {
                rule_id: violation.rule_id.clone(),
                location,
            });
        }
    }

    CorrectionPass {
        text: buffer,
        corrections,
    }
}

/// Rewrite one brace line. Returns the offset where the edit begins.
fn apply_edit(
    buffer: &mut String,
    original: &str,
    actual: &IndentationRange,
    indentation: &str,
) -> Option<usize> {
    let span = actual.span.clone();
    let before = original.get(span.clone())?;
    // everything before the edit point is still the original text
    if buffer.get(span.clone())? != before {
        return None;
    }

    if text::has_non_whitespace(before) {
        // other code precedes the brace: move the brace to a line of its own
        let newline = text::line_terminator(original, actual.line_range.end);
        let insertion = format!("{}{}", newline, indentation);
        text::insert_at(buffer, span.end, &insertion).then_some(span.end)
    } else {
        text::replace_range(buffer, span.clone(), indentation).then_some(span.start)
    }
}

/// Run every rule over one structure snapshot
pub fn detect(
    file_path: &str,
    source: &SourceView,
    nodes: &[Node],
    rules: &[Box<dyn LintRule>],
) -> Vec<Violation> {
    let context = RuleContext {
        nodes,
        file_path,
        source,
    };
    rules.iter().flat_map(|rule| rule.check(&context)).collect()
}

/// Detect, correct, persist and re-detect until nothing eligible is left.
///
/// `persist` is called with the buffer after every pass that changed it, before the next
/// structure lookup. Suppression directives are re-read from each pass's buffer.
pub fn correct_until_stable(
    path: &Path,
    text: String,
    rules: &[Box<dyn LintRule>],
    provider: &dyn StructureProvider,
    max_passes: usize,
    persist: &mut dyn FnMut(&str) -> std::io::Result<()>,
) -> CorrectionOutcome {
    let file_path = path.to_string_lossy();
    let mut outcome = CorrectionOutcome {
        text,
        corrections: Vec::new(),
        passes: 0,
        status: CorrectionStatus::PassLimit,
    };

    for _ in 0..max_passes {
        let nodes = match provider.structure(path, &outcome.text) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("{}: structure unavailable: {}", file_path, e);
                outcome.status = CorrectionStatus::Failed(e.to_string());
                return outcome;
            }
        };

        let source = SourceView::new(&outcome.text);
        let suppressions = Suppressions::parse(&outcome.text);
        let eligible: Vec<Violation> = detect(&file_path, &source, &nodes, rules)
            .into_iter()
            .filter(|v| suppressions.is_active(&v.rule_id, v.range.clone()))
            .collect();

        if eligible.is_empty() {
            outcome.status = CorrectionStatus::Converged;
            return outcome;
        }

        let pass = apply_corrections(&outcome.text, &eligible);
        if pass.corrections.is_empty() || pass.text == outcome.text {
            log::warn!(
                "{}: {} violation(s) left that could not be corrected",
                file_path,
                eligible.len()
            );
            outcome.status = CorrectionStatus::Stalled;
            return outcome;
        }

        log::debug!(
            "{}: pass {} applied {} correction(s)",
            file_path,
            outcome.passes + 1,
            pass.corrections.len()
        );

        if let Err(e) = persist(&pass.text) {
            log::warn!("{}: failed to write corrections: {}", file_path, e);
            outcome.status = CorrectionStatus::Failed(e.to_string());
            return outcome;
        }

        outcome.text = pass.text;
        outcome.corrections.extend(pass.corrections);
        outcome.passes += 1;
    }

    log::warn!(
        "{}: corrections did not converge after {} passes",
        file_path,
        max_passes
    );
    outcome
}
