//! Suppression comment parsing and handling
//!
//! Supports comments that disable rules over byte regions:
//! - `// closure-indent:disable` ... `// closure-indent:enable` - every rule in between
//! - `// closure-indent:disable closure_end_indentation` - specific rules (space or comma separated)
//! - `// closure-indent:disable:next` - the following line only
//! - `// closure-indent:disable:this` - the current line only
//! - `// closure-indent:disable:previous` - the preceding line only

use once_cell::sync::Lazy;
use regex::{Match, Regex};
use std::ops::Range;

use crate::text::LineIndex;

static DIRECTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//\s*closure-indent:(disable|enable)(?::(next|this|previous))?((?:[ \t,]+[A-Za-z0-9_]+)*)")
        .expect("valid regex")
});

const ALL_RULES: &str = "all";

/// The suppression collaborator: decides whether a rule applies to a byte range.
pub trait SuppressionIndex {
    fn is_active(&self, rule_id: &str, range: Range<usize>) -> bool;
}

/// A region where one rule (or every rule) is switched off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledRegion {
    pub range: Range<usize>,
    pub rule: String,
}

impl DisabledRegion {
    fn applies_to(&self, rule_id: &str) -> bool {
        self.rule == ALL_RULES || self.rule == rule_id
    }
}

/// Parsed suppression directives for one version of a buffer
#[derive(Debug, Default)]
pub struct Suppressions {
    pub regions: Vec<DisabledRegion>,
}

impl Suppressions {
    /// Parse directives from source code
    pub fn parse(source: &str) -> Self {
        let index = LineIndex::new(source);
        let mut regions = Vec::new();
        // `disable` without scope stays open until a matching `enable` or the end of file
        let mut open: Vec<(String, usize)> = Vec::new();

        for line in 1..=index.line_count() {
            let Some(line_range) = index.line_range(line) else {
                continue;
            };
            let text = &source[line_range.clone()];

            for caps in DIRECTIVE_REGEX.captures_iter(text) {
                let at = line_range.start + caps.get(0).map_or(0, |m| m.start());
                let rules = parse_rules(caps.get(3));
                let scope = caps.get(2).map(|m| m.as_str());

                match (&caps[1], scope) {
                    ("disable", None) => {
                        for rule in rules {
                            if !open.iter().any(|(open_rule, _)| *open_rule == rule) {
                                open.push((rule, at));
                            }
                        }
                    }
                    ("enable", None) => {
                        let closes_all = rules.iter().any(|r| r == ALL_RULES);
                        open.retain(|(rule, start)| {
                            if closes_all || rules.contains(rule) {
                                regions.push(DisabledRegion {
                                    range: *start..at,
                                    rule: rule.clone(),
                                });
                                false
                            } else {
                                true
                            }
                        });
                    }
                    ("disable", Some(scope)) => {
                        let target = match scope {
                            "next" => Some(line + 1),
                            "previous" => line.checked_sub(1),
                            _ => Some(line),
                        };
                        if let Some(range) = target.and_then(|t| index.line_range(t)) {
                            for rule in rules {
                                regions.push(DisabledRegion {
                                    range: range.start..range.end + 1,
                                    rule,
                                });
                            }
                        }
                    }
                    // scoped `enable` has no meaning here
                    _ => {}
                }
            }
        }

        for (rule, start) in open {
            regions.push(DisabledRegion {
                range: start..source.len() + 1,
                rule,
            });
        }

        Suppressions { regions }
    }
}

impl SuppressionIndex for Suppressions {
    /// Active unless the range starts inside a region disabled for `rule_id`
    fn is_active(&self, rule_id: &str, range: Range<usize>) -> bool {
        !self
            .regions
            .iter()
            .any(|region| region.applies_to(rule_id) && region.range.contains(&range.start))
    }
}

fn parse_rules(list: Option<Match>) -> Vec<String> {
    let rules: Vec<String> = list
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        vec![ALL_RULES.to_string()]
    } else {
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE: &str = "closure_end_indentation";

    fn offset_of_line(source: &str, line: usize) -> usize {
        LineIndex::new(source).line_range(line).unwrap().start
    }

    #[test]
    fn test_parse_disable_next() {
        let source = "a()\n// closure-indent:disable:next\nfoo {\n}\nbar {\n}";
        let suppressions = Suppressions::parse(source);
        assert_eq!(suppressions.regions.len(), 1);
        assert_eq!(suppressions.regions[0].rule, "all");

        let foo = offset_of_line(source, 3);
        assert!(!suppressions.is_active(RULE, foo..source.len()));
        let bar = offset_of_line(source, 5);
        assert!(suppressions.is_active(RULE, bar..source.len()));
    }

    #[test]
    fn test_parse_disable_this_specific_rule() {
        let source = "foo { // closure-indent:disable:this closure_end_indentation\n}";
        let suppressions = Suppressions::parse(source);
        assert!(!suppressions.is_active(RULE, 0..source.len()));
        assert!(suppressions.is_active("other_rule", 0..source.len()));
    }

    #[test]
    fn test_parse_disable_previous() {
        let source = "foo {\n} // closure-indent:disable:previous";
        let suppressions = Suppressions::parse(source);
        assert!(!suppressions.is_active(RULE, 0..7));
        assert!(suppressions.is_active(RULE, 6..7));
    }

    #[test]
    fn test_disable_enable_region() {
        let source = "a()\n// closure-indent:disable closure_end_indentation, other\nb()\n// closure-indent:enable closure_end_indentation\nc()";
        let suppressions = Suppressions::parse(source);

        let b = offset_of_line(source, 3);
        let c = offset_of_line(source, 5);
        assert!(suppressions.is_active(RULE, 0..3));
        assert!(!suppressions.is_active(RULE, b..b + 3));
        assert!(suppressions.is_active(RULE, c..c + 3));
        // `other` is never re-enabled
        assert!(!suppressions.is_active("other", c..c + 3));
    }

    #[test]
    fn test_enable_without_rules_closes_everything() {
        let source = "// closure-indent:disable\na()\n// closure-indent:enable\nb()";
        let suppressions = Suppressions::parse(source);
        let a = offset_of_line(source, 2);
        let b = offset_of_line(source, 4);
        assert!(!suppressions.is_active(RULE, a..a + 3));
        assert!(suppressions.is_active(RULE, b..b + 3));
    }

    #[test]
    fn test_source_without_directives() {
        assert!(Suppressions::parse("foo {\n}").is_active(RULE, 0..1));
    }
}
