//! Questions the rule asks about a node, answered from its offsets and the raw text

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Node, NodeKind};
use crate::text::SourceView;

/// A chain continuation: newline, indentation, optionally the previous closure's brace, a dot
static CONTINUATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(\s*\}?\.)").expect("valid regex"));

static NEWLINE_AFTER_PAREN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*\n\s*").expect("valid regex"));

static CLOSURE_BODY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{").expect("valid regex"));

pub fn is_call(node: &Node) -> bool {
    node.kind == NodeKind::Call
}

/// The call text does not end with its closing parenthesis
pub fn has_trailing_closure(node: &Node, source: &SourceView) -> bool {
    source
        .slice(node.range())
        .map_or(false, |text| !text.ends_with(')'))
}

/// Arguments whose value is a closure literal
pub fn closure_arguments<'n>(node: &'n Node, source: &SourceView) -> Vec<&'n Node> {
    node.arguments
        .iter()
        .filter(|argument| {
            argument
                .body
                .and_then(|body| source.slice(body.range()))
                .map_or(false, |text| CLOSURE_BODY_REGEX.is_match(text))
        })
        .collect()
}

/// The only closure argument, provided it is also the last argument
pub fn trailing_closure<'n>(node: &'n Node, source: &SourceView) -> Option<&'n Node> {
    let closures = closure_arguments(node, source);
    let last = node.arguments.last()?;
    match closures.as_slice() {
        [closure] if closure.offset == last.offset => Some(*closure),
        _ => None,
    }
}

/// The body opens on the same line as `end_offset`
pub fn is_single_line_closure(node: &Node, end_offset: usize, source: &SourceView) -> bool {
    let Some(body) = node.body else {
        return false;
    };
    match (source.line_of(body.offset), source.line_of(end_offset)) {
        (Some(start), Some(end)) => start == end,
        _ => false,
    }
}

/// Where the call visually begins.
///
/// The name offset, unless the name span continues a multi-line chain, in which case the
/// start of the last continuation line.
pub fn logical_start_offset(node: &Node, source: &SourceView) -> Option<usize> {
    let name = node.name?;
    let text = source.slice(name.range())?;
    let continuation = CONTINUATION_REGEX
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1));

    Some(match continuation {
        Some(m) => name.offset + m.start(),
        None => name.offset,
    })
}

/// The argument list opens with a line break right after the parenthesis
pub fn is_first_argument_on_newline(node: &Node, source: &SourceView) -> bool {
    let (Some(name), Some(first)) = (node.name, node.arguments.first()) else {
        return false;
    };
    let start = name.end();
    if first.offset <= start {
        return false;
    }
    source
        .slice(start..first.offset)
        .map_or(false, |text| NEWLINE_AFTER_PAREN_REGEX.is_match(text))
}
