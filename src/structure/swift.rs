//! Structure from the tree-sitter Swift grammar
//!
//! `call_expression` and `constructor_expression` nodes become [`Node`]s in the shape
//! SourceKit reports them:
//! - the name spans the whole callee, so a chained call's name starts at the chain's first
//!   receiver
//! - the body runs from after `(` (or after the first trailing `{`) to before the last byte
//! - arguments are the `value_argument`s followed by the trailing closures, each trailing
//!   closure an argument wrapping a closure node
//!
//! Subscripts are not calls.

use std::path::Path;
use tree_sitter::{Language, Node as SyntaxNode, Parser, Tree};

use super::{Node, NodeKind, StructureError, StructureProvider};

const CALL_KINDS: &[&str] = &["call_expression", "constructor_expression"];

/// Structure provider backed by tree-sitter-swift
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftSyntax;

impl StructureProvider for SwiftSyntax {
    fn structure(&self, _path: &Path, source: &str) -> Result<Vec<Node>, StructureError> {
        structure_of(source)
    }
}

pub fn parse_source(source: &str) -> Result<Tree, StructureError> {
    let language: Language = tree_sitter_swift::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|err| StructureError::Grammar(err.to_string()))?;

    parser.parse(source, None).ok_or(StructureError::Parse)
}

/// Top-level calls of `source`, each carrying its nested calls
pub fn structure_of(source: &str) -> Result<Vec<Node>, StructureError> {
    let tree = parse_source(source)?;
    Ok(collect(tree.root_node()))
}

fn length(node: SyntaxNode) -> usize {
    node.end_byte() - node.start_byte()
}

/// Outermost calls at or below `node`
fn collect(node: SyntaxNode) -> Vec<Node> {
    if CALL_KINDS.contains(&node.kind()) {
        if let Some(call) = call(node) {
            return vec![call];
        }
    }

    let mut cursor = node.walk();
    let children: Vec<SyntaxNode> = node.named_children(&mut cursor).collect();
    children.into_iter().flat_map(collect).collect()
}

/// Pieces of a `call_suffix` or `constructor_suffix`
#[derive(Default)]
struct CallParts<'t> {
    /// Byte offset of `(`
    open: Option<usize>,
    subscript: bool,
    arguments: Vec<SyntaxNode<'t>>,
    /// Trailing closures with their label, if any
    closures: Vec<(Option<SyntaxNode<'t>>, SyntaxNode<'t>)>,
}

impl<'t> CallParts<'t> {
    fn of(suffix: SyntaxNode<'t>) -> Self {
        let mut parts = CallParts::default();
        parts.visit(suffix);
        parts
    }

    fn visit(&mut self, parent: SyntaxNode<'t>) {
        let mut cursor = parent.walk();
        let children: Vec<SyntaxNode<'t>> = parent.children(&mut cursor).collect();
        let mut label = None;

        for child in children {
            match child.kind() {
                "value_arguments" => self.visit(child),
                "(" if self.open.is_none() && !self.subscript => {
                    self.open = Some(child.start_byte())
                }
                "[" if self.open.is_none() => self.subscript = true,
                "value_argument" => self.arguments.push(child),
                "simple_identifier" => label = Some(child),
                "lambda_literal" => self.closures.push((label.take(), child)),
                _ => {}
            }
        }
    }
}

fn call(node: SyntaxNode) -> Option<Node> {
    let mut cursor = node.walk();
    let named: Vec<SyntaxNode> = node.named_children(&mut cursor).collect();
    let (callee, suffix) = match named.as_slice() {
        [callee, .., suffix] if suffix.kind().ends_with("_suffix") => (*callee, *suffix),
        _ => return None,
    };

    let parts = CallParts::of(suffix);
    if parts.subscript {
        return None;
    }

    let body_start = match (parts.open, parts.closures.first()) {
        (Some(open), _) => open + 1,
        (None, Some((_, closure))) => closure.start_byte() + 1,
        (None, None) => return None,
    };
    let start = node.start_byte();
    let end = node.end_byte();
    // the body stops before the final `)` or `}`
    let body_length = end.saturating_sub(1).saturating_sub(body_start);

    let mut arguments: Vec<Node> = parts.arguments.iter().map(|a| argument(*a)).collect();
    arguments.extend(
        parts
            .closures
            .iter()
            .map(|(label, closure)| trailing_closure(*label, *closure)),
    );

    Some(
        Node::new(NodeKind::Call, start, end - start)
            .with_name(callee.start_byte(), length(callee))
            .with_body(body_start, body_length)
            .with_arguments(arguments)
            .with_substructure(collect(callee)),
    )
}

/// `label: value` inside the parentheses
fn argument(node: SyntaxNode) -> Node {
    let mut argument = Node::new(NodeKind::Argument, node.start_byte(), length(node));

    if let Some(label) = node.child_by_field_name("name") {
        argument = argument.with_name(label.start_byte(), length(label));
    }
    if let Some(value) = node.child_by_field_name("value") {
        let nested = if value.kind() == "lambda_literal" {
            vec![closure(value)]
        } else {
            collect(value)
        };
        argument = argument
            .with_body(value.start_byte(), length(value))
            .with_substructure(nested);
    }

    argument
}

/// A closure written after the call; labelled when it is not the first one
fn trailing_closure(label: Option<SyntaxNode>, lambda: SyntaxNode) -> Node {
    let offset = label.map_or(lambda.start_byte(), |l| l.start_byte());
    let mut argument = Node::new(NodeKind::Argument, offset, lambda.end_byte() - offset)
        .with_body(lambda.start_byte(), length(lambda))
        .with_substructure(vec![closure(lambda)]);

    if let Some(label) = label {
        argument = argument.with_name(label.start_byte(), length(label));
    }
    argument
}

fn closure(lambda: SyntaxNode) -> Node {
    let offset = lambda.start_byte();
    let length = length(lambda);
    Node::new(NodeKind::Closure, offset, length)
        .with_body(offset + 1, length.saturating_sub(2))
        .with_substructure(collect(lambda))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Span;

    fn text_of(source: &str, span: Option<Span>) -> &str {
        span.map_or("", |span| &source[span.range()])
    }

    fn calls(source: &str) -> Vec<Node> {
        structure_of(source).expect("parse swift")
    }

    fn names<'s>(source: &'s str, nodes: &[Node]) -> Vec<&'s str> {
        nodes.iter().map(|n| text_of(source, n.name)).collect()
    }

    #[test]
    fn test_call_with_labelled_arguments_and_trailing_closure() {
        let source = "foo(x: 1,\n  y: 2) { bar in\n  baz()\n  }";
        let nodes = calls(source);
        assert_eq!(nodes.len(), 1);

        let call = &nodes[0];
        assert_eq!(call.kind, NodeKind::Call);
        assert_eq!(call.range(), 0..source.len());
        assert_eq!(text_of(source, call.name), "foo");
        assert_eq!(call.body.map(|b| b.offset), Some(4));
        assert_eq!(call.arguments.len(), 3);
        assert_eq!(text_of(source, call.arguments[0].name), "x");
        assert_eq!(text_of(source, call.arguments[0].body), "1");
        assert_eq!(text_of(source, call.arguments[1].name), "y");
        assert_eq!(call.arguments[2].name, None);
        assert!(text_of(source, call.arguments[2].body).starts_with("{ bar in"));

        // `baz()` lives inside the trailing closure
        let closure = &call.arguments[2].substructure[0];
        assert_eq!(closure.kind, NodeKind::Closure);
        assert_eq!(names(source, &closure.substructure), vec!["baz"]);
        assert_eq!(closure.substructure[0].body.map(|b| b.length), Some(0));
    }

    #[test]
    fn test_trailing_closure_only_call() {
        let source = "items.forEach { item in\n    print(item)\n}";
        let nodes = calls(source);
        assert_eq!(names(source, &nodes), vec!["items.forEach"]);
        assert_eq!(nodes[0].arguments.len(), 1);
        assert_eq!(nodes[0].body.map(|b| b.offset), Some(15));
        assert!(source[nodes[0].range()].ends_with('}'));
    }

    #[test]
    fn test_generic_type_with_trailing_closure() {
        let source = "Task<Void, Never> {\n    work()\n}";
        let nodes = calls(source);
        assert_eq!(names(source, &nodes), vec!["Task<Void, Never>"]);
        assert_eq!(nodes[0].range(), 0..source.len());
        assert_eq!(nodes[0].arguments.len(), 1);
    }

    #[test]
    fn test_chain_nests_previous_call() {
        let source = "foo {\n  }.bar {\n}";
        let nodes = calls(source);
        assert_eq!(nodes.len(), 1);

        let outer = &nodes[0];
        assert_eq!(text_of(source, outer.name), "foo {\n  }.bar");
        assert_eq!(outer.range(), 0..source.len());
        assert_eq!(outer.substructure.len(), 1);

        let inner = &outer.substructure[0];
        assert_eq!(text_of(source, inner.name), "foo");
        assert_eq!(&source[inner.range()], "foo {\n  }");
    }

    #[test]
    fn test_chain_continues_on_next_line() {
        let source = "SignalProducer(values: [1, 2, 3])\n   .startWithNext { number in\n       print(number)\n}";
        let nodes = calls(source);
        assert_eq!(
            names(source, &nodes),
            vec!["SignalProducer(values: [1, 2, 3])\n   .startWithNext"]
        );
        assert_eq!(names(source, &nodes[0].substructure), vec!["SignalProducer"]);
    }

    #[test]
    fn test_subscript_is_not_a_call() {
        let source = "let x = values[0]";
        assert!(calls(source).is_empty());
    }

    #[test]
    fn test_declarations_are_not_calls() {
        let source = "func make(a: Int) -> Widget {\n  build()\n}\nvar body: some View {\n  Text(\"x\")\n}";
        let nodes = calls(source);
        assert_eq!(names(source, &nodes), vec!["build", "Text"]);
    }

    #[test]
    fn test_strings_and_comments_are_skipped() {
        let source = "log(#\"call(me) {\"#) // later() {\n/* skip() */ done()";
        let nodes = calls(source);
        assert_eq!(names(source, &nodes), vec!["log", "done"]);
        assert_eq!(&source[nodes[0].range()], "log(#\"call(me) {\"#)");
    }

    #[test]
    fn test_provider_returns_same_tree() {
        let source = "foo {\n}";
        let nodes = SwiftSyntax
            .structure(Path::new("a.swift"), source)
            .expect("parse swift");
        assert_eq!(nodes, calls(source));
    }
}
