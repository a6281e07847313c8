//! Structural description of calls and their arguments
//!
//! Nodes are snapshots of one version of a buffer: every offset refers to the text the
//! provider was given, so a new tree must be requested after any edit.

pub mod query;
pub mod sourcekit;
pub mod swift;

use std::ops::Range;
use std::path::Path;
use thiserror::Error;

pub use sourcekit::SourceKitProvider;
pub use swift::SwiftSyntax;

/// A byte span given as offset and length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Syntactic kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Call,
    Argument,
    Closure,
    Other,
}

/// A call, one of its arguments, or any other structure carrying nested calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub offset: usize,
    pub length: usize,
    /// Callee name (for chained calls, the whole chain up to this callee) or argument label
    pub name: Option<Span>,
    /// Argument list or closure body
    pub body: Option<Span>,
    pub arguments: Vec<Node>,
    pub substructure: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            name: None,
            body: None,
            arguments: Vec::new(),
            substructure: Vec::new(),
        }
    }

    pub fn with_name(mut self, offset: usize, length: usize) -> Self {
        self.name = Some(Span::new(offset, length));
        self
    }

    pub fn with_body(mut self, offset: usize, length: usize) -> Self {
        self.body = Some(Span::new(offset, length));
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Node>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_substructure(mut self, substructure: Vec<Node>) -> Self {
        self.substructure = substructure;
        self
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Arguments first, then nested structure
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.arguments.iter().chain(self.substructure.iter())
    }
}

/// Errors raised while obtaining structure for a buffer
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("structure command is empty")]
    EmptyCommand,

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("invalid structure JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load the Swift grammar: {0}")]
    Grammar(String),

    #[error("tree-sitter failed to parse the source")]
    Parse,
}

/// Source of node trees: the syntax analysis collaborator.
pub trait StructureProvider: Send + Sync {
    /// Structure of `source`, the current contents of `path`
    fn structure(&self, path: &Path, source: &str) -> Result<Vec<Node>, StructureError>;
}

impl<F> StructureProvider for F
where
    F: Fn(&Path, &str) -> Result<Vec<Node>, StructureError> + Send + Sync,
{
    fn structure(&self, path: &Path, source: &str) -> Result<Vec<Node>, StructureError> {
        self(path, source)
    }
}
