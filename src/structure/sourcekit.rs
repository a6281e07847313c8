//! SourceKit-style structure JSON
//!
//! Reads the dictionary tree printed by tools such as `sourcekitten structure --file`.
//! Argument children are split out of `key.substructure` into [`Node::arguments`].

use serde::Deserialize;
use std::path::Path;
use std::process::Command;

use super::{Node, NodeKind, Span, StructureError, StructureProvider};

const KIND_CALL: &str = "source.lang.swift.expr.call";
const KIND_ARGUMENT: &str = "source.lang.swift.expr.argument";
const KIND_CLOSURE: &str = "source.lang.swift.expr.closure";

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "key.kind")]
    kind: Option<String>,
    #[serde(rename = "key.offset")]
    offset: Option<usize>,
    #[serde(rename = "key.length")]
    length: Option<usize>,
    #[serde(rename = "key.nameoffset")]
    name_offset: Option<usize>,
    #[serde(rename = "key.namelength")]
    name_length: Option<usize>,
    #[serde(rename = "key.bodyoffset")]
    body_offset: Option<usize>,
    #[serde(rename = "key.bodylength")]
    body_length: Option<usize>,
    #[serde(rename = "key.substructure", default)]
    substructure: Vec<RawNode>,
}

impl RawNode {
    /// A node without offset or length cannot be placed; its children are lifted instead.
    fn into_nodes(self) -> Vec<Node> {
        let children: Vec<Node> = self
            .substructure
            .into_iter()
            .flat_map(RawNode::into_nodes)
            .collect();

        let (Some(offset), Some(length)) = (self.offset, self.length) else {
            return children;
        };

        let kind = match self.kind.as_deref() {
            Some(KIND_CALL) => NodeKind::Call,
            Some(KIND_ARGUMENT) => NodeKind::Argument,
            Some(KIND_CLOSURE) => NodeKind::Closure,
            _ => NodeKind::Other,
        };

        let (arguments, substructure): (Vec<Node>, Vec<Node>) = children
            .into_iter()
            .partition(|child| child.kind == NodeKind::Argument);

        vec![Node {
            kind,
            offset,
            length,
            name: span(self.name_offset, self.name_length, false),
            body: span(self.body_offset, self.body_length, true),
            arguments,
            substructure,
        }]
    }
}

/// Zero-length names are reported for unlabelled arguments and mean "no name".
fn span(offset: Option<usize>, length: Option<usize>, allow_empty: bool) -> Option<Span> {
    match (offset, length) {
        (Some(offset), Some(length)) if length > 0 || allow_empty => Some(Span::new(offset, length)),
        _ => None,
    }
}

/// Parse a structure dictionary; the top level is the file itself.
pub fn parse_structure(json: &str) -> Result<Vec<Node>, StructureError> {
    let root: RawNode = serde_json::from_str(json)?;
    Ok(root
        .substructure
        .into_iter()
        .flat_map(RawNode::into_nodes)
        .collect())
}

/// Runs an external structure command with the file path appended.
///
/// The command reads the file from disk, so callers persist edits before asking again.
#[derive(Debug, Clone)]
pub struct SourceKitProvider {
    command: Vec<String>,
}

impl SourceKitProvider {
    pub fn new(command: Vec<String>) -> Result<Self, StructureError> {
        if command.is_empty() {
            return Err(StructureError::EmptyCommand);
        }
        Ok(Self { command })
    }

    fn display(&self) -> String {
        self.command.join(" ")
    }
}

impl StructureProvider for SourceKitProvider {
    fn structure(&self, path: &Path, _source: &str) -> Result<Vec<Node>, StructureError> {
        let output = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(path)
            .output()
            .map_err(|source| StructureError::Spawn {
                command: self.display(),
                source,
            })?;

        if !output.status.success() {
            return Err(StructureError::CommandFailed {
                command: self.display(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        log::debug!("structure for {} via `{}`", path.display(), self.display());
        parse_structure(&String::from_utf8_lossy(&output.stdout))
    }
}
