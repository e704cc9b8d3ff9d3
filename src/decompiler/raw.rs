/// Raw AST nodes as they appear in a JSON AST dump
///
/// A dump node is a JSON object holding the engine class name under `"class"`
/// and the node's attributes under the engine's own field names. Nothing here
/// knows about individual node kinds; that is the adapter's and the schema's job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decompiler::ast::Loc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub class: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawNode {
    pub fn new(class: &str) -> Self {
        RawNode {
            class: class.to_string(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Read the canonical `loc` field, if present and well formed.
    pub fn loc(&self) -> Option<Loc> {
        let Value::Array(parts) = self.field("loc")? else {
            return None;
        };
        match parts.as_slice() {
            [Value::String(file), line] => Some(Loc::new(file, line.as_u64()? as usize)),
            _ => None,
        }
    }

    /// Best-effort location: canonical `loc`, then legacy `filename`/`linenumber`.
    pub fn location(&self) -> Option<Loc> {
        if let Some(loc) = self.loc() {
            return Some(loc);
        }
        let line = self.field("linenumber")?.as_u64()? as usize;
        let file = self
            .field("filename")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(Loc::new(file, line))
    }
}

/// Top-level shape of a dump file: a bare node array or `{"nodes": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Dump {
    Nodes(Vec<RawNode>),
    Wrapped { nodes: Vec<RawNode> },
}

/// Parse a JSON AST dump.
pub fn parse_dump(source: &str) -> Result<Vec<RawNode>, serde_json::Error> {
    let dump: Dump = serde_json::from_str(source)?;
    Ok(match dump {
        Dump::Nodes(nodes) => nodes,
        Dump::Wrapped { nodes } => nodes,
    })
}
