//! Generic document node tree.
//!
//! Sources (YAML or JSON) are read into a tree of shared, immutable nodes.
//! Mappings keep their source order and scalars keep their tag, so later
//! passes can tell `true` from `"true"` and `5` from `"5"`.
//!
//! Nodes are handed around as `Arc<Node>`: schema proxies hold on to the
//! exact node they wrap, and the document index hands out subtrees without
//! copying them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::NodeError;

/// Key marking a pointer reference inside a mapping.
pub const REF_KEY: &str = "$ref";

/// Source position of a node, 1-based. Zero means the reader did not track it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mark {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "unknown position")
        } else {
            write!(f, "line {}, col {}", self.line, self.column)
        }
    }
}

/// Scalar type tag, as resolved by the reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Scalar { tag: Tag, value: String },
    Sequence(Vec<Arc<Node>>),
    /// Key/value pairs in source order.
    Mapping(Vec<(Arc<Node>, Arc<Node>)>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub mark: Mark,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl Node {
    pub fn scalar(tag: Tag, value: impl Into<String>) -> Arc<Node> {
        Arc::new(Node { kind: NodeKind::Scalar { tag, value: value.into() }, mark: Mark::default() })
    }

    pub fn string(value: impl Into<String>) -> Arc<Node> {
        Node::scalar(Tag::Str, value)
    }

    pub fn sequence(items: Vec<Arc<Node>>) -> Arc<Node> {
        Arc::new(Node { kind: NodeKind::Sequence(items), mark: Mark::default() })
    }

    pub fn mapping(entries: Vec<(Arc<Node>, Arc<Node>)>) -> Arc<Node> {
        Arc::new(Node { kind: NodeKind::Mapping(entries), mark: Mark::default() })
    }

    /// Copy of this node placed at `line`/`column`.
    pub fn at(&self, line: usize, column: usize) -> Arc<Node> {
        Arc::new(Node { kind: self.kind.clone(), mark: Mark { line, column } })
    }

    pub fn from_json_value(value: &Value) -> Arc<Node> {
        match value {
            Value::Null => Node::scalar(Tag::Null, "null"),
            Value::Bool(b) => Node::scalar(Tag::Bool, b.to_string()),
            Value::Number(n) => {
                let tag = if n.is_i64() || n.is_u64() { Tag::Int } else { Tag::Float };
                Node::scalar(tag, n.to_string())
            }
            Value::String(s) => Node::string(s.clone()),
            Value::Array(xs) => Node::sequence(xs.iter().map(Node::from_json_value).collect()),
            Value::Object(m) => Node::mapping(
                m.iter()
                    .map(|(k, v)| (Node::string(k.clone()), Node::from_json_value(v)))
                    .collect(),
            ),
        }
    }
}

/// Read YAML (or JSON, which the YAML reader accepts) into a node tree.
///
/// Every node carries the position of its first token. Only the first
/// document of a stream is read; an empty source reads as `null`.
pub fn parse_document(source: &str) -> Result<Arc<Node>, NodeError> {
    let mut reader = TreeReader::default();
    Parser::new_from_str(source).load(&mut reader, false)?;
    Ok(reader.root.unwrap_or_else(|| Node::scalar(Tag::Null, "null")))
}

enum Frame {
    Sequence { mark: Mark, anchor: usize, items: Vec<Arc<Node>> },
    Mapping { mark: Mark, anchor: usize, entries: Vec<(Arc<Node>, Arc<Node>)>, key: Option<Arc<Node>> },
}

/// Folds parser events into nodes, one open collection per frame.
#[derive(Default)]
struct TreeReader {
    stack: Vec<Frame>,
    anchors: HashMap<usize, Arc<Node>>,
    root: Option<Arc<Node>>,
}

impl TreeReader {
    fn finish(&mut self, node: Arc<Node>, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => entries.push((k, node)),
                None => *key = Some(node),
            },
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }
}

impl MarkedEventReceiver for TreeReader {
    fn on_event(&mut self, event: Event, marker: Marker) {
        // yaml lines are 1-based already, columns are not
        let mark = Mark { line: marker.line(), column: marker.col() + 1 };
        match event {
            Event::Scalar(text, style, anchor, ..) => {
                let (tag, value) = resolve_scalar(text, matches!(style, TScalarStyle::Plain));
                self.finish(Arc::new(Node { kind: NodeKind::Scalar { tag, value }, mark }), anchor);
            }
            Event::SequenceStart(anchor, ..) => {
                self.stack.push(Frame::Sequence { mark, anchor, items: Vec::new() });
            }
            Event::MappingStart(anchor, ..) => {
                self.stack.push(Frame::Mapping { mark, anchor, entries: Vec::new(), key: None });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let (node, anchor) = match self.stack.pop() {
                    Some(Frame::Sequence { mark, anchor, items }) => {
                        (Arc::new(Node { kind: NodeKind::Sequence(items), mark }), anchor)
                    }
                    Some(Frame::Mapping { mark, anchor, entries, .. }) => {
                        (Arc::new(Node { kind: NodeKind::Mapping(entries), mark }), anchor)
                    }
                    None => return,
                };
                self.finish(node, anchor);
            }
            Event::Alias(id) => {
                let node = self.anchors.get(&id).cloned();
                self.finish(node.unwrap_or_else(|| Node::scalar(Tag::Null, "null").at(mark.line, mark.column)), 0);
            }
            _ => {}
        }
    }
}

/// Core-schema tag resolution. Quoted and block scalars are always strings.
fn resolve_scalar(text: String, plain: bool) -> (Tag, String) {
    if !plain {
        return (Tag::Str, text);
    }
    match text.as_str() {
        "" | "~" | "null" | "Null" | "NULL" => return (Tag::Null, "null".into()),
        "true" | "True" | "TRUE" => return (Tag::Bool, "true".into()),
        "false" | "False" | "FALSE" => return (Tag::Bool, "false".into()),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf" | "-.INF" | ".nan" | ".NaN"
        | ".NAN" => return (Tag::Float, text),
        _ => {}
    }
    if let Some(int) = parse_int(&text) {
        return (Tag::Int, int);
    }
    let numeric = text.bytes().any(|b| b.is_ascii_digit())
        && text.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if numeric && text.parse::<f64>().is_ok() {
        return (Tag::Float, text);
    }
    (Tag::Str, text)
}

/// Decimal, `0x` and `0o` integers, rendered back in decimal.
fn parse_int(text: &str) -> Option<String> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = digits.strip_prefix("0o") {
        (8, oct)
    } else {
        (10, digits)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = u128::from_str_radix(digits, radix).ok()?;
    if negative {
        let value = i128::try_from(magnitude).ok().map(|m| -m)?;
        i64::try_from(value).ok().map(|v| v.to_string())
    } else {
        u64::try_from(magnitude).ok().map(|v| v.to_string())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl Node {
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar { .. })
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence(_))
    }

    pub fn tag(&self) -> Option<Tag> {
        match &self.kind {
            NodeKind::Scalar { tag, .. } => Some(*tag),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.tag() == Some(Tag::Null)
    }

    pub fn is_bool(&self) -> bool {
        self.tag() == Some(Tag::Bool)
    }

    pub fn is_int(&self) -> bool {
        self.tag() == Some(Tag::Int)
    }

    pub fn is_float(&self) -> bool {
        self.tag() == Some(Tag::Float)
    }

    pub fn is_string(&self) -> bool {
        self.tag() == Some(Tag::Str)
    }

    pub fn scalar_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Boolean payload, only for bool-tagged scalars.
    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            NodeKind::Scalar { tag: Tag::Bool, value } => value.parse().ok(),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[(Arc<Node>, Arc<Node>)] {
        match &self.kind {
            NodeKind::Mapping(entries) => entries,
            _ => &[],
        }
    }

    pub fn items(&self) -> &[Arc<Node>] {
        match &self.kind {
            NodeKind::Sequence(items) => items,
            _ => &[],
        }
    }

    /// First `(key, value)` pair whose key is `key`. Only looks one level down.
    pub fn child(&self, key: &str) -> Option<(&Arc<Node>, &Arc<Node>)> {
        self.entries()
            .iter()
            .find(|(k, _)| k.scalar_value() == Some(key))
            .map(|(k, v)| (k, v))
    }

    /// `Some((value node, pointer))` when this is a `{$ref: ...}` mapping.
    pub fn reference(&self) -> Option<(&Arc<Node>, &str)> {
        let (_, value) = self.child(REF_KEY)?;
        value.scalar_value().map(|pointer| (value, pointer))
    }

    pub fn is_reference(&self) -> bool {
        self.reference().is_some()
    }

    /// Vendor extensions: every top-level key starting with `prefix`, in source order.
    pub fn extensions(&self, prefix: &str) -> IndexMap<String, Arc<Node>> {
        self.entries()
            .iter()
            .filter_map(|(k, v)| {
                let key = k.scalar_value()?;
                key.starts_with(prefix).then(|| (key.to_string(), v.clone()))
            })
            .collect()
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar { tag: Tag::Null, .. } => "null",
            NodeKind::Scalar { tag: Tag::Bool, .. } => "boolean",
            NodeKind::Scalar { tag: Tag::Int, .. } => "integer",
            NodeKind::Scalar { tag: Tag::Float, .. } => "number",
            NodeKind::Scalar { tag: Tag::Str, .. } => "string",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
        }
    }

    /// Label used for mapping keys: the scalar text, or the JSON rendering of a complex key.
    pub fn key_label(&self) -> String {
        match self.scalar_value() {
            Some(s) => s.to_string(),
            None => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match &self.kind {
            NodeKind::Scalar { tag, value } => scalar_to_json(*tag, value),
            NodeKind::Sequence(items) => Value::Array(items.iter().map(|n| n.to_json()).collect()),
            NodeKind::Mapping(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    map.insert(k.key_label(), v.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

fn scalar_to_json(tag: Tag, value: &str) -> Value {
    match tag {
        Tag::Null => Value::Null,
        Tag::Bool => value.parse::<bool>().map(Value::Bool).unwrap_or_else(|_| Value::from(value)),
        Tag::Int => {
            if let Ok(i) = value.parse::<i64>() {
                Value::from(i)
            } else if let Ok(u) = value.parse::<u64>() {
                Value::from(u)
            } else {
                float_or_string(value)
            }
        }
        Tag::Float => float_or_string(value),
        Tag::Str => Value::from(value),
    }
}

// .inf / .nan have no JSON form; keep their text
fn float_or_string(value: &str) -> Value {
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(value))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
