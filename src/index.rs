//! Read-only document index.
//!
//! Resolves local JSON-pointer references (`#/components/schemas/Pet`) one
//! hop at a time and records which references take part in a cycle. The
//! schema builder only ever reads from it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::node::{Node, NodeKind};

/// Document format generation. Decides how version-dependent keywords read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecVersion {
    Swagger2,
    OpenApi30,
    OpenApi31,
}

impl SpecVersion {
    /// Detect the version from the root `openapi` / `swagger` key.
    pub fn detect(root: &Node) -> Option<Self> {
        if let Some((_, v)) = root.child("openapi") {
            return v.scalar_value().and_then(|s| s.parse().ok());
        }
        if let Some((_, v)) = root.child("swagger") {
            return v.scalar_value().and_then(|s| s.parse().ok());
        }
        None
    }

    /// `exclusiveMinimum`/`exclusiveMaximum` are booleans before 3.1, numbers from 3.1 on.
    pub fn boolean_exclusive_bounds(self) -> bool {
        !matches!(self, SpecVersion::OpenApi31)
    }
}

impl FromStr for SpecVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "2" || s.starts_with("2.") {
            Ok(SpecVersion::Swagger2)
        } else if s == "3.0" || s.starts_with("3.0.") {
            Ok(SpecVersion::OpenApi30)
        } else if s == "3.1" || s.starts_with("3.1.") {
            Ok(SpecVersion::OpenApi31)
        } else {
            Err(format!("unsupported document version: {s}"))
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVersion::Swagger2 => write!(f, "2.0"),
            SpecVersion::OpenApi30 => write!(f, "3.0"),
            SpecVersion::OpenApi31 => write!(f, "3.1"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpecIndexConfig {
    /// Resolve references that are part of a cycle instead of failing the build.
    pub allow_circular_references: bool,
    /// Known format version; detected from the document when `None`.
    pub spec_version: Option<SpecVersion>,
    /// Key prefix of vendor extensions.
    pub extension_prefix: String,
}

impl Default for SpecIndexConfig {
    fn default() -> Self {
        Self {
            allow_circular_references: true,
            spec_version: None,
            extension_prefix: "x-".into(),
        }
    }
}

/// Result of a one-hop lookup.
#[derive(Clone, Debug)]
pub struct Located {
    pub node: Arc<Node>,
    /// The reference is reachable from its own target.
    pub circular: bool,
}

#[derive(Debug)]
pub struct SpecIndex {
    root: Arc<Node>,
    config: SpecIndexConfig,
    circular: HashSet<String>,
    lookups: AtomicUsize,
}

impl SpecIndex {
    pub fn new(root: Arc<Node>) -> Self {
        Self::with_config(root, SpecIndexConfig::default())
    }

    pub fn with_config(root: Arc<Node>, mut config: SpecIndexConfig) -> Self {
        if config.spec_version.is_none() {
            config.spec_version = SpecVersion::detect(&root);
        }
        let circular = detect_circular(&root);
        if !circular.is_empty() {
            debug!(count = circular.len(), "circular references detected");
        }
        Self { root, config, circular, lookups: AtomicUsize::new(0) }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn config(&self) -> &SpecIndexConfig {
        &self.config
    }

    pub fn spec_version(&self) -> Option<SpecVersion> {
        self.config.spec_version
    }

    pub fn allow_circular_references(&self) -> bool {
        self.config.allow_circular_references
    }

    /// Follow `reference` exactly one hop. Only local (`#...`) pointers are indexed.
    pub fn locate(&self, reference: &str) -> Option<Located> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let node = resolve_pointer(&self.root, reference);
        debug!(reference, found = node.is_some(), "index lookup");
        node.map(|node| Located { node, circular: self.circular.contains(reference) })
    }

    pub fn is_circular(&self, reference: &str) -> bool {
        self.circular.contains(reference)
    }

    /// References that can reach themselves, sorted.
    pub fn circular_references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self.circular.iter().map(String::as_str).collect();
        refs.sort_unstable();
        refs
    }

    /// Number of `locate` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_pointer(root: &Arc<Node>, reference: &str) -> Option<Arc<Node>> {
    let fragment = reference.strip_prefix('#')?;
    if fragment.is_empty() {
        return Some(root.clone());
    }
    let path = fragment.strip_prefix('/')?;
    let mut current = root.clone();
    for raw in path.split('/') {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let next = match &current.kind {
            NodeKind::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.scalar_value() == Some(token.as_str()))
                .map(|(_, v)| v.clone()),
            NodeKind::Sequence(items) => token.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
            NodeKind::Scalar { .. } => None,
        }?;
        current = next;
    }
    Some(current)
}

fn collect_refs(node: &Node, out: &mut BTreeSet<String>) {
    if let Some((_, pointer)) = node.reference() {
        out.insert(pointer.to_string());
    }
    match &node.kind {
        NodeKind::Mapping(entries) => entries.iter().for_each(|(_, v)| collect_refs(v, out)),
        NodeKind::Sequence(items) => items.iter().for_each(|v| collect_refs(v, out)),
        NodeKind::Scalar { .. } => {}
    }
}

/// A reference is circular when following references from its target leads back to it.
fn detect_circular(root: &Arc<Node>) -> HashSet<String> {
    let mut refs = BTreeSet::new();
    collect_refs(root, &mut refs);

    let edges: HashMap<&str, BTreeSet<String>> = refs
        .iter()
        .map(|r| {
            let mut out = BTreeSet::new();
            if let Some(target) = resolve_pointer(root, r) {
                collect_refs(&target, &mut out);
            }
            (r.as_str(), out)
        })
        .collect();

    let mut circular = HashSet::new();
    for start in &refs {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = edges[start.as_str()].iter().map(String::as_str).collect();
        while let Some(current) = stack.pop() {
            if current == start.as_str() {
                circular.insert(start.clone());
                break;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = edges.get(current) {
                stack.extend(next.iter().map(String::as_str));
            }
        }
    }
    circular
}
