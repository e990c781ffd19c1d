//! Gathers build failures across a schema graph.
//!
//! A failed nested schema does not fail its parent; its error sits on its
//! own proxy until someone asks. This walk asks every proxy it can reach.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::SchemaProxy;
use crate::error::BuildError;

/// One failing proxy, with the keyword path that leads to it from the walk root.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaIssue {
    /// Slash-separated labels, e.g. `properties/pet/allOf/1`. Empty for the root.
    pub path: String,
    pub error: BuildError,
}

/// Resolve every proxy reachable from `root` (down to `max_depth` levels)
/// and collect the ones that fail. Each reference is followed once, so
/// cyclic graphs terminate.
pub fn collect_errors(root: &Arc<SchemaProxy>, max_depth: usize) -> Vec<SchemaIssue> {
    let mut walk = Walk { max_depth, seen_references: HashSet::new(), seen_proxies: HashSet::new(), issues: Vec::new() };
    walk.visit(root, String::new(), 0);
    walk.issues
}

struct Walk {
    max_depth: usize,
    seen_references: HashSet<String>,
    seen_proxies: HashSet<u64>,
    issues: Vec<SchemaIssue>,
}

impl Walk {
    fn visit(&mut self, proxy: &Arc<SchemaProxy>, path: String, depth: usize) {
        if !self.seen_proxies.insert(proxy.id()) {
            return;
        }
        if let Some(reference) = proxy.reference() {
            if !self.seen_references.insert(reference) {
                return;
            }
        }
        let Some(schema) = proxy.schema() else {
            if let Some(error) = proxy.build_error() {
                self.issues.push(SchemaIssue { path, error: error.clone() });
            }
            return;
        };
        if depth >= self.max_depth {
            debug!(path = %path, "diagnostics depth limit reached");
            return;
        }
        for (label, child) in schema.sub_schemas() {
            let child_path = if path.is_empty() { label } else { format!("{path}/{label}") };
            self.visit(&child, child_path, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SpecIndex;
    use crate::node::parse_document;

    const DOC: &str = r#"
components:
  schemas:
    Pet:
      properties:
        owner: {$ref: '#/components/schemas/Owner'}
        tags:
          items: 12
    Owner:
      properties:
        pets:
          items: {$ref: '#/components/schemas/Pet'}
        shape:
          allOf: true
"#;

    fn pet() -> Arc<SchemaProxy> {
        let index = Arc::new(SpecIndex::new(parse_document(DOC).unwrap()));
        let node = parse_document("$ref: '#/components/schemas/Pet'").unwrap();
        SchemaProxy::build(None, Some(node), Some(index)).unwrap()
    }

    #[test]
    fn finds_nested_failures_through_cycles() {
        let issues = collect_errors(&pet(), 16);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, ["properties/owner/properties/shape", "properties/tags/items"]);
        assert!(matches!(issues[0].error, BuildError::UnexpectedNode { found: "boolean", .. }));
        assert!(matches!(issues[1].error, BuildError::UnexpectedNode { found: "integer", .. }));
    }

    #[test]
    fn depth_limit_stops_the_walk() {
        assert!(collect_errors(&pet(), 1).is_empty());
        assert_eq!(collect_errors(&pet(), 2).len(), 2);
    }

    #[test]
    fn a_failing_root_is_reported_with_an_empty_path() {
        let proxy = SchemaProxy::build(None, Some(parse_document("[1, 2]").unwrap()), None).unwrap();
        let issues = collect_errors(&proxy, 4);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "");
    }
}
