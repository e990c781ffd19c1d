//! Lazily resolved schema graph.
//!
//! A [`Schema`] is the typed view of one schema node. Everything nested in
//! it (composition, conditionals, items, property maps) is held as a
//! [`SchemaProxy`] and only built when asked for, so reference cycles stay
//! finite and independent branches can be built on demand.
//!
//! - `build`: node → `Schema`, fanning sub-schema proxies out over rayon.
//! - `proxy`: the memoizing handle.
//! - `hash`: structural SHA-256, order-independent where order carries no meaning.
//! - `diagnostics`: walks a graph and gathers every nested build failure.
pub mod build;
pub mod diagnostics;
pub mod discriminator;
pub mod dynamic;
pub mod hash;
pub mod proxy;

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::BuildError;
use crate::index::{SpecIndex, SpecVersion};
use crate::node::Node;

pub use discriminator::Discriminator;
pub use dynamic::{DynamicValue, ExclusiveBound, SchemaOrBool, SchemaType};
pub use hash::{Digest, HashCache, ZERO_DIGEST};
pub use proxy::{Reference, SchemaProxy};

/// Key of a nested schema inside a container (media type, parameter, header).
pub const SCHEMA_KEY: &str = "schema";

/// What a build needs besides the node: the index for `$ref` lookups and
/// the proxy the new schema will belong to.
#[derive(Clone, Debug, Default)]
pub struct BuildContext {
    pub index: Option<Arc<SpecIndex>>,
    pub parent: Weak<SchemaProxy>,
}

impl BuildContext {
    pub fn new(index: Option<Arc<SpecIndex>>) -> Self {
        Self { index, parent: Weak::new() }
    }

    pub(crate) fn spec_version(&self) -> Option<SpecVersion> {
        self.index.as_ref().and_then(|i| i.spec_version())
    }

    pub(crate) fn extension_prefix(&self) -> &str {
        self.index.as_ref().map_or("x-", |i| i.config().extension_prefix.as_str())
    }
}

/// A built schema. Only exists when the build succeeded.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    // identity
    pub schema_dialect: Option<String>,
    pub id: Option<String>,
    pub anchor: Option<String>,
    pub dynamic_anchor: Option<String>,
    pub dynamic_ref: Option<String>,
    pub comment: Option<String>,

    // metadata
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub const_value: Option<Value>,
    pub example: Option<Value>,
    pub examples: Option<Vec<Value>>,
    pub deprecated: Option<bool>,
    pub nullable: Option<bool>,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub content_encoding: Option<String>,
    pub content_media_type: Option<String>,
    pub external_docs: Option<Value>,
    pub xml: Option<Value>,
    pub extensions: IndexMap<String, Arc<Node>>,

    // scalar constraints
    pub multiple_of: Option<Number>,
    pub maximum: Option<Number>,
    pub minimum: Option<Number>,
    pub exclusive_maximum: Option<ExclusiveBound>,
    pub exclusive_minimum: Option<ExclusiveBound>,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,
    pub required: Option<Vec<String>>,
    pub enum_values: Option<Vec<Value>>,
    pub schema_type: Option<SchemaType>,

    // composition
    pub all_of: Option<Vec<Arc<SchemaProxy>>>,
    pub any_of: Option<Vec<Arc<SchemaProxy>>>,
    pub one_of: Option<Vec<Arc<SchemaProxy>>>,
    pub not: Option<Arc<SchemaProxy>>,
    pub discriminator: Option<Discriminator>,

    // conditionals
    pub if_schema: Option<Arc<SchemaProxy>>,
    pub then_schema: Option<Arc<SchemaProxy>>,
    pub else_schema: Option<Arc<SchemaProxy>>,

    // collections
    pub items: Option<SchemaOrBool>,
    pub prefix_items: Option<Vec<Arc<SchemaProxy>>>,
    pub contains: Option<Arc<SchemaProxy>>,
    pub unevaluated_items: Option<Arc<SchemaProxy>>,
    pub content_schema: Option<Arc<SchemaProxy>>,

    // objects
    pub properties: Option<IndexMap<String, Arc<SchemaProxy>>>,
    pub pattern_properties: Option<IndexMap<String, Arc<SchemaProxy>>>,
    pub dependent_schemas: Option<IndexMap<String, Arc<SchemaProxy>>>,
    pub property_names: Option<Arc<SchemaProxy>>,
    pub additional_properties: Option<SchemaOrBool>,
    pub unevaluated_properties: Option<SchemaOrBool>,

    parent_proxy: Weak<SchemaProxy>,
}

impl Schema {
    pub fn find_property(&self, name: &str) -> Option<&Arc<SchemaProxy>> {
        self.properties.as_ref()?.get(name)
    }

    pub fn find_dependent_schema(&self, name: &str) -> Option<&Arc<SchemaProxy>> {
        self.dependent_schemas.as_ref()?.get(name)
    }

    /// Pattern property stored under exactly `pattern`.
    pub fn find_pattern_property(&self, pattern: &str) -> Option<&Arc<SchemaProxy>> {
        self.pattern_properties.as_ref()?.get(pattern)
    }

    /// First pattern property whose regex matches `name`. Patterns that do not compile are skipped.
    pub fn match_pattern_property(&self, name: &str) -> Option<&Arc<SchemaProxy>> {
        self.pattern_properties.as_ref()?.iter().find_map(|(pattern, proxy)| match Regex::new(pattern) {
            Ok(rx) => rx.is_match(name).then_some(proxy),
            Err(error) => {
                debug!(pattern, %error, "skipping invalid pattern property");
                None
            }
        })
    }

    pub fn extension(&self, name: &str) -> Option<&Arc<Node>> {
        self.extensions.get(name)
    }

    /// The proxy that built this schema, while it is alive.
    pub fn parent_proxy(&self) -> Option<Arc<SchemaProxy>> {
        self.parent_proxy.upgrade()
    }

    /// Every nested proxy with a path-like label (`allOf/0`, `properties/name`, `items`).
    pub fn sub_schemas(&self) -> Vec<(String, Arc<SchemaProxy>)> {
        let mut out = Vec::new();
        let lists = [
            ("allOf", &self.all_of),
            ("anyOf", &self.any_of),
            ("oneOf", &self.one_of),
            ("prefixItems", &self.prefix_items),
        ];
        for (keyword, list) in lists {
            for (i, proxy) in list.iter().flatten().enumerate() {
                out.push((format!("{keyword}/{i}"), proxy.clone()));
            }
        }
        let singles = [
            ("not", &self.not),
            ("if", &self.if_schema),
            ("then", &self.then_schema),
            ("else", &self.else_schema),
            ("contains", &self.contains),
            ("propertyNames", &self.property_names),
            ("unevaluatedItems", &self.unevaluated_items),
            ("contentSchema", &self.content_schema),
        ];
        for (keyword, single) in singles {
            if let Some(proxy) = single {
                out.push((keyword.to_string(), proxy.clone()));
            }
        }
        let switches = [
            ("items", &self.items),
            ("additionalProperties", &self.additional_properties),
            ("unevaluatedProperties", &self.unevaluated_properties),
        ];
        for (keyword, switch) in switches {
            if let Some(DynamicValue::A(proxy)) = switch {
                out.push((keyword.to_string(), proxy.clone()));
            }
        }
        let maps = [
            ("properties", &self.properties),
            ("patternProperties", &self.pattern_properties),
            ("dependentSchemas", &self.dependent_schemas),
        ];
        for (keyword, map) in maps {
            for (name, proxy) in map.iter().flatten() {
                out.push((format!("{keyword}/{name}"), proxy.clone()));
            }
        }
        out
    }
}

/// Wrap the schema held by a container node.
///
/// Looks for a root-level `$ref` first, then for a `schema` key. The
/// pointer is checked against the index but not built. `Ok(None)` when the
/// container holds no schema.
pub fn extract_schema(
    root: &Arc<Node>,
    index: Option<&Arc<SpecIndex>>,
) -> Result<Option<Arc<SchemaProxy>>, BuildError> {
    if let Some((ref_node, reference)) = root.reference() {
        check_locatable(reference, ref_node, index)?;
        return Ok(Some(SchemaProxy::new(None, root.clone(), index.cloned(), Weak::new())));
    }
    let Some((key, value)) = root.child(SCHEMA_KEY) else {
        return Ok(None);
    };
    if let Some((ref_node, reference)) = value.reference() {
        check_locatable(reference, ref_node, index)?;
    }
    Ok(Some(SchemaProxy::new(Some(key.clone()), value.clone(), index.cloned(), Weak::new())))
}

fn check_locatable(reference: &str, ref_node: &Node, index: Option<&Arc<SpecIndex>>) -> Result<(), BuildError> {
    match index.and_then(|i| i.locate(reference)) {
        Some(_) => Ok(()),
        None => Err(BuildError::UnresolvableReference {
            reference: if reference.is_empty() { "[empty]".into() } else { reference.into() },
            mark: ref_node.mark,
        }),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::parse_document;

    fn build(src: &str) -> Schema {
        let node = parse_document(src).unwrap();
        let index = Arc::new(SpecIndex::new(node.clone()));
        Schema::build(&node, &BuildContext::new(Some(index))).unwrap()
    }

    #[test]
    fn finds_properties_and_friends() {
        let schema = build(
            r#"
properties:
  name: {type: string}
patternProperties:
  "^x_": {type: integer}
dependentSchemas:
  card: {required: [billing]}
"#,
        );
        assert!(schema.find_property("name").is_some());
        assert!(schema.find_property("nope").is_none());
        assert!(schema.find_pattern_property("^x_").is_some());
        assert!(schema.find_pattern_property("x_a").is_none());
        assert!(schema.match_pattern_property("x_a").is_some());
        assert!(schema.match_pattern_property("y_a").is_none());
        assert!(schema.find_dependent_schema("card").is_some());
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let schema = build("patternProperties:\n  '([': {}\n  '^a': {}\n");
        assert!(schema.match_pattern_property("abc").is_some());
        assert!(schema.match_pattern_property("zzz").is_none());
    }

    #[test]
    fn sub_schemas_are_labelled() {
        let schema = build(
            r#"
allOf: [{type: string}, {minLength: 1}]
items: {type: string}
additionalProperties: false
properties:
  a: {}
"#,
        );
        let labels: Vec<String> = schema.sub_schemas().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["allOf/0", "allOf/1", "items", "properties/a"]);
    }

    #[test]
    fn extract_from_container() {
        let doc = parse_document(
            r#"
components:
  schemas:
    Pet: {type: object}
content:
  schema:
    $ref: '#/components/schemas/Pet'
inline:
  schema:
    type: string
byref:
  $ref: '#/components/schemas/Pet'
dangling:
  schema:
    $ref: ''
empty: {}
"#,
        )
        .unwrap();
        let index = Arc::new(SpecIndex::new(doc.clone()));
        let child = |k: &str| doc.child(k).unwrap().1.clone();

        let by_key = extract_schema(&child("content"), Some(&index)).unwrap().unwrap();
        assert!(by_key.is_reference());
        assert_eq!(by_key.key_node().and_then(|k| k.scalar_value()), Some("schema"));

        let inline = extract_schema(&child("inline"), Some(&index)).unwrap().unwrap();
        assert!(!inline.is_reference());
        assert!(inline.schema().unwrap().schema_type.is_some());

        let root_ref = extract_schema(&child("byref"), Some(&index)).unwrap().unwrap();
        assert_eq!(root_ref.reference().as_deref(), Some("#/components/schemas/Pet"));

        let err = extract_schema(&child("dangling"), Some(&index)).unwrap_err();
        assert!(err.to_string().contains("[empty]"), "{err}");

        assert!(extract_schema(&child("empty"), Some(&index)).unwrap().is_none());
    }
}
