//! Node → `Schema`.
//!
//! Flat fields are decoded straight through serde. Every keyword that holds
//! a nested schema becomes a [`SchemaProxy`] instead of a built schema; the
//! proxies of collection keywords are set up concurrently, one rayon task
//! per element, and gathered back in source order.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::{debug, trace, warn};

use super::{BuildContext, Discriminator, DynamicValue, ExclusiveBound, Schema, SchemaOrBool, SchemaProxy, SchemaType};
use crate::error::BuildError;
use crate::fanout;
use crate::index::SpecVersion;
use crate::node::{Node, NodeKind, REF_KEY, Tag};
use crate::path_de::{self, present};

// ------------------------------- Keywords --------------------------------- //

/// Ordered collections of schemas.
const SEQUENCE_KEYWORDS: [&str; 4] = ["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keyed maps of schemas.
const MAP_KEYWORDS: [&str; 3] = ["properties", "patternProperties", "dependentSchemas"];

/// Keywords holding exactly one schema.
const SINGLE_KEYWORDS: [&str; 8] = [
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
    "unevaluatedItems",
    "contentSchema",
];

/// Keywords holding a schema or a boolean.
const SWITCH_KEYWORDS: [&str; 3] = ["items", "additionalProperties", "unevaluatedProperties"];

/// Keys the direct-field pass must not touch.
const NOT_DIRECT: [&str; 23] = [
    REF_KEY,
    "type",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "discriminator",
    "allOf",
    "anyOf",
    "oneOf",
    "prefixItems",
    "properties",
    "patternProperties",
    "dependentSchemas",
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
    "unevaluatedItems",
    "contentSchema",
    "items",
    "additionalProperties",
    "unevaluatedProperties",
];

// ------------------------------ Direct fields ----------------------------- //

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectFields {
    #[serde(rename = "$schema")]
    schema_dialect: Option<String>,
    #[serde(rename = "$id")]
    id: Option<String>,
    #[serde(rename = "$anchor")]
    anchor: Option<String>,
    #[serde(rename = "$dynamicAnchor")]
    dynamic_anchor: Option<String>,
    #[serde(rename = "$dynamicRef")]
    dynamic_ref: Option<String>,
    #[serde(rename = "$comment")]
    comment: Option<String>,

    title: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    #[serde(rename = "const", default, deserialize_with = "present")]
    const_value: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    example: Option<Value>,
    examples: Option<Vec<Value>>,
    deprecated: Option<bool>,
    nullable: Option<bool>,
    read_only: Option<bool>,
    write_only: Option<bool>,
    content_encoding: Option<String>,
    content_media_type: Option<String>,
    external_docs: Option<Value>,
    xml: Option<Value>,

    multiple_of: Option<Number>,
    maximum: Option<Number>,
    minimum: Option<Number>,
    max_length: Option<u64>,
    min_length: Option<u64>,
    pattern: Option<String>,
    format: Option<String>,
    max_items: Option<u64>,
    min_items: Option<u64>,
    unique_items: Option<bool>,
    max_properties: Option<u64>,
    min_properties: Option<u64>,
    min_contains: Option<u64>,
    max_contains: Option<u64>,
    required: Option<Vec<String>>,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<Value>>,
}

// ------------------------------- Build ------------------------------------ //

impl Schema {
    /// Build a schema from `node`.
    ///
    /// A `$ref` node is followed one hop through the index first. Nested
    /// schemas come back as unresolved proxies; the only lookups performed
    /// for them check that their pointers lead somewhere.
    pub fn build(node: &Arc<Node>, ctx: &BuildContext) -> Result<Schema, BuildError> {
        let root = resolve_root(node, ctx)?;

        let direct: DirectFields = path_de::decode_direct_fields(&root, &NOT_DIRECT)?;
        let extensions = root.extensions(ctx.extension_prefix());

        let schema_type = root.child("type").and_then(|(_, v)| decode_type(v));
        let version = ctx.spec_version();
        let exclusive_minimum = root
            .child("exclusiveMinimum")
            .and_then(|(_, v)| decode_exclusive_bound("exclusiveMinimum", v, version));
        let exclusive_maximum = root
            .child("exclusiveMaximum")
            .and_then(|(_, v)| decode_exclusive_bound("exclusiveMaximum", v, version));
        let discriminator = match root.child("discriminator") {
            Some((_, v)) => Some(path_de::decode_direct_fields::<Discriminator>(v, &[])?),
            None => None,
        };

        let sub = SubSchemas::build(&root, ctx)?;

        Ok(Schema {
            schema_dialect: direct.schema_dialect,
            id: direct.id,
            anchor: direct.anchor,
            dynamic_anchor: direct.dynamic_anchor,
            dynamic_ref: direct.dynamic_ref,
            comment: direct.comment,
            title: direct.title,
            description: direct.description,
            default: direct.default,
            const_value: direct.const_value,
            example: direct.example,
            examples: direct.examples,
            deprecated: direct.deprecated,
            nullable: direct.nullable,
            read_only: direct.read_only,
            write_only: direct.write_only,
            content_encoding: direct.content_encoding,
            content_media_type: direct.content_media_type,
            external_docs: direct.external_docs,
            xml: direct.xml,
            extensions,
            multiple_of: direct.multiple_of,
            maximum: direct.maximum,
            minimum: direct.minimum,
            exclusive_maximum,
            exclusive_minimum,
            max_length: direct.max_length,
            min_length: direct.min_length,
            pattern: direct.pattern,
            format: direct.format,
            max_items: direct.max_items,
            min_items: direct.min_items,
            unique_items: direct.unique_items,
            max_properties: direct.max_properties,
            min_properties: direct.min_properties,
            min_contains: direct.min_contains,
            max_contains: direct.max_contains,
            required: direct.required,
            enum_values: direct.enum_values,
            schema_type,
            all_of: sub.all_of,
            any_of: sub.any_of,
            one_of: sub.one_of,
            not: sub.not,
            discriminator,
            if_schema: sub.if_schema,
            then_schema: sub.then_schema,
            else_schema: sub.else_schema,
            items: sub.items,
            prefix_items: sub.prefix_items,
            contains: sub.contains,
            unevaluated_items: sub.unevaluated_items,
            content_schema: sub.content_schema,
            properties: sub.properties,
            pattern_properties: sub.pattern_properties,
            dependent_schemas: sub.dependent_schemas,
            property_names: sub.property_names,
            additional_properties: sub.additional_properties,
            unevaluated_properties: sub.unevaluated_properties,
            parent_proxy: Default::default(),
        })
    }
}

/// Follow a root-level `$ref` one hop.
fn resolve_root(node: &Arc<Node>, ctx: &BuildContext) -> Result<Arc<Node>, BuildError> {
    let Some((ref_node, reference)) = node.reference() else {
        return Ok(node.clone());
    };
    let unresolvable = || BuildError::UnresolvableReference {
        reference: reference.to_string(),
        mark: ref_node.mark,
    };
    let index = ctx.index.as_ref().ok_or_else(unresolvable)?;
    let located = index.locate(reference).ok_or_else(unresolvable)?;
    if located.circular {
        if !index.allow_circular_references() {
            return Err(BuildError::CircularReference {
                reference: reference.to_string(),
                mark: ref_node.mark,
            });
        }
        debug!(reference, "following circular reference");
    }
    Ok(located.node)
}

// ----------------------------- Sum-typed fields --------------------------- //

fn decode_type(value: &Node) -> Option<SchemaType> {
    match &value.kind {
        NodeKind::Scalar { value, .. } => Some(DynamicValue::A(value.clone())),
        NodeKind::Sequence(items) => Some(DynamicValue::B(
            items.iter().filter_map(|n| n.scalar_value().map(str::to_string)).collect(),
        )),
        NodeKind::Mapping(_) => {
            debug!(mark = %value.mark, "ignoring mapping under 'type'");
            None
        }
    }
}

/// The document version decides the expected case when it is known;
/// otherwise (or when the node contradicts it) the scalar tag does.
fn decode_exclusive_bound(keyword: &str, value: &Node, version: Option<SpecVersion>) -> Option<ExclusiveBound> {
    let sniffed = sniff_exclusive_bound(value);
    let Some(version) = version else {
        return sniffed;
    };
    let text = value.scalar_value()?;
    let expected = if version.boolean_exclusive_bounds() {
        text.parse::<bool>().ok().map(DynamicValue::A)
    } else {
        text.parse::<Number>().ok().map(DynamicValue::B)
    };
    if expected.is_none() {
        warn!(keyword, %version, mark = %value.mark, "value does not match the document version, using its tag");
    }
    expected.or(sniffed)
}

fn sniff_exclusive_bound(value: &Node) -> Option<ExclusiveBound> {
    match &value.kind {
        NodeKind::Scalar { tag: Tag::Bool, value } => value.parse().ok().map(DynamicValue::A),
        NodeKind::Scalar { tag: Tag::Int | Tag::Float, value } => value.parse::<Number>().ok().map(DynamicValue::B),
        _ => None,
    }
}

// ------------------------------ Sub-schemas ------------------------------- //

struct SubSchemas {
    all_of: Option<Vec<Arc<SchemaProxy>>>,
    any_of: Option<Vec<Arc<SchemaProxy>>>,
    one_of: Option<Vec<Arc<SchemaProxy>>>,
    prefix_items: Option<Vec<Arc<SchemaProxy>>>,
    properties: Option<IndexMap<String, Arc<SchemaProxy>>>,
    pattern_properties: Option<IndexMap<String, Arc<SchemaProxy>>>,
    dependent_schemas: Option<IndexMap<String, Arc<SchemaProxy>>>,
    not: Option<Arc<SchemaProxy>>,
    if_schema: Option<Arc<SchemaProxy>>,
    then_schema: Option<Arc<SchemaProxy>>,
    else_schema: Option<Arc<SchemaProxy>>,
    contains: Option<Arc<SchemaProxy>>,
    property_names: Option<Arc<SchemaProxy>>,
    unevaluated_items: Option<Arc<SchemaProxy>>,
    content_schema: Option<Arc<SchemaProxy>>,
    items: Option<SchemaOrBool>,
    additional_properties: Option<SchemaOrBool>,
    unevaluated_properties: Option<SchemaOrBool>,
}

type ProxyList = Option<Vec<Arc<SchemaProxy>>>;
type ProxyMap = Option<IndexMap<String, Arc<SchemaProxy>>>;

impl SubSchemas {
    /// Launch every keyword group at once and wait for all of them.
    /// The first failure in keyword order is reported.
    fn build(root: &Node, ctx: &BuildContext) -> Result<Self, BuildError> {
        let mut sequences: Result<Vec<ProxyList>, BuildError> = Ok(Vec::new());
        let mut maps: Result<Vec<ProxyMap>, BuildError> = Ok(Vec::new());
        let mut singles: Result<Vec<Option<Arc<SchemaProxy>>>, BuildError> = Ok(Vec::new());
        let mut switches: Result<Vec<Option<SchemaOrBool>>, BuildError> = Ok(Vec::new());

        rayon::scope(|s| {
            s.spawn(|_| sequences = fanout::collect_ordered(&SEQUENCE_KEYWORDS, |_, kw| sequence_group(root, *kw, ctx)));
            s.spawn(|_| maps = fanout::collect_ordered(&MAP_KEYWORDS, |_, kw| map_group(root, *kw, ctx)));
            s.spawn(|_| singles = fanout::collect_ordered(&SINGLE_KEYWORDS, |_, kw| single_group(root, *kw, ctx)));
            s.spawn(|_| switches = fanout::collect_ordered(&SWITCH_KEYWORDS, |_, kw| switch_group(root, *kw, ctx)));
        });

        let mut sequences = sequences?.into_iter();
        let mut maps = maps?.into_iter();
        let mut singles = singles?.into_iter();
        let mut switches = switches?.into_iter();

        Ok(SubSchemas {
            all_of: sequences.next().flatten(),
            any_of: sequences.next().flatten(),
            one_of: sequences.next().flatten(),
            prefix_items: sequences.next().flatten(),
            properties: maps.next().flatten(),
            pattern_properties: maps.next().flatten(),
            dependent_schemas: maps.next().flatten(),
            not: singles.next().flatten(),
            if_schema: singles.next().flatten(),
            then_schema: singles.next().flatten(),
            else_schema: singles.next().flatten(),
            contains: singles.next().flatten(),
            property_names: singles.next().flatten(),
            unevaluated_items: singles.next().flatten(),
            content_schema: singles.next().flatten(),
            items: switches.next().flatten(),
            additional_properties: switches.next().flatten(),
            unevaluated_properties: switches.next().flatten(),
        })
    }
}

fn sequence_group(root: &Node, keyword: &'static str, ctx: &BuildContext) -> Result<ProxyList, BuildError> {
    let Some((key, value)) = root.child(keyword) else {
        return Ok(None);
    };
    let elements: &[Arc<Node>] = match &value.kind {
        NodeKind::Sequence(items) => items,
        // a lone mapping counts as a one-element list
        NodeKind::Mapping(_) => std::slice::from_ref(value),
        NodeKind::Scalar { .. } => {
            return Err(BuildError::UnexpectedNode {
                keyword: keyword.into(),
                expected: "a sequence of schemas",
                found: value.kind_name(),
                mark: value.mark,
            });
        }
    };
    trace!(keyword, count = elements.len(), "fanning out sub-schema proxies");
    let proxies = fanout::collect_ordered(elements, |position, element| {
        sub_schema_proxy(key, element, ctx).map_err(|source| BuildError::entry(keyword, position.to_string(), source))
    })?;
    Ok(Some(proxies))
}

fn map_group(root: &Node, keyword: &'static str, ctx: &BuildContext) -> Result<ProxyMap, BuildError> {
    let Some((_, value)) = root.child(keyword) else {
        return Ok(None);
    };
    let NodeKind::Mapping(entries) = &value.kind else {
        return Err(BuildError::UnexpectedNode {
            keyword: keyword.into(),
            expected: "a mapping of schemas",
            found: value.kind_name(),
            mark: value.mark,
        });
    };
    trace!(keyword, count = entries.len(), "fanning out sub-schema proxies");
    let proxies = fanout::collect_ordered(entries, |_, (key, element)| {
        let name = key.key_label();
        match sub_schema_proxy(key, element, ctx) {
            Ok(proxy) => Ok((name, proxy)),
            Err(source) => Err(BuildError::entry(keyword, name, source)),
        }
    })?;
    Ok(Some(proxies.into_iter().collect()))
}

fn single_group(root: &Node, keyword: &'static str, ctx: &BuildContext) -> Result<Option<Arc<SchemaProxy>>, BuildError> {
    let Some((key, value)) = root.child(keyword) else {
        return Ok(None);
    };
    sub_schema_proxy(key, value, ctx)
        .map(Some)
        .map_err(|source| BuildError::keyword(keyword, source))
}

/// A boolean value short-circuits: no proxy is created.
fn switch_group(root: &Node, keyword: &'static str, ctx: &BuildContext) -> Result<Option<SchemaOrBool>, BuildError> {
    let Some((key, value)) = root.child(keyword) else {
        return Ok(None);
    };
    if let Some(flag) = value.as_bool() {
        return Ok(Some(DynamicValue::B(flag)));
    }
    sub_schema_proxy(key, value, ctx)
        .map(|proxy| Some(DynamicValue::A(proxy)))
        .map_err(|source| BuildError::keyword(keyword, source))
}

/// Wrap one nested schema. A pointer is looked up to make sure it leads
/// somewhere; nothing is built.
fn sub_schema_proxy(key: &Arc<Node>, element: &Arc<Node>, ctx: &BuildContext) -> Result<Arc<SchemaProxy>, BuildError> {
    if let Some((ref_node, reference)) = element.reference() {
        let found = ctx.index.as_ref().and_then(|index| index.locate(reference)).is_some();
        if !found {
            return Err(BuildError::UnresolvableReference {
                reference: reference.to_string(),
                mark: ref_node.mark,
            });
        }
    }
    Ok(SchemaProxy::new(Some(key.clone()), element.clone(), ctx.index.clone(), ctx.parent.clone()))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{SpecIndex, SpecIndexConfig};
    use crate::node::parse_document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn build_with(src: &str, config: SpecIndexConfig) -> Result<Schema, BuildError> {
        let node = parse_document(src).unwrap();
        let index = Arc::new(SpecIndex::with_config(node.clone(), config));
        Schema::build(&node, &BuildContext::new(Some(index)))
    }

    fn build(src: &str) -> Result<Schema, BuildError> {
        build_with(src, SpecIndexConfig::default())
    }

    fn versioned(src: &str, version: SpecVersion) -> Schema {
        build_with(src, SpecIndexConfig { spec_version: Some(version), ..Default::default() }).unwrap()
    }

    #[test]
    fn decodes_direct_fields() {
        let schema = build(
            r#"
$schema: https://json-schema.org/draft/2020-12/schema
title: Pet
description: a pet
minimum: 0
maxLength: 12
pattern: '^[a-z]+$'
required: [name, id]
enum: [a, 1, null]
default: null
deprecated: true
x-internal: true
"#,
        )
        .unwrap();
        assert_eq!(schema.schema_dialect.as_deref(), Some("https://json-schema.org/draft/2020-12/schema"));
        assert_eq!(schema.title.as_deref(), Some("Pet"));
        assert_eq!(schema.minimum, Some(Number::from(0)));
        assert_eq!(schema.max_length, Some(12));
        assert_eq!(schema.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(schema.required, Some(vec!["name".to_string(), "id".to_string()]));
        assert_eq!(schema.enum_values, Some(vec![json!("a"), json!(1), json!(null)]));
        assert_eq!(schema.default, Some(Value::Null));
        assert_eq!(schema.example, None);
        assert_eq!(schema.deprecated, Some(true));
        assert_eq!(schema.extension("x-internal").and_then(|n| n.as_bool()), Some(true));
    }

    #[test]
    fn type_is_single_or_list() {
        let single = build("type: string").unwrap().schema_type.unwrap();
        assert_eq!(single, DynamicValue::A("string".to_string()));
        let list = build("type: [string, 'null']").unwrap().schema_type.unwrap();
        assert_eq!(list, DynamicValue::B(vec!["string".to_string(), "null".to_string()]));
        assert!(build("type: {nested: 1}").unwrap().schema_type.is_none());
    }

    #[test]
    fn exclusive_bounds_follow_the_tag_without_a_version() {
        let schema = build("exclusiveMinimum: true\nexclusiveMaximum: 10").unwrap();
        assert_eq!(schema.exclusive_minimum, Some(DynamicValue::A(true)));
        assert_eq!(schema.exclusive_maximum, Some(DynamicValue::B(Number::from(10))));
        assert!(build("exclusiveMinimum: 'yes'").unwrap().exclusive_minimum.is_none());
    }

    #[test]
    fn exclusive_bounds_follow_the_version_when_known() {
        let v30 = versioned("exclusiveMinimum: 'true'", SpecVersion::OpenApi30);
        assert_eq!(v30.exclusive_minimum, Some(DynamicValue::A(true)));
        let v31 = versioned("exclusiveMinimum: '2.5'", SpecVersion::OpenApi31);
        assert_eq!(v31.exclusive_minimum, Some(DynamicValue::B(Number::from_f64(2.5).unwrap())));
        // contradicting tag falls back to sniffing
        let mixed = versioned("exclusiveMaximum: 7", SpecVersion::OpenApi30);
        assert_eq!(mixed.exclusive_maximum, Some(DynamicValue::B(Number::from(7))));
    }

    #[test]
    fn boolean_switches_create_no_proxy() {
        let schema = build("items: true\nadditionalProperties: {type: string}\nunevaluatedProperties: false").unwrap();
        assert_eq!(schema.items.as_ref().and_then(|v| v.b().copied()), Some(true));
        assert!(schema.additional_properties.as_ref().is_some_and(|v| v.is_a()));
        assert_eq!(schema.unevaluated_properties.as_ref().and_then(|v| v.b().copied()), Some(false));
    }

    #[test]
    fn nested_schemas_stay_unresolved() {
        let schema = build("not: {type: string}\nif: {minLength: 1}\nthen: {}\nelse: {}\ncontains: {}").unwrap();
        for proxy in [&schema.not, &schema.if_schema, &schema.then_schema, &schema.else_schema, &schema.contains] {
            assert!(!proxy.as_ref().unwrap().is_resolved());
        }
    }

    #[test]
    fn keyed_maps_keep_source_order() {
        let schema = build("properties:\n  zeta: {}\n  alpha: {}\n  mid: {}\n").unwrap();
        let keys: Vec<&String> = schema.properties.as_ref().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn a_lone_mapping_counts_as_one_element() {
        let schema = build("allOf: {type: string}").unwrap();
        assert_eq!(schema.all_of.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn rejects_scalars_for_collections() {
        let err = build("allOf: 5").unwrap_err();
        assert!(matches!(err, BuildError::UnexpectedNode { found: "integer", .. }), "{err}");
        let err = build("properties: [a]").unwrap_err();
        assert!(matches!(err, BuildError::UnexpectedNode { found: "sequence", .. }), "{err}");
    }

    #[test]
    fn malformed_children_fail_lazily() {
        let schema = build("properties:\n  bad: 42\n  good: {type: string}\n").unwrap();
        let bad = schema.find_property("bad").unwrap();
        assert!(bad.schema().is_none());
        assert!(matches!(bad.build_error(), Some(BuildError::UnexpectedNode { .. })));
        assert!(schema.find_property("good").unwrap().schema().is_some());
    }

    #[test]
    fn unresolvable_references_fail_the_enclosing_build() {
        let err = build("not: {$ref: '#/nope'}").unwrap_err();
        assert_eq!(err.to_string(), "'not' failed to build: reference cannot be found: '#/nope', line 1, col 13");
        let err = build("items: {$ref: '#/nope'}").unwrap_err();
        assert!(matches!(err, BuildError::Keyword { keyword: "items", .. }));
    }

    #[test]
    fn first_error_in_keyword_order_wins() {
        let err = build("oneOf: [{$ref: '#/one'}]\nallOf: [{}, {$ref: '#/all'}]\n").unwrap_err();
        assert!(err.to_string().starts_with("allOf entry '1'"), "{err}");
    }

    #[test]
    fn discriminator_is_decoded() {
        let schema = build("discriminator: {propertyName: kind, mapping: {a: '#/A'}}").unwrap();
        let d = schema.discriminator.unwrap();
        assert_eq!(d.property_name, "kind");
        assert_eq!(d.find_mapping_value("a"), Some("#/A"));
    }

    #[test]
    fn circular_references_can_be_refused() {
        let doc = r#"
components:
  schemas:
    A:
      properties:
        b: {$ref: '#/components/schemas/B'}
    B:
      properties:
        a: {$ref: '#/components/schemas/A'}
"#;
        let node = parse_document(doc).unwrap();
        let reference = Node::mapping(vec![(Node::string("$ref"), Node::string("#/components/schemas/A"))]);

        let strict = SpecIndexConfig { allow_circular_references: false, ..Default::default() };
        let index = Arc::new(SpecIndex::with_config(node.clone(), strict));
        let err = Schema::build(&reference, &BuildContext::new(Some(index))).unwrap_err();
        assert!(matches!(err, BuildError::CircularReference { .. }));

        let index = Arc::new(SpecIndex::new(node));
        let schema = Schema::build(&reference, &BuildContext::new(Some(index))).unwrap();
        assert!(schema.find_property("b").unwrap().is_reference());
    }

    #[test]
    fn references_without_an_index_cannot_resolve() {
        let reference = Node::mapping(vec![(Node::string("$ref"), Node::string("#/A").at(3, 9))]);
        let err = Schema::build(&reference, &BuildContext::default()).unwrap_err();
        assert_eq!(err.to_string(), "reference cannot be found: '#/A', line 3, col 9");
    }
}
