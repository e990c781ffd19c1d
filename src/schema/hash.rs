//! Structural hashing.
//!
//! A schema is flattened into labelled fragments, joined with `|` and fed
//! to SHA-256. Every value is length-prefixed, so text holding the
//! delimiter cannot pass for a second fragment. Absent fields contribute nothing. Keyed maps, extension
//! keys, `required`, `enum`, `type` lists and the members of composition
//! keywords are sorted first, so source order does not change the digest.
//!
//! Nested schemas are hashed through their proxy. A reference proxy hashes
//! its pointer string and is never resolved, which keeps cyclic graphs finite.

use std::fmt::Display;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;
use sha2::{Digest as _, Sha256};
use tracing::trace;

use super::{DynamicValue, Schema, SchemaOrBool, SchemaProxy};

pub type Digest = [u8; 32];

/// Digest of nothing: failed builds and missing schemas.
pub const ZERO_DIGEST: Digest = [0; 32];

const DELIMITER: &str = "|";

pub fn digest(bytes: &[u8]) -> Digest {
    Sha256::digest(bytes).into()
}

pub fn to_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

/// JSON text with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}

// ------------------------------ Fragments --------------------------------- //

#[derive(Debug, Default)]
pub(crate) struct Fragments(Vec<String>);

impl Fragments {
    /// Adds `label:len:value`, with `len` the byte length of `value`.
    pub(crate) fn push(&mut self, label: &str, value: impl Display) {
        let value = value.to_string();
        self.0.push(format!("{label}:{}:{value}", value.len()));
    }

    fn opt<T: Display>(&mut self, label: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(label, value);
        }
    }

    fn json(&mut self, label: &str, value: Option<&Value>) {
        if let Some(value) = value {
            self.push(label, canonical_json(value));
        }
    }

    fn sorted(&mut self, label: &str, mut values: Vec<String>) {
        values.sort();
        self.push(label, length_prefixed(&values));
    }

    pub(crate) fn finish(self) -> Digest {
        digest(self.0.join(DELIMITER).as_bytes())
    }
}

// ------------------------------ Cache ------------------------------------- //

/// Digests of resolved proxies, keyed by proxy id. Owned by the caller and
/// shared across hash calls; clear it when the graph it describes goes away.
#[derive(Debug, Default)]
pub struct HashCache {
    digests: DashMap<u64, Digest>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, proxy_id: u64) -> Option<Digest> {
        self.digests.get(&proxy_id).map(|d| *d)
    }

    fn insert(&self, proxy_id: u64, digest: Digest) {
        self.digests.insert(proxy_id, digest);
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn clear(&self) {
        self.digests.clear();
    }
}

// ------------------------------ Hashing ----------------------------------- //

/// Hash an optional schema. `None` (a dangling parent, a failed build) yields [`ZERO_DIGEST`].
pub fn hash_schema(schema: Option<&Schema>, cache: Option<&HashCache>) -> Digest {
    schema.map_or(ZERO_DIGEST, |s| s.hash_with(cache))
}

impl SchemaProxy {
    pub fn hash(&self) -> Digest {
        self.hash_with(None)
    }

    /// A reference proxy hashes its pointer string without resolving.
    /// Anything else is built (at most once) and its schema hashed.
    pub fn hash_with(&self, cache: Option<&HashCache>) -> Digest {
        if let Some(reference) = self.reference() {
            return digest(reference.as_bytes());
        }
        if let Some(hit) = cache.and_then(|c| c.get(self.id())) {
            return hit;
        }
        let result = match self.schema() {
            Some(schema) => schema.hash_with(cache),
            None => {
                trace!(proxy = self.id(), "hashing a failed build as zero");
                ZERO_DIGEST
            }
        };
        if let Some(cache) = cache {
            cache.insert(self.id(), result);
        }
        result
    }
}

impl Schema {
    pub fn hash(&self) -> Digest {
        self.hash_with(None)
    }

    pub fn hash_with(&self, cache: Option<&HashCache>) -> Digest {
        let mut f = Fragments::default();

        f.opt("$schema", self.schema_dialect.as_ref());
        f.opt("$id", self.id.as_ref());
        f.opt("$anchor", self.anchor.as_ref());
        f.opt("$dynamicAnchor", self.dynamic_anchor.as_ref());
        f.opt("$dynamicRef", self.dynamic_ref.as_ref());
        f.opt("$comment", self.comment.as_ref());

        f.opt("title", self.title.as_ref());
        f.opt("description", self.description.as_ref());
        f.json("default", self.default.as_ref());
        f.json("const", self.const_value.as_ref());
        f.json("example", self.example.as_ref());
        if let Some(examples) = &self.examples {
            let body: Vec<String> = examples.iter().map(canonical_json).collect();
            f.push("examples", length_prefixed(&body));
        }
        f.opt("deprecated", self.deprecated);
        f.opt("nullable", self.nullable);
        f.opt("readOnly", self.read_only);
        f.opt("writeOnly", self.write_only);
        f.opt("contentEncoding", self.content_encoding.as_ref());
        f.opt("contentMediaType", self.content_media_type.as_ref());
        f.json("externalDocs", self.external_docs.as_ref());
        f.json("xml", self.xml.as_ref());

        f.opt("multipleOf", self.multiple_of.as_ref());
        f.opt("maximum", self.maximum.as_ref());
        f.opt("minimum", self.minimum.as_ref());
        for (label, bound) in [("exclusiveMaximum", &self.exclusive_maximum), ("exclusiveMinimum", &self.exclusive_minimum)] {
            match bound {
                Some(DynamicValue::A(flag)) => f.push(label, format!("bool={flag}")),
                Some(DynamicValue::B(limit)) => f.push(label, format!("number={limit}")),
                None => {}
            }
        }
        f.opt("maxLength", self.max_length);
        f.opt("minLength", self.min_length);
        f.opt("pattern", self.pattern.as_ref());
        f.opt("format", self.format.as_ref());
        f.opt("maxItems", self.max_items);
        f.opt("minItems", self.min_items);
        f.opt("uniqueItems", self.unique_items);
        f.opt("maxProperties", self.max_properties);
        f.opt("minProperties", self.min_properties);
        f.opt("minContains", self.min_contains);
        f.opt("maxContains", self.max_contains);
        if let Some(required) = &self.required {
            f.sorted("required", required.clone());
        }
        if let Some(values) = &self.enum_values {
            f.sorted("enum", values.iter().map(canonical_json).collect());
        }
        match &self.schema_type {
            Some(DynamicValue::A(name)) => f.push("type", format!("single={name}")),
            Some(DynamicValue::B(names)) => {
                let mut names = names.clone();
                names.sort();
                f.push("type", format!("list={}", length_prefixed(&names)));
            }
            None => {}
        }
        if let Some(discriminator) = &self.discriminator {
            f.push("discriminator", to_hex(&discriminator.hash()));
        }

        for (label, list) in [
            ("allOf", &self.all_of),
            ("anyOf", &self.any_of),
            ("oneOf", &self.one_of),
            ("prefixItems", &self.prefix_items),
        ] {
            if let Some(list) = list {
                f.sorted(label, hash_members(list, cache));
            }
        }

        for (label, single) in [
            ("not", &self.not),
            ("if", &self.if_schema),
            ("then", &self.then_schema),
            ("else", &self.else_schema),
            ("contains", &self.contains),
            ("propertyNames", &self.property_names),
            ("unevaluatedItems", &self.unevaluated_items),
            ("contentSchema", &self.content_schema),
        ] {
            if let Some(proxy) = single {
                f.push(label, to_hex(&proxy.hash_with(cache)));
            }
        }

        for (label, switch) in [
            ("items", &self.items),
            ("additionalProperties", &self.additional_properties),
            ("unevaluatedProperties", &self.unevaluated_properties),
        ] {
            if let Some(switch) = switch {
                f.push(label, hash_switch(switch, cache));
            }
        }

        for (label, map) in [
            ("properties", &self.properties),
            ("patternProperties", &self.pattern_properties),
            ("dependentSchemas", &self.dependent_schemas),
        ] {
            if let Some(map) = map {
                f.sorted(label, hash_entries(map, cache));
            }
        }

        if !self.extensions.is_empty() {
            let entries = self
                .extensions
                .iter()
                .map(|(k, v)| format!("{k}={}", canonical_json(&v.to_json())))
                .collect();
            f.sorted("extensions", entries);
        }

        f.finish()
    }
}

fn length_prefixed(values: &[String]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{}:{v}", v.len())).collect();
    parts.join(",")
}

fn hash_members(list: &[Arc<SchemaProxy>], cache: Option<&HashCache>) -> Vec<String> {
    list.iter().map(|proxy| to_hex(&proxy.hash_with(cache))).collect()
}

fn hash_entries(map: &IndexMap<String, Arc<SchemaProxy>>, cache: Option<&HashCache>) -> Vec<String> {
    map.iter()
        .map(|(name, proxy)| format!("{name}={}", to_hex(&proxy.hash_with(cache))))
        .collect()
}

fn hash_switch(value: &SchemaOrBool, cache: Option<&HashCache>) -> String {
    match value {
        DynamicValue::A(proxy) => to_hex(&proxy.hash_with(cache)),
        DynamicValue::B(flag) => flag.to_string(),
    }
}
