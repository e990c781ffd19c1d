use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::BuildError;
use crate::node::Node;

/// Decode the directly mapped fields of a mapping node, with the field path in error messages.
///
/// Keys listed in `skip` are left out before decoding; the schema builder
/// uses this to keep nested sub-schemas from being converted eagerly.
pub fn decode_direct_fields<T: DeserializeOwned>(node: &Node, skip: &[&str]) -> Result<T, BuildError> {
    if !node.is_mapping() {
        return Err(BuildError::UnexpectedNode {
            keyword: "schema".into(),
            expected: "a mapping",
            found: node.kind_name(),
            mark: node.mark,
        });
    }
    let mut fields = Map::new();
    for (key, value) in node.entries() {
        let key = key.key_label();
        if skip.contains(&key.as_str()) {
            continue;
        }
        fields.insert(key, value.to_json());
    }
    from_value_with_path(Value::Object(fields)).map_err(|(path, message)| BuildError::Decode {
        path,
        message,
        mark: node.mark,
    })
}

/// Deserialize with JSON-path context in error messages.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, (String, String)> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err((path, err.into_inner().to_string()))
        }
    }
}

/// Serde helper: a present key always yields `Some`, even when its value is `null`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::parse_document;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        min_length: Option<u64>,
        #[serde(default, deserialize_with = "present")]
        default: Option<Value>,
    }

    #[test]
    fn skips_listed_keys_and_ignores_unknown_ones() {
        let node = parse_document("minLength: 2\nproperties: {a: {minLength: oops}}\nother: 1").unwrap();
        let sample: Sample = decode_direct_fields(&node, &["properties"]).unwrap();
        assert_eq!(sample.min_length, Some(2));
        assert_eq!(sample.default, None);
    }

    #[test]
    fn null_default_is_present() {
        let node = parse_document("default: null").unwrap();
        let sample: Sample = decode_direct_fields(&node, &[]).unwrap();
        assert_eq!(sample.default, Some(Value::Null));
    }

    #[test]
    fn errors_carry_the_field_path() {
        let node = parse_document("minLength: many").unwrap();
        let err = decode_direct_fields::<Sample>(&node, &[]).unwrap_err();
        match err {
            BuildError::Decode { path, .. } => assert_eq!(path, "minLength"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_mappings() {
        let node = parse_document("[1, 2]").unwrap();
        let err = decode_direct_fields::<Sample>(&node, &[]).unwrap_err();
        assert!(matches!(err, BuildError::UnexpectedNode { found: "sequence", .. }));
    }
}
