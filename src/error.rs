use thiserror::Error;

use crate::node::Mark;

/// Everything that can go wrong while turning a node into a schema.
///
/// Errors are values: a failing nested schema never takes its parent down,
/// it is memoized on the owning proxy and handed out through
/// [`SchemaProxy::build_error`](crate::schema::SchemaProxy::build_error).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A `$ref` points at nothing the index can find.
    #[error("reference cannot be found: '{reference}', {mark}")]
    UnresolvableReference { reference: String, mark: Mark },

    /// The reference is part of a cycle and the index refuses to resolve cycles.
    #[error("circular reference '{reference}' cannot be resolved, {mark}")]
    CircularReference { reference: String, mark: Mark },

    /// Wrong node kind for a keyword (e.g. a scalar where a mapping was expected).
    #[error("unexpected data type for '{keyword}': expected {expected}, found {found}, {mark}")]
    UnexpectedNode {
        keyword: String,
        expected: &'static str,
        found: &'static str,
        mark: Mark,
    },

    /// Direct fields could not be decoded.
    #[error("at path {path} → {message}, {mark}")]
    Decode { path: String, message: String, mark: Mark },

    /// A proxy was requested over an absent node.
    #[error("cannot build a schema proxy without a value node")]
    MissingNode,

    /// One element of a collection keyword (`allOf`, `properties`, ...) failed.
    #[error("{keyword} entry '{key}' failed to build: {source}")]
    Entry {
        keyword: &'static str,
        key: String,
        #[source]
        source: Box<BuildError>,
    },

    /// A single sub-schema keyword (`not`, `items`, ...) failed.
    #[error("'{keyword}' failed to build: {source}")]
    Keyword {
        keyword: &'static str,
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    pub(crate) fn entry(keyword: &'static str, key: impl Into<String>, source: BuildError) -> Self {
        BuildError::Entry { keyword, key: key.into(), source: Box::new(source) }
    }

    pub(crate) fn keyword(keyword: &'static str, source: BuildError) -> Self {
        BuildError::Keyword { keyword, source: Box::new(source) }
    }

    /// The innermost error, skipping `Entry`/`Keyword` wrappers.
    pub fn root_cause(&self) -> &BuildError {
        match self {
            BuildError::Entry { source, .. } | BuildError::Keyword { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors raised while reading source text into a node tree.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] yaml_rust2::ScanError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_errors_name_the_key_and_keep_the_cause() {
        let inner = BuildError::UnresolvableReference {
            reference: "#/nope".into(),
            mark: Mark { line: 4, column: 9 },
        };
        let err = BuildError::entry("properties", "b", inner.clone());
        let text = err.to_string();
        assert!(text.contains("properties entry 'b'"), "{text}");
        assert!(text.contains("'#/nope', line 4, col 9"), "{text}");
        assert_eq!(err.root_cause(), &inner);
    }
}
