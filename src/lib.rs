//! Lazily resolved OpenAPI / JSON-Schema object model.
//!
//! A document is read into a [`node::Node`] tree and indexed by
//! [`index::SpecIndex`]. Schemas are reached through [`SchemaProxy`]
//! handles that build on first use, follow `$ref` one hop at a time and
//! hash structurally.
pub mod error;
pub mod fanout;
pub mod index;
pub mod node;
pub mod path_de;
pub mod schema;

pub use error::{BuildError, NodeError};
pub use index::{SpecIndex, SpecIndexConfig, SpecVersion};
pub use node::{Node, parse_document};
pub use schema::diagnostics::{SchemaIssue, collect_errors};
pub use schema::{
    BuildContext, Digest, Discriminator, DynamicValue, HashCache, Schema, SchemaProxy, ZERO_DIGEST, extract_schema,
};
