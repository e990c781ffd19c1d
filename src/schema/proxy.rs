//! Deferred schema handle.
//!
//! Polymorphic keywords let a schema reach itself again (`allOf` → `$ref` →
//! `allOf` ...). Building such graphs eagerly never terminates, so every
//! nested schema is wrapped in a proxy that builds its target on first
//! request, one level at a time, and remembers the outcome.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use once_cell::sync::OnceCell;
use tracing::debug;

use super::{BuildContext, Schema};
use crate::error::BuildError;
use crate::index::SpecIndex;
use crate::node::Node;

static NEXT_PROXY_ID: AtomicU64 = AtomicU64::new(1);

/// Pointer state of a proxy: the `$ref` string and the node it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub reference: String,
    pub node: Option<Arc<Node>>,
}

pub struct SchemaProxy {
    id: u64,
    key_node: Option<Arc<Node>>,
    value_node: Arc<Node>,
    index: Option<Arc<SpecIndex>>,
    parent: Weak<SchemaProxy>,
    reference: RwLock<Option<Reference>>,
    rendered: OnceCell<Result<Arc<Schema>, BuildError>>,
    this: Weak<SchemaProxy>,
}

impl SchemaProxy {
    /// Set up a proxy over `value_node`. Records pointer state, never resolves.
    pub fn build(
        key_node: Option<Arc<Node>>,
        value_node: Option<Arc<Node>>,
        index: Option<Arc<SpecIndex>>,
    ) -> Result<Arc<Self>, BuildError> {
        let value_node = value_node.ok_or(BuildError::MissingNode)?;
        Ok(Self::new(key_node, value_node, index, Weak::new()))
    }

    pub fn new(
        key_node: Option<Arc<Node>>,
        value_node: Arc<Node>,
        index: Option<Arc<SpecIndex>>,
        parent: Weak<SchemaProxy>,
    ) -> Arc<Self> {
        let reference = value_node.reference().map(|(_, pointer)| Reference {
            reference: pointer.to_string(),
            node: Some(value_node.clone()),
        });
        Arc::new_cyclic(|this| Self {
            id: NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed),
            key_node,
            value_node,
            index,
            parent,
            reference: RwLock::new(reference),
            rendered: OnceCell::new(),
            this: this.clone(),
        })
    }

    /// The built schema, or `None` if building failed (see [`build_error`](Self::build_error)).
    ///
    /// Builds at most once. Concurrent first calls are safe; one build wins
    /// and every caller observes its result.
    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.rendered.get_or_init(|| self.render()).as_ref().ok().cloned()
    }

    fn render(&self) -> Result<Arc<Schema>, BuildError> {
        debug!(proxy = self.id, reference = ?self.reference(), "resolving schema proxy");
        let ctx = BuildContext { index: self.index.clone(), parent: self.this.clone() };
        match Schema::build(&self.value_node, &ctx) {
            Ok(mut schema) => {
                schema.parent_proxy = self.this.clone();
                Ok(Arc::new(schema))
            }
            Err(error) => {
                debug!(proxy = self.id, %error, "schema proxy failed to build");
                Err(error)
            }
        }
    }

    /// The memoized build failure, if the proxy was resolved and failed.
    pub fn build_error(&self) -> Option<&BuildError> {
        self.rendered.get().and_then(|r| r.as_ref().err())
    }

    pub fn is_resolved(&self) -> bool {
        self.rendered.get().is_some()
    }

    pub fn is_reference(&self) -> bool {
        self.read_reference().is_some()
    }

    pub fn reference(&self) -> Option<String> {
        self.read_reference().as_ref().map(|r| r.reference.clone())
    }

    pub fn reference_node(&self) -> Option<Arc<Node>> {
        self.read_reference().as_ref().and_then(|r| r.node.clone())
    }

    /// Replace the pointer state. An empty reference clears it. Meant for
    /// tooling; does not invalidate an already built schema.
    pub fn set_reference(&self, reference: impl Into<String>, node: Option<Arc<Node>>) {
        let reference = reference.into();
        let mut guard = self.reference.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = (!reference.is_empty()).then(|| Reference { reference, node });
    }

    fn read_reference(&self) -> std::sync::RwLockReadGuard<'_, Option<Reference>> {
        self.reference.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Process-unique identity, stable for the life of the proxy.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key_node(&self) -> Option<&Arc<Node>> {
        self.key_node.as_ref()
    }

    pub fn value_node(&self) -> &Arc<Node> {
        &self.value_node
    }

    pub fn index(&self) -> Option<&Arc<SpecIndex>> {
        self.index.as_ref()
    }

    /// The proxy whose schema holds this one, while it is alive.
    pub fn parent(&self) -> Option<Arc<SchemaProxy>> {
        self.parent.upgrade()
    }
}

impl fmt::Debug for SchemaProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaProxy")
            .field("id", &self.id)
            .field("reference", &self.reference())
            .field("resolved", &self.is_resolved())
            .field("mark", &self.value_node.mark)
            .finish()
    }
}
