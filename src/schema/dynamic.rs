use std::sync::Arc;

use serde_json::Number;

use super::SchemaProxy;

/// A keyword whose value takes one of two shapes depending on the document
/// generation: `type` is a string or a list, `items` a schema or a boolean.
/// Exactly one case is active.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DynamicValue<A, B> {
    A(A),
    B(B),
}

impl<A, B> DynamicValue<A, B> {
    pub fn is_a(&self) -> bool {
        matches!(self, DynamicValue::A(_))
    }

    pub fn is_b(&self) -> bool {
        matches!(self, DynamicValue::B(_))
    }

    pub fn a(&self) -> Option<&A> {
        match self {
            DynamicValue::A(a) => Some(a),
            DynamicValue::B(_) => None,
        }
    }

    pub fn b(&self) -> Option<&B> {
        match self {
            DynamicValue::A(_) => None,
            DynamicValue::B(b) => Some(b),
        }
    }
}

/// `type`: a single name (3.0) or a list of names (3.1).
pub type SchemaType = DynamicValue<String, Vec<String>>;

/// `exclusiveMinimum` / `exclusiveMaximum`: a flag (3.0) or a bound (3.1).
pub type ExclusiveBound = DynamicValue<bool, Number>;

/// `items`, `additionalProperties`, `unevaluatedProperties`.
pub type SchemaOrBool = DynamicValue<Arc<SchemaProxy>, bool>;
