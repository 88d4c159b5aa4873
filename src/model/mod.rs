//! Model layer.
//!
//! A model represents one document type bound to one index. The
//! [`QueryableModel`] trait is the explicit seam between concrete model
//! types and the query builder: it exposes the index name, the ordered
//! attribute bags, the casts declaration, and `new_query` to start a
//! builder bound to the model. Every supported query method is declared on
//! the builder itself — there is no dynamic forwarding.
//!
//! # Example
//!
//! ```
//! use elastic_model::model::{DynamicModel, QueryableModel};
//! use elastic_model::model::field_type::FieldKind;
//!
//! let user = DynamicModel::new("users")
//!     .cast("name", FieldKind::Varchar)
//!     .cast("age", FieldKind::Int)
//!     .cast("created_at", FieldKind::Datetime);
//!
//! assert_eq!(user.index(), "users");
//! assert_eq!(user.casts().len(), 3);
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

pub mod field_type;

use crate::query::Builder;
use crate::Connection;
use field_type::FieldKind;

/// Ordered field-name → value mapping. Backed by `serde_json`'s
/// order-preserving map so attributes keep their response order.
pub type AttributeMap = Map<String, Value>;

/// A document type bound to one index.
///
/// Implementations are plain data carriers; the builder instantiates fresh
/// instances per result row via [`new_instance`](Self::new_instance) and
/// fills them through the attribute setters. `original` holds the raw
/// last-fetched response (including metadata like `_id`, `_seq_no`) and is
/// replaced wholesale on each fetch.
pub trait QueryableModel: Clone + Send + Sync {
    /// Target index name. Set once, immutable per instance.
    fn index(&self) -> &str;

    /// Declared source-column kinds, in declaration order. Drives index
    /// mapping generation.
    fn casts(&self) -> &IndexMap<String, FieldKind>;

    /// A fresh, empty instance of the same model type.
    fn new_instance(&self) -> Self;

    fn attributes(&self) -> &AttributeMap;

    fn set_attributes(&mut self, attributes: AttributeMap);

    fn original(&self) -> &AttributeMap;

    fn set_original(&mut self, original: AttributeMap);

    /// The current document state as a JSON value.
    fn to_value(&self) -> Value {
        Value::Object(self.attributes().clone())
    }

    /// Start a query bound to this model.
    fn new_query(self, connection: &Connection) -> Builder<Self>
    where
        Self: Sized,
    {
        Builder::new(self, connection)
    }
}

/// Runtime-configured model: index name and casts supplied at construction.
///
/// The convenient implementation for ad-hoc queries and tests; long-lived
/// document types usually define their own struct implementing
/// [`QueryableModel`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct DynamicModel {
    #[serde(skip)]
    index: String,
    #[serde(flatten)]
    attributes: AttributeMap,
    #[serde(skip)]
    original: AttributeMap,
    #[serde(skip)]
    casts: IndexMap<String, FieldKind>,
}

impl DynamicModel {
    #[must_use]
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }

    /// Declare a cast for one field.
    #[must_use]
    pub fn cast(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.casts.insert(field.into(), kind);
        self
    }
}

impl QueryableModel for DynamicModel {
    fn index(&self) -> &str {
        &self.index
    }

    fn casts(&self) -> &IndexMap<String, FieldKind> {
        &self.casts
    }

    fn new_instance(&self) -> Self {
        Self {
            index: self.index.clone(),
            attributes: AttributeMap::new(),
            original: AttributeMap::new(),
            casts: self.casts.clone(),
        }
    }

    fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    fn set_attributes(&mut self, attributes: AttributeMap) {
        self.attributes = attributes;
    }

    fn original(&self) -> &AttributeMap {
        &self.original
    }

    fn set_original(&mut self, original: AttributeMap) {
        self.original = original;
    }
}
