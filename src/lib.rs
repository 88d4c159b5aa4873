//! # elastic-model
//!
//! A fluent query-construction and document-mapping layer over
//! Elasticsearch-compatible document stores.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Model Layer                          │
//! │  • QueryableModel: index name, attribute bags, casts       │
//! │  • new_query() binds a fresh Builder to the model          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Query Builder                         │
//! │  • Typed clause translation into must/should/must_not/     │
//! │    filter buckets                                          │
//! │  • Sort, highlight, take, deep-pagination cursor state     │
//! │  • Terminal ops: page/get/first/find/count/exists/         │
//! │    increment/decrement/update/delete/insert/create/        │
//! │    updateById/deleteById/index administration              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Wire Client Trait                       │
//! │  • run(method, request) → response | typed fault           │
//! │  • HTTP transport included; transport concerns stay here   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elastic_model::{
//!     Connection, DynamicModel, ElasticConfig, FieldKind, QueryableModel, SortOrder,
//! };
//!
//! # async fn example() -> elastic_model::Result<()> {
//! let config: ElasticConfig = serde_json::from_str(
//!     r#"{"connections": {"default": {"hosts": ["http://127.0.0.1:9200"]}}}"#,
//! ).unwrap();
//! let conn = Connection::from_config(&config, "default")?;
//!
//! let users = DynamicModel::new("users")
//!     .cast("name", FieldKind::Varchar)
//!     .cast("age", FieldKind::Int);
//!
//! // One-time index setup, mappings derived from the casts
//! users.clone().new_query(&conn)
//!     .create_index(Default::default(), Default::default())
//!     .await?;
//!
//! // Fluent querying
//! let adults = users.new_query(&conn)
//!     .where_between("age", 18, 30)
//!     .order_by("age", SortOrder::Asc)
//!     .get(&["*"], 50)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`model`]: the [`QueryableModel`] seam and the field-type table
//! - [`query`]: clause translation, the builder, terminal operations
//! - [`client`]: the wire client trait and the HTTP transport
//! - [`cache`]: cursor cache backends (in-process, Redis)
//! - [`config`]: connection configuration
//! - [`error`]: the error taxonomy

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod query;

mod connection;

pub use cache::{CursorCache, MemoryCursorCache, RedisCursorCache};
pub use client::{ClientFactory, ClientFault, HttpClient, Method, Request, Response, SearchClient};
pub use config::{ConnectionConfig, ElasticConfig};
pub use connection::Connection;
pub use error::{Error, Result};
pub use model::field_type::{EngineType, FieldKind};
pub use model::{AttributeMap, DynamicModel, QueryableModel};
pub use query::{Builder, BulkOutcome, Operator, Page, SortMode, SortOrder};
