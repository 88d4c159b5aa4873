// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query construction and execution.
//!
//! # Architecture
//!
//! ```text
//! predicate calls (where_*)
//!     ↓
//! translate(field, operator, value) → (bucket, typed Clause)
//!     ↓
//! BoolQuery {must, should, must_not, filter}
//!     ↓
//! terminal operation (page/get/find/count/...) assembles the request,
//! serializes the clause tree to the wire form, dispatches, maps hits
//! back into model instances
//! ```
//!
//! Deep pagination threads the previous page's sort tuple through the
//! cursor cache; everything else is stateless per call.
//!
//! # Example
//!
//! ```rust,no_run
//! # use elastic_model::{Connection, DynamicModel, QueryableModel, SortOrder};
//! # async fn example(conn: &Connection) -> elastic_model::Result<()> {
//! let users = DynamicModel::new("users");
//! let page = users
//!     .new_query(conn)
//!     .where_term("status", "active")
//!     .where_between("age", 18, 30)
//!     .order_by("created_at", SortOrder::Desc)
//!     .page(1, 20, &["*"], false)
//!     .await?;
//!
//! for user in &page.items {
//!     println!("{}", user.to_value());
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod clause;
mod cursor;

pub use builder::{Builder, BulkOutcome, Page, SortMode, SortOrder};
pub use clause::{translate, BoolQuery, Bucket, Clause, FieldRef, Operator, RangeBounds};
