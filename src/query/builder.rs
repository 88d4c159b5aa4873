// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query builder.
//!
//! A [`Builder`] is a one-shot query context bound to exactly one model.
//! Chainable methods accumulate predicates, sort, highlight and pagination
//! state; a terminal operation assembles the request, dispatches it through
//! the wire client and maps the response back into model instances.
//!
//! ```text
//! model.new_query(&conn)
//!     .where_term("status", "active")     ─┐ predicates → BoolQuery buckets
//!     .where_between("age", 18, 30)       ─┘
//!     .order_by("ts", SortOrder::Desc)      sort
//!     .select_highlight(&["title"])         highlight
//!     .page(2, 20, &["*"], true)            terminal: assemble → run → map
//! ```
//!
//! Every terminal call logs the fully assembled request before dispatch.
//! Empty body members are pruned — a present-but-empty clause is never
//! sent. The "not found" response class is absorbed into an empty/false/
//! absent result per operation; every other upstream fault surfaces as a
//! logic error.

use std::time::Instant;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use crate::client::{ClientFault, Method, Request, Response};
use crate::error::{Error, Result};
use crate::metrics;
use crate::model::field_type::FieldKind;
use crate::model::{AttributeMap, QueryableModel};
use crate::Connection;

use super::clause::{translate, BoolQuery, Bucket, Clause, FieldRef, Operator};
use super::cursor;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort mode for multi-valued fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Lowest value.
    #[default]
    Min,
    /// Highest value.
    Max,
    /// Sum of all values (numeric arrays only).
    Sum,
    /// Average of all values (numeric arrays only).
    Avg,
    /// Median of all values (numeric arrays only).
    Median,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Min => "min",
            SortMode::Max => "max",
            SortMode::Sum => "sum",
            SortMode::Avg => "avg",
            SortMode::Median => "median",
        }
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub items: Vec<M>,
    /// Total hit count for the whole query, not this page.
    pub total: u64,
    pub per_page: usize,
    pub current_page: usize,
}

/// Per-row outcome of a bulk insert, positionally aligned with the input.
#[derive(Debug, Clone)]
pub enum BulkOutcome<M> {
    Saved(M),
    /// The store rejected this row; the reported result string is kept
    /// for inspection.
    Failed { result: String },
}

impl<M> BulkOutcome<M> {
    pub fn is_saved(&self) -> bool {
        matches!(self, BulkOutcome::Saved(_))
    }

    pub fn model(&self) -> Option<&M> {
        match self {
            BulkOutcome::Saved(model) => Some(model),
            BulkOutcome::Failed { .. } => None,
        }
    }
}

/// Stateful, chainable query context. See the module docs for the flow.
#[derive(Debug)]
pub struct Builder<M: QueryableModel> {
    model: M,
    connection: Connection,
    query: BoolQuery,
    sort: Vec<Value>,
    highlight: Option<Value>,
    search_after: Vec<Value>,
    take: usize,
}

impl<M: QueryableModel> Builder<M> {
    /// Bind a fresh builder to a model. Rebinding means building anew.
    #[must_use]
    pub fn new(model: M, connection: &Connection) -> Self {
        Self {
            model,
            connection: connection.clone(),
            query: BoolQuery::default(),
            sort: Vec::new(),
            highlight: None,
            search_after: Vec::new(),
            take: 0,
        }
    }

    /// The bound model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The accumulated boolean query.
    pub fn query(&self) -> &BoolQuery {
        &self.query
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Chainable predicate surface
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a predicate with an operator spelling (`"="`, `">="`, `"in"`,
    /// `"match"`, ...).
    ///
    /// An unsupported spelling drops the predicate and logs an error — the
    /// query still executes with the remaining predicates. Malformed
    /// `between` bounds fail with a validation error.
    pub fn where_op(mut self, field: &str, operate: &str, value: impl Into<Value>) -> Result<Self> {
        let Some(operator) = Operator::parse(operate) else {
            error!(
                operator = operate,
                supported = ?Operator::SPELLINGS,
                "where operator not supported, predicate dropped"
            );
            return Ok(self);
        };
        let (bucket, clause) = translate(field, operator, value.into(), Map::new())?;
        self.query.push(bucket, clause);
        Ok(self)
    }

    /// Exact-value equality (`=`).
    #[must_use]
    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::Eq, value.into(), Map::new())
    }

    /// Exact term match. Text fields need the `field.raw` sub-field.
    #[must_use]
    pub fn where_term(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::Term, value.into(), Map::new())
    }

    /// Exact term must not match.
    #[must_use]
    pub fn where_not_term(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::NotTerm, value.into(), Map::new())
    }

    /// Full-text match.
    #[must_use]
    pub fn where_match(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::Match, value.into(), Map::new())
    }

    /// Full-text match with OR semantics.
    #[must_use]
    pub fn where_should_match(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::ShouldMatch, value.into(), Map::new())
    }

    /// Full-text match excluded.
    #[must_use]
    pub fn where_not_match(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::NotMatch, value.into(), Map::new())
    }

    /// Full-text match across several fields.
    #[must_use]
    pub fn where_multi_match(self, fields: &[&str], value: impl Into<Value>) -> Self {
        self.push(fields.into(), Operator::MultiMatch, value.into(), Map::new())
    }

    /// Phrase match with word-proximity slop.
    #[must_use]
    pub fn where_match_phrase(self, field: &str, value: impl Into<Value>, slop: u64) -> Self {
        self.push_phrase(field, Operator::MatchPhrase, value.into(), slop)
    }

    /// Phrase match with OR semantics.
    #[must_use]
    pub fn where_should_match_phrase(
        self,
        field: &str,
        value: impl Into<Value>,
        slop: u64,
    ) -> Self {
        self.push_phrase(field, Operator::ShouldMatchPhrase, value.into(), slop)
    }

    /// Phrase match excluded.
    #[must_use]
    pub fn where_not_match_phrase(self, field: &str, value: impl Into<Value>, slop: u64) -> Self {
        self.push_phrase(field, Operator::NotMatchPhrase, value.into(), slop)
    }

    /// Range `start <= field <= end`.
    #[must_use]
    pub fn where_between(self, field: &str, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        self.push(
            field.into(),
            Operator::Between,
            Value::Array(vec![start.into(), end.into()]),
            Map::new(),
        )
    }

    /// Range excluded.
    #[must_use]
    pub fn where_not_between(
        self,
        field: &str,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.push(
            field.into(),
            Operator::NotBetween,
            Value::Array(vec![start.into(), end.into()]),
            Map::new(),
        )
    }

    /// Membership in a value set.
    #[must_use]
    pub fn where_in<V: Into<Value>>(
        self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.push(field.into(), Operator::In, Value::Array(values), Map::new())
    }

    /// Membership excluded.
    #[must_use]
    pub fn where_not_in<V: Into<Value>>(
        self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.push(field.into(), Operator::NotIn, Value::Array(values), Map::new())
    }

    /// Prefix match.
    #[must_use]
    pub fn where_prefix(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::Prefix, value.into(), Map::new())
    }

    /// Prefix excluded.
    #[must_use]
    pub fn where_not_prefix(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::NotPrefix, value.into(), Map::new())
    }

    /// `*`-wildcard pattern match.
    #[must_use]
    pub fn where_wildcard(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::Wildcard, value.into(), Map::new())
    }

    /// Field-presence check.
    #[must_use]
    pub fn where_exists_field(self, field: &str) -> Self {
        self.push(field.into(), Operator::Exists, Value::Null, Map::new())
    }

    /// Field-absence check.
    #[must_use]
    pub fn where_not_exists_field(self, field: &str) -> Self {
        self.push(field.into(), Operator::NotExists, Value::Null, Map::new())
    }

    /// Non-scoring distance filter around a point, default 50km radius.
    #[must_use]
    pub fn where_filter_distance(self, field: &str, longitude: f64, latitude: f64) -> Self {
        self.where_filter_distance_within(field, longitude, latitude, "50km")
    }

    /// Non-scoring distance filter with an explicit radius (e.g. `"2km"`).
    #[must_use]
    pub fn where_filter_distance_within(
        mut self,
        field: &str,
        longitude: f64,
        latitude: f64,
        distance: &str,
    ) -> Self {
        self.query.push(
            Bucket::Filter,
            Clause::GeoDistance {
                field: field.to_string(),
                latitude,
                longitude,
                distance: distance.to_string(),
            },
        );
        self
    }

    /// Sort by a field. Text fields need the `field.raw` sub-field.
    #[must_use]
    pub fn order_by(self, field: &str, order: SortOrder) -> Self {
        self.order_by_with_mode(field, order, SortMode::Min)
    }

    /// Sort by a field with an explicit multi-value mode.
    #[must_use]
    pub fn order_by_with_mode(mut self, field: &str, order: SortOrder, mode: SortMode) -> Self {
        let mut by_field = Map::new();
        by_field.insert(
            field.to_string(),
            json!({"order": order.as_str(), "mode": mode.as_str()}),
        );
        self.sort.push(Value::Object(by_field));
        self
    }

    /// Sort by arc distance from a point. `unit` is `"m"` or `"km"`.
    #[must_use]
    pub fn order_by_distance(
        mut self,
        field: &str,
        longitude: f64,
        latitude: f64,
        order: SortOrder,
        unit: &str,
        mode: SortMode,
    ) -> Self {
        let mut body = Map::new();
        body.insert(field.to_string(), json!([latitude, longitude]));
        body.insert("order".to_string(), json!(order.as_str()));
        body.insert("unit".to_string(), json!(unit));
        body.insert("mode".to_string(), json!(mode.as_str()));
        body.insert("distance_type".to_string(), json!("arc"));
        // Unmapped geo fields must not fail the whole search.
        body.insert("ignore_unmapped".to_string(), json!(true));
        self.sort.push(json!({ "_geo_distance": body }));
        self
    }

    /// Highlight matched fragments in the given fields, wrapped in
    /// `<em>`/`</em>`.
    #[must_use]
    pub fn select_highlight(self, fields: &[&str]) -> Self {
        self.select_highlight_with_tags(fields, &["<em>"], &["</em>"])
    }

    /// Highlight with custom pre/post tags. An empty field list is a no-op.
    #[must_use]
    pub fn select_highlight_with_tags(
        mut self,
        fields: &[&str],
        pre_tags: &[&str],
        post_tags: &[&str],
    ) -> Self {
        if fields.is_empty() {
            return self;
        }
        let mut field_map = Map::new();
        for field in fields {
            field_map.insert((*field).to_string(), json!({}));
        }
        self.highlight = Some(json!({
            "pre_tags": pre_tags,
            "post_tags": post_tags,
            "fields": field_map,
        }));
        self
    }

    /// Cap the result count; overrides the `size` argument of `get`.
    #[must_use]
    pub fn take(mut self, take: usize) -> Self {
        self.take = take;
        self
    }

    fn push(mut self, field: FieldRef, operator: Operator, value: Value, options: Map<String, Value>) -> Self {
        match translate(field, operator, value, options) {
            Ok((bucket, clause)) => self.query.push(bucket, clause),
            Err(e) => error!(operator = %operator, error = %e, "predicate dropped"),
        }
        self
    }

    fn push_phrase(self, field: &str, operator: Operator, value: Value, slop: u64) -> Self {
        let mut options = Map::new();
        options.insert("slop".to_string(), Value::from(slop));
        self.push(field.into(), operator, value, options)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Terminal operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Fetch one page of results.
    ///
    /// With `deep`, pagination uses `search_after` carried through the
    /// cursor cache instead of an offset; at least one sort clause must be
    /// registered, and page 1 starts a fresh cursor. Without `deep` the
    /// offset is `(page - 1) * size`.
    pub async fn page(
        mut self,
        page: usize,
        size: usize,
        fields: &[&str],
        deep: bool,
    ) -> Result<Page<M>> {
        let mut from = 0;
        let mut cursor_key = None;

        if deep {
            if self.sort.is_empty() {
                return Err(Error::logic(
                    400,
                    "deep pagination must be used in conjunction with order_by, \
                     which carries the sorted values from the previous page",
                ));
            }
            let key = cursor::cache_key(
                self.connection.cursor_prefix(),
                &self.wire_query(),
                self.model.index(),
                size,
            );
            if page > 1 {
                if let Some(sorted) = cursor::load(self.connection.cursor_cache(), &key).await? {
                    self.search_after = sorted;
                }
            }
            cursor_key = Some(key);
        } else {
            from = page.saturating_sub(1) * size;
        }

        let request = Request::new(self.model.index())
            .with_param("version", true)
            .with_param("seq_no_primary_term", true)
            .with_param("from", from as u64)
            .with_param("size", size as u64)
            .with_body(self.search_body(fields));

        let result = match self.dispatch(Method::Search, request).await {
            Ok(response) => response.into_body(),
            Err(fault) if fault.is_not_found() => Value::Null,
            Err(fault) => return Err(fault.into()),
        };

        let hits = result["hits"]["hits"].as_array().cloned().unwrap_or_default();
        let total = result["hits"]["total"]["value"].as_u64().unwrap_or(0);
        metrics::record_result_count(hits.len());

        // The cursor only advances when the page produced hits.
        if let Some(key) = cursor_key {
            if let Some(sorted) = hits.last().and_then(|hit| hit["sort"].as_array()) {
                if !sorted.is_empty() {
                    cursor::store(self.connection.cursor_cache(), &key, sorted).await?;
                }
            }
        }

        let items = hits.iter().map(|hit| self.map_hit(hit, fields)).collect();
        Ok(Page {
            items,
            total,
            per_page: size,
            current_page: page,
        })
    }

    /// Fetch matching documents.
    ///
    /// Returns `None` on the "not found" response class so callers can
    /// tell "the index is missing" apart from "ran, zero hits"
    /// (`Some(vec![])`).
    pub async fn get(self, fields: &[&str], size: usize) -> Result<Option<Vec<M>>> {
        let size = if self.take > 0 { self.take } else { size };
        let request = Request::new(self.model.index())
            .with_param("version", true)
            .with_param("seq_no_primary_term", true)
            .with_param("from", 0)
            .with_param("size", size as u64)
            .with_body(self.search_body(fields));

        let result = match self.dispatch(Method::Search, request).await {
            Ok(response) => response.into_body(),
            Err(fault) if fault.is_not_found() => return Ok(None),
            Err(fault) => return Err(fault.into()),
        };

        let hits = result["hits"]["hits"].as_array().cloned().unwrap_or_default();
        metrics::record_result_count(hits.len());
        Ok(Some(hits.iter().map(|hit| self.map_hit(hit, fields)).collect()))
    }

    /// Fetch the first matching document.
    pub async fn first(self, fields: &[&str]) -> Result<Option<M>> {
        let models = self.take(1).get(fields, 1).await?;
        Ok(models.and_then(|mut models| {
            if models.is_empty() {
                None
            } else {
                Some(models.remove(0))
            }
        }))
    }

    /// Fetch one document by id, bypassing the query.
    ///
    /// A purely numeric id is coerced to an integer in the attributes.
    pub async fn find(mut self, id: impl ToString) -> Result<Option<M>> {
        let request = Request::new(self.model.index()).with_id(id.to_string());

        let result = match self.dispatch(Method::Get, request).await {
            Ok(response) => response.into_body(),
            Err(fault) if fault.is_not_found() => return Ok(None),
            Err(fault) => return Err(fault.into()),
        };

        let mut attributes = result["_source"].as_object().cloned().unwrap_or_default();
        let hit_id = result["_id"].clone();
        if !attributes.is_empty() && !hit_id.is_null() {
            attributes.insert("id".to_string(), coerce_id(&hit_id));
        }
        self.model.set_attributes(attributes);
        self.model
            .set_original(result.as_object().cloned().unwrap_or_default());
        Ok(Some(self.model))
    }

    /// Count matching documents. A missing index counts zero.
    pub async fn count(self) -> Result<u64> {
        self.run_count().await
    }

    /// Whether any document matches. Requires at least one predicate.
    pub async fn exists(self) -> Result<bool> {
        if self.query.is_empty() {
            return Err(Error::logic(400, "missing query criteria"));
        }
        Ok(self.run_count().await? > 0)
    }

    /// Add `count` to a numeric field on every matching document.
    pub async fn increment(self, field: &str, count: i64) -> Result<bool> {
        let mut params = Map::new();
        params.insert("count".to_string(), Value::from(count));
        let result = self
            .update_by_query_script(&format!("ctx._source.{field} += params.count"), params)
            .await?;
        Ok(result["updated"].as_u64().unwrap_or(0) > 0)
    }

    /// Subtract `count` from a numeric field on every matching document.
    pub async fn decrement(self, field: &str, count: i64) -> Result<bool> {
        let mut params = Map::new();
        params.insert("count".to_string(), Value::from(count));
        let result = self
            .update_by_query_script(&format!("ctx._source.{field} -= params.count"), params)
            .await?;
        Ok(result["updated"].as_u64().unwrap_or(0) > 0)
    }

    /// Assign fields on every matching document via a server-side script.
    ///
    /// Requires at least one predicate and a non-empty payload keyed by
    /// field name.
    pub async fn update(self, values: AttributeMap) -> Result<bool> {
        if self.query.is_empty() {
            return Err(Error::logic(400, "missing query criteria"));
        }
        if values.is_empty() {
            return Err(Error::Validation("update payload cannot be empty".into()));
        }
        if let Some(first_key) = values.keys().next() {
            if first_key.parse::<u64>().is_ok() {
                return Err(Error::Validation(
                    "update payload must be keyed by field name, not positional".into(),
                ));
            }
        }

        let mut script = String::new();
        let mut params = Map::new();
        for (field, value) in values {
            script = format!("ctx._source.{field} = params.{field};") + &script;
            params.insert(field, value);
        }

        let result = self.update_by_query_script(&script, params).await?;
        Ok(result["updated"].as_u64().unwrap_or(0) > 0)
    }

    /// Run a painless script against every matching document.
    ///
    /// The shared entry under `increment`/`decrement`/`update`; exposed for
    /// callers needing custom expressions. The "not found" response class
    /// yields a null result body.
    pub async fn update_by_query_script(
        &self,
        script: &str,
        params: Map<String, Value>,
    ) -> Result<Value> {
        let mut body = Map::new();
        body.insert(
            "script".to_string(),
            json!({"source": script, "lang": "painless", "params": params}),
        );
        if !self.query.is_empty() {
            body.insert("query".to_string(), self.query.to_value());
        }
        prune(&mut body);

        let request = Request::new(self.model.index()).with_body(Value::Object(body));
        match self.dispatch(Method::UpdateByQuery, request).await {
            Ok(response) => Ok(response.into_body()),
            Err(fault) if fault.is_not_found() => Ok(Value::Null),
            Err(fault) => Err(fault.into()),
        }
    }

    /// Delete every matching document. Requires at least one predicate.
    ///
    /// Version conflicts proceed rather than abort, and the index is
    /// refreshed once the deletion completes.
    pub async fn delete(self) -> Result<bool> {
        if self.query.is_empty() {
            return Err(Error::logic(400, "missing query criteria"));
        }

        let mut body = Map::new();
        body.insert("query".to_string(), self.query.to_value());
        let request = Request::new(self.model.index())
            .with_param("conflicts", "proceed")
            .with_param("refresh", true)
            .with_param("slices", 5)
            .with_body(Value::Object(body));

        let result = match self.dispatch(Method::DeleteByQuery, request).await {
            Ok(response) => response.into_body(),
            Err(fault)
                if fault.is_not_found()
                    || fault.message().contains("but no document was found") =>
            {
                Value::Null
            }
            Err(fault) => return Err(fault.into()),
        };
        Ok(result["deleted"].as_u64().unwrap_or(0) > 0)
    }

    /// Bulk-insert documents, preserving input order.
    ///
    /// A row carrying an `id` field is indexed under that id — re-running
    /// the same rows updates instead of duplicating. Each output slot is
    /// either a saved model or a failure marker, positionally aligned with
    /// the input so partial success stays inspectable.
    pub async fn insert(self, values: Vec<AttributeMap>) -> Result<Vec<BulkOutcome<M>>> {
        let mut lines = Vec::with_capacity(values.len() * 2);
        for value in &values {
            let mut action = Map::new();
            action.insert(
                "_index".to_string(),
                Value::String(self.model.index().to_string()),
            );
            if let Some(id) = value.get("id") {
                if !id.is_null() {
                    action.insert("_id".to_string(), id.clone());
                }
            }
            lines.push(json!({ "index": action }));
            lines.push(Value::Object(value.clone()));
        }

        let request = Request::new(self.model.index()).with_body(Value::Array(lines));
        let result = self
            .dispatch(Method::Bulk, request)
            .await
            .map_err(Error::from)?
            .into_body();

        let items = result["items"].as_array().cloned().unwrap_or_default();
        let outcomes = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let item = items.get(i).cloned().unwrap_or(Value::Null);
                let action = &item["index"];
                let outcome = action["result"].as_str().unwrap_or_default();
                if outcome == "created" || outcome == "updated" {
                    let mut attributes = value;
                    attributes.insert("id".to_string(), action["_id"].clone());
                    let mut model = self.model.new_instance();
                    model.set_attributes(attributes);
                    model.set_original(item.as_object().cloned().unwrap_or_default());
                    BulkOutcome::Saved(model)
                } else {
                    BulkOutcome::Failed {
                        result: outcome.to_string(),
                    }
                }
            })
            .collect();
        Ok(outcomes)
    }

    /// Index one document.
    ///
    /// `id`, `routing` and `timestamp` ride as request metadata;
    /// everything else (id included) is the document body. On a `created`
    /// result the model's attributes and original are replaced; the "not
    /// found" response class is logged and leaves the model untouched.
    pub async fn create(mut self, value: AttributeMap) -> Result<M> {
        let mut body = value.clone();
        body.remove("routing");
        body.remove("timestamp");

        let mut request = Request::new(self.model.index());
        if let Some(id) = value.get("id") {
            if !id.is_null() {
                request = request.with_id(id_string(id));
            }
        }
        if let Some(routing) = value.get("routing") {
            request = request.with_param("routing", routing.clone());
        }
        if let Some(timestamp) = value.get("timestamp") {
            request = request.with_param("timestamp", timestamp.clone());
        }
        let request = request.with_body(Value::Object(body.clone()));

        match self.dispatch(Method::Index, request).await {
            Ok(response) => {
                let result = response.into_body();
                if result["result"] == "created" {
                    self.model
                        .set_original(result.as_object().cloned().unwrap_or_default());
                    let mut attributes = body;
                    let id = match &result["_id"] {
                        Value::Null => Value::String(String::new()),
                        id => id.clone(),
                    };
                    attributes.insert("id".to_string(), id);
                    self.model.set_attributes(attributes);
                }
            }
            Err(fault) if fault.is_client_side() => {
                error!(
                    index = %self.model.index(),
                    error = %fault,
                    "create operation, client response fault"
                );
                if !fault.is_not_found() {
                    return Err(fault.into());
                }
            }
            Err(fault) => {
                error!(
                    index = %self.model.index(),
                    error = %fault,
                    "create operation failed"
                );
                return Err(fault.into());
            }
        }
        Ok(self.model)
    }

    /// Partial-document update by id.
    ///
    /// Returns the resolved id on an `updated` or `noop` result, `None`
    /// when the store rejected the request.
    pub async fn update_by_id(self, value: AttributeMap, id: impl ToString) -> Result<Option<String>> {
        let request = Request::new(self.model.index())
            .with_id(id.to_string())
            .with_body(json!({ "doc": value }));

        match self.dispatch(Method::Update, request).await {
            Ok(response) => {
                let result = response.into_body();
                let outcome = result["result"].as_str().unwrap_or_default();
                if outcome == "updated" || outcome == "noop" {
                    Ok(result["_id"].as_str().map(String::from))
                } else {
                    Ok(None)
                }
            }
            Err(fault) if fault.is_client_side() => Ok(None),
            Err(fault) => Err(fault.into()),
        }
    }

    /// Delete one document by id. A missing document is `false`, not an
    /// error.
    pub async fn delete_by_id(self, id: impl ToString) -> Result<bool> {
        let request = Request::new(self.model.index()).with_id(id.to_string());

        match self.dispatch(Method::Delete, request).await {
            Ok(response) => Ok(response.into_body()["result"] == "deleted"),
            Err(fault) if fault.is_not_found() => Ok(false),
            Err(fault) => Err(fault.into()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Index administration
    // ═══════════════════════════════════════════════════════════════════════

    /// Update field mappings on the index.
    ///
    /// A bare engine type name (`"keyword"`) normalizes to `{"type": name}`;
    /// structured mapping documents pass through unchanged.
    pub async fn update_index_mapping(self, mappings: IndexMap<String, Value>) -> Result<bool> {
        let mut properties = Map::new();
        for (field, value) in mappings {
            let normalized = match value {
                Value::String(name) => json!({ "type": name }),
                Value::Object(map) if !map.is_empty() => Value::Object(map),
                _ => continue,
            };
            properties.insert(field, normalized);
        }

        let request = Request::new(self.model.index())
            .with_body(json!({ "properties": properties }));
        let result = self
            .dispatch(Method::IndicesPutMapping, request)
            .await
            .map_err(Error::from)?
            .into_body();
        Ok(result["acknowledged"].as_bool().unwrap_or(false))
    }

    /// Update index settings.
    pub async fn update_index_setting(self, settings: Map<String, Value>) -> Result<bool> {
        let request = Request::new(self.model.index())
            .with_body(json!({ "settings": settings }));
        let result = self
            .dispatch(Method::IndicesPutSettings, request)
            .await
            .map_err(Error::from)?
            .into_body();
        Ok(result["acknowledged"].as_bool().unwrap_or(false))
    }

    /// Probe for index existence.
    pub async fn exists_index(&self) -> Result<bool> {
        let request = Request::new(self.model.index());
        let response = self
            .dispatch(Method::IndicesExists, request)
            .await
            .map_err(Error::from)?;
        Ok(response.status() == Some(200))
    }

    /// Create the index with mappings derived from the model's casts
    /// merged under any caller-supplied mappings (caller wins).
    ///
    /// No-ops with `false` when the index already exists; a client-side
    /// rejection during creation is also a plain `false`. Default shard
    /// count is 3, overridable through `settings`.
    pub async fn create_index(
        self,
        mappings: IndexMap<String, Value>,
        settings: Map<String, Value>,
    ) -> Result<bool> {
        let mut properties = Map::new();
        for (field, kind) in self.model.casts() {
            properties.insert(field.clone(), kind.mapping());
        }
        for (field, value) in mappings {
            properties.insert(field, convert_field_mapping(value)?);
        }

        if self.exists_index().await? {
            return Ok(false);
        }

        let mut settings_body = Map::new();
        settings_body.insert("number_of_shards".to_string(), json!(3));
        for (key, value) in settings {
            settings_body.insert(key, value);
        }

        let mut body = Map::new();
        body.insert("settings".to_string(), Value::Object(settings_body));
        body.insert(
            "mappings".to_string(),
            json!({"_source": {"enabled": true}, "properties": properties}),
        );
        prune(&mut body);

        let request = Request::new(self.model.index()).with_body(Value::Object(body));
        match self.dispatch(Method::IndicesCreate, request).await {
            Ok(response) => Ok(response.into_body()["acknowledged"].as_bool().unwrap_or(false)),
            Err(fault) if fault.is_client_side() => {
                warn!(index = %self.model.index(), error = %fault, "create index rejected");
                Ok(false)
            }
            Err(fault) => Err(fault.into()),
        }
    }

    /// Delete the index unconditionally.
    pub async fn delete_index(self) -> Result<bool> {
        let request = Request::new(self.model.index());
        let result = self
            .dispatch(Method::IndicesDelete, request)
            .await
            .map_err(Error::from)?
            .into_body();
        Ok(result["acknowledged"].as_bool().unwrap_or(false))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internal helpers
    // ═══════════════════════════════════════════════════════════════════════

    /// The wire query: accumulated buckets, or match-all when empty.
    fn wire_query(&self) -> Value {
        if self.query.is_empty() {
            json!({"match_all": {}})
        } else {
            self.query.to_value()
        }
    }

    /// Assemble the search body; empty members are pruned.
    fn search_body(&self, fields: &[&str]) -> Value {
        let mut body = Map::new();
        body.insert("_source".to_string(), json!({ "includes": fields }));
        body.insert("query".to_string(), self.wire_query());
        if !self.search_after.is_empty() {
            body.insert(
                "search_after".to_string(),
                Value::Array(self.search_after.clone()),
            );
        }
        if let Some(highlight) = &self.highlight {
            body.insert("highlight".to_string(), highlight.clone());
        }
        if !self.sort.is_empty() {
            body.insert("sort".to_string(), Value::Array(self.sort.clone()));
        }
        prune(&mut body);
        Value::Object(body)
    }

    async fn run_count(&self) -> Result<u64> {
        let mut body = Map::new();
        body.insert("query".to_string(), self.wire_query());
        prune(&mut body);

        let request = Request::new(self.model.index()).with_body(Value::Object(body));
        let result = match self.dispatch(Method::Count, request).await {
            Ok(response) => response.into_body(),
            Err(fault) if fault.is_not_found() => Value::Null,
            Err(fault) => return Err(fault.into()),
        };
        Ok(result["count"].as_u64().unwrap_or(0))
    }

    /// Log the assembled request, dispatch it, record metrics.
    async fn dispatch(
        &self,
        method: Method,
        request: Request,
    ) -> std::result::Result<Response, ClientFault> {
        match serde_json::to_string(&request) {
            Ok(assembled) => debug!(method = %method, request = %assembled, "dispatching"),
            Err(_) => debug!(method = %method, "dispatching"),
        }

        let start = Instant::now();
        let result = self.connection.client().run(method, request).await;
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_operation(method.as_str(), status);
        metrics::record_latency(method.as_str(), start.elapsed());
        result
    }

    /// Map one search hit into a model instance.
    ///
    /// The hit's payload becomes the attributes; the native id is coerced
    /// and injected when `*` or `id` was requested; the first highlight
    /// fragment per field overwrites the attribute, with dotted field
    /// names collapsed to their root segment.
    fn map_hit(&self, hit: &Value, fields: &[&str]) -> M {
        let mut attributes = hit["_source"].as_object().cloned().unwrap_or_default();
        if !attributes.is_empty() && (fields.contains(&"*") || fields.contains(&"id")) {
            attributes.insert("id".to_string(), coerce_id(&hit["_id"]));
        }
        if let Some(highlight) = hit["highlight"].as_object() {
            for (name, fragments) in highlight {
                let root = name.split('.').next().unwrap_or(name.as_str());
                if let Some(first) = fragments.as_array().and_then(|f| f.first()) {
                    attributes.insert(root.to_string(), first.clone());
                }
            }
        }

        let mut model = self.model.new_instance();
        model.set_attributes(attributes);
        model.set_original(hit.as_object().cloned().unwrap_or_default());
        model
    }
}

/// Drop empty and null members from a request body.
fn prune(body: &mut Map<String, Value>) {
    body.retain(|_, value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    });
}

/// Coerce a native hit id: purely numeric strings become integers.
fn coerce_id(id: &Value) -> Value {
    match id {
        Value::String(s) => match s.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(s.clone()),
        },
        other => other.clone(),
    }
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn convert_field_mapping(value: Value) -> Result<Value> {
    match value {
        Value::String(name) => {
            let kind = FieldKind::parse(&name).ok_or_else(|| {
                Error::Validation(format!("unknown source field type '{name}'"))
            })?;
            Ok(kind.mapping())
        }
        structured @ Value::Object(_) => Ok(structured),
        other => Err(Error::Validation(format!(
            "mapping value must be a type name or a mapping document, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCursorCache;
    use crate::client::SearchClient;
    use crate::model::DynamicModel;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    /// Client that refuses everything; for exercising pure builder state.
    struct DownClient;

    #[async_trait]
    impl SearchClient for DownClient {
        async fn run(
            &self,
            _method: Method,
            _request: Request,
        ) -> std::result::Result<Response, ClientFault> {
            Err(ClientFault::Transport("down".into()))
        }
    }

    fn connection() -> Connection {
        Connection::new(
            Arc::new(DownClient),
            Arc::new(MemoryCursorCache::new()),
            "test",
        )
    }

    fn builder() -> Builder<DynamicModel> {
        Builder::new(DynamicModel::new("users"), &connection())
    }

    #[test]
    fn test_empty_query_serializes_to_match_all() {
        let b = builder();
        assert_eq!(b.wire_query(), json!({"match_all": {}}));
    }

    #[test]
    fn test_search_body_omits_empty_members() {
        let b = builder();
        let body = b.search_body(&["*"]);
        let body = body.as_object().unwrap();
        assert!(body.contains_key("_source"));
        assert!(body.contains_key("query"));
        assert!(!body.contains_key("highlight"));
        assert!(!body.contains_key("sort"));
        assert!(!body.contains_key("search_after"));
    }

    #[test]
    fn test_search_body_with_full_state() {
        let b = builder()
            .where_term("status", "active")
            .order_by("ts", SortOrder::Desc)
            .select_highlight(&["title"]);
        let body = b.search_body(&["id", "title"]);

        assert_eq!(body["_source"]["includes"], json!(["id", "title"]));
        assert_eq!(
            body["query"]["bool"]["must"][0],
            json!({"term": {"status": "active"}})
        );
        assert_eq!(body["sort"][0]["ts"]["order"], "desc");
        assert_eq!(body["highlight"]["pre_tags"], json!(["<em>"]));
    }

    #[test]
    fn test_where_op_parses_spellings() {
        let b = builder()
            .where_op("age", ">=", 18)
            .unwrap()
            .where_op("name", "match", "alice")
            .unwrap()
            .where_op("status", "!=", "banned")
            .unwrap();

        let query = b.query().to_value();
        assert_eq!(query["bool"]["must"].as_array().unwrap().len(), 2);
        assert_eq!(query["bool"]["must_not"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_where_op_drops_unknown_operator() {
        let b = builder().where_op("age", "like", 18).unwrap();
        assert!(b.query().is_empty());
    }

    #[test]
    fn test_where_op_between_validates_bounds() {
        let err = builder()
            .where_op("age", "between", json!([18]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_where_between_builds_range() {
        let b = builder().where_between("age", 18, 30);
        assert_eq!(
            b.query().to_value()["bool"]["must"][0],
            json!({"range": {"age": {"gte": 18, "lte": 30}}})
        );
    }

    #[test]
    fn test_where_filter_distance_lands_in_filter_bucket() {
        let b = builder().where_filter_distance("location", 121.5, 31.2);
        let query = b.query().to_value();
        assert_eq!(
            query["bool"]["filter"][0]["geo_distance"]["distance"],
            "50km"
        );
        assert_eq!(
            query["bool"]["filter"][0]["geo_distance"]["location"],
            json!({"lat": 31.2, "lon": 121.5})
        );
    }

    #[test]
    fn test_order_by_distance_shape() {
        let b = builder().order_by_distance(
            "location",
            121.5,
            31.2,
            SortOrder::Asc,
            "km",
            SortMode::Min,
        );
        let sort = &b.sort[0]["_geo_distance"];
        assert_eq!(sort["location"], json!([31.2, 121.5]));
        assert_eq!(sort["unit"], "km");
        assert_eq!(sort["distance_type"], "arc");
        assert_eq!(sort["ignore_unmapped"], true);
    }

    #[test]
    fn test_select_highlight_empty_fields_is_noop() {
        let b = builder().select_highlight(&[]);
        assert!(b.highlight.is_none());
    }

    #[test]
    fn test_select_highlight_custom_tags() {
        let b = builder().select_highlight_with_tags(&["title"], &["<b>"], &["</b>"]);
        let highlight = b.highlight.unwrap();
        assert_eq!(highlight["pre_tags"], json!(["<b>"]));
        assert_eq!(highlight["post_tags"], json!(["</b>"]));
        assert_eq!(highlight["fields"]["title"], json!({}));
    }

    #[test]
    fn test_map_hit_requested_id() {
        let b = builder();
        let hit = json!({
            "_id": "42",
            "_source": {"name": "Alice"},
        });

        let model = b.map_hit(&hit, &["*"]);
        assert_eq!(model.attributes()["id"], 42);
        assert_eq!(model.attributes()["name"], "Alice");
        assert_eq!(model.original()["_id"], "42");
    }

    #[test]
    fn test_map_hit_unrequested_id_is_absent() {
        let b = builder();
        let hit = json!({"_id": "42", "_source": {"name": "Alice"}});
        let model = b.map_hit(&hit, &["name"]);
        assert!(model.attributes().get("id").is_none());
    }

    #[test]
    fn test_map_hit_non_numeric_id_stays_string() {
        let b = builder();
        let hit = json!({"_id": "doc-42", "_source": {"name": "Alice"}});
        let model = b.map_hit(&hit, &["*"]);
        assert_eq!(model.attributes()["id"], "doc-42");
    }

    #[test]
    fn test_map_hit_merges_highlight_with_dotted_name() {
        let b = builder();
        let hit = json!({
            "_id": "1",
            "_source": {"title": "plain title", "body": "text"},
            "highlight": {
                "title.keyword": ["<em>plain</em> title"],
                "body": ["<em>text</em>", "second fragment"]
            }
        });

        let model = b.map_hit(&hit, &["*"]);
        assert_eq!(model.attributes()["title"], "<em>plain</em> title");
        assert_eq!(model.attributes()["body"], "<em>text</em>");
    }

    #[test]
    fn test_coerce_id() {
        assert_eq!(coerce_id(&json!("7")), json!(7));
        assert_eq!(coerce_id(&json!("doc-7")), json!("doc-7"));
        assert_eq!(coerce_id(&json!(7)), json!(7));
    }

    #[test]
    fn test_prune_drops_empty_members() {
        let mut body = json!({
            "query": {"match_all": {}},
            "highlight": {},
            "sort": [],
            "search_after": null,
            "note": "",
            "size": 0
        })
        .as_object()
        .cloned()
        .unwrap();
        prune(&mut body);

        assert!(body.contains_key("query"));
        assert!(body.contains_key("size"));
        assert!(!body.contains_key("highlight"));
        assert!(!body.contains_key("sort"));
        assert!(!body.contains_key("search_after"));
        assert!(!body.contains_key("note"));
    }

    #[test]
    fn test_convert_field_mapping() {
        let derived = convert_field_mapping(json!("varchar")).unwrap();
        assert_eq!(derived["type"], "text");

        let passthrough = convert_field_mapping(json!({"type": "keyword"})).unwrap();
        assert_eq!(passthrough, json!({"type": "keyword"}));

        assert!(convert_field_mapping(json!("uuid")).is_err());
        assert!(convert_field_mapping(json!(42)).is_err());
    }

    #[tokio::test]
    async fn test_exists_requires_predicates_before_contacting_store() {
        // DownClient would fail any dispatch; the guard fires first.
        let err = builder().exists().await.unwrap_err();
        match err {
            Error::Logic { code, message } => {
                assert_eq!(code, 400);
                assert!(message.contains("missing query criteria"));
            }
            other => panic!("expected Logic error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_positional_payloads() {
        let b = builder().where_term("status", "active");
        let err = b.update(Map::new()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let b = builder().where_term("status", "active");
        let mut positional = Map::new();
        positional.insert("0".to_string(), json!("value"));
        let err = b.update(positional).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_deep_page_requires_sort() {
        let err = builder()
            .where_term("status", "active")
            .page(1, 10, &["*"], true)
            .await
            .unwrap_err();
        match err {
            Error::Logic { code, .. } => assert_eq!(code, 400),
            other => panic!("expected Logic error, got {other:?}"),
        }
    }
}
