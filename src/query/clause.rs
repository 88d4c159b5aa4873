// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Clause translation.
//!
//! [`translate`] maps a (field, operator, value, options) predicate to a
//! typed boolean-clause fragment plus the bucket it belongs in. The bucket
//! is a pure function of the operator:
//!
//! ```text
//! =, term, match, multi_match, match_phrase,
//! >, <, >=, <=, between, in, regex, prefix,
//! wildcard, exists                              → must
//! should_match, should_match_phrase             → should
//! !=, <>, not_term, not_match, not_match_phrase,
//! not_between, not_in, not_prefix, not_exists   → must_not
//! geo-distance filtering (not an operator)      → filter
//! ```
//!
//! Fragments stay typed ([`Clause`]) until request assembly; serialization
//! to the wire query language happens once, at the boundary, via
//! [`Clause::to_value`].

use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// Placement bucket inside the boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// AND semantics, scoring.
    Must,
    /// OR semantics.
    Should,
    /// AND NOT semantics.
    MustNot,
    /// AND semantics, non-scoring.
    Filter,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Must => "must",
            Bucket::Should => "should",
            Bucket::MustNot => "must_not",
            Bucket::Filter => "filter",
        }
    }
}

/// Supported predicate operators. Exhaustive: the stringly-typed surface
/// ([`Operator::parse`]) accepts exactly these spellings and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Ne,
    In,
    NotIn,
    Between,
    NotBetween,
    Match,
    ShouldMatch,
    NotMatch,
    MultiMatch,
    MatchPhrase,
    ShouldMatchPhrase,
    NotMatchPhrase,
    Term,
    NotTerm,
    Regex,
    Prefix,
    NotPrefix,
    Wildcard,
    Exists,
    NotExists,
}

impl Operator {
    pub const ALL: &'static [Operator] = &[
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Ne,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
        Operator::NotBetween,
        Operator::Match,
        Operator::ShouldMatch,
        Operator::NotMatch,
        Operator::MultiMatch,
        Operator::MatchPhrase,
        Operator::ShouldMatchPhrase,
        Operator::NotMatchPhrase,
        Operator::Term,
        Operator::NotTerm,
        Operator::Regex,
        Operator::Prefix,
        Operator::NotPrefix,
        Operator::Wildcard,
        Operator::Exists,
        Operator::NotExists,
    ];

    /// Accepted spellings at the stringly-typed surface.
    pub const SPELLINGS: &'static [&'static str] = &[
        "=", ">", "<", ">=", "<=", "!=", "<>", "in", "not_in", "between", "not_between",
        "should_match_phrase", "not_match_phrase", "match_phrase", "match", "should_match",
        "not_match", "multi_match", "term", "not_term", "regex", "prefix", "not_prefix",
        "wildcard", "not_exists", "exists",
    ];

    /// Parse the SQL-flavoured operator spelling used by `where_op`.
    pub fn parse(spelling: &str) -> Option<Self> {
        let op = match spelling {
            "=" => Operator::Eq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "!=" | "<>" => Operator::Ne,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "between" => Operator::Between,
            "not_between" => Operator::NotBetween,
            "match" => Operator::Match,
            "should_match" => Operator::ShouldMatch,
            "not_match" => Operator::NotMatch,
            "multi_match" => Operator::MultiMatch,
            "match_phrase" => Operator::MatchPhrase,
            "should_match_phrase" => Operator::ShouldMatchPhrase,
            "not_match_phrase" => Operator::NotMatchPhrase,
            "term" => Operator::Term,
            "not_term" => Operator::NotTerm,
            "regex" => Operator::Regex,
            "prefix" => Operator::Prefix,
            "not_prefix" => Operator::NotPrefix,
            "wildcard" => Operator::Wildcard,
            "exists" => Operator::Exists,
            "not_exists" => Operator::NotExists,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical spelling, for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Ne => "!=",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Between => "between",
            Operator::NotBetween => "not_between",
            Operator::Match => "match",
            Operator::ShouldMatch => "should_match",
            Operator::NotMatch => "not_match",
            Operator::MultiMatch => "multi_match",
            Operator::MatchPhrase => "match_phrase",
            Operator::ShouldMatchPhrase => "should_match_phrase",
            Operator::NotMatchPhrase => "not_match_phrase",
            Operator::Term => "term",
            Operator::NotTerm => "not_term",
            Operator::Regex => "regex",
            Operator::Prefix => "prefix",
            Operator::NotPrefix => "not_prefix",
            Operator::Wildcard => "wildcard",
            Operator::Exists => "exists",
            Operator::NotExists => "not_exists",
        }
    }

    /// Placement bucket. A pure function of the operator.
    pub fn bucket(self) -> Bucket {
        match self {
            Operator::Eq
            | Operator::Gt
            | Operator::Lt
            | Operator::Gte
            | Operator::Lte
            | Operator::In
            | Operator::Between
            | Operator::Match
            | Operator::MultiMatch
            | Operator::MatchPhrase
            | Operator::Term
            | Operator::Regex
            | Operator::Prefix
            | Operator::Wildcard
            | Operator::Exists => Bucket::Must,
            Operator::ShouldMatch | Operator::ShouldMatchPhrase => Bucket::Should,
            Operator::Ne
            | Operator::NotIn
            | Operator::NotBetween
            | Operator::NotMatch
            | Operator::NotMatchPhrase
            | Operator::NotTerm
            | Operator::NotPrefix
            | Operator::NotExists => Bucket::MustNot,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field name, or several for multi-field operators.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    Single(String),
    Multi(Vec<String>),
}

impl FieldRef {
    fn into_single(self, operator: Operator) -> Result<String> {
        match self {
            FieldRef::Single(field) => Ok(field),
            FieldRef::Multi(_) => Err(Error::Validation(format!(
                "operator '{operator}' takes a single field"
            ))),
        }
    }

    fn into_many(self) -> Vec<String> {
        match self {
            FieldRef::Single(field) => vec![field],
            FieldRef::Multi(fields) => fields,
        }
    }
}

impl From<&str> for FieldRef {
    fn from(field: &str) -> Self {
        FieldRef::Single(field.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(field: String) -> Self {
        FieldRef::Single(field)
    }
}

impl From<Vec<String>> for FieldRef {
    fn from(fields: Vec<String>) -> Self {
        FieldRef::Multi(fields)
    }
}

impl From<&[&str]> for FieldRef {
    fn from(fields: &[&str]) -> Self {
        FieldRef::Multi(fields.iter().map(|f| (*f).to_string()).collect())
    }
}

/// Range endpoint set. Only the populated bounds are serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    pub gt: Option<Value>,
    pub lt: Option<Value>,
    pub gte: Option<Value>,
    pub lte: Option<Value>,
}

impl RangeBounds {
    fn to_value(&self) -> Value {
        let mut bounds = Map::new();
        if let Some(v) = &self.gt {
            bounds.insert("gt".to_string(), v.clone());
        }
        if let Some(v) = &self.lt {
            bounds.insert("lt".to_string(), v.clone());
        }
        if let Some(v) = &self.gte {
            bounds.insert("gte".to_string(), v.clone());
        }
        if let Some(v) = &self.lte {
            bounds.insert("lte".to_string(), v.clone());
        }
        Value::Object(bounds)
    }
}

/// Typed boolean-clause fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact-term match.
    Term { field: String, value: Value },
    /// Full-text match.
    Match { field: String, query: Value },
    /// Phrase match with slop; extra caller options merged into the body.
    MatchPhrase {
        field: String,
        query: Value,
        slop: u64,
        options: Map<String, Value>,
    },
    /// Full-text match across a field list.
    MultiMatch { fields: Vec<String>, query: Value },
    Range { field: String, bounds: RangeBounds },
    /// Membership in a value set.
    Terms { field: String, values: Vec<Value> },
    Regexp { field: String, pattern: Value },
    Prefix { field: String, value: Value },
    Wildcard { field: String, pattern: Value },
    /// Field-presence check.
    Exists { field: String },
    /// Distance filter around a point. Always lands in the filter bucket.
    GeoDistance {
        field: String,
        latitude: f64,
        longitude: f64,
        distance: String,
    },
}

/// `{outer: {field: inner}}`
fn wrap(outer: &str, field: &str, inner: Value) -> Value {
    let mut by_field = Map::new();
    by_field.insert(field.to_string(), inner);
    let mut fragment = Map::new();
    fragment.insert(outer.to_string(), Value::Object(by_field));
    Value::Object(fragment)
}

impl Clause {
    /// Serialize to the wire query fragment.
    pub fn to_value(&self) -> Value {
        match self {
            Clause::Term { field, value } => wrap("term", field, value.clone()),
            Clause::Match { field, query } => wrap("match", field, query.clone()),
            Clause::MatchPhrase {
                field,
                query,
                slop,
                options,
            } => {
                let mut body = Map::new();
                body.insert("query".to_string(), query.clone());
                body.insert("slop".to_string(), Value::from(*slop));
                for (key, value) in options {
                    body.insert(key.clone(), value.clone());
                }
                wrap("match_phrase", field, Value::Object(body))
            }
            Clause::MultiMatch { fields, query } => {
                let mut body = Map::new();
                body.insert("query".to_string(), query.clone());
                body.insert(
                    "fields".to_string(),
                    Value::Array(fields.iter().map(|f| Value::String(f.clone())).collect()),
                );
                let mut fragment = Map::new();
                fragment.insert("multi_match".to_string(), Value::Object(body));
                Value::Object(fragment)
            }
            Clause::Range { field, bounds } => wrap("range", field, bounds.to_value()),
            Clause::Terms { field, values } => {
                wrap("terms", field, Value::Array(values.clone()))
            }
            Clause::Regexp { field, pattern } => wrap("regexp", field, pattern.clone()),
            Clause::Prefix { field, value } => wrap("prefix", field, value.clone()),
            Clause::Wildcard { field, pattern } => wrap("wildcard", field, pattern.clone()),
            Clause::Exists { field } => {
                let mut body = Map::new();
                body.insert("field".to_string(), Value::String(field.clone()));
                let mut fragment = Map::new();
                fragment.insert("exists".to_string(), Value::Object(body));
                Value::Object(fragment)
            }
            Clause::GeoDistance {
                field,
                latitude,
                longitude,
                distance,
            } => {
                let mut point = Map::new();
                point.insert("lat".to_string(), Value::from(*latitude));
                point.insert("lon".to_string(), Value::from(*longitude));
                let mut body = Map::new();
                body.insert("distance".to_string(), Value::String(distance.clone()));
                body.insert(field.clone(), Value::Object(point));
                let mut fragment = Map::new();
                fragment.insert("geo_distance".to_string(), Value::Object(body));
                Value::Object(fragment)
            }
        }
    }
}

/// Translate a predicate into its bucket and typed fragment.
///
/// `between`/`not_between` fail with a validation error when the value does
/// not carry two non-null bounds; other operators do not check value shape.
pub fn translate(
    field: impl Into<FieldRef>,
    operator: Operator,
    value: Value,
    options: Map<String, Value>,
) -> Result<(Bucket, Clause)> {
    let field = field.into();
    let bucket = operator.bucket();

    let clause = match operator {
        Operator::Eq | Operator::Term | Operator::Ne | Operator::NotTerm => Clause::Term {
            field: field.into_single(operator)?,
            value,
        },
        Operator::Match | Operator::ShouldMatch | Operator::NotMatch => Clause::Match {
            field: field.into_single(operator)?,
            query: value,
        },
        Operator::MultiMatch => Clause::MultiMatch {
            fields: field.into_many(),
            query: value,
        },
        Operator::MatchPhrase | Operator::ShouldMatchPhrase | Operator::NotMatchPhrase => {
            let mut options = options;
            let slop = options
                .remove("slop")
                .and_then(|v| v.as_u64())
                .unwrap_or(100);
            Clause::MatchPhrase {
                field: field.into_single(operator)?,
                query: value,
                slop,
                options,
            }
        }
        Operator::Gt => Clause::Range {
            field: field.into_single(operator)?,
            bounds: RangeBounds {
                gt: Some(value),
                ..Default::default()
            },
        },
        Operator::Lt => Clause::Range {
            field: field.into_single(operator)?,
            bounds: RangeBounds {
                lt: Some(value),
                ..Default::default()
            },
        },
        Operator::Gte => Clause::Range {
            field: field.into_single(operator)?,
            bounds: RangeBounds {
                gte: Some(value),
                ..Default::default()
            },
        },
        Operator::Lte => Clause::Range {
            field: field.into_single(operator)?,
            bounds: RangeBounds {
                lte: Some(value),
                ..Default::default()
            },
        },
        Operator::Between | Operator::NotBetween => {
            let bounds = between_bounds(operator, &value)?;
            Clause::Range {
                field: field.into_single(operator)?,
                bounds,
            }
        }
        Operator::In | Operator::NotIn => Clause::Terms {
            field: field.into_single(operator)?,
            values: match value {
                Value::Array(values) => values,
                other => vec![other],
            },
        },
        Operator::Regex => Clause::Regexp {
            field: field.into_single(operator)?,
            pattern: value,
        },
        Operator::Prefix | Operator::NotPrefix => Clause::Prefix {
            field: field.into_single(operator)?,
            value,
        },
        Operator::Wildcard => Clause::Wildcard {
            field: field.into_single(operator)?,
            pattern: value,
        },
        Operator::Exists | Operator::NotExists => Clause::Exists {
            field: field.into_single(operator)?,
        },
    };

    Ok((bucket, clause))
}

fn between_bounds(operator: Operator, value: &Value) -> Result<RangeBounds> {
    let bounds = value.as_array().and_then(|values| {
        match (values.first(), values.get(1)) {
            (Some(start), Some(end)) if !start.is_null() && !end.is_null() => {
                Some((start.clone(), end.clone()))
            }
            _ => None,
        }
    });
    let (start, end) = bounds.ok_or_else(|| {
        Error::Validation(format!(
            "the {operator} query value should contain start and end"
        ))
    })?;
    Ok(RangeBounds {
        gte: Some(start),
        lte: Some(end),
        ..Default::default()
    })
}

/// Accumulating boolean query: four ordered clause buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Clause>,
    pub should: Vec<Clause>,
    pub must_not: Vec<Clause>,
    pub filter: Vec<Clause>,
}

impl BoolQuery {
    /// Empty means "match all".
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Append a clause; order of appension is the caller's chain order.
    pub fn push(&mut self, bucket: Bucket, clause: Clause) {
        match bucket {
            Bucket::Must => self.must.push(clause),
            Bucket::Should => self.should.push(clause),
            Bucket::MustNot => self.must_not.push(clause),
            Bucket::Filter => self.filter.push(clause),
        }
    }

    /// Serialize to the wire form. Empty buckets are dropped; an entirely
    /// empty query serializes to `{"bool": {}}` and should be replaced by
    /// match-all at assembly time.
    pub fn to_value(&self) -> Value {
        let mut buckets = Map::new();
        for (bucket, clauses) in [
            (Bucket::Must, &self.must),
            (Bucket::Should, &self.should),
            (Bucket::MustNot, &self.must_not),
            (Bucket::Filter, &self.filter),
        ] {
            if !clauses.is_empty() {
                buckets.insert(
                    bucket.as_str().to_string(),
                    Value::Array(clauses.iter().map(Clause::to_value).collect()),
                );
            }
        }
        let mut query = Map::new();
        query.insert("bool".to_string(), Value::Object(buckets));
        Value::Object(query)
    }
}
