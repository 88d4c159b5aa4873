// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Wire client interface.
//!
//! The query builder talks to the document store through one narrow trait:
//! [`SearchClient::run`] accepts a [`Method`] plus a fully assembled
//! [`Request`] and returns either a parsed [`Response`] or a typed
//! [`ClientFault`]. Everything transport-level (pooling, retries, timeouts)
//! lives behind this trait.
//!
//! ```text
//! Builder ──run(method, request)──▶ SearchClient
//!                                       │
//!                                       ├─▶ HttpClient (reqwest, production)
//!                                       └─▶ scripted mocks (tests)
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

mod http;

pub use http::{ClientFactory, HttpClient};

/// Store methods the builder dispatches. Dotted names (`indices.*`) route
/// to the index-administration sub-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Search,
    Get,
    Count,
    Bulk,
    Index,
    Update,
    Delete,
    DeleteByQuery,
    UpdateByQuery,
    IndicesCreate,
    IndicesDelete,
    IndicesPutMapping,
    IndicesPutSettings,
    IndicesExists,
}

impl Method {
    /// Wire name of the method, dotted for sub-resource routes.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Search => "search",
            Method::Get => "get",
            Method::Count => "count",
            Method::Bulk => "bulk",
            Method::Index => "index",
            Method::Update => "update",
            Method::Delete => "delete",
            Method::DeleteByQuery => "deleteByQuery",
            Method::UpdateByQuery => "updateByQuery",
            Method::IndicesCreate => "indices.create",
            Method::IndicesDelete => "indices.delete",
            Method::IndicesPutMapping => "indices.putMapping",
            Method::IndicesPutSettings => "indices.putSettings",
            Method::IndicesExists => "indices.exists",
        }
    }

    /// Probe-style methods answer with a bare status code instead of a body.
    pub fn is_probe(self) -> bool {
        matches!(self, Method::IndicesExists)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled store request.
///
/// `params` carries the top-level request flags (`version`, `refresh`,
/// `from`, `size`, ...); `body` carries the JSON payload. For bulk requests
/// the body is an array of action/document lines which the transport
/// serializes as NDJSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Request {
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Request {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A store answer: a parsed JSON body, or a bare status code for
/// probe-style calls.
#[derive(Debug, Clone)]
pub enum Response {
    Body(Value),
    Status(u16),
}

impl Response {
    /// The JSON body, or `Null` for status-only answers.
    pub fn into_body(self) -> Value {
        match self {
            Response::Body(value) => value,
            Response::Status(_) => Value::Null,
        }
    }

    /// The status code of a probe-style answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Response::Status(code) => Some(*code),
            Response::Body(_) => None,
        }
    }
}

/// Typed failure surfaced by the wire client.
#[derive(Error, Debug, Clone)]
pub enum ClientFault {
    /// The store answered with a non-2xx status.
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientFault {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientFault::Status { status, .. } => Some(*status),
            ClientFault::Transport(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClientFault::Status { message, .. } => message,
            ClientFault::Transport(message) => message,
        }
    }

    /// The "not found" response class, absorbed by most terminal operations.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// 4xx-class fault: the request itself was rejected.
    pub fn is_client_side(&self) -> bool {
        matches!(self.status(), Some(code) if (400..500).contains(&code))
    }

    /// 5xx-class fault: the store failed to process a valid request.
    pub fn is_server_side(&self) -> bool {
        matches!(self.status(), Some(code) if code >= 500)
    }
}

impl From<ClientFault> for crate::error::Error {
    fn from(fault: ClientFault) -> Self {
        crate::error::Error::Logic {
            code: fault.status().unwrap_or(0),
            message: fault.message().to_string(),
        }
    }
}

/// The narrow interface the builder depends on.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn run(&self, method: Method, request: Request) -> Result<Response, ClientFault>;
}
