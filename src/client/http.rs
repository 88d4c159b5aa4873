//! HTTP transport for the wire client.
//!
//! [`ClientFactory`] validates a connection group's configuration and builds
//! an authenticated [`HttpClient`]. The client maps each [`Method`] to its
//! REST verb and path, appends top-level request params as the query string,
//! and parses the answer into a [`Response`] or a [`ClientFault`].
//!
//! Bulk bodies are serialized as NDJSON (one action/document line each);
//! probe-style methods (`indices.exists`) answer with the bare status code
//! and never fault on 404.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::{ConnectionConfig, ElasticConfig};
use crate::error::{Error, Result};

use super::{ClientFault, Method, Request, Response, SearchClient};

/// Builds [`HttpClient`]s from named connection groups.
pub struct ClientFactory {
    config: ElasticConfig,
}

impl ClientFactory {
    #[must_use]
    pub fn new(config: ElasticConfig) -> Self {
        Self { config }
    }

    /// Build a client for the given connection group.
    ///
    /// Fails with a configuration error when the group is missing or empty.
    pub fn create(&self, group: &str) -> Result<HttpClient> {
        let conn = self.config.connection(group).ok_or_else(|| {
            Error::Config(format!("connection group '{group}' is not configured"))
        })?;
        HttpClient::from_config(conn)
    }
}

/// reqwest-backed [`SearchClient`] with round-robin host selection.
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    hosts: Vec<Url>,
    next: AtomicUsize,
    auth: Option<(String, String)>,
}

impl HttpClient {
    /// Build a client from a single connection group.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(Error::Config(
                "connection config empty, at least one host is required".into(),
            ));
        }

        let hosts = config
            .hosts
            .iter()
            .map(|host| {
                Url::parse(host).map_err(|e| Error::Config(format!("invalid host '{host}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs_f64(config.timeout_secs));

        let mut auth = None;
        if config.enable_ssl {
            if let Some(path) = &config.ca_cert_path {
                let pem = fs::read(path)
                    .map_err(|e| Error::Config(format!("cannot read CA bundle '{path}': {e}")))?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Config(format!("invalid CA bundle '{path}': {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            if let (Some(user), Some(pass)) = (&config.username, &config.password) {
                auth = Some((user.clone(), pass.clone()));
            }
        }

        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("cannot build http client: {e}")))?;

        Ok(Self {
            http,
            hosts,
            next: AtomicUsize::new(0),
            auth,
        })
    }

    /// REST verb and path for a method. Pure routing, no I/O.
    fn route(method: Method, request: &Request) -> (reqwest::Method, String) {
        use reqwest::Method as Http;

        let index = &request.index;
        let id = request.id.as_deref().unwrap_or_default();

        match method {
            Method::Search => (Http::POST, format!("{index}/_search")),
            Method::Get => (Http::GET, format!("{index}/_doc/{id}")),
            Method::Count => (Http::POST, format!("{index}/_count")),
            Method::Bulk => (Http::POST, "_bulk".to_string()),
            Method::Index => match &request.id {
                Some(id) => (Http::PUT, format!("{index}/_doc/{id}")),
                None => (Http::POST, format!("{index}/_doc")),
            },
            Method::Update => (Http::POST, format!("{index}/_update/{id}")),
            Method::Delete => (Http::DELETE, format!("{index}/_doc/{id}")),
            Method::DeleteByQuery => (Http::POST, format!("{index}/_delete_by_query")),
            Method::UpdateByQuery => (Http::POST, format!("{index}/_update_by_query")),
            Method::IndicesCreate => (Http::PUT, index.clone()),
            Method::IndicesDelete => (Http::DELETE, index.clone()),
            Method::IndicesPutMapping => (Http::PUT, format!("{index}/_mapping")),
            Method::IndicesPutSettings => (Http::PUT, format!("{index}/_settings")),
            Method::IndicesExists => (Http::HEAD, index.clone()),
        }
    }

    fn next_host(&self) -> &Url {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        &self.hosts[i % self.hosts.len()]
    }

    /// Render a query-string parameter without JSON quoting on strings.
    fn param_str(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Serialize a bulk body (array of action/document lines) as NDJSON.
    fn to_ndjson(body: &Value) -> String {
        let lines = match body {
            Value::Array(lines) => lines.as_slice(),
            other => std::slice::from_ref(other),
        };
        let mut out = String::new();
        for line in lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }
}

#[async_trait]
impl SearchClient for HttpClient {
    async fn run(&self, method: Method, request: Request) -> std::result::Result<Response, ClientFault> {
        let (verb, path) = Self::route(method, &request);
        let url = self
            .next_host()
            .join(&path)
            .map_err(|e| ClientFault::Transport(format!("invalid request path '{path}': {e}")))?;
        debug!(method = %method, %url, "sending request");

        let mut req = self.http.request(verb, url);
        if let Some((user, pass)) = &self.auth {
            req = req.basic_auth(user, Some(pass));
        }
        for (key, value) in &request.params {
            req = req.query(&[(key.as_str(), Self::param_str(value))]);
        }
        if let Some(body) = &request.body {
            if method == Method::Bulk {
                req = req
                    .header(CONTENT_TYPE, "application/x-ndjson")
                    .body(Self::to_ndjson(body));
            } else {
                req = req.json(body);
            }
        }

        let response = req
            .send()
            .await
            .map_err(|e| ClientFault::Transport(e.to_string()))?;
        let status = response.status().as_u16();

        if method.is_probe() {
            return Ok(Response::Status(status));
        }

        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientFault::Status { status, message });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientFault::Transport(e.to_string()))?;
        if text.is_empty() {
            return Ok(Response::Status(status));
        }
        let value = serde_json::from_str(&text)
            .map_err(|e| ClientFault::Transport(format!("malformed response body: {e}")))?;
        Ok(Response::Body(value))
    }
}
