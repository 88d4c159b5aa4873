// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the query layer.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `elastic_model_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `method`: the store method dispatched (search, count, bulk, ...)
//! - `status`: success, error

use metrics::{counter, histogram};
use std::time::Duration;

/// Record a dispatched store operation and its outcome.
pub fn record_operation(method: &str, status: &str) {
    counter!(
        "elastic_model_operations_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency.
pub fn record_latency(method: &str, duration: Duration) {
    histogram!(
        "elastic_model_operation_seconds",
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record how many hits a search-class operation returned.
pub fn record_result_count(count: usize) {
    histogram!("elastic_model_result_count").record(count as f64);
}
