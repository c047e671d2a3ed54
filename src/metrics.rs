//! Recorder-agnostic metrics.
//!
//! Nothing here installs an exporter. Whatever recorder the host process sets up receives these.

use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for an [`EndpointTransport`](crate::transport::EndpointTransport).
#[derive(Metrics)]
#[metrics(scope = "transport")]
pub struct TransportMetrics {
    /// Number of endpoint attempts.
    pub attempts: Counter,
    /// Number of transient failures that moved a call to the next endpoint.
    pub failovers: Counter,
    /// Number of calls for which every endpoint failed.
    pub exhausted: Counter,
}

/// Metrics for a [`RelayService`](crate::relay::RelayService).
#[derive(Metrics)]
#[metrics(scope = "relay")]
pub struct RelayMetrics {
    /// Number of relayed meta-transactions.
    pub relayed: Counter,
    /// Number of requests rejected by local validation.
    pub rejected: Counter,
    /// Number of requests whose simulation reverted.
    pub reverted: Counter,
    /// Number of requests that failed after validation for any other reason
    pub failed: Counter,
    /// Time it takes to relay a request, in milliseconds.
    pub relay_time: Histogram,
}
