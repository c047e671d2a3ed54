//! Failover JSON-RPC transport.
//!
//! An [`EndpointTransport`] sends each JSON-RPC call to an ordered list of endpoints, trying them
//! strictly in priority order. Transient failures (HTTP 429, 502, 503 and network errors) move on
//! to the next endpoint. Everything else ends the call immediately.

mod endpoint;
pub use endpoint::{EndpointError, EndpointReply, HttpEndpoint};

mod error;
pub use error::{TransientError, TransportError};

mod timeout;
pub use timeout::{TimeoutLayer, TimeoutService};

#[cfg(test)]
pub(crate) mod testing;

use crate::metrics::TransportMetrics;
use alloy::{
    primitives::ChainId,
    rpc::json_rpc::{Id, Request, Response, ResponsePayload, RpcSend},
};
use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tower::{Layer, Service, ServiceExt, util::BoxCloneSyncService};
use tracing::{debug, error, trace, warn};
use url::Url;

/// Type-erased endpoint service.
pub type BoxEndpoint = BoxCloneSyncService<Bytes, EndpointReply, EndpointError>;

/// One entry of the endpoint list.
#[derive(Clone)]
pub struct Endpoint {
    url: Url,
    service: BoxEndpoint,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Endpoint").field(&self.url.as_str()).finish()
    }
}

impl Endpoint {
    /// Create an endpoint from any service mapping a request body to a reply.
    pub fn new<S>(url: Url, service: S) -> Self
    where
        S: Service<Bytes, Response = EndpointReply, Error = EndpointError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self { url, service: BoxCloneSyncService::new(service) }
    }

    /// The endpoint URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

/// Whether an HTTP status should make the transport fail over.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE
    )
}

/// A JSON-RPC request, serialized once and replayed verbatim on every attempt.
#[derive(Debug, Clone)]
pub struct RpcCall {
    method: &'static str,
    id: u64,
    body: Bytes,
}

impl RpcCall {
    /// Serialize a request.
    pub fn new<P: RpcSend>(
        method: &'static str,
        id: u64,
        params: P,
    ) -> Result<Self, serde_json::Error> {
        let request = Request::new(method, Id::Number(id), params);
        let body = serde_json::to_vec(&request)?;
        Ok(Self { method, id, body: body.into() })
    }

    /// The method name.
    pub const fn method(&self) -> &'static str {
        self.method
    }

    /// The request id.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The serialized request.
    pub const fn body(&self) -> &Bytes {
        &self.body
    }
}

/// A JSON-RPC transport failing over across an ordered, non-empty endpoint list.
pub struct EndpointTransport {
    endpoints: Vec<Endpoint>,
    next_id: AtomicU64,
    metrics: TransportMetrics,
}

impl fmt::Debug for EndpointTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointTransport").field("endpoints", &self.endpoints).finish()
    }
}

impl EndpointTransport {
    /// Create a new transport. The first endpoint is the primary.
    ///
    /// # Panics
    ///
    /// Panics if `endpoints` is empty.
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        assert!(!endpoints.is_empty(), "endpoint list must not be empty");
        Self { endpoints, next_id: AtomicU64::new(0), metrics: TransportMetrics::default() }
    }

    /// Create a transport over HTTP endpoints sharing one connection pool, each request bounded
    /// by `timeout`.
    ///
    /// # Panics
    ///
    /// Panics if `urls` is empty.
    pub fn http(urls: &[Url], timeout: Duration, chain_id: ChainId) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        let layer = TimeoutLayer::new(timeout, chain_id);

        Ok(Self::new(
            urls.iter()
                .map(|url| {
                    Endpoint::new(
                        url.clone(),
                        layer.layer(HttpEndpoint::new(client.clone(), url.clone())),
                    )
                })
                .collect(),
        ))
    }

    /// The endpoints in priority order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Url> {
        self.endpoints.iter().map(Endpoint::url)
    }

    /// Send a request and deserialize its result.
    pub async fn request<P, R>(&self, method: &'static str, params: P) -> Result<R, TransportError>
    where
        P: RpcSend,
        R: DeserializeOwned,
    {
        let call = RpcCall::new(method, self.next_id.fetch_add(1, Ordering::Relaxed), params)
            .map_err(TransportError::Ser)?;
        let raw = self.send(&call).await?;

        serde_json::from_str(raw.get()).map_err(|source| {
            error!(method, %source, "could not decode RPC result");
            TransportError::Deser { source, text: raw.get().to_string() }
        })
    }

    /// Send a serialized call, failing over on transient errors.
    ///
    /// Makes at most one attempt per endpoint.
    pub async fn send(&self, call: &RpcCall) -> Result<Box<RawValue>, TransportError> {
        let method = call.method();
        let mut last = None;

        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            let attempt = idx + 1;
            self.metrics.attempts.increment(1);
            trace!(endpoint = %endpoint.url, method, id = call.id(), attempt, "sending RPC request");

            let reply = match endpoint.service.clone().oneshot(call.body().clone()).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(endpoint = %endpoint.url, method, attempt, %err, "RPC endpoint unreachable");
                    self.metrics.failovers.increment(1);
                    last = Some(TransientError::Network { endpoint: endpoint.url.clone(), source: err });
                    continue;
                }
            };

            if is_transient_status(reply.status) {
                warn!(endpoint = %endpoint.url, method, attempt, status = %reply.status, "RPC endpoint unavailable");
                self.metrics.failovers.increment(1);
                last = Some(TransientError::Status {
                    endpoint: endpoint.url.clone(),
                    status: reply.status,
                });
                continue;
            }

            if !reply.status.is_success() {
                let body = String::from_utf8_lossy(&reply.body).into_owned();
                error!(endpoint = %endpoint.url, method, attempt, status = %reply.status, %body, "RPC endpoint rejected request");
                return Err(TransportError::Http {
                    endpoint: endpoint.url.clone(),
                    status: reply.status,
                    body,
                });
            }

            let response: Response = match serde_json::from_slice(&reply.body) {
                Ok(response) => response,
                Err(source) => {
                    error!(endpoint = %endpoint.url, method, attempt, %source, "malformed RPC response");
                    return Err(TransportError::Deser {
                        source,
                        text: String::from_utf8_lossy(&reply.body).into_owned(),
                    });
                }
            };

            return match response.payload {
                ResponsePayload::Success(result) => Ok(result),
                ResponsePayload::Failure(payload) => {
                    debug!(endpoint = %endpoint.url, method, code = payload.code, message = %payload.message, "RPC error response");
                    Err(TransportError::Rpc(payload))
                }
            };
        }

        self.metrics.exhausted.increment(1);
        error!(method, attempts = self.endpoints.len(), "all RPC endpoints failed");

        Err(TransportError::AllEndpointsExhausted {
            attempts: self.endpoints.len(),
            last: Box::new(last.expect("endpoint list is non-empty")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        testing::{endpoint, fixed, rpc_error, rpc_result, unreachable},
        *,
    };
    use alloy::primitives::U64;
    use futures_util::FutureExt;
    use serde_json::json;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    /// Wraps an endpoint so every attempt increments `counter`.
    fn counted(counter: &Arc<AtomicUsize>, inner: Endpoint) -> Endpoint {
        let counter = Arc::clone(counter);
        let url = inner.url.clone();
        Endpoint::new(
            url,
            tower::service_fn(move |body: Bytes| {
                counter.fetch_add(1, Ordering::SeqCst);
                inner.service.clone().oneshot(body)
            }),
        )
    }

    #[tokio::test]
    async fn fails_over_to_first_healthy_endpoint() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = EndpointTransport::new(vec![
            counted(&attempts, fixed("a", StatusCode::SERVICE_UNAVAILABLE, "")),
            counted(&attempts, fixed("b", StatusCode::TOO_MANY_REQUESTS, "")),
            counted(&attempts, unreachable("c")),
            counted(&attempts, fixed("d", StatusCode::OK, r#"{"jsonrpc":"2.0","id":0,"result":"0x7"}"#)),
            counted(&attempts, fixed("e", StatusCode::OK, r#"{"jsonrpc":"2.0","id":0,"result":"0x9"}"#)),
        ]);

        let count: U64 = transport.request("eth_blockNumber", ()).await.unwrap();
        assert_eq!(count, U64::from(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fatal_status_stops_failover() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = EndpointTransport::new(vec![
            counted(&attempts, fixed("a", StatusCode::BAD_REQUEST, "bad request")),
            counted(&attempts, fixed("b", StatusCode::OK, r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#)),
        ]);

        let err = transport.request::<_, U64>("eth_blockNumber", ()).await.unwrap_err();
        assert!(
            matches!(err, TransportError::Http { status, ref body, .. } if status == StatusCode::BAD_REQUEST && body == "bad request")
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_after_one_attempt_per_endpoint() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = EndpointTransport::new(vec![
            counted(&attempts, unreachable("a")),
            counted(&attempts, unreachable("b")),
            counted(&attempts, unreachable("c")),
        ]);

        let err = transport.request::<_, U64>("eth_blockNumber", ()).await.unwrap_err();
        let TransportError::AllEndpointsExhausted { attempts: reported, last } = err else {
            panic!("expected exhaustion, got {err:?}");
        };
        assert_eq!(reported, 3);
        assert!(matches!(*last, TransientError::Network { ref endpoint, .. } if endpoint.as_str() == "http://c.invalid/"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rpc_error_stops_failover() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let error = rpc_error(-32000, "insufficient funds");
        let transport = EndpointTransport::new(vec![
            counted(
                &attempts,
                endpoint("a", move |_| {
                    let error = error.clone();
                    async move { Ok(EndpointReply::ok(error)) }.boxed()
                }),
            ),
            counted(&attempts, fixed("b", StatusCode::OK, r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#)),
        ]);

        let err = transport.request::<_, U64>("eth_sendRawTransaction", ["0x00"]).await.unwrap_err();
        let payload = err.as_error_resp().unwrap();
        assert_eq!(payload.code, -32000);
        assert_eq!(payload.message, "insufficient funds");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_body_stops_failover() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = EndpointTransport::new(vec![
            counted(&attempts, fixed("a", StatusCode::OK, "<html>gateway</html>")),
            counted(&attempts, fixed("b", StatusCode::OK, r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#)),
        ]);

        let err = transport.request::<_, U64>("eth_blockNumber", ()).await.unwrap_err();
        assert!(matches!(err, TransportError::Deser { ref text, .. } if text == "<html>gateway</html>"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn result_of_wrong_type_is_a_parse_error() {
        let body = rpc_result(json!({ "unexpected": true }));
        let transport = EndpointTransport::new(vec![endpoint("a", move |_| {
            let body = body.clone();
            async move { Ok(EndpointReply::ok(body)) }.boxed()
        })]);

        let err = transport.request::<_, U64>("eth_blockNumber", ()).await.unwrap_err();
        assert!(matches!(err, TransportError::Deser { .. }));
    }

    #[tokio::test]
    async fn replays_identical_bytes_with_increasing_ids() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = |name: &str, status| {
            let seen = Arc::clone(&seen);
            endpoint(name, move |body: Bytes| {
                seen.lock().unwrap().push(body);
                async move {
                    Ok(EndpointReply::new(status, r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#))
                }
                .boxed()
            })
        };
        let transport = EndpointTransport::new(vec![
            record("a", StatusCode::BAD_GATEWAY),
            record("b", StatusCode::OK),
        ]);

        transport.request::<_, U64>("eth_chainId", ()).await.unwrap();
        transport.request::<_, U64>("eth_chainId", ()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[2], seen[3]);
        let ids: Vec<u64> = seen
            .iter()
            .map(|body| serde_json::from_slice::<serde_json::Value>(body).unwrap()["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![0, 0, 1, 1]);
    }

    #[test]
    #[should_panic(expected = "endpoint list must not be empty")]
    fn empty_endpoint_list_panics() {
        EndpointTransport::new(Vec::new());
    }
}
