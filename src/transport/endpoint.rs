//! A single JSON-RPC endpoint reachable over HTTP.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{HeaderValue, StatusCode, header};
use std::{
    task::{Context, Poll},
    time::Duration,
};
use tower::Service;
use url::Url;

/// The raw reply of an endpoint to a JSON-RPC request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReply {
    /// HTTP status of the reply.
    pub status: StatusCode,
    /// Unparsed reply body.
    pub body: Bytes,
}

impl EndpointReply {
    /// Create a new reply.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    /// Create a `200 OK` reply.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// A network-level failure reaching an endpoint.
///
/// Every variant is transient from the transport's point of view.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The HTTP client failed to connect, send or read the body.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The endpoint did not reply in time.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A [`tower::Service`] that POSTs JSON-RPC bodies to one URL.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: Url,
}

impl HttpEndpoint {
    /// Create a new endpoint sharing the given client's connection pool.
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

impl Service<Bytes> for HttpEndpoint {
    type Response = EndpointReply;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<EndpointReply, EndpointError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, body: Bytes) -> Self::Future {
        let request = self
            .client
            .post(self.url.clone())
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(header::CONNECTION, HeaderValue::from_static("keep-alive"))
            .body(body);

        Box::pin(async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok(EndpointReply { status, body })
        })
    }
}
