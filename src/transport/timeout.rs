//! Timeout layer for endpoint requests.

use super::{EndpointError, EndpointReply};
use alloy::primitives::ChainId;
use bytes::Bytes;
use futures_util::{FutureExt, future::BoxFuture};
use std::{
    task::{Context, Poll},
    time::Duration,
};
use tower::{Layer, Service};
use tracing::warn;

/// A [`tower::Layer`] that bounds every endpoint request by a timeout.
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
    chain_id: ChainId,
}

impl TimeoutLayer {
    /// Create a new [`TimeoutLayer`] with the given timeout duration and chain ID.
    pub const fn new(timeout: Duration, chain_id: ChainId) -> Self {
        Self { timeout, chain_id }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService { inner, timeout: self.timeout, chain_id: self.chain_id }
    }
}

/// An endpoint service whose requests fail with [`EndpointError::Timeout`] once the timeout
/// elapses.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout: Duration,
    chain_id: ChainId,
}

impl<S> Service<Bytes> for TimeoutService<S>
where
    S: Service<Bytes, Response = EndpointReply, Error = EndpointError>,
    S::Future: Send + 'static,
{
    type Response = EndpointReply;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<EndpointReply, EndpointError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, body: Bytes) -> Self::Future {
        let fut = self.inner.call(body);
        let timeout = self.timeout;
        let chain_id = self.chain_id;

        async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%chain_id, timeout_secs = timeout.as_secs(), "RPC request timeout");
                    Err(EndpointError::Timeout(timeout))
                }
            }
        }
        .boxed()
    }
}
