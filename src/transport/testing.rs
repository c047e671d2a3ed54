//! Endpoint doubles for tests.

use super::{Endpoint, EndpointError, EndpointReply};
use bytes::Bytes;
use futures_util::{FutureExt, future::BoxFuture};
use http::StatusCode;
use serde_json::{Value, json};
use std::task::{Context, Poll};
use tower::Service;

/// Creates a service from a closure returning a future.
pub(crate) fn request_fn<T>(f: T) -> RequestFn<T> {
    RequestFn { f }
}

#[derive(Clone)]
pub(crate) struct RequestFn<T> {
    f: T,
}

impl<T> Service<Bytes> for RequestFn<T>
where
    T: FnMut(Bytes) -> BoxFuture<'static, Result<EndpointReply, EndpointError>>,
{
    type Response = EndpointReply;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<EndpointReply, EndpointError>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Bytes) -> Self::Future {
        (self.f)(req)
    }
}

/// An endpoint named `name` backed by a closure.
pub(crate) fn endpoint<T>(name: &str, f: T) -> Endpoint
where
    T: FnMut(Bytes) -> BoxFuture<'static, Result<EndpointReply, EndpointError>>
        + Clone
        + Send
        + Sync
        + 'static,
{
    let url = format!("http://{name}.invalid").parse().expect("valid url");
    Endpoint::new(url, request_fn(f))
}

/// An endpoint that answers every request with the same status and body.
pub(crate) fn fixed(name: &str, status: StatusCode, body: &'static str) -> Endpoint {
    endpoint(name, move |_| async move { Ok(EndpointReply::new(status, body)) }.boxed())
}

/// An endpoint that always fails at the network level.
pub(crate) fn unreachable(name: &str) -> Endpoint {
    endpoint(name, |_| {
        async {
            Err(EndpointError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
        .boxed()
    })
}

/// A node answering by method name. The handler returns either a result or an error object.
pub(crate) fn mock_node<H>(handler: H) -> Endpoint
where
    H: Fn(&str, &Value) -> Result<Value, Value> + Clone + Send + Sync + 'static,
{
    endpoint("node", move |body: Bytes| {
        let request: Value = serde_json::from_slice(&body).expect("valid request");
        let id = request["id"].clone();
        let method = request["method"].as_str().unwrap_or_default().to_string();
        let reply = match handler(&method, &request["params"]) {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
        };
        async move { Ok(EndpointReply::ok(reply.to_string())) }.boxed()
    })
}

/// A JSON-RPC `result` reply body.
pub(crate) fn rpc_result(result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 0, "result": result }).to_string()
}

/// A JSON-RPC `error` reply body.
pub(crate) fn rpc_error(code: i64, message: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 0, "error": { "code": code, "message": message } })
        .to_string()
}
