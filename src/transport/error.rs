use super::EndpointError;
use alloy::rpc::json_rpc::ErrorPayload;
use http::StatusCode;
use thiserror::Error;
use url::Url;

/// A failure that makes the transport move on to the next endpoint.
#[derive(Debug, Error)]
pub enum TransientError {
    /// The endpoint answered with 429, 502 or 503.
    #[error("{endpoint} responded with HTTP {status}")]
    Status {
        /// Endpoint that failed.
        endpoint: Url,
        /// Returned status.
        status: StatusCode,
    },
    /// The endpoint could not be reached.
    #[error("{endpoint} is unreachable: {source}")]
    Network {
        /// Endpoint that failed.
        endpoint: Url,
        /// Underlying failure.
        #[source]
        source: EndpointError,
    },
}

/// Errors returned by [`EndpointTransport`](super::EndpointTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every endpoint failed transiently.
    #[error("all {attempts} RPC endpoints failed, last: {last}")]
    AllEndpointsExhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Last transient failure.
        last: Box<TransientError>,
    },
    /// An endpoint rejected the request with a non-transient HTTP status.
    #[error("{endpoint} rejected the request with HTTP {status}: {body}")]
    Http {
        /// Endpoint that rejected the request.
        endpoint: Url,
        /// Returned status.
        status: StatusCode,
        /// Returned body, lossily decoded.
        body: String,
    },
    /// The reply could not be parsed.
    #[error("malformed RPC response: {source}")]
    Deser {
        /// Parse error.
        #[source]
        source: serde_json::Error,
        /// The text that failed to parse.
        text: String,
    },
    /// The node answered with a JSON-RPC error object.
    #[error("server returned an error response: error code {}: {}", .0.code, .0.message)]
    Rpc(ErrorPayload),
    /// The request could not be serialized.
    #[error("failed to serialize RPC request: {0}")]
    Ser(#[source] serde_json::Error),
}

impl TransportError {
    /// Returns the JSON-RPC error object, if the node returned one.
    pub const fn as_error_resp(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Rpc(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether the node reported the transaction as already known.
    pub fn is_already_known(&self) -> bool {
        self.as_error_resp().is_some_and(|err| err.message == "already known")
    }

    /// Whether the node rejected the transaction because its nonce is stale.
    pub fn is_nonce_too_low(&self) -> bool {
        self.as_error_resp().is_some_and(|err| err.message.contains("nonce too low"))
    }
}
