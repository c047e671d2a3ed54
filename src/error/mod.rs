//! Relay error types.
use crate::{transactions::SignerError, transport::TransportError};
use alloy::primitives::{Bytes, TxHash};
use core::fmt;
use std::time::Duration;
use thiserror::Error;

mod simulation;
pub use simulation::{REVERT_ERROR_CODE, RevertError, SimulationError};

mod validation;
pub use validation::ValidationError;

/// The overarching error type returned by [`RelayService::relay`](crate::relay::RelayService).
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request was rejected before anything was signed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Simulating the meta-transaction reverted.
    #[error(transparent)]
    Reverted(#[from] RevertError),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The transaction could not be signed.
    #[error(transparent)]
    Signer(#[from] SignerError),
    /// The relay deadline elapsed before a transaction was signed. Nothing was broadcast.
    #[error("relay deadline of {}s exceeded", .0.as_secs())]
    DeadlineExceeded(Duration),
    /// The relay deadline elapsed after the transaction was signed. It may or may not have been
    /// broadcast.
    #[error("relay deadline exceeded after signing {tx_hash}, submission outcome unknown")]
    OutcomeUnknown {
        /// Hash of the signed transaction.
        tx_hash: TxHash,
    },
}

impl From<SimulationError> for RelayError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::Reverted(revert) => Self::Reverted(revert),
            SimulationError::Transport(err) => Self::Transport(err),
        }
    }
}

impl From<RelayError> for jsonrpsee_types::error::ErrorObject<'static> {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Validation(inner) => inner.into(),
            RelayError::Reverted(inner) => inner.into(),
            RelayError::Transport(TransportError::Rpc(payload)) => jsonrpsee_types::ErrorObject::owned(
                payload.code as i32,
                payload.message.into_owned(),
                payload.data,
            ),
            RelayError::Transport(_)
            | RelayError::Signer(_)
            | RelayError::DeadlineExceeded(_)
            | RelayError::OutcomeUnknown { .. } => internal_rpc(err),
        }
    }
}

/// Result of a JSON-RPC method handler.
pub type RpcResult<T> = Result<T, jsonrpsee_types::ErrorObjectOwned>;

/// A helper trait to provide an RPC error code.
pub trait ToRpcResult<Ok, Err>: Sized {
    /// Converts result to [`RpcResult`] by converting error variant to
    /// [`jsonrpsee_types::error::ErrorObject`]
    fn to_rpc_result(self) -> RpcResult<Ok>
    where
        Err: fmt::Display;
}

macro_rules! impl_error_helpers {
    ($err:ty) => {
        impl<Ok> ToRpcResult<Ok, $err> for Result<Ok, $err> {
            fn to_rpc_result(self) -> RpcResult<Ok> {
                self.map_err(|err| err.into())
            }
        }

        impl From<$err> for String {
            fn from(err: $err) -> Self {
                err.to_string()
            }
        }
    };
}

impl_error_helpers!(RelayError);
impl_error_helpers!(ValidationError);
impl_error_helpers!(RevertError);

/// Constructs an invalid params JSON‑RPC error.
fn invalid_params(msg: impl Into<String>) -> jsonrpsee_types::error::ErrorObject<'static> {
    rpc_err(jsonrpsee_types::error::INVALID_PARAMS_CODE, msg, None)
}

/// Constructs an internal JSON‑RPC error.
fn internal_rpc(msg: impl Into<String>) -> jsonrpsee_types::error::ErrorObject<'static> {
    rpc_err(jsonrpsee_types::error::INTERNAL_ERROR_CODE, msg, None)
}

/// Constructs a JSON‑RPC error with `code`, `message` and optional `data`.
fn rpc_err(
    code: i32,
    msg: impl Into<String>,
    data: Option<Bytes>,
) -> jsonrpsee_types::error::ErrorObject<'static> {
    jsonrpsee_types::error::ErrorObject::owned(code, msg.into(), data)
}
