use super::rpc_err;
use crate::transport::TransportError;
use alloy::{
    primitives::{Bytes, FixedBytes},
    rpc::json_rpc::ErrorPayload,
    sol_types::{Panic, Revert, SolError},
};
use thiserror::Error;

/// JSON-RPC error code nodes use for reverted calls.
pub const REVERT_ERROR_CODE: i32 = 3;

/// A decoded revert of a simulated call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution reverted{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
pub struct RevertError {
    /// Decoded reason, if the revert carried `Error(string)`, `Panic(uint256)` or a message.
    pub reason: Option<String>,
    /// Selector of the revert data, if any.
    pub selector: Option<FixedBytes<4>>,
    /// Raw revert data.
    pub data: Bytes,
}

impl RevertError {
    /// Decodes raw revert data.
    pub fn from_revert_data(data: Bytes) -> Self {
        let reason = if let Ok(revert) = Revert::abi_decode(&data) {
            Some(revert.reason)
        } else if let Ok(panic) = Panic::abi_decode(&data) {
            Some(panic.to_string())
        } else {
            None
        };
        let selector = data.get(..4).map(FixedBytes::from_slice);

        Self { reason, selector, data }
    }

    /// Returns a revert if successful call output is itself `Error(string)` or `Panic(uint256)`
    /// encoded.
    pub fn from_output(output: &Bytes) -> Option<Self> {
        (output.starts_with(&Revert::SELECTOR) || output.starts_with(&Panic::SELECTOR))
            .then(|| Self::from_revert_data(output.clone()))
    }

    /// Returns a revert if the error object describes one.
    pub fn from_error_payload(payload: &ErrorPayload) -> Option<Self> {
        if let Some(data) = payload.as_revert_data() {
            return Some(Self::from_revert_data(data));
        }

        payload.message.contains("revert").then(|| Self {
            reason: payload
                .message
                .strip_prefix("execution reverted")
                .map(|rest| rest.trim_start_matches(':').trim())
                .filter(|rest| !rest.is_empty())
                .map(ToOwned::to_owned),
            selector: None,
            data: Bytes::new(),
        })
    }
}

impl From<RevertError> for jsonrpsee_types::error::ErrorObject<'static> {
    fn from(err: RevertError) -> Self {
        let data = err.data.clone();
        rpc_err(REVERT_ERROR_CODE, err.to_string(), Some(data))
    }
}

/// Errors related to simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The simulated call reverted.
    #[error(transparent)]
    Reverted(#[from] RevertError),
    /// The node could not be asked.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
