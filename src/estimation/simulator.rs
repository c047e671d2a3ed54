//! Revert-aware gas estimation.

use crate::{
    error::{RevertError, SimulationError},
    transport::EndpointTransport,
};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Estimates gas without ever reporting a number for a call that would revert.
///
/// The call is executed with `eth_call` while `eth_estimateGas` runs concurrently. A revert of the
/// call takes precedence over whatever the estimate returned.
#[derive(Debug, Clone)]
pub struct SafeEstimator {
    transport: Arc<EndpointTransport>,
}

impl SafeEstimator {
    /// Create a new estimator.
    pub const fn new(transport: Arc<EndpointTransport>) -> Self {
        Self { transport }
    }

    /// Returns the gas estimate of `request`, or `0` if the node could not estimate a call that
    /// does not revert.
    #[instrument(skip_all, fields(to = ?request.to))]
    pub async fn estimate(&self, request: &TransactionRequest) -> Result<u64, SimulationError> {
        let (call, estimate) =
            tokio::join!(self.transport.call(request), self.transport.estimate_gas(request));

        match call {
            Ok(output) => {
                if let Some(revert) = RevertError::from_output(&output) {
                    debug!(reason = ?revert.reason, "call returned revert data");
                    return Err(revert.into());
                }
            }
            Err(err) => {
                if let Some(revert) = err.as_error_resp().and_then(RevertError::from_error_payload)
                {
                    debug!(reason = ?revert.reason, "call reverted");
                    return Err(revert.into());
                }
                return Err(err.into());
            }
        }

        match estimate {
            Ok(gas) => Ok(gas),
            Err(err) => {
                warn!(%err, "gas estimation failed for a non-reverting call");
                Ok(0)
            }
        }
    }
}
