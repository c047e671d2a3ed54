use super::invalid_params;
use crate::orders::OrderDecodeError;
use alloy::primitives::{Address, ChainId, U256};
use thiserror::Error;

/// Local rejections of a relay request. None of these touch the network.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The authorization expires too soon to be mined safely.
    #[error("authorization expires at {expiration}, less than {buffer}s after {now}")]
    AuthorizationNearExpiry {
        /// Expiration of the authorization.
        expiration: u64,
        /// Current unix time.
        now: u64,
        /// Required time to expiry, in seconds.
        buffer: u64,
    },
    /// The signature does not recover to the authorization's signer.
    #[error("signature does not match signer {signer}")]
    SignatureMismatch {
        /// The claimed signer.
        signer: Address,
    },
    /// An order filled by the authorization expires too soon.
    #[error("order of maker {maker} expires at {expiry}, less than {buffer}s after {now}")]
    OrderNearExpiry {
        /// Maker of the order.
        maker: Address,
        /// Expiry of the order.
        expiry: u64,
        /// Current unix time.
        now: u64,
        /// Required time to expiry, in seconds.
        buffer: u64,
    },
    /// The authorization was signed for another chain.
    #[error("authorization is for chain {got}, expected chain {expected}")]
    ChainIdMismatch {
        /// The chain the relay submits on.
        expected: ChainId,
        /// The chain in the authorization domain.
        got: ChainId,
    },
    /// The gas price bounds are inverted or out of range.
    #[error("invalid gas price range, min {min}, max {max}")]
    InvalidGasPriceRange {
        /// Minimum gas price.
        min: U256,
        /// Maximum gas price.
        max: U256,
    },
    /// The authorization may only be submitted by another account.
    #[error("authorization must be submitted by {sender}, relayer is {relayer}")]
    SenderMismatch {
        /// Required sender.
        sender: Address,
        /// The relayer's address.
        relayer: Address,
    },
    /// The call data does not fill any supported orders.
    #[error("invalid call data: {0}")]
    InvalidCallData(#[from] OrderDecodeError),
}

impl From<ValidationError> for jsonrpsee_types::error::ErrorObject<'static> {
    fn from(err: ValidationError) -> Self {
        invalid_params(err.to_string())
    }
}
