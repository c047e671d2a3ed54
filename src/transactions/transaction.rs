use super::TransactionParams;
use alloy::{
    consensus::TxEnvelope,
    eips::Encodable2718,
    primitives::{Address, Bytes, ChainId, TxHash, U256},
};
use serde::{Deserialize, Serialize};

/// A signed transaction ready for broadcast, together with the fields it was built from.
///
/// `hash` is computed locally from the signed bytes, so it is known before broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransactionEnvelope {
    /// Destination of the transaction.
    pub to: Address,
    /// Call data.
    pub data: Bytes,
    /// Value sent.
    pub value: U256,
    /// Gas limit.
    #[serde(with = "alloy::serde::quantity")]
    pub gas: u64,
    /// Gas price.
    #[serde(with = "alloy::serde::quantity")]
    pub gas_price: u128,
    /// Nonce.
    #[serde(with = "alloy::serde::quantity")]
    pub nonce: u64,
    /// Chain ID.
    #[serde(with = "alloy::serde::quantity")]
    pub chain_id: ChainId,
    /// Transaction hash.
    pub hash: TxHash,
    /// EIP-2718 encoded signed transaction.
    pub raw: Bytes,
}

impl SignedTransactionEnvelope {
    pub(super) fn new(params: TransactionParams, nonce: u64, signed: &TxEnvelope) -> Self {
        Self {
            to: params.to,
            data: params.data,
            value: params.value,
            gas: params.gas_limit,
            gas_price: params.gas_price,
            nonce,
            chain_id: params.chain_id,
            hash: *signed.tx_hash(),
            raw: signed.encoded_2718().into(),
        }
    }
}

/// The outcome of a relayed meta-transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmissionResult {
    /// Hash of the submitted transaction.
    pub transaction_hash: TxHash,
    /// The exact signed bytes that were submitted.
    pub signed_raw_bytes: Bytes,
}
