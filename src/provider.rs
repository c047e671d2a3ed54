//! Typed node RPC helpers.

use crate::transport::{EndpointTransport, TransportError};
use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, Bytes, TxHash, U64},
    rpc::types::TransactionRequest,
};

/// `eth_getTransactionCount`
pub const ETH_GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
/// `eth_call`
pub const ETH_CALL: &str = "eth_call";
/// `eth_estimateGas`
pub const ETH_ESTIMATE_GAS: &str = "eth_estimateGas";
/// `eth_sendRawTransaction`
pub const ETH_SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";

impl EndpointTransport {
    /// Returns the number of transactions sent from `address` as of the latest block.
    pub async fn get_transaction_count(&self, address: Address) -> Result<u64, TransportError> {
        self.request::<_, U64>(ETH_GET_TRANSACTION_COUNT, (address, BlockNumberOrTag::Latest))
            .await
            .map(|count| count.to())
    }

    /// Executes `tx` against the latest block without creating a transaction.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, TransportError> {
        self.request(ETH_CALL, (tx.clone(), BlockNumberOrTag::Latest)).await
    }

    /// Estimates the gas `tx` needs.
    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, TransportError> {
        self.request::<_, U64>(ETH_ESTIMATE_GAS, (tx.clone(),)).await.map(|gas| gas.to())
    }

    /// Broadcasts a signed, encoded transaction and returns the hash reported by the node.
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash, TransportError> {
        self.request(ETH_SEND_RAW_TRANSACTION, (raw.clone(),)).await
    }
}
