//! Orders embedded in meta-transaction call data.
//!
//! A meta-transaction usually wraps one of the exchange proxy's native order fill functions. The
//! relay needs the orders it fills to check their expiry and to price the protocol fee.

use crate::types::IZeroEx::{self, IZeroExCalls};
use alloy::{
    primitives::{Address, FixedBytes},
    sol_types::SolInterface,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a native order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// A limit order.
    Limit,
    /// A request-for-quote order.
    Rfq,
}

/// An order filled by a meta-transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedOrder {
    /// Order kind.
    pub kind: OrderKind,
    /// Maker of the order.
    pub maker: Address,
    /// Unix timestamp after which the order can no longer be filled.
    pub expiry: u64,
}

impl From<&IZeroEx::LimitOrder> for EmbeddedOrder {
    fn from(order: &IZeroEx::LimitOrder) -> Self {
        Self { kind: OrderKind::Limit, maker: order.maker, expiry: order.expiry }
    }
}

impl From<&IZeroEx::RfqOrder> for EmbeddedOrder {
    fn from(order: &IZeroEx::RfqOrder) -> Self {
        Self { kind: OrderKind::Rfq, maker: order.maker, expiry: order.expiry }
    }
}

/// Errors decoding orders out of call data.
#[derive(Debug, thiserror::Error)]
pub enum OrderDecodeError {
    /// The call data is shorter than a function selector.
    #[error("call data of {0} bytes has no function selector")]
    MissingSelector(usize),
    /// The call data does not invoke an order fill function.
    #[error("unsupported function selector {0}")]
    UnsupportedSelector(FixedBytes<4>),
    /// The arguments could not be ABI decoded.
    #[error(transparent)]
    Abi(#[from] alloy::sol_types::Error),
}

/// Decodes the orders a meta-transaction's call data fills.
pub trait OrderDecoder: fmt::Debug + Send + Sync {
    /// Returns the orders filled by `call_data`, in call order.
    fn decode_orders(&self, call_data: &[u8]) -> Result<Vec<EmbeddedOrder>, OrderDecodeError>;
}

/// Decodes the exchange proxy's limit and RFQ order fill functions, including batch fills.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExchangeProxyOrderDecoder;

impl OrderDecoder for ExchangeProxyOrderDecoder {
    fn decode_orders(&self, call_data: &[u8]) -> Result<Vec<EmbeddedOrder>, OrderDecodeError> {
        let selector = call_data
            .get(..4)
            .map(FixedBytes::<4>::from_slice)
            .ok_or(OrderDecodeError::MissingSelector(call_data.len()))?;

        if !IZeroExCalls::valid_selector(selector.0) {
            return Err(OrderDecodeError::UnsupportedSelector(selector));
        }

        let orders: Vec<EmbeddedOrder> = match IZeroExCalls::abi_decode(call_data)? {
            IZeroExCalls::fillLimitOrder(call) => vec![(&call.order).into()],
            IZeroExCalls::fillOrKillLimitOrder(call) => vec![(&call.order).into()],
            IZeroExCalls::batchFillLimitOrders(call) => call.orders.iter().map(Into::into).collect(),
            IZeroExCalls::fillRfqOrder(call) => vec![(&call.order).into()],
            IZeroExCalls::fillOrKillRfqOrder(call) => vec![(&call.order).into()],
            IZeroExCalls::batchFillRfqOrders(call) => call.orders.iter().map(Into::into).collect(),
            IZeroExCalls::executeMetaTransaction(_) => {
                return Err(OrderDecodeError::UnsupportedSelector(selector));
            }
        };

        Ok(orders)
    }
}
