//! Protocol fee calculation.

use crate::constants::PROTOCOL_FEE_GAS_PER_ORDER;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// The protocol fee schedule: a fixed amount of gas charged per filled order, paid in the native
/// token at the transaction's gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFee {
    /// Gas units charged per order.
    pub gas_per_order: u64,
}

impl Default for ProtocolFee {
    fn default() -> Self {
        Self { gas_per_order: PROTOCOL_FEE_GAS_PER_ORDER }
    }
}

impl ProtocolFee {
    /// Create a fee schedule charging `gas_per_order` per order.
    pub const fn new(gas_per_order: u64) -> Self {
        Self { gas_per_order }
    }

    /// Fee owed for `num_orders` orders at `gas_price`.
    ///
    /// The product of a `u64`, a `u128` and a `usize` always fits a `U256`.
    pub fn fee(&self, num_orders: usize, gas_price: u128) -> U256 {
        U256::from(self.gas_per_order) * U256::from(gas_price) * U256::from(num_orders)
    }
}

/// Fee owed for `num_orders` orders at `gas_price` under the default schedule.
pub fn protocol_fee(num_orders: usize, gas_price: u128) -> U256 {
    ProtocolFee::default().fee(num_orders, gas_price)
}
