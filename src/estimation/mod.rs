//! Fee calculation and revert-aware gas estimation.
//!
//! - `fees`: protocol fee owed for the orders a meta-transaction fills
//! - `simulator`: concurrent `eth_call` + `eth_estimateGas`, where a revert always wins

pub mod fees;
pub use fees::{ProtocolFee, protocol_fee};

pub mod simulator;
pub use simulator::SafeEstimator;
