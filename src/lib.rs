//! # Meta-transaction relay
//!
//! Library for relaying EIP-712 authorized meta-transactions.
//!
//! A [`RelayService`](relay::RelayService) validates an authorization and its signature, prices
//! the protocol fee of the orders it fills, simulates it, and only then signs and submits a
//! transaction through an [`EndpointTransport`](transport::EndpointTransport) that fails over
//! across an ordered list of RPC endpoints.

pub mod cli;
pub mod config;
pub mod constants;
pub mod eip712;
pub mod error;
pub mod estimation;
pub mod metrics;
pub mod nonce;
pub mod orders;
pub mod provider;
pub mod relay;
pub mod serde;
pub mod signers;
pub mod transactions;
pub mod transport;
pub mod types;
