//! Relay configuration.
use crate::{
    constants::{
        DEFAULT_EXPIRATION_BUFFER, DEFAULT_RELAY_DEADLINE, DEFAULT_REQUEST_TIMEOUT,
        FALLBACK_GAS_LIMIT, PROTOCOL_FEE_GAS_PER_ORDER, TX_GAS_BUFFER,
    },
    estimation::ProtocolFee,
};
use alloy::primitives::{Address, ChainId};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Relay configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// The chain the relay submits to.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Relay pipeline settings.
    #[serde(default)]
    pub relay: RelaySettings,
    /// Expected address of the signing key. Startup fails if the key does not match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_address: Option<Address>,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

impl RelayConfig {
    /// Sets the chain ID.
    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain.chain_id = chain_id;
        self
    }

    /// Sets the RPC endpoints, in priority order.
    pub fn with_endpoints(mut self, endpoints: &[Url]) -> Self {
        self.chain.endpoints = endpoints.to_vec();
        self
    }

    /// Sets the per-attempt request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.chain.request_timeout = timeout;
        self
    }

    /// Sets the minimum time to expiry of authorizations and orders.
    pub fn with_expiration_buffer(mut self, buffer: Duration) -> Self {
        self.relay.expiration_buffer = buffer;
        self
    }

    /// Sets the protocol fee gas charged per order.
    pub fn with_protocol_fee_gas_per_order(mut self, gas: u64) -> Self {
        self.relay.protocol_fee_gas_per_order = gas;
        self
    }

    /// Sets the transaction gas buffer.
    pub fn with_tx_gas_buffer(mut self, buffer: u64) -> Self {
        self.relay.tx_gas_buffer = buffer;
        self
    }

    /// Sets the gas limit used when estimation returned nothing.
    pub fn with_fallback_gas_limit(mut self, gas_limit: u64) -> Self {
        self.relay.fallback_gas_limit = gas_limit;
        self
    }

    /// Sets the deadline of a whole relay call.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.relay.deadline = deadline;
        self
    }

    /// Sets the expected signer address.
    pub fn with_signer_address(mut self, address: Option<Address>) -> Self {
        self.signer_address = address;
        self
    }

    /// Sets the signing key.
    pub fn with_signer_key(mut self, signer_key: Option<String>) -> Self {
        if let Some(signer_key) = signer_key {
            self.secrets.signer_key = Some(signer_key);
        }
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .wrap_err_with(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Configuration of the chain the relay submits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID.
    pub chain_id: ChainId,
    /// RPC endpoints, the first being the primary.
    #[serde(default)]
    pub endpoints: Vec<Url>,
    /// Timeout of a single endpoint attempt.
    #[serde(with = "crate::serde::duration")]
    pub request_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { chain_id: 1, endpoints: Vec::new(), request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}

/// Relay pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Minimum time to expiry required of authorizations and the orders they fill.
    #[serde(with = "crate::serde::duration")]
    pub expiration_buffer: Duration,
    /// Protocol fee gas units charged per filled order.
    pub protocol_fee_gas_per_order: u64,
    /// Extra gas added on top of estimates.
    pub tx_gas_buffer: u64,
    /// Gas limit used when the node could not estimate a non-reverting call.
    pub fallback_gas_limit: u64,
    /// Deadline of a whole relay call.
    #[serde(with = "crate::serde::duration")]
    pub deadline: Duration,
}

impl RelaySettings {
    /// The protocol fee schedule.
    pub const fn protocol_fee(&self) -> ProtocolFee {
        ProtocolFee::new(self.protocol_fee_gas_per_order)
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            expiration_buffer: DEFAULT_EXPIRATION_BUFFER,
            protocol_fee_gas_per_order: PROTOCOL_FEE_GAS_PER_ORDER,
            tx_gas_buffer: TX_GAS_BUFFER,
            fallback_gas_limit: FALLBACK_GAS_LIMIT,
            deadline: DEFAULT_RELAY_DEADLINE,
        }
    }
}

/// Secrets (kept out of serialized output).
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretsConfig {
    /// Hex encoded private key transactions are signed with.
    #[serde(default)]
    pub signer_key: Option<String>,
}
