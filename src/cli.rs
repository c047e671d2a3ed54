//! # Relay CLI
use crate::{
    config::RelayConfig,
    orders::ExchangeProxyOrderDecoder,
    relay::RelayService,
    signers::DynSigner,
    transactions::SigningContext,
    transport::EndpointTransport,
    types::RelayRequest,
};
use alloy::primitives::{Address, ChainId};
use clap::Parser;
use eyre::{Context, OptionExt};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;
use url::Url;

/// Relays a signed meta-transaction through a set of RPC endpoints.
#[derive(Debug, Parser)]
#[command(author, about = "Meta-transaction relay", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one is created from the remaining arguments.
    #[arg(long, value_name = "CONFIG", env = "RELAY_CONFIG", default_value = "relay.yaml")]
    pub config: PathBuf,
    /// A JSON file holding `{authorization, signature}`.
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,
    /// An RPC endpoint of the chain to send transactions to. May be repeated; the first is the
    /// primary.
    ///
    /// Must be a valid HTTP or HTTPS URL pointing to an Ethereum JSON-RPC endpoint.
    #[arg(long = "endpoint", value_name = "RPC_ENDPOINT")]
    pub endpoints: Option<Vec<Url>>,
    /// The chain ID.
    #[arg(long, value_name = "CHAIN_ID")]
    pub chain_id: Option<ChainId>,
    /// Timeout of a single endpoint attempt.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub request_timeout: Option<Duration>,
    /// Minimum time to expiry of authorizations and orders.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub expiration_buffer: Option<Duration>,
    /// Protocol fee gas units charged per order.
    #[arg(long, value_name = "GAS")]
    pub protocol_fee_gas_per_order: Option<u64>,
    /// Extra gas added on top of estimates.
    #[arg(long, value_name = "GAS")]
    pub tx_gas_buffer: Option<u64>,
    /// Gas limit used when the node cannot estimate a non-reverting call.
    #[arg(long, value_name = "GAS")]
    pub fallback_gas_limit: Option<u64>,
    /// Deadline of the whole relay call.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub deadline: Option<Duration>,
    /// The address the signing key must have.
    #[arg(long, value_name = "ADDRESS")]
    pub signer_address: Option<Address>,
    /// The secret key to sign transactions with.
    #[arg(long, value_name = "SECRET_KEY", env = "RELAY_SK", hide_env_values = true)]
    pub signer_key: Option<String>,
}

impl Args {
    /// Relays the request and prints the result.
    pub async fn run(self) -> eyre::Result<()> {
        let config = self.load_config()?;
        let request: RelayRequest = serde_json::from_slice(
            &std::fs::read(&self.request)
                .wrap_err_with(|| format!("failed to read request: {}", self.request.display()))?,
        )
        .wrap_err_with(|| format!("failed to parse request: {}", self.request.display()))?;

        let service = build_service(config)?;
        let result = service.relay(&request.authorization, &request.signature).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);

        Ok(())
    }

    /// Loads the configuration file, creating it if missing, and applies the arguments on top.
    pub fn load_config(&self) -> eyre::Result<RelayConfig> {
        if !self.config.exists() {
            let config = self.merge_relay_config(RelayConfig::default());
            config.save_to_file(&self.config)?;
            info!(path = %self.config.display(), "created default config");
            return Ok(config);
        }

        Ok(self.merge_relay_config(RelayConfig::load_from_file(&self.config)?))
    }

    /// Merges [`Args`] values into an existing [`RelayConfig`] instance.
    ///
    /// Only arguments that were given override the config.
    pub fn merge_relay_config(&self, mut config: RelayConfig) -> RelayConfig {
        if let Some(endpoints) = &self.endpoints {
            config = config.with_endpoints(endpoints);
        }
        if let Some(chain_id) = self.chain_id {
            config = config.with_chain_id(chain_id);
        }
        if let Some(timeout) = self.request_timeout {
            config = config.with_request_timeout(timeout);
        }
        if let Some(buffer) = self.expiration_buffer {
            config = config.with_expiration_buffer(buffer);
        }
        if let Some(gas) = self.protocol_fee_gas_per_order {
            config = config.with_protocol_fee_gas_per_order(gas);
        }
        if let Some(buffer) = self.tx_gas_buffer {
            config = config.with_tx_gas_buffer(buffer);
        }
        if let Some(gas_limit) = self.fallback_gas_limit {
            config = config.with_fallback_gas_limit(gas_limit);
        }
        if let Some(deadline) = self.deadline {
            config = config.with_deadline(deadline);
        }
        if self.signer_address.is_some() {
            config = config.with_signer_address(self.signer_address);
        }
        config.with_signer_key(self.signer_key.clone())
    }
}

/// Builds a [`RelayService`] from a complete configuration.
pub fn build_service(config: RelayConfig) -> eyre::Result<RelayService> {
    if config.chain.endpoints.is_empty() {
        eyre::bail!("no RPC endpoints configured");
    }

    let key = config.secrets.signer_key.as_deref().ok_or_eyre("no signer key configured")?;
    let signer = DynSigner::from_signing_key(key).wrap_err("invalid signer key")?;
    let context = SigningContext::new(signer, config.chain.chain_id);
    if let Some(expected) = config.signer_address {
        context.ensure_address(expected)?;
    }

    let transport = EndpointTransport::http(
        &config.chain.endpoints,
        config.chain.request_timeout,
        config.chain.chain_id,
    )?;
    info!(
        chain_id = config.chain.chain_id,
        endpoints = config.chain.endpoints.len(),
        relayer = %context.address(),
        "relay configured"
    );

    Ok(RelayService::new(
        config.relay,
        Arc::new(transport),
        context,
        Arc::new(ExchangeProxyOrderDecoder),
    ))
}

/// Parses a string representing seconds to a [`Duration`].
fn parse_duration_secs(arg: &str) -> Result<std::time::Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(std::time::Duration::from_secs(seconds))
}
