//! The relay pipeline.
//!
//! A meta-transaction goes through these stages:
//!
//! `received → expiry checked → hashed → signature verified → orders expiry checked →
//! fee computed → simulated → signed → submitted → done`
//!
//! Everything up to and including order expiry is checked locally, without touching the network.
//! Nothing is signed unless simulation proved the call does not revert.

use crate::{
    config::RelaySettings,
    eip712::{compute_eip712_digest, verify_digest},
    error::{RelayError, ValidationError},
    estimation::SafeEstimator,
    metrics::RelayMetrics,
    nonce::{NonceLease, NonceTracker},
    orders::OrderDecoder,
    transactions::{
        PendingSubmissionResult, SignedTransactionEnvelope, SigningContext, TransactionParams,
        TransactionSigner,
    },
    transport::{EndpointTransport, TransportError},
    types::{IZeroEx, MetaTransaction, MetaTransactionSignature},
};
use alloy::{
    primitives::{Address, Bytes, ChainId, TxHash},
    rpc::types::{TransactionInput, TransactionRequest},
    sol_types::SolCall,
};
use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, error, info, instrument, warn};

/// Stages of a relay call, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    /// The request was received.
    Received,
    /// The authorization is not about to expire.
    ExpiryChecked,
    /// The EIP-712 digest was computed.
    Hashed,
    /// The signature recovers to the signer.
    SignatureVerified,
    /// No embedded order is about to expire.
    OrdersExpiryChecked,
    /// The protocol fee was computed.
    FeeComputed,
    /// Simulation succeeded.
    Simulated,
    /// The transaction was signed.
    Signed,
    /// The node accepted the transaction.
    Submitted,
    /// The result was returned.
    Done,
}

impl RelayStage {
    /// Returns the stage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ExpiryChecked => "expiry_checked",
            Self::Hashed => "hashed",
            Self::SignatureVerified => "signature_verified",
            Self::OrdersExpiryChecked => "orders_expiry_checked",
            Self::FeeComputed => "fee_computed",
            Self::Simulated => "simulated",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if something expiring at `expiration` is still valid `buffer` seconds after
/// `now`.
pub const fn is_expiry_safe(expiration: u64, now: u64, buffer: u64) -> bool {
    expiration >= now.saturating_add(buffer)
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}

/// Holds the nonce lease of a signed transaction until its submission settles.
///
/// It outlives the pipeline future, so a relay cut short by its deadline still owns the lease.
type LeaseSlot = Mutex<Option<NonceLease>>;

fn take_lease(slot: &LeaseSlot) -> Option<NonceLease> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Validates, simulates, signs and submits meta-transactions.
pub struct RelayService {
    settings: RelaySettings,
    chain_id: ChainId,
    relayer: Address,
    transport: Arc<EndpointTransport>,
    estimator: SafeEstimator,
    signer: TransactionSigner,
    decoder: Arc<dyn OrderDecoder>,
    metrics: RelayMetrics,
}

impl fmt::Debug for RelayService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayService")
            .field("settings", &self.settings)
            .field("chain_id", &self.chain_id)
            .field("relayer", &self.relayer)
            .field("transport", &self.transport)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl RelayService {
    /// Create a new relay service submitting through `transport` with the key of `context`.
    pub fn new(
        settings: RelaySettings,
        transport: Arc<EndpointTransport>,
        context: SigningContext,
        decoder: Arc<dyn OrderDecoder>,
    ) -> Self {
        let nonces = Arc::new(NonceTracker::new(Arc::clone(&transport)));
        Self {
            settings,
            chain_id: context.chain_id(),
            relayer: context.address(),
            estimator: SafeEstimator::new(Arc::clone(&transport)),
            signer: TransactionSigner::new(&context, nonces),
            transport,
            decoder,
            metrics: RelayMetrics::default(),
        }
    }

    /// Address transactions are sent from.
    pub const fn relayer(&self) -> Address {
        self.relayer
    }

    /// The relayer's nonce tracker.
    pub fn nonces(&self) -> &Arc<NonceTracker> {
        self.signer.nonces()
    }

    /// Relays a meta-transaction, returning the submitted transaction's hash and signed bytes.
    ///
    /// The whole call is bounded by the configured deadline. If it elapses before anything was
    /// signed the call fails with [`RelayError::DeadlineExceeded`] and can be retried. If it
    /// elapses afterwards the transaction may have been broadcast, so the call fails with
    /// [`RelayError::OutcomeUnknown`] and the relayer's cached nonce is dropped before the nonce
    /// lock is released.
    #[instrument(skip_all, fields(signer = %mtx.signer, salt = %mtx.salt))]
    pub async fn relay(
        &self,
        mtx: &MetaTransaction,
        signature: &MetaTransactionSignature,
    ) -> Result<PendingSubmissionResult, RelayError> {
        let start = Instant::now();
        let signed = OnceLock::new();
        let lease_slot = LeaseSlot::default();

        let outcome = tokio::time::timeout(
            self.settings.deadline,
            self.relay_inner(mtx, signature, &signed, &lease_slot),
        )
        .await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => match signed.get() {
                Some(tx_hash) => {
                    match take_lease(&lease_slot) {
                        Some(lease) => lease.invalidate(),
                        None => self.nonces().invalidate(self.relayer).await,
                    }
                    Err(RelayError::OutcomeUnknown { tx_hash: *tx_hash })
                }
                None => Err(RelayError::DeadlineExceeded(self.settings.deadline)),
            },
        };

        match &result {
            Ok(outcome) => {
                self.metrics.relayed.increment(1);
                self.metrics.relay_time.record(start.elapsed().as_millis() as f64);
                info!(tx_hash = %outcome.transaction_hash, stage = %RelayStage::Done, "relayed meta-transaction");
            }
            Err(RelayError::Validation(err)) => {
                self.metrics.rejected.increment(1);
                info!(%err, "rejected meta-transaction");
            }
            Err(RelayError::Reverted(err)) => {
                self.metrics.reverted.increment(1);
                info!(%err, "meta-transaction reverted in simulation");
            }
            Err(err) => {
                self.metrics.failed.increment(1);
                error!(%err, "failed to relay meta-transaction");
            }
        }

        result
    }

    async fn relay_inner(
        &self,
        mtx: &MetaTransaction,
        signature: &MetaTransactionSignature,
        signed: &OnceLock<TxHash>,
        lease_slot: &LeaseSlot,
    ) -> Result<PendingSubmissionResult, RelayError> {
        debug!(stage = %RelayStage::Received, "relaying meta-transaction");
        let now = unix_now();
        let buffer = self.settings.expiration_buffer.as_secs();

        if !is_expiry_safe(mtx.expiration(), now, buffer) {
            return Err(ValidationError::AuthorizationNearExpiry {
                expiration: mtx.expiration(),
                now,
                buffer,
            }
            .into());
        }
        debug!(stage = %RelayStage::ExpiryChecked, expiration = mtx.expiration());

        let gas_price = self.validate_fields(mtx)?;

        let digest = compute_eip712_digest(mtx);
        debug!(stage = %RelayStage::Hashed, %digest);

        if !verify_digest(&digest, mtx.signer, signature) {
            return Err(ValidationError::SignatureMismatch { signer: mtx.signer }.into());
        }
        debug!(stage = %RelayStage::SignatureVerified);

        let orders = self.decoder.decode_orders(&mtx.call_data).map_err(ValidationError::from)?;
        if let Some(order) = orders.iter().find(|order| !is_expiry_safe(order.expiry, now, buffer)) {
            return Err(ValidationError::OrderNearExpiry {
                maker: order.maker,
                expiry: order.expiry,
                now,
                buffer,
            }
            .into());
        }
        debug!(stage = %RelayStage::OrdersExpiryChecked, orders = orders.len());

        let fee = self.settings.protocol_fee().fee(orders.len(), gas_price);
        debug!(stage = %RelayStage::FeeComputed, %fee, gas_price);

        let input: Bytes = IZeroEx::executeMetaTransactionCall {
            mtx: mtx.as_eip712(),
            signature: signature.as_exchange_signature(),
        }
        .abi_encode()
        .into();
        let request = TransactionRequest {
            from: Some(self.relayer),
            to: Some(mtx.domain.verifying_contract.into()),
            gas_price: Some(gas_price),
            value: Some(fee),
            input: TransactionInput::both(input.clone()),
            chain_id: Some(self.chain_id),
            ..Default::default()
        };
        let estimate = self.estimator.estimate(&request).await?;
        let gas_limit = if estimate == 0 {
            self.settings.fallback_gas_limit
        } else {
            estimate.saturating_add(self.settings.tx_gas_buffer)
        };
        debug!(stage = %RelayStage::Simulated, estimate, gas_limit);

        let (envelope, lease) = self
            .signer
            .build_and_sign(TransactionParams {
                to: mtx.domain.verifying_contract,
                data: input,
                value: fee,
                gas_price,
                gas_limit,
                sender: self.relayer,
                chain_id: self.chain_id,
            })
            .await?;
        *lease_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(lease);
        let _ = signed.set(envelope.hash);
        debug!(stage = %RelayStage::Signed, tx_hash = %envelope.hash, nonce = envelope.nonce);

        let transaction_hash = self.submit(&envelope, lease_slot).await?;
        debug!(stage = %RelayStage::Submitted, %transaction_hash);

        Ok(PendingSubmissionResult { transaction_hash, signed_raw_bytes: envelope.raw })
    }

    /// Checks the fields that need no cryptography or network, returning the gas price to use.
    fn validate_fields(&self, mtx: &MetaTransaction) -> Result<u128, ValidationError> {
        if mtx.domain.chain_id != self.chain_id {
            return Err(ValidationError::ChainIdMismatch {
                expected: self.chain_id,
                got: mtx.domain.chain_id,
            });
        }

        if !mtx.sender.is_zero() && mtx.sender != self.relayer {
            return Err(ValidationError::SenderMismatch {
                sender: mtx.sender,
                relayer: self.relayer,
            });
        }

        match u128::try_from(mtx.min_gas_price) {
            Ok(gas_price) if mtx.min_gas_price <= mtx.max_gas_price => Ok(gas_price),
            _ => Err(ValidationError::InvalidGasPriceRange {
                min: mtx.min_gas_price,
                max: mtx.max_gas_price,
            }),
        }
    }

    /// Broadcasts a signed transaction, settling the nonce lease in `lease_slot` according to the
    /// outcome.
    async fn submit(
        &self,
        envelope: &SignedTransactionEnvelope,
        lease_slot: &LeaseSlot,
    ) -> Result<TxHash, TransportError> {
        let result = self.transport.send_raw_transaction(&envelope.raw).await;
        let lease = take_lease(lease_slot);

        match result {
            Ok(tx_hash) => {
                if tx_hash != envelope.hash {
                    warn!(local = %envelope.hash, node = %tx_hash, "node returned a different transaction hash");
                }
                if let Some(lease) = lease {
                    lease.mark_consumed();
                }
                Ok(tx_hash)
            }
            Err(err) if err.is_already_known() => {
                debug!(tx_hash = %envelope.hash, "transaction already known");
                if let Some(lease) = lease {
                    lease.mark_consumed();
                }
                Ok(envelope.hash)
            }
            Err(err) => {
                // The broadcast state is unknown unless the node answered with an error object.
                if let Some(lease) = lease
                    && (err.is_nonce_too_low() || err.as_error_resp().is_none())
                {
                    lease.invalidate();
                }
                error!(tx_hash = %envelope.hash, %err, "failed to submit transaction");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        orders::{EmbeddedOrder, OrderDecodeError, OrderKind},
        transport::testing::mock_node,
        types::MetaTransactionDomain,
    };
    use alloy::{
        primitives::{U256, address, bytes},
        signers::{SignerSync, local::PrivateKeySigner},
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EXCHANGE: Address = address!("0xdef1c0ded9bec7f1a1670819833240f027b25eff");

    /// Decodes a fixed set of orders regardless of the call data.
    #[derive(Debug)]
    struct FixedOrders(Vec<u64>);

    impl OrderDecoder for FixedOrders {
        fn decode_orders(&self, _: &[u8]) -> Result<Vec<EmbeddedOrder>, OrderDecodeError> {
            Ok(self
                .0
                .iter()
                .map(|&expiry| EmbeddedOrder { kind: OrderKind::Limit, maker: Address::ZERO, expiry })
                .collect())
        }
    }

    struct Harness {
        service: RelayService,
        user: PrivateKeySigner,
        calls: Arc<AtomicUsize>,
    }

    fn harness(orders: Vec<u64>) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let transport = EndpointTransport::new(vec![mock_node(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!("0x0"))
        })]);
        let relayer = PrivateKeySigner::random();
        let service = RelayService::new(
            RelaySettings::default(),
            Arc::new(transport),
            SigningContext::new(relayer.into(), 1),
            Arc::new(FixedOrders(orders)),
        );
        Harness { service, user: PrivateKeySigner::random(), calls }
    }

    impl Harness {
        fn authorization(&self) -> MetaTransaction {
            MetaTransaction {
                signer: self.user.address(),
                sender: Address::ZERO,
                min_gas_price: U256::from(20_000_000_000u64),
                max_gas_price: U256::from(20_000_000_000u64),
                expiration_time_seconds: U256::from(unix_now() + 3600),
                salt: U256::from(7),
                call_data: bytes!("deadbeef"),
                value: U256::ZERO,
                fee_token: Address::ZERO,
                fee_amount: U256::ZERO,
                domain: MetaTransactionDomain { chain_id: 1, verifying_contract: EXCHANGE },
            }
        }

        fn sign(&self, mtx: &MetaTransaction) -> MetaTransactionSignature {
            self.user.sign_hash_sync(&compute_eip712_digest(mtx)).unwrap().into()
        }

        async fn reject(&self, mtx: MetaTransaction) -> ValidationError {
            let signature = self.sign(&mtx);
            self.reject_signed(mtx, signature).await
        }

        async fn reject_signed(
            &self,
            mtx: MetaTransaction,
            signature: MetaTransactionSignature,
        ) -> ValidationError {
            match self.service.relay(&mtx, &signature).await {
                Err(RelayError::Validation(err)) => {
                    assert_eq!(self.calls.load(Ordering::SeqCst), 0, "rejection hit the network");
                    err
                }
                other => panic!("expected a validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn expiry_boundary() {
        let now = 1_700_000_000;
        assert!(!is_expiry_safe(now + 59, now, 60));
        assert!(is_expiry_safe(now + 60, now, 60));
        assert!(is_expiry_safe(now + 61, now, 60));
        assert!(!is_expiry_safe(now, u64::MAX, 60));
    }

    #[test]
    fn stage_names() {
        assert_eq!(RelayStage::OrdersExpiryChecked.to_string(), "orders_expiry_checked");
        assert_eq!(RelayStage::Done.as_str(), "done");
    }

    #[tokio::test]
    async fn near_expiry_authorization_is_rejected() {
        let h = harness(vec![]);
        let mut mtx = h.authorization();
        mtx.expiration_time_seconds = U256::from(unix_now() + 30);

        let err = h.reject(mtx).await;
        assert!(matches!(err, ValidationError::AuthorizationNearExpiry { buffer: 60, .. }));
    }

    #[tokio::test]
    async fn expiry_is_checked_before_other_fields() {
        let h = harness(vec![]);
        let mut mtx = h.authorization();
        mtx.expiration_time_seconds = U256::from(unix_now() + 30);
        mtx.domain.chain_id = 10;
        mtx.max_gas_price = U256::from(1);

        let err = h.reject(mtx).await;
        assert!(matches!(err, ValidationError::AuthorizationNearExpiry { .. }));
    }

    #[tokio::test]
    async fn forged_signature_is_rejected() {
        let h = harness(vec![]);
        let mtx = h.authorization();
        let forged: MetaTransactionSignature =
            PrivateKeySigner::random().sign_hash_sync(&compute_eip712_digest(&mtx)).unwrap().into();

        let err = h.reject_signed(mtx.clone(), forged).await;
        assert!(matches!(err, ValidationError::SignatureMismatch { signer } if signer == mtx.signer));
    }

    #[tokio::test]
    async fn near_expiry_order_is_rejected() {
        let h = harness(vec![unix_now() + 3600, unix_now() + 10]);

        let err = h.reject(h.authorization()).await;
        assert!(matches!(err, ValidationError::OrderNearExpiry { .. }));
    }

    #[tokio::test]
    async fn foreign_chain_sender_and_gas_range_are_rejected() {
        let h = harness(vec![]);

        let mut mtx = h.authorization();
        mtx.domain.chain_id = 10;
        assert!(matches!(
            h.reject(mtx).await,
            ValidationError::ChainIdMismatch { expected: 1, got: 10 }
        ));

        let mut mtx = h.authorization();
        mtx.sender = address!("0x0000000000000000000000000000000000000bad");
        assert!(matches!(h.reject(mtx).await, ValidationError::SenderMismatch { .. }));

        let mut mtx = h.authorization();
        mtx.max_gas_price = U256::from(1);
        assert!(matches!(h.reject(mtx).await, ValidationError::InvalidGasPriceRange { .. }));

        let mut mtx = h.authorization();
        mtx.min_gas_price = U256::MAX;
        mtx.max_gas_price = U256::MAX;
        assert!(matches!(h.reject(mtx).await, ValidationError::InvalidGasPriceRange { .. }));
    }

    #[tokio::test]
    async fn undecodable_call_data_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let transport = EndpointTransport::new(vec![mock_node(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!("0x0"))
        })]);
        let h = Harness {
            service: RelayService::new(
                RelaySettings::default(),
                Arc::new(transport),
                SigningContext::new(PrivateKeySigner::random().into(), 1),
                Arc::new(crate::orders::ExchangeProxyOrderDecoder),
            ),
            user: PrivateKeySigner::random(),
            calls,
        };

        let err = h.reject(h.authorization()).await;
        assert!(matches!(err, ValidationError::InvalidCallData(OrderDecodeError::UnsupportedSelector(_))));
    }
}
