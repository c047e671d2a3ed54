use super::SignedTransactionEnvelope;
use crate::{
    nonce::{NonceLease, NonceTracker},
    signers::DynSigner,
    transport::TransportError,
};
use alloy::{
    consensus::{TxLegacy, TypedTransaction},
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::{Address, Bytes, ChainId, U256},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Errors that may occur while building and signing a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The transaction sender is not the held key.
    #[error("signing key {key} does not match sender {sender}")]
    KeyMismatch {
        /// Address of the held key.
        key: Address,
        /// Requested sender.
        sender: Address,
    },
    /// Error occurred while signing transaction.
    #[error(transparent)]
    Sign(#[from] alloy::signers::Error),
    /// The sender's nonce could not be fetched.
    #[error(transparent)]
    Nonce(#[from] TransportError),
}

/// The key and chain the relay signs for.
#[derive(Debug, Clone)]
pub struct SigningContext {
    signer: DynSigner,
    chain_id: ChainId,
}

impl SigningContext {
    /// Create a new signing context.
    pub const fn new(signer: DynSigner, chain_id: ChainId) -> Self {
        Self { signer, chain_id }
    }

    /// Address of the signing key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain transactions are signed for.
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Fails with [`SignerError::KeyMismatch`] unless the key's address is `expected`.
    pub fn ensure_address(&self, expected: Address) -> Result<(), SignerError> {
        let key = self.address();
        if key != expected {
            error!(%key, %expected, "configured signing key does not match expected address");
            return Err(SignerError::KeyMismatch { key, sender: expected });
        }
        Ok(())
    }
}

/// Fields of a transaction to build.
#[derive(Debug, Clone)]
pub struct TransactionParams {
    /// Destination.
    pub to: Address,
    /// Call data.
    pub data: Bytes,
    /// Value to send.
    pub value: U256,
    /// Gas price.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Sender, which must be the held key.
    pub sender: Address,
    /// Chain ID.
    pub chain_id: ChainId,
}

/// Builds legacy transactions and signs them with the held key.
#[derive(Debug)]
pub struct TransactionSigner {
    /// Inner [`EthereumWallet`] used to sign transactions.
    wallet: EthereumWallet,
    address: Address,
    nonces: Arc<NonceTracker>,
}

impl TransactionSigner {
    /// Create a new signer drawing nonces from `nonces`.
    pub fn new(context: &SigningContext, nonces: Arc<NonceTracker>) -> Self {
        Self {
            wallet: EthereumWallet::new(context.signer.clone().0),
            address: context.address(),
            nonces,
        }
    }

    /// Address of the held key.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The nonce tracker leases are drawn from.
    pub const fn nonces(&self) -> &Arc<NonceTracker> {
        &self.nonces
    }

    /// Builds and signs an EIP-155 legacy transaction, without submitting it.
    ///
    /// The returned lease keeps the sender's nonce locked. Mark it consumed once the transaction
    /// is accepted by the node, or drop it to release the nonce for reuse.
    #[instrument(skip_all, fields(sender = %params.sender, to = %params.to))]
    pub async fn build_and_sign(
        &self,
        params: TransactionParams,
    ) -> Result<(SignedTransactionEnvelope, NonceLease), SignerError> {
        if params.sender != self.address {
            error!(key = %self.address, sender = %params.sender, "signing key does not match sender");
            return Err(SignerError::KeyMismatch { key: self.address, sender: params.sender });
        }

        let lease = self.nonces.next_nonce(params.sender).await?;

        let tx = TxLegacy {
            chain_id: Some(params.chain_id),
            nonce: lease.nonce(),
            gas_price: params.gas_price,
            gas_limit: params.gas_limit,
            to: params.to.into(),
            value: params.value,
            input: params.data.clone(),
        };

        let signed = NetworkWallet::<Ethereum>::sign_transaction_from(
            &self.wallet,
            self.address,
            TypedTransaction::Legacy(tx),
        )
        .await?;

        let envelope = SignedTransactionEnvelope::new(params, lease.nonce(), &signed);
        debug!(nonce = envelope.nonce, tx_hash = %envelope.hash, "signed transaction");

        Ok((envelope, lease))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        provider::ETH_GET_TRANSACTION_COUNT,
        transport::{EndpointTransport, testing::mock_node},
    };
    use alloy::{
        consensus::{Transaction, TxEnvelope},
        eips::Decodable2718,
        primitives::{address, bytes},
        signers::local::PrivateKeySigner,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EXCHANGE: Address = address!("0xdef1c0ded9bec7f1a1670819833240f027b25eff");

    fn signer(calls: Arc<AtomicUsize>) -> (TransactionSigner, PrivateKeySigner) {
        let key = PrivateKeySigner::random();
        let transport = EndpointTransport::new(vec![mock_node(move |method, _| {
            assert_eq!(method, ETH_GET_TRANSACTION_COUNT);
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!("0x3"))
        })]);
        let nonces = Arc::new(NonceTracker::new(Arc::new(transport)));
        let context = SigningContext::new(key.clone().into(), 1);
        (TransactionSigner::new(&context, nonces), key)
    }

    fn params(sender: Address) -> TransactionParams {
        TransactionParams {
            to: EXCHANGE,
            data: bytes!("deadbeef"),
            value: U256::from(3_000_000_000_000_000u64),
            gas_price: 20_000_000_000,
            gas_limit: 250_000,
            sender,
            chain_id: 1,
        }
    }

    #[tokio::test]
    async fn signs_exactly_the_given_fields() {
        let (signer, key) = signer(Arc::default());

        let (envelope, lease) = signer.build_and_sign(params(key.address())).await.unwrap();
        assert_eq!(lease.nonce(), 3);
        assert_eq!(envelope.nonce, 3);

        let decoded = TxEnvelope::decode_2718(&mut envelope.raw.as_ref()).unwrap();
        assert_eq!(*decoded.tx_hash(), envelope.hash);
        let legacy = decoded.as_legacy().unwrap();
        assert_eq!(legacy.tx().chain_id, Some(1));
        assert_eq!(legacy.tx().to(), Some(EXCHANGE));
        assert_eq!(legacy.tx().gas_limit, 250_000);
        assert_eq!(legacy.tx().gas_price, 20_000_000_000);
        assert_eq!(legacy.tx().value, U256::from(3_000_000_000_000_000u64));
        assert_eq!(legacy.tx().input, bytes!("deadbeef"));
        assert_eq!(
            legacy.signature().recover_address_from_prehash(&legacy.signature_hash()).unwrap(),
            key.address()
        );
    }

    #[test]
    fn context_checks_expected_address() {
        let key = PrivateKeySigner::random();
        let context = SigningContext::new(key.clone().into(), 1);

        assert!(context.ensure_address(key.address()).is_ok());
        assert!(matches!(
            context.ensure_address(Address::ZERO),
            Err(SignerError::KeyMismatch { sender, .. }) if sender.is_zero()
        ));
    }

    #[tokio::test]
    async fn rejects_foreign_sender_before_taking_a_nonce() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (signer, _) = signer(Arc::clone(&calls));
        let stranger = PrivateKeySigner::random().address();

        let err = signer.build_and_sign(params(stranger)).await.unwrap_err();
        assert!(matches!(err, SignerError::KeyMismatch { sender, .. } if sender == stranger));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_signing_yields_sequential_nonces() {
        let (signer, key) = signer(Arc::default());
        let signer = Arc::new(signer);

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let signer = Arc::clone(&signer);
                let sender = key.address();
                tokio::spawn(async move {
                    let (envelope, lease) = signer.build_and_sign(params(sender)).await.unwrap();
                    tokio::task::yield_now().await;
                    lease.mark_consumed();
                    envelope.nonce
                })
            })
            .collect();

        let mut nonces = Vec::new();
        for task in tasks {
            nonces.push(task.await.unwrap());
        }
        nonces.sort_unstable();
        assert_eq!(nonces, vec![3, 4, 5, 6, 7]);
        assert_eq!(signer.nonces().peek(key.address()).await, Some(8));
    }
}
