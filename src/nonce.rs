//! Nonce management module.
//!
//! Nonces are leased per sender address. A [`NonceLease`] holds the address lock until it is
//! consumed or dropped, so two submissions from the same sender can never observe the same nonce,
//! while different senders proceed in parallel.

use crate::transport::{EndpointTransport, TransportError};
use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

/// Tracks the next unused nonce of every sender address.
///
/// Entries are fetched from chain on first use and only advanced through
/// [`NonceLease::mark_consumed`].
#[derive(Debug)]
pub struct NonceTracker {
    transport: Arc<EndpointTransport>,
    #[allow(clippy::type_complexity)]
    nonces: DashMap<Address, Arc<Mutex<Option<u64>>>>,
}

impl NonceTracker {
    /// Create a new tracker fetching unknown nonces through `transport`.
    pub fn new(transport: Arc<EndpointTransport>) -> Self {
        Self { transport, nonces: DashMap::new() }
    }

    fn entry(&self, address: Address) -> Arc<Mutex<Option<u64>>> {
        // Locks dashmap internally for a short duration to clone the `Arc`.
        Arc::clone(self.nonces.entry(address).or_default().value())
    }

    /// Leases the next nonce of `address`, waiting for any outstanding lease on it.
    pub async fn next_nonce(&self, address: Address) -> Result<NonceLease, TransportError> {
        let mut guard = self.entry(address).lock_owned().await;

        let nonce = match *guard {
            Some(nonce) => {
                trace!(%address, nonce, "using cached nonce");
                nonce
            }
            None => {
                let nonce = self.transport.get_transaction_count(address).await?;
                debug!(%address, nonce, "fetched nonce");
                *guard = Some(nonce);
                nonce
            }
        };

        Ok(NonceLease { address, nonce, guard })
    }

    /// Forgets the cached nonce of `address` so the next lease re-fetches it from chain.
    pub async fn invalidate(&self, address: Address) {
        let Some(entry) = self.nonces.get(&address).map(|entry| Arc::clone(entry.value())) else {
            return;
        };
        *entry.lock().await = None;
        debug!(%address, "invalidated nonce");
    }

    /// Returns the cached next nonce of `address`, if any.
    pub async fn peek(&self, address: Address) -> Option<u64> {
        let entry = self.nonces.get(&address).map(|entry| Arc::clone(entry.value()))?;
        let nonce = *entry.lock().await;
        nonce
    }
}

/// A leased nonce. The sender's entry stays locked while the lease is alive.
#[derive(Debug)]
#[must_use = "dropping a lease releases the nonce for reuse"]
pub struct NonceLease {
    address: Address,
    nonce: u64,
    guard: OwnedMutexGuard<Option<u64>>,
}

impl NonceLease {
    /// The leased address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The leased nonce.
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Records the nonce as used on chain and releases the lease.
    pub fn mark_consumed(mut self) {
        *self.guard = Some(self.nonce + 1);
    }

    /// Forgets the cached nonce and releases the lease. The next lease on the address re-fetches
    /// the nonce from chain.
    ///
    /// The entry is cleared before the lock is released, so a waiting lease can never observe the
    /// forgotten value.
    pub fn invalidate(mut self) {
        *self.guard = None;
        debug!(address = %self.address, nonce = self.nonce, "invalidated leased nonce");
    }
}
