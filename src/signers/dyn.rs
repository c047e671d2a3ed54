//! Dynamic signer.
//!
//! The relay holds a single in-process key behind a type-erased signer.
use alloy::{
    network::{FullSigner, TxSigner},
    primitives::{Address, Signature},
    signers::local::PrivateKeySigner,
};
use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

/// Abstraction over the relay's signing key.
#[derive(Clone)]
pub struct DynSigner(pub Arc<dyn FullSigner<Signature> + Send + Sync>);

impl fmt::Debug for DynSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelaySigner").field(&self.address()).finish()
    }
}

impl DynSigner {
    /// Load a hex encoded private key.
    pub fn from_signing_key(key: &str) -> eyre::Result<Self> {
        Ok(Self::from(PrivateKeySigner::from_str(key)?))
    }

    /// Returns the signer's Ethereum Address.
    pub fn address(&self) -> Address {
        TxSigner::address(&self.0)
    }
}

impl From<PrivateKeySigner> for DynSigner {
    fn from(signer: PrivateKeySigner) -> Self {
        Self(Arc::new(signer))
    }
}

impl Deref for DynSigner {
    type Target = dyn FullSigner<Signature> + Send + Sync;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
