//! EIP-712 related helpers.

use crate::types::{MetaTransaction, MetaTransactionSignature};
use alloy::primitives::{Address, B256};

/// Computes the EIP-712 digest the signer of `mtx` must have signed.
pub fn compute_eip712_digest(mtx: &MetaTransaction) -> B256 {
    mtx.eip712_signing_hash()
}

/// Returns `true` if `signature` over the EIP-712 digest of `mtx` recovers to `mtx.signer`.
///
/// Malformed signatures are reported as `false`.
pub fn verify_signature(mtx: &MetaTransaction, signature: &MetaTransactionSignature) -> bool {
    verify_digest(&compute_eip712_digest(mtx), mtx.signer, signature)
}

/// Returns `true` if `signature` over `digest` recovers to `signer`.
pub fn verify_digest(digest: &B256, signer: Address, signature: &MetaTransactionSignature) -> bool {
    signature
        .to_signature()
        .and_then(|signature| signature.recover_address_from_prehash(digest).ok())
        .is_some_and(|recovered| recovered == signer)
}
