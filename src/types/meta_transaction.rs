use super::IZeroEx;
use crate::constants::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION};
use alloy::{
    primitives::{Address, B256, Bytes, ChainId, Signature, U256},
    sol_types::{Eip712Domain, SolStruct},
};
use serde::{Deserialize, Serialize};

/// A meta-transaction authorization: an instruction signed off-chain by `signer` that a relayer
/// submits on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransaction {
    /// The account the meta-transaction is executed for.
    pub signer: Address,
    /// The only account allowed to submit the meta-transaction, or zero for anyone.
    pub sender: Address,
    /// Minimum gas price of the submitting transaction.
    pub min_gas_price: U256,
    /// Maximum gas price of the submitting transaction.
    pub max_gas_price: U256,
    /// Unix timestamp after which the meta-transaction is invalid.
    pub expiration_time_seconds: U256,
    /// Arbitrary salt making otherwise identical meta-transactions distinct.
    pub salt: U256,
    /// Call executed by the exchange proxy on behalf of `signer`.
    pub call_data: Bytes,
    /// Value forwarded with `call_data`.
    pub value: U256,
    /// Token the relayer is paid in.
    pub fee_token: Address,
    /// Amount of `fee_token` the relayer is paid.
    pub fee_amount: U256,
    /// EIP-712 domain the meta-transaction was signed for.
    pub domain: MetaTransactionDomain,
}

/// The chain and contract an authorization is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransactionDomain {
    /// Chain ID.
    pub chain_id: ChainId,
    /// The exchange proxy.
    pub verifying_contract: Address,
}

impl MetaTransactionDomain {
    /// The EIP-712 domain of the exchange proxy on this chain.
    pub fn eip712_domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(EIP712_DOMAIN_NAME.into()),
            Some(EIP712_DOMAIN_VERSION.into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

impl MetaTransaction {
    /// Returns the EIP-712 struct of this meta-transaction.
    pub fn as_eip712(&self) -> IZeroEx::MetaTransactionData {
        IZeroEx::MetaTransactionData {
            signer: self.signer,
            sender: self.sender,
            minGasPrice: self.min_gas_price,
            maxGasPrice: self.max_gas_price,
            expirationTimeSeconds: self.expiration_time_seconds,
            salt: self.salt,
            callData: self.call_data.clone(),
            value: self.value,
            feeToken: self.fee_token,
            feeAmount: self.fee_amount,
        }
    }

    /// Computes the EIP-712 digest the signer signed.
    pub fn eip712_signing_hash(&self) -> B256 {
        self.as_eip712().eip712_signing_hash(&self.domain.eip712_domain())
    }

    /// Expiration as unix seconds, saturating at `u64::MAX`.
    pub fn expiration(&self) -> u64 {
        self.expiration_time_seconds.saturating_to()
    }
}

/// An ECDSA signature over a meta-transaction's EIP-712 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTransactionSignature {
    /// Recovery id, either `27`/`28` or `0`/`1`.
    pub v: u8,
    /// `r` component.
    pub r: B256,
    /// `s` component.
    pub s: B256,
}

impl MetaTransactionSignature {
    /// Returns the signature, or `None` if `v` is not a valid recovery id.
    pub fn to_signature(&self) -> Option<Signature> {
        let parity = match self.v {
            0 | 27 => false,
            1 | 28 => true,
            _ => return None,
        };
        Some(Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            parity,
        ))
    }

    /// The signature in the form the exchange proxy verifies.
    pub fn as_exchange_signature(&self) -> IZeroEx::Signature {
        IZeroEx::Signature {
            signatureType: IZeroEx::SignatureType::EIP712,
            v: if self.v < 27 { self.v + 27 } else { self.v },
            r: self.r,
            s: self.s,
        }
    }
}

impl From<Signature> for MetaTransactionSignature {
    fn from(signature: Signature) -> Self {
        Self {
            v: 27 + signature.v() as u8,
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
        }
    }
}

/// A relay request: an authorization and the signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    /// The meta-transaction to relay.
    pub authorization: MetaTransaction,
    /// Signature of the meta-transaction signer.
    pub signature: MetaTransactionSignature,
}
