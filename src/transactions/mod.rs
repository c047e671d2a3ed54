//! Building and signing relay transactions.

mod signer;
pub use signer::{SignerError, SigningContext, TransactionParams, TransactionSigner};

mod transaction;
pub use transaction::{PendingSubmissionResult, SignedTransactionEnvelope};
