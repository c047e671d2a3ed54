//! Shared relay types.

mod exchange;
pub use exchange::*;

mod meta_transaction;
pub use meta_transaction::*;
