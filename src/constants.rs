//! Relay constants.

use std::time::Duration;

/// EIP-712 domain name of the exchange proxy.
pub const EIP712_DOMAIN_NAME: &str = "ZeroEx";

/// EIP-712 domain version of the exchange proxy.
pub const EIP712_DOMAIN_VERSION: &str = "1.0.0";

/// EIP-712 type of a meta-transaction, as hashed by the exchange proxy.
pub const META_TRANSACTION_TYPE: &str = "MetaTransactionData(address signer,address sender,uint256 minGasPrice,uint256 maxGasPrice,uint256 expirationTimeSeconds,uint256 salt,bytes callData,uint256 value,address feeToken,uint256 feeAmount)";

/// Gas units charged as protocol fee for every order filled by a meta-transaction.
pub const PROTOCOL_FEE_GAS_PER_ORDER: u64 = 150_000;

/// Minimum time to expiry required of authorizations and the orders they fill.
pub const DEFAULT_EXPIRATION_BUFFER: Duration = Duration::from_secs(60);

/// Extra gas added on top of estimates to pass the contract 63/64 check.
pub const TX_GAS_BUFFER: u64 = 50_000;

/// Gas limit used when the node could not estimate a non-reverting call.
pub const FALLBACK_GAS_LIMIT: u64 = 1_000_000;

/// Default timeout of a single endpoint attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Default deadline of a whole relay call.
pub const DEFAULT_RELAY_DEADLINE: Duration = Duration::from_secs(90);
