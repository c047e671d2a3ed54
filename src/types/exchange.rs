use alloy::sol;

sol! {
    /// The subset of the exchange proxy used by the relay: meta-transaction execution and the
    /// native order fill functions a meta-transaction may wrap.
    interface IZeroEx {
        /// How a [`Signature`] was produced.
        #[derive(Debug, PartialEq, Eq)]
        enum SignatureType {
            ILLEGAL,
            INVALID,
            EIP712,
            ETHSIGN,
            PRESIGNED,
        }

        /// An ECDSA signature as accepted by the exchange proxy.
        #[derive(Debug, PartialEq, Eq)]
        struct Signature {
            SignatureType signatureType;
            uint8 v;
            bytes32 r;
            bytes32 s;
        }

        /// A meta-transaction, as hashed and executed by the exchange proxy.
        #[derive(Debug, PartialEq, Eq)]
        struct MetaTransactionData {
            address signer;
            address sender;
            uint256 minGasPrice;
            uint256 maxGasPrice;
            uint256 expirationTimeSeconds;
            uint256 salt;
            bytes callData;
            uint256 value;
            address feeToken;
            uint256 feeAmount;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct LimitOrder {
            address makerToken;
            address takerToken;
            uint128 makerAmount;
            uint128 takerAmount;
            uint128 takerTokenFeeAmount;
            address maker;
            address taker;
            address sender;
            address feeRecipient;
            bytes32 pool;
            uint64 expiry;
            uint256 salt;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct RfqOrder {
            address makerToken;
            address takerToken;
            uint128 makerAmount;
            uint128 takerAmount;
            address maker;
            address taker;
            address txOrigin;
            bytes32 pool;
            uint64 expiry;
            uint256 salt;
        }

        /// Executes a signed meta-transaction on behalf of its signer.
        function executeMetaTransaction(MetaTransactionData calldata mtx, Signature calldata signature)
            external
            payable
            returns (bytes memory returnResult);

        function fillLimitOrder(LimitOrder calldata order, Signature calldata signature, uint128 takerTokenFillAmount)
            external
            payable
            returns (uint128 takerTokenFilledAmount, uint128 makerTokenFilledAmount);

        function fillOrKillLimitOrder(LimitOrder calldata order, Signature calldata signature, uint128 takerTokenFillAmount)
            external
            payable
            returns (uint128 makerTokenFilledAmount);

        function batchFillLimitOrders(
            LimitOrder[] calldata orders,
            Signature[] calldata signatures,
            uint128[] calldata takerTokenFillAmounts,
            bool revertIfIncomplete
        )
            external
            payable
            returns (uint128[] memory takerTokenFilledAmounts, uint128[] memory makerTokenFilledAmounts);

        function fillRfqOrder(RfqOrder calldata order, Signature calldata signature, uint128 takerTokenFillAmount)
            external
            returns (uint128 takerTokenFilledAmount, uint128 makerTokenFilledAmount);

        function fillOrKillRfqOrder(RfqOrder calldata order, Signature calldata signature, uint128 takerTokenFillAmount)
            external
            returns (uint128 makerTokenFilledAmount);

        function batchFillRfqOrders(
            RfqOrder[] calldata orders,
            Signature[] calldata signatures,
            uint128[] calldata takerTokenFillAmounts,
            bool revertIfIncomplete
        )
            external
            returns (uint128[] memory takerTokenFilledAmounts, uint128[] memory makerTokenFilledAmounts);
    }
}
