use crate::prelude::Result;
use crate::Error;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether the Safe executes the call in the callee's context or its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OperationType {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl From<OperationType> for u8 {
    fn from(operation: OperationType) -> Self {
        operation as u8
    }
}

impl TryFrom<u8> for OperationType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(OperationType::Call),
            1 => Ok(OperationType::DelegateCall),
            other => Err(Error::Build(format!("invalid operation type {other}"))),
        }
    }
}

/// What the Safe should do: the intent, before any Safe-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: OperationType,
}

impl TransactionRequest {
    pub fn new(to: Address, value: U256, data: Bytes, operation: OperationType) -> Self {
        TransactionRequest {
            to,
            value,
            data,
            operation,
        }
    }

    /// Builds a request from untyped input: a hex address, a decimal value,
    /// `0x`-prefixed calldata and the raw operation byte.
    pub fn parse(to: &str, value: &str, data: &str, operation: u8) -> Result<Self> {
        let to = to
            .trim()
            .parse::<Address>()
            .map_err(|e| Error::Build(format!("malformed recipient {to}: {e}")))?;
        let value = U256::from_dec_str(value.trim())
            .map_err(|e| Error::Build(format!("malformed value {value}: {e}")))?;
        let data = data
            .trim()
            .parse::<Bytes>()
            .map_err(|e| Error::Build(format!("malformed data: {e}")))?;
        let operation = OperationType::try_from(operation)?;

        Ok(Self::new(to, value, data, operation))
    }
}

/// Safe-specific fields of a transaction. Unset fields take their defaults
/// at build time: the Safe's current nonce, and zero for everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeTransactionOptions {
    pub nonce: Option<U256>,
    pub safe_tx_gas: Option<U256>,
    pub base_gas: Option<U256>,
    pub gas_price: Option<U256>,
    pub gas_token: Option<Address>,
    pub refund_receiver: Option<Address>,
}

/// Every field the Safe hashes and executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransactionData {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: OperationType,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

impl SafeTransactionData {
    pub fn new(request: TransactionRequest, options: &SafeTransactionOptions, nonce: U256) -> Self {
        SafeTransactionData {
            to: request.to,
            value: request.value,
            data: request.data,
            operation: request.operation,
            safe_tx_gas: options.safe_tx_gas.unwrap_or_default(),
            base_gas: options.base_gas.unwrap_or_default(),
            gas_price: options.gas_price.unwrap_or_default(),
            gas_token: options.gas_token.unwrap_or_default(),
            refund_receiver: options.refund_receiver.unwrap_or_default(),
            nonce,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedSafeTransaction {
    pub data: SafeTransactionData,
    /// EIP-712 digest the owners sign
    pub safe_tx_hash: H256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningMethod {
    /// `eth_sign` over the Safe transaction hash (EIP-191 prefixed)
    EthSign,
    /// EIP-712 typed data signature
    EthSignTypedData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSignature {
    pub signer: Address,
    /// 65 bytes, `r ‖ s ‖ v`, with `v` already adjusted for the signing method
    pub data: Bytes,
    pub method: SigningMethod,
}

/// A Safe transaction with the signatures collected so far, keyed (and so
/// ordered) by signer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSafeTransaction {
    pub transaction: UnsignedSafeTransaction,
    pub signatures: BTreeMap<Address, SafeSignature>,
}

impl SignedSafeTransaction {
    pub fn safe_tx_hash(&self) -> H256 {
        self.transaction.safe_tx_hash
    }

    /// Adds `signature`, replacing an earlier one from the same signer.
    pub fn add_signature(&mut self, signature: SafeSignature) {
        self.signatures.insert(signature.signer, signature);
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Signatures concatenated in ascending signer order, as `execTransaction` expects.
    pub fn encoded_signatures(&self) -> Bytes {
        self.signatures
            .values()
            .flat_map(|signature| signature.data.iter().copied())
            .collect::<Vec<u8>>()
            .into()
    }
}

impl From<UnsignedSafeTransaction> for SignedSafeTransaction {
    fn from(transaction: UnsignedSafeTransaction) -> Self {
        SignedSafeTransaction {
            transaction,
            signatures: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub transaction_hash: H256,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeMetadata {
    pub address: Address,
    pub chain_id: U256,
    pub version: String,
    pub threshold: u64,
}

impl fmt::Display for SafeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " - Address:   {:?}", self.address)?;
        writeln!(f, " - ChainID:   {}", self.chain_id)?;
        writeln!(f, " - Version:   {}", self.version)?;
        write!(f, " - Threshold: {}", self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(signer: Address, fill: u8) -> SafeSignature {
        SafeSignature {
            signer,
            data: vec![fill; 65].into(),
            method: SigningMethod::EthSign,
        }
    }

    fn unsigned() -> UnsignedSafeTransaction {
        let request = TransactionRequest::parse(
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3",
            "0",
            "0x6057361d0000000000000000000000000000000000000000000000000000000000000002",
            0,
        )
        .unwrap();
        UnsignedSafeTransaction {
            data: SafeTransactionData::new(
                request,
                &SafeTransactionOptions::default(),
                U256::zero(),
            ),
            safe_tx_hash: H256::repeat_byte(0x11),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_recipient() {
        let err = TransactionRequest::parse("0xdb60", "0", "0x", 0).unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_operation() {
        let err = TransactionRequest::parse(
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3",
            "0",
            "0x",
            2,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_parse_rejects_bad_data() {
        let err = TransactionRequest::parse(
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3",
            "0",
            "0xzz",
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_options_default_to_zero() {
        let data = unsigned().data;
        assert_eq!(data.safe_tx_gas, U256::zero());
        assert_eq!(data.gas_token, Address::zero());
        assert_eq!(data.refund_receiver, Address::zero());
        assert_eq!(data.operation, OperationType::Call);
    }

    #[test]
    fn test_signatures_are_encoded_in_signer_order() {
        let low = Address::from_low_u64_be(1);
        let high = Address::from_low_u64_be(2);
        let mut signed = SignedSafeTransaction::from(unsigned());
        signed.add_signature(signature(high, 0xbb));
        signed.add_signature(signature(low, 0xaa));

        let encoded = signed.encoded_signatures();
        assert_eq!(encoded.len(), 130);
        assert!(encoded[..65].iter().all(|b| *b == 0xaa));
        assert!(encoded[65..].iter().all(|b| *b == 0xbb));
    }

    #[test]
    fn test_same_signer_replaces_signature() {
        let signer = Address::from_low_u64_be(7);
        let mut signed = SignedSafeTransaction::from(unsigned());
        signed.add_signature(signature(signer, 0x01));
        signed.add_signature(signature(signer, 0x02));

        assert_eq!(signed.signature_count(), 1);
        assert_eq!(signed.encoded_signatures()[0], 0x02);
    }

    #[test]
    fn test_operation_serializes_as_number() {
        let json = serde_json::to_string(&unsigned().data).unwrap();
        assert!(json.contains("\"operation\":0"));
        assert!(json.contains("\"safeTxGas\""));
    }
}
