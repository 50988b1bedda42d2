use super::types::SafeTransactionData;
use ethers::abi::{encode, ParamType, Token};
use ethers::types::transaction::eip712::{
    encode_eip712_type, make_type_hash, EIP712Domain, Eip712, Eip712Error,
};
use ethers::types::{Address, U256};
use ethers::utils::keccak256;

/// First version whose EIP-712 domain includes the chain id.
const CHAIN_ID_DOMAIN_SINCE: (u32, u32, u32) = (1, 3, 0);

/// The `SafeTx` EIP-712 struct bound to one Safe's domain.
#[derive(Debug, Clone)]
pub(crate) struct SafeTx {
    pub(crate) verifying_contract: Address,
    /// `None` for Safes whose domain predates the chain id field
    pub(crate) chain_id: Option<U256>,
    pub(crate) data: SafeTransactionData,
}

impl SafeTx {
    pub(crate) fn new(
        verifying_contract: Address,
        chain_id: U256,
        version: (u32, u32, u32),
        data: SafeTransactionData,
    ) -> Self {
        SafeTx {
            verifying_contract,
            chain_id: (version >= CHAIN_ID_DOMAIN_SINCE).then_some(chain_id),
            data,
        }
    }
}

impl Eip712 for SafeTx {
    type Error = Eip712Error;

    fn domain(&self) -> Result<EIP712Domain, Self::Error> {
        Ok(EIP712Domain {
            name: None,
            version: None,
            chain_id: self.chain_id,
            verifying_contract: Some(self.verifying_contract),
            salt: None,
        })
    }

    fn type_hash() -> Result<[u8; 32], Self::Error> {
        Ok(make_type_hash(
            "SafeTx".into(),
            &[
                ("to".to_string(), ParamType::Address),
                ("value".to_string(), ParamType::Uint(256)),
                ("data".to_string(), ParamType::Bytes),
                ("operation".to_string(), ParamType::Uint(8)),
                ("safeTxGas".to_string(), ParamType::Uint(256)),
                ("baseGas".to_string(), ParamType::Uint(256)),
                ("gasPrice".to_string(), ParamType::Uint(256)),
                ("gasToken".to_string(), ParamType::Address),
                ("refundReceiver".to_string(), ParamType::Address),
                ("nonce".to_string(), ParamType::Uint(256)),
            ],
        ))
    }

    fn struct_hash(&self) -> Result<[u8; 32], Self::Error> {
        let SafeTransactionData {
            to,
            value,
            data,
            operation,
            safe_tx_gas,
            base_gas,
            gas_price,
            gas_token,
            refund_receiver,
            nonce,
        } = &self.data;

        let items = vec![
            Token::FixedBytes(Self::type_hash()?.to_vec()),
            Token::Address(*to),
            Token::Uint(*value),
            encode_eip712_type(Token::Bytes(data.to_vec())),
            Token::Uint(U256::from(u8::from(*operation))),
            Token::Uint(*safe_tx_gas),
            Token::Uint(*base_gas),
            Token::Uint(*gas_price),
            Token::Address(*gas_token),
            Token::Address(*refund_receiver),
            Token::Uint(*nonce),
        ];
        Ok(keccak256(encode(&items)))
    }
}

/// Parses `major.minor.patch`, ignoring build metadata such as `+L2`.
pub(crate) fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let core = version.trim().split('+').next()?;
    let mut parts = core.split('.').map(|part| part.parse::<u32>().ok());
    let parsed = (parts.next()??, parts.next()??, parts.next()??);
    parts.next().is_none().then_some(parsed)
}
