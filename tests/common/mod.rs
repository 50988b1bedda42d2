#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::{encode, parse_abi, Function, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Log, H256, U256};
use ethers::utils::{id, keccak256};
use safe_ranger::prelude::Result;
use safe_ranger::{BroadcastOutcome, ChainConnector, ContractState, Error};
use std::sync::Mutex;

// Well-known development keys, never funded on a real network.
pub const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const SECOND_OWNER_KEY: &str =
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const OUTSIDER_KEY: &str = "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

pub const RECIPIENT: &str = "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3";
pub const STORE_CALLDATA: &str =
    "0x6057361d0000000000000000000000000000000000000000000000000000000000000002";

pub fn wallet(key: &str) -> LocalWallet {
    key.parse().unwrap()
}

pub fn safe_address() -> Address {
    "0x5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe".parse().unwrap()
}

/// In-memory chain holding a single Safe. Records every broadcast.
#[derive(Debug)]
pub struct MockConnector {
    pub executor: Address,
    pub chain_id: U256,
    pub deployed: bool,
    pub version: Option<String>,
    pub threshold: u64,
    pub nonce: Option<U256>,
    pub owners: Vec<Address>,
    pub balance: U256,
    pub receipt_success: bool,
    pub emit_execution_failure: bool,
    pub broadcasts: Mutex<Vec<(Address, Bytes)>>,
}

impl MockConnector {
    /// A deployed 1/1 Safe v1.3.0 owned by [`OWNER_KEY`].
    pub fn one_of_one() -> Self {
        let owner = wallet(OWNER_KEY).address();
        MockConnector {
            executor: owner,
            chain_id: U256::from(4003),
            deployed: true,
            version: Some("1.3.0".to_string()),
            threshold: 1,
            nonce: Some(U256::from(3)),
            owners: vec![owner],
            balance: U256::zero(),
            receipt_success: true,
            emit_execution_failure: false,
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub fn two_of_two() -> Self {
        let mut connector = Self::one_of_one();
        connector.threshold = 2;
        connector.owners.push(wallet(SECOND_OWNER_KEY).address());
        connector
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    pub fn last_broadcast(&self) -> Option<(Address, Bytes)> {
        self.broadcasts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChainConnector for MockConnector {
    fn signer_address(&self) -> Address {
        self.executor
    }

    async fn chain_id(&self) -> Result<U256> {
        Ok(self.chain_id)
    }

    async fn query(&self, address: Address) -> Result<ContractState> {
        let code = if self.deployed && address == safe_address() {
            Bytes::from(vec![0x60, 0x80, 0x60, 0x40])
        } else {
            Bytes::default()
        };
        Ok(ContractState {
            code,
            balance: self.balance,
        })
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let output = if selector == id("VERSION()") {
            let version = self
                .version
                .clone()
                .ok_or_else(|| Error::ExecutionReverted("execution reverted".to_string()))?;
            encode(&[Token::String(version)])
        } else if selector == id("nonce()") {
            let nonce = self
                .nonce
                .ok_or_else(|| Error::Network("connection refused".to_string()))?;
            encode(&[Token::Uint(nonce)])
        } else if selector == id("getThreshold()") {
            encode(&[Token::Uint(U256::from(self.threshold))])
        } else if selector == id("getOwners()") {
            encode(&[Token::Array(
                self.owners.iter().copied().map(Token::Address).collect(),
            )])
        } else {
            return Err(Error::ExecutionReverted("execution reverted".to_string()));
        };
        Ok(output.into())
    }

    async fn broadcast(&self, to: Address, data: Bytes) -> Result<BroadcastOutcome> {
        let transaction_hash = H256::from(keccak256(&data));
        self.broadcasts.lock().unwrap().push((to, data));

        let logs = if self.emit_execution_failure {
            vec![Log {
                address: to,
                topics: vec![H256::from(keccak256("ExecutionFailure(bytes32,uint256)"))],
                ..Default::default()
            }]
        } else {
            Vec::new()
        };

        Ok(BroadcastOutcome {
            transaction_hash,
            success: self.receipt_success,
            logs,
        })
    }
}

pub fn exec_transaction() -> Function {
    parse_abi(&[
        "function execTransaction(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, bytes signatures) external payable returns (bool)",
    ])
    .unwrap()
    .function("execTransaction")
    .unwrap()
    .clone()
}

/// Decodes the arguments of a broadcast `execTransaction` call.
pub fn decode_exec_transaction(calldata: &[u8]) -> Vec<Token> {
    let function = exec_transaction();
    assert_eq!(&calldata[..4], &function.short_signature());
    function.decode_input(&calldata[4..]).unwrap()
}
