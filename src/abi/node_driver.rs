//! NodeDriverAuth: the administrative contract that accepts network rule diffs.

use super::{encode_function_call, ContractInterface, FunctionCallSpec};
use crate::prelude::Result;
use ethers::types::{Address, Bytes, H160};
use log::info;
use std::path::Path;

/// NodeDriverAuth contract address (`0xd100ae0000000000000000000000000000000000`)
pub const NODE_DRIVER_AUTH_ADDRESS: Address = H160([
    0xd1, 0x00, 0xae, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
]);

pub const UPDATE_NETWORK_RULES: &str = "updateNetworkRules";

const NODE_DRIVER_AUTH_ABI: &str = r#"[{
    "constant": false,
    "inputs": [{"internalType": "bytes", "name": "diff", "type": "bytes"}],
    "name": "updateNetworkRules",
    "outputs": [],
    "payable": false,
    "stateMutability": "nonpayable",
    "type": "function"
}]"#;

pub fn node_driver_auth_interface() -> Result<ContractInterface> {
    ContractInterface::from_json(NODE_DRIVER_AUTH_ABI)
}

/// Encodes `updateNetworkRules(diff)` with `diff` as an opaque byte blob.
pub fn encode_update_network_rules(diff: Vec<u8>) -> Result<Bytes> {
    let spec = FunctionCallSpec::with_bytes_argument(UPDATE_NETWORK_RULES, diff);
    encode_function_call(&node_driver_auth_interface()?, &spec)
}

/// Reads the rules file in full and encodes it as the `updateNetworkRules` argument.
pub fn prepare_update_network_rules_call(rules_path: impl AsRef<Path>) -> Result<Bytes> {
    let rules_path = rules_path.as_ref();
    let rules = std::fs::read(rules_path)?;
    info!(
        "Loaded {} byte(s) of network rules from {}",
        rules.len(),
        rules_path.display()
    );
    encode_update_network_rules(rules)
}
