use ethers::abi::parse_abi;
use ethers::contract::BaseContract;
use ethers::types::H256;
use ethers::utils::keccak256;
use lazy_static::lazy_static;

/// Safe versions whose transaction hashing and `execTransaction` layout this crate implements.
pub const SUPPORTED_SAFE_VERSIONS: &[&str] = &["1.1.1", "1.2.0", "1.3.0", "1.4.1"];

lazy_static! {
    /// The subset of the Safe singleton ABI shared by all supported versions.
    pub(crate) static ref SAFE_CONTRACT: BaseContract = BaseContract::from(
        parse_abi(&[
            "function VERSION() external view returns (string)",
            "function nonce() external view returns (uint256)",
            "function getThreshold() external view returns (uint256)",
            "function getOwners() external view returns (address[])",
            "function execTransaction(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, bytes signatures) external payable returns (bool)",
            "event ExecutionSuccess(bytes32 txHash, uint256 payment)",
            "event ExecutionFailure(bytes32 txHash, uint256 payment)",
        ])
        .expect("Safe ABI fragments are well formed")
    );

    /// Topic emitted by the Safe when the inner call of `execTransaction` fails.
    pub(crate) static ref EXECUTION_FAILURE_TOPIC: H256 =
        H256::from(keccak256("ExecutionFailure(bytes32,uint256)"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::id;

    #[test]
    fn test_selectors_match_safe_singleton() {
        let abi = SAFE_CONTRACT.abi();
        let selector = |name: &str| abi.function(name).unwrap().short_signature();
        assert_eq!(selector("nonce"), [0xaf, 0xfe, 0xd0, 0xe0]);
        assert_eq!(selector("getThreshold"), [0xe7, 0x52, 0x35, 0xb8]);
        assert_eq!(selector("execTransaction"), [0x6a, 0x76, 0x12, 0x02]);
        assert_eq!(abi.function("VERSION").unwrap().short_signature(), id("VERSION()"));
    }

    #[test]
    fn test_failure_topic_matches_event() {
        let event = SAFE_CONTRACT.abi().event("ExecutionFailure").unwrap();
        assert_eq!(event.signature(), *EXECUTION_FAILURE_TOPIC);
    }
}
