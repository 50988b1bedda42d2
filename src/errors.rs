use ethers::types::{Address, U256};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No Safe contract is deployed at {0:?}")]
    NotFound(Address),
    #[error("Safe at {address:?} reports unsupported version {version}")]
    UnsupportedVersion { address: Address, version: String },
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Missing or invalid configuration value: {0}")]
    Configuration(String),
    #[error("Private key parse error: {0}")]
    PrivateKeyParse(String),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("Calldata encoding error: {0}")]
    Encoding(String),
    #[error("Transaction build error: {0}")]
    Build(String),
    #[error("Signing error: {0}")]
    Signing(String),
    #[error("Threshold not met: {provided} signature(s) provided, {required} required")]
    ThresholdNotMet { required: u64, provided: usize },
    #[error("Not enough native funds in Safe: {required} required, {available} available")]
    InsufficientFunds { required: U256, available: U256 },
    #[error("Execution reverted: {0}")]
    ExecutionReverted(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
