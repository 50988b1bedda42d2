#![deny(unreachable_pub)]
pub mod abi;
mod config;
pub mod connector;
mod errors;
pub mod pipeline;
pub mod prelude;
pub mod safe;

pub use abi::{
    decode_function_call, encode_function_call, node_driver, ContractInterface, FunctionCallSpec,
};
pub use config::Config;
pub use connector::{BroadcastOutcome, ChainConnector, ContractState, EthersConnector};
pub use errors::{Error, ResolutionError};
pub use pipeline::{PipelineError, PipelineState, Stage, TransactionPipeline};
pub use safe::{
    OperationType, SafeClient, SafeMetadata, SafeSignature, SafeTransactionData,
    SafeTransactionOptions, SignedSafeTransaction, SigningMethod, SubmissionResult,
    TransactionRequest, UnsignedSafeTransaction,
};
