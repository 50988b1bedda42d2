//! The boundary between the Safe client and an EVM node.
//!
//! Everything the client needs from the chain goes through [`ChainConnector`]:
//! reading contract state, read-only calls, and broadcasting a transaction
//! signed by the connector's own identity. Retry and timeout policy belong to
//! the implementation, not to the callers.

mod rpc;

pub use rpc::EthersConnector;

use crate::prelude::Result;
use async_trait::async_trait;
use ethers::types::{Address, Bytes, Log, H256, U256};
use std::sync::Arc;

/// On-chain state of an account as seen by the connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractState {
    pub code: Bytes,
    pub balance: U256,
}

impl ContractState {
    pub fn is_deployed(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Result of a mined broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastOutcome {
    pub transaction_hash: H256,
    /// Receipt status of the outer transaction
    pub success: bool,
    pub logs: Vec<Log>,
}

#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Address of the identity used by [`ChainConnector::broadcast`].
    fn signer_address(&self) -> Address;

    async fn chain_id(&self) -> Result<U256>;

    async fn query(&self, address: Address) -> Result<ContractState>;

    /// Read-only `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Signs and sends a transaction to `to` carrying `data`, then waits for its receipt.
    async fn broadcast(&self, to: Address, data: Bytes) -> Result<BroadcastOutcome>;
}

#[async_trait]
impl<C> ChainConnector for Arc<C>
where
    C: ChainConnector + ?Sized,
{
    fn signer_address(&self) -> Address {
        (**self).signer_address()
    }

    async fn chain_id(&self) -> Result<U256> {
        (**self).chain_id().await
    }

    async fn query(&self, address: Address) -> Result<ContractState> {
        (**self).query(address).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        (**self).call(to, data).await
    }

    async fn broadcast(&self, to: Address, data: Bytes) -> Result<BroadcastOutcome> {
        (**self).broadcast(to, data).await
    }
}
