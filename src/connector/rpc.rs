use super::{BroadcastOutcome, ChainConnector, ContractState};
use crate::prelude::Result;
use crate::{Config, Error};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256, U64};
use log::{debug, info};
use std::sync::Arc;

/// [`ChainConnector`] backed by a JSON-RPC endpoint and a local private key.
#[derive(Debug, Clone)]
pub struct EthersConnector {
    client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
}

impl EthersConnector {
    pub async fn new(rpc_url: &str, wallet: LocalWallet) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::Configuration(format!("invalid RPC URL {rpc_url}: {e}")))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let wallet = wallet.with_chain_id(chain_id.low_u64());
        debug!("Connected to chain {chain_id} as {:?}", wallet.address());

        Ok(EthersConnector {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.rpc_url, config.signer.clone()).await
    }
}

#[async_trait]
impl ChainConnector for EthersConnector {
    fn signer_address(&self) -> Address {
        self.client.address()
    }

    async fn chain_id(&self) -> Result<U256> {
        self.client
            .get_chainid()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }

    async fn query(&self, address: Address) -> Result<ContractState> {
        let code = self
            .client
            .get_code(address, None)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let balance = self
            .client
            .get_balance(address, None)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(ContractState { code, balance })
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.client
            .call(&tx, None)
            .await
            .map_err(|e| classify_rpc_error(e.to_string()))
    }

    async fn broadcast(&self, to: Address, data: Bytes) -> Result<BroadcastOutcome> {
        let tx = TransactionRequest::new()
            .from(self.client.address())
            .to(to)
            .data(data);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| classify_rpc_error(e.to_string()))?;
        let transaction_hash = *pending;
        info!("Broadcast transaction {transaction_hash:?}, waiting for receipt");

        let receipt = pending
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .ok_or_else(|| {
                Error::Network(format!(
                    "transaction {transaction_hash:?} was dropped before being mined"
                ))
            })?;

        Ok(BroadcastOutcome {
            transaction_hash,
            success: receipt.status == Some(U64::one()),
            logs: receipt.logs,
        })
    }
}

// Nodes report reverts during estimation or eth_call as plain JSON-RPC errors.
fn classify_rpc_error(message: String) -> Error {
    if message.to_lowercase().contains("revert") {
        Error::ExecutionReverted(message)
    } else {
        Error::Network(message)
    }
}
