use super::contract::{EXECUTION_FAILURE_TOPIC, SAFE_CONTRACT, SUPPORTED_SAFE_VERSIONS};
use super::typed_data::{parse_version, SafeTx};
use super::types::{
    SafeMetadata, SafeSignature, SafeTransactionData, SafeTransactionOptions,
    SignedSafeTransaction, SigningMethod, SubmissionResult, TransactionRequest,
    UnsignedSafeTransaction,
};
use crate::connector::ChainConnector;
use crate::prelude::Result;
use crate::{Error, ResolutionError};
use ethers::abi::{Detokenize, Tokenize};
use ethers::signers::Signer;
use ethers::types::transaction::eip712::Eip712;
use ethers::types::{Address, RecoveryMessage, Signature, H256, U256};
use log::{debug, info, warn};

/// Safe adds this to `v` to mark a signature as produced by `eth_sign`.
const ETH_SIGN_V_OFFSET: u64 = 4;

/// Handle to one deployed Safe, bound to a [`ChainConnector`].
#[derive(Debug)]
pub struct SafeClient<C> {
    connector: C,
    address: Address,
    chain_id: U256,
    version: (u32, u32, u32),
}

impl<C: ChainConnector> SafeClient<C> {
    /// Binds to the Safe at `address`, checking that a contract is deployed
    /// there and that it reports a supported version.
    pub async fn resolve(connector: C, address: Address) -> Result<Self> {
        let state = connector.query(address).await?;
        if !state.is_deployed() {
            return Err(ResolutionError::NotFound(address).into());
        }

        let version_read = read_contract::<_, String, _>(&connector, address, "VERSION", ()).await;
        let reported = match version_read {
            Ok(version) => version,
            Err(Error::ExecutionReverted(_)) | Err(Error::Encoding(_)) => "unknown".to_string(),
            Err(e) => return Err(e),
        };
        let version = parse_version(&reported)
            .filter(|(major, minor, patch)| {
                SUPPORTED_SAFE_VERSIONS.contains(&format!("{major}.{minor}.{patch}").as_str())
            })
            .ok_or_else(|| ResolutionError::UnsupportedVersion {
                address,
                version: reported.clone(),
            })?;

        let chain_id = connector.chain_id().await?;
        info!("Resolved Safe {address:?} (version {reported}) on chain {chain_id}");

        Ok(SafeClient {
            connector,
            address,
            chain_id,
            version,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn chain_id(&self) -> Result<U256> {
        self.connector.chain_id().await
    }

    pub async fn contract_version(&self) -> Result<String> {
        self.read("VERSION", ()).await
    }

    pub async fn threshold(&self) -> Result<u64> {
        let threshold: U256 = self.read("getThreshold", ()).await?;
        // bounded by the owner count
        Ok(threshold.low_u64())
    }

    pub async fn nonce(&self) -> Result<U256> {
        self.read("nonce", ()).await
    }

    pub async fn owners(&self) -> Result<Vec<Address>> {
        self.read("getOwners", ()).await
    }

    pub async fn is_owner(&self, address: Address) -> Result<bool> {
        Ok(self.owners().await?.contains(&address))
    }

    pub async fn metadata(&self) -> Result<SafeMetadata> {
        Ok(SafeMetadata {
            address: self.address,
            chain_id: self.chain_id().await?,
            version: self.contract_version().await?,
            threshold: self.threshold().await?,
        })
    }

    /// Creates the Safe transaction for `request`, using the Safe's current
    /// nonce unless `options` pins one.
    pub async fn build(
        &self,
        request: TransactionRequest,
        options: SafeTransactionOptions,
    ) -> Result<UnsignedSafeTransaction> {
        let nonce = match options.nonce {
            Some(nonce) => nonce,
            None => self.nonce().await.map_err(|e| match e {
                Error::Network(message) | Error::ExecutionReverted(message) => {
                    Error::Build(format!("nonce unavailable: {message}"))
                }
                other => other,
            })?,
        };

        let data = SafeTransactionData::new(request, &options, nonce);
        let transaction = self.hash_transaction(data)?;
        debug!(
            "Built Safe transaction with nonce {nonce}, safeTxHash {:?}",
            transaction.safe_tx_hash
        );
        Ok(transaction)
    }

    /// Computes the `safeTxHash` of fully specified transaction data.
    pub fn hash_transaction(&self, data: SafeTransactionData) -> Result<UnsignedSafeTransaction> {
        let typed = self.typed_data(data);
        let safe_tx_hash = typed
            .encode_eip712()
            .map_err(|e| Error::Build(e.to_string()))?;

        Ok(UnsignedSafeTransaction {
            data: typed.data,
            safe_tx_hash: H256::from(safe_tx_hash),
        })
    }

    /// Adds one signature from `signer` to `transaction`.
    ///
    /// `transaction` may already carry signatures from other owners; the
    /// threshold is only checked on submission.
    pub async fn sign<S: Signer>(
        &self,
        transaction: impl Into<SignedSafeTransaction>,
        signer: &S,
        method: SigningMethod,
    ) -> Result<SignedSafeTransaction> {
        let mut transaction = transaction.into();
        let signer_address = signer.address();

        if !self.is_owner(signer_address).await? {
            return Err(Error::Signing(format!(
                "{signer_address:?} is not an owner of Safe {:?}",
                self.address
            )));
        }

        let safe_tx_hash = transaction.safe_tx_hash();
        let (signature, message) = match method {
            SigningMethod::EthSign => {
                let signature = signer
                    .sign_message(safe_tx_hash)
                    .await
                    .map_err(|e| Error::Signing(e.to_string()))?;
                (signature, RecoveryMessage::Data(safe_tx_hash.as_bytes().to_vec()))
            }
            SigningMethod::EthSignTypedData => {
                let typed = self.typed_data(transaction.transaction.data.clone());
                let signature = signer
                    .sign_typed_data(&typed)
                    .await
                    .map_err(|e| Error::Signing(e.to_string()))?;
                (signature, RecoveryMessage::Hash(safe_tx_hash))
            }
        };

        let recovered = signature
            .recover(message)
            .map_err(|e| Error::Signing(e.to_string()))?;
        if recovered != signer_address {
            return Err(Error::Signing(format!(
                "signature recovers to {recovered:?}, expected {signer_address:?}"
            )));
        }

        transaction.add_signature(SafeSignature {
            signer: signer_address,
            data: encode_signature(signature, method).into(),
            method,
        });
        info!("Signed Safe transaction {safe_tx_hash:?} as {signer_address:?}");
        Ok(transaction)
    }

    /// Executes `transaction` through the Safe once it carries enough signatures.
    ///
    /// Only signatures that recover to a current owner over the transaction's
    /// own `safeTxHash` count towards the threshold, and only those are sent.
    pub async fn submit(&self, transaction: &SignedSafeTransaction) -> Result<SubmissionResult> {
        let verified = self.verified_signatures(transaction).await?;
        let required = self.threshold().await?;
        let provided = verified.signature_count();
        if (provided as u64) < required {
            warn!(
                "Refusing to submit {:?}: {provided} of {required} signatures",
                transaction.safe_tx_hash()
            );
            return Err(Error::ThresholdNotMet { required, provided });
        }

        let data = &transaction.transaction.data;
        if !data.value.is_zero() {
            let available = self.connector.query(self.address).await?.balance;
            if available < data.value {
                return Err(Error::InsufficientFunds {
                    required: data.value,
                    available,
                });
            }
        }

        let calldata = SAFE_CONTRACT
            .encode(
                "execTransaction",
                (
                    data.to,
                    data.value,
                    data.data.clone(),
                    u8::from(data.operation),
                    data.safe_tx_gas,
                    data.base_gas,
                    data.gas_price,
                    data.gas_token,
                    data.refund_receiver,
                    verified.encoded_signatures(),
                ),
            )
            .map_err(|e| Error::Encoding(e.to_string()))?;

        debug!(
            "Submitting Safe transaction {:?} from {:?}",
            transaction.safe_tx_hash(),
            self.connector.signer_address()
        );
        let outcome = self.connector.broadcast(self.address, calldata).await?;
        let inner_failed = outcome.logs.iter().any(|log| {
            log.address == self.address && log.topics.first() == Some(&*EXECUTION_FAILURE_TOPIC)
        });
        if !outcome.success || inner_failed {
            return Err(Error::ExecutionReverted(format!(
                "Safe transaction {:?} failed in chain transaction {:?}",
                transaction.safe_tx_hash(),
                outcome.transaction_hash
            )));
        }

        info!(
            "Executed Safe transaction {:?} in {:?}",
            transaction.safe_tx_hash(),
            outcome.transaction_hash
        );
        Ok(SubmissionResult {
            transaction_hash: outcome.transaction_hash,
            success: true,
        })
    }

    /// Keeps the signatures that are valid for `transaction` as it stands.
    ///
    /// Fails when the stored `safeTxHash` no longer matches the transaction
    /// data, since every signature would then cover something else.
    async fn verified_signatures(
        &self,
        transaction: &SignedSafeTransaction,
    ) -> Result<SignedSafeTransaction> {
        let safe_tx_hash = transaction.safe_tx_hash();
        let expected = self
            .hash_transaction(transaction.transaction.data.clone())?
            .safe_tx_hash;
        if expected != safe_tx_hash {
            return Err(Error::Signing(format!(
                "safeTxHash {safe_tx_hash:?} does not match the transaction data ({expected:?})"
            )));
        }

        let owners = self.owners().await?;
        let mut verified = SignedSafeTransaction::from(transaction.transaction.clone());
        for (key, signature) in &transaction.signatures {
            let valid = match recover_signer(signature, safe_tx_hash) {
                Ok(recovered) => {
                    *key == signature.signer
                        && recovered == signature.signer
                        && owners.contains(&recovered)
                }
                Err(_) => false,
            };
            if valid {
                verified.add_signature(signature.clone());
            } else {
                warn!("Dropping invalid signature listed for {key:?} on {safe_tx_hash:?}");
            }
        }
        Ok(verified)
    }

    fn typed_data(&self, data: SafeTransactionData) -> SafeTx {
        SafeTx::new(self.address, self.chain_id, self.version, data)
    }

    async fn read<T: Tokenize, D: Detokenize>(&self, name: &str, args: T) -> Result<D> {
        read_contract(&self.connector, self.address, name, args).await
    }
}

async fn read_contract<C, D, T>(connector: &C, safe: Address, name: &str, args: T) -> Result<D>
where
    C: ChainConnector,
    D: Detokenize,
    T: Tokenize,
{
    let calldata = SAFE_CONTRACT
        .encode(name, args)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    let output = connector.call(safe, calldata).await?;
    SAFE_CONTRACT
        .decode_output(name, output)
        .map_err(|e| Error::Encoding(format!("unexpected {name} output: {e}")))
}

/// `r ‖ s ‖ v` in the layout `execTransaction` checks.
fn encode_signature(signature: Signature, method: SigningMethod) -> Vec<u8> {
    let v = match method {
        SigningMethod::EthSign => signature.v + ETH_SIGN_V_OFFSET,
        SigningMethod::EthSignTypedData => signature.v,
    };
    Signature { v, ..signature }.to_vec()
}

/// Address that produced `signature` over `safe_tx_hash`.
fn recover_signer(signature: &SafeSignature, safe_tx_hash: H256) -> Result<Address> {
    if signature.data.len() != 65 {
        return Err(Error::Signing(format!(
            "signature is {} bytes, expected 65",
            signature.data.len()
        )));
    }

    let mut raw = signature.data.to_vec();
    let message = match signature.method {
        SigningMethod::EthSign => {
            raw[64] = raw[64]
                .checked_sub(ETH_SIGN_V_OFFSET as u8)
                .ok_or_else(|| Error::Signing(format!("invalid eth_sign v {}", raw[64])))?;
            RecoveryMessage::Data(safe_tx_hash.as_bytes().to_vec())
        }
        SigningMethod::EthSignTypedData => RecoveryMessage::Hash(safe_tx_hash),
    };

    Signature::try_from(raw.as_slice())
        .and_then(|signature| signature.recover(message))
        .map_err(|e| Error::Signing(e.to_string()))
}
