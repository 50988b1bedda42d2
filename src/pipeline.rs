//! Build, sign and submit one Safe transaction.
//!
//! The pipeline is a linear state machine, `Built -> Signed -> Submitted`.
//! It never goes back and never retries: the first failing stage ends the run
//! and is reported as a [`PipelineError`] naming that stage.

use crate::connector::ChainConnector;
use crate::safe::{
    SafeClient, SafeTransactionOptions, SignedSafeTransaction, SigningMethod, SubmissionResult,
    TransactionRequest, UnsignedSafeTransaction,
};
use crate::Error;
use ethers::signers::Signer;
use log::{debug, error, info};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Sign,
    Submit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Build => "build",
            Stage::Sign => "sign",
            Stage::Submit => "submit",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone)]
#[error("`{stage}` failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub source: Error,
}

#[derive(Debug, Clone)]
pub enum PipelineState {
    Built(UnsignedSafeTransaction),
    Signed(SignedSafeTransaction),
    Submitted(SubmissionResult),
}

impl PipelineState {
    /// Stage that produced this state.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineState::Built(_) => Stage::Build,
            PipelineState::Signed(_) => Stage::Sign,
            PipelineState::Submitted(_) => Stage::Submit,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Submitted(_))
    }
}

pub struct TransactionPipeline<'a, C, S> {
    client: &'a SafeClient<C>,
    signer: &'a S,
    method: SigningMethod,
    options: SafeTransactionOptions,
}

impl<'a, C: ChainConnector, S: Signer> TransactionPipeline<'a, C, S> {
    /// Pipeline signing with `eth_sign` and default transaction options.
    pub fn new(client: &'a SafeClient<C>, signer: &'a S) -> Self {
        TransactionPipeline {
            client,
            signer,
            method: SigningMethod::EthSign,
            options: SafeTransactionOptions::default(),
        }
    }

    pub fn with_method(mut self, method: SigningMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_options(mut self, options: SafeTransactionOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs every stage for `request` and returns the execution result.
    pub async fn run(
        &self,
        request: TransactionRequest,
    ) -> Result<SubmissionResult, PipelineError> {
        let mut state = self.build(request).await?;
        loop {
            match state {
                PipelineState::Submitted(result) => return Ok(result),
                pending => state = self.step(pending).await?,
            }
        }
    }

    /// Entry transition: creates the Safe transaction.
    pub async fn build(&self, request: TransactionRequest) -> Result<PipelineState, PipelineError> {
        let transaction = self
            .client
            .build(request, self.options.clone())
            .await
            .map_err(|e| self.fail(Stage::Build, e))?;

        info!("Created the Safe transaction {:?}", transaction.safe_tx_hash);
        if let Ok(json) = serde_json::to_string(&transaction.data) {
            debug!("Safe transaction data: {json}");
        }
        Ok(PipelineState::Built(transaction))
    }

    /// Advances `state` by one stage. A submitted state is terminal and is returned unchanged.
    pub async fn step(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
        match state {
            PipelineState::Built(transaction) => {
                let signed = self
                    .client
                    .sign(transaction, self.signer, self.method)
                    .await
                    .map_err(|e| self.fail(Stage::Sign, e))?;
                info!("Signed the transaction.");
                Ok(PipelineState::Signed(signed))
            }
            PipelineState::Signed(transaction) => {
                let result = self
                    .client
                    .submit(&transaction)
                    .await
                    .map_err(|e| self.fail(Stage::Submit, e))?;
                info!(
                    "Successfully executed the transaction: {:?}",
                    result.transaction_hash
                );
                Ok(PipelineState::Submitted(result))
            }
            submitted @ PipelineState::Submitted(_) => Ok(submitted),
        }
    }

    fn fail(&self, stage: Stage, source: Error) -> PipelineError {
        error!("`{stage}` failed: {source}");
        PipelineError { stage, source }
    }
}
