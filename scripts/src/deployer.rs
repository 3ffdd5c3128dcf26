//! The capability that publishes compiled contracts to a network

use alloy::{
    network::{Ethereum, ReceiptResponse, TransactionBuilder},
    primitives::{Address, TxHash},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use tracing::info;

use crate::{
    artifacts::ArtifactBundle, constants::DEFAULT_DEPLOY_CONFIRMATIONS, errors::ScriptError,
};

/// The outcome of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    /// The name of the deployed contract
    pub contract_name: String,
    /// The address at which the contract was deployed
    pub address: Address,
    /// The hash of the creation transaction, if the deployer sent one
    pub tx_hash: Option<TxHash>,
}

/// Publishes compiled contracts
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploy the given artifact, returning its on-chain address
    async fn deploy(&self, bundle: &ArtifactBundle) -> Result<DeploymentResult, ScriptError>;
}

/// A deployer that sends contract-creation transactions through an RPC provider
pub struct RpcDeployer<P> {
    /// The provider, expected to carry a signing wallet
    provider: P,
    /// The number of confirmations to wait for before a deployment is considered complete
    confirmations: u64,
}

impl<P: Provider<Ethereum>> RpcDeployer<P> {
    /// Create a deployer around the given provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            confirmations: DEFAULT_DEPLOY_CONFIRMATIONS,
        }
    }

    /// Set the number of confirmations to wait for
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }
}

#[async_trait]
impl<P: Provider<Ethereum>> Deployer for RpcDeployer<P> {
    async fn deploy(&self, bundle: &ArtifactBundle) -> Result<DeploymentResult, ScriptError> {
        let tx = TransactionRequest::default().with_deploy_code(bundle.bytecode.clone());

        let pending_tx = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractDeployment(format!("{}: {e}", bundle.contract_name)))?;
        info!(
            "Sent deployment of `{}` in tx {:#x}",
            bundle.contract_name,
            pending_tx.tx_hash()
        );

        let receipt = pending_tx
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(format!("{}: {e}", bundle.contract_name)))?;

        if !receipt.status() {
            return Err(ScriptError::ContractDeployment(format!(
                "{}: creation tx {:#x} reverted",
                bundle.contract_name, receipt.transaction_hash
            )));
        }

        let address = receipt.contract_address().ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "{}: receipt for tx {:#x} has no contract address",
                bundle.contract_name, receipt.transaction_hash
            ))
        })?;

        Ok(DeploymentResult {
            contract_name: bundle.contract_name.clone(),
            address,
            tx_hash: Some(receipt.transaction_hash),
        })
    }
}
