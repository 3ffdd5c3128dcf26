//! The migration sequencer, deploying a fixed list of contracts in order
//!
//! Each contract is resolved and deployed independently: no step consumes
//! the address produced by an earlier one. A step's deployment is awaited
//! before the next step's artifact is resolved, so requests reach the
//! deployer strictly in list order.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use itertools::Itertools;
use tracing::{error, info};

use crate::{
    artifacts::ArtifactResolver,
    constants::MIGRATION_CONTRACTS,
    deployer::{DeploymentResult, Deployer},
    errors::ScriptError,
};

/// What to do once a step of the migration fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failed step
    #[default]
    Abort,
    /// Record the failure and attempt the remaining steps
    Continue,
}

/// The outcome of a single step of a migration
#[derive(Debug)]
pub enum StepOutcome {
    /// The contract was deployed
    Deployed(DeploymentResult),
    /// The contract was already deployed at `address` and was left untouched
    Skipped {
        /// The previously recorded address
        address: Address,
    },
    /// Resolving or deploying the contract failed
    Failed(ScriptError),
}

/// The ordered outcomes of a migration
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// The outcome of each attempted step, in the order attempted
    steps: Vec<(String, StepOutcome)>,
}

impl MigrationReport {
    /// Append the outcome of a step
    fn push(&mut self, contract_name: &str, outcome: StepOutcome) {
        self.steps.push((contract_name.to_string(), outcome));
    }

    /// The attempted steps, in order
    pub fn steps(&self) -> &[(String, StepOutcome)] {
        &self.steps
    }

    /// The contracts deployed during this migration
    pub fn deployed(&self) -> impl Iterator<Item = &DeploymentResult> {
        self.steps.iter().filter_map(|(_, outcome)| match outcome {
            StepOutcome::Deployed(result) => Some(result),
            _ => None,
        })
    }

    /// The names of the contracts whose step failed
    pub fn failed(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether every attempted step succeeded or was skipped
    pub fn is_complete(&self) -> bool {
        self.failed().is_empty()
    }

    /// Convert the report into an error if any step failed.
    ///
    /// A single failure is returned as-is, several are summarized in a
    /// [`ScriptError::MigrationIncomplete`].
    pub fn into_result(self) -> Result<Self, ScriptError> {
        if self.is_complete() {
            return Ok(self);
        }

        let failed_names = self.failed().iter().join(", ");
        let mut failures = self
            .steps
            .into_iter()
            .filter_map(|(_, outcome)| match outcome {
                StepOutcome::Failed(e) => Some(e),
                _ => None,
            })
            .collect_vec();

        if failures.len() == 1 {
            Err(failures.remove(0))
        } else {
            Err(ScriptError::MigrationIncomplete(failed_names))
        }
    }
}

/// Deploys a list of contracts, one after another
#[derive(Debug, Clone)]
pub struct DeploymentSequencer {
    /// The contracts to deploy, in order
    contracts: Vec<String>,
    /// What to do once a step fails
    failure_policy: FailurePolicy,
    /// Contracts already deployed, which are skipped
    existing: BTreeMap<String, Address>,
}

impl Default for DeploymentSequencer {
    /// The `Receiver` then `Factory` migration
    fn default() -> Self {
        Self::new(MIGRATION_CONTRACTS)
    }
}

impl DeploymentSequencer {
    /// Create a sequencer deploying `contracts` in the given order
    pub fn new<I, S>(contracts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contracts: contracts.into_iter().map(Into::into).collect(),
            failure_policy: FailurePolicy::default(),
            existing: BTreeMap::new(),
        }
    }

    /// Set the policy applied when a step fails
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Skip any contract that already has an address in `existing`
    pub fn with_existing_deployments(mut self, existing: BTreeMap<String, Address>) -> Self {
        self.existing = existing;
        self
    }

    /// The contracts this sequencer deploys, in order
    pub fn contracts(&self) -> &[String] {
        &self.contracts
    }

    /// Run the migration, resolving each contract through `resolver` and
    /// publishing it through `deployer`.
    ///
    /// Step failures never surface as an `Err` here; they are recorded in
    /// the returned report, see [`MigrationReport::into_result`].
    pub async fn run<R, D>(&self, resolver: &R, deployer: &D) -> MigrationReport
    where
        R: ArtifactResolver + ?Sized,
        D: Deployer + ?Sized,
    {
        let mut report = MigrationReport::default();

        for contract_name in &self.contracts {
            if let Some(&address) = self.existing.get(contract_name) {
                info!("Skipping `{contract_name}`, already deployed at {address:#x}");
                report.push(contract_name, StepOutcome::Skipped { address });
                continue;
            }

            match Self::deploy_contract(contract_name, resolver, deployer).await {
                Ok(result) => {
                    info!("Deployed `{contract_name}` at {:#x}", result.address);
                    report.push(contract_name, StepOutcome::Deployed(result));
                }
                Err(e) => {
                    error!("Failed to deploy `{contract_name}`: {e}");
                    report.push(contract_name, StepOutcome::Failed(e));
                    if self.failure_policy == FailurePolicy::Abort {
                        break;
                    }
                }
            }
        }

        report
    }

    /// Resolve and deploy a single contract
    async fn deploy_contract<R, D>(
        contract_name: &str,
        resolver: &R,
        deployer: &D,
    ) -> Result<DeploymentResult, ScriptError>
    where
        R: ArtifactResolver + ?Sized,
        D: Deployer + ?Sized,
    {
        let bundle = resolver.resolve(contract_name)?;
        info!(
            "Deploying `{contract_name}` ({} bytes of bytecode)",
            bundle.bytecode.len()
        );
        deployer.deploy(&bundle).await
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Mutex};

    use alloy::{
        json_abi::JsonAbi,
        primitives::{Address, Bytes},
    };
    use async_trait::async_trait;

    use crate::{
        artifacts::{ArtifactBundle, InMemoryArtifactResolver},
        deployer::{Deployer, DeploymentResult},
        errors::ScriptError,
    };

    use super::{DeploymentSequencer, FailurePolicy, StepOutcome};

    /// A deployer that records every bundle it is asked to deploy
    #[derive(Default)]
    struct RecordingDeployer {
        /// The bundles received, in order
        calls: Mutex<Vec<ArtifactBundle>>,
        /// A contract whose deployment is rejected
        reject: Option<&'static str>,
    }

    impl RecordingDeployer {
        /// A deployer rejecting the deployment of `name`
        fn rejecting(name: &'static str) -> Self {
            Self {
                reject: Some(name),
                ..Default::default()
            }
        }

        /// The bundles received so far
        fn calls(&self) -> Vec<ArtifactBundle> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Deployer for RecordingDeployer {
        async fn deploy(&self, bundle: &ArtifactBundle) -> Result<DeploymentResult, ScriptError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(bundle.clone());

            if self.reject == Some(bundle.contract_name.as_str()) {
                return Err(ScriptError::ContractDeployment("rejected".to_string()));
            }

            Ok(DeploymentResult {
                contract_name: bundle.contract_name.clone(),
                address: Address::with_last_byte(calls.len() as u8),
                tx_hash: None,
            })
        }
    }

    /// A bundle with an empty ABI and the given bytecode
    fn bundle(name: &str, code: &[u8]) -> ArtifactBundle {
        ArtifactBundle::new(name, JsonAbi::default(), Bytes::copy_from_slice(code))
    }

    /// A registry holding both migration contracts
    fn both_artifacts() -> InMemoryArtifactResolver {
        InMemoryArtifactResolver::new()
            .with(bundle("Receiver", &[0xaa]))
            .with(bundle("Factory", &[0xbb]))
    }

    #[tokio::test]
    async fn test_deploys_receiver_then_factory() {
        let resolver = both_artifacts();
        let deployer = RecordingDeployer::default();

        let report = DeploymentSequencer::default()
            .run(&resolver, &deployer)
            .await;

        assert_eq!(
            deployer.calls(),
            vec![bundle("Receiver", &[0xaa]), bundle("Factory", &[0xbb])]
        );
        assert!(report.is_complete());
        assert_eq!(report.deployed().count(), 2);
    }

    #[tokio::test]
    async fn test_unresolved_receiver_aborts() {
        let resolver = InMemoryArtifactResolver::new().with(bundle("Factory", &[0xbb]));
        let deployer = RecordingDeployer::default();

        let report = DeploymentSequencer::default()
            .run(&resolver, &deployer)
            .await;

        assert!(deployer.calls().is_empty());
        assert_eq!(report.failed(), vec!["Receiver"]);
        assert_eq!(report.steps().len(), 1);
        assert!(matches!(
            report.into_result(),
            Err(ScriptError::ArtifactNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unresolved_receiver_continues() {
        let resolver = InMemoryArtifactResolver::new().with(bundle("Factory", &[0xbb]));
        let deployer = RecordingDeployer::default();

        let report = DeploymentSequencer::default()
            .with_failure_policy(FailurePolicy::Continue)
            .run(&resolver, &deployer)
            .await;

        assert_eq!(deployer.calls(), vec![bundle("Factory", &[0xbb])]);
        assert_eq!(report.failed(), vec!["Receiver"]);
        assert_eq!(report.deployed().count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_deployment_keeps_earlier_results() {
        let resolver = both_artifacts();
        let deployer = RecordingDeployer::rejecting("Factory");

        let report = DeploymentSequencer::default()
            .run(&resolver, &deployer)
            .await;

        assert_eq!(deployer.calls().len(), 2);
        let deployed = report.deployed().collect::<Vec<_>>();
        assert_eq!(deployed.len(), 1);
        assert_eq!(deployed[0].contract_name, "Receiver");
        assert!(matches!(
            report.into_result(),
            Err(ScriptError::ContractDeployment(_))
        ));
    }

    #[tokio::test]
    async fn test_multiple_failures_summarized() {
        let resolver = InMemoryArtifactResolver::new();
        let deployer = RecordingDeployer::default();

        let report = DeploymentSequencer::default()
            .with_failure_policy(FailurePolicy::Continue)
            .run(&resolver, &deployer)
            .await;

        match report.into_result() {
            Err(ScriptError::MigrationIncomplete(names)) => assert_eq!(names, "Receiver, Factory"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_skips_existing_deployments() {
        let resolver = InMemoryArtifactResolver::new().with(bundle("Factory", &[0xbb]));
        let deployer = RecordingDeployer::default();
        let receiver_addr = Address::repeat_byte(0x11);
        let existing = BTreeMap::from([("Receiver".to_string(), receiver_addr)]);

        let report = DeploymentSequencer::default()
            .with_existing_deployments(existing)
            .run(&resolver, &deployer)
            .await;

        assert_eq!(deployer.calls(), vec![bundle("Factory", &[0xbb])]);
        assert!(matches!(
            &report.steps()[0],
            (name, StepOutcome::Skipped { address })
                if name == "Receiver" && *address == receiver_addr
        ));
        assert!(report.is_complete());
    }
}
