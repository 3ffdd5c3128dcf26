//! Implementations of the migration scripts

use std::path::Path;

use alloy::{primitives::Address, providers::DynProvider};
use tracing::{error, info, warn};

use crate::{
    artifacts::{ArtifactResolver, FileArtifactResolver},
    cli::{DeployArgs, DeployOptions, MigrateArgs},
    deployer::{Deployer, RpcDeployer},
    deployments::{check_deployments_file, read_deployments, record_report},
    errors::ScriptError,
    sequencer::{DeploymentSequencer, FailurePolicy, MigrationReport},
};

/// Run `sequencer` and record every deployed address in the deployments file.
///
/// The deployments file is checked before anything is deployed. Addresses
/// are recorded even when a step fails, so that a partially applied migration
/// can be resumed with `--skip-deployed`. If a step failed, its error is
/// returned even when recording fails as well.
pub async fn run_migration<R, D>(
    sequencer: &DeploymentSequencer,
    resolver: &R,
    deployer: &D,
    deployments_path: &Path,
) -> Result<MigrationReport, ScriptError>
where
    R: ArtifactResolver + ?Sized,
    D: Deployer + ?Sized,
{
    check_deployments_file(deployments_path)?;

    let report = sequencer.run(resolver, deployer).await;
    let recorded = record_report(deployments_path, &report);

    for result in report.deployed() {
        if recorded.is_ok() {
            info!("{} deployed at {:#x}", result.contract_name, result.address);
        } else {
            error!(
                "{} deployed at {:#x} but not recorded",
                result.contract_name, result.address
            );
        }
    }

    match (report.into_result(), recorded) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(write_err)) => Err(write_err),
        (Err(step_err), Err(write_err)) => {
            error!("Failed to record deployments: {write_err}");
            Err(step_err)
        }
    }
}

/// Look up the address recorded for `contract_name`.
///
/// A deployments file that cannot be read is logged and treated as holding no
/// address.
fn recorded_address(deployments_path: &Path, contract_name: &str) -> Option<Address> {
    match read_deployments(deployments_path) {
        Ok(mut deployments) => deployments.remove(contract_name),
        Err(e) => {
            warn!("Could not check for a recorded address of `{contract_name}`: {e}");
            None
        }
    }
}

/// Build the resolver and deployer described by `options`
fn setup_deployment(
    options: &DeployOptions,
    client: DynProvider,
) -> (FileArtifactResolver, RpcDeployer<DynProvider>) {
    let resolver = FileArtifactResolver::new(&options.artifacts_dir);
    let deployer = RpcDeployer::new(client).with_confirmations(options.confirmations);
    (resolver, deployer)
}

/// Deploy `Receiver` and `Factory`, recording their addresses
pub async fn migrate(
    args: MigrateArgs,
    client: DynProvider,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let (resolver, deployer) = setup_deployment(&args.options, client);

    let failure_policy = if args.continue_on_error {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };
    let mut sequencer = DeploymentSequencer::default().with_failure_policy(failure_policy);
    if args.skip_deployed {
        sequencer = sequencer.with_existing_deployments(read_deployments(deployments_path)?);
    }

    run_migration(&sequencer, &resolver, &deployer, deployments_path).await?;
    Ok(())
}

/// Deploy a single contract, overwriting its recorded address
pub async fn deploy(
    args: DeployArgs,
    client: DynProvider,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let contract_name = args.contract.to_string();
    if let Some(address) = recorded_address(deployments_path, &contract_name) {
        warn!("Overwriting recorded address {address:#x} of `{contract_name}`");
    }

    let (resolver, deployer) = setup_deployment(&args.options, client);
    let sequencer = DeploymentSequencer::new([contract_name]);

    run_migration(&sequencer, &resolver, &deployer, deployments_path).await?;
    Ok(())
}
