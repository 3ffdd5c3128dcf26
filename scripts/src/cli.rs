//! Definitions of CLI arguments and commands for the migration scripts

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use alloy::providers::DynProvider;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    commands::{deploy, migrate},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_DEPLOY_CONFIRMATIONS,
        FACTORY_CONTRACT_NAME, PRIV_KEY_ENV_VAR, RECEIVER_CONTRACT_NAME, RPC_URL_ENV_VAR,
    },
    errors::ScriptError,
};

/// Deploy the `Receiver` and `Factory` contracts
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = PRIV_KEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = RPC_URL_ENV_VAR)]
    pub rpc_url: String,

    /// Path to the `deployments.json` file
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy `Receiver`, then `Factory`
    Migrate(MigrateArgs),
    /// Deploy a single contract
    Deploy(DeployArgs),
}

impl Command {
    /// Run the selected script
    pub async fn run(self, client: DynProvider, deployments_path: &Path) -> Result<(), ScriptError> {
        match self {
            Command::Migrate(args) => migrate(args, client, deployments_path).await,
            Command::Deploy(args) => deploy(args, client, deployments_path).await,
        }
    }
}

/// Options shared by every deploying command
#[derive(Args)]
pub struct DeployOptions {
    /// Directory containing the JSON compilation artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Number of confirmations to wait for on each deployment
    #[arg(long, default_value_t = DEFAULT_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,
}

/// Deploy `Receiver` and `Factory`, in that order.
///
/// By default the migration stops at the first failed deployment. Addresses of
/// the contracts deployed before the failure are still recorded.
#[derive(Args)]
pub struct MigrateArgs {
    /// Artifact and confirmation options
    #[command(flatten)]
    pub options: DeployOptions,

    /// Keep deploying the remaining contracts after a failure
    #[arg(long)]
    pub continue_on_error: bool,

    /// Skip contracts that already have an address in the deployments file
    #[arg(long)]
    pub skip_deployed: bool,
}

/// Deploy a single contract, overwriting any recorded address
#[derive(Args)]
pub struct DeployArgs {
    /// The contract to deploy
    #[arg(short, long)]
    pub contract: MigrationContract,

    /// Artifact and confirmation options
    #[command(flatten)]
    pub options: DeployOptions,
}

/// The contracts managed by the migration
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum MigrationContract {
    /// The `Receiver` contract
    Receiver,
    /// The `Factory` contract
    Factory,
}

impl Display for MigrationContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationContract::Receiver => write!(f, "{RECEIVER_CONTRACT_NAME}"),
            MigrationContract::Factory => write!(f, "{FACTORY_CONTRACT_NAME}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, MigrationContract};

    #[test]
    fn test_parse_migrate_defaults() {
        let cli = Cli::try_parse_from([
            "deploy-scripts",
            "-p",
            "0x01",
            "-r",
            "http://127.0.0.1:8545",
            "migrate",
        ])
        .unwrap();

        assert_eq!(cli.deployments_path.to_str(), Some("deployments.json"));
        let Command::Migrate(args) = cli.command else {
            panic!("expected migrate command");
        };
        assert_eq!(args.options.artifacts_dir.to_str(), Some("build/contracts"));
        assert_eq!(args.options.confirmations, 1);
        assert!(!args.continue_on_error);
        assert!(!args.skip_deployed);
    }

    #[test]
    fn test_parse_deploy_contract() {
        let cli = Cli::try_parse_from([
            "deploy-scripts",
            "-p",
            "0x01",
            "-r",
            "http://127.0.0.1:8545",
            "deploy",
            "--contract",
            "factory",
            "--confirmations",
            "3",
        ])
        .unwrap();

        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy command");
        };
        assert_eq!(args.contract, MigrationContract::Factory);
        assert_eq!(args.contract.to_string(), "Factory");
        assert_eq!(args.options.confirmations, 3);
    }
}
