//! Definitions of errors that can occur during the execution of the migration scripts

use thiserror::Error;

/// Errors that can occur during the execution of the migration scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Error reading the `deployments.json` file
    #[error("error reading deployments: {0}")]
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    #[error("error writing deployments: {0}")]
    WriteDeployments(String),
    /// No compilation artifact is registered under the given contract name
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
    /// Error parsing a Solidity compilation artifact
    #[error("error parsing artifact: {0}")]
    ArtifactParsing(String),
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// Error deploying a contract
    #[error("error deploying contract: {0}")]
    ContractDeployment(String),
    /// One or more steps of a migration failed
    #[error("migration incomplete, failed steps: {0}")]
    MigrationIncomplete(String),
}
