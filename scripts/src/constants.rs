//! Constants used in the migration scripts

/// The name of the `Receiver` contract artifact
pub const RECEIVER_CONTRACT_NAME: &str = "Receiver";

/// The name of the `Factory` contract artifact
pub const FACTORY_CONTRACT_NAME: &str = "Factory";

/// The contracts deployed by a migration, in deployment order
pub const MIGRATION_CONTRACTS: [&str; 2] = [RECEIVER_CONTRACT_NAME, FACTORY_CONTRACT_NAME];

/// The default directory in which compilation artifacts are found
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default number of confirmations to wait for a deployment transaction
pub const DEFAULT_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The extension of a JSON compilation artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The extension of a Solidity source file, used in Foundry's `out/` layout
pub const SOLIDITY_EXTENSION: &str = "sol";

/// The key of the ABI in a compilation artifact
pub const ABI_KEY: &str = "abi";

/// The key of the creation bytecode in a compilation artifact
pub const BYTECODE_KEY: &str = "bytecode";

/// The key of the hex bytecode when the bytecode is given as an object
pub const BYTECODE_OBJECT_KEY: &str = "object";

/// The prefix of an unlinked library placeholder in creation bytecode
pub const LIBRARY_PLACEHOLDER_PREFIX: &str = "__";

/// The environment variable holding the deployer's private key
pub const PRIV_KEY_ENV_VAR: &str = "PKEY";

/// The environment variable holding the network RPC URL
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";
