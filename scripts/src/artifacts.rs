//! Resolution of contract names to deployable compilation artifacts

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde_json::Value;

use crate::{
    constants::{
        ABI_KEY, ARTIFACT_EXTENSION, BYTECODE_KEY, BYTECODE_OBJECT_KEY, DEFAULT_ARTIFACTS_DIR,
        LIBRARY_PLACEHOLDER_PREFIX, SOLIDITY_EXTENSION,
    },
    errors::ScriptError,
};

/// A compiled contract, ready to be deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    /// The name of the contract
    pub contract_name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

impl ArtifactBundle {
    /// Construct a bundle from its parts
    pub fn new(contract_name: impl Into<String>, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            contract_name: contract_name.into(),
            abi,
            bytecode,
        }
    }

    /// Parse a bundle from the JSON contents of a compilation artifact.
    ///
    /// Accepts both the Truffle layout (`bytecode` is a hex string) and the
    /// Foundry layout (`bytecode` is an object with an `object` hex string).
    pub fn from_json(contract_name: &str, contents: &str) -> Result<Self, ScriptError> {
        let parsed: Value = serde_json::from_str(contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{contract_name}: {e}")))?;

        let abi_value = parsed.get(ABI_KEY).cloned().ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("{contract_name}: missing `{ABI_KEY}`"))
        })?;
        let abi: JsonAbi = serde_json::from_value(abi_value)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{contract_name}: {e}")))?;

        let bytecode_hex = match parsed.get(BYTECODE_KEY) {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Object(obj)) => obj
                .get(BYTECODE_OBJECT_KEY)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ScriptError::ArtifactParsing(format!(
                        "{contract_name}: missing `{BYTECODE_KEY}.{BYTECODE_OBJECT_KEY}`"
                    ))
                })?,
            _ => {
                return Err(ScriptError::ArtifactParsing(format!(
                    "{contract_name}: missing `{BYTECODE_KEY}`"
                )))
            }
        };

        let bytecode = parse_bytecode(contract_name, bytecode_hex)?;
        Ok(Self::new(contract_name, abi, bytecode))
    }
}

/// Decode creation bytecode, rejecting bytecode that cannot be deployed as-is
fn parse_bytecode(contract_name: &str, bytecode_hex: &str) -> Result<Bytes, ScriptError> {
    if bytecode_hex.contains(LIBRARY_PLACEHOLDER_PREFIX) {
        return Err(ScriptError::ArtifactParsing(format!(
            "{contract_name}: bytecode contains unlinked library references"
        )));
    }

    let bytecode: Bytes = alloy::primitives::hex::decode(bytecode_hex)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{contract_name}: {e}")))?
        .into();

    // Interfaces and abstract contracts compile to empty bytecode
    if bytecode.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "{contract_name}: bytecode is empty"
        )));
    }

    Ok(bytecode)
}

/// A source of compiled contracts, looked up by contract name
pub trait ArtifactResolver {
    /// Resolve the artifact registered under `name`
    fn resolve(&self, name: &str) -> Result<ArtifactBundle, ScriptError>;
}

impl<R: ArtifactResolver + ?Sized> ArtifactResolver for &R {
    fn resolve(&self, name: &str) -> Result<ArtifactBundle, ScriptError> {
        (**self).resolve(name)
    }
}

/// Resolves artifacts from a directory of JSON compilation outputs
#[derive(Debug, Clone)]
pub struct FileArtifactResolver {
    /// The directory holding the artifacts
    artifacts_dir: PathBuf,
}

impl Default for FileArtifactResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACTS_DIR)
    }
}

impl FileArtifactResolver {
    /// Create a resolver reading from `artifacts_dir`
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
        }
    }

    /// The directory this resolver reads from
    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// The candidate artifact paths for a contract, in lookup order
    fn candidate_paths(&self, name: &str) -> [PathBuf; 2] {
        let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
        [
            // build/contracts/<Name>.json
            self.artifacts_dir.join(&file_name),
            // out/<Name>.sol/<Name>.json
            self.artifacts_dir
                .join(format!("{name}.{SOLIDITY_EXTENSION}"))
                .join(&file_name),
        ]
    }
}

impl ArtifactResolver for FileArtifactResolver {
    fn resolve(&self, name: &str) -> Result<ArtifactBundle, ScriptError> {
        let path = self
            .candidate_paths(name)
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| {
                ScriptError::ArtifactNotFound(format!(
                    "{name} (searched {})",
                    self.artifacts_dir.display()
                ))
            })?;

        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

        ArtifactBundle::from_json(name, &contents)
    }
}

/// Resolves artifacts from an in-memory registry
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactResolver {
    /// The registered artifacts, keyed by contract name
    artifacts: HashMap<String, ArtifactBundle>,
}

impl InMemoryArtifactResolver {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact under its contract name
    pub fn insert(&mut self, bundle: ArtifactBundle) {
        self.artifacts.insert(bundle.contract_name.clone(), bundle);
    }

    /// Register an artifact, builder style
    pub fn with(mut self, bundle: ArtifactBundle) -> Self {
        self.insert(bundle);
        self
    }
}

impl ArtifactResolver for InMemoryArtifactResolver {
    fn resolve(&self, name: &str) -> Result<ArtifactBundle, ScriptError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::ArtifactNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use alloy::primitives::Bytes;
    use tempfile::tempdir;

    use crate::errors::ScriptError;

    use super::{ArtifactResolver, FileArtifactResolver, InMemoryArtifactResolver};

    /// A minimal ABI with a single function
    const RECEIVER_ABI: &str = r#"[{"type":"function","name":"receive","inputs":[],"outputs":[],"stateMutability":"payable"}]"#;

    /// A Truffle-style `Receiver` artifact with the given bytecode
    fn truffle_artifact(bytecode: &str) -> String {
        format!(r#"{{"contractName":"Receiver","abi":{RECEIVER_ABI},"bytecode":"{bytecode}"}}"#)
    }

    #[test]
    fn test_resolve_truffle_layout() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Receiver.json"), truffle_artifact("0x6080604052")).unwrap();

        let bundle = FileArtifactResolver::new(dir.path())
            .resolve("Receiver")
            .unwrap();

        assert_eq!(bundle.contract_name, "Receiver");
        assert_eq!(bundle.bytecode, Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]));
        assert_eq!(bundle.abi.functions().count(), 1);
    }

    #[test]
    fn test_resolve_foundry_layout() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("Factory.sol");
        fs::create_dir(&nested).unwrap();
        fs::write(
            nested.join("Factory.json"),
            r#"{"abi":[],"bytecode":{"object":"0x60806040","linkReferences":{}}}"#,
        )
        .unwrap();

        let bundle = FileArtifactResolver::new(dir.path())
            .resolve("Factory")
            .unwrap();

        assert_eq!(bundle.contract_name, "Factory");
        assert_eq!(bundle.bytecode.len(), 4);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempdir().unwrap();
        let res = FileArtifactResolver::new(dir.path()).resolve("Receiver");
        assert!(matches!(res, Err(ScriptError::ArtifactNotFound(_))));
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Receiver.json"), truffle_artifact("0x")).unwrap();

        let res = FileArtifactResolver::new(dir.path()).resolve("Receiver");
        assert!(matches!(res, Err(ScriptError::ArtifactParsing(_))));
    }

    #[test]
    fn test_unlinked_library_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("Receiver.json"),
            truffle_artifact("0x6080__$4f2c1e0b8a$__6040"),
        )
        .unwrap();

        let err = FileArtifactResolver::new(dir.path())
            .resolve("Receiver")
            .unwrap_err();
        assert!(err.to_string().contains("unlinked library"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Receiver.json"), "{ not json").unwrap();

        let res = FileArtifactResolver::new(dir.path()).resolve("Receiver");
        assert!(matches!(res, Err(ScriptError::ArtifactParsing(_))));
    }

    #[test]
    fn test_in_memory_missing_name() {
        let resolver = InMemoryArtifactResolver::new();
        assert!(matches!(
            resolver.resolve("Factory"),
            Err(ScriptError::ArtifactNotFound(name)) if name == "Factory"
        ));
    }
}
