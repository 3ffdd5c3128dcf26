//! Utilities for reading and writing deployed addresses in the `deployments.json` file

use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use alloy::primitives::Address;
use serde_json::{Map, Value};

use crate::{
    constants::DEPLOYMENTS_KEY,
    errors::ScriptError,
    sequencer::{MigrationReport, StepOutcome},
};

/// Parse the deployments file, returning an empty object if it does not exist
fn read_json(path: &Path) -> Result<Value, ScriptError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents =
        fs::read_to_string(path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Check that addresses can be recorded in the deployments file.
///
/// Only the structure the writer relies on is validated: the root must be an
/// object and the `deployments` entry, if present, must be an object. Entries
/// for other contracts are not parsed.
pub fn check_deployments_file(path: &Path) -> Result<(), ScriptError> {
    let json = read_json(path)?;
    let root = json.as_object().ok_or_else(|| {
        ScriptError::ReadDeployments("deployments file is not a JSON object".to_string())
    })?;

    match root.get(DEPLOYMENTS_KEY) {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ScriptError::ReadDeployments(format!(
            "`{DEPLOYMENTS_KEY}` is not an object"
        ))),
    }
}

/// Read every recorded address from the deployments file.
///
/// A missing file is treated as containing no deployments.
pub fn read_deployments(path: &Path) -> Result<BTreeMap<String, Address>, ScriptError> {
    let json = read_json(path)?;
    let Some(entries) = json.get(DEPLOYMENTS_KEY) else {
        return Ok(BTreeMap::new());
    };

    let entries = entries.as_object().ok_or_else(|| {
        ScriptError::ReadDeployments(format!("`{DEPLOYMENTS_KEY}` is not an object"))
    })?;

    entries
        .iter()
        .map(|(name, value)| {
            let addr_str = value.as_str().ok_or_else(|| {
                ScriptError::ReadDeployments(format!("address for {name} is not a string"))
            })?;
            let address = Address::from_str(addr_str)
                .map_err(|e| ScriptError::ReadDeployments(format!("{name}: {e}")))?;
            Ok((name.clone(), address))
        })
        .collect()
}

/// Read the address recorded for `contract_name`
pub fn read_deployment(path: &Path, contract_name: &str) -> Result<Address, ScriptError> {
    if !path.exists() {
        return Err(ScriptError::ReadDeployments(format!(
            "no deployments file at {}",
            path.display()
        )));
    }

    read_deployments(path)?
        .remove(contract_name)
        .ok_or_else(|| {
            ScriptError::ReadDeployments(format!("no address recorded for {contract_name}"))
        })
}

/// Record the deployed address of `contract_name`, preserving all other entries
pub fn write_deployed_address(
    path: &Path,
    contract_name: &str,
    address: Address,
) -> Result<(), ScriptError> {
    let mut json = read_json(path)?;
    let root = json.as_object_mut().ok_or_else(|| {
        ScriptError::WriteDeployments("deployments file is not a JSON object".to_string())
    })?;

    let deployments = root
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ScriptError::WriteDeployments(format!("`{DEPLOYMENTS_KEY}` is not an object"))
        })?;
    deployments.insert(
        contract_name.to_string(),
        Value::String(format!("{address:#x}")),
    );

    let contents = serde_json::to_string_pretty(&json)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}

/// Record the address of every contract deployed in a migration
pub fn record_report(path: &Path, report: &MigrationReport) -> Result<(), ScriptError> {
    for (contract_name, outcome) in report.steps() {
        if let StepOutcome::Deployed(result) = outcome {
            write_deployed_address(path, contract_name, result.address)?;
        }
    }

    Ok(())
}
