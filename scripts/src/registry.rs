//! The dependency registry: which address each logical name is deployed at.
//!
//! Records are kept per network in a JSON deployments file of the form
//! `{ "<chain id>": { "<logical name>": <record> } }`. A record is written once
//! and never changed, so re-running a deployment against the same file only
//! deploys what is missing.

use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use alloy_primitives::Address;
use indexmap::IndexMap;

use crate::{
    errors::ScriptError,
    types::{DeploymentManifest, DeploymentRecord},
};

/// The contents of a deployments file, keyed by chain id then logical name
type DeploymentsFile = BTreeMap<String, IndexMap<String, DeploymentRecord>>;

/// The deployments of one network
#[derive(Debug)]
pub struct DeploymentRegistry {
    /// The chain id the registry is scoped to
    network: u64,
    /// The records, in the order they were deployed
    records: IndexMap<String, DeploymentRecord>,
    /// The file written after every new record, if any
    store: Option<PathBuf>,
}

impl DeploymentRegistry {
    /// A registry that lives only for the current process
    pub fn in_memory(network: u64) -> Self {
        Self {
            network,
            records: IndexMap::new(),
            store: None,
        }
    }

    /// Load the network's records from a deployments file, persisting every new
    /// record back to it. A missing file is created on the first write.
    pub fn open(path: &Path, network: u64) -> Result<Self, ScriptError> {
        let records = read_network(path, network)?;
        Ok(Self {
            network,
            records,
            store: Some(path.to_path_buf()),
        })
    }

    /// Load the network's records from a deployments file without ever writing to it
    pub fn snapshot(path: &Path, network: u64) -> Result<Self, ScriptError> {
        let records = read_network(path, network)?;
        Ok(Self {
            network,
            records,
            store: None,
        })
    }

    /// The chain id the registry is scoped to
    pub fn network(&self) -> u64 {
        self.network
    }

    /// Whether the logical name is deployed
    pub fn has(&self, logical_name: &str) -> bool {
        self.records.contains_key(logical_name)
    }

    /// The record of a logical name
    pub fn get(&self, logical_name: &str) -> Result<&DeploymentRecord, ScriptError> {
        self.records
            .get(logical_name)
            .ok_or_else(|| ScriptError::NotFound(logical_name.to_string()))
    }

    /// The address of a logical name
    pub fn address(&self, logical_name: &str) -> Result<Address, ScriptError> {
        self.get(logical_name).map(|record| record.address)
    }

    /// The records, in the order they were deployed
    pub fn records(&self) -> impl Iterator<Item = &DeploymentRecord> {
        self.records.values()
    }

    /// Record a deployment.
    ///
    /// Recording the exact record already held is a no-op. Any other record for a
    /// name that is already held is a conflict, and records from another network
    /// are rejected.
    pub fn put(&mut self, record: DeploymentRecord) -> Result<(), ScriptError> {
        if record.network != self.network {
            return Err(ScriptError::Configuration(format!(
                "record for `{}` targets network {}, registry is scoped to {}",
                record.logical_name, record.network, self.network
            )));
        }

        if let Some(existing) = self.records.get(&record.logical_name) {
            if *existing == record {
                return Ok(());
            }

            return Err(ScriptError::Conflict {
                name: record.logical_name,
                existing: existing.address,
                attempted: record.address,
            });
        }

        self.records.insert(record.logical_name.clone(), record);
        if let Err(e) = self.persist() {
            // The new record is last, keep memory in step with the file
            self.records.pop();
            return Err(e);
        }

        Ok(())
    }

    /// The registry's records as a manifest
    pub fn to_manifest(&self) -> DeploymentManifest {
        let mut manifest = DeploymentManifest::new(self.network);
        self.records().cloned().for_each(|r| manifest.insert(r));
        manifest
    }

    /// Write the network's records back to the deployments file, leaving the
    /// other networks' entries as they are
    fn persist(&self) -> Result<(), ScriptError> {
        let Some(path) = &self.store else {
            return Ok(());
        };

        let mut file = read_file(path)?;
        file.insert(self.network.to_string(), self.records.clone());

        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }
}

/// Read the recorded deployments of one network as a manifest
pub fn manifest_for(path: &Path, network: u64) -> Result<DeploymentManifest, ScriptError> {
    DeploymentRegistry::snapshot(path, network).map(|registry| registry.to_manifest())
}

/// Read the records of one network, empty if the file or network is absent
fn read_network(
    path: &Path,
    network: u64,
) -> Result<IndexMap<String, DeploymentRecord>, ScriptError> {
    let mut file = read_file(path)?;
    let records = file.remove(&network.to_string()).unwrap_or_default();

    // Keys and record contents must agree, otherwise the file was edited by hand
    for (key, record) in &records {
        if *key != record.logical_name || record.network != network {
            return Err(ScriptError::ReadDeployments(format!(
                "entry `{key}` of network {network} does not match its record"
            )));
        }
    }

    Ok(records)
}

/// Read a deployments file, empty if it does not exist
fn read_file(path: &Path) -> Result<DeploymentsFile, ScriptError> {
    if !path.exists() {
        return Ok(DeploymentsFile::new());
    }

    let contents =
        fs::read_to_string(path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}
