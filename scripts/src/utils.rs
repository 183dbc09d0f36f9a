//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Bytes;

use crate::{errors::ScriptError, types::DeploymentManifest};

/// Parse the deployer's private key
pub fn parse_signer(priv_key: &str) -> Result<PrivateKeySigner, ScriptError> {
    PrivateKeySigner::from_str(priv_key.trim())
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
}

/// Read a hex-encoded raw transaction from a file
pub fn read_raw_transaction(path: &Path) -> Result<Bytes, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::Configuration(format!("{}: {e}", path.display())))?;

    let raw = Bytes::from_str(contents.trim())
        .map_err(|e| ScriptError::Configuration(format!("{}: {e}", path.display())))?;
    if raw.is_empty() {
        return Err(ScriptError::Configuration(format!(
            "{} holds no transaction",
            path.display()
        )));
    }

    Ok(raw)
}

/// Serialize a manifest as pretty-printed JSON
pub fn manifest_json(manifest: &DeploymentManifest) -> Result<String, ScriptError> {
    serde_json::to_string_pretty(manifest)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}

/// Write a manifest to a file as pretty-printed JSON
pub fn write_manifest(manifest: &DeploymentManifest, path: &Path) -> Result<(), ScriptError> {
    fs::write(path, manifest_json(manifest)?)
        .map_err(|e| ScriptError::WriteDeployments(format!("{}: {e}", path.display())))
}
