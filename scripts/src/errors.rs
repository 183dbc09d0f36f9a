//! Definitions of errors that can occur during the execution of the deploy scripts

use alloy_primitives::Address;

use crate::types::{DeploymentManifest, DeploymentRecord};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// A required identity or configuration value is missing or malformed
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A constructor argument references a logical name that has no deployment yet
    #[error("`{name}` depends on `{dependency}`, which has not been deployed")]
    UnresolvedDependency {
        /// The target being deployed
        name: String,
        /// The logical name it references
        dependency: String,
    },
    /// No deployment is recorded for the given logical name
    #[error("no deployment recorded for `{0}`")]
    NotFound(String),
    /// The registry already holds a different record for the given logical name
    #[error("`{name}` is already deployed at {existing:#x}, refusing to record {attempted:#x}")]
    Conflict {
        /// The logical name
        name: String,
        /// The address already on record
        existing: Address,
        /// The address that was about to be recorded
        attempted: Address,
    },
    /// The deployment backend rejected or reverted a deployment
    #[error("error deploying `{name}`: {cause}")]
    DeploymentFailure {
        /// The logical name being deployed
        name: String,
        /// The backend's description of the failure
        cause: String,
    },
    /// A contract was deployed, but its record could not be written to the
    /// deployments file
    #[error(
        "`{}` deployed at {:#x} but not recorded: {cause}",
        .record.logical_name,
        .record.address
    )]
    Unrecorded {
        /// The record of the live deployment
        record: Box<DeploymentRecord>,
        /// Why the record was not written
        cause: String,
    },
    /// Error reading the deployments file
    #[error("error reading deployments: {0}")]
    ReadDeployments(String),
    /// Error writing the deployments file
    #[error("error writing deployments: {0}")]
    WriteDeployments(String),
    /// Error reading or parsing a compiled contract artifact
    #[error("error parsing artifact: {0}")]
    ArtifactParsing(String),
    /// Error constructing calldata for a deployment or contract call
    #[error("error constructing calldata: {0}")]
    CalldataConstruction(String),
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// Error sending a transaction or calling a contract
    #[error("error interacting with contract: {0}")]
    ContractInteraction(String),
}

/// An aborted orchestration run.
///
/// Deployments are never rolled back, so the manifest holds every step that
/// completed before the failure; the next run resumes from there.
#[derive(Debug, thiserror::Error)]
#[error("deployment aborted after {} completed step(s): {error}", .manifest.len())]
pub struct OrchestrationError {
    /// The steps that completed before the failure
    pub manifest: DeploymentManifest,
    /// The failure that aborted the run
    #[source]
    pub error: ScriptError,
}
