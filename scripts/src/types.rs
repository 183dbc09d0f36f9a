//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy_primitives::{Address, B256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// -----------
// | Targets |
// -----------

/// A constructor argument of a deployment target
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructorArg {
    /// A literal, coerced to the constructor's parameter type at deploy time
    Literal(String),
    /// An address known ahead of time, e.g. one supplied by configuration
    Address(Address),
    /// The address of another logical name, resolved from the registry
    Ref(String),
}

/// A constructor argument with every reference resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    /// A literal, coerced to the constructor's parameter type at deploy time
    Literal(String),
    /// A contract or account address
    Address(Address),
}

impl Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Literal(s) => write!(f, "{s}"),
            ArgValue::Address(a) => write!(f, "{a:#x}"),
        }
    }
}

/// A contract to deploy under a logical name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// The stable name of the contract role
    pub logical_name: String,
    /// The production artifact implementing the role
    pub artifact: String,
    /// The constructor arguments, in order
    pub args: Vec<ConstructorArg>,
    /// Whether an existing deployment of the logical name is reused
    pub skip_if_present: bool,
}

impl DeploymentTarget {
    /// A target whose artifact shares its logical name, with no constructor arguments
    pub fn new(logical_name: &str) -> Self {
        Self::with_artifact(logical_name, logical_name)
    }

    /// A target backed by a differently named artifact
    pub fn with_artifact(logical_name: &str, artifact: &str) -> Self {
        Self {
            logical_name: logical_name.to_string(),
            artifact: artifact.to_string(),
            args: Vec::new(),
            skip_if_present: true,
        }
    }

    /// Append a literal constructor argument
    pub fn literal(mut self, value: &str) -> Self {
        self.args.push(ConstructorArg::Literal(value.to_string()));
        self
    }

    /// Append a fixed address constructor argument
    pub fn address(mut self, address: Address) -> Self {
        self.args.push(ConstructorArg::Address(address));
        self
    }

    /// Append a constructor argument resolved from another target's address
    pub fn depends_on(mut self, logical_name: &str) -> Self {
        self.args.push(ConstructorArg::Ref(logical_name.to_string()));
        self
    }

    /// Always deploy, even when the registry already holds the logical name
    pub fn always_deploy(mut self) -> Self {
        self.skip_if_present = false;
        self
    }

    /// The logical names this target's constructor references
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|arg| match arg {
            ConstructorArg::Ref(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

// -----------
// | Records |
// -----------

/// The deployment of a logical name on one network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// The logical name
    pub logical_name: String,
    /// The artifact that was deployed
    pub artifact: String,
    /// The deployed address
    pub address: Address,
    /// The chain id of the network
    pub network: u64,
    /// The hash of the deployment transaction, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
}

/// The logical names deployed by one orchestration run, in deployment order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// The chain id of the network
    pub network: u64,
    /// The records, keyed by logical name
    pub deployments: IndexMap<String, DeploymentRecord>,
}

impl DeploymentManifest {
    /// An empty manifest for the given network
    pub fn new(network: u64) -> Self {
        Self {
            network,
            deployments: IndexMap::new(),
        }
    }

    /// Add a record, keeping the position of a logical name seen before
    pub fn insert(&mut self, record: DeploymentRecord) {
        self.deployments.insert(record.logical_name.clone(), record);
    }

    /// The record of a logical name
    pub fn get(&self, logical_name: &str) -> Option<&DeploymentRecord> {
        self.deployments.get(logical_name)
    }

    /// The address of a logical name
    pub fn address(&self, logical_name: &str) -> Option<Address> {
        self.get(logical_name).map(|record| record.address)
    }

    /// The number of records
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    /// Whether the manifest holds no records
    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    /// The records, in deployment order
    pub fn records(&self) -> impl Iterator<Item = &DeploymentRecord> {
        self.deployments.values()
    }
}
