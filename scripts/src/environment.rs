//! Resolution of the network and identities a deployment run targets

use alloy_primitives::Address;
use tracing::info;

use crate::{
    constants::{
        COVERAGE_CHAIN_ID, NETWORK_NAMES, REMOTE_CHAIN_IDS, UNIT_TEST_CHAIN_ID,
        UNKNOWN_NETWORK_NAME,
    },
    errors::ScriptError,
};

/// Accounts and addresses supplied by configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamedAccounts {
    /// The account sending every deployment transaction
    pub deployer: Option<Address>,
    /// The account administering the deployed contracts
    pub admin: Option<Address>,
    /// An existing randomness oracle
    pub rng: Option<Address>,
    /// An existing comptroller
    pub comptroller: Option<Address>,
    /// An existing reserve registry, reused instead of deploying a new one
    pub reserve_registry: Option<Address>,
}

/// The environment of one orchestration run, computed once and never mutated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentContext {
    /// The chain id
    pub network_id: u64,
    /// The human-readable network name
    pub network_name: &'static str,
    /// Whether mock infrastructure is deployed alongside the pools
    pub is_local_network: bool,
    /// Whether the network is a unit test or coverage node
    pub is_test_environment: bool,
    /// Whether harness artifacts replace their production counterparts
    pub harness_enabled: bool,
    /// The account sending every deployment transaction
    pub deployer: Address,
    /// The account administering the deployed contracts
    pub admin: Address,
    /// An existing randomness oracle
    pub rng: Option<Address>,
    /// An existing comptroller
    pub comptroller: Option<Address>,
    /// An existing reserve registry
    pub reserve_registry: Option<Address>,
}

impl EnvironmentContext {
    /// "local" or "remote", for progress output
    pub fn locus(&self) -> &'static str {
        if self.is_local_network {
            "local"
        } else {
            "remote"
        }
    }
}

/// The human-readable name of a chain id
pub fn network_name(chain_id: u64) -> &'static str {
    NETWORK_NAMES
        .iter()
        .find_map(|(id, name)| (*id == chain_id).then_some(*name))
        .unwrap_or(UNKNOWN_NETWORK_NAME)
}

/// Resolve the environment of a run from the chain id and the configured accounts
pub fn resolve(
    chain_id: u64,
    accounts: &NamedAccounts,
    harness_disabled: bool,
) -> Result<EnvironmentContext, ScriptError> {
    let deployer = accounts.deployer.ok_or_else(|| {
        ScriptError::Configuration("no deployer account is configured".to_string())
    })?;

    let admin = match accounts.admin {
        Some(admin) => admin,
        None => {
            info!("Using deployer as admin account");
            deployer
        }
    };

    let is_test_environment = chain_id == UNIT_TEST_CHAIN_ID || chain_id == COVERAGE_CHAIN_ID;

    Ok(EnvironmentContext {
        network_id: chain_id,
        network_name: network_name(chain_id),
        is_local_network: !REMOTE_CHAIN_IDS.contains(&chain_id),
        is_test_environment,
        harness_enabled: is_test_environment && !harness_disabled,
        deployer,
        admin,
        rng: accounts.rng,
        comptroller: accounts.comptroller,
        reserve_registry: accounts.reserve_registry,
    })
}
