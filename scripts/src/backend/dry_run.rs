//! A backend that simulates deployments in memory, for rehearsing a run
//! without touching a node

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use tracing::debug;

use super::{DeployReceipt, DeployRequest, DeploymentBackend};
use crate::{
    constants::{RESERVE_KEY, RESERVE_REGISTRY_KEY},
    errors::ScriptError,
    registry::DeploymentRegistry,
    types::ArgValue,
};

/// A call made against the [`DryRunBackend`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    /// An artifact was deployed
    Deploy {
        /// The deployed artifact
        artifact: String,
        /// The constructor arguments
        args: Vec<ArgValue>,
        /// The address it was deployed at
        address: Address,
    },
    /// A registry was pointed at a new address
    Register {
        /// The registry contract
        registry: Address,
        /// The new pointer
        pointer: Address,
    },
    /// Ether was sent
    Transfer {
        /// The recipient
        to: Address,
        /// The amount in wei
        value: U256,
    },
    /// A pre-signed transaction was broadcast
    RawTransaction(Bytes),
}

/// The simulated chain state
#[derive(Debug, Default)]
struct DryRunState {
    /// The next nonce of each sender
    nonces: HashMap<Address, u64>,
    /// The addresses holding code
    code: HashSet<Address>,
    /// The current pointer of each registry contract
    pointers: HashMap<Address, Address>,
    /// Every call made, in order
    calls: Vec<BackendCall>,
}

impl DryRunState {
    /// Consume the sender's next nonce
    fn next_nonce(&mut self, sender: Address) -> u64 {
        let nonce = self.nonces.entry(sender).or_default();
        let current = *nonce;
        *nonce += 1;
        current
    }
}

/// A backend that computes deployment addresses the way the chain would,
/// without sending anything
#[derive(Debug, Default)]
pub struct DryRunBackend {
    /// The simulated chain state
    state: Mutex<DryRunState>,
    /// An artifact whose deployments revert
    failing_artifact: Option<String>,
}

impl DryRunBackend {
    /// A backend simulating an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend replaying the recorded deployments of a registry.
    ///
    /// Every recorded address holds code, a recorded reserve registry points at
    /// the recorded reserve, and the deployer's nonce starts past every
    /// recorded deployment it created.
    pub fn from_registry(registry: &DeploymentRegistry, deployer: Option<Address>) -> Self {
        let mut backend = registry
            .records()
            .fold(Self::new(), |backend, record| backend.with_code(record.address));

        if let (Ok(reserve_registry), Ok(reserve)) =
            (registry.address(RESERVE_REGISTRY_KEY), registry.address(RESERVE_KEY))
        {
            backend = backend.with_pointer(reserve_registry, reserve);
        }

        if let Some(deployer) = deployer {
            backend = backend.with_nonce(deployer, replayed_nonce(registry, deployer));
        }
        backend
    }

    /// Start the sender's nonce at the given value
    pub fn with_nonce(self, sender: Address, nonce: u64) -> Self {
        self.lock().nonces.insert(sender, nonce);
        self
    }

    /// Make every deployment of the given artifact revert, to rehearse an aborted run
    pub fn failing_on(mut self, artifact: &str) -> Self {
        self.failing_artifact = Some(artifact.to_string());
        self
    }

    /// Stop failing deployments
    pub fn recover(&mut self) {
        self.failing_artifact = None;
    }

    /// Simulate code already deployed at an address
    pub fn with_code(self, address: Address) -> Self {
        self.lock().code.insert(address);
        self
    }

    /// Simulate a registry contract already pointing at an address
    pub fn with_pointer(self, registry: Address, pointer: Address) -> Self {
        {
            let mut state = self.lock();
            state.code.insert(registry);
            state.pointers.insert(registry, pointer);
        }
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// The artifacts deployed so far, in order
    pub fn deployed_artifacts(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Deploy { artifact, .. } => Some(artifact.clone()),
                _ => None,
            })
            .collect()
    }

    /// The number of deployments made so far
    pub fn deploy_count(&self) -> usize {
        self.deployed_artifacts().len()
    }

    /// The number of registry registrations made so far
    pub fn register_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Register { .. }))
            .count()
    }

    /// Lock the simulated state
    fn lock(&self) -> MutexGuard<'_, DryRunState> {
        // The state is never left half-updated, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeploymentBackend for DryRunBackend {
    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployReceipt, ScriptError> {
        if self.failing_artifact.as_deref() == Some(request.artifact) {
            return Err(ScriptError::ContractInteraction(format!(
                "deployment of {} reverted",
                request.artifact
            )));
        }

        let mut state = self.lock();
        let nonce = state.next_nonce(request.sender);
        let address = request.sender.create(nonce);

        state.code.insert(address);
        state.calls.push(BackendCall::Deploy {
            artifact: request.artifact.to_string(),
            args: request.args.to_vec(),
            address,
        });
        debug!("dry run: {} would be deployed at {address:#x}", request.artifact);

        let mut preimage = request.sender.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        Ok(DeployReceipt {
            address,
            transaction_hash: keccak256(preimage),
        })
    }

    async fn registry_lookup(&self, registry: Address) -> Result<Address, ScriptError> {
        let state = self.lock();
        if !state.code.contains(&registry) {
            return Err(ScriptError::ContractInteraction(format!(
                "no contract at {registry:#x}"
            )));
        }

        Ok(state.pointers.get(&registry).copied().unwrap_or(Address::ZERO))
    }

    async fn registry_register(
        &self,
        registry: Address,
        pointer: Address,
        sender: Address,
    ) -> Result<B256, ScriptError> {
        let mut state = self.lock();
        if !state.code.contains(&registry) {
            return Err(ScriptError::ContractInteraction(format!(
                "no contract at {registry:#x}"
            )));
        }

        let nonce = state.next_nonce(sender);
        state.pointers.insert(registry, pointer);
        state.calls.push(BackendCall::Register { registry, pointer });

        let nonce_bytes = nonce.to_be_bytes();
        Ok(keccak256(
            [registry.as_slice(), pointer.as_slice(), nonce_bytes.as_slice()].concat(),
        ))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError> {
        let has_code = self.lock().code.contains(&address);
        // Any non-empty code will do, nothing executes it
        Ok(if has_code { Bytes::from_static(&[0x00]) } else { Bytes::new() })
    }

    async fn transfer(
        &self,
        to: Address,
        value: U256,
        sender: Address,
    ) -> Result<B256, ScriptError> {
        let mut state = self.lock();
        let nonce = state.next_nonce(sender);
        state.calls.push(BackendCall::Transfer { to, value });

        let nonce_bytes = nonce.to_be_bytes();
        Ok(keccak256([to.as_slice(), nonce_bytes.as_slice()].concat()))
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, ScriptError> {
        self.lock().calls.push(BackendCall::RawTransaction(raw.clone()));
        Ok(keccak256(raw))
    }
}

/// The first nonce of the deployer not yet used by a recorded deployment.
///
/// Each record took at least one transaction, and registrations or transfers
/// may sit between them, so creations are searched up to twice the record count.
fn replayed_nonce(registry: &DeploymentRegistry, deployer: Address) -> u64 {
    let recorded: HashSet<Address> = registry.records().map(|r| r.address).collect();
    let floor = recorded.len() as u64;

    (0..2 * floor + 2)
        .filter(|nonce| recorded.contains(&deployer.create(*nonce)))
        .max()
        .map_or(floor, |nonce| floor.max(nonce + 1))
}
