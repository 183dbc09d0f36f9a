//! The deployment backend: the primitive operations a deployment run needs
//! from a chain.
//!
//! [`RpcBackend`] talks to a node through an alloy provider, [`DryRunBackend`]
//! simulates a chain in memory.

use alloy_primitives::{Address, Bytes, B256, U256};

use crate::{errors::ScriptError, types::ArgValue};

mod dry_run;
mod rpc;

pub use dry_run::{BackendCall, DryRunBackend};
pub use rpc::RpcBackend;

/// A request to deploy an artifact
#[derive(Clone, Copy, Debug)]
pub struct DeployRequest<'a> {
    /// The artifact to deploy
    pub artifact: &'a str,
    /// The resolved constructor arguments
    pub args: &'a [ArgValue],
    /// The account sending the deployment transaction
    pub sender: Address,
}

/// The outcome of a successful deployment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeployReceipt {
    /// The address of the new contract
    pub address: Address,
    /// The hash of the deployment transaction
    pub transaction_hash: B256,
}

/// The chain operations used by a deployment run.
///
/// Implementations own transaction submission, including any retries and
/// timeouts; every call is awaited before the next one is issued.
#[allow(async_fn_in_trait)]
pub trait DeploymentBackend {
    /// Deploy an artifact, returning the new contract's address
    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployReceipt, ScriptError>;

    /// Read the current pointer of a registry contract
    async fn registry_lookup(&self, registry: Address) -> Result<Address, ScriptError>;

    /// Point a registry contract at a new address
    async fn registry_register(
        &self,
        registry: Address,
        pointer: Address,
        sender: Address,
    ) -> Result<B256, ScriptError>;

    /// The code deployed at an address, empty for accounts
    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError>;

    /// Send ether
    async fn transfer(
        &self,
        to: Address,
        value: U256,
        sender: Address,
    ) -> Result<B256, ScriptError>;

    /// Broadcast a transaction that was signed elsewhere
    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, ScriptError>;
}
