//! Execution of a single deployment step

use tracing::{debug, info};

use crate::{
    artifacts::select,
    backend::{DeployRequest, DeploymentBackend},
    environment::EnvironmentContext,
    errors::ScriptError,
    registry::DeploymentRegistry,
    types::{ArgValue, ConstructorArg, DeploymentRecord, DeploymentTarget},
};

/// Resolve a target's constructor arguments against the registry.
///
/// A reference to a logical name without a deployment is an ordering bug in
/// the plan, never silently replaced by another address.
pub fn resolve_args(
    target: &DeploymentTarget,
    registry: &DeploymentRegistry,
) -> Result<Vec<ArgValue>, ScriptError> {
    target
        .args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Literal(literal) => Ok(ArgValue::Literal(literal.clone())),
            ConstructorArg::Address(address) => Ok(ArgValue::Address(*address)),
            ConstructorArg::Ref(dependency) => registry
                .address(dependency)
                .map(ArgValue::Address)
                .map_err(|_| ScriptError::UnresolvedDependency {
                    name: target.logical_name.clone(),
                    dependency: dependency.clone(),
                }),
        })
        .collect()
}

/// Deploy a target, or reuse its existing deployment
pub async fn execute(
    target: &DeploymentTarget,
    env: &EnvironmentContext,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
) -> Result<DeploymentRecord, ScriptError> {
    if target.skip_if_present && registry.has(&target.logical_name) {
        let existing = registry.get(&target.logical_name)?.clone();
        debug!(
            "reusing {} at {:#x}",
            existing.logical_name, existing.address
        );
        return Ok(existing);
    }

    let artifact = select(target, env);
    let args = resolve_args(target, registry)?;

    info!("Deploying {}...", target.logical_name);
    let receipt = backend
        .deploy(DeployRequest {
            artifact,
            args: &args,
            sender: env.deployer,
        })
        .await
        .map_err(|e| ScriptError::DeploymentFailure {
            name: target.logical_name.clone(),
            cause: e.to_string(),
        })?;

    let record = DeploymentRecord {
        logical_name: target.logical_name.clone(),
        artifact: artifact.to_string(),
        address: receipt.address,
        network: env.network_id,
        transaction_hash: Some(receipt.transaction_hash),
    };
    info!(
        "  {} ({artifact}) deployed at {:#x}",
        record.logical_name, record.address
    );

    match registry.put(record.clone()) {
        Ok(()) => Ok(record),
        Err(ScriptError::WriteDeployments(cause)) => Err(ScriptError::Unrecorded {
            record: Box::new(record),
            cause,
        }),
        Err(e) => Err(e),
    }
}
