//! Orchestration of a full prize pool deployment.
//!
//! The plan is a set of declarative target lists. Each list is ordered along
//! its dependency edges by [`schedule`] and executed one step at a time; the
//! first failure aborts the run. Everything deployed before the failure stays
//! in the registry, so the next run picks up where this one stopped.

use std::collections::HashSet;

use alloy_primitives::{Address, Bytes};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    backend::DeploymentBackend,
    constants::{
        CDAI_KEY, CDAI_SUPPLY_RATE, COMPOUND_PRIZE_POOL_PROXY_FACTORY_KEY,
        CONTROLLED_TOKEN_BUILDER_KEY, CONTROLLED_TOKEN_PROXY_FACTORY_KEY, CTOKEN_MOCK_ARTIFACT,
        DAI_KEY, DAI_NAME, DAI_SYMBOL, DRIP_STRATEGY_KEY, ERC1820_DEPLOYER_ADDRESS,
        ERC1820_DEPLOYER_FUNDING, ERC1820_REGISTRY_ADDRESS, ERC20_MINTABLE_ARTIFACT,
        MULTIPLE_WINNERS_BUILDER_KEY, MULTIPLE_WINNERS_PROXY_FACTORY_KEY,
        PERMIT_AND_DEPOSIT_DAI_KEY, POOL_WITH_MULTIPLE_WINNERS_BUILDER_KEY, REGISTRY_ARTIFACT,
        RESERVE_KEY, RESERVE_REGISTRY_KEY, RNG_SERVICE_MOCK_KEY,
        SINGLE_RANDOM_WINNER_PROXY_FACTORY_KEY, STAKE_PRIZE_POOL_PROXY_FACTORY_KEY,
        TICKET_PROXY_FACTORY_KEY, TOKEN_FAUCET_KEY,
        UNSAFE_TOKEN_LISTENER_DELEGATOR_PROXY_FACTORY_KEY, YDAI_KEY, YVAULT_MOCK_ARTIFACT,
        YVAULT_PRIZE_POOL_PROXY_FACTORY_KEY,
    },
    environment::EnvironmentContext,
    errors::{OrchestrationError, ScriptError},
    executor::execute,
    registry::DeploymentRegistry,
    types::{DeploymentManifest, DeploymentRecord, DeploymentTarget},
};

/// The name under which ERC-1820 bootstrap failures are reported
const ERC1820_REGISTRY_KEY: &str = "ERC1820Registry";

/// Options of a run that do not belong to the environment
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// The pre-signed ERC-1820 registry deployment, broadcast when the
    /// registry is missing from the network
    pub erc1820_transaction: Option<Bytes>,
}

// ------------
// | The plan |
// ------------

/// The mock infrastructure, deployed on local networks only
pub fn mock_targets() -> Vec<DeploymentTarget> {
    vec![
        DeploymentTarget::new(RNG_SERVICE_MOCK_KEY),
        DeploymentTarget::with_artifact(DAI_KEY, ERC20_MINTABLE_ARTIFACT)
            .literal(DAI_NAME)
            .literal(DAI_SYMBOL),
        DeploymentTarget::with_artifact(CDAI_KEY, CTOKEN_MOCK_ARTIFACT)
            .depends_on(DAI_KEY)
            .literal(CDAI_SUPPLY_RATE),
        DeploymentTarget::with_artifact(YDAI_KEY, YVAULT_MOCK_ARTIFACT).depends_on(DAI_KEY),
    ]
}

/// The standalone contracts deployed ahead of the reserve
pub fn core_targets() -> Vec<DeploymentTarget> {
    vec![
        DeploymentTarget::new(DRIP_STRATEGY_KEY),
        DeploymentTarget::new(TOKEN_FAUCET_KEY),
    ]
}

/// The proxy factories and builders, wired to the given reserve registry
pub fn pool_targets(reserve_registry: Address) -> Vec<DeploymentTarget> {
    vec![
        DeploymentTarget::new(PERMIT_AND_DEPOSIT_DAI_KEY),
        DeploymentTarget::new(COMPOUND_PRIZE_POOL_PROXY_FACTORY_KEY),
        DeploymentTarget::new(YVAULT_PRIZE_POOL_PROXY_FACTORY_KEY),
        DeploymentTarget::new(CONTROLLED_TOKEN_PROXY_FACTORY_KEY),
        DeploymentTarget::new(TICKET_PROXY_FACTORY_KEY),
        DeploymentTarget::new(STAKE_PRIZE_POOL_PROXY_FACTORY_KEY),
        DeploymentTarget::new(UNSAFE_TOKEN_LISTENER_DELEGATOR_PROXY_FACTORY_KEY),
        DeploymentTarget::new(MULTIPLE_WINNERS_PROXY_FACTORY_KEY),
        DeploymentTarget::new(SINGLE_RANDOM_WINNER_PROXY_FACTORY_KEY),
        DeploymentTarget::new(CONTROLLED_TOKEN_BUILDER_KEY)
            .depends_on(CONTROLLED_TOKEN_PROXY_FACTORY_KEY)
            .depends_on(TICKET_PROXY_FACTORY_KEY),
        DeploymentTarget::new(MULTIPLE_WINNERS_BUILDER_KEY)
            .depends_on(MULTIPLE_WINNERS_PROXY_FACTORY_KEY)
            .depends_on(CONTROLLED_TOKEN_BUILDER_KEY),
        DeploymentTarget::new(POOL_WITH_MULTIPLE_WINNERS_BUILDER_KEY)
            .address(reserve_registry)
            .depends_on(COMPOUND_PRIZE_POOL_PROXY_FACTORY_KEY)
            .depends_on(STAKE_PRIZE_POOL_PROXY_FACTORY_KEY)
            .depends_on(MULTIPLE_WINNERS_BUILDER_KEY),
    ]
}

// --------------
// | Scheduling |
// --------------

/// Order targets so that each comes after every target it references.
///
/// The declared order is kept wherever the dependency edges allow it.
/// References to names outside the list are left for the registry to resolve
/// at execution time.
pub fn schedule(targets: Vec<DeploymentTarget>) -> Result<Vec<DeploymentTarget>, ScriptError> {
    let mut names = HashSet::with_capacity(targets.len());
    for target in &targets {
        if !names.insert(target.logical_name.clone()) {
            return Err(ScriptError::Configuration(format!(
                "`{}` is declared more than once",
                target.logical_name
            )));
        }
    }

    let mut pending = targets;
    let mut placed = HashSet::with_capacity(pending.len());
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending.iter().position(|target| {
            target
                .dependencies()
                .all(|dep| !names.contains(dep) || placed.contains(dep))
        });

        let Some(idx) = ready else {
            return Err(ScriptError::Configuration(format!(
                "dependency cycle among {}",
                pending.iter().map(|t| t.logical_name.as_str()).join(", ")
            )));
        };

        let target = pending.remove(idx);
        placed.insert(target.logical_name.clone());
        ordered.push(target);
    }

    Ok(ordered)
}

// -------------
// | Execution |
// -------------

/// Deploy a list of targets in dependency order, adding each record to the manifest
pub async fn deploy_targets(
    targets: Vec<DeploymentTarget>,
    env: &EnvironmentContext,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
    manifest: &mut DeploymentManifest,
) -> Result<(), ScriptError> {
    for target in schedule(targets)? {
        execute_into(&target, env, registry, backend, manifest).await?;
    }

    Ok(())
}

/// Execute one target, adding its record to the manifest whenever the contract
/// is live, even if the record could not be persisted
async fn execute_into(
    target: &DeploymentTarget,
    env: &EnvironmentContext,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
    manifest: &mut DeploymentManifest,
) -> Result<DeploymentRecord, ScriptError> {
    let res = execute(target, env, registry, backend).await;
    match &res {
        Ok(record) => manifest.insert(record.clone()),
        Err(ScriptError::Unrecorded { record, .. }) => manifest.insert(record.as_ref().clone()),
        Err(_) => {}
    }

    res
}

/// Deploy the full prize pool plan.
///
/// On failure the error carries the manifest of every step completed so far.
pub async fn run(
    env: &EnvironmentContext,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
    options: &RunOptions,
) -> Result<DeploymentManifest, OrchestrationError> {
    let mut manifest = DeploymentManifest::new(env.network_id);
    match run_plan(env, registry, backend, options, &mut manifest).await {
        Ok(reserve_registry) => {
            log_manifest(&manifest, env, reserve_registry);
            Ok(manifest)
        }
        Err(error) => Err(OrchestrationError { manifest, error }),
    }
}

/// Run every phase of the plan, returning the reserve registry in use
async fn run_plan(
    env: &EnvironmentContext,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
    options: &RunOptions,
    manifest: &mut DeploymentManifest,
) -> Result<Address, ScriptError> {
    if registry.network() != env.network_id {
        return Err(ScriptError::Configuration(format!(
            "registry holds network {}, connected to {}",
            registry.network(),
            env.network_id
        )));
    }

    info!("PoolTogether Pool Contracts - Deploy Script");
    info!(
        "Deploying to network: {} ({})",
        env.network_name,
        env.locus()
    );
    info!("admin account: {:#x}", env.admin);

    ensure_erc1820(env, backend, options.erc1820_transaction.as_ref()).await?;
    info!("deployer is {:#x}", env.deployer);

    if env.is_local_network {
        deploy_targets(mock_targets(), env, registry, backend, manifest).await?;

        info!("Local contract deployments:");
        for name in [RNG_SERVICE_MOCK_KEY, DAI_KEY] {
            info!("  - {name:<18} {:#x}", registry.address(name)?);
        }
    } else if let Some(rng) = env.rng {
        info!("Using configured RNG service {rng:#x}");
    }

    if let Some(comptroller) = env.comptroller {
        info!("Using configured comptroller {comptroller:#x}");
    }

    deploy_targets(core_targets(), env, registry, backend, manifest).await?;
    let reserve_registry = resolve_reserve_registry(env, registry, backend, manifest).await?;
    deploy_targets(
        pool_targets(reserve_registry),
        env,
        registry,
        backend,
        manifest,
    )
    .await?;

    Ok(reserve_registry)
}

/// Make sure the ERC-1820 registry exists, broadcasting its pre-signed
/// deployment if it does not
async fn ensure_erc1820(
    env: &EnvironmentContext,
    backend: &impl DeploymentBackend,
    transaction: Option<&Bytes>,
) -> Result<(), ScriptError> {
    let failure = |e: ScriptError| ScriptError::DeploymentFailure {
        name: ERC1820_REGISTRY_KEY.to_string(),
        cause: e.to_string(),
    };

    let code = backend.code_at(ERC1820_REGISTRY_ADDRESS).await.map_err(failure)?;
    if !code.is_empty() {
        debug!("ERC-1820 registry present at {ERC1820_REGISTRY_ADDRESS:#x}");
        return Ok(());
    }

    let Some(transaction) = transaction else {
        warn!(
            "no ERC-1820 registry at {ERC1820_REGISTRY_ADDRESS:#x} and no deployment transaction \
             configured, contracts relying on it will not work"
        );
        return Ok(());
    };

    // The deployment is a pre-signed transaction from a one-shot account, which
    // has to hold enough ether to pay for it
    backend
        .transfer(ERC1820_DEPLOYER_ADDRESS, ERC1820_DEPLOYER_FUNDING, env.deployer)
        .await
        .map_err(failure)?;
    backend.send_raw_transaction(transaction).await.map_err(failure)?;

    info!("ERC-1820 registry deployed at {ERC1820_REGISTRY_ADDRESS:#x}");
    Ok(())
}

/// Reuse the configured reserve registry, or deploy a reserve and a registry
/// pointing at it
async fn resolve_reserve_registry(
    env: &EnvironmentContext,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
    manifest: &mut DeploymentManifest,
) -> Result<Address, ScriptError> {
    if let Some(address) = env.reserve_registry {
        info!("Using existing reserve registry {address:#x}");
        return Ok(address);
    }

    let reserve_target = DeploymentTarget::new(RESERVE_KEY);
    let reserve = execute_into(&reserve_target, env, registry, backend, manifest).await?;

    let reserve_registry_target =
        DeploymentTarget::with_artifact(RESERVE_REGISTRY_KEY, REGISTRY_ARTIFACT);
    let reserve_registry =
        execute_into(&reserve_registry_target, env, registry, backend, manifest).await?;

    let failure = |e: ScriptError| ScriptError::DeploymentFailure {
        name: RESERVE_REGISTRY_KEY.to_string(),
        cause: e.to_string(),
    };
    let current = backend
        .registry_lookup(reserve_registry.address)
        .await
        .map_err(failure)?;
    if current != reserve.address {
        info!("Registering reserve {:#x}", reserve.address);
        backend
            .registry_register(reserve_registry.address, reserve.address, env.deployer)
            .await
            .map_err(failure)?;
    }

    info!("Created new reserve registry {:#x}", reserve_registry.address);
    Ok(reserve_registry.address)
}

/// Print the deployed addresses
fn log_manifest(manifest: &DeploymentManifest, env: &EnvironmentContext, reserve_registry: Address) {
    info!("Contract deployments complete!");
    for record in manifest.records() {
        info!("  - {:<42} {:#x}", record.logical_name, record.address);
    }

    if env.reserve_registry.is_some() {
        info!("  - {:<42} {reserve_registry:#x}", RESERVE_REGISTRY_KEY);
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::{mock_targets, pool_targets, schedule};
    use crate::{errors::ScriptError, types::DeploymentTarget};

    fn names(targets: &[DeploymentTarget]) -> Vec<&str> {
        targets.iter().map(|t| t.logical_name.as_str()).collect()
    }

    #[test]
    fn test_schedule_keeps_valid_declared_order() {
        let declared = pool_targets(Address::ZERO);
        let expected: Vec<String> = declared.iter().map(|t| t.logical_name.clone()).collect();

        let ordered = schedule(declared).unwrap();
        assert_eq!(names(&ordered), expected);
    }

    #[test]
    fn test_schedule_moves_dependents_back() {
        let mut declared = mock_targets();
        declared.reverse();

        let ordered = schedule(declared).unwrap();
        assert_eq!(names(&ordered), vec!["Dai", "yDai", "cDai", "RNGServiceMock"]);
    }

    #[test]
    fn test_schedule_ignores_external_dependencies() {
        let declared = vec![DeploymentTarget::new("yDai").depends_on("Dai")];

        let ordered = schedule(declared).unwrap();
        assert_eq!(names(&ordered), vec!["yDai"]);
    }

    #[test]
    fn test_schedule_rejects_cycles() {
        let declared = vec![
            DeploymentTarget::new("a").depends_on("b"),
            DeploymentTarget::new("b").depends_on("a"),
            DeploymentTarget::new("c"),
        ];

        let res = schedule(declared);
        assert!(matches!(res, Err(ScriptError::Configuration(ref msg)) if msg.contains("a, b")));
    }

    #[test]
    fn test_schedule_rejects_duplicates() {
        let declared = vec![DeploymentTarget::new("a"), DeploymentTarget::new("a")];

        assert!(matches!(schedule(declared), Err(ScriptError::Configuration(_))));
    }

    #[test]
    fn test_every_plan_edge_points_backwards() {
        let declared = pool_targets(Address::ZERO);

        for (idx, target) in declared.iter().enumerate() {
            for dep in target.dependencies() {
                let dep_idx = declared.iter().position(|t| t.logical_name == dep).unwrap();
                assert!(dep_idx < idx, "{} declared before {dep}", target.logical_name);
            }
        }
    }
}
