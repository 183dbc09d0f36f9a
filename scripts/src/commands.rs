//! Implementations of the deploy script commands

use std::path::Path;

use alloy_primitives::Address;
use tracing::{error, info, warn};

use crate::{
    backend::{DeploymentBackend, DryRunBackend, RpcBackend},
    cli::{DeployArgs, ManifestArgs},
    constants::UNIT_TEST_CHAIN_ID,
    environment::{resolve, NamedAccounts},
    errors::ScriptError,
    orchestrator::{run, RunOptions},
    registry::{manifest_for, DeploymentRegistry},
    utils::{manifest_json, parse_signer, read_raw_transaction, write_manifest},
};

/// Deploy every contract of the plan that is missing on the network
pub async fn deploy(
    args: DeployArgs,
    priv_key: Option<&str>,
    rpc_url: &str,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let signer = priv_key.map(parse_signer).transpose()?;
    let erc1820_transaction = args
        .erc1820_tx
        .as_deref()
        .map(read_raw_transaction)
        .transpose()?;
    let options = RunOptions {
        erc1820_transaction,
    };

    if args.dry_run {
        let chain_id = args.chain_id.unwrap_or(UNIT_TEST_CHAIN_ID);
        let deployer = args.deployer.or(signer.as_ref().map(|s| s.address()));
        info!("Dry run against chain {chain_id}, nothing will be sent");

        // A rehearsal reads the recorded deployments but never writes them
        let mut registry = DeploymentRegistry::snapshot(deployments_path, chain_id)?;
        let mut backend = DryRunBackend::from_registry(&registry, deployer);
        if let (Some(deployer), Some(nonce)) = (deployer, args.nonce) {
            backend = backend.with_nonce(deployer, nonce);
        }
        return deploy_with(&args, deployer, chain_id, &mut registry, &backend, &options).await;
    }

    let signer = signer.ok_or_else(|| {
        ScriptError::Configuration("a private key is required outside of a dry run".to_string())
    })?;
    let deployer = signer.address();
    if args.deployer.is_some_and(|d| d != deployer) {
        warn!("--deployer is ignored, deploying from the private key's account {deployer:#x}");
    }

    let backend = RpcBackend::connect(rpc_url, signer, args.artifacts_dir.clone())?;
    let chain_id = backend.chain_id().await?;
    if let Some(expected) = args.chain_id {
        if expected != chain_id {
            return Err(ScriptError::Configuration(format!(
                "expected chain {expected}, the node at {rpc_url} is on chain {chain_id}"
            )));
        }
    }

    let mut registry = DeploymentRegistry::open(deployments_path, chain_id)?;
    deploy_with(&args, Some(deployer), chain_id, &mut registry, &backend, &options).await
}

/// Run the deployment against the given backend, writing out the manifest
async fn deploy_with(
    args: &DeployArgs,
    deployer: Option<Address>,
    chain_id: u64,
    registry: &mut DeploymentRegistry,
    backend: &impl DeploymentBackend,
    options: &RunOptions,
) -> Result<(), ScriptError> {
    let accounts = NamedAccounts {
        deployer,
        admin: args.admin,
        rng: args.rng,
        comptroller: args.comptroller,
        reserve_registry: args.reserve_registry,
    };
    let env = resolve(chain_id, &accounts, args.disable_harness)?;

    match run(&env, registry, backend, options).await {
        Ok(manifest) => {
            if let Some(path) = &args.manifest_out {
                write_manifest(&manifest, path)?;
                info!("Manifest written to {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            for record in e.manifest.records() {
                error!("  completed: {} at {:#x}", record.logical_name, record.address);
            }

            if let Some(path) = &args.manifest_out {
                write_manifest(&e.manifest, path)?;
                warn!("Partial manifest written to {}", path.display());
            }
            Err(e.error)
        }
    }
}

/// Print the recorded deployments of a network
pub fn print_manifest(args: ManifestArgs, deployments_path: &Path) -> Result<(), ScriptError> {
    let manifest = manifest_for(deployments_path, args.chain_id)?;
    if manifest.is_empty() {
        warn!(
            "no deployments recorded for chain {} in {}",
            args.chain_id,
            deployments_path.display()
        );
    }

    match args.out {
        Some(path) => write_manifest(&manifest, &path),
        None => {
            println!("{}", manifest_json(&manifest)?);
            Ok(())
        }
    }
}
