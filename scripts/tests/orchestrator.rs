//! End-to-end runs of the deployment plan against the in-memory backend

use alloy_primitives::{address, Address, Bytes};
use pool_scripts::{
    backend::{BackendCall, DryRunBackend},
    constants::{ERC1820_DEPLOYER_ADDRESS, ERC1820_DEPLOYER_FUNDING, ERC1820_REGISTRY_ADDRESS},
    environment::{resolve, EnvironmentContext, NamedAccounts},
    errors::ScriptError,
    orchestrator::{run, RunOptions},
    registry::DeploymentRegistry,
    types::{ArgValue, DeploymentRecord},
};
use tempfile::TempDir;

const DEPLOYER: Address = address!("dededededededededededededededededededede");

/// The number of contracts a fresh run on a local network deploys
const LOCAL_DEPLOYMENTS: usize = 20;
/// The number of contracts a fresh run on a remote network deploys
const REMOTE_DEPLOYMENTS: usize = 16;

const MOCK_NAMES: [&str; 4] = ["RNGServiceMock", "Dai", "cDai", "yDai"];

fn env_with(chain_id: u64, accounts: NamedAccounts, harness_disabled: bool) -> EnvironmentContext {
    let accounts = NamedAccounts {
        deployer: Some(DEPLOYER),
        ..accounts
    };
    resolve(chain_id, &accounts, harness_disabled).unwrap()
}

fn env(chain_id: u64) -> EnvironmentContext {
    env_with(chain_id, NamedAccounts::default(), false /* harness_disabled */)
}

fn args_of(backend: &DryRunBackend, artifact: &str) -> Vec<ArgValue> {
    backend
        .calls()
        .into_iter()
        .find_map(|call| match call {
            BackendCall::Deploy {
                artifact: deployed,
                args,
                ..
            } if deployed == artifact => Some(args),
            _ => None,
        })
        .unwrap()
}

#[tokio::test]
async fn test_fresh_unit_test_network() {
    let env = env(31337);
    let backend = DryRunBackend::new();
    let mut registry = DeploymentRegistry::in_memory(31337);

    let manifest = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(manifest.len(), LOCAL_DEPLOYMENTS);
    assert_eq!(backend.deploy_count(), LOCAL_DEPLOYMENTS);
    assert_eq!(backend.register_count(), 1);
    assert_eq!(env.admin, DEPLOYER);

    // Mocks come first, the pool builder last
    let names: Vec<&str> = manifest.records().map(|r| r.logical_name.as_str()).collect();
    assert_eq!(&names[..4], &MOCK_NAMES);
    assert_eq!(names.last(), Some(&"PoolWithMultipleWinnersBuilder"));

    for record in manifest.records() {
        assert_eq!(record.network, 31337);
        assert_eq!(registry.get(&record.logical_name).unwrap(), record);
    }

    let dai = manifest.address("Dai").unwrap();
    assert_eq!(
        args_of(&backend, "CTokenMock"),
        vec![
            ArgValue::Address(dai),
            ArgValue::Literal("8888888888888".to_string())
        ]
    );
    assert_eq!(
        args_of(&backend, "ERC20Mintable"),
        vec![
            ArgValue::Literal("DAI Test Token".to_string()),
            ArgValue::Literal("DAI".to_string())
        ]
    );

    // The registry points at the reserve
    let reserve = manifest.address("Reserve").unwrap();
    let reserve_registry = manifest.address("ReserveRegistry").unwrap();
    assert_eq!(manifest.get("ReserveRegistry").unwrap().artifact, "Registry");
    assert!(backend.calls().contains(&BackendCall::Register {
        registry: reserve_registry,
        pointer: reserve,
    }));

    assert_eq!(
        args_of(&backend, "PoolWithMultipleWinnersBuilder"),
        vec![
            ArgValue::Address(reserve_registry),
            ArgValue::Address(manifest.address("CompoundPrizePoolProxyFactory").unwrap()),
            ArgValue::Address(manifest.address("StakePrizePoolProxyFactory").unwrap()),
            ArgValue::Address(manifest.address("MultipleWinnersBuilder").unwrap()),
        ]
    );
    assert_eq!(
        args_of(&backend, "ControlledTokenBuilder"),
        vec![
            ArgValue::Address(manifest.address("ControlledTokenProxyFactory").unwrap()),
            ArgValue::Address(manifest.address("TicketProxyFactory").unwrap()),
        ]
    );
}

#[tokio::test]
async fn test_harness_artifacts_on_test_networks() {
    for chain_id in [31337, 1337] {
        let env = env(chain_id);
        let backend = DryRunBackend::new();
        let mut registry = DeploymentRegistry::in_memory(chain_id);

        let manifest = run(&env, &mut registry, &backend, &RunOptions::default())
            .await
            .unwrap();

        let harnessed: Vec<&str> = manifest
            .records()
            .filter(|r| r.artifact.contains("Harness"))
            .map(|r| r.logical_name.as_str())
            .collect();
        assert_eq!(
            harnessed,
            vec![
                "CompoundPrizePoolProxyFactory",
                "yVaultPrizePoolProxyFactory",
                "StakePrizePoolProxyFactory",
                "MultipleWinnersProxyFactory",
            ]
        );
        assert_eq!(
            manifest.get("StakePrizePoolProxyFactory").unwrap().artifact,
            "StakePrizePoolHarnessProxyFactory"
        );
    }
}

#[tokio::test]
async fn test_harness_disabled() {
    let env = env_with(31337, NamedAccounts::default(), true /* harness_disabled */);
    let backend = DryRunBackend::new();
    let mut registry = DeploymentRegistry::in_memory(31337);

    let manifest = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert!(manifest.records().all(|r| !r.artifact.contains("Harness")));
    assert_eq!(
        manifest.get("MultipleWinnersProxyFactory").unwrap().artifact,
        "MultipleWinnersProxyFactory"
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let env = env(31337);
    let backend = DryRunBackend::new();
    let mut registry = DeploymentRegistry::in_memory(31337);

    let first = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();
    let calls_after_first = backend.calls().len();

    let second = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.calls().len(), calls_after_first);
    assert_eq!(backend.deploy_count(), LOCAL_DEPLOYMENTS);
    assert_eq!(backend.register_count(), 1);
}

#[tokio::test]
async fn test_remote_network_skips_mocks() {
    let env = env(1);
    assert!(!env.is_local_network);
    assert!(!env.harness_enabled);

    let backend = DryRunBackend::new().with_code(ERC1820_REGISTRY_ADDRESS);
    let mut registry = DeploymentRegistry::in_memory(1);

    let manifest = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(manifest.len(), REMOTE_DEPLOYMENTS);
    assert_eq!(backend.deploy_count(), REMOTE_DEPLOYMENTS);
    for name in MOCK_NAMES {
        assert!(manifest.get(name).is_none());
        assert!(!registry.has(name));
    }
    assert!(manifest.records().all(|r| !r.artifact.contains("Harness")));
}

#[tokio::test]
async fn test_existing_reserve_registry_is_reused() {
    let existing = Address::repeat_byte(0x11);
    let accounts = NamedAccounts {
        reserve_registry: Some(existing),
        ..Default::default()
    };
    let env = env_with(31337, accounts, false /* harness_disabled */);
    let backend = DryRunBackend::new();
    let mut registry = DeploymentRegistry::in_memory(31337);

    let manifest = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(backend.deploy_count(), LOCAL_DEPLOYMENTS - 2);
    assert_eq!(backend.register_count(), 0);
    assert!(manifest.get("Reserve").is_none());
    assert!(manifest.get("ReserveRegistry").is_none());
    assert_eq!(
        args_of(&backend, "PoolWithMultipleWinnersBuilder")[0],
        ArgValue::Address(existing)
    );
}

#[tokio::test]
async fn test_registry_already_pointing_at_reserve() {
    let reserve = Address::repeat_byte(0x22);
    let reserve_registry = Address::repeat_byte(0x33);

    let mut registry = DeploymentRegistry::in_memory(31337);
    for (name, artifact, address) in [
        ("Reserve", "Reserve", reserve),
        ("ReserveRegistry", "Registry", reserve_registry),
    ] {
        registry
            .put(DeploymentRecord {
                logical_name: name.to_string(),
                artifact: artifact.to_string(),
                address,
                network: 31337,
                transaction_hash: None,
            })
            .unwrap();
    }
    let backend = DryRunBackend::new().with_pointer(reserve_registry, reserve);

    let manifest = run(&env(31337), &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(backend.register_count(), 0);
    assert_eq!(backend.deploy_count(), LOCAL_DEPLOYMENTS - 2);
    assert_eq!(manifest.address("ReserveRegistry"), Some(reserve_registry));
}

#[tokio::test]
async fn test_aborted_run_resumes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deployments.json");
    let env = env(31337);
    let mut backend = DryRunBackend::new().failing_on("TicketProxyFactory");

    let mut registry = DeploymentRegistry::open(&path, 31337).unwrap();
    let err = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err.error,
        ScriptError::DeploymentFailure { ref name, .. } if name == "TicketProxyFactory"
    ));
    assert!(err.manifest.get("ControlledTokenProxyFactory").is_some());
    assert!(err.manifest.get("TicketProxyFactory").is_none());
    let completed = err.manifest.len();
    assert_eq!(backend.deploy_count(), completed);

    // Everything completed before the failure survives on disk
    let mut registry = DeploymentRegistry::open(&path, 31337).unwrap();
    assert_eq!(registry.records().count(), completed);

    backend.recover();
    let manifest = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(manifest.len(), LOCAL_DEPLOYMENTS);
    assert_eq!(backend.deploy_count(), LOCAL_DEPLOYMENTS);
    for record in err.manifest.records() {
        assert_eq!(manifest.get(&record.logical_name), Some(record));
    }
}

#[tokio::test]
async fn test_erc1820_bootstrap() {
    let raw = Bytes::from_static(&[0xf9, 0x0a, 0x38]);
    let options = RunOptions {
        erc1820_transaction: Some(raw.clone()),
    };
    let backend = DryRunBackend::new();
    let mut registry = DeploymentRegistry::in_memory(31337);

    run(&env(31337), &mut registry, &backend, &options).await.unwrap();

    let calls = backend.calls();
    assert_eq!(
        calls[0],
        BackendCall::Transfer {
            to: ERC1820_DEPLOYER_ADDRESS,
            value: ERC1820_DEPLOYER_FUNDING,
        }
    );
    assert_eq!(calls[1], BackendCall::RawTransaction(raw));
}

#[tokio::test]
async fn test_erc1820_already_present() {
    let options = RunOptions {
        erc1820_transaction: Some(Bytes::from_static(&[0xf9])),
    };
    let backend = DryRunBackend::new().with_code(ERC1820_REGISTRY_ADDRESS);
    let mut registry = DeploymentRegistry::in_memory(31337);

    run(&env(31337), &mut registry, &backend, &options).await.unwrap();

    assert!(!backend.calls().iter().any(|call| matches!(
        call,
        BackendCall::Transfer { .. } | BackendCall::RawTransaction(_)
    )));
}

#[tokio::test]
async fn test_registry_for_another_network() {
    let backend = DryRunBackend::new();
    let mut registry = DeploymentRegistry::in_memory(1);

    let err = run(&env(31337), &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err.error, ScriptError::Configuration(_)));
    assert!(err.manifest.is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_unwritable_deployments_file_keeps_live_contract() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    let env = env(31337);
    let backend = DryRunBackend::new();

    let mut registry = DeploymentRegistry::open(&sub.join("deployments.json"), 31337).unwrap();
    std::fs::remove_dir(&sub).unwrap();

    let err = run(&env, &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap_err();

    let ScriptError::Unrecorded { ref record, .. } = err.error else {
        panic!("expected an unrecorded deployment, got {:?}", err.error);
    };
    assert_eq!(record.logical_name, "RNGServiceMock");
    assert_eq!(record.address, DEPLOYER.create(0));

    // The live contract is reported, the registry only holds what reached disk
    assert_eq!(backend.deploy_count(), 1);
    assert_eq!(err.manifest.len(), 1);
    assert_eq!(err.manifest.address("RNGServiceMock"), Some(DEPLOYER.create(0)));
    assert!(!registry.has("RNGServiceMock"));
}

#[tokio::test]
async fn test_dry_run_over_recorded_deployments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deployments.json");
    let env = env(31337);

    let mut registry = DeploymentRegistry::open(&path, 31337).unwrap();
    let first = run(&env, &mut registry, &DryRunBackend::new(), &RunOptions::default())
        .await
        .unwrap();

    let mut snapshot = DeploymentRegistry::snapshot(&path, 31337).unwrap();
    let backend = DryRunBackend::from_registry(&snapshot, Some(DEPLOYER));
    let rehearsal = run(&env, &mut snapshot, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(rehearsal, first);
    assert_eq!(backend.deploy_count(), 0);
    assert_eq!(backend.register_count(), 0);
}

#[tokio::test]
async fn test_dry_run_does_not_reuse_recorded_addresses() {
    let mut registry = DeploymentRegistry::in_memory(31337);
    registry
        .put(DeploymentRecord {
            logical_name: "RNGServiceMock".to_string(),
            artifact: "RNGServiceMock".to_string(),
            address: DEPLOYER.create(0),
            network: 31337,
            transaction_hash: None,
        })
        .unwrap();
    let backend = DryRunBackend::from_registry(&registry, Some(DEPLOYER));

    let manifest = run(&env(31337), &mut registry, &backend, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(backend.deploy_count(), LOCAL_DEPLOYMENTS - 1);
    let mut addresses: Vec<Address> = manifest.records().map(|r| r.address).collect();
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), LOCAL_DEPLOYMENTS);
}
