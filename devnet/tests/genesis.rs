//! Tests for genesis and keystore generation against an emulated generator service.

mod common;

use std::sync::Arc;

use common::{FakePlatform, network_config};
use merge_devnet::{
    ConfigError, ExternalToolError, find_cause,
    genesis::{GenesisTemplates, generate_genesis},
    keystores::{PRYSM_PASSWORD, generate_keystores},
    prelaunch::PrelaunchEnvironment,
};

const MNEMONIC: &str = "test test test test test test test test test test test junk";

async fn environment(platform: Arc<FakePlatform>) -> (tempfile::TempDir, PrelaunchEnvironment) {
    let dir = tempfile::tempdir().unwrap();
    let env = PrelaunchEnvironment::start(platform, "generator:latest", dir.path()).await.unwrap();
    (dir, env)
}

#[tokio::test]
async fn test_generate_genesis_writes_every_artifact() {
    let platform = Arc::new(FakePlatform::default());
    let (_dir, env) = environment(platform.clone()).await;

    let genesis =
        generate_genesis(&env, &GenesisTemplates::default(), &network_config(), 1_700_000_000)
            .await
            .unwrap();

    for path in [
        &genesis.el.geth_genesis,
        &genesis.el.erigon_genesis,
        &genesis.el.nethermind_chainspec,
        &genesis.el.besu_genesis,
        &genesis.cl.config_yaml,
        &genesis.cl.genesis_ssz,
    ] {
        assert!(path.is_file(), "{} missing", path.display());
    }

    // One JWT secret, shared by both layers.
    let el_jwt = std::fs::read_to_string(&genesis.el.jwt_secret_path).unwrap();
    let cl_jwt = std::fs::read_to_string(&genesis.cl.jwt_secret_path).unwrap();
    assert_eq!(el_jwt, cl_jwt);
    assert_eq!(el_jwt, genesis.el.jwt_secret_hex);
    assert_eq!(el_jwt.len(), 64);

    let deposit = std::fs::read_to_string(genesis.cl.dir.join("deposit_contract.txt")).unwrap();
    assert_eq!(deposit, "0x4242424242424242424242424242424242424242");
    let config = std::fs::read_to_string(&genesis.cl.config_yaml).unwrap();
    assert!(config.contains("MIN_GENESIS_TIME: 1700000000"));

    // EL generators run before the CL genesis tool, which reads the geth genesis.
    let scripts = platform.scripts();
    let cl_index = scripts.iter().position(|s| s.starts_with("eth2-testnet-genesis")).unwrap();
    assert_eq!(cl_index, 3);
    assert!(scripts[cl_index].contains("--eth1-config /data/el-genesis/geth.json"));
}

#[tokio::test]
async fn test_genesis_tool_failure_keeps_output() {
    let platform = Arc::new(FakePlatform::failing_on("genesis_besu.py"));
    let (_dir, env) = environment(platform.clone()).await;

    let err = generate_genesis(&env, &GenesisTemplates::default(), &network_config(), 0)
        .await
        .unwrap_err();

    let cause = find_cause::<ExternalToolError>(&err).unwrap();
    assert_eq!(cause.exit_code, 1);
    assert_eq!(cause.output, "tool crashed");
    assert!(!platform.scripts().iter().any(|s| s.starts_with("eth2-testnet-genesis")));
}

#[tokio::test]
async fn test_broken_template_fails_before_running_tools() {
    let platform = Arc::new(FakePlatform::default());
    let (_dir, env) = environment(platform.clone()).await;

    let templates = GenesisTemplates {
        el_genesis_config: "chain_id: ${UNKNOWN_PLACEHOLDER}".to_string(),
        ..Default::default()
    };
    assert!(generate_genesis(&env, &templates, &network_config(), 0).await.is_err());
    assert!(platform.scripts().is_empty());
}

#[tokio::test]
async fn test_generate_keystores_per_node() {
    let platform = Arc::new(FakePlatform::default());
    let (_dir, env) = environment(platform.clone()).await;

    let assignments = generate_keystores(&env, MNEMONIC, 10, 3).await.unwrap();

    let ranges: Vec<_> = assignments.iter().map(|a| a.range.clone()).collect();
    assert_eq!(ranges, vec![0..4, 4..7, 7..10]);

    for assignment in &assignments {
        assert!(assignment.teku_keys_dir.is_dir());
        let password = std::fs::read_to_string(&assignment.prysm_password_file).unwrap();
        assert_eq!(password, PRYSM_PASSWORD);
    }

    let scripts = platform.scripts();
    assert_eq!(scripts.len(), 3);
    assert!(scripts[1].contains("--source-min 4 --source-max 7"));
    assert!(scripts[1].contains("--out-loc /data/keystores/node-1"));
    assert!(scripts[1].contains(&format!("'{MNEMONIC}'")));
}

#[tokio::test]
async fn test_invalid_split_runs_no_tool() {
    let platform = Arc::new(FakePlatform::default());
    let (_dir, env) = environment(platform.clone()).await;

    let err = generate_keystores(&env, MNEMONIC, 2, 3).await.unwrap_err();
    assert_eq!(
        find_cause::<ConfigError>(&err),
        Some(&ConfigError::TooManyNodes { nodes: 3, keys: 2 })
    );

    let err = generate_keystores(&env, MNEMONIC, 64, 0).await.unwrap_err();
    assert_eq!(find_cause::<ConfigError>(&err), Some(&ConfigError::NoNodes));

    assert!(platform.scripts().is_empty());
}
