//! End-to-end devnet builds on the emulated platform.

mod common;

use std::sync::Arc;

use common::{FakeClLauncher, FakeElLauncher, FakePlatform, cl_launchers, el_launchers};
use merge_devnet::{
    ConfigError, NetworkSummary, TestnetBuilder,
    client::{ClClientType, ElClientType},
    config::{ParticipantSpec, TestnetParams},
    find_cause,
};

fn params() -> TestnetParams {
    let mut params = TestnetParams {
        participants: vec![
            ParticipantSpec::new(ElClientType::Geth, ClClientType::Lighthouse),
            ParticipantSpec::new(ElClientType::Erigon, ClClientType::Teku),
        ],
        ..Default::default()
    };
    params.network.num_validator_keys_per_node = 32;
    params
}

#[tokio::test]
async fn test_build_launches_participants_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let platform = Arc::new(FakePlatform::default());
    let geth = FakeElLauncher::new(ElClientType::Geth);
    let erigon = FakeElLauncher::new(ElClientType::Erigon);
    let lighthouse = FakeClLauncher::new(ClClientType::Lighthouse);
    let teku = FakeClLauncher::new(ClClientType::Teku);

    let testnet = TestnetBuilder::new(params(), dir.path())
        .with_platform(platform.clone())
        .with_launchers(
            el_launchers(&[geth.clone(), erigon.clone()]),
            cl_launchers(&[lighthouse.clone(), teku.clone()]),
        )
        .build()
        .await
        .unwrap();

    let participants = testnet.network().participants().await;
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[1].el_client_type, ElClientType::Erigon);
    assert_eq!(erigon.records()[0].bootstrap.as_deref(), Some(participants[0].el.enode.as_str()));
    assert_eq!(teku.key_ranges(), vec![32..64]);

    // Only the generator service ran on the platform; the fakes launched the clients.
    assert_eq!(platform.launched().len(), 1);

    let path = testnet.write_summary().await.unwrap();
    let summary = NetworkSummary::read_from_file(&path).unwrap();
    assert_eq!(summary, testnet.summary().await);
    assert_eq!(summary.participants[1].cl.enr, "enr:-node1");
}

#[tokio::test]
async fn test_single_participant_takes_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let geth = FakeElLauncher::new(ElClientType::Geth);
    let lighthouse = FakeClLauncher::new(ClClientType::Lighthouse);

    let params = TestnetParams::default();
    assert_eq!(params.participants.len(), 1);
    assert_eq!(params.network.num_validator_keys_per_node, 64);

    let testnet = TestnetBuilder::new(params, dir.path())
        .with_platform(Arc::new(FakePlatform::default()))
        .with_launchers(el_launchers(&[geth.clone()]), cl_launchers(&[lighthouse.clone()]))
        .build()
        .await
        .unwrap();

    assert_eq!(lighthouse.key_ranges(), vec![0..64]);

    let el = geth.records();
    let cl = lighthouse.records();
    assert_eq!((el.len(), cl.len()), (1, 1));
    assert_eq!((el[0].ordinal, cl[0].ordinal), (0, 0));
    assert_eq!(el[0].bootstrap, None);
    assert_eq!(cl[0].bootstrap, None);

    let participants = testnet.network().participants().await;
    assert_eq!(participants.len(), 1);
    assert!(participants[0].is_bootstrap());
}

#[tokio::test]
async fn test_invalid_params_start_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let platform = Arc::new(FakePlatform::default());

    let mut params = params();
    params.network.num_validator_keys_per_node = 16;

    let err = TestnetBuilder::new(params, dir.path())
        .with_platform(platform.clone())
        .build()
        .await
        .unwrap_err();

    assert_eq!(
        find_cause::<ConfigError>(&err),
        Some(&ConfigError::InsufficientValidatorKeys { total: 32, required: 64 })
    );
    assert!(platform.launched().is_empty());
}
