//! End-to-end tests: registry resolution, the database guard and signing.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use bytes::Bytes;
use proptest::prelude::*;

use originator::core::{Keccak256Hash, NodeId, NodeInfo, SequenceId, StagedEnvelope};
use originator::registry::{Node, StaticRegistry};
use originator::store::{MemoryStore, NodeInfoStore, SqliteStore};
use originator::{
    DuplicateKeyPolicy, ErrorCategory, Registrant, RegistrantConfig, RegistrantError, SignError,
};
use originator_testkit::generators::{
    invalid_local_id, node_id, originator_time, payer_envelope as generated_payer_envelope,
    signing_seed, valid_local_id,
};
use originator_testkit::{
    fixed_time, payer_envelope, random_payload, staged_envelope, InconsistentStore, TestNetwork,
    TestNode, UnavailableRegistry, UnavailableStore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn registrant_for(node: &TestNode, registry: &StaticRegistry) -> Registrant {
    Registrant::new(
        registry,
        &MemoryStore::new(),
        &RegistrantConfig::new(node.secret_hex()),
    )
    .await
    .unwrap()
}

// ============================================================================
// Identity resolution
// ============================================================================

#[tokio::test]
async fn test_each_registered_key_resolves_to_its_own_entry() {
    init_tracing();
    let network = TestNetwork::new(&[100, 200, 300]);
    let registry = network.registry();

    for node in &network.nodes {
        let registrant = registrant_for(node, &registry).await;
        assert_eq!(registrant.node_id(), node.node_id);
        assert_eq!(registrant.public_key(), node.public_key());
        assert_eq!(registrant.record().http_address, node.registry_entry().http_address);
    }
}

#[tokio::test]
async fn test_prefixed_key_is_accepted() {
    let network = TestNetwork::new(&[100]);
    let store = MemoryStore::new();
    let config = RegistrantConfig::new(network.node(0).prefixed_secret_hex());

    let registrant = Registrant::new(&network.registry(), &store, &config)
        .await
        .unwrap();
    assert_eq!(registrant.node_id(), NodeId::new(100));
}

#[tokio::test]
async fn test_unregistered_key_fails_and_writes_nothing() {
    let network = TestNetwork::new(&[100, 200]);
    let outsider = TestNode::new(0);
    let store = MemoryStore::new();

    let result = Registrant::new(
        &network.registry(),
        &store,
        &RegistrantConfig::new(outsider.secret_hex()),
    )
    .await;

    assert!(matches!(result, Err(RegistrantError::NotRegistered)));
    assert_eq!(store.select_node_info().await.unwrap(), None);
}

#[tokio::test]
async fn test_invalid_private_key() {
    let network = TestNetwork::new(&[100]);

    for bad in ["", "not hex", "0x1234", &"ff".repeat(33)] {
        let result = Registrant::new(
            &network.registry(),
            &MemoryStore::new(),
            &RegistrantConfig::new(bad),
        )
        .await;

        match result {
            Err(err @ RegistrantError::InvalidPrivateKey(_)) => {
                assert_eq!(err.category(), ErrorCategory::Configuration);
            }
            other => panic!("expected invalid key for {:?}, got {:?}", bad, other),
        }
    }
}

#[tokio::test]
async fn test_duplicate_key_first_match_by_default() {
    let node = TestNode::new(300);
    let registry = StaticRegistry::new(vec![
        Node::new(NodeId::new(300), node.public_key()),
        Node::new(NodeId::new(100), node.public_key()),
    ]);

    let registrant = registrant_for(&node, &registry).await;
    assert_eq!(registrant.node_id(), NodeId::new(300));
}

#[tokio::test]
async fn test_duplicate_key_rejected_when_configured() {
    let node = TestNode::new(300);
    let registry = StaticRegistry::new(vec![
        Node::new(NodeId::new(300), node.public_key()),
        Node::new(NodeId::new(100), node.public_key()),
    ]);
    let store = MemoryStore::new();
    let config =
        RegistrantConfig::new(node.secret_hex()).duplicate_key_policy(DuplicateKeyPolicy::Reject);

    let result = Registrant::new(&registry, &store, &config).await;

    assert!(matches!(
        result,
        Err(RegistrantError::DuplicateRegistration(ref ids))
            if ids == &[NodeId::new(300), NodeId::new(100)]
    ));
    assert_eq!(store.select_node_info().await.unwrap(), None);
}

#[tokio::test]
async fn test_registry_unavailable() {
    let node = TestNode::new(100);
    let result = Registrant::new(
        &UnavailableRegistry,
        &MemoryStore::new(),
        &RegistrantConfig::new(node.secret_hex()),
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, RegistrantError::RegistryUnavailable(_)));
    assert_eq!(err.category(), ErrorCategory::Unavailable);
}

// ============================================================================
// Database guard
// ============================================================================

#[tokio::test]
async fn test_empty_store_gets_exactly_the_resolved_binding() {
    let network = TestNetwork::new(&[100]);
    let node = network.node(0);
    let store = MemoryStore::new();

    let registrant = Registrant::new(
        &network.registry(),
        &store,
        &RegistrantConfig::new(node.secret_hex()),
    )
    .await
    .unwrap();

    assert_eq!(store.select_node_info().await.unwrap(), Some(node.node_info().into()));
    assert_eq!(registrant.node_info(), node.node_info());
}

#[tokio::test]
async fn test_construction_is_idempotent() {
    let network = TestNetwork::new(&[100]);
    let store = MemoryStore::new();
    let config = RegistrantConfig::new(network.node(0).secret_hex());
    let registry = network.registry();

    let first = Registrant::new(&registry, &store, &config).await.unwrap();
    let second = Registrant::new(&registry, &store, &config).await.unwrap();

    assert_eq!(first.node_info(), second.node_info());
    assert_eq!(
        store.select_node_info().await.unwrap(),
        Some(network.node(0).node_info().into())
    );
}

#[tokio::test]
async fn test_store_bound_to_other_node_id() {
    let node = TestNode::new(100);
    let store = MemoryStore::with_node_info(NodeInfo::new(NodeId::new(200), node.public_key()));
    let registry = StaticRegistry::new(vec![node.registry_entry()]);

    let err = Registrant::new(&registry, &store, &RegistrantConfig::new(node.secret_hex()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistrantError::NodeIdMismatch { registry, database }
            if registry == NodeId::new(100) && database == 200
    ));
    assert_eq!(err.category(), ErrorCategory::Consistency);
}

#[tokio::test]
async fn test_store_bound_to_other_public_key() {
    let node = TestNode::new(100);
    let other = TestNode::new(100);
    let store = MemoryStore::with_node_info(other.node_info());
    let registry = StaticRegistry::new(vec![node.registry_entry()]);

    let err = Registrant::new(&registry, &store, &RegistrantConfig::new(node.secret_hex()))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrantError::PublicKeyMismatch { .. }));
    assert_eq!(err.category(), ErrorCategory::Consistency);
    assert_eq!(store.select_node_info().await.unwrap(), Some(other.node_info().into()));
}

#[tokio::test]
async fn test_registry_reassignment_is_detected() {
    let node = TestNode::new(100);
    let registry = StaticRegistry::new(vec![node.registry_entry()]);
    let store = MemoryStore::new();
    let config = RegistrantConfig::new(node.secret_hex());

    Registrant::new(&registry, &store, &config).await.unwrap();

    registry
        .replace(vec![Node::new(NodeId::new(500), node.public_key())])
        .await;

    assert!(matches!(
        Registrant::new(&registry, &store, &config).await,
        Err(RegistrantError::NodeIdMismatch { .. })
    ));
}

#[tokio::test]
async fn test_store_unavailable() {
    let node = TestNode::new(100);
    let registry = StaticRegistry::new(vec![node.registry_entry()]);
    let config = RegistrantConfig::new(node.secret_hex());

    let err = Registrant::new(&registry, &UnavailableStore, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrantError::StoreUnavailable(_)));

    assert_eq!(err.category(), ErrorCategory::Unavailable);
}

#[tokio::test]
async fn test_duplicate_without_record_is_inconsistent() {
    let node = TestNode::new(100);
    let registry = StaticRegistry::new(vec![node.registry_entry()]);
    let config = RegistrantConfig::new(node.secret_hex());

    let err = Registrant::new(&registry, &InconsistentStore, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrantError::RecordMissing));
    assert_eq!(err.category(), ErrorCategory::Consistency);
}

#[tokio::test]
async fn test_sqlite_binding_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.db");
    let network = TestNetwork::new(&[100, 200]);
    let registry = network.registry();

    {
        let store = SqliteStore::open(&path).unwrap();
        let config = RegistrantConfig::new(network.node(0).secret_hex());
        Registrant::new(&registry, &store, &config).await.unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(
        store.select_node_info().await.unwrap(),
        Some(network.node(0).node_info().into())
    );

    let config = RegistrantConfig::new(network.node(0).secret_hex());
    Registrant::new(&registry, &store, &config).await.unwrap();

    // A different operator pointed at the same database.
    let config = RegistrantConfig::new(network.node(1).secret_hex());
    let err = Registrant::new(&registry, &store, &config)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Consistency);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_startup_has_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.db");
    let network = Arc::new(TestNetwork::new(&[100, 200, 300, 400]));

    let mut handles = Vec::new();
    for i in 0..network.nodes.len() {
        let network = network.clone();
        let path = path.clone();
        handles.push(tokio::spawn(async move {
            let store = SqliteStore::open(&path).unwrap();
            let config = RegistrantConfig::new(network.node(i).secret_hex());
            Registrant::new(&network.registry(), &store, &config)
                .await
                .map(|r| r.node_info())
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(info) => winners.push(info),
            Err(err) => assert_eq!(err.category(), ErrorCategory::Consistency),
        }
    }

    assert_eq!(winners.len(), 1);
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.select_node_info().await.unwrap(), Some(winners[0].into()));
}

/// Write an identity row directly, bypassing the store's own encoding.
fn seed_identity_row(path: &std::path::Path, node_id: i64, public_key: &[u8]) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute(
        "INSERT INTO node_info (singleton_id, node_id, public_key, created_at)
         VALUES (1, ?1, ?2, 0)",
        rusqlite::params![node_id, public_key],
    )
    .unwrap();
}

/// Open a migrated database at `path` holding the given raw row, then start
/// `node` against it.
async fn start_against_row(node: &TestNode, node_id: i64, public_key: &[u8]) -> RegistrantError {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.db");
    let store = SqliteStore::open(&path).unwrap();
    seed_identity_row(&path, node_id, public_key);

    let registry = StaticRegistry::new(vec![node.registry_entry()]);
    Registrant::new(&registry, &store, &RegistrantConfig::new(node.secret_hex()))
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_sqlite_unparseable_public_key_is_a_mismatch() {
    init_tracing();
    let node = TestNode::new(100);

    let err = start_against_row(&node, 100, &[0x01, 0x02]).await;

    match &err {
        RegistrantError::PublicKeyMismatch { registry, database } => {
            assert_eq!(*registry, node.public_key());
            assert_eq!(database, &vec![0x01, 0x02]);
        }
        other => panic!("expected public key mismatch, got {:?}", other),
    }
    assert_eq!(err.category(), ErrorCategory::Consistency);
}

#[tokio::test]
async fn test_sqlite_out_of_range_node_id_is_a_mismatch() {
    let node = TestNode::new(100);

    let err = start_against_row(&node, 70000, node.public_key().as_bytes()).await;

    assert!(matches!(
        err,
        RegistrantError::NodeIdMismatch { registry, database: 70000 }
            if registry == NodeId::new(100)
    ));
    assert_eq!(err.category(), ErrorCategory::Consistency);
}

#[tokio::test]
async fn test_sqlite_compressed_public_key_is_a_mismatch() {
    let node = TestNode::new(100);
    let full = node.public_key();
    let full = full.as_bytes();
    let mut compressed = vec![0x02 | (full[64] & 1)];
    compressed.extend_from_slice(&full[1..33]);

    let err = start_against_row(&node, 100, &compressed).await;

    assert!(matches!(err, RegistrantError::PublicKeyMismatch { .. }));
    assert_eq!(err.category(), ErrorCategory::Consistency);
}

#[tokio::test]
async fn test_sqlite_exact_row_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.db");
    let node = TestNode::new(100);
    let store = SqliteStore::open(&path).unwrap();
    seed_identity_row(&path, 100, node.public_key().as_bytes());

    let registry = StaticRegistry::new(vec![node.registry_entry()]);
    let registrant = Registrant::new(&registry, &store, &RegistrantConfig::new(node.secret_hex()))
        .await
        .unwrap();
    assert_eq!(registrant.node_info(), node.node_info());
}

// ============================================================================
// Sequence IDs
// ============================================================================

#[tokio::test]
async fn test_sids_are_ordered_and_node_scoped() {
    let network = TestNetwork::new(&[1, 2]);
    let registry = network.registry();
    let a = registrant_for(network.node(0), &registry).await;
    let b = registrant_for(network.node(1), &registry).await;

    let sids: Vec<SequenceId> = (1..=3).map(|id| a.sid(id).unwrap()).collect();
    assert!(sids[0] < sids[1] && sids[1] < sids[2]);

    for id in 1..=3 {
        assert_ne!(a.sid(id).unwrap(), b.sid(id).unwrap());
    }
}

#[tokio::test]
async fn test_out_of_range_local_id_rejected() {
    let network = TestNetwork::new(&[7]);
    let registrant = registrant_for(network.node(0), &network.registry()).await;
    let payer = payer_envelope(b"hello", 7);

    for id in [0, -1, 1 << 48, i64::MAX] {
        let staged = staged_envelope(id, fixed_time(), &payer);
        assert!(matches!(
            registrant.sign_staged_envelope(&staged),
            Err(SignError::SequenceExhausted(got)) if got == id
        ));
    }
}

// ============================================================================
// Signing
// ============================================================================

#[tokio::test]
async fn test_example_envelope() {
    let network = TestNetwork::new(&[7]);
    let registrant = registrant_for(network.node(0), &network.registry()).await;
    let payer = payer_envelope(b"hello", 7);
    let staged = staged_envelope(42, fixed_time(), &payer);

    let signed = registrant.sign_staged_envelope(&staged).unwrap();
    let unsigned = signed.unsigned().unwrap();

    assert_eq!(unsigned.originator_sid.as_u64(), 0x0007_0000_0000_002a);
    assert_eq!(unsigned.originator_ns, 1_704_067_200_000_000_000);
    assert_eq!(unsigned.payer_envelope, payer);
    assert_eq!(
        unsigned.payer_envelope.unsigned_client_envelope,
        Bytes::from_static(b"hello")
    );

    let digest = Keccak256Hash::hash(&signed.unsigned_originator_envelope);
    assert_eq!(signed.digest(), digest);
    assert_eq!(
        signed.originator_signature.recover(&digest).unwrap(),
        registrant.public_key()
    );
}

#[tokio::test]
async fn test_signing_twice_verifies_twice() {
    let network = TestNetwork::new(&[7]);
    let registrant = registrant_for(network.node(0), &network.registry()).await;
    let staged = staged_envelope(9, fixed_time(), &payer_envelope(b"twice", 7));

    let first = registrant.sign_staged_envelope(&staged).unwrap();
    let second = registrant.sign_staged_envelope(&staged).unwrap();

    assert_eq!(
        first.unsigned_originator_envelope,
        second.unsigned_originator_envelope
    );
    for signed in [&first, &second] {
        signed
            .originator_signature
            .verify(&signed.digest(), &registrant.public_key())
            .unwrap();
    }
}

#[tokio::test]
async fn test_pre_epoch_time_is_negative() {
    let network = TestNetwork::new(&[7]);
    let registrant = registrant_for(network.node(0), &network.registry()).await;
    let staged = staged_envelope(
        1,
        UNIX_EPOCH - Duration::from_secs(1),
        &payer_envelope(b"", 7),
    );

    let signed = registrant.sign_staged_envelope(&staged).unwrap();
    assert_eq!(signed.unsigned().unwrap().originator_ns, -1_000_000_000);
}

#[tokio::test]
async fn test_earliest_representable_time_signs() {
    let network = TestNetwork::new(&[7]);
    let registrant = registrant_for(network.node(0), &network.registry()).await;
    let Some(earliest) = UNIX_EPOCH.checked_sub(Duration::from_nanos(i64::MIN.unsigned_abs()))
    else {
        return;
    };

    let signed = registrant
        .sign_staged_envelope(&staged_envelope(1, earliest, &payer_envelope(b"", 7)))
        .unwrap();
    assert_eq!(signed.unsigned().unwrap().originator_ns, i64::MIN);

    if let Some(too_early) = earliest.checked_sub(Duration::from_nanos(1)) {
        assert!(matches!(
            registrant.sign_staged_envelope(&staged_envelope(2, too_early, &payer_envelope(b"", 7))),
            Err(SignError::InvalidTimestamp)
        ));
    }
}

#[tokio::test]
async fn test_malformed_payer_envelope() {
    let network = TestNetwork::new(&[7]);
    let registrant = registrant_for(network.node(0), &network.registry()).await;
    let valid = payer_envelope(b"hello", 7).to_bytes().unwrap();

    let cases = [
        Bytes::new(),
        Bytes::copy_from_slice(&valid[..valid.len() / 2]),
        Bytes::from_static(b"\x01\x02\x03"),
    ];
    for payload in cases {
        let staged = StagedEnvelope {
            id: 1,
            originator_time: fixed_time(),
            payer_envelope: payload,
        };
        assert!(matches!(
            registrant.sign_staged_envelope(&staged),
            Err(SignError::MalformedPayerEnvelope(_))
        ));
    }

    // The registrant keeps working after a rejected message.
    let staged = staged_envelope(2, fixed_time(), &payer_envelope(b"ok", 7));
    assert!(registrant.sign_staged_envelope(&staged).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_signing_shares_one_registrant() {
    let network = TestNetwork::new(&[7]);
    let registrant = Arc::new(registrant_for(network.node(0), &network.registry()).await);

    let mut handles = Vec::new();
    for id in 1..=32i64 {
        let registrant = registrant.clone();
        handles.push(tokio::spawn(async move {
            let staged = staged_envelope(id, fixed_time(), &payer_envelope(&random_payload(32), 7));
            registrant.sign_staged_envelope(&staged)
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let signed = handle.await.unwrap().unwrap();
        assert_eq!(signed.recover_signer().unwrap(), registrant.public_key());
        assert_eq!(
            signed.unsigned().unwrap().originator_sid.local_id(),
            i as i64 + 1
        );
    }
}

// ============================================================================
// Properties
// ============================================================================

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn signatures_always_recover_the_signer(
        seed in signing_seed(),
        node in node_id(),
        local_id in valid_local_id(),
        time in originator_time(),
        payer in generated_payer_envelope(),
    ) {
        let node = TestNode::with_seed(node.get(), seed);
        let registry = StaticRegistry::new(vec![node.registry_entry()]);

        let registrant = runtime().block_on(Registrant::new(
            &registry,
            &MemoryStore::new(),
            &RegistrantConfig::new(node.prefixed_secret_hex()),
        ));
        prop_assert!(registrant.is_ok());
        let registrant = registrant.unwrap();

        let signed = registrant
            .sign_staged_envelope(&staged_envelope(local_id, time, &payer))
            .unwrap();
        let unsigned = signed.unsigned().unwrap();

        prop_assert_eq!(signed.recover_signer().unwrap(), node.public_key());
        prop_assert_eq!(unsigned.originator_sid, SequenceId::new(node.node_id, local_id).unwrap());
        prop_assert_eq!(unsigned.payer_envelope, payer);
    }

    #[test]
    fn invalid_local_ids_never_sign(local_id in invalid_local_id()) {
        let node = TestNode::with_seed(7, [0x42; 32]);
        let registry = StaticRegistry::new(vec![node.registry_entry()]);
        let registrant = runtime()
            .block_on(Registrant::new(
                &registry,
                &MemoryStore::new(),
                &RegistrantConfig::new(node.secret_hex()),
            ))
            .unwrap();

        let staged = staged_envelope(local_id, fixed_time(), &payer_envelope(b"x", 7));
        prop_assert!(
            matches!(
                registrant.sign_staged_envelope(&staged),
                Err(SignError::SequenceExhausted(_))
            ),
            "local ID {} was accepted",
            local_id
        );
    }
}
