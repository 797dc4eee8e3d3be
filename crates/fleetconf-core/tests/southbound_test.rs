#![allow(clippy::unwrap_used)]
// End-to-end mconfig requests: storage -> graph load -> builders -> bundle.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleetconf_core::mconfig::{EntityConfigBuilder, NetworkConfigBuilder};
use fleetconf_core::{
    BuilderRegistry, CodecRegistry, CompositeRegistry, ErrorKind, GatewayIdentity, MconfigBuilder,
    MconfigPipeline, MemoryStorage, Network, NetworkEntity, NorthboundService, ServiceEndpoint,
    ServiceRegistry, SouthboundService, StaticRegistry, TypeAndKey,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn tk(t: &str, k: &str) -> TypeAndKey {
    TypeAndKey::new(t, k)
}

/// n1: magmad_gateway:g1 -> cellular_gateway:g1 -> enodeb:enb1
async fn seeded() -> (Arc<MemoryStorage>, NorthboundService) {
    let storage = Arc::new(MemoryStorage::new());
    let nb = NorthboundService::new(storage.clone());
    nb.create_network(
        Network::new("n1")
            .with_type("lte")
            .with_config("cellular_network", br#"{"earfcn":44590}"#.to_vec()),
    )
    .await
    .unwrap();
    nb.create_entities(
        "n1",
        vec![
            NetworkEntity::new("enodeb", "enb1").with_config(br#"{"pci":260}"#.to_vec()),
            NetworkEntity::new("cellular_gateway", "g1").with_association(tk("enodeb", "enb1")),
            NetworkEntity::new("magmad_gateway", "g1")
                .with_physical_id("hwid-g1")
                .with_association(tk("cellular_gateway", "g1")),
        ],
    )
    .await
    .unwrap();
    (storage, nb)
}

fn enodebd_builder() -> Arc<dyn MconfigBuilder> {
    Arc::new(EntityConfigBuilder::new(
        "enodeb-configs",
        "enodebd",
        "enodeb",
        Arc::new(CodecRegistry::default()),
    ))
}

fn southbound(storage: Arc<MemoryStorage>, registry: Arc<dyn BuilderRegistry>) -> SouthboundService {
    let pipeline = MconfigPipeline::new(registry, Duration::from_secs(2));
    SouthboundService::new(storage, Arc::new(pipeline), "magmad_gateway")
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_hardware_id_request_composes_enodebd() {
    let (storage, nb) = seeded().await;
    let sb = southbound(
        storage,
        Arc::new(StaticRegistry::new(vec![enodebd_builder()])),
    );

    let graph = nb
        .load_graph_for_entity(
            "n1",
            &tk("magmad_gateway", "g1"),
            fleetconf_core::EntityLoadCriteria::full(),
        )
        .await
        .unwrap();
    assert_eq!(graph.entities.len(), 3);
    assert!(graph.graph_id().is_some());

    let mconfig = sb.get_mconfig_internal("hwid-g1").await.unwrap();
    let enodebd: Value = serde_json::from_slice(&mconfig.configs_by_key["enodebd"]).unwrap();
    assert_eq!(enodebd, json!({ "enb1": { "pci": 260 } }));
    assert_eq!(mconfig.metadata.digest.algorithm, "SHA256");
    assert!(!mconfig.metadata.digest.hex_digest.is_empty());
    assert!(mconfig.metadata.created_at > 0);
}

#[tokio::test]
async fn test_identity_request_matches_hardware_id_request() {
    let (storage, _) = seeded().await;
    let sb = southbound(
        storage,
        Arc::new(StaticRegistry::new(vec![
            enodebd_builder(),
            Arc::new(NetworkConfigBuilder::new("net", "cellular", "cellular_network")),
        ])),
    );

    let by_identity = sb
        .get_mconfig(Some(&GatewayIdentity::new("n1", "g1")))
        .await
        .unwrap();
    let by_hwid = sb.get_mconfig_internal("hwid-g1").await.unwrap();
    assert_eq!(by_identity.configs_by_key, by_hwid.configs_by_key);
    assert_eq!(by_identity.metadata.digest, by_hwid.metadata.digest);
    assert_eq!(by_identity.configs_by_key.len(), 2);
}

#[tokio::test]
async fn test_split_graph_drops_enodeb_from_bundle() {
    let (storage, nb) = seeded().await;
    let sb = southbound(
        storage,
        Arc::new(StaticRegistry::new(vec![enodebd_builder()])),
    );

    let mut update = fleetconf_core::EntityUpdateCriteria::new(&tk("cellular_gateway", "g1"));
    update.associations_to_delete.push(tk("enodeb", "enb1"));
    nb.update_entity("n1", update).await.unwrap();

    let mconfig = sb.get_mconfig_internal("hwid-g1").await.unwrap();
    assert!(!mconfig.configs_by_key.contains_key("enodebd"));
}

// ── Identity errors ─────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_identity_is_permission_denied() {
    let (storage, _) = seeded().await;
    let sb = southbound(storage, Arc::new(StaticRegistry::default()));

    let err = sb.get_mconfig(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = sb
        .get_mconfig(Some(&GatewayIdentity::new("n1", " ")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_unregistered_gateway_is_permission_denied() {
    let (storage, _) = seeded().await;
    let sb = southbound(storage, Arc::new(StaticRegistry::default()));
    let err = sb
        .get_mconfig(Some(&GatewayIdentity::new("n1", "g404")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_unknown_network_is_not_found() {
    let (storage, _) = seeded().await;
    let sb = southbound(storage, Arc::new(StaticRegistry::default()));
    let err = sb
        .get_mconfig(Some(&GatewayIdentity::new("n9", "g1")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unknown_hardware_id_is_not_found() {
    let (storage, _) = seeded().await;
    let sb = southbound(storage, Arc::new(StaticRegistry::default()));
    let err = sb.get_mconfig_internal("hwid-nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ── Builder failures ────────────────────────────────────────────────

#[tokio::test]
async fn test_builder_collision_is_internal_to_device() {
    let (storage, _) = seeded().await;
    let sb = southbound(
        storage,
        Arc::new(StaticRegistry::new(vec![
            enodebd_builder(),
            Arc::new(NetworkConfigBuilder::new("legacy", "enodebd", "cellular_network")),
        ])),
    );

    let err = sb.get_mconfig_internal("hwid-g1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    // No builder names leak to the device.
    assert!(!err.to_string().contains("legacy"));
}

// ── Remote builders ─────────────────────────────────────────────────

#[tokio::test]
async fn test_remote_builder_receives_graph_and_contributes() {
    let (storage, _) = seeded().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/build"))
        .and(body_partial_json(json!({
            "gateway_id": "g1",
            "network": { "id": "n1", "type": "lte" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "configs_by_key": { "mme": "eyJtY2MiOiIwMDEifQ==" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = ServiceRegistry::new(
        "mconfig_builder",
        Duration::from_secs(2),
        &[
            ServiceEndpoint::new("lte-remote", Url::parse(&server.uri()).unwrap())
                .with_label("mconfig_builder"),
        ],
    )
    .unwrap();
    let registry = CompositeRegistry::new(vec![
        Arc::new(StaticRegistry::new(vec![enodebd_builder()])),
        Arc::new(remote),
    ]);
    let sb = southbound(storage, Arc::new(registry));

    let mconfig = sb.get_mconfig_internal("hwid-g1").await.unwrap();
    assert_eq!(mconfig.configs_by_key["mme"], br#"{"mcc":"001"}"#);
    assert!(mconfig.configs_by_key.contains_key("enodebd"));
}

#[tokio::test]
async fn test_remote_builder_failure_yields_no_bundle() {
    let (storage, _) = seeded().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/build"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let remote = ServiceRegistry::new(
        "mconfig_builder",
        Duration::from_secs(2),
        &[
            ServiceEndpoint::new("lte-remote", Url::parse(&server.uri()).unwrap())
                .with_label("mconfig_builder"),
        ],
    )
    .unwrap();
    let sb = southbound(storage, Arc::new(remote));

    let err = sb.get_mconfig_internal("hwid-g1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[tokio::test]
async fn test_pipeline_failure_does_not_block_writers() {
    let (storage, nb) = seeded().await;
    let sb = southbound(
        storage,
        Arc::new(StaticRegistry::new(vec![
            enodebd_builder(),
            Arc::new(NetworkConfigBuilder::new("legacy", "enodebd", "cellular_network")),
        ])),
    );
    assert!(sb.get_mconfig_internal("hwid-g1").await.is_err());

    // The read transaction was released; writes still go through.
    nb.create_entity("n1", NetworkEntity::new("enodeb", "enb2"))
        .await
        .unwrap();
}
