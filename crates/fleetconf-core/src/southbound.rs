// ── Southbound service ──
//
// Device-facing read path. Graph, network (and hardware ID resolution,
// when used) are loaded in one read-only transaction, which is committed
// before any builder runs. Builder failures are logged in full here and
// reach the device only as a generic internal error.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::CoreError;
use crate::mconfig::{Mconfig, MconfigPipeline};
use crate::model::{EntityGraph, Network, TypeAndKey};
use crate::storage::{
    EntityLoadCriteria, NetworkLoadCriteria, NetworkLoadFilter, StorageFactory, Store, TxOptions,
    in_transaction,
};

/// Caller identity attached by the authenticated device channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayIdentity {
    pub network_id: String,
    pub logical_id: String,
}

impl GatewayIdentity {
    pub fn new(network_id: impl Into<String>, logical_id: impl Into<String>) -> Self {
        Self {
            network_id: network_id.into(),
            logical_id: logical_id.into(),
        }
    }
}

pub struct SouthboundService {
    storage: Arc<dyn StorageFactory>,
    pipeline: Arc<MconfigPipeline>,
    gateway_entity_type: String,
}

impl SouthboundService {
    pub fn new(
        storage: Arc<dyn StorageFactory>,
        pipeline: Arc<MconfigPipeline>,
        gateway_entity_type: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            pipeline,
            gateway_entity_type: gateway_entity_type.into(),
        }
    }

    /// Compose the mconfig for an already-authenticated gateway.
    pub async fn get_mconfig(&self, identity: Option<&GatewayIdentity>) -> Result<Mconfig, CoreError> {
        let identity = identity.ok_or_else(|| CoreError::denied("missing gateway identity"))?;
        if identity.network_id.trim().is_empty() || identity.logical_id.trim().is_empty() {
            return Err(CoreError::denied("incomplete gateway identity"));
        }

        let network_id = identity.network_id.clone();
        let gateway = TypeAndKey::new(self.gateway_entity_type.clone(), identity.logical_id.clone());
        let (network, graph) = in_transaction(self.storage.as_ref(), TxOptions::read_only(), {
            let gateway = gateway.clone();
            move |store| {
                Box::pin(async move {
                    let graph = store
                        .load_graph_for_entity(&network_id, &gateway, EntityLoadCriteria::full())
                        .await
                        .map_err(|e| match e {
                            CoreError::EntityNotFound { .. } => {
                                CoreError::denied(format!("gateway {gateway} is not registered"))
                            }
                            other => other,
                        })?;
                    let network = load_network(store, &network_id).await?;
                    Ok((network, graph))
                })
            }
        })
        .await
        .inspect_err(|e| {
            warn!(
                network_id = %identity.network_id,
                gateway = %gateway,
                error = %e,
                "mconfig request rejected"
            );
        })?;

        self.compose(&network, &graph, &identity.logical_id).await
    }

    /// Resolve a hardware ID to its entity, then compose as `get_mconfig`.
    pub async fn get_mconfig_internal(&self, hardware_id: &str) -> Result<Mconfig, CoreError> {
        if hardware_id.trim().is_empty() {
            return Err(CoreError::invalid("hardware ID must not be empty"));
        }

        let physical_id = hardware_id.to_owned();
        let (network, graph, gateway_id) =
            in_transaction(self.storage.as_ref(), TxOptions::read_only(), move |store| {
                Box::pin(async move {
                    let entity = store
                        .load_entity_for_physical_id(&physical_id, EntityLoadCriteria::default())
                        .await?;
                    let id = entity.type_and_key();
                    let graph = store
                        .load_graph_for_entity(&entity.network_id, &id, EntityLoadCriteria::full())
                        .await?;
                    let network = load_network(store, &entity.network_id).await?;
                    Ok((network, graph, entity.key))
                })
            })
            .await?;

        debug!(hardware_id, network_id = %network.id, gateway_id = %gateway_id, "hardware ID resolved");
        self.compose(&network, &graph, &gateway_id).await
    }

    async fn compose(
        &self,
        network: &Network,
        graph: &EntityGraph,
        gateway_id: &str,
    ) -> Result<Mconfig, CoreError> {
        self.pipeline
            .create_mconfig(network, graph, gateway_id)
            .await
            .map_err(|e| {
                error!(
                    network_id = %network.id,
                    gateway_id,
                    error = %e,
                    kind = %e.kind(),
                    "mconfig composition failed"
                );
                CoreError::Internal("failed to build mconfig".into())
            })
    }
}

async fn load_network(store: &mut dyn Store, network_id: &str) -> Result<Network, CoreError> {
    store
        .load_networks(&NetworkLoadFilter::ids([network_id]), NetworkLoadCriteria::full())
        .await?
        .networks
        .pop()
        .ok_or_else(|| CoreError::NetworkNotFound {
            network_id: network_id.to_owned(),
        })
}
