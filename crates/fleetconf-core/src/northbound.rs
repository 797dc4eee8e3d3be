// ── Northbound service ──
//
// Operator-facing CRUD over networks and entities. Every call runs in
// exactly one transaction (reads in a read-only one), so a batch either
// lands completely or not at all. Config blobs are persisted as given.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CoreError;
use crate::model::{EntityGraph, Network, NetworkEntity, TypeAndKey};
use crate::storage::{
    EntityLoadCriteria, EntityLoadFilter, EntityLoadResult, EntityUpdateCriteria,
    NetworkLoadCriteria, NetworkLoadFilter, NetworkLoadResult, NetworkUpdateCriteria,
    StorageFactory, TxOptions, in_transaction,
};

/// One step of a mixed batch write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EntityWriteOperation {
    Create(NetworkEntity),
    Update(EntityUpdateCriteria),
}

impl EntityWriteOperation {
    pub fn type_and_key(&self) -> TypeAndKey {
        match self {
            Self::Create(e) => e.type_and_key(),
            Self::Update(u) => u.type_and_key(),
        }
    }
}

#[derive(Clone)]
pub struct NorthboundService {
    storage: Arc<dyn StorageFactory>,
}

impl NorthboundService {
    pub fn new(storage: Arc<dyn StorageFactory>) -> Self {
        Self { storage }
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub async fn list_network_ids(&self) -> Result<Vec<String>, CoreError> {
        in_transaction(self.storage.as_ref(), TxOptions::read_only(), |store| {
            Box::pin(async move { store.list_network_ids().await })
        })
        .await
    }

    pub async fn load_networks(
        &self,
        filter: NetworkLoadFilter,
        criteria: NetworkLoadCriteria,
    ) -> Result<NetworkLoadResult, CoreError> {
        in_transaction(self.storage.as_ref(), TxOptions::read_only(), move |store| {
            Box::pin(async move { store.load_networks(&filter, criteria).await })
        })
        .await
    }

    pub async fn load_network(
        &self,
        network_id: &str,
        criteria: NetworkLoadCriteria,
    ) -> Result<Network, CoreError> {
        let mut loaded = self
            .load_networks(NetworkLoadFilter::ids([network_id]), criteria)
            .await?;
        loaded
            .networks
            .pop()
            .ok_or_else(|| CoreError::NetworkNotFound {
                network_id: network_id.to_owned(),
            })
    }

    pub async fn does_network_exist(&self, network_id: &str) -> Result<bool, CoreError> {
        let criteria = NetworkLoadCriteria {
            load_metadata: false,
            load_configs: false,
        };
        match self.load_network(network_id, criteria).await {
            Ok(_) => Ok(true),
            Err(CoreError::NetworkNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn create_networks(&self, networks: Vec<Network>) -> Result<Vec<Network>, CoreError> {
        let created = in_transaction(self.storage.as_ref(), TxOptions::read_write(), move |store| {
            Box::pin(async move {
                let mut created = Vec::with_capacity(networks.len());
                for network in networks {
                    created.push(store.create_network(network).await?);
                }
                Ok(created)
            })
        })
        .await?;
        info!(count = created.len(), "networks created");
        Ok(created)
    }

    pub async fn create_network(&self, network: Network) -> Result<Network, CoreError> {
        let mut created = self.create_networks(vec![network]).await?;
        created
            .pop()
            .ok_or_else(|| CoreError::Internal("network create returned nothing".into()))
    }

    pub async fn update_networks(&self, updates: Vec<NetworkUpdateCriteria>) -> Result<(), CoreError> {
        in_transaction(self.storage.as_ref(), TxOptions::read_write(), move |store| {
            Box::pin(async move { store.update_networks(updates).await })
        })
        .await
    }

    pub async fn delete_networks(&self, network_ids: Vec<String>) -> Result<(), CoreError> {
        let count = network_ids.len();
        self.update_networks(
            network_ids
                .into_iter()
                .map(NetworkUpdateCriteria::delete)
                .collect(),
        )
        .await?;
        info!(count, "networks deleted");
        Ok(())
    }

    pub async fn delete_network(&self, network_id: &str) -> Result<(), CoreError> {
        self.delete_networks(vec![network_id.to_owned()]).await
    }

    // ── Entity reads ─────────────────────────────────────────────────

    pub async fn load_entities(
        &self,
        network_id: &str,
        filter: EntityLoadFilter,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityLoadResult, CoreError> {
        let network_id = network_id.to_owned();
        in_transaction(self.storage.as_ref(), TxOptions::read_only(), move |store| {
            Box::pin(async move { store.load_entities(&network_id, &filter, criteria).await })
        })
        .await
    }

    pub async fn load_entity(
        &self,
        network_id: &str,
        id: &TypeAndKey,
        criteria: EntityLoadCriteria,
    ) -> Result<NetworkEntity, CoreError> {
        let mut loaded = self
            .load_entities(network_id, EntityLoadFilter::ids([id.clone()]), criteria)
            .await?;
        loaded
            .entities
            .pop()
            .ok_or_else(|| CoreError::EntityNotFound {
                network_id: network_id.to_owned(),
                entity: id.to_string(),
            })
    }

    pub async fn load_entity_for_physical_id(
        &self,
        physical_id: &str,
        criteria: EntityLoadCriteria,
    ) -> Result<NetworkEntity, CoreError> {
        let physical_id = physical_id.to_owned();
        in_transaction(self.storage.as_ref(), TxOptions::read_only(), move |store| {
            Box::pin(async move { store.load_entity_for_physical_id(&physical_id, criteria).await })
        })
        .await
    }

    pub async fn does_entity_exist(&self, network_id: &str, id: &TypeAndKey) -> Result<bool, CoreError> {
        let count = self
            .count_entities(network_id, EntityLoadFilter::ids([id.clone()]))
            .await?;
        Ok(count > 0)
    }

    pub async fn count_entities(
        &self,
        network_id: &str,
        filter: EntityLoadFilter,
    ) -> Result<u64, CoreError> {
        let network_id = network_id.to_owned();
        in_transaction(self.storage.as_ref(), TxOptions::read_only(), move |store| {
            Box::pin(async move { store.count_entities(&network_id, &filter).await })
        })
        .await
    }

    pub async fn load_graph_for_entity(
        &self,
        network_id: &str,
        id: &TypeAndKey,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityGraph, CoreError> {
        let network_id = network_id.to_owned();
        let id = id.clone();
        in_transaction(self.storage.as_ref(), TxOptions::read_only(), move |store| {
            Box::pin(async move { store.load_graph_for_entity(&network_id, &id, criteria).await })
        })
        .await
    }

    // ── Entity writes ────────────────────────────────────────────────

    /// Create all entities or none.
    pub async fn create_entities(
        &self,
        network_id: &str,
        entities: Vec<NetworkEntity>,
    ) -> Result<BTreeMap<TypeAndKey, NetworkEntity>, CoreError> {
        self.write_entities(
            network_id,
            entities.into_iter().map(EntityWriteOperation::Create).collect(),
        )
        .await
    }

    pub async fn create_entity(
        &self,
        network_id: &str,
        entity: NetworkEntity,
    ) -> Result<NetworkEntity, CoreError> {
        let id = entity.type_and_key();
        self.create_entities(network_id, vec![entity])
            .await?
            .remove(&id)
            .ok_or_else(|| CoreError::Internal(format!("create of {id} returned nothing")))
    }

    /// Apply all updates or none. Deleted entities are absent from the result.
    pub async fn update_entities(
        &self,
        network_id: &str,
        updates: Vec<EntityUpdateCriteria>,
    ) -> Result<BTreeMap<TypeAndKey, NetworkEntity>, CoreError> {
        self.write_entities(
            network_id,
            updates.into_iter().map(EntityWriteOperation::Update).collect(),
        )
        .await
    }

    pub async fn update_entity(
        &self,
        network_id: &str,
        update: EntityUpdateCriteria,
    ) -> Result<Option<NetworkEntity>, CoreError> {
        let id = update.type_and_key();
        Ok(self
            .update_entities(network_id, vec![update])
            .await?
            .remove(&id))
    }

    /// Mixed creates and updates in one transaction, applied in order.
    pub async fn write_entities(
        &self,
        network_id: &str,
        writes: Vec<EntityWriteOperation>,
    ) -> Result<BTreeMap<TypeAndKey, NetworkEntity>, CoreError> {
        let count = writes.len();
        let network_id = network_id.to_owned();
        let written = in_transaction(self.storage.as_ref(), TxOptions::read_write(), {
            let network_id = network_id.clone();
            move |store| {
                Box::pin(async move {
                    let mut results = BTreeMap::new();
                    for write in writes {
                        let id = write.type_and_key();
                        let entity = match write {
                            EntityWriteOperation::Create(entity) => {
                                Some(store.create_entity(&network_id, entity).await?)
                            }
                            EntityWriteOperation::Update(update) => {
                                store.update_entity(&network_id, update).await?
                            }
                        };
                        match entity {
                            Some(entity) => {
                                results.insert(id, entity);
                            }
                            None => {
                                results.remove(&id);
                            }
                        }
                    }
                    Ok(results)
                })
            }
        })
        .await?;
        info!(network_id = %network_id, writes = count, "entities written");
        Ok(written)
    }

    /// Delete through the update path so every edge is cleaned up too.
    /// Missing entities are ignored.
    pub async fn delete_entities(&self, network_id: &str, ids: Vec<TypeAndKey>) -> Result<(), CoreError> {
        self.update_entities(
            network_id,
            ids.iter().map(EntityUpdateCriteria::delete).collect(),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_entity(&self, network_id: &str, id: &TypeAndKey) -> Result<(), CoreError> {
        self.delete_entities(network_id, vec![id.clone()]).await
    }
}
