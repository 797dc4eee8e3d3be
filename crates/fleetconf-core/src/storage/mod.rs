// ── Storage transaction port ──
//
// The rest of the crate talks to storage only through `StorageFactory`
// and `Store`. A `Store` is one open transaction: every call made on it
// sees the same snapshot, and nothing it writes is visible until
// `commit`. Dropping a `Store` without committing rolls it back.

pub mod criteria;
mod graph;
pub mod memory;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::warn;

use crate::error::CoreError;
use crate::model::{EntityGraph, Network, NetworkEntity, TypeAndKey};

pub use criteria::{
    EntityLoadCriteria, EntityLoadFilter, EntityLoadResult, EntityUpdateCriteria,
    NetworkLoadCriteria, NetworkLoadFilter, NetworkLoadResult, NetworkUpdateCriteria,
    PhysicalIdUpdate,
};
pub use memory::MemoryStorage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Hint that no writes follow; mutating calls are rejected.
    pub read_only: bool,
}

impl TxOptions {
    pub fn read_only() -> Self {
        Self { read_only: true }
    }

    pub fn read_write() -> Self {
        Self { read_only: false }
    }
}

/// Opens transactions against one storage engine. Shared process-wide.
#[async_trait]
pub trait StorageFactory: Send + Sync {
    async fn start_transaction(&self, opts: TxOptions) -> Result<Box<dyn Store>, CoreError>;
}

/// One open transaction.
#[async_trait]
pub trait Store: Send {
    // ── Networks ─────────────────────────────────────────────────────

    async fn load_networks(
        &mut self,
        filter: &NetworkLoadFilter,
        criteria: NetworkLoadCriteria,
    ) -> Result<NetworkLoadResult, CoreError>;

    async fn list_network_ids(&mut self) -> Result<Vec<String>, CoreError>;

    async fn create_network(&mut self, network: Network) -> Result<Network, CoreError>;

    async fn update_networks(&mut self, updates: Vec<NetworkUpdateCriteria>)
    -> Result<(), CoreError>;

    // ── Entities ─────────────────────────────────────────────────────

    async fn load_entities(
        &mut self,
        network_id: &str,
        filter: &EntityLoadFilter,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityLoadResult, CoreError>;

    async fn count_entities(
        &mut self,
        network_id: &str,
        filter: &EntityLoadFilter,
    ) -> Result<u64, CoreError>;

    async fn create_entity(
        &mut self,
        network_id: &str,
        entity: NetworkEntity,
    ) -> Result<NetworkEntity, CoreError>;

    /// Returns the updated entity, or `None` when the update deleted it
    /// (or deleted an entity that did not exist).
    async fn update_entity(
        &mut self,
        network_id: &str,
        update: EntityUpdateCriteria,
    ) -> Result<Option<NetworkEntity>, CoreError>;

    /// Full connected component containing `id`.
    async fn load_graph_for_entity(
        &mut self,
        network_id: &str,
        id: &TypeAndKey,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityGraph, CoreError>;

    /// System-wide lookup; physical IDs are unique across networks.
    async fn load_entity_for_physical_id(
        &mut self,
        physical_id: &str,
        criteria: EntityLoadCriteria,
    ) -> Result<NetworkEntity, CoreError>;

    // ── Completion ───────────────────────────────────────────────────

    async fn commit(&mut self) -> Result<(), CoreError>;

    async fn rollback(&mut self) -> Result<(), CoreError>;
}

// ── Transaction helper ──────────────────────────────────────────────

/// Run `op` inside exactly one transaction.
///
/// Commits on success. On error the transaction is rolled back and the
/// original error returned; a failed rollback is only logged.
pub async fn in_transaction<T, F>(
    factory: &dyn StorageFactory,
    opts: TxOptions,
    op: F,
) -> Result<T, CoreError>
where
    F: for<'s> FnOnce(&'s mut dyn Store) -> BoxFuture<'s, Result<T, CoreError>> + Send,
    T: Send,
{
    let mut store = factory.start_transaction(opts).await?;
    match op(store.as_mut()).await {
        Ok(value) => {
            store.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback().await {
                warn!(error = %rollback_err, "rollback failed after: {err}");
            }
            Err(err)
        }
    }
}
