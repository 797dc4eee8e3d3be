// ── In-memory storage engine ──
//
// Reference implementation of the storage port. Committed state is an
// immutable `Snapshot` behind an `ArcSwap`:
//
// - read-only transactions pin the snapshot current at open time and
//   never wait on writers;
// - read-write transactions take the writer lock, mutate a private copy,
//   and publish it atomically on commit. Dropping the transaction drops
//   the copy and the lock, which is the rollback.
//
// Per-network state sits behind its own `Arc` so a write transaction only
// deep-copies the networks it touches.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::criteria::{
    EntityLoadCriteria, EntityLoadFilter, EntityLoadResult, EntityUpdateCriteria,
    NetworkLoadCriteria, NetworkLoadFilter, NetworkLoadResult, NetworkUpdateCriteria,
    PhysicalIdUpdate,
};
use super::{StorageFactory, Store, TxOptions};
use crate::error::CoreError;
use crate::model::{Acl, EntityGraph, Network, NetworkEntity, TypeAndKey};

// ── Stored state ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    networks: BTreeMap<String, Arc<NetworkState>>,
    /// physical ID -> (network ID, entity)
    physical_ids: BTreeMap<String, (String, TypeAndKey)>,
}

#[derive(Debug, Clone)]
pub(crate) struct NetworkState {
    pub(crate) network: Network,
    pub(crate) entities: BTreeMap<TypeAndKey, EntityRow>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EntityRow {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) physical_id: Option<String>,
    pub(crate) config: Option<Vec<u8>>,
    pub(crate) graph_id: String,
    pub(crate) associations: BTreeSet<TypeAndKey>,
    pub(crate) parents: BTreeSet<TypeAndKey>,
    pub(crate) permissions: Vec<Acl>,
    pub(crate) version: u64,
}

impl EntityRow {
    pub(crate) fn to_entity(&self, network_id: &str, id: &TypeAndKey) -> NetworkEntity {
        NetworkEntity {
            network_id: network_id.to_owned(),
            entity_type: id.entity_type.clone(),
            key: id.key.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            physical_id: self.physical_id.clone(),
            config: self.config.clone(),
            graph_id: self.graph_id.clone(),
            associations: self.associations.iter().cloned().collect(),
            parent_associations: self.parents.iter().cloned().collect(),
            permissions: self.permissions.clone(),
            version: self.version,
        }
    }

    /// Both edge directions.
    pub(crate) fn neighbors(&self) -> impl Iterator<Item = &TypeAndKey> {
        self.associations.iter().chain(&self.parents)
    }
}

pub(crate) fn fresh_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// ── MemoryStorage ───────────────────────────────────────────────────

/// Process-local storage engine. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    committed: Arc<ArcSwap<Snapshot>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageFactory for MemoryStorage {
    async fn start_transaction(&self, opts: TxOptions) -> Result<Box<dyn Store>, CoreError> {
        let state = if opts.read_only {
            TxState::ReadOnly(self.committed.load_full())
        } else {
            let guard = Arc::clone(&self.writer).lock_owned().await;
            // Loaded after the lock so no committed write is missed.
            let working = Snapshot::clone(&self.committed.load());
            TxState::ReadWrite {
                working,
                _guard: guard,
            }
        };
        debug!(read_only = opts.read_only, "transaction started");
        Ok(Box::new(MemoryTransaction {
            committed: Arc::clone(&self.committed),
            state,
        }))
    }
}

// ── Transactions ────────────────────────────────────────────────────

enum TxState {
    ReadOnly(Arc<Snapshot>),
    ReadWrite {
        working: Snapshot,
        _guard: OwnedMutexGuard<()>,
    },
    Closed,
}

struct MemoryTransaction {
    committed: Arc<ArcSwap<Snapshot>>,
    state: TxState,
}

impl MemoryTransaction {
    fn snapshot(&self) -> Result<&Snapshot, CoreError> {
        match &self.state {
            TxState::ReadOnly(snap) => Ok(snap),
            TxState::ReadWrite { working, .. } => Ok(working),
            TxState::Closed => Err(CoreError::invalid("transaction is already closed")),
        }
    }

    fn snapshot_mut(&mut self) -> Result<&mut Snapshot, CoreError> {
        match &mut self.state {
            TxState::ReadWrite { working, .. } => Ok(working),
            TxState::ReadOnly(_) => Err(CoreError::invalid(
                "cannot write through a read-only transaction",
            )),
            TxState::Closed => Err(CoreError::invalid("transaction is already closed")),
        }
    }
}

impl Snapshot {
    fn network(&self, network_id: &str) -> Result<&NetworkState, CoreError> {
        self.networks
            .get(network_id)
            .map(Arc::as_ref)
            .ok_or_else(|| CoreError::NetworkNotFound {
                network_id: network_id.to_owned(),
            })
    }

    fn network_mut(&mut self, network_id: &str) -> Result<&mut NetworkState, CoreError> {
        self.networks
            .get_mut(network_id)
            .map(Arc::make_mut)
            .ok_or_else(|| CoreError::NetworkNotFound {
                network_id: network_id.to_owned(),
            })
    }

    fn check_physical_id(
        &self,
        physical_id: &str,
        network_id: &str,
        owner: &TypeAndKey,
    ) -> Result<(), CoreError> {
        match self.physical_ids.get(physical_id) {
            Some((net, existing)) if net != network_id || existing != owner => {
                Err(CoreError::PhysicalIdInUse {
                    physical_id: physical_id.to_owned(),
                    owner: format!("{net}/{existing}"),
                })
            }
            _ => Ok(()),
        }
    }
}

fn entity_not_found(network_id: &str, id: &TypeAndKey) -> CoreError {
    CoreError::EntityNotFound {
        network_id: network_id.to_owned(),
        entity: id.to_string(),
    }
}

fn project_network(network: &Network, criteria: NetworkLoadCriteria) -> Network {
    let mut out = network.clone();
    if !criteria.load_metadata {
        out.name.clear();
        out.description.clear();
    }
    if !criteria.load_configs {
        out.configs.clear();
    }
    out
}

#[async_trait]
impl Store for MemoryTransaction {
    // ── Networks ─────────────────────────────────────────────────────

    async fn load_networks(
        &mut self,
        filter: &NetworkLoadFilter,
        criteria: NetworkLoadCriteria,
    ) -> Result<NetworkLoadResult, CoreError> {
        let snap = self.snapshot()?;
        let type_ok = |n: &Network| {
            filter
                .network_type
                .as_deref()
                .is_none_or(|t| n.network_type.as_deref() == Some(t))
        };

        let mut result = NetworkLoadResult::default();
        if filter.ids.is_empty() {
            result.networks = snap
                .networks
                .values()
                .map(|s| &s.network)
                .filter(|n| type_ok(*n))
                .map(|n| project_network(n, criteria))
                .collect();
        } else {
            for id in &filter.ids {
                match snap.networks.get(id) {
                    Some(state) if type_ok(&state.network) => {
                        result.networks.push(project_network(&state.network, criteria));
                    }
                    Some(_) => {}
                    None => result.networks_not_found.push(id.clone()),
                }
            }
        }
        Ok(result)
    }

    async fn list_network_ids(&mut self) -> Result<Vec<String>, CoreError> {
        Ok(self.snapshot()?.networks.keys().cloned().collect())
    }

    async fn create_network(&mut self, network: Network) -> Result<Network, CoreError> {
        network.validate()?;
        let snap = self.snapshot_mut()?;
        if snap.networks.contains_key(&network.id) {
            return Err(CoreError::NetworkExists {
                network_id: network.id,
            });
        }

        let network = Network {
            version: 0,
            ..network
        };
        snap.networks.insert(
            network.id.clone(),
            Arc::new(NetworkState {
                network: network.clone(),
                entities: BTreeMap::new(),
            }),
        );
        debug!(network_id = %network.id, "network created");
        Ok(network)
    }

    async fn update_networks(
        &mut self,
        updates: Vec<NetworkUpdateCriteria>,
    ) -> Result<(), CoreError> {
        let snap = self.snapshot_mut()?;
        for update in updates {
            if update.delete_network {
                if let Some(state) = snap.networks.remove(&update.id) {
                    for row in state.entities.values() {
                        if let Some(pid) = &row.physical_id {
                            snap.physical_ids.remove(pid);
                        }
                    }
                    debug!(network_id = %update.id, entities = state.entities.len(), "network deleted");
                }
                continue;
            }

            if update.configs_to_add_or_update.keys().any(|k| k.trim().is_empty()) {
                return Err(CoreError::invalid(format!(
                    "network {} update has a config with an empty type",
                    update.id
                )));
            }

            let network = &mut snap.network_mut(&update.id)?.network;
            if let Some(name) = update.new_name {
                network.name = name;
            }
            if let Some(description) = update.new_description {
                network.description = description;
            }
            if let Some(network_type) = update.new_type {
                network.network_type = Some(network_type);
            }
            network.configs.extend(update.configs_to_add_or_update);
            for config_type in &update.configs_to_delete {
                network.configs.remove(config_type);
            }
            network.version += 1;
        }
        Ok(())
    }

    // ── Entities ─────────────────────────────────────────────────────

    async fn load_entities(
        &mut self,
        network_id: &str,
        filter: &EntityLoadFilter,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityLoadResult, CoreError> {
        let snap = self.snapshot()?;
        let Some(state) = snap.networks.get(network_id) else {
            return Ok(EntityLoadResult {
                entities: Vec::new(),
                entities_not_found: filter.ids.clone(),
            });
        };

        let mut result = EntityLoadResult::default();
        if filter.ids.is_empty() {
            result.entities = state
                .entities
                .iter()
                .map(|(id, row)| row.to_entity(network_id, id))
                .filter(|e| filter.matches(e))
                .map(|e| criteria.apply(e))
                .collect();
        } else {
            let wanted: BTreeSet<&TypeAndKey> = filter.ids.iter().collect();
            for id in wanted {
                match state.entities.get(id) {
                    Some(row) => {
                        let entity = row.to_entity(network_id, id);
                        if filter.matches(&entity) {
                            result.entities.push(criteria.apply(entity));
                        }
                    }
                    None => result.entities_not_found.push(id.clone()),
                }
            }
        }
        Ok(result)
    }

    async fn count_entities(
        &mut self,
        network_id: &str,
        filter: &EntityLoadFilter,
    ) -> Result<u64, CoreError> {
        let loaded = self
            .load_entities(network_id, filter, EntityLoadCriteria::default())
            .await?;
        Ok(u64::try_from(loaded.entities.len()).unwrap_or(u64::MAX))
    }

    async fn create_entity(
        &mut self,
        network_id: &str,
        entity: NetworkEntity,
    ) -> Result<NetworkEntity, CoreError> {
        entity.validate()?;
        let id = entity.type_and_key();
        let snap = self.snapshot_mut()?;

        // Validate everything before touching the working copy.
        let state = snap.network(network_id)?;
        if state.entities.contains_key(&id) {
            return Err(CoreError::EntityExists {
                network_id: network_id.to_owned(),
                entity: id.to_string(),
            });
        }
        if let Some(pid) = &entity.physical_id {
            snap.check_physical_id(pid, network_id, &id)?;
        }
        let associations: BTreeSet<TypeAndKey> = entity.associations.into_iter().collect();
        for target in &associations {
            if *target == id {
                return Err(CoreError::invalid(format!("entity {id} cannot associate to itself")));
            }
            if !state.entities.contains_key(target) {
                return Err(entity_not_found(network_id, target));
            }
        }

        let permissions = entity
            .permissions
            .into_iter()
            .map(|acl| Acl {
                id: fresh_id(),
                version: 0,
                ..acl
            })
            .collect();
        let row = EntityRow {
            name: entity.name,
            description: entity.description,
            physical_id: entity.physical_id,
            config: entity.config,
            graph_id: fresh_id(),
            associations,
            parents: BTreeSet::new(),
            permissions,
            version: 0,
        };

        if let Some(pid) = &row.physical_id {
            snap.physical_ids
                .insert(pid.clone(), (network_id.to_owned(), id.clone()));
        }
        let state = snap.network_mut(network_id)?;
        let label = row.graph_id.clone();
        let targets: Vec<TypeAndKey> = row.associations.iter().cloned().collect();
        state.insert_row(id.clone(), row);
        if !targets.is_empty() {
            state.recompute_components(std::iter::once(&id).chain(&targets), Some(label.as_str()));
        }

        debug!(network_id, entity = %id, "entity created");
        state
            .entities
            .get(&id)
            .map(|row| row.to_entity(network_id, &id))
            .ok_or_else(|| entity_not_found(network_id, &id))
    }

    async fn update_entity(
        &mut self,
        network_id: &str,
        update: EntityUpdateCriteria,
    ) -> Result<Option<NetworkEntity>, CoreError> {
        let id = update.type_and_key();
        id.validate()?;
        let snap = self.snapshot_mut()?;
        snap.network(network_id)?;

        if update.delete_entity {
            let state = snap.network_mut(network_id)?;
            let Some(row) = state.remove_row(&id) else {
                return Ok(None);
            };
            if let Some(pid) = &row.physical_id {
                snap.physical_ids.remove(pid);
            }
            debug!(network_id, entity = %id, "entity deleted");
            return Ok(None);
        }

        let plan = snap.network(network_id)?.plan_update(network_id, &id, &update)?;
        if let Some(PhysicalIdUpdate::Set(pid)) = &update.new_physical_id {
            if pid.trim().is_empty() {
                return Err(CoreError::invalid(format!("entity {id} has an empty physical ID")));
            }
            snap.check_physical_id(pid, network_id, &id)?;
        }

        // ── Apply ──
        let state = snap.network_mut(network_id)?;
        let old_physical_id = state.apply_update(&id, update, plan)?;
        let entity = state
            .entities
            .get(&id)
            .map(|row| row.to_entity(network_id, &id))
            .ok_or_else(|| entity_not_found(network_id, &id))?;
        if let Some(old) = old_physical_id {
            snap.physical_ids.remove(&old);
        }
        if let Some(pid) = &entity.physical_id {
            snap.physical_ids
                .insert(pid.clone(), (network_id.to_owned(), id.clone()));
        }
        debug!(network_id, entity = %id, version = entity.version, "entity updated");
        Ok(Some(entity))
    }

    async fn load_graph_for_entity(
        &mut self,
        network_id: &str,
        id: &TypeAndKey,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityGraph, CoreError> {
        let state = self.snapshot()?.network(network_id)?;
        state.load_graph(id, criteria)
    }

    async fn load_entity_for_physical_id(
        &mut self,
        physical_id: &str,
        criteria: EntityLoadCriteria,
    ) -> Result<NetworkEntity, CoreError> {
        let snap = self.snapshot()?;
        let not_found = || CoreError::HardwareIdNotFound {
            hardware_id: physical_id.to_owned(),
        };
        let (network_id, id) = snap.physical_ids.get(physical_id).ok_or_else(not_found)?;
        let row = snap
            .networks
            .get(network_id)
            .and_then(|state| state.entities.get(id))
            .ok_or_else(not_found)?;
        Ok(criteria.apply(row.to_entity(network_id, id)))
    }

    // ── Completion ───────────────────────────────────────────────────

    async fn commit(&mut self) -> Result<(), CoreError> {
        match std::mem::replace(&mut self.state, TxState::Closed) {
            TxState::ReadWrite { working, _guard } => {
                self.committed.store(Arc::new(working));
                debug!("transaction committed");
                Ok(())
            }
            TxState::ReadOnly(_) => Ok(()),
            TxState::Closed => Err(CoreError::invalid("transaction is already closed")),
        }
    }

    async fn rollback(&mut self) -> Result<(), CoreError> {
        if matches!(self.state, TxState::ReadWrite { .. }) {
            debug!("transaction rolled back");
        }
        self.state = TxState::Closed;
        Ok(())
    }
}

// ── Row-level mutation ──────────────────────────────────────────────

/// Validated association changes for one update.
pub(crate) struct UpdatePlan {
    added: BTreeSet<TypeAndKey>,
    removed: BTreeSet<TypeAndKey>,
}

impl NetworkState {
    fn insert_row(&mut self, id: TypeAndKey, row: EntityRow) {
        for target in &row.associations {
            if let Some(t) = self.entities.get_mut(target) {
                t.parents.insert(id.clone());
            }
        }
        self.entities.insert(id, row);
    }

    /// Remove a row and every edge touching it, then re-split what is left.
    fn remove_row(&mut self, id: &TypeAndKey) -> Option<EntityRow> {
        let row = self.entities.remove(id)?;
        for target in &row.associations {
            if let Some(t) = self.entities.get_mut(target) {
                t.parents.remove(id);
            }
        }
        for parent in &row.parents {
            if let Some(p) = self.entities.get_mut(parent) {
                p.associations.remove(id);
            }
        }
        let neighbors: Vec<TypeAndKey> = row.neighbors().cloned().collect();
        if !neighbors.is_empty() {
            self.recompute_components(&neighbors, Some(row.graph_id.as_str()));
        }
        Some(row)
    }

    /// Check an update against current state without mutating anything.
    fn plan_update(
        &self,
        network_id: &str,
        id: &TypeAndKey,
        update: &EntityUpdateCriteria,
    ) -> Result<UpdatePlan, CoreError> {
        let row = self
            .entities
            .get(id)
            .ok_or_else(|| entity_not_found(network_id, id))?;

        for target in update.referenced_ids() {
            target.validate()?;
            if target == id {
                return Err(CoreError::invalid(format!("entity {id} cannot associate to itself")));
            }
            if !self.entities.contains_key(target) {
                return Err(entity_not_found(network_id, target));
            }
        }
        for acl in &update.permissions_to_update {
            if !row.permissions.iter().any(|p| p.id == acl.id) {
                return Err(CoreError::PermissionNotFound {
                    entity: id.to_string(),
                    permission_id: acl.id.clone(),
                });
            }
        }
        for acl_id in &update.permissions_to_delete {
            if !row.permissions.iter().any(|p| p.id == *acl_id) {
                return Err(CoreError::PermissionNotFound {
                    entity: id.to_string(),
                    permission_id: acl_id.clone(),
                });
            }
        }

        let mut next = update
            .associations_to_set
            .as_ref()
            .map_or_else(|| row.associations.clone(), |set| set.iter().cloned().collect());
        next.extend(update.associations_to_add.iter().cloned());
        for target in &update.associations_to_delete {
            next.remove(target);
        }

        Ok(UpdatePlan {
            added: next.difference(&row.associations).cloned().collect(),
            removed: row.associations.difference(&next).cloned().collect(),
        })
    }

    /// Apply a planned update. Returns the replaced or cleared physical ID,
    /// if any.
    fn apply_update(
        &mut self,
        id: &TypeAndKey,
        update: EntityUpdateCriteria,
        plan: UpdatePlan,
    ) -> Result<Option<String>, CoreError> {
        let row = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CoreError::Internal(format!("entity {id} vanished mid-update")))?;

        if let Some(name) = update.new_name {
            row.name = name;
        }
        if let Some(description) = update.new_description {
            row.description = description;
        }
        let old_physical_id = match update.new_physical_id {
            Some(PhysicalIdUpdate::Set(pid)) => row.physical_id.replace(pid),
            Some(PhysicalIdUpdate::Clear) => row.physical_id.take(),
            None => None,
        };
        if let Some(config) = update.new_config {
            row.config = Some(config);
        }

        for acl in update.permissions_to_create {
            row.permissions.push(Acl {
                id: fresh_id(),
                version: 0,
                ..acl
            });
        }
        for acl in update.permissions_to_update {
            if let Some(existing) = row.permissions.iter_mut().find(|p| p.id == acl.id) {
                let version = existing.version + 1;
                *existing = Acl { version, ..acl };
            }
        }
        row.permissions
            .retain(|p| !update.permissions_to_delete.contains(&p.id));

        for target in &plan.removed {
            row.associations.remove(target);
        }
        row.associations.extend(plan.added.iter().cloned());
        row.version += 1;
        let label = row.graph_id.clone();

        for target in &plan.removed {
            if let Some(t) = self.entities.get_mut(target) {
                t.parents.remove(id);
            }
        }
        for target in &plan.added {
            if let Some(t) = self.entities.get_mut(target) {
                t.parents.insert(id.clone());
            }
        }

        if !(plan.added.is_empty() && plan.removed.is_empty()) {
            let seeds: Vec<&TypeAndKey> = std::iter::once(id)
                .chain(&plan.added)
                .chain(&plan.removed)
                .collect();
            self.recompute_components(seeds, Some(label.as_str()));
        }
        Ok(old_physical_id)
    }
}
