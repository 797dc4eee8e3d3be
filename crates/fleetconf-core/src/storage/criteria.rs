// ── Filters, load criteria and update criteria ──
//
// Load criteria let hot paths skip fields they do not need; update
// criteria describe a partial mutation of one row. Every `Option` field
// in an update means "leave unchanged" when `None`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{Acl, Network, NetworkEntity, TypeAndKey};

// ── Networks ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkLoadFilter {
    /// Restrict to these IDs when non-empty.
    pub ids: Vec<String>,
    pub network_type: Option<String>,
}

impl NetworkLoadFilter {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            network_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkLoadCriteria {
    pub load_metadata: bool,
    pub load_configs: bool,
}

impl NetworkLoadCriteria {
    pub fn full() -> Self {
        Self {
            load_metadata: true,
            load_configs: true,
        }
    }
}

impl Default for NetworkLoadCriteria {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkLoadResult {
    pub networks: Vec<Network>,
    pub networks_not_found: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUpdateCriteria {
    pub id: String,
    #[serde(default)]
    pub delete_network: bool,
    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub new_description: Option<String>,
    #[serde(default)]
    pub new_type: Option<String>,
    #[serde(default, with = "crate::model::blob::map")]
    pub configs_to_add_or_update: BTreeMap<String, Vec<u8>>,
    #[serde(default)]
    pub configs_to_delete: Vec<String>,
}

impl NetworkUpdateCriteria {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            delete_network: true,
            ..Self::new(id)
        }
    }
}

// ── Entities ────────────────────────────────────────────────────────

/// Conjunctive entity filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityLoadFilter {
    pub type_filter: Option<String>,
    pub key_filter: Option<String>,
    /// Restrict to these IDs when non-empty; absent ones are reported.
    pub ids: Vec<TypeAndKey>,
    pub physical_id: Option<String>,
    pub graph_id: Option<String>,
}

impl EntityLoadFilter {
    pub fn of_type(entity_type: impl Into<String>) -> Self {
        Self {
            type_filter: Some(entity_type.into()),
            ..Self::default()
        }
    }

    pub fn ids(ids: impl IntoIterator<Item = TypeAndKey>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, entity: &NetworkEntity) -> bool {
        self.type_filter
            .as_deref()
            .is_none_or(|t| t == entity.entity_type)
            && self.key_filter.as_deref().is_none_or(|k| k == entity.key)
            && self
                .physical_id
                .as_deref()
                .is_none_or(|p| entity.physical_id.as_deref() == Some(p))
            && self.graph_id.as_deref().is_none_or(|g| g == entity.graph_id)
    }
}

/// Which optional parts of an entity to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EntityLoadCriteria {
    pub load_metadata: bool,
    pub load_config: bool,
    pub load_assocs_to_this: bool,
    pub load_assocs_from_this: bool,
    pub load_permissions: bool,
}

impl EntityLoadCriteria {
    pub fn full() -> Self {
        Self {
            load_metadata: true,
            load_config: true,
            load_assocs_to_this: true,
            load_assocs_from_this: true,
            load_permissions: true,
        }
    }

    /// Strip the fields not requested.
    pub(crate) fn apply(self, mut entity: NetworkEntity) -> NetworkEntity {
        if !self.load_metadata {
            entity.name.clear();
            entity.description.clear();
        }
        if !self.load_config {
            entity.config = None;
        }
        if !self.load_assocs_from_this {
            entity.associations.clear();
        }
        if !self.load_assocs_to_this {
            entity.parent_associations.clear();
        }
        if !self.load_permissions {
            entity.permissions.clear();
        }
        entity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityLoadResult {
    pub entities: Vec<NetworkEntity>,
    pub entities_not_found: Vec<TypeAndKey>,
}

/// Change to an entity's physical ID. Serialized as `{"set": "<id>"}` or
/// `"clear"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalIdUpdate {
    Set(String),
    Clear,
}

/// Partial mutation of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdateCriteria {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,

    #[serde(default)]
    pub delete_entity: bool,

    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub new_description: Option<String>,
    #[serde(default)]
    pub new_physical_id: Option<PhysicalIdUpdate>,
    #[serde(default, with = "crate::model::blob::option")]
    pub new_config: Option<Vec<u8>>,

    /// Replaces all outgoing associations when `Some`.
    #[serde(default)]
    pub associations_to_set: Option<Vec<TypeAndKey>>,
    #[serde(default)]
    pub associations_to_add: Vec<TypeAndKey>,
    #[serde(default)]
    pub associations_to_delete: Vec<TypeAndKey>,

    #[serde(default)]
    pub permissions_to_create: Vec<Acl>,
    #[serde(default)]
    pub permissions_to_update: Vec<Acl>,
    #[serde(default)]
    pub permissions_to_delete: Vec<String>,
}

impl EntityUpdateCriteria {
    pub fn new(id: &TypeAndKey) -> Self {
        Self {
            entity_type: id.entity_type.clone(),
            key: id.key.clone(),
            ..Self::default()
        }
    }

    pub fn delete(id: &TypeAndKey) -> Self {
        Self {
            delete_entity: true,
            ..Self::new(id)
        }
    }

    pub fn type_and_key(&self) -> TypeAndKey {
        TypeAndKey::new(self.entity_type.clone(), self.key.clone())
    }

    /// Every association target this update would reference.
    pub(crate) fn referenced_ids(&self) -> BTreeSet<&TypeAndKey> {
        self.associations_to_set
            .iter()
            .flatten()
            .chain(&self.associations_to_add)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_conjunctive() {
        let mut e = NetworkEntity::new("enodeb", "enb1").with_physical_id("hw1");
        e.graph_id = "gid".into();

        assert!(EntityLoadFilter::default().matches(&e));
        assert!(EntityLoadFilter::of_type("enodeb").matches(&e));
        assert!(!EntityLoadFilter::of_type("cellular_gateway").matches(&e));

        let f = EntityLoadFilter {
            type_filter: Some("enodeb".into()),
            physical_id: Some("hw2".into()),
            ..EntityLoadFilter::default()
        };
        assert!(!f.matches(&e));

        let f = EntityLoadFilter {
            graph_id: Some("gid".into()),
            key_filter: Some("enb1".into()),
            ..EntityLoadFilter::default()
        };
        assert!(f.matches(&e));
    }

    #[test]
    fn criteria_strips_unrequested_fields() {
        let e = NetworkEntity::new("enodeb", "enb1")
            .with_name("radio")
            .with_config(b"{}".to_vec())
            .with_association(TypeAndKey::new("x", "y"));

        let stripped = EntityLoadCriteria::default().apply(e.clone());
        assert!(stripped.name.is_empty());
        assert!(stripped.config.is_none());
        assert!(stripped.associations.is_empty());

        assert_eq!(EntityLoadCriteria::full().apply(e.clone()), e);
    }

    #[test]
    fn update_criteria_deserializes_with_defaults() {
        let update: EntityUpdateCriteria = serde_json::from_value(serde_json::json!({
            "type": "enodeb",
            "key": "enb1",
            "new_config": "e30="
        }))
        .unwrap();
        assert_eq!(update.new_config.as_deref(), Some(&b"{}"[..]));
        assert!(update.associations_to_set.is_none());
        assert!(update.new_physical_id.is_none());
        assert!(!update.delete_entity);
    }

    #[test]
    fn physical_id_update_forms() {
        let set: EntityUpdateCriteria = serde_json::from_value(serde_json::json!({
            "type": "magmad_gateway",
            "key": "g1",
            "new_physical_id": { "set": "hw-2" }
        }))
        .unwrap();
        assert_eq!(set.new_physical_id, Some(PhysicalIdUpdate::Set("hw-2".into())));

        let clear: EntityUpdateCriteria = serde_json::from_value(serde_json::json!({
            "type": "magmad_gateway",
            "key": "g1",
            "new_physical_id": "clear"
        }))
        .unwrap();
        assert_eq!(clear.new_physical_id, Some(PhysicalIdUpdate::Clear));
    }
}
