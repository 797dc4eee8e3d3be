// ── Network entities and permissions ──
//
// A `NetworkEntity` is one node of a network's graph. `associations` are
// the outgoing edges as written by operators; `parent_associations` is
// the reverse index maintained by the store and never written directly.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::TypeAndKey;
use crate::error::CoreError;

// ── NetworkEntity ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntity {
    pub network_id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,

    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// External hardware identifier, unique system-wide when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_id: Option<String>,
    #[serde(
        default,
        with = "super::blob::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub config: Option<Vec<u8>>,

    /// Connected-component label; assigned by the store.
    #[serde(default)]
    pub graph_id: String,
    #[serde(default)]
    pub associations: Vec<TypeAndKey>,
    #[serde(default)]
    pub parent_associations: Vec<TypeAndKey>,
    #[serde(default)]
    pub permissions: Vec<Acl>,

    #[serde(default)]
    pub version: u64,
}

impl NetworkEntity {
    pub fn new(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_physical_id(mut self, physical_id: impl Into<String>) -> Self {
        self.physical_id = Some(physical_id.into());
        self
    }

    pub fn with_config(mut self, config: impl Into<Vec<u8>>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn with_association(mut self, to: TypeAndKey) -> Self {
        self.associations.push(to);
        self
    }

    pub fn type_and_key(&self) -> TypeAndKey {
        TypeAndKey::new(self.entity_type.clone(), self.key.clone())
    }

    /// Shape checks that need no storage access.
    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        let id = self.type_and_key();
        id.validate()?;
        if let Some(pid) = &self.physical_id {
            if pid.trim().is_empty() {
                return Err(CoreError::invalid(format!(
                    "entity {id} has an empty physical ID"
                )));
            }
        }
        for assoc in &self.associations {
            assoc.validate()?;
        }
        Ok(())
    }
}

// ── ACLs ────────────────────────────────────────────────────────────

/// Which networks an ACL applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclScope {
    Wildcard,
    NetworkIds(Vec<String>),
}

/// Which entity types an ACL applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclType {
    Wildcard,
    EntityType(String),
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AclPermission {
    #[default]
    NoPermission,
    Read,
    Write,
}

/// One permission entry attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    /// Assigned by the store on create; ignored on input.
    #[serde(default)]
    pub id: String,
    pub scope: AclScope,
    pub permission: AclPermission,
    #[serde(rename = "type")]
    pub acl_type: AclType,
    /// Restricts the ACL to specific entity keys when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub id_filter: Vec<String>,
    #[serde(default)]
    pub version: u64,
}

impl Acl {
    pub fn new(scope: AclScope, acl_type: AclType, permission: AclPermission) -> Self {
        Self {
            id: String::new(),
            scope,
            permission,
            acl_type,
            id_filter: Vec::new(),
            version: 0,
        }
    }
}
