// ── Network ──
//
// Tenant-scoped root of an entity graph. Configs are opaque blobs keyed
// by config-type name; the store never inspects them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(default, with = "super::blob::map")]
    pub configs: BTreeMap<String, Vec<u8>>,
    #[serde(default)]
    pub version: u64,
}

impl Network {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, network_type: impl Into<String>) -> Self {
        self.network_type = Some(network_type.into());
        self
    }

    pub fn with_config(mut self, config_type: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        self.configs.insert(config_type.into(), blob.into());
        self
    }

    pub fn config(&self, config_type: &str) -> Option<&[u8]> {
        self.configs.get(config_type).map(Vec::as_slice)
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::invalid("network ID must not be empty"));
        }
        if self.configs.keys().any(|k| k.trim().is_empty()) {
            return Err(CoreError::invalid(format!(
                "network {} has a config with an empty type",
                self.id
            )));
        }
        Ok(())
    }
}
