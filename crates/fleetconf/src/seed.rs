//! Seed files: the networks and entities the in-memory store starts with.
//!
//! Configs are written inline as YAML/JSON values and stored as their JSON
//! encoding. Associations accept either `type:key` strings or
//! `{type, key}` maps. `writes` are raw write operations (blobs base64)
//! applied after `entities`, in order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use fleetconf_core::{EntityWriteOperation, Network, NetworkEntity, NorthboundService, TypeAndKey};

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub networks: Vec<SeedNetwork>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedNetwork {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub network_type: Option<String>,
    #[serde(default)]
    pub configs: BTreeMap<String, Value>,
    #[serde(default)]
    pub entities: Vec<SeedEntity>,
    #[serde(default)]
    pub writes: Vec<EntityWriteOperation>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub physical_id: Option<String>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub associations: Vec<SeedRef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeedRef {
    Text(String),
    Id(TypeAndKey),
}

impl SeedRef {
    fn resolve(&self) -> Result<TypeAndKey, String> {
        match self {
            Self::Text(raw) => raw
                .parse()
                .map_err(|e| format!("association '{raw}': {e}")),
            Self::Id(id) => Ok(id.clone()),
        }
    }
}

/// What a seed put into the store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub networks: usize,
    pub writes: usize,
}

impl Seed {
    /// Parse by extension: `.json` as JSON, everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let seed_err = |reason: String| CliError::Seed {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| seed_err(e.to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&raw).map_err(|e| seed_err(e.to_string()))
        } else {
            serde_yaml::from_str(&raw).map_err(|e| seed_err(e.to_string()))
        }
    }

    /// Create every network, then its entities in one batch, then its
    /// extra writes in a second batch.
    pub async fn apply(self, northbound: &NorthboundService) -> Result<SeedSummary, CliError> {
        let mut summary = SeedSummary::default();
        for seed in self.networks {
            let network_id = seed.id.clone();
            let (network, entities, writes) = seed.into_parts()?;
            northbound.create_network(network).await?;
            summary.networks += 1;

            if !entities.is_empty() {
                summary.writes += entities.len();
                northbound.create_entities(&network_id, entities).await?;
            }
            if !writes.is_empty() {
                summary.writes += writes.len();
                northbound.write_entities(&network_id, writes).await?;
            }
        }
        info!(
            networks = summary.networks,
            writes = summary.writes,
            "seed applied"
        );
        Ok(summary)
    }
}

impl SeedNetwork {
    fn into_parts(
        self,
    ) -> Result<(Network, Vec<NetworkEntity>, Vec<EntityWriteOperation>), CliError> {
        let invalid = |reason: String| CliError::InvalidArgument {
            message: format!("seed network '{}': {reason}", self.id),
        };

        let mut network = Network::new(self.id.clone())
            .with_name(self.name.clone());
        network.description.clone_from(&self.description);
        network.network_type.clone_from(&self.network_type);
        for (config_type, value) in &self.configs {
            network = network.with_config(config_type.clone(), encode(value).map_err(invalid)?);
        }

        let entities = self
            .entities
            .iter()
            .map(|e| e.to_entity().map_err(invalid))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((network, entities, self.writes))
    }
}

impl SeedEntity {
    fn to_entity(&self) -> Result<NetworkEntity, String> {
        let mut entity =
            NetworkEntity::new(self.entity_type.clone(), self.key.clone()).with_name(self.name.clone());
        entity.description.clone_from(&self.description);
        entity.physical_id.clone_from(&self.physical_id);
        if let Some(ref config) = self.config {
            entity = entity.with_config(encode(config)?);
        }
        for assoc in &self.associations {
            entity = entity.with_association(assoc.resolve()?);
        }
        Ok(entity)
    }
}

fn encode(value: &Value) -> Result<Vec<u8>, String> {
    serde_json::to_vec(value).map_err(|e| e.to_string())
}
