// ── Built-in builders ──
//
// Two schema-free builders that cover the common cases: copy one network
// config into a section, or gather the configs of one entity type from
// the gateway's graph.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::builder::{ConfigsByKey, MconfigBuilder};
use crate::codec::CodecRegistry;
use crate::config::BuiltinBuilderSpec;
use crate::error::CoreError;
use crate::model::{EntityGraph, Network};

/// Instantiate a configured built-in builder.
pub fn from_spec(spec: &BuiltinBuilderSpec, codecs: &Arc<CodecRegistry>) -> Arc<dyn MconfigBuilder> {
    match spec {
        BuiltinBuilderSpec::NetworkConfig {
            name,
            section,
            config_type,
        } => Arc::new(NetworkConfigBuilder::new(name, section, config_type)),
        BuiltinBuilderSpec::EntityConfig {
            name,
            section,
            entity_type,
        } => Arc::new(EntityConfigBuilder::new(
            name,
            section,
            entity_type,
            Arc::clone(codecs),
        )),
    }
}

// ── NetworkConfigBuilder ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    name: String,
    section: String,
    config_type: String,
}

impl NetworkConfigBuilder {
    pub fn new(
        name: impl Into<String>,
        section: impl Into<String>,
        config_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            config_type: config_type.into(),
        }
    }
}

#[async_trait]
impl MconfigBuilder for NetworkConfigBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn build(
        &self,
        network: &Network,
        _graph: &EntityGraph,
        _gateway_id: &str,
    ) -> Result<ConfigsByKey, CoreError> {
        Ok(network
            .config(&self.config_type)
            .map(|blob| ConfigsByKey::from([(self.section.clone(), blob.to_vec())]))
            .unwrap_or_default())
    }
}

// ── EntityConfigBuilder ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EntityConfigBuilder {
    name: String,
    section: String,
    entity_type: String,
    codecs: Arc<CodecRegistry>,
}

impl EntityConfigBuilder {
    pub fn new(
        name: impl Into<String>,
        section: impl Into<String>,
        entity_type: impl Into<String>,
        codecs: Arc<CodecRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            entity_type: entity_type.into(),
            codecs,
        }
    }
}

#[async_trait]
impl MconfigBuilder for EntityConfigBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn build(
        &self,
        _network: &Network,
        graph: &EntityGraph,
        _gateway_id: &str,
    ) -> Result<ConfigsByKey, CoreError> {
        let mut by_key = Map::new();
        for entity in graph.entities_of_type(&self.entity_type) {
            let Some(config) = &entity.config else {
                continue;
            };
            let value = self.codecs.decode(&self.entity_type, config).map_err(|e| {
                CoreError::BuilderFailed {
                    builder: self.name.clone(),
                    message: format!("{}: {e}", entity.type_and_key()),
                }
            })?;
            by_key.insert(entity.key.clone(), value);
        }

        if by_key.is_empty() {
            return Ok(ConfigsByKey::new());
        }
        let encoded = serde_json::to_vec(&Value::Object(by_key))
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        Ok(ConfigsByKey::from([(self.section.clone(), encoded)]))
    }
}
