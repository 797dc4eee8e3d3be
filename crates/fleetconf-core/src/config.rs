// ── Runtime service configuration ──
//
// Describes how the services are wired: which entity type identifies a
// gateway, which builders exist and how long each may take. Built by the
// CLI (via `fleetconf-config`) and handed in; core never reads files.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_GATEWAY_ENTITY_TYPE: &str = "magmad_gateway";
pub const DEFAULT_REGISTRY_LABEL: &str = "mconfig_builder";
pub const DEFAULT_BUILDER_TIMEOUT: Duration = Duration::from_secs(5);

/// A remote builder endpoint as published by the discovery registry.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub name: String,
    pub url: Url,
    /// Capability labels; only endpoints carrying the registry's label
    /// are used as builders.
    pub labels: Vec<String>,
    pub auth_token: Option<SecretString>,
}

impl ServiceEndpoint {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            labels: Vec::new(),
            auth_token: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// In-process builders that need no schema knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinBuilderSpec {
    /// Emit the network config blob of `config_type` under `section`.
    NetworkConfig {
        name: String,
        section: String,
        config_type: String,
    },
    /// Collect configs of every `entity_type` entity in the graph under
    /// `section`, as a JSON object keyed by entity key.
    EntityConfig {
        name: String,
        section: String,
        entity_type: String,
    },
}

impl BuiltinBuilderSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::NetworkConfig { name, .. } | Self::EntityConfig { name, .. } => name,
        }
    }
}

/// How the built-in builders read blobs of one config type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    #[default]
    Json,
    Raw,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Entity type a southbound caller's logical ID refers to.
    pub gateway_entity_type: String,
    /// Per-builder deadline for one composition.
    pub builder_timeout: Duration,
    /// Capability label remote builders must carry.
    pub registry_label: String,
    pub services: Vec<ServiceEndpoint>,
    pub builtin_builders: Vec<BuiltinBuilderSpec>,
    /// Per config type codec; unlisted types are JSON.
    pub codecs: BTreeMap<String, CodecKind>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gateway_entity_type: DEFAULT_GATEWAY_ENTITY_TYPE.into(),
            builder_timeout: DEFAULT_BUILDER_TIMEOUT,
            registry_label: DEFAULT_REGISTRY_LABEL.into(),
            services: Vec::new(),
            builtin_builders: Vec::new(),
            codecs: BTreeMap::new(),
        }
    }
}
