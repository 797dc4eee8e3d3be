// ── Wire types for the Build call ──
//
// JSON shapes exchanged with remote builders. These mirror the domain
// model in `fleetconf-core` but stay deliberately flat: no permissions,
// no load criteria, just what a builder needs to render its section.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Blob ────────────────────────────────────────────────────────────

/// Opaque config bytes, carried as a standard base64 string on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BlobVisitor;

        impl Visitor<'_> for BlobVisitor {
            type Value = Blob;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a base64-encoded string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Blob, E> {
                STANDARD.decode(v).map(Blob).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(BlobVisitor)
    }
}

// ── Graph payload ───────────────────────────────────────────────────

/// `(type, key)` pair identifying an entity within a network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WireEntityId {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireNetwork {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(default)]
    pub configs: BTreeMap<String, Blob>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntity {
    pub network_id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Blob>,
    #[serde(default)]
    pub graph_id: String,
    #[serde(default)]
    pub associations: Vec<WireEntityId>,
    #[serde(default)]
    pub parent_associations: Vec<WireEntityId>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEdge {
    pub from: WireEntityId,
    pub to: WireEntityId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGraph {
    #[serde(default)]
    pub entities: Vec<WireEntity>,
    #[serde(default)]
    pub root_entities: Vec<WireEntityId>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
}

// ── Build call ──────────────────────────────────────────────────────

/// Body of `POST {endpoint}/v1/build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub network: WireNetwork,
    pub graph: WireGraph,
    pub gateway_id: String,
}

/// Successful build response: top-level section name to encoded config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResponse {
    #[serde(default)]
    pub configs_by_key: BTreeMap<String, Blob>,
}

/// Error body returned by builders on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
