// ── Domain model ──
//
// Networks, entities, permissions and the materialized component graph.
// Configs are opaque bytes everywhere in this module.

pub mod blob;
pub mod entity;
pub mod entity_id;
pub mod graph;
pub mod network;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity::{Acl, AclPermission, AclScope, AclType, NetworkEntity};
pub use entity_id::TypeAndKey;
pub use graph::{EntityGraph, GraphEdge};
pub use network::Network;
