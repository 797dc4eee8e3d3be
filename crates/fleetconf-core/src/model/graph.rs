// ── Entity graph ──
//
// Snapshot of one connected component. Entities and edges are kept
// sorted so two loads of the same component compare equal and encode
// identically.

use serde::{Deserialize, Serialize};

use super::entity::NetworkEntity;
use super::entity_id::TypeAndKey;

/// Directed edge derived from an entity's `associations`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: TypeAndKey,
    pub to: TypeAndKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGraph {
    pub entities: Vec<NetworkEntity>,
    /// Entities with no parents.
    pub root_entities: Vec<TypeAndKey>,
    pub edges: Vec<GraphEdge>,
}

impl EntityGraph {
    pub fn get_entity(&self, id: &TypeAndKey) -> Option<&NetworkEntity> {
        self.entities
            .binary_search_by(|e| {
                (e.entity_type.as_str(), e.key.as_str())
                    .cmp(&(id.entity_type.as_str(), id.key.as_str()))
            })
            .ok()
            .and_then(|i| self.entities.get(i))
    }

    pub fn contains(&self, id: &TypeAndKey) -> bool {
        self.get_entity(id).is_some()
    }

    pub fn entities_of_type<'a>(
        &'a self,
        entity_type: &'a str,
    ) -> impl Iterator<Item = &'a NetworkEntity> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }

    /// Shared graph ID, or `None` if the graph is empty or mixed.
    pub fn graph_id(&self) -> Option<&str> {
        let first = self.entities.first()?.graph_id.as_str();
        self.entities
            .iter()
            .all(|e| e.graph_id == first)
            .then_some(first)
    }

    /// Whether every edge endpoint is part of this graph.
    pub fn is_closed(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.contains(&e.from) && self.contains(&e.to))
    }
}
