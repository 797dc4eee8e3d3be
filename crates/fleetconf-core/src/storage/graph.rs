// ── Component maintenance and graph loading ──
//
// GraphIDs are never trusted incrementally. After any association change
// the entities carrying the affected labels are re-partitioned by
// reachability over undirected edges, and labels are handed back out:
// larger components first, each keeping the label most of its members
// already had if no larger component claimed it. Merges therefore keep
// the bigger side's ID, splits leave the old ID on the biggest piece, and
// anything left over gets a fresh ID.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, error};

use super::criteria::EntityLoadCriteria;
use super::memory::{NetworkState, fresh_id};
use crate::error::CoreError;
use crate::model::{EntityGraph, GraphEdge, TypeAndKey};

impl NetworkState {
    /// Entities reachable from `start` in either edge direction, `start`
    /// included. Only ids present in the network are returned.
    pub(crate) fn reachable_from(&self, start: &TypeAndKey) -> BTreeSet<TypeAndKey> {
        let mut visited = BTreeSet::new();
        if !self.entities.contains_key(start) {
            return visited;
        }

        let mut queue = VecDeque::from([start.clone()]);
        visited.insert(start.clone());
        while let Some(current) = queue.pop_front() {
            let Some(row) = self.entities.get(&current) else {
                continue;
            };
            for neighbor in row.neighbors() {
                if self.entities.contains_key(neighbor) && visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor.clone());
                }
            }
        }
        visited
    }

    /// Re-partition every component touched by `seeds` and relabel.
    ///
    /// `prefer` breaks ties between equally common labels within one
    /// component; otherwise the lexically smallest label wins.
    pub(crate) fn recompute_components<'a>(
        &mut self,
        seeds: impl IntoIterator<Item = &'a TypeAndKey>,
        prefer: Option<&str>,
    ) {
        let labels: BTreeSet<String> = seeds
            .into_iter()
            .filter_map(|id| self.entities.get(id))
            .map(|row| row.graph_id.clone())
            .collect();
        if labels.is_empty() {
            return;
        }

        let members: Vec<TypeAndKey> = self
            .entities
            .iter()
            .filter(|(_, row)| labels.contains(&row.graph_id))
            .map(|(id, _)| id.clone())
            .collect();

        let mut components = self.find_connected_components(&members);
        // Largest first; ties by smallest member for determinism.
        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));

        let mut claimed = BTreeSet::new();
        for component in &components {
            let label = self
                .pick_label(component, prefer, &claimed)
                .unwrap_or_else(fresh_id);
            claimed.insert(label.clone());
            for id in component {
                if let Some(row) = self.entities.get_mut(id) {
                    row.graph_id.clone_from(&label);
                }
            }
        }
        debug!(
            components = components.len(),
            entities = members.len(),
            "graph components recomputed"
        );
    }

    /// Partition `members` by undirected reachability. Each component is
    /// returned sorted.
    fn find_connected_components(&self, members: &[TypeAndKey]) -> Vec<Vec<TypeAndKey>> {
        let mut visited: BTreeSet<TypeAndKey> = BTreeSet::new();
        let mut components = Vec::new();
        for id in members {
            if visited.contains(id) {
                continue;
            }
            let component = self.reachable_from(id);
            visited.extend(component.iter().cloned());
            components.push(component.into_iter().collect());
        }
        components
    }

    fn pick_label(
        &self,
        component: &[TypeAndKey],
        prefer: Option<&str>,
        claimed: &BTreeSet<String>,
    ) -> Option<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for id in component {
            if let Some(row) = self.entities.get(id) {
                *counts.entry(row.graph_id.as_str()).or_default() += 1;
            }
        }

        let mut candidates: Vec<(&str, usize)> = counts
            .into_iter()
            .filter(|(label, _)| !label.is_empty() && !claimed.contains(*label))
            .collect();
        candidates.sort_by(|(la, ca), (lb, cb)| {
            cb.cmp(ca)
                .then_with(|| (Some(*lb) == prefer).cmp(&(Some(*la) == prefer)))
                .then_with(|| la.cmp(lb))
        });
        candidates.first().map(|(label, _)| (*label).to_owned())
    }

    /// Materialize the component containing `root`.
    pub(crate) fn load_graph(
        &self,
        root: &TypeAndKey,
        criteria: EntityLoadCriteria,
    ) -> Result<EntityGraph, CoreError> {
        let network_id = self.network.id.as_str();
        if !self.entities.contains_key(root) {
            return Err(CoreError::EntityNotFound {
                network_id: network_id.to_owned(),
                entity: root.to_string(),
            });
        }

        let members = self.reachable_from(root);
        let mut graph = EntityGraph::default();
        let mut graph_ids = BTreeSet::new();
        for id in &members {
            let Some(row) = self.entities.get(id) else {
                continue;
            };
            graph_ids.insert(row.graph_id.as_str());
            if row.parents.is_empty() {
                graph.root_entities.push(id.clone());
            }
            graph.edges.extend(row.associations.iter().map(|to| GraphEdge {
                from: id.clone(),
                to: to.clone(),
            }));
            graph
                .entities
                .push(criteria.apply(row.to_entity(network_id, id)));
        }

        if graph_ids.len() != 1 {
            error!(
                network_id,
                root = %root,
                graph_ids = ?graph_ids,
                "connected component carries more than one graph ID"
            );
            return Err(CoreError::Internal(format!(
                "graph for {root} in network {network_id} is inconsistent"
            )));
        }

        graph.edges.sort();
        Ok(graph)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::Network;
    use crate::storage::memory::EntityRow;

    fn tk(k: &str) -> TypeAndKey {
        TypeAndKey::new("node", k)
    }

    /// Build a network from `(from, to)` edges, each node labelled with
    /// the given graph ID.
    fn state(labels: &[(&str, &str)], edges: &[(&str, &str)]) -> NetworkState {
        let mut entities: BTreeMap<TypeAndKey, EntityRow> = labels
            .iter()
            .map(|(k, g)| {
                (
                    tk(k),
                    EntityRow {
                        graph_id: (*g).to_owned(),
                        ..EntityRow::default()
                    },
                )
            })
            .collect();
        for (from, to) in edges {
            entities.get_mut(&tk(from)).unwrap().associations.insert(tk(to));
            entities.get_mut(&tk(to)).unwrap().parents.insert(tk(from));
        }
        NetworkState {
            network: Network::new("n1"),
            entities,
        }
    }

    fn label(s: &NetworkState, k: &str) -> String {
        s.entities[&tk(k)].graph_id.clone()
    }

    #[test]
    fn merge_keeps_larger_components_label() {
        // a-b (A) joined to c (B) by a new edge b->c
        let mut s = state(&[("a", "A"), ("b", "A"), ("c", "B")], &[("a", "b"), ("b", "c")]);
        s.recompute_components([&tk("b"), &tk("c")], Some("A"));
        assert_eq!(label(&s, "a"), "A");
        assert_eq!(label(&s, "b"), "A");
        assert_eq!(label(&s, "c"), "A");
    }

    #[test]
    fn split_leaves_old_label_on_largest_piece() {
        // a-b-c all labelled A, but the b->c edge is gone
        let mut s = state(&[("a", "A"), ("b", "A"), ("c", "A")], &[("a", "b")]);
        s.recompute_components([&tk("b"), &tk("c")], None);
        assert_eq!(label(&s, "a"), "A");
        assert_eq!(label(&s, "b"), "A");
        assert_ne!(label(&s, "c"), "A");
        assert!(!label(&s, "c").is_empty());
    }

    #[test]
    fn cycle_does_not_split() {
        // a->b->c->a minus nothing: still one component
        let mut s = state(
            &[("a", "A"), ("b", "A"), ("c", "A")],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        );
        s.recompute_components([&tk("a")], None);
        assert_eq!(label(&s, "c"), "A");
    }

    #[test]
    fn load_graph_is_closed_and_sorted() {
        let s = state(
            &[("a", "A"), ("b", "A"), ("c", "A"), ("z", "Z")],
            &[("a", "b"), ("c", "b")],
        );
        let g = s.load_graph(&tk("b"), EntityLoadCriteria::full()).unwrap();
        assert_eq!(g.entities.len(), 3);
        assert!(g.is_closed());
        assert_eq!(g.graph_id(), Some("A"));
        assert_eq!(g.root_entities, vec![tk("a"), tk("c")]);
        assert_eq!(g.edges.len(), 2);
    }

    #[test]
    fn mixed_labels_are_reported() {
        let s = state(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        let err = s.load_graph(&tk("a"), EntityLoadCriteria::full()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn missing_root_is_not_found() {
        let s = state(&[("a", "A")], &[]);
        let err = s.load_graph(&tk("x"), EntityLoadCriteria::full()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
