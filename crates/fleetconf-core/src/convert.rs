// ── Domain -> wire conversions ──
//
// Remote builders receive the same network and graph the southbound
// service loaded, flattened into `fleetconf_api` DTOs. Permissions are
// not sent.

use fleetconf_api::{Blob, WireEdge, WireEntity, WireEntityId, WireGraph, WireNetwork};

use crate::model::{EntityGraph, GraphEdge, Network, NetworkEntity, TypeAndKey};

impl From<&TypeAndKey> for WireEntityId {
    fn from(id: &TypeAndKey) -> Self {
        Self {
            entity_type: id.entity_type.clone(),
            key: id.key.clone(),
        }
    }
}

impl From<WireEntityId> for TypeAndKey {
    fn from(id: WireEntityId) -> Self {
        Self::new(id.entity_type, id.key)
    }
}

impl From<&Network> for WireNetwork {
    fn from(n: &Network) -> Self {
        Self {
            id: n.id.clone(),
            name: n.name.clone(),
            description: n.description.clone(),
            network_type: n.network_type.clone(),
            configs: n
                .configs
                .iter()
                .map(|(k, v)| (k.clone(), Blob::from(v.as_slice())))
                .collect(),
            version: n.version,
        }
    }
}

impl From<&NetworkEntity> for WireEntity {
    fn from(e: &NetworkEntity) -> Self {
        Self {
            network_id: e.network_id.clone(),
            entity_type: e.entity_type.clone(),
            key: e.key.clone(),
            name: e.name.clone(),
            description: e.description.clone(),
            physical_id: e.physical_id.clone(),
            config: e.config.as_deref().map(Blob::from),
            graph_id: e.graph_id.clone(),
            associations: e.associations.iter().map(WireEntityId::from).collect(),
            parent_associations: e
                .parent_associations
                .iter()
                .map(WireEntityId::from)
                .collect(),
            version: e.version,
        }
    }
}

impl From<&GraphEdge> for WireEdge {
    fn from(e: &GraphEdge) -> Self {
        Self {
            from: (&e.from).into(),
            to: (&e.to).into(),
        }
    }
}

impl From<&EntityGraph> for WireGraph {
    fn from(g: &EntityGraph) -> Self {
        Self {
            entities: g.entities.iter().map(WireEntity::from).collect(),
            root_entities: g.root_entities.iter().map(WireEntityId::from).collect(),
            edges: g.edges.iter().map(WireEdge::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn graph_flattens_to_wire() {
        let enb = TypeAndKey::new("enodeb", "enb1");
        let mut gw = NetworkEntity::new("cellular_gateway", "g1").with_association(enb.clone());
        gw.network_id = "n1".into();
        let graph = EntityGraph {
            entities: vec![
                gw,
                NetworkEntity::new("enodeb", "enb1").with_config(b"{}".to_vec()),
            ],
            root_entities: vec![TypeAndKey::new("cellular_gateway", "g1")],
            edges: vec![GraphEdge {
                from: TypeAndKey::new("cellular_gateway", "g1"),
                to: enb,
            }],
        };

        let wire = WireGraph::from(&graph);
        assert_eq!(wire.entities.len(), 2);
        assert_eq!(wire.entities[0].associations[0].key, "enb1");
        assert_eq!(wire.entities[1].config.as_ref().unwrap().as_bytes(), b"{}");
        assert_eq!(wire.edges[0].to.entity_type, "enodeb");
        assert_eq!(TypeAndKey::from(wire.root_entities[0].clone()).key, "g1");
    }

    #[test]
    fn network_configs_are_copied() {
        let net = Network::new("n1").with_config("cellular_network", b"x".to_vec());
        let wire = WireNetwork::from(&net);
        assert_eq!(wire.configs["cellular_network"].as_bytes(), b"x");
    }
}
