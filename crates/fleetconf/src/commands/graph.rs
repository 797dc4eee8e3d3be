//! Graph command handler.

use std::fmt::Write;

use fleetconf_core::{EntityGraph, EntityLoadCriteria, NorthboundService, TypeAndKey};

use crate::cli::{GlobalOpts, GraphArgs};
use crate::error::CliError;
use crate::output;

use super::entities::EntityRow;

fn detail(graph: &EntityGraph) -> String {
    let rows: Vec<EntityRow> = graph.entities.iter().map(EntityRow::from).collect();
    let mut out = String::new();
    let _ = writeln!(out, "Graph: {}", graph.graph_id().unwrap_or("-"));
    let _ = writeln!(
        out,
        "Roots: {}",
        graph
            .root_entities
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    let _ = writeln!(out, "{}", output::render_table(&rows));
    if !graph.edges.is_empty() {
        let _ = writeln!(out, "Edges:");
        for edge in &graph.edges {
            let _ = writeln!(out, "  {} -> {}", edge.from, edge.to);
        }
    }
    out.trim_end().to_owned()
}

fn edge_lines(graph: &EntityGraph) -> String {
    graph
        .edges
        .iter()
        .map(|e| format!("{} {}", e.from, e.to))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn handle(
    northbound: &NorthboundService,
    args: GraphArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let root = TypeAndKey::new(args.entity_type, args.key);
    let graph = northbound
        .load_graph_for_entity(&args.network, &root, EntityLoadCriteria::full())
        .await?;
    let out = output::render_single(&global.output, &graph, detail, edge_lines)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
