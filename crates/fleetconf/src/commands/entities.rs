//! Entity command handlers.

use std::fmt::Write;

use tabled::Tabled;

use fleetconf_core::{EntityLoadCriteria, EntityLoadFilter, NetworkEntity, NorthboundService};

use crate::cli::{EntitiesArgs, EntitiesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct EntityRow {
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Physical ID")]
    physical_id: String,
    #[tabled(rename = "Graph")]
    graph_id: String,
    #[tabled(rename = "Assocs")]
    associations: String,
    #[tabled(rename = "Version")]
    version: u64,
}

impl From<&NetworkEntity> for EntityRow {
    fn from(e: &NetworkEntity) -> Self {
        Self {
            entity_type: e.entity_type.clone(),
            key: e.key.clone(),
            name: e.name.clone(),
            physical_id: e.physical_id.clone().unwrap_or_default(),
            graph_id: e.graph_id.clone(),
            associations: e
                .associations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            version: e.version,
        }
    }
}

fn detail(e: &NetworkEntity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Network:     {}", e.network_id);
    let _ = writeln!(out, "Entity:      {}", e.type_and_key());
    let _ = writeln!(out, "Name:        {}", e.name);
    let _ = writeln!(out, "Physical ID: {}", e.physical_id.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Graph:       {}", e.graph_id);
    let _ = writeln!(out, "Version:     {}", e.version);
    if let Some(ref config) = e.config {
        let _ = writeln!(out, "Config:      {}", output::blob_preview(config, 60));
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    northbound: &NorthboundService,
    args: EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        EntitiesCommand::List {
            network,
            entity_type,
        } => {
            let filter = entity_type.map(EntityLoadFilter::of_type).unwrap_or_default();
            let loaded = northbound
                .load_entities(&network, filter, EntityLoadCriteria::full())
                .await?;
            let out = output::render_list(
                &global.output,
                &loaded.entities,
                |e| EntityRow::from(e),
                |e| e.type_and_key().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EntitiesCommand::Lookup { hardware_id } => {
            let entity = northbound
                .load_entity_for_physical_id(&hardware_id, EntityLoadCriteria::full())
                .await?;
            let out = output::render_single(&global.output, &entity, detail, |e| {
                format!("{}/{}", e.network_id, e.type_and_key())
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
