//! Network command handlers.

use std::fmt::Write;

use tabled::Tabled;

use fleetconf_core::{Network, NetworkLoadCriteria, NetworkLoadFilter, NorthboundService};

use crate::cli::{GlobalOpts, NetworksArgs, NetworksCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    network_type: String,
    #[tabled(rename = "Configs")]
    configs: String,
    #[tabled(rename = "Version")]
    version: u64,
}

impl From<&Network> for NetworkRow {
    fn from(n: &Network) -> Self {
        Self {
            id: n.id.clone(),
            name: n.name.clone(),
            network_type: n.network_type.clone().unwrap_or_default(),
            configs: n.configs.keys().cloned().collect::<Vec<_>>().join(", "),
            version: n.version,
        }
    }
}

fn detail(n: &Network) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:          {}", n.id);
    let _ = writeln!(out, "Name:        {}", n.name);
    let _ = writeln!(out, "Description: {}", n.description);
    let _ = writeln!(out, "Type:        {}", n.network_type.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Version:     {}", n.version);
    if !n.configs.is_empty() {
        let _ = writeln!(out, "Configs:");
        for (config_type, blob) in &n.configs {
            let _ = writeln!(out, "  {config_type}: {}", output::blob_preview(blob, 60));
        }
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    northbound: &NorthboundService,
    args: NetworksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NetworksCommand::List { network_type } => {
            let filter = NetworkLoadFilter {
                network_type,
                ..NetworkLoadFilter::default()
            };
            let loaded = northbound
                .load_networks(filter, NetworkLoadCriteria::full())
                .await?;
            let out = output::render_list(
                &global.output,
                &loaded.networks,
                |n| NetworkRow::from(n),
                |n| n.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NetworksCommand::Get { id } => {
            let network = northbound
                .load_network(&id, NetworkLoadCriteria::full())
                .await?;
            let out = output::render_single(&global.output, &network, detail, |n| n.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
