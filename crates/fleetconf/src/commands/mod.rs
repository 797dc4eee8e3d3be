//! Command dispatch: bridges CLI args -> core services -> output formatting.

pub mod config_cmd;
pub mod entities;
pub mod graph;
pub mod mconfig;
pub mod networks;

use fleetconf_core::{NorthboundService, SouthboundService};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Both service faces over one seeded store.
pub struct Services {
    pub northbound: NorthboundService,
    pub southbound: SouthboundService,
}

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, services: &Services, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Networks(args) => networks::handle(&services.northbound, args, global).await,
        Command::Entities(args) => entities::handle(&services.northbound, args, global).await,
        Command::Graph(args) => graph::handle(&services.northbound, args, global).await,
        Command::Mconfig(args) => mconfig::handle(&services.southbound, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
