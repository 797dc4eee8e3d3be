mod cli;
mod commands;
mod error;
mod output;
mod seed;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetconf_config::{Config, LoggingSection};
use fleetconf_core::{MconfigPipeline, MemoryStorage, NorthboundService, SouthboundService};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::Services;
use crate::error::CliError;
use crate::seed::Seed;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Config is loaded first so its [logging] section can shape tracing
    let loaded = load_config(&cli.global);
    init_tracing(cli.global.verbose, loaded.as_ref().ok().map(|c| &c.logging));

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli, loaded).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = commands::config_cmd::resolve_path(global);
    Ok(fleetconf_config::load_config_from(&path)?)
}

fn init_tracing(verbosity: u8, logging: Option<&LoggingSection>) {
    let filter = match verbosity {
        0 => logging.map_or("warn", |l| l.level.as_str()),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.is_some_and(|l| l.json) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, loaded: Result<Config, CliError>) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a store
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global, loaded),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fleetconf", &mut std::io::stdout());
            Ok(())
        }

        // All other commands run against a seeded store
        cmd => {
            let services = build_services(&cli.global, &loaded?).await?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &services, &cli.global).await
        }
    }
}

/// Wire storage, seed, pipeline and both services from the loaded config.
async fn build_services(global: &GlobalOpts, config: &Config) -> Result<Services, CliError> {
    let service_config = fleetconf_config::to_service_config(config)?;

    let storage = Arc::new(MemoryStorage::new());
    let northbound = NorthboundService::new(storage.clone());
    if let Some(ref path) = global.seed {
        Seed::from_path(path)?.apply(&northbound).await?;
    }

    let pipeline = MconfigPipeline::from_config(&service_config)?;
    let southbound = SouthboundService::new(
        storage,
        Arc::new(pipeline),
        service_config.gateway_entity_type.clone(),
    );

    Ok(Services {
        northbound,
        southbound,
    })
}
