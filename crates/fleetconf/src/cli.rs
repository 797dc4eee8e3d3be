//! Clap derive structures for the `fleetconf` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetconf -- inspect entity graphs and compose gateway mconfigs
#[derive(Debug, Parser)]
#[command(
    name = "fleetconf",
    version,
    about = "Inspect fleet entity graphs and compose gateway mconfigs",
    long_about = "Loads networks and entities from a seed file into an in-memory\n\
        store, then lists them, walks entity graphs, or runs the mconfig\n\
        builder pipeline exactly as a gateway check-in would.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FLEETCONF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Seed file of networks and entities (YAML or JSON)
    #[arg(long, short = 's', env = "FLEETCONF_SEED", global = true)]
    pub seed: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETCONF_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect networks
    #[command(alias = "net", alias = "n")]
    Networks(NetworksArgs),

    /// List entities of a network
    #[command(alias = "ent", alias = "e")]
    Entities(EntitiesArgs),

    /// Show the connected graph containing an entity
    #[command(alias = "g")]
    Graph(GraphArgs),

    /// Compose the mconfig bundle for a gateway
    #[command(alias = "mc")]
    Mconfig(MconfigArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Networks ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NetworksArgs {
    #[command(subcommand)]
    pub command: NetworksCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworksCommand {
    /// List all networks
    #[command(alias = "ls")]
    List {
        /// Only networks of this type
        #[arg(long = "type", short = 't')]
        network_type: Option<String>,
    },

    /// Show one network including its configs
    Get {
        #[arg(value_name = "NETWORK_ID")]
        id: String,
    },
}

// ── Entities ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    #[command(subcommand)]
    pub command: EntitiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntitiesCommand {
    /// List entities in a network
    #[command(alias = "ls")]
    List {
        /// Network ID
        #[arg(long, short = 'n')]
        network: String,

        /// Only entities of this type
        #[arg(long = "type", short = 't')]
        entity_type: Option<String>,
    },

    /// Find the entity bound to a hardware ID
    Lookup {
        #[arg(value_name = "HARDWARE_ID")]
        hardware_id: String,
    },
}

// ── Graph ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Network ID
    #[arg(long, short = 'n')]
    pub network: String,

    /// Entity type of the starting entity
    #[arg(long = "type", short = 't')]
    pub entity_type: String,

    /// Key of the starting entity
    #[arg(long, short = 'k')]
    pub key: String,
}

// ── Mconfig ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MconfigArgs {
    /// Resolve the gateway by hardware ID
    #[arg(long, conflicts_with_all = ["network", "gateway"], required_unless_present = "network")]
    pub hardware_id: Option<String>,

    /// Network ID of the gateway
    #[arg(long, short = 'n', requires = "gateway")]
    pub network: Option<String>,

    /// Logical ID of the gateway
    #[arg(long, short = 'g', requires = "network")]
    pub gateway: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (tokens redacted)
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, short = 'f')]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
