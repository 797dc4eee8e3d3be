//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` kinds and config failures into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fleetconf_config::ConfigError;
use fleetconf_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Store / pipeline ─────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(fleetconf::not_found),
        help("Run: fleetconf {list_command} to see what the seed defines")
    )]
    NotFound {
        message: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(fleetconf::permission_denied),
        help("The gateway must be registered as an entity of the configured gateway type.")
    )]
    PermissionDenied { message: String },

    #[error("{message}")]
    #[diagnostic(code(fleetconf::conflict))]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(fleetconf::invalid_argument))]
    InvalidArgument { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(fleetconf::internal),
        help("Re-run with -v for builder-level detail.")
    )]
    Internal { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(fleetconf::config),
        help("Check the config file. Its location: fleetconf config path")
    )]
    Config(#[from] ConfigError),

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(fleetconf::config_exists),
        help("Use --force (-f) to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Seed ─────────────────────────────────────────────────────────

    #[error("Failed to load seed file {path}: {reason}")]
    #[diagnostic(
        code(fleetconf::seed),
        help("Seed files are YAML or JSON with a top-level `networks` list.")
    )]
    Seed { path: String, reason: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(fleetconf::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::Conflict { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::InvalidArgument { .. } => exit_code::USAGE,
            Self::Config(_) | Self::Seed { .. } => exit_code::CONFIG,
            Self::Internal { .. } | Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let list_command = match &err {
            CoreError::EntityNotFound { network_id, .. } => {
                format!("entities list --network {network_id}")
            }
            CoreError::HardwareIdNotFound { .. } => "entities list --network <NETWORK_ID>".into(),
            _ => "networks list".into(),
        };
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound {
                message,
                list_command,
            },
            ErrorKind::PermissionDenied => Self::PermissionDenied { message },
            ErrorKind::Conflict => Self::Conflict { message },
            ErrorKind::InvalidArgument => Self::InvalidArgument { message },
            ErrorKind::Internal => Self::Internal { message },
        }
    }
}
