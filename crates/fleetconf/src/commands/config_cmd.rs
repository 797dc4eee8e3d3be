//! Config subcommand handlers.

use std::path::PathBuf;

use fleetconf_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// `--config` if given, the platform path otherwise.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config::config_path)
}

/// Copy of the config with service tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for service in &mut cfg.registry.services {
        if service.token.is_some() {
            service.token = Some("****".into());
        }
    }
    cfg
}

fn format_config(cfg: &Config) -> String {
    let mut out = toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# unrenderable: {e}\n"));
    match cfg.pipeline.timeout() {
        Ok(timeout) => {
            out.push_str(&format!(
                "\n# effective builder timeout: {}",
                humantime::format_duration(timeout)
            ));
        }
        Err(e) => out.push_str(&format!("\n# {e}")),
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    args: ConfigArgs,
    global: &GlobalOpts,
    loaded: Result<Config, CliError>,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(&loaded?);
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                resolve_path(global).display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&resolve_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = resolve_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }
    }
}
