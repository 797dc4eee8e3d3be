//! Configuration for the fleetconf service and CLI.
//!
//! TOML file plus `FLEETCONF_*` environment overrides, loaded with figment,
//! and translation to `fleetconf_core::ServiceConfig`. The core crate never
//! reads files; everything it needs arrives through [`to_service_config`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use fleetconf_core::config::{
    DEFAULT_BUILDER_TIMEOUT, DEFAULT_GATEWAY_ENTITY_TYPE, DEFAULT_REGISTRY_LABEL,
};
use fleetconf_core::mconfig::DIGEST_ALGORITHM;
use fleetconf_core::{BuiltinBuilderSpec, CodecKind, ServiceConfig, ServiceEndpoint};

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "FLEETCONF_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("environment variable {var} for service '{service}' is not set")]
    MissingToken { service: String, var: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub southbound: SouthboundSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub registry: RegistrySection,

    /// In-process builders that need no schema knowledge.
    #[serde(default)]
    pub builtin_builders: Vec<BuiltinBuilderSpec>,

    /// Config type name -> `json` or `raw`. Unlisted types are JSON.
    #[serde(default)]
    pub codecs: BTreeMap<String, CodecKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SouthboundSection {
    /// Entity type a device's logical ID refers to.
    #[serde(default = "default_gateway_entity_type")]
    pub gateway_entity_type: String,
}

impl Default for SouthboundSection {
    fn default() -> Self {
        Self {
            gateway_entity_type: default_gateway_entity_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PipelineSection {
    #[serde(default = "default_builder_timeout_ms")]
    pub builder_timeout_ms: u64,

    /// Human-readable override for `builder_timeout_ms` (e.g. "750ms", "2s").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_timeout: Option<String>,

    /// Only SHA256 is supported.
    #[serde(default = "default_digest_algorithm")]
    pub digest_algorithm: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            builder_timeout_ms: default_builder_timeout_ms(),
            builder_timeout: None,
            digest_algorithm: default_digest_algorithm(),
        }
    }
}

impl PipelineSection {
    /// Effective per-builder deadline.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        let timeout = match self.builder_timeout.as_deref() {
            Some(raw) => humantime::parse_duration(raw)
                .map_err(|e| invalid("pipeline.builder_timeout", format!("'{raw}': {e}")))?,
            None => Duration::from_millis(self.builder_timeout_ms),
        };
        if timeout.is_zero() {
            return Err(invalid("pipeline.builder_timeout", "must be greater than zero"));
        }
        Ok(timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSection {
    /// Default filter when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistrySection {
    /// Capability label a service must carry to be used as a builder.
    #[serde(default = "default_registry_label")]
    pub label: String,

    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            label: default_registry_label(),
            services: Vec::new(),
        }
    }
}

/// A statically configured service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceEntry {
    pub name: String,

    /// Base URL; the build call is appended to it.
    pub url: String,

    #[serde(default)]
    pub labels: Vec<String>,

    /// Bearer token (plaintext, prefer `token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable containing the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

fn default_gateway_entity_type() -> String {
    DEFAULT_GATEWAY_ENTITY_TYPE.into()
}
fn default_builder_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_BUILDER_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}
fn default_digest_algorithm() -> String {
    DIGEST_ALGORITHM.into()
}
fn default_log_level() -> String {
    "warn".into()
}
fn default_registry_label() -> String {
    DEFAULT_REGISTRY_LABEL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "fleetconf", "fleetconf").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetconf");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path` (if present), then environment.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    Ok(config)
}

/// Load from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parents.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation ─────────────────────────────────────────────────────

/// Validate the file-level config and build the core's `ServiceConfig`.
pub fn to_service_config(cfg: &Config) -> Result<ServiceConfig, ConfigError> {
    if cfg.southbound.gateway_entity_type.trim().is_empty() {
        return Err(invalid("southbound.gateway_entity_type", "must not be empty"));
    }
    if cfg.pipeline.digest_algorithm != DIGEST_ALGORITHM {
        return Err(invalid(
            "pipeline.digest_algorithm",
            format!(
                "expected '{DIGEST_ALGORITHM}', got '{}'",
                cfg.pipeline.digest_algorithm
            ),
        ));
    }
    if cfg.registry.label.trim().is_empty() {
        return Err(invalid("registry.label", "must not be empty"));
    }

    let mut names = BTreeSet::new();
    let services = cfg
        .registry
        .services
        .iter()
        .map(|entry| {
            if !names.insert(entry.name.as_str()) {
                return Err(invalid(
                    "registry.services",
                    format!("duplicate service name '{}'", entry.name),
                ));
            }
            resolve_service(entry)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder_names = BTreeSet::new();
    for spec in &cfg.builtin_builders {
        validate_builtin(spec)?;
        if !builder_names.insert(spec.name()) {
            return Err(invalid(
                "builtin_builders",
                format!("duplicate builder name '{}'", spec.name()),
            ));
        }
    }

    if cfg.codecs.keys().any(|config_type| config_type.trim().is_empty()) {
        return Err(invalid("codecs", "config type names must not be empty"));
    }

    Ok(ServiceConfig {
        gateway_entity_type: cfg.southbound.gateway_entity_type.clone(),
        builder_timeout: cfg.pipeline.timeout()?,
        registry_label: cfg.registry.label.clone(),
        services,
        builtin_builders: cfg.builtin_builders.clone(),
        codecs: cfg.codecs.clone(),
    })
}

fn resolve_service(entry: &ServiceEntry) -> Result<ServiceEndpoint, ConfigError> {
    if entry.name.trim().is_empty() {
        return Err(invalid("registry.services.name", "must not be empty"));
    }
    let url: Url = entry.url.parse().map_err(|_| {
        invalid(
            format!("registry.services.{}.url", entry.name),
            format!("invalid URL: {}", entry.url),
        )
    })?;

    let mut endpoint = ServiceEndpoint::new(entry.name.clone(), url);
    for label in &entry.labels {
        endpoint = endpoint.with_label(label.clone());
    }
    endpoint.auth_token = resolve_token(entry)?;
    Ok(endpoint)
}

/// `token_env` wins over a plaintext `token`.
fn resolve_token(entry: &ServiceEntry) -> Result<Option<SecretString>, ConfigError> {
    if let Some(ref var) = entry.token_env {
        return std::env::var(var)
            .map(|val| Some(SecretString::from(val)))
            .map_err(|_| ConfigError::MissingToken {
                service: entry.name.clone(),
                var: var.clone(),
            });
    }
    Ok(entry.token.clone().map(SecretString::from))
}

fn validate_builtin(spec: &BuiltinBuilderSpec) -> Result<(), ConfigError> {
    let (name, section, source) = match spec {
        BuiltinBuilderSpec::NetworkConfig {
            name,
            section,
            config_type,
        } => (name, section, config_type),
        BuiltinBuilderSpec::EntityConfig {
            name,
            section,
            entity_type,
        } => (name, section, entity_type),
    };
    if name.trim().is_empty() {
        return Err(invalid("builtin_builders.name", "must not be empty"));
    }
    if section.trim().is_empty() || source.trim().is_empty() {
        return Err(invalid(
            format!("builtin_builders.{name}"),
            "section and source type must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.southbound.gateway_entity_type, "magmad_gateway");
        assert_eq!(cfg.pipeline.builder_timeout_ms, 5000);
        assert_eq!(cfg.registry.label, "mconfig_builder");

        let svc = to_service_config(&cfg).unwrap();
        assert_eq!(svc.builder_timeout, Duration::from_secs(5));
        assert!(svc.services.is_empty());
    }

    #[test]
    fn full_file_translates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
[southbound]
gateway_entity_type = "edge_gateway"

[pipeline]
builder_timeout = "750ms"

[registry]
label = "builder"

[[registry.services]]
name = "lte"
url = "http://lte:9000/"
labels = ["builder"]
token = "s3cret"

[[registry.services]]
name = "metrics"
url = "http://metrics:9000/"

[[builtin_builders]]
kind = "entity_config"
name = "enb"
section = "enodebd"
entity_type = "enodeb"

[codecs]
enodeb = "json"
cpe_blob = "raw"
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        let svc = to_service_config(&cfg).unwrap();
        assert_eq!(svc.gateway_entity_type, "edge_gateway");
        assert_eq!(svc.builder_timeout, Duration::from_millis(750));
        assert_eq!(svc.registry_label, "builder");
        assert_eq!(svc.services.len(), 2);
        assert!(svc.services[0].has_label("builder"));
        assert!(!svc.services[1].has_label("builder"));
        assert_eq!(
            svc.services[0].auth_token.as_ref().unwrap().expose_secret(),
            "s3cret"
        );
        assert_eq!(
            svc.builtin_builders,
            vec![BuiltinBuilderSpec::EntityConfig {
                name: "enb".into(),
                section: "enodebd".into(),
                entity_type: "enodeb".into(),
            }]
        );
        assert_eq!(svc.codecs["cpe_blob"], CodecKind::Raw);
        assert_eq!(svc.codecs["enodeb"], CodecKind::Json);
    }

    #[test]
    fn unknown_codec_kind_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[codecs]\nenodeb = \"protobuf\"\n");
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = Config::default();
        cfg.pipeline.builder_timeout_ms = 0;
        let err = to_service_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "pipeline.builder_timeout"));
    }

    #[test]
    fn bad_url_is_rejected() {
        let mut cfg = Config::default();
        cfg.registry.services.push(ServiceEntry {
            name: "lte".into(),
            url: "not a url".into(),
            labels: vec![],
            token: None,
            token_env: None,
        });
        let err = to_service_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("invalid URL"));
    }

    #[test]
    fn unsupported_digest_is_rejected() {
        let mut cfg = Config::default();
        cfg.pipeline.digest_algorithm = "MD5".into();
        assert!(to_service_config(&cfg).is_err());
    }

    #[test]
    fn duplicate_builder_names_are_rejected() {
        let mut cfg = Config::default();
        let spec = BuiltinBuilderSpec::NetworkConfig {
            name: "net".into(),
            section: "cellular".into(),
            config_type: "cellular_network".into(),
        };
        cfg.builtin_builders = vec![spec.clone(), spec];
        let err = to_service_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("duplicate builder name"));
    }

    #[test]
    fn unset_token_env_is_an_error() {
        let mut cfg = Config::default();
        cfg.registry.services.push(ServiceEntry {
            name: "lte".into(),
            url: "http://lte:9000/".into(),
            labels: vec![],
            token: Some("ignored".into()),
            token_env: Some("FLEETCONF_TEST_TOKEN_THAT_IS_NEVER_SET".into()),
        });
        let err = to_service_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken { .. }));
    }

    #[test]
    fn save_then_load_preserves_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.logging.json = true;
        cfg.builtin_builders.push(BuiltinBuilderSpec::NetworkConfig {
            name: "net".into(),
            section: "cellular".into(),
            config_type: "cellular_network".into(),
        });
        save_config_to(&cfg, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
