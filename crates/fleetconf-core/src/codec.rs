// ── Config codecs ──
//
// Entity and network configs are opaque bytes to the store. Code that
// does need to look inside (the built-in builders) resolves a codec by
// config type name once, then calls through the trait object.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::config::{CodecKind, ServiceConfig};
use crate::error::CoreError;

/// Encode, decode and validate one family of config blobs.
pub trait ConfigCodec: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn validate(&self, bytes: &[u8]) -> Result<(), CoreError> {
        self.decode(bytes).map(|_| ())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CoreError>;
}

/// Blobs are JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ConfigCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CoreError::invalid(format!("config is not valid JSON: {e}")))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(value).map_err(|e| CoreError::Internal(e.to_string()))
    }
}

/// Blobs are arbitrary bytes, surfaced as a base64 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl ConfigCodec for RawCodec {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn validate(&self, _bytes: &[u8]) -> Result<(), CoreError> {
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError> {
        Ok(Value::String(STANDARD.encode(bytes)))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CoreError> {
        let Value::String(s) = value else {
            return Err(CoreError::invalid("raw config must be a base64 string"));
        };
        STANDARD
            .decode(s)
            .map_err(|e| CoreError::invalid(format!("raw config is not base64: {e}")))
    }
}

impl CodecKind {
    pub fn codec(self) -> Arc<dyn ConfigCodec> {
        match self {
            Self::Json => Arc::new(JsonCodec),
            Self::Raw => Arc::new(RawCodec),
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Config type name -> codec. Unregistered types use the fallback.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: BTreeMap<String, Arc<dyn ConfigCodec>>,
    fallback: Arc<dyn ConfigCodec>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(Arc::new(JsonCodec))
    }
}

impl CodecRegistry {
    pub fn new(fallback: Arc<dyn ConfigCodec>) -> Self {
        Self {
            codecs: BTreeMap::new(),
            fallback,
        }
    }

    /// JSON fallback plus the per-type overrides from `config.codecs`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        config
            .codecs
            .iter()
            .fold(Self::default(), |registry, (config_type, kind)| {
                registry.with_codec(config_type.clone(), kind.codec())
            })
    }

    pub fn with_codec(mut self, config_type: impl Into<String>, codec: Arc<dyn ConfigCodec>) -> Self {
        self.codecs.insert(config_type.into(), codec);
        self
    }

    pub fn get(&self, config_type: &str) -> &dyn ConfigCodec {
        &**self.codecs.get(config_type).unwrap_or(&self.fallback)
    }

    pub fn decode(&self, config_type: &str, bytes: &[u8]) -> Result<Value, CoreError> {
        self.get(config_type).decode(bytes).map_err(|e| match e {
            CoreError::InvalidArgument { message } => {
                CoreError::invalid(format!("{config_type}: {message}"))
            }
            other => other,
        })
    }
}
