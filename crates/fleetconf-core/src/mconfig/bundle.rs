// ── Mconfig bundle ──
//
// The merged configs plus metadata a device needs to decide whether
// anything changed. The digest covers `configs_by_key` only, so two
// bundles with the same content always carry the same digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::builder::ConfigsByKey;

pub const DIGEST_ALGORITHM: &str = "SHA256";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub algorithm: String,
    pub hex_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MconfigMetadata {
    /// Unix seconds.
    pub created_at: i64,
    pub digest: Digest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mconfig {
    #[serde(with = "crate::model::blob::map")]
    pub configs_by_key: ConfigsByKey,
    pub metadata: MconfigMetadata,
}

impl Mconfig {
    pub fn new(configs_by_key: ConfigsByKey, created_at: i64) -> Self {
        let digest = digest(&configs_by_key);
        Self {
            configs_by_key,
            metadata: MconfigMetadata { created_at, digest },
        }
    }
}

/// SHA-256 over each `(key, value)` in key order, both length-prefixed
/// (u64 big-endian) so no two distinct maps share an encoding.
pub fn digest(configs: &ConfigsByKey) -> Digest {
    let mut hasher = Sha256::new();
    for (key, value) in configs {
        hasher.update(u64::try_from(key.len()).unwrap_or(u64::MAX).to_be_bytes());
        hasher.update(key.as_bytes());
        hasher.update(u64::try_from(value.len()).unwrap_or(u64::MAX).to_be_bytes());
        hasher.update(value);
    }
    Digest {
        algorithm: DIGEST_ALGORITHM.to_owned(),
        hex_digest: hex::encode(hasher.finalize()),
    }
}
