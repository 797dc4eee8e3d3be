// ── Entity identity ──
//
// Entities are addressed by `(type, key)` within a network. The pair is
// totally ordered so graphs, edge lists and batch results can be kept in
// sorted collections and compared deterministically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// `(type, key)` pair identifying one entity inside a network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeAndKey {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,
}

impl TypeAndKey {
    pub fn new(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            key: key.into(),
        }
    }

    /// Reject blank components. Used on every write path.
    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.entity_type.trim().is_empty() {
            return Err(CoreError::invalid(format!("entity {self} has an empty type")));
        }
        if self.key.trim().is_empty() {
            return Err(CoreError::invalid(format!("entity {self} has an empty key")));
        }
        Ok(())
    }
}

impl fmt::Display for TypeAndKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.key)
    }
}

/// Parses the `type:key` form produced by `Display`. The key may itself
/// contain colons; only the first one separates.
impl FromStr for TypeAndKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entity_type, key) = s
            .split_once(':')
            .ok_or_else(|| CoreError::invalid(format!("expected type:key, got {s:?}")))?;
        let id = Self::new(entity_type, key);
        id.validate()?;
        Ok(id)
    }
}
