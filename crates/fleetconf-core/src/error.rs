// ── Core error types ──
//
// Domain errors for the configuration store and the mconfig pipeline.
// Transport failures from `fleetconf_api` are translated on the way in,
// so callers only ever match on `CoreError` / `ErrorKind`.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Coarse classification of a [`CoreError`].
///
/// Administrative callers receive this as an HTTP-style status; devices only
/// ever see the kind, never the builder-specific detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InvalidArgument,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::PermissionDenied => 403,
            Self::InvalidArgument => 400,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("network {network_id} not found")]
    NetworkNotFound { network_id: String },

    #[error("entity {entity} not found in network {network_id}")]
    EntityNotFound { network_id: String, entity: String },

    #[error("no entity registered for hardware ID {hardware_id}")]
    HardwareIdNotFound { hardware_id: String },

    #[error("permission {permission_id} not found on entity {entity}")]
    PermissionNotFound {
        entity: String,
        permission_id: String,
    },

    // ── Write conflicts ──────────────────────────────────────────────
    #[error("a network with ID {network_id} already exists")]
    NetworkExists { network_id: String },

    #[error("entity {entity} already exists in network {network_id}")]
    EntityExists { network_id: String, entity: String },

    #[error("physical ID {physical_id} is already assigned to {owner}")]
    PhysicalIdInUse { physical_id: String, owner: String },

    // ── Caller errors ────────────────────────────────────────────────
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    // ── Mconfig composition ──────────────────────────────────────────
    #[error("mconfig key {key} was returned by both {first} and {second}")]
    BuilderKeyCollision {
        key: String,
        first: String,
        second: String,
    },

    #[error("builder {builder} failed: {message}")]
    BuilderFailed { builder: String, message: String },

    #[error("builder {builder} timed out after {timeout_ms}ms")]
    BuilderTimeout { builder: String, timeout_ms: u64 },

    #[error("builder discovery failed: {message}")]
    Discovery { message: String },

    // ── Infrastructure ───────────────────────────────────────────────
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkNotFound { .. }
            | Self::EntityNotFound { .. }
            | Self::HardwareIdNotFound { .. }
            | Self::PermissionNotFound { .. } => ErrorKind::NotFound,
            Self::NetworkExists { .. }
            | Self::EntityExists { .. }
            | Self::PhysicalIdInUse { .. }
            | Self::BuilderKeyCollision { .. } => ErrorKind::Conflict,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::BuilderFailed { .. }
            | Self::BuilderTimeout { .. }
            | Self::Discovery { .. }
            | Self::Storage { .. }
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

/// Errors from a remote builder call, before the builder name is known.
///
/// [`RemoteBuilder`](crate::mconfig::RemoteBuilder) re-tags the result with
/// its own name and turns client timeouts into `BuilderTimeout` carrying its
/// deadline; the `"remote"` placeholder only survives if a caller uses the
/// client directly.
impl From<fleetconf_api::Error> for CoreError {
    fn from(err: fleetconf_api::Error) -> Self {
        let builder = String::from("remote");
        match err {
            fleetconf_api::Error::Builder { status, message } => Self::BuilderFailed {
                builder,
                message: format!("HTTP {status}: {message}"),
            },
            fleetconf_api::Error::Transport(e) => Self::BuilderFailed {
                builder,
                message: e.to_string(),
            },
            fleetconf_api::Error::Deserialization { message, body: _ } => Self::BuilderFailed {
                builder,
                message: format!("malformed response: {message}"),
            },
            fleetconf_api::Error::InvalidUrl(e) => Self::Internal(format!("invalid builder URL: {e}")),
            fleetconf_api::Error::InvalidToken { message } => {
                Self::Internal(format!("invalid builder token: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_status_codes() {
        let err = CoreError::NetworkNotFound {
            network_id: "n1".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);

        assert_eq!(CoreError::denied("no identity").status_code(), 403);
        assert_eq!(CoreError::invalid("bad op").status_code(), 400);
        assert_eq!(CoreError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn collisions_are_conflicts() {
        let err = CoreError::BuilderKeyCollision {
            key: "enodebd".into(),
            first: "lte".into(),
            second: "legacy-lte".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("enodebd"));
    }

    #[test]
    fn builder_http_errors_become_builder_failures() {
        let err: CoreError = fleetconf_api::Error::Builder {
            status: 502,
            message: "upstream".into(),
        }
        .into();
        assert!(matches!(err, CoreError::BuilderFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn kind_displays_snake_case() {
        assert_eq!(ErrorKind::PermissionDenied.to_string(), "permission_denied");
    }
}
