//! Error taxonomy for Hookrelay.
//!
//! Classification never fails. Reduction reports *why* a payload produced no
//! canonical record; the dispatcher logs that reason instead of propagating
//! it. Only bus and serialization failures reach the caller.

use std::path::PathBuf;

use super::event::EventKind;

/// Why a raw payload could not be reduced to a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReduceError {
    #[error("unknown event key: {key:?}")]
    UnknownEventKey { key: String },

    #[error("{kind} payload shape mismatch: missing {field}")]
    MissingField { kind: EventKind, field: String },

    #[error("payload is not an object")]
    NotAnObject,
}

impl ReduceError {
    /// Build a `MissingField` from a JSON pointer such as `/package/package_version`.
    pub fn missing(kind: EventKind, pointer: &str) -> Self {
        ReduceError::MissingField {
            kind,
            field: pointer.trim_start_matches('/').replace('/', "."),
        }
    }

    /// Whether the event key was recognized but the payload lacked a field.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, ReduceError::MissingField { .. })
    }
}

/// Errors produced by an [`EventBus`](crate::bus::EventBus).
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("event bus rejected {event}: {reason}")]
    Rejected { event: String, reason: String },

    #[error("event bus is closed")]
    Closed,
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors returned by [`Dispatcher::dispatch`](crate::dispatch::Dispatcher::dispatch).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("publish failed: {0}")]
    Bus(#[from] BusError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level Hookrelay error.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("reduce error: {0}")]
    Reduce(#[from] ReduceError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Hookrelay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_renders_dotted_path() {
        let err = ReduceError::missing(EventKind::Package, "/package/package_version");
        assert!(err.is_shape_mismatch());
        assert_eq!(
            err.to_string(),
            "package payload shape mismatch: missing package.package_version"
        );
    }

    #[test]
    fn unknown_key_is_not_shape_mismatch() {
        let err = ReduceError::UnknownEventKey { key: "foo".into() };
        assert!(!err.is_shape_mismatch());
        assert!(err.to_string().contains("\"foo\""));
    }

    #[test]
    fn bus_error_wraps_into_dispatch_and_relay() {
        let err: DispatchError = BusError::Closed.into();
        assert!(err.to_string().contains("closed"));
        let err: RelayError = err.into();
        assert!(err.to_string().starts_with("dispatch error"));
    }
}
