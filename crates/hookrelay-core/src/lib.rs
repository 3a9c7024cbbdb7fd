//! Hookrelay Core Library
//!
//! Normalizes source-host webhook payloads into canonical events for the
//! deployment pipeline:
//! - `classify`: infer `(actionName, eventKey)` from an arbitrarily shaped payload
//! - `reduce`: project each known event kind onto a fixed whitelist record
//! - `flatten`: deep flatten/unflatten and marker-based field stripping
//! - `package_gate`: provenance check for package-publish notifications
//! - `dispatch`: the composition root that routes and publishes
//!
//! Everything up to the bus is pure and synchronous; concurrent payloads
//! share no state.

pub mod bus;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod flatten;
pub mod metrics;
pub mod obs;
pub mod package_gate;
pub mod reduce;
pub mod telemetry;

pub use bus::{EventBus, MemoryEventBus, PublishedEvent};
pub use classify::{classify, Classification, Classifier, KeyStrategy, UNKNOWN_ACTION};
pub use config::RelayConfig;
pub use dispatch::{Decision, DispatchOutcome, Dispatcher, Route};
pub use domain::{
    BusError, CanonicalEvent, CanonicalPayload, ConfigError, DispatchError, EventKind,
    PackageDescriptor, ReduceError, RelayError, Result,
};
pub use flatten::{
    flatten, strip_fields_by_key_marker, strip_fields_by_key_markers, unflatten, FlattenOptions,
    UnflattenOptions,
};
pub use metrics::METRICS;
pub use package_gate::{evaluate_package, expected_package_url, validate_package, PackageVerdict};
pub use reduce::{reduce, try_reduce};
pub use telemetry::{init_tracing, LogFormat};

/// Hookrelay version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
