//! Domain models for Hookrelay.
//!
//! Canonical definitions shared by every stage of the pipeline:
//! - `EventKind`: the dispatch table of reducible event keys
//! - `CanonicalEvent`: the normalized `(eventKey, actionName, payload)` triple
//! - `CanonicalPayload`: fixed-shape whitelist projections of raw payloads
//! - `PackageDescriptor`: the minimal record of a published registry package

pub mod digest;
pub mod error;
pub mod event;
pub mod payload;

pub use error::{BusError, ConfigError, DispatchError, ReduceError, RelayError, Result};
pub use event::{CanonicalEvent, EventKind, UNKNOWN_SEGMENT};
pub use payload::{
    CanonicalPayload, CheckRunPayload, CommitAuthor, CommitPush, CommitSummary, DeploymentPayload,
    DeploymentRef, DeploymentStatusPayload, GitRefSummary, OrganizationPayload,
    PackageDescriptor, PullRequestPayload, ReleaseAsset, ReleasePayload, RepositoryRef,
    RepositorySummary, UserSummary, WorkflowPayload, WorkflowRunPayload,
};
