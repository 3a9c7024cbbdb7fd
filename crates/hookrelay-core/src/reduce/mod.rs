//! Payload reduction: raw webhook payload → canonical record.
//!
//! The mapping from event key to reducer is an explicit table keyed by
//! [`EventKind`]; [`reducer_for`] matches exhaustively, so a new kind cannot be
//! added without a reducer. Each reducer is a whitelist projection and nested
//! `owner`/`creator`/`sender`/`repository` objects go through the
//! sub-reducers in [`subjects`], never copied verbatim.
//!
//! Keys outside the table fall back to the generic repository projection when
//! the payload carries a `repository` object.

mod kinds;
pub mod subjects;

use serde_json::Value;

use crate::domain::{CanonicalPayload, EventKind, ReduceError};

/// A single whitelist reducer.
pub type Reducer = fn(&Value) -> Result<CanonicalPayload, ReduceError>;

/// The reducer for `kind`.
pub fn reducer_for(kind: EventKind) -> Reducer {
    match kind {
        EventKind::Package => kinds::package,
        EventKind::Commit => kinds::commit,
        EventKind::PullRequest => kinds::pull_request,
        EventKind::Release => kinds::release,
        EventKind::Deployment => kinds::deployment,
        EventKind::DeploymentStatus => kinds::deployment_status,
        EventKind::CheckRun => kinds::check_run,
        EventKind::Workflow => kinds::workflow,
        EventKind::WorkflowRun => kinds::workflow_run,
        EventKind::Organization => kinds::organization,
        EventKind::Sender => kinds::sender,
        EventKind::Repository => kinds::repository,
    }
}

/// Reduce `payload` for `event_key`, reporting why reduction failed.
///
/// # Errors
///
/// - `ReduceError::NotAnObject`: the payload is not a JSON object.
/// - `ReduceError::MissingField`: a required source field is absent.
/// - `ReduceError::UnknownEventKey`: no reducer matches and the payload has
///   no `repository` to fall back on.
pub fn try_reduce(event_key: &str, payload: &Value) -> Result<CanonicalPayload, ReduceError> {
    if !payload.is_object() {
        return Err(ReduceError::NotAnObject);
    }
    match EventKind::from_key(event_key) {
        Some(kind) => reducer_for(kind)(payload),
        None if payload.get("repository").is_some_and(Value::is_object) => {
            kinds::repository(payload)
        }
        None => Err(ReduceError::UnknownEventKey {
            key: event_key.to_string(),
        }),
    }
}

/// Reduce `payload` for `event_key`; `None` when it cannot be reduced.
pub fn reduce(event_key: &str, payload: &Value) -> Option<CanonicalPayload> {
    try_reduce(event_key, payload).ok()
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

pub(crate) fn object_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    value.pointer(pointer).filter(|v| v.is_object())
}

pub(crate) fn str_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(crate) fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(Value::as_u64)
}

pub(crate) fn bool_at(value: &Value, pointer: &str) -> Option<bool> {
    value.pointer(pointer).and_then(Value::as_bool)
}

pub(crate) fn require_object<'a>(
    value: &'a Value,
    pointer: &str,
    kind: EventKind,
) -> Result<&'a Value, ReduceError> {
    object_at(value, pointer).ok_or_else(|| ReduceError::missing(kind, pointer))
}

pub(crate) fn require_str(
    value: &Value,
    pointer: &str,
    kind: EventKind,
) -> Result<String, ReduceError> {
    str_at(value, pointer).ok_or_else(|| ReduceError::missing(kind, pointer))
}
