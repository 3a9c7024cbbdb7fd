//! Canonical event types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::digest::compute_digest;
use super::payload::CanonicalPayload;

/// Rendered in place of an absent event key.
pub const UNKNOWN_SEGMENT: &str = "unknown";

/// Event keys that have a dedicated reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Package,
    Commit,
    PullRequest,
    Release,
    Deployment,
    DeploymentStatus,
    CheckRun,
    Workflow,
    WorkflowRun,
    Organization,
    Sender,
    Repository,
}

impl EventKind {
    /// Every reducible kind, in table order.
    pub const ALL: [EventKind; 12] = [
        EventKind::Package,
        EventKind::Commit,
        EventKind::PullRequest,
        EventKind::Release,
        EventKind::Deployment,
        EventKind::DeploymentStatus,
        EventKind::CheckRun,
        EventKind::Workflow,
        EventKind::WorkflowRun,
        EventKind::Organization,
        EventKind::Sender,
        EventKind::Repository,
    ];

    /// The event key selecting this kind.
    pub fn as_key(self) -> &'static str {
        match self {
            EventKind::Package => "package",
            EventKind::Commit => "commit",
            EventKind::PullRequest => "pull_request",
            EventKind::Release => "release",
            EventKind::Deployment => "deployment",
            EventKind::DeploymentStatus => "deployment_status",
            EventKind::CheckRun => "check_run",
            EventKind::Workflow => "workflow",
            EventKind::WorkflowRun => "workflow_run",
            EventKind::Organization => "organization",
            EventKind::Sender => "sender",
            EventKind::Repository => "repository",
        }
    }

    /// Look up the kind for an event key. Matching is exact.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_key() == key)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// The normalized triple handed to the event bus.
///
/// `payload == None` marks a recognized-but-unhandled event. It is still
/// logged (and optionally emitted) by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEvent {
    pub action_name: String,
    pub event_key: Option<String>,
    pub payload: Option<CanonicalPayload>,
}

impl CanonicalEvent {
    pub fn new(
        action_name: impl Into<String>,
        event_key: Option<String>,
        payload: Option<CanonicalPayload>,
    ) -> Self {
        Self {
            action_name: action_name.into(),
            event_key,
            payload,
        }
    }

    /// `"<provider>.<eventKey>.<actionName>"`.
    pub fn event_name(&self, provider: &str) -> String {
        let key = self
            .event_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(UNKNOWN_SEGMENT);
        format!("{provider}.{key}.{}", self.action_name)
    }

    pub fn is_unhandled(&self) -> bool {
        self.payload.is_none()
    }

    /// SHA-256 of the event's canonical JSON.
    pub fn digest(&self) -> serde_json::Result<String> {
        Ok(compute_digest(&serde_json::to_value(self)?))
    }
}
