//! Canonical payload records.
//!
//! Every record is a whitelist projection: only the fields declared here ever
//! leave the reducer. Optional source fields serialize as `null` so the field
//! set of each record is fixed regardless of what the provider sent.

use serde::{Deserialize, Serialize};

use super::event::EventKind;

// ---------------------------------------------------------------------------
// Shared sub-records
// ---------------------------------------------------------------------------

/// A user or bot account (`sender`, `owner`, `creator`, `actor`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub login: Option<String>,
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub site_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub owner: Option<UserSummary>,
    pub private: Option<bool>,
    pub default_branch: Option<String>,
    pub html_url: Option<String>,
}

/// One side (`head` or `base`) of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRefSummary {
    pub label: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub sha: Option<String>,
    pub repo: Option<RepositorySummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: Option<String>,
    pub tree_id: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<String>,
    pub url: Option<String>,
    pub author: Option<CommitAuthor>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub content_type: Option<String>,
    pub state: Option<String>,
    pub size: Option<u64>,
    pub download_count: Option<u64>,
    pub browser_download_url: Option<String>,
}

/// The deployment a status belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRef {
    pub id: Option<u64>,
    pub sha: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub environment: Option<String>,
}

// ---------------------------------------------------------------------------
// Per-kind records
// ---------------------------------------------------------------------------

/// A published registry package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Repository name, lower-cased.
    pub name: String,
    /// Repository owner login, lower-cased.
    pub namespace: String,
    /// Full version string as reported (e.g. `sha256:<hex>`).
    pub version: String,
    /// Digest segment of `version`.
    pub sha256: String,
    /// Package URL as reported by the provider.
    pub url: String,
    /// Container tag, or the target commitish when the tag is empty.
    pub branch: String,
    /// `owner/name` of the source repository.
    pub repository: String,
    /// Registry host (e.g. `ghcr.io`).
    pub registry: String,
}

/// A branch push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPush {
    pub name: String,
    pub namespace: String,
    /// Last path segment of `ref`.
    pub branch: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub commits: Vec<CommitSummary>,
    pub head_commit: Option<CommitSummary>,
}

/// Repository identity parsed from `full_name`, both parts lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestPayload {
    pub number: Option<u64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub html_url: Option<String>,
    pub state: Option<String>,
    pub merged: Option<bool>,
    pub draft: Option<bool>,
    pub head: Option<GitRefSummary>,
    pub base: Option<GitRefSummary>,
    pub body: Option<String>,
    pub user: Option<UserSummary>,
    pub repository: Option<RepositorySummary>,
    pub sender: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePayload {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub tag_name: Option<String>,
    /// `full_name` of the repository the release belongs to.
    pub repository: Option<String>,
    pub url: Option<String>,
    pub html_url: Option<String>,
    pub assets: Vec<ReleaseAsset>,
    pub body: Option<String>,
    pub draft: Option<bool>,
    pub prerelease: Option<bool>,
    pub published_at: Option<String>,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPayload {
    pub id: Option<u64>,
    pub sha: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub task: Option<String>,
    pub environment: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub creator: Option<UserSummary>,
    pub repository: Option<RepositorySummary>,
    pub sender: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatusPayload {
    pub id: Option<u64>,
    pub state: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub environment_url: Option<String>,
    pub target_url: Option<String>,
    pub log_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub creator: Option<UserSummary>,
    pub deployment: Option<DeploymentRef>,
    pub repository: Option<RepositorySummary>,
    pub sender: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunPayload {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub head_sha: Option<String>,
    pub head_branch: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub html_url: Option<String>,
    /// Slug of the app that owns the check.
    pub app: Option<String>,
    pub repository: Option<RepositorySummary>,
    pub sender: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPayload {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub html_url: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub repository: Option<RepositorySummary>,
    pub sender: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRunPayload {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub head_branch: Option<String>,
    pub head_sha: Option<String>,
    pub run_number: Option<u64>,
    pub run_attempt: Option<u64>,
    pub event: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub workflow_id: Option<u64>,
    pub html_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub run_started_at: Option<String>,
    pub actor: Option<UserSummary>,
    pub repository: Option<RepositorySummary>,
    pub sender: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPayload {
    pub login: Option<String>,
    pub id: Option<u64>,
    pub description: Option<String>,
    pub sender: Option<UserSummary>,
}

// ---------------------------------------------------------------------------
// CanonicalPayload
// ---------------------------------------------------------------------------

/// One canonical record per [`EventKind`].
///
/// Serialized untagged: the published JSON is the record's own field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CanonicalPayload {
    Package(PackageDescriptor),
    Commit(CommitPush),
    PullRequest(PullRequestPayload),
    Release(ReleasePayload),
    Deployment(DeploymentPayload),
    DeploymentStatus(DeploymentStatusPayload),
    CheckRun(CheckRunPayload),
    Workflow(WorkflowPayload),
    WorkflowRun(WorkflowRunPayload),
    Organization(OrganizationPayload),
    Sender(UserSummary),
    Repository(RepositoryRef),
}

impl CanonicalPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            CanonicalPayload::Package(_) => EventKind::Package,
            CanonicalPayload::Commit(_) => EventKind::Commit,
            CanonicalPayload::PullRequest(_) => EventKind::PullRequest,
            CanonicalPayload::Release(_) => EventKind::Release,
            CanonicalPayload::Deployment(_) => EventKind::Deployment,
            CanonicalPayload::DeploymentStatus(_) => EventKind::DeploymentStatus,
            CanonicalPayload::CheckRun(_) => EventKind::CheckRun,
            CanonicalPayload::Workflow(_) => EventKind::Workflow,
            CanonicalPayload::WorkflowRun(_) => EventKind::WorkflowRun,
            CanonicalPayload::Organization(_) => EventKind::Organization,
            CanonicalPayload::Sender(_) => EventKind::Sender,
            CanonicalPayload::Repository(_) => EventKind::Repository,
        }
    }

    pub fn as_package(&self) -> Option<&PackageDescriptor> {
        match self {
            CanonicalPayload::Package(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
