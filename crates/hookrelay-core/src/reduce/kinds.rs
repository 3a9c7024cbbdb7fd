//! One whitelist reducer per [`EventKind`].

use serde_json::Value;

use super::subjects::{
    self, deployment_ref, each_object, git_ref_at, repository_at, user_at,
};
use super::{bool_at, object_at, require_object, require_str, str_at, u64_at};
use crate::domain::{
    CanonicalPayload, CheckRunPayload, CommitPush, DeploymentPayload, DeploymentStatusPayload,
    EventKind, OrganizationPayload, PackageDescriptor, PullRequestPayload, ReduceError,
    ReleasePayload, RepositoryRef, WorkflowPayload, WorkflowRunPayload,
};
use crate::package_gate::{package_url_host, registry_host};

type Reduced = Result<CanonicalPayload, ReduceError>;

pub(super) fn package(p: &Value) -> Reduced {
    const KIND: EventKind = EventKind::Package;
    const VERSION: &str = "/package/package_version";

    require_object(p, VERSION, KIND)?;
    let version = require_str(p, "/package/package_version/version", KIND)?;
    let url = require_str(p, "/package/package_version/package_url", KIND)?;
    let name = require_str(p, "/repository/name", KIND)?.to_lowercase();
    let namespace = require_str(p, "/repository/owner/login", KIND)?.to_lowercase();

    let branch = str_at(p, "/package/package_version/container_metadata/tag/name")
        .filter(|tag| !tag.is_empty())
        .or_else(|| {
            str_at(p, "/package/package_version/target_commitish").filter(|c| !c.is_empty())
        })
        .ok_or_else(|| {
            ReduceError::missing(KIND, "/package/package_version/target_commitish")
        })?;

    let sha256 = version
        .rsplit(':')
        .next()
        .unwrap_or(version.as_str())
        .to_string();

    let registry = str_at(p, "/package/registry/url")
        .map(|u| registry_host(&u))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| package_url_host(&url));

    let repository =
        str_at(p, "/repository/full_name").unwrap_or_else(|| format!("{namespace}/{name}"));

    Ok(CanonicalPayload::Package(PackageDescriptor {
        name,
        namespace,
        version,
        sha256,
        url,
        branch,
        repository,
        registry,
    }))
}

pub(super) fn commit(p: &Value) -> Reduced {
    const KIND: EventKind = EventKind::Commit;

    let git_ref = require_str(p, "/ref", KIND)?;
    let name = require_str(p, "/repository/name", KIND)?.to_lowercase();
    let namespace = str_at(p, "/repository/owner/name")
        .or_else(|| str_at(p, "/repository/owner/login"))
        .ok_or_else(|| ReduceError::missing(KIND, "/repository/owner/name"))?
        .to_lowercase();
    let branch = git_ref
        .rsplit('/')
        .next()
        .unwrap_or(git_ref.as_str())
        .to_string();

    Ok(CanonicalPayload::Commit(CommitPush {
        name,
        namespace,
        branch,
        commits: each_object(p, "/commits", subjects::commit),
        head_commit: object_at(p, "/head_commit").map(subjects::commit),
        git_ref,
    }))
}

/// Generic projection: `owner/name` from `repository.full_name`, lower-cased.
pub(super) fn repository(p: &Value) -> Reduced {
    const KIND: EventKind = EventKind::Repository;
    const FULL_NAME: &str = "/repository/full_name";

    let full_name = require_str(p, FULL_NAME, KIND)?;
    let (owner, repo) = full_name
        .split_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        .ok_or_else(|| ReduceError::missing(KIND, FULL_NAME))?;

    Ok(CanonicalPayload::Repository(RepositoryRef {
        name: repo.to_lowercase(),
        namespace: owner.to_lowercase(),
    }))
}

pub(super) fn pull_request(p: &Value) -> Reduced {
    let pr = require_object(p, "/pull_request", EventKind::PullRequest)?;

    Ok(CanonicalPayload::PullRequest(PullRequestPayload {
        number: u64_at(pr, "/number"),
        title: str_at(pr, "/title"),
        url: str_at(pr, "/url"),
        html_url: str_at(pr, "/html_url"),
        state: str_at(pr, "/state"),
        merged: bool_at(pr, "/merged"),
        draft: bool_at(pr, "/draft"),
        head: git_ref_at(pr, "/head"),
        base: git_ref_at(pr, "/base"),
        body: str_at(pr, "/body"),
        user: user_at(pr, "/user"),
        repository: repository_at(p, "/repository"),
        sender: user_at(p, "/sender"),
    }))
}

pub(super) fn release(p: &Value) -> Reduced {
    let release = require_object(p, "/release", EventKind::Release)?;

    Ok(CanonicalPayload::Release(ReleasePayload {
        id: u64_at(release, "/id"),
        name: str_at(release, "/name"),
        tag_name: str_at(release, "/tag_name"),
        repository: str_at(p, "/repository/full_name"),
        url: str_at(release, "/url"),
        html_url: str_at(release, "/html_url"),
        assets: each_object(release, "/assets", subjects::asset),
        body: str_at(release, "/body"),
        draft: bool_at(release, "/draft"),
        prerelease: bool_at(release, "/prerelease"),
        published_at: str_at(release, "/published_at"),
        author: user_at(release, "/author"),
    }))
}

pub(super) fn deployment(p: &Value) -> Reduced {
    let d = require_object(p, "/deployment", EventKind::Deployment)?;

    Ok(CanonicalPayload::Deployment(DeploymentPayload {
        id: u64_at(d, "/id"),
        sha: str_at(d, "/sha"),
        git_ref: str_at(d, "/ref"),
        task: str_at(d, "/task"),
        environment: str_at(d, "/environment"),
        description: str_at(d, "/description"),
        created_at: str_at(d, "/created_at"),
        updated_at: str_at(d, "/updated_at"),
        creator: user_at(d, "/creator"),
        repository: repository_at(p, "/repository"),
        sender: user_at(p, "/sender"),
    }))
}

pub(super) fn deployment_status(p: &Value) -> Reduced {
    let s = require_object(p, "/deployment_status", EventKind::DeploymentStatus)?;

    Ok(CanonicalPayload::DeploymentStatus(DeploymentStatusPayload {
        id: u64_at(s, "/id"),
        state: str_at(s, "/state"),
        description: str_at(s, "/description"),
        environment: str_at(s, "/environment"),
        environment_url: str_at(s, "/environment_url"),
        target_url: str_at(s, "/target_url"),
        log_url: str_at(s, "/log_url"),
        created_at: str_at(s, "/created_at"),
        updated_at: str_at(s, "/updated_at"),
        creator: user_at(s, "/creator"),
        deployment: object_at(p, "/deployment").map(deployment_ref),
        repository: repository_at(p, "/repository"),
        sender: user_at(p, "/sender"),
    }))
}

pub(super) fn check_run(p: &Value) -> Reduced {
    let c = require_object(p, "/check_run", EventKind::CheckRun)?;

    Ok(CanonicalPayload::CheckRun(CheckRunPayload {
        id: u64_at(c, "/id"),
        name: str_at(c, "/name"),
        head_sha: str_at(c, "/head_sha"),
        head_branch: str_at(c, "/check_suite/head_branch"),
        status: str_at(c, "/status"),
        conclusion: str_at(c, "/conclusion"),
        started_at: str_at(c, "/started_at"),
        completed_at: str_at(c, "/completed_at"),
        html_url: str_at(c, "/html_url"),
        app: str_at(c, "/app/slug"),
        repository: repository_at(p, "/repository"),
        sender: user_at(p, "/sender"),
    }))
}

/// `workflow` is an object on workflow events and a path string on
/// `workflow_dispatch`.
pub(super) fn workflow(p: &Value) -> Reduced {
    let base = WorkflowPayload {
        git_ref: str_at(p, "/ref"),
        repository: repository_at(p, "/repository"),
        sender: user_at(p, "/sender"),
        ..Default::default()
    };

    let payload = match p.get("workflow") {
        Some(w @ Value::Object(_)) => WorkflowPayload {
            id: u64_at(w, "/id"),
            name: str_at(w, "/name"),
            path: str_at(w, "/path"),
            state: str_at(w, "/state"),
            created_at: str_at(w, "/created_at"),
            updated_at: str_at(w, "/updated_at"),
            html_url: str_at(w, "/html_url"),
            ..base
        },
        Some(Value::String(path)) => WorkflowPayload {
            path: Some(path.clone()),
            ..base
        },
        _ => return Err(ReduceError::missing(EventKind::Workflow, "/workflow")),
    };
    Ok(CanonicalPayload::Workflow(payload))
}

pub(super) fn workflow_run(p: &Value) -> Reduced {
    let r = require_object(p, "/workflow_run", EventKind::WorkflowRun)?;

    Ok(CanonicalPayload::WorkflowRun(WorkflowRunPayload {
        id: u64_at(r, "/id"),
        name: str_at(r, "/name"),
        head_branch: str_at(r, "/head_branch"),
        head_sha: str_at(r, "/head_sha"),
        run_number: u64_at(r, "/run_number"),
        run_attempt: u64_at(r, "/run_attempt"),
        event: str_at(r, "/event"),
        status: str_at(r, "/status"),
        conclusion: str_at(r, "/conclusion"),
        workflow_id: u64_at(r, "/workflow_id"),
        html_url: str_at(r, "/html_url"),
        created_at: str_at(r, "/created_at"),
        updated_at: str_at(r, "/updated_at"),
        run_started_at: str_at(r, "/run_started_at"),
        actor: user_at(r, "/actor"),
        repository: repository_at(p, "/repository"),
        sender: user_at(p, "/sender"),
    }))
}

pub(super) fn organization(p: &Value) -> Reduced {
    let o = require_object(p, "/organization", EventKind::Organization)?;

    Ok(CanonicalPayload::Organization(OrganizationPayload {
        login: str_at(o, "/login"),
        id: u64_at(o, "/id"),
        description: str_at(o, "/description"),
        sender: user_at(p, "/sender"),
    }))
}

pub(super) fn sender(p: &Value) -> Reduced {
    const KIND: EventKind = EventKind::Sender;

    let s = require_object(p, "/sender", KIND)?;
    require_str(p, "/sender/login", KIND)?;
    Ok(CanonicalPayload::Sender(subjects::user(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package_payload(tag: &str) -> Value {
        json!({
            "action": "published",
            "package": {
                "name": "svc",
                "package_version": {
                    "version": "sha256:deadbeef",
                    "target_commitish": "main",
                    "package_url": "ghcr.io/acme/svc:v1",
                    "container_metadata": {"tag": {"name": tag}}
                },
                "registry": {"url": "https://ghcr.io/"}
            },
            "repository": {"name": "Svc", "full_name": "Acme/Svc", "owner": {"login": "Acme"}}
        })
    }

    #[test]
    fn package_prefers_container_tag() {
        let reduced = package(&package_payload("v1")).expect("package");
        let d = reduced.as_package().expect("descriptor");
        assert_eq!(d.branch, "v1");
        assert_eq!(d.name, "svc");
        assert_eq!(d.namespace, "acme");
        assert_eq!(d.sha256, "deadbeef");
        assert_eq!(d.version, "sha256:deadbeef");
        assert_eq!(d.registry, "ghcr.io");
        assert_eq!(d.repository, "Acme/Svc");
    }

    #[test]
    fn package_empty_tag_uses_target_commitish() {
        let reduced = package(&package_payload("")).expect("package");
        assert_eq!(reduced.as_package().expect("descriptor").branch, "main");
    }

    #[test]
    fn package_registry_falls_back_to_url_host() {
        let mut raw = package_payload("v1");
        raw["package"]
            .as_object_mut()
            .expect("package object")
            .insert("registry".into(), Value::Null);
        let reduced = package(&raw).expect("package");
        assert_eq!(reduced.as_package().expect("descriptor").registry, "ghcr.io");
    }

    #[test]
    fn package_missing_version_is_shape_mismatch() {
        let err = package(&json!({
            "package": {"name": "svc"},
            "repository": {"name": "svc", "owner": {"login": "acme"}}
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ReduceError::MissingField {
                kind: EventKind::Package,
                field: "package.package_version".into()
            }
        );
    }

    #[test]
    fn commit_branch_is_last_ref_segment() {
        let reduced = commit(&json!({
            "ref": "refs/heads/feature/login",
            "repository": {"name": "Svc", "owner": {"name": "Acme", "login": "acme-bot"}},
            "commits": [{"id": "a1"}],
            "head_commit": {"id": "a1", "message": "wip"}
        }))
        .expect("commit");
        let CanonicalPayload::Commit(push) = reduced else {
            panic!("expected commit");
        };
        assert_eq!(push.branch, "login");
        assert_eq!(push.git_ref, "refs/heads/feature/login");
        assert_eq!(push.namespace, "acme");
        assert_eq!(push.commits.len(), 1);
        assert_eq!(
            push.head_commit.and_then(|c| c.message).as_deref(),
            Some("wip")
        );
    }

    #[test]
    fn commit_namespace_falls_back_to_login() {
        let reduced = commit(&json!({
            "ref": "refs/tags/v1",
            "repository": {"name": "svc", "owner": {"login": "ACME"}}
        }))
        .expect("commit");
        let CanonicalPayload::Commit(push) = reduced else {
            panic!("expected commit");
        };
        assert_eq!(push.namespace, "acme");
        assert!(push.head_commit.is_none());
    }

    #[test]
    fn repository_requires_owner_and_name() {
        let ok = repository(&json!({"repository": {"full_name": "Acme/Svc"}})).expect("repo");
        assert_eq!(
            ok,
            CanonicalPayload::Repository(RepositoryRef {
                name: "svc".into(),
                namespace: "acme".into()
            })
        );
        assert!(repository(&json!({"repository": {"full_name": "flat"}})).is_err());
        assert!(repository(&json!({"repository": {"full_name": "/svc"}})).is_err());
    }

    #[test]
    fn workflow_accepts_path_string() {
        let reduced = workflow(&json!({
            "inputs": {},
            "ref": "refs/heads/main",
            "workflow": ".github/workflows/deploy.yml"
        }))
        .expect("workflow");
        let CanonicalPayload::Workflow(w) = reduced else {
            panic!("expected workflow");
        };
        assert_eq!(w.path.as_deref(), Some(".github/workflows/deploy.yml"));
        assert_eq!(w.git_ref.as_deref(), Some("refs/heads/main"));
        assert_eq!(w.id, None);
    }

    #[test]
    fn sender_requires_login() {
        assert!(sender(&json!({"sender": {"id": 1}})).is_err());
        let reduced = sender(&json!({"sender": {"login": "octocat", "id": 1}})).expect("sender");
        assert_eq!(reduced.kind(), EventKind::Sender);
    }
}
