//! Sub-reducers for objects nested inside many event payloads.

use serde_json::Value;

use super::{bool_at, object_at, str_at, u64_at};
use crate::domain::{
    CommitAuthor, CommitSummary, DeploymentRef, GitRefSummary, ReleaseAsset, RepositorySummary,
    UserSummary,
};

fn strings_at(value: &Value, pointer: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn user(v: &Value) -> UserSummary {
    UserSummary {
        login: str_at(v, "/login"),
        id: u64_at(v, "/id"),
        account_type: str_at(v, "/type"),
        site_admin: bool_at(v, "/site_admin"),
    }
}

/// The user object at `pointer`, if one is present.
pub fn user_at(v: &Value, pointer: &str) -> Option<UserSummary> {
    object_at(v, pointer).map(user)
}

pub fn repository(v: &Value) -> RepositorySummary {
    RepositorySummary {
        id: u64_at(v, "/id"),
        name: str_at(v, "/name"),
        full_name: str_at(v, "/full_name"),
        owner: user_at(v, "/owner"),
        private: bool_at(v, "/private"),
        default_branch: str_at(v, "/default_branch"),
        html_url: str_at(v, "/html_url"),
    }
}

pub fn repository_at(v: &Value, pointer: &str) -> Option<RepositorySummary> {
    object_at(v, pointer).map(repository)
}

pub fn git_ref(v: &Value) -> GitRefSummary {
    GitRefSummary {
        label: str_at(v, "/label"),
        git_ref: str_at(v, "/ref"),
        sha: str_at(v, "/sha"),
        repo: repository_at(v, "/repo"),
    }
}

pub fn git_ref_at(v: &Value, pointer: &str) -> Option<GitRefSummary> {
    object_at(v, pointer).map(git_ref)
}

pub fn commit(v: &Value) -> CommitSummary {
    CommitSummary {
        id: str_at(v, "/id"),
        tree_id: str_at(v, "/tree_id"),
        message: str_at(v, "/message"),
        timestamp: str_at(v, "/timestamp"),
        url: str_at(v, "/url"),
        author: object_at(v, "/author").map(|a| CommitAuthor {
            name: str_at(a, "/name"),
            email: str_at(a, "/email"),
            username: str_at(a, "/username"),
        }),
        added: strings_at(v, "/added"),
        removed: strings_at(v, "/removed"),
        modified: strings_at(v, "/modified"),
    }
}

pub fn asset(v: &Value) -> ReleaseAsset {
    ReleaseAsset {
        id: u64_at(v, "/id"),
        name: str_at(v, "/name"),
        label: str_at(v, "/label"),
        content_type: str_at(v, "/content_type"),
        state: str_at(v, "/state"),
        size: u64_at(v, "/size"),
        download_count: u64_at(v, "/download_count"),
        browser_download_url: str_at(v, "/browser_download_url"),
    }
}

pub fn deployment_ref(v: &Value) -> DeploymentRef {
    DeploymentRef {
        id: u64_at(v, "/id"),
        sha: str_at(v, "/sha"),
        git_ref: str_at(v, "/ref"),
        environment: str_at(v, "/environment"),
    }
}

/// Objects of the array at `pointer`, each reduced with `f`. Non-object
/// elements are skipped.
pub fn each_object<T>(v: &Value, pointer: &str, f: fn(&Value) -> T) -> Vec<T> {
    v.pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter(|i| i.is_object()).map(f).collect())
        .unwrap_or_default()
}
