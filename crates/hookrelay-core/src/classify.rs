//! Event classification: infer `(actionName, eventKey)` from a raw payload.
//!
//! Both values are pure functions of the payload. Field declaration order
//! matters, which is why `serde_json` is built with `preserve_order`.
//!
//! The event key is the first declared field (skipping a leading `action`).
//! That rule is fragile across serializers that reorder keys, so a
//! [`Classifier`] can instead use [`KeyStrategy::Discriminator`]: the first
//! marker from [`DISCRIMINATOR_FIELDS`] present in the payload wins, and the
//! first-field rule is only the last resort.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action used when nothing better can be inferred.
pub const UNKNOWN_ACTION: &str = "unknown";

const ACTION_FIELD: &str = "action";

/// Only assigns its synthetic action when the payload has no `action` field at all.
const PUSH_MARKER: &str = "ref";

/// Marker fields checked, in priority order, when `action` is absent or empty.
pub const ACTION_MARKERS: &[(&str, &str)] = &[
    ("forkee", "forked"),
    ("ref", "pushed"),
    ("release", "released"),
    ("pull_request", "pull_request"),
    ("issue", "issue"),
    ("pages", "pages"),
];

/// Marker fields for [`KeyStrategy::Discriminator`], most specific first.
pub const DISCRIMINATOR_FIELDS: &[&str] = &[
    "package",
    "ref",
    "pull_request",
    "release",
    "deployment_status",
    "deployment",
    "check_run",
    "workflow_run",
    "workflow",
    "organization",
    "repository",
    "sender",
];

/// `ref` is published as `commit`.
fn key_alias(field: &str) -> String {
    match field {
        "ref" => "commit".to_string(),
        other => other.to_string(),
    }
}

/// `ref` is published as `push` when it names the action.
fn action_alias(field: &str) -> String {
    match field {
        "ref" => "push".to_string(),
        other => other.to_string(),
    }
}

/// How the event key is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// First declared top-level field, skipping a leading `action`.
    #[default]
    FirstField,
    /// First present field of [`DISCRIMINATOR_FIELDS`], falling back to
    /// [`KeyStrategy::FirstField`].
    Discriminator,
}

/// Result of classifying one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub action_name: String,
    /// `None` when the payload has no usable top-level field.
    pub event_key: Option<String>,
}

/// Classify with the default [`KeyStrategy::FirstField`] rule.
pub fn classify(payload: &Value) -> Classification {
    Classifier::default().classify(payload)
}

/// Derive the action name.
///
/// 1. A non-empty string `action` is used verbatim.
/// 2. Otherwise the first of [`ACTION_MARKERS`] present assigns a synthetic action.
///    `ref` counts only when `action` is absent, so `{"action": "", "ref": ..}`
///    falls through to step 3 and is named `push`.
/// 3. Otherwise the first declared field other than `action` names it.
///
/// Non-object input, or an object with no other fields, yields [`UNKNOWN_ACTION`].
pub fn action_name(payload: &Value) -> String {
    let Value::Object(map) = payload else {
        return UNKNOWN_ACTION.to_string();
    };

    if let Some(action) = map
        .get(ACTION_FIELD)
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty())
    {
        return action.to_string();
    }

    let has_action = map.contains_key(ACTION_FIELD);
    if let Some((_, synthetic)) = ACTION_MARKERS.iter().find(|(field, _)| {
        map.contains_key(*field) && !(has_action && *field == PUSH_MARKER)
    }) {
        return synthetic.to_string();
    }

    map.keys()
        .find(|k| k.as_str() != ACTION_FIELD)
        .map(|k| action_alias(k))
        .unwrap_or_else(|| UNKNOWN_ACTION.to_string())
}

/// First declared field, skipping `action` only when it comes first.
fn first_field_key(map: &Map<String, Value>) -> Option<String> {
    let mut keys = map.keys();
    let first = keys.next()?;
    let key = if first == ACTION_FIELD {
        keys.next()?
    } else {
        first
    };
    Some(key_alias(key))
}

fn discriminated_key(map: &Map<String, Value>) -> Option<String> {
    DISCRIMINATOR_FIELDS
        .iter()
        .find(|field| map.contains_key(**field))
        .map(|field| key_alias(field))
}

/// Derive the event key with the first-field rule.
pub fn event_key(payload: &Value) -> Option<String> {
    payload.as_object().and_then(first_field_key)
}

/// Classifier parameterized by its [`KeyStrategy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    strategy: KeyStrategy,
}

impl Classifier {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    pub fn classify(&self, payload: &Value) -> Classification {
        let event_key = payload.as_object().and_then(|map| match self.strategy {
            KeyStrategy::FirstField => first_field_key(map),
            KeyStrategy::Discriminator => {
                discriminated_key(map).or_else(|| first_field_key(map))
            }
        });
        Classification {
            action_name: action_name(payload),
            event_key,
        }
    }
}
