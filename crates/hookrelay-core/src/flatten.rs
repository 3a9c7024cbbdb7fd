//! Deep flatten / unflatten of JSON structures.
//!
//! [`flatten`] turns a nested value into a single-level map keyed by
//! delimiter-joined paths; [`unflatten`] rebuilds the nesting. Both are folds
//! over owned accumulators: the input is never mutated and nothing is shared
//! between calls.
//!
//! [`strip_fields_by_key_marker`] is built on the pair: flatten, drop every
//! path containing a marker, unflatten the rest.

use serde_json::{Map, Value};

/// Path delimiter used when none is configured.
pub const DEFAULT_DELIMITER: &str = ".";

/// Path segment that is never materialized by [`unflatten`].
pub const RESERVED_PROTO_KEY: &str = "__proto__";

/// Numeric segments above this always stay mapping keys.
const MAX_ARRAY_INDEX: usize = 10_000;

/// Rewrites a single path segment.
pub type KeyTransform = fn(&str) -> String;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for [`flatten`].
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Joins path segments.
    pub delimiter: String,
    /// Stop descending at this depth; the remaining sub-structure becomes one leaf.
    pub max_depth: Option<usize>,
    /// Treat arrays as atomic leaves instead of descending by index.
    pub safe: bool,
    /// Applied to every segment before joining.
    pub transform_key: Option<KeyTransform>,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_depth: None,
            safe: false,
            transform_key: None,
        }
    }
}

impl FlattenOptions {
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    pub fn with_transform_key(mut self, transform: KeyTransform) -> Self {
        self.transform_key = Some(transform);
        self
    }

    fn transform(&self, key: &str) -> String {
        match self.transform_key {
            Some(f) => f(key),
            None => key.to_string(),
        }
    }

    fn descends(&self, child: &Value, depth: usize) -> bool {
        let container = match child {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !self.safe && !items.is_empty(),
            _ => false,
        };
        container && self.max_depth.map_or(true, |max| depth < max)
    }
}

/// Options for [`unflatten`].
#[derive(Debug, Clone)]
pub struct UnflattenOptions {
    /// Splits keys into path segments.
    pub delimiter: String,
    /// Replace scalars that sit where a container is needed. When false, the
    /// first scalar written at a path wins and later deeper keys are dropped.
    pub overwrite: bool,
    /// Build mappings at every level, even for numeric-looking segments.
    pub object: bool,
    /// Applied to every segment after splitting.
    pub transform_key: Option<KeyTransform>,
}

impl Default for UnflattenOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            overwrite: false,
            object: false,
            transform_key: None,
        }
    }
}

impl UnflattenOptions {
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn object(mut self, object: bool) -> Self {
        self.object = object;
        self
    }

    pub fn with_transform_key(mut self, transform: KeyTransform) -> Self {
        self.transform_key = Some(transform);
        self
    }

    /// Options for re-flattening values that are themselves nested ("messy" input).
    fn reflatten(&self) -> FlattenOptions {
        FlattenOptions::default().with_delimiter(self.delimiter.clone())
    }
}

// ---------------------------------------------------------------------------
// Flatten
// ---------------------------------------------------------------------------

fn entries(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn flatten_step(
    acc: Map<String, Value>,
    node: &Value,
    prefix: Option<&str>,
    depth: usize,
    options: &FlattenOptions,
) -> Map<String, Value> {
    entries(node).into_iter().fold(acc, |mut acc, (key, child)| {
        let segment = options.transform(&key);
        let path = match prefix {
            Some(prefix) => format!("{prefix}{}{segment}", options.delimiter),
            None => segment,
        };
        if options.descends(child, depth) {
            flatten_step(acc, child, Some(&path), depth + 1, options)
        } else {
            acc.insert(path, child.clone());
            acc
        }
    })
}

/// Flatten `value` into a single-level map of delimiter-joined paths.
///
/// Empty objects and arrays are kept as leaves. Scalars at the top level
/// have no paths and flatten to an empty map.
pub fn flatten(value: &Value, options: &FlattenOptions) -> Map<String, Value> {
    flatten_step(Map::new(), value, None, 1, options)
}

// ---------------------------------------------------------------------------
// Unflatten
// ---------------------------------------------------------------------------

/// Split `key` into segments; `None` when any segment is [`RESERVED_PROTO_KEY`].
fn parse_path(key: &str, options: &UnflattenOptions) -> Option<Vec<String>> {
    let raw: Vec<&str> = if options.delimiter.is_empty() {
        vec![key]
    } else {
        key.split(options.delimiter.as_str()).collect()
    };
    raw.into_iter()
        .map(|segment| {
            let segment = match options.transform_key {
                Some(f) => f(segment),
                None => segment.to_string(),
            };
            (segment != RESERVED_PROTO_KEY).then_some(segment)
        })
        .collect()
}

/// Whether writing `segments` into `root` must be skipped because a scalar
/// (including `null`) already sits on the path and `overwrite` is off.
fn is_blocked(root: &Map<String, Value>, segments: &[String], overwrite: bool) -> bool {
    let prefix = &segments[..segments.len().saturating_sub(1)];
    let mut node = root;
    for segment in prefix {
        match node.get(segment) {
            None | Some(Value::Array(_)) => return false,
            Some(Value::Object(next)) => node = next,
            Some(_) => return !overwrite,
        }
    }
    false
}

fn index_map(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

/// Intermediate containers are always built as mappings; [`settle`] decides
/// which of them become arrays once every sibling key is known.
fn place(node: &mut Map<String, Value>, segments: &[String], leaf: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        node.insert(head.clone(), leaf);
        return;
    }
    let slot = node.entry(head.clone()).or_insert(Value::Null);
    let container = match std::mem::take(slot) {
        Value::Object(map) => map,
        Value::Array(items) => index_map(items),
        _ => Map::new(),
    };
    *slot = Value::Object(container);
    if let Value::Object(map) = slot {
        place(map, rest, leaf);
    }
}

/// Canonical array index: ASCII digits, no leading zero, within the cap.
fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<usize>().ok().filter(|i| *i <= MAX_ARRAY_INDEX)
}

/// A non-empty mapping whose keys are exactly `0..len` becomes an array.
fn into_array(map: Map<String, Value>) -> Value {
    let len = map.len();
    let indexed = len > 0 && map.keys().all(|k| array_index(k).is_some_and(|i| i < len));
    if !indexed {
        return Value::Object(map);
    }
    let mut entries: Vec<(usize, Value)> = map
        .into_iter()
        .filter_map(|(k, v)| array_index(&k).map(|i| (i, v)))
        .collect();
    entries.sort_by_key(|(i, _)| *i);
    Value::Array(entries.into_iter().map(|(_, v)| v).collect())
}

fn settle_entries(map: Map<String, Value>, object: bool) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, settle(v, object))).collect()
}

fn settle(value: Value, object: bool) -> Value {
    match value {
        Value::Object(map) => {
            let map = settle_entries(map, object);
            if object {
                Value::Object(map)
            } else {
                into_array(map)
            }
        }
        other => other,
    }
}

/// Re-flatten values that are still nested so every key is a full path.
fn expand(flat: &Map<String, Value>, options: &UnflattenOptions) -> Map<String, Value> {
    let reflatten = options.reflatten();
    flat.iter().fold(Map::new(), |mut acc, (key, value)| {
        let nested = match value {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => false,
        };
        if nested {
            for (path, leaf) in flatten(value, &reflatten) {
                acc.insert(format!("{key}{}{path}", options.delimiter), leaf);
            }
        } else {
            acc.insert(key.clone(), value.clone());
        }
        acc
    })
}

/// Rebuild nested structure from a map of delimiter-joined paths.
///
/// Non-object input is returned unchanged and the top level is always a
/// mapping. Below it, a container whose keys are exactly `0, 1, .. n-1`
/// becomes an array unless [`UnflattenOptions::object`] is set; any other
/// mix of keys stays a mapping, so nothing is padded or dropped. Paths
/// through [`RESERVED_PROTO_KEY`] are ignored.
pub fn unflatten(value: &Value, options: &UnflattenOptions) -> Value {
    let Value::Object(flat) = value else {
        return value.clone();
    };

    let root = expand(flat, options)
        .into_iter()
        .fold(Map::new(), |mut root, (key, leaf)| {
            let Some(segments) = parse_path(&key, options) else {
                return root;
            };
            if !is_blocked(&root, &segments, options.overwrite) {
                place(&mut root, &segments, leaf);
            }
            root
        });
    Value::Object(settle_entries(root, options.object))
}

// ---------------------------------------------------------------------------
// Field stripping
// ---------------------------------------------------------------------------

/// Remove every field whose full path contains `marker`, using the default
/// delimiter.
pub fn strip_fields_by_key_marker(value: &Value, marker: &str) -> Value {
    strip_fields_by_key_markers(value, &[marker], DEFAULT_DELIMITER)
}

/// Remove every field whose full path contains any of `markers`.
///
/// Empty markers are ignored. Arrays are stripped element by element so the
/// top-level shape is preserved; scalars pass through.
pub fn strip_fields_by_key_markers<S: AsRef<str>>(
    value: &Value,
    markers: &[S],
    delimiter: &str,
) -> Value {
    let markers: Vec<&str> = markers
        .iter()
        .map(AsRef::as_ref)
        .filter(|m| !m.is_empty())
        .collect();
    if markers.is_empty() {
        return value.clone();
    }

    match value {
        Value::Object(_) => {
            let kept: Map<String, Value> =
                flatten(value, &FlattenOptions::default().with_delimiter(delimiter))
                    .into_iter()
                    .filter(|(path, _)| !markers.iter().any(|m| path.contains(m)))
                    .collect();
            unflatten(
                &Value::Object(kept),
                &UnflattenOptions::default().with_delimiter(delimiter),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| strip_fields_by_key_markers(item, &markers, delimiter))
                .collect(),
        ),
        other => other.clone(),
    }
}
