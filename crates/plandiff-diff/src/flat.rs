//! Legacy flat-path diff over the dict form of two schedules.
//!
//! Unlike the tree matcher, this compares by key and by position: task
//! arrays (`tasks`, `children`) are walked index by index, so an insertion
//! makes every later sibling look changed. Changes are filtered to an
//! attribute allowlist and spliced into a copy of the left-hand dict.

use std::fmt;

use chrono::NaiveDateTime;
use plandiff_model::Schedule;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::DiffConfig;
use crate::error::DiffResult;

/// Keys whose arrays hold tasks and are compared position by position.
const TASK_CONTAINERS: [&str; 2] = ["tasks", "children"];

/// Key under which spliced changes are recorded in the annotated copy.
pub const DIFF_KEY: &str = "diff";

/// One step of a path into a dict-form value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a change, e.g. `tasks[0].children[2].planned_finish`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffPath(pub Vec<PathSegment>);

impl DiffPath {
    fn child_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// The attribute a change applies to: the final key, or `None` when
    /// the path ends in an array index (a whole task added or removed).
    pub fn attribute(&self) -> Option<&str> {
        match self.0.last() {
            Some(PathSegment::Key(key)) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Split into the path of the object that should record this change and
    /// the key it is recorded under.
    fn splice_point(&self) -> Option<(&[PathSegment], String)> {
        match self.0.as_slice() {
            [parent @ .., PathSegment::Key(key)] => Some((parent, key.clone())),
            [parent @ .., PathSegment::Key(key), PathSegment::Index(i)] => {
                Some((parent, format!("{key}[{i}]")))
            }
            _ => None,
        }
    }
}

impl fmt::Display for DiffPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if pos == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// A single path-addressed change.
#[derive(Clone, Debug, PartialEq)]
pub enum FlatChange {
    Added { path: DiffPath, value: Value },
    Removed { path: DiffPath, value: Value },
    Changed { path: DiffPath, old: Value, new: Value },
}

impl FlatChange {
    pub fn path(&self) -> &DiffPath {
        match self {
            FlatChange::Added { path, .. }
            | FlatChange::Removed { path, .. }
            | FlatChange::Changed { path, .. } => path,
        }
    }

    fn annotation(&self) -> Value {
        match self {
            FlatChange::Added { value, .. } => json!({ "added": value }),
            FlatChange::Removed { value, .. } => json!({ "removed": value }),
            FlatChange::Changed { old, new, .. } => json!({ "old": old, "new": new }),
        }
    }
}

/// Result of a flat-path diff.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatDiff {
    /// Allowlisted changes in traversal order.
    pub changes: Vec<FlatChange>,
    /// Copy of the left-hand dict with changes recorded under [`DIFF_KEY`].
    pub annotated: Value,
    /// Changes whose location could not be resolved in the left-hand dict.
    pub skipped: Vec<DiffPath>,
}

impl FlatDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// One `path: description` line per change.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for change in &self.changes {
            let line = match change {
                FlatChange::Added { path, value } => format!("[+] {path}: {value}"),
                FlatChange::Removed { path, value } => format!("[-] {path}: {value}"),
                FlatChange::Changed { path, old, new } => format!("[M] {path}: {old} -> {new}"),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// `{"changes": [...], "annotated": ..., "skipped": [...]}` with paths
    /// rendered as strings.
    pub fn to_json(&self) -> Value {
        let changes: Vec<Value> = self
            .changes
            .iter()
            .map(|change| {
                let mut entry = match change.annotation() {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                entry.insert("path".into(), Value::from(change.path().to_string()));
                Value::Object(entry)
            })
            .collect();
        let skipped: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
        json!({
            "changes": changes,
            "annotated": self.annotated,
            "skipped": skipped,
        })
    }
}

/// Diff two schedules through their dict form.
pub fn flat_diff_schedules(old: &Schedule, new: &Schedule, config: &DiffConfig) -> DiffResult<FlatDiff> {
    Ok(flat_diff(&old.to_value()?, &new.to_value()?, config))
}

/// Diff two dict-form values.
pub fn flat_diff(old: &Value, new: &Value, config: &DiffConfig) -> FlatDiff {
    let mut raw = Vec::new();
    walk(old, new, &DiffPath::default(), config.whole_days, &mut raw);

    let changes: Vec<FlatChange> = raw
        .into_iter()
        .filter(|change| match change.path().attribute() {
            Some(attribute) => config.reports_attribute(attribute),
            None => true,
        })
        .collect();

    let mut annotated = old.clone();
    let mut skipped = Vec::new();
    for change in &changes {
        if !splice(&mut annotated, change) {
            warn!(path = %change.path(), "change path does not resolve; skipping");
            skipped.push(change.path().clone());
        }
    }
    debug!(changes = changes.len(), skipped = skipped.len(), "flat diff complete");

    FlatDiff {
        changes,
        annotated,
        skipped,
    }
}

fn walk(old: &Value, new: &Value, path: &DiffPath, whole_days: bool, out: &mut Vec<FlatChange>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, old_value) in a {
                let child = path.child_key(key);
                match b.get(key) {
                    Some(new_value) => walk(old_value, new_value, &child, whole_days, out),
                    None => out.push(FlatChange::Removed {
                        path: child,
                        value: old_value.clone(),
                    }),
                }
            }
            for (key, new_value) in b {
                if !a.contains_key(key) {
                    out.push(FlatChange::Added {
                        path: path.child_key(key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(a), Value::Array(b)) if is_task_container(path) => {
            for (i, old_value) in a.iter().enumerate() {
                let child = path.child_index(i);
                match b.get(i) {
                    Some(new_value) => walk(old_value, new_value, &child, whole_days, out),
                    None => out.push(FlatChange::Removed {
                        path: child,
                        value: old_value.clone(),
                    }),
                }
            }
            for (i, new_value) in b.iter().enumerate().skip(a.len()) {
                out.push(FlatChange::Added {
                    path: path.child_index(i),
                    value: new_value.clone(),
                });
            }
        }
        _ => {
            if !values_equal(old, new, whole_days) {
                out.push(FlatChange::Changed {
                    path: path.clone(),
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }
}

fn is_task_container(path: &DiffPath) -> bool {
    path.attribute()
        .is_some_and(|key| TASK_CONTAINERS.contains(&key))
}

fn values_equal(old: &Value, new: &Value, whole_days: bool) -> bool {
    if old == new {
        return true;
    }
    if !whole_days {
        return false;
    }
    match (old.as_str().and_then(parse_stamp), new.as_str().and_then(parse_stamp)) {
        (Some(a), Some(b)) => a.date() == b.date(),
        _ => false,
    }
}

fn parse_stamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Record `change` on its containing object. Returns `false` if the
/// container does not exist in `root` or cannot hold a diff record.
fn splice(root: &mut Value, change: &FlatChange) -> bool {
    let Some((parent, key)) = change.path().splice_point() else {
        return false;
    };
    let Some(Value::Object(container)) = resolve_mut(root, parent) else {
        return false;
    };
    let record = container
        .entry(DIFF_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    match record {
        Value::Object(record) => {
            record.insert(key, change.annotation());
            true
        }
        _ => false,
    }
}

fn resolve_mut<'v>(root: &'v mut Value, path: &[PathSegment]) -> Option<&'v mut Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        PathSegment::Key(key) => value.as_object_mut()?.get_mut(key),
        PathSegment::Index(i) => value.as_array_mut()?.get_mut(*i),
    })
}
