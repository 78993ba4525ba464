use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::task::Task;

/// Timestamp layout used when a field is stringified for fingerprinting.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A comparable scalar attribute of a [`Task`].
///
/// Fields stand in for attribute names wherever a caller picks which
/// attributes take part in a comparison: subtree fingerprints, the
/// matcher's attribute list, and the legacy differ's allowlist.
///
/// The declaration order is the canonical order used when a field set is
/// normalized (see [`canonical_fields`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Slug,
    Index,
    Level,
    PlannedStart,
    PlannedFinish,
    ActualStart,
    ActualFinish,
    Milestone,
    Note,
    Link,
    Flags,
    Priority,
    PercentComplete,
}

/// Attributes compared by the tree matcher, in comparison order.
pub const MATCH_FIELDS: [Field; 5] = [
    Field::Name,
    Field::PlannedStart,
    Field::PlannedFinish,
    Field::ActualStart,
    Field::ActualFinish,
];

impl Field {
    /// Every field, in canonical order.
    pub const ALL: [Field; 14] = [
        Field::Name,
        Field::Slug,
        Field::Index,
        Field::Level,
        Field::PlannedStart,
        Field::PlannedFinish,
        Field::ActualStart,
        Field::ActualFinish,
        Field::Milestone,
        Field::Note,
        Field::Link,
        Field::Flags,
        Field::Priority,
        Field::PercentComplete,
    ];

    /// The attribute name, as it appears in the dict form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Slug => "slug",
            Field::Index => "index",
            Field::Level => "level",
            Field::PlannedStart => "planned_start",
            Field::PlannedFinish => "planned_finish",
            Field::ActualStart => "actual_start",
            Field::ActualFinish => "actual_finish",
            Field::Milestone => "milestone",
            Field::Note => "note",
            Field::Link => "link",
            Field::Flags => "flags",
            Field::Priority => "priority",
            Field::PercentComplete => "percent_complete",
        }
    }

    /// Stringify this field's value on `task`.
    ///
    /// Flags are sorted before joining so the result does not depend on
    /// insertion order. An absent timestamp stringifies to the empty string.
    pub fn stringify(&self, task: &Task) -> String {
        match self {
            Field::Name => task.name.clone(),
            Field::Slug => task.slug.clone(),
            Field::Index => task.index.to_string(),
            Field::Level => task.level.to_string(),
            Field::PlannedStart => stamp(task.planned_start),
            Field::PlannedFinish => stamp(task.planned_finish),
            Field::ActualStart => stamp(task.actual_start),
            Field::ActualFinish => stamp(task.actual_finish),
            Field::Milestone => task.milestone.to_string(),
            Field::Note => task.note.clone(),
            Field::Link => task.link.clone(),
            Field::Flags => {
                // BTreeSet iteration is already sorted.
                task.flags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
            }
            Field::Priority => task.priority.to_string(),
            Field::PercentComplete => task.percent_complete.to_string(),
        }
    }

    /// Returns `true` if `a` and `b` hold the same value for this field.
    pub fn equal(&self, a: &Task, b: &Task) -> bool {
        match self {
            Field::Name => a.name == b.name,
            Field::Slug => a.slug == b.slug,
            Field::Index => a.index == b.index,
            Field::Level => a.level == b.level,
            Field::PlannedStart => a.planned_start == b.planned_start,
            Field::PlannedFinish => a.planned_finish == b.planned_finish,
            Field::ActualStart => a.actual_start == b.actual_start,
            Field::ActualFinish => a.actual_finish == b.actual_finish,
            Field::Milestone => a.milestone == b.milestone,
            Field::Note => a.note == b.note,
            Field::Link => a.link == b.link,
            Field::Flags => a.flags == b.flags,
            Field::Priority => a.priority == b.priority,
            Field::PercentComplete => a.percent_complete == b.percent_complete,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| ModelError::UnknownField(name.to_string()))
    }
}

/// Normalize a caller-supplied field tuple: sorted into canonical order with
/// duplicates removed. Two tuples naming the same fields normalize equal.
pub fn canonical_fields(fields: &[Field]) -> Vec<Field> {
    let mut out = fields.to_vec();
    out.sort();
    out.dedup();
    out
}

/// Parse a comma-separated list of field names, e.g. `"name,planned_start"`.
pub fn parse_field_list(list: &str) -> Result<Vec<Field>, ModelError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

pub(crate) fn stamp(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format(STAMP_FORMAT).to_string())
        .unwrap_or_default()
}
