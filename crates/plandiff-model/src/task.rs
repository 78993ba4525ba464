use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelResult;
use crate::field::Field;
use crate::hash::SubtreeHasher;

/// Flag marking a task as a project phase.
pub const PHASE_FLAG: &str = "phase";

/// Priority assigned when the source document does not carry one.
pub const DEFAULT_PRIORITY: i64 = 500;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_level() -> u32 {
    1
}

/// One node of a schedule tree: an activity, milestone, or phase.
///
/// Tasks own their children; insertion order is display order. There is no
/// parent back-reference: functions that need ancestry take it as a
/// parameter or walk down from the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Identifier derived from `name`, filled in by [`crate::Schedule::new`].
    #[serde(default)]
    pub slug: String,
    /// Sequence number; sibling-relative or global depending on the source format.
    #[serde(default)]
    pub index: u32,
    /// Depth in the tree, root = 1.
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub planned_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub planned_finish: Option<NaiveDateTime>,
    #[serde(default)]
    pub actual_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub actual_finish: Option<NaiveDateTime>,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub flags: BTreeSet<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Completion percentage. Out-of-range source values are kept as-is.
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default)]
    pub children: Vec<Task>,
}

/// Borrowed view of a task's scalar attributes, used for the dict form
/// without `children`.
#[derive(Serialize)]
struct TaskAttributes<'a> {
    name: &'a str,
    slug: &'a str,
    index: u32,
    level: u32,
    planned_start: Option<NaiveDateTime>,
    planned_finish: Option<NaiveDateTime>,
    actual_start: Option<NaiveDateTime>,
    actual_finish: Option<NaiveDateTime>,
    milestone: bool,
    note: &'a str,
    link: &'a str,
    flags: &'a BTreeSet<String>,
    priority: i64,
    percent_complete: f64,
}

impl Task {
    /// Create a task with default attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: String::new(),
            index: 0,
            level: 1,
            planned_start: None,
            planned_finish: None,
            actual_start: None,
            actual_finish: None,
            milestone: false,
            note: String::new(),
            link: String::new(),
            flags: BTreeSet::new(),
            priority: DEFAULT_PRIORITY,
            percent_complete: 0.0,
            children: Vec::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_planned(
        mut self,
        start: Option<NaiveDateTime>,
        finish: Option<NaiveDateTime>,
    ) -> Self {
        self.planned_start = start;
        self.planned_finish = finish;
        self
    }

    pub fn with_actual(
        mut self,
        start: Option<NaiveDateTime>,
        finish: Option<NaiveDateTime>,
    ) -> Self {
        self.set_actual(start, finish);
        self
    }

    /// Mark as a milestone. Collapses the planned range onto its start.
    pub fn milestone(mut self) -> Self {
        self.milestone = true;
        if self.planned_start.is_some() {
            self.planned_finish = self.planned_start;
        }
        self
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_percent_complete(mut self, percent: f64) -> Self {
        self.percent_complete = percent;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.add_note(note);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Task>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the actual dates, raising the finish to the start if it precedes it.
    pub fn set_actual(&mut self, start: Option<NaiveDateTime>, finish: Option<NaiveDateTime>) {
        self.actual_start = start;
        self.actual_finish = finish;
        self.enforce_actual_order();
    }

    pub(crate) fn enforce_actual_order(&mut self) {
        if let (Some(start), Some(finish)) = (self.actual_start, self.actual_finish) {
            if finish < start {
                self.actual_finish = Some(start);
            }
        }
    }

    /// Append to the note, separating from existing text with a newline.
    pub fn add_note(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.note.is_empty() {
            self.note.push('\n');
        }
        self.note.push_str(text);
    }

    pub fn add_child(&mut self, child: Task) {
        self.children.push(child);
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_phase(&self) -> bool {
        self.flags.contains(PHASE_FLAG)
    }

    /// Number of tasks below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    /// Depth-first, pre-order walk over this task and its descendants.
    pub fn iter(&self) -> TaskIter<'_> {
        TaskIter { stack: vec![self] }
    }

    /// Structural fingerprint of this task's descendants over `fields`.
    ///
    /// For each child in order, the stringified field values are appended,
    /// followed by the child's own fingerprint. Leaves fingerprint to the
    /// empty string. This is a plain concatenation, not a digest: two
    /// different subtrees can collide when their strings happen to
    /// concatenate identically.
    ///
    /// Computes from scratch on every call; diffing goes through
    /// [`SubtreeHasher`] instead.
    pub fn subtree_hash(&self, fields: &[Field]) -> String {
        SubtreeHasher::new().hash(self, fields).to_string()
    }

    /// Dict form of the whole subtree.
    pub fn to_value(&self) -> ModelResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Dict form of this task's own attributes, without `children`.
    pub fn attributes(&self) -> ModelResult<Value> {
        let view = TaskAttributes {
            name: &self.name,
            slug: &self.slug,
            index: self.index,
            level: self.level,
            planned_start: self.planned_start,
            planned_finish: self.planned_finish,
            actual_start: self.actual_start,
            actual_finish: self.actual_finish,
            milestone: self.milestone,
            note: &self.note,
            link: &self.link,
            flags: &self.flags,
            priority: self.priority,
            percent_complete: self.percent_complete,
        };
        Ok(serde_json::to_value(view)?)
    }

    /// Rebuild a task subtree from its dict form.
    ///
    /// Fails with a shape error when a task is missing its `name` or a value
    /// has the wrong type.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        let mut task: Task = serde_json::from_value(value)?;
        task.enforce_actual_order_deep();
        Ok(task)
    }

    pub(crate) fn enforce_actual_order_deep(&mut self) {
        self.enforce_actual_order();
        for child in &mut self.children {
            child.enforce_actual_order_deep();
        }
    }
}

// Unlinks descendants onto a heap stack so dropping a deep chain does not
// recurse once per level.
impl Drop for Task {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut task) = pending.pop() {
            pending.append(&mut task.children);
        }
    }
}

/// Pre-order iterator returned by [`Task::iter`].
pub struct TaskIter<'a> {
    stack: Vec<&'a Task>,
}

impl<'a> Iterator for TaskIter<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let task = self.stack.pop()?;
        self.stack.extend(task.children.iter().rev());
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::MATCH_FIELDS;
    use chrono::NaiveDate;
    use serde_json::json;

    fn day(d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 1, d).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    #[test]
    fn defaults() {
        let task = Task::new("Plan");
        assert_eq!(task.priority, 500);
        assert_eq!(task.level, 1);
        assert_eq!(task.percent_complete, 0.0);
        assert!(task.is_leaf());
    }

    #[test]
    fn actual_finish_raised_to_start() {
        let task = Task::new("t").with_actual(day(10), day(5));
        assert_eq!(task.actual_start, day(10));
        assert_eq!(task.actual_finish, day(10));
    }

    #[test]
    fn actual_order_kept_when_valid() {
        let task = Task::new("t").with_actual(day(5), day(10));
        assert_eq!(task.actual_finish, day(10));
    }

    #[test]
    fn notes_concatenate() {
        let mut task = Task::new("t");
        task.add_note("first");
        task.add_note("");
        task.add_note("second");
        assert_eq!(task.note, "first\nsecond");
    }

    #[test]
    fn milestone_collapses_planned_range() {
        let task = Task::new("m").with_planned(day(3), day(9)).milestone();
        assert!(task.milestone);
        assert_eq!(task.planned_finish, day(3));
    }

    #[test]
    fn percent_complete_not_clamped() {
        let value = json!({"name": "over", "percent_complete": 140.5});
        let task = Task::from_value(value).unwrap();
        assert_eq!(task.percent_complete, 140.5);
    }

    #[test]
    fn preorder_iteration() {
        let tree = Task::new("r").with_children([
            Task::new("a").with_children([Task::new("a1")]),
            Task::new("b"),
        ]);
        let names: Vec<_> = tree.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["r", "a", "a1", "b"]);
        assert_eq!(tree.descendant_count(), 3);
    }

    #[test]
    fn leaf_hash_is_empty() {
        assert_eq!(Task::new("leaf").subtree_hash(&MATCH_FIELDS), "");
    }

    #[test]
    fn hash_concatenates_child_fields_and_child_hashes() {
        let tree = Task::new("r").with_children([
            Task::new("a").with_children([Task::new("x")]),
            Task::new("b"),
        ]);
        assert_eq!(tree.subtree_hash(&[Field::Name]), "axb");
    }

    #[test]
    fn hash_ignores_field_tuple_order() {
        let tree = Task::new("r")
            .with_children([Task::new("a").with_planned(day(1), day(2))]);
        assert_eq!(
            tree.subtree_hash(&[Field::PlannedStart, Field::Name]),
            tree.subtree_hash(&[Field::Name, Field::PlannedStart]),
        );
    }

    #[test]
    fn smaller_field_tuple_can_differ() {
        let tree = Task::new("r")
            .with_children([Task::new("a").with_planned(day(1), day(2))]);
        assert_ne!(
            tree.subtree_hash(&MATCH_FIELDS),
            tree.subtree_hash(&[Field::Name]),
        );
    }

    #[test]
    fn attributes_omit_children() {
        let tree = Task::new("r").with_children([Task::new("a")]);
        let attrs = tree.attributes().unwrap();
        assert_eq!(attrs["name"], "r");
        assert!(attrs.get("children").is_none());
    }

    #[test]
    fn dict_form_roundtrip() {
        let tree = Task::new("r")
            .with_flags(["qe"])
            .with_planned(day(1), day(4))
            .with_children([Task::new("a").milestone()]);
        let value = tree.to_value().unwrap();
        assert_eq!(value["planned_start"], "2024-01-01T00:00:00");
        assert_eq!(value["flags"], json!(["qe"]));
        assert_eq!(Task::from_value(value).unwrap(), tree);
    }

    #[test]
    fn missing_name_is_shape_error() {
        let err = Task::from_value(json!({"slug": "x"})).unwrap_err();
        assert!(matches!(err, crate::ModelError::Shape { .. }));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn reconstruction_enforces_actual_order() {
        let value = json!({
            "name": "r",
            "children": [{
                "name": "a",
                "actual_start": "2024-01-09T00:00:00",
                "actual_finish": "2024-01-02T00:00:00"
            }]
        });
        let task = Task::from_value(value).unwrap();
        assert_eq!(task.children[0].actual_finish, day(9));
    }
}
