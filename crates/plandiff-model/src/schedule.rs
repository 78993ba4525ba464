use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::task::Task;

/// One revision in a schedule's change history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub date: NaiveDateTime,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub message: String,
}

/// A full schedule: one task tree plus project-level metadata.
///
/// After [`Schedule::new`] there is at most one root task; several source
/// roots are merged under a synthetic top task named after the schedule.
/// `used_flags`, `start` and `finish` are derived from the tasks and must be
/// refreshed with [`Schedule::refresh`] after any mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub finish: Option<NaiveDateTime>,
    /// Revision id → entry.
    #[serde(default)]
    pub changelog: BTreeMap<String, ChangelogEntry>,
    #[serde(default)]
    pub modification_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub used_flags: BTreeSet<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Schedule {
    /// Build a normalized schedule from imported root tasks.
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        let name = name.into();
        let mut schedule = Self {
            slug: slugify(&name),
            name,
            start: None,
            finish: None,
            changelog: BTreeMap::new(),
            modification_time: None,
            used_flags: BTreeSet::new(),
            tasks,
        };
        schedule.normalize();
        schedule
    }

    /// A schedule with no tasks.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn with_changelog(mut self, changelog: BTreeMap<String, ChangelogEntry>) -> Self {
        self.changelog = changelog;
        self
    }

    pub fn with_modification_time(mut self, time: NaiveDateTime) -> Self {
        self.modification_time = Some(time);
        self
    }

    /// Merge multiple roots, assign levels, indices and slugs, and refresh
    /// derived fields.
    pub fn normalize(&mut self) {
        if self.tasks.len() > 1 {
            debug!(roots = self.tasks.len(), "merging roots under synthetic top task");
            let roots = std::mem::take(&mut self.tasks);
            let top = Task::new(self.name.clone()).with_children(roots);
            self.tasks.push(top);
        }
        assign_levels(&mut self.tasks, 1);
        assign_slugs(&mut self.tasks);
        self.refresh();
    }

    /// Recompute `used_flags`, `start` and `finish` from the tasks.
    pub fn refresh(&mut self) {
        let mut flags = BTreeSet::new();
        let mut start: Option<NaiveDateTime> = None;
        let mut finish: Option<NaiveDateTime> = None;
        for task in self.iter() {
            flags.extend(task.flags.iter().cloned());
            for s in [task.planned_start, task.actual_start].into_iter().flatten() {
                start = Some(start.map_or(s, |cur| cur.min(s)));
            }
            for f in [task.planned_finish, task.actual_finish].into_iter().flatten() {
                finish = Some(finish.map_or(f, |cur| cur.max(f)));
            }
        }
        self.used_flags = flags;
        self.start = start;
        self.finish = finish;
    }

    /// The single root after normalization, if any.
    pub fn root(&self) -> Option<&Task> {
        self.tasks.first()
    }

    /// Pre-order walk over every task in the schedule.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().flat_map(Task::iter)
    }

    pub fn task_count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Find a task by slug.
    pub fn find(&self, slug: &str) -> Option<&Task> {
        self.iter().find(|t| t.slug == slug)
    }

    /// Phase tasks paired with their parent's slug (`None` for roots).
    pub fn phases(&self) -> Vec<(Option<&str>, &Task)> {
        fn walk<'a>(
            parent: Option<&'a str>,
            tasks: &'a [Task],
            out: &mut Vec<(Option<&'a str>, &'a Task)>,
        ) {
            for task in tasks {
                if task.is_phase() {
                    out.push((parent, task));
                }
                walk(Some(task.slug.as_str()), &task.children, out);
            }
        }
        let mut out = Vec::new();
        walk(None, &self.tasks, &mut out);
        out
    }

    /// Dict form of the whole schedule.
    pub fn to_value(&self) -> ModelResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a schedule from its dict form.
    ///
    /// The input is taken as-is apart from the actual-date invariant; call
    /// [`Schedule::normalize`] to treat it like freshly imported data.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        if !value.is_object() {
            return Err(ModelError::shape("schedule must be an object"));
        }
        let mut schedule: Schedule = serde_json::from_value(value)?;
        for task in &mut schedule.tasks {
            task.enforce_actual_order_deep();
        }
        Ok(schedule)
    }
}

fn assign_levels(tasks: &mut [Task], level: u32) {
    for (pos, task) in tasks.iter_mut().enumerate() {
        task.level = level;
        if task.index == 0 {
            task.index = pos as u32 + 1;
        }
        assign_levels(&mut task.children, level + 1);
    }
}

fn assign_slugs(tasks: &mut [Task]) {
    fn collect(tasks: &[Task], taken: &mut HashSet<String>) {
        for task in tasks {
            if !task.slug.is_empty() {
                taken.insert(task.slug.clone());
            }
            collect(&task.children, taken);
        }
    }
    fn fill(tasks: &mut [Task], taken: &mut HashSet<String>) {
        for task in tasks {
            if task.slug.is_empty() {
                let base = slugify(&task.name);
                let mut candidate = base.clone();
                let mut n = 2;
                while taken.contains(&candidate) {
                    candidate = format!("{base}_{n}");
                    n += 1;
                }
                taken.insert(candidate.clone());
                task.slug = candidate;
            }
            fill(&mut task.children, taken);
        }
    }
    let mut taken = HashSet::new();
    collect(tasks, &mut taken);
    fill(tasks, &mut taken);
}

/// Lowercase `name`, collapsing runs of non-alphanumerics to `_`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("task");
    }
    slug
}
