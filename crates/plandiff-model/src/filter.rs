//! Pruning filters. Each returns a new [`Schedule`] with derived fields
//! refreshed; the input is left untouched.

use std::collections::BTreeSet;

use crate::schedule::Schedule;
use crate::task::Task;

impl Schedule {
    /// Keep tasks carrying any of `flags`, plus their ancestors.
    pub fn with_flags(&self, flags: &BTreeSet<String>) -> Schedule {
        self.retain(|t| !t.flags.is_disjoint(flags))
    }

    /// Drop every task carrying any of `flags`, together with its subtree.
    pub fn without_flags(&self, flags: &BTreeSet<String>) -> Schedule {
        let mut out = self.clone();
        out.tasks = drop_matching(&self.tasks, &|t: &Task| !t.flags.is_disjoint(flags));
        out.refresh();
        out
    }

    /// Keep milestones, plus their ancestors.
    pub fn milestones_only(&self) -> Schedule {
        self.retain(|t| t.milestone)
    }

    /// Keep tasks matching `keep` and every ancestor of a kept task.
    pub fn retain(&self, keep: impl Fn(&Task) -> bool) -> Schedule {
        let mut out = self.clone();
        out.tasks = keep_matching(&self.tasks, &keep);
        out.refresh();
        out
    }
}

fn keep_matching(tasks: &[Task], keep: &dyn Fn(&Task) -> bool) -> Vec<Task> {
    tasks
        .iter()
        .filter_map(|task| {
            let children = keep_matching(&task.children, keep);
            if keep(task) || !children.is_empty() {
                let mut kept = task.clone();
                kept.children = children;
                Some(kept)
            } else {
                None
            }
        })
        .collect()
}

fn drop_matching(tasks: &[Task], reject: &dyn Fn(&Task) -> bool) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| !reject(task))
        .map(|task| {
            let mut kept = task.clone();
            kept.children = drop_matching(&task.children, reject);
            kept
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Schedule {
        Schedule::new(
            "P",
            vec![Task::new("Root").with_children([
                Task::new("Design").with_children([
                    Task::new("Spec").with_flags(["pm"]),
                    Task::new("Review").with_flags(["qe"]).milestone(),
                ]),
                Task::new("Build").with_flags(["dev"]),
            ])],
        )
    }

    fn names(schedule: &Schedule) -> Vec<&str> {
        schedule.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn flag_filter_keeps_ancestors() {
        let filtered = sample().with_flags(&set(&["qe"]));
        assert_eq!(names(&filtered), ["Root", "Design", "Review"]);
        assert_eq!(filtered.used_flags, set(&["qe"]));
    }

    #[test]
    fn flag_exclusion_drops_subtree() {
        let filtered = sample().without_flags(&set(&["dev", "pm"]));
        assert_eq!(names(&filtered), ["Root", "Design", "Review"]);
        assert_eq!(filtered.used_flags, set(&["qe"]));
    }

    #[test]
    fn milestone_filter() {
        let filtered = sample().milestones_only();
        assert_eq!(names(&filtered), ["Root", "Design", "Review"]);
    }

    #[test]
    fn nothing_matches_yields_empty_schedule() {
        let filtered = sample().with_flags(&set(&["ops"]));
        assert!(filtered.is_empty());
        assert!(filtered.used_flags.is_empty());
    }

    #[test]
    fn source_schedule_untouched() {
        let schedule = sample();
        let _ = schedule.milestones_only();
        assert_eq!(schedule.task_count(), 5);
    }
}
