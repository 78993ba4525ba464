//! Greedy sibling-list matcher.
//!
//! Pairs the children of two tasks (or two schedules' root lists) without
//! any shared identifiers. Each old task takes the best-scoring new task at
//! or after the cursor left by the previous match; the cursor only moves
//! forward. This is O(|old| × |new|) per level and deliberately does not
//! search for a globally optimal alignment.

use std::fmt;

use plandiff_model::{Field, SubtreeHasher, Task, MATCH_FIELDS};
use tracing::debug;

/// One attribute compared by the matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Field(Field),
    /// Fingerprint of the task's descendants.
    SubtreeHash,
}

impl Attribute {
    /// The matcher's attribute list, in comparison order.
    pub const ALL: [Attribute; 6] = [
        Attribute::Field(MATCH_FIELDS[0]),
        Attribute::Field(MATCH_FIELDS[1]),
        Attribute::Field(MATCH_FIELDS[2]),
        Attribute::Field(MATCH_FIELDS[3]),
        Attribute::Field(MATCH_FIELDS[4]),
        Attribute::SubtreeHash,
    ];
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Field(field) => field.fmt(f),
            Attribute::SubtreeHash => f.write_str("subtree_hash"),
        }
    }
}

/// Outcome for one position of a matched sibling list.
#[derive(Clone, Debug, PartialEq)]
pub enum Pairing<'a> {
    /// Old and new task paired; `differences` lists the attributes that differ.
    Matched {
        old: &'a Task,
        new: &'a Task,
        differences: Vec<Attribute>,
    },
    /// Present only in the new list.
    Added(&'a Task),
    /// Present only in the old list.
    Removed(&'a Task),
}

/// Matches sibling lists, sharing one fingerprint cache across calls.
pub struct Matcher<'a> {
    hasher: SubtreeHasher<'a>,
    hash_fields: Vec<Field>,
}

impl<'a> Matcher<'a> {
    pub fn new(hash_fields: &[Field]) -> Self {
        Self {
            hasher: SubtreeHasher::new(),
            hash_fields: hash_fields.to_vec(),
        }
    }

    /// Attributes of [`Attribute::ALL`] on which `old` and `new` differ.
    pub fn differences(&mut self, old: &'a Task, new: &'a Task) -> Vec<Attribute> {
        Attribute::ALL
            .iter()
            .copied()
            .filter(|attr| match attr {
                Attribute::Field(field) => !field.equal(old, new),
                Attribute::SubtreeHash => {
                    self.hasher.hash(old, &self.hash_fields) != self.hasher.hash(new, &self.hash_fields)
                }
            })
            .collect()
    }

    /// Pair `old` against `new`.
    ///
    /// The non-removed entries of the result, read in order, are exactly
    /// the tasks of `new` in order. Ties between equally good candidates go
    /// to the earliest one.
    pub fn match_siblings(&mut self, old: &'a [Task], new: &'a [Task]) -> Vec<Pairing<'a>> {
        debug!(old = old.len(), new = new.len(), "matching sibling lists");
        let mut out = Vec::with_capacity(old.len().max(new.len()));
        let mut cursor = 0;

        for a in old {
            let mut best: Option<(usize, Vec<Attribute>)> = None;
            for (j, b) in new.iter().enumerate().skip(cursor) {
                let differences = self.differences(a, b);
                if !self.qualifies(a, b, &differences) {
                    continue;
                }
                let better = best
                    .as_ref()
                    .map_or(true, |(_, current)| differences.len() < current.len());
                if better {
                    let exact = differences.is_empty();
                    best = Some((j, differences));
                    if exact {
                        break;
                    }
                }
            }

            match best {
                Some((j, differences)) => {
                    out.extend(new[cursor..j].iter().map(Pairing::Added));
                    out.push(Pairing::Matched {
                        old: a,
                        new: &new[j],
                        differences,
                    });
                    cursor = j + 1;
                }
                None => out.push(Pairing::Removed(a)),
            }
        }

        out.extend(new[cursor..].iter().map(Pairing::Added));
        out
    }

    /// A candidate qualifies when it agrees with `a` on at least one
    /// attribute. Two leaves always share the empty fingerprint, so that
    /// agreement alone does not count.
    fn qualifies(&self, a: &Task, b: &Task, differences: &[Attribute]) -> bool {
        let mut agreements = Attribute::ALL.len() - differences.len();
        if a.is_leaf() && b.is_leaf() {
            agreements -= 1;
        }
        agreements > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 5, d).and_then(|d| d.and_hms_opt(8, 0, 0))
    }

    fn task(name: &str, start: u32, finish: u32) -> Task {
        Task::new(name)
            .with_planned(day(start), day(finish))
            .with_actual(day(start), day(finish))
    }

    fn shape(pairings: &[Pairing<'_>]) -> Vec<String> {
        pairings
            .iter()
            .map(|p| match p {
                Pairing::Matched { old, new, differences } => {
                    format!("{}={}/{}", old.name, new.name, differences.len())
                }
                Pairing::Added(t) => format!("+{}", t.name),
                Pairing::Removed(t) => format!("-{}", t.name),
            })
            .collect()
    }

    #[test]
    fn identical_lists_match_exactly() {
        let a = vec![task("Plan", 1, 3), task("Dev", 4, 15)];
        let b = a.clone();
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(shape(&m.match_siblings(&a, &b)), ["Plan=Plan/0", "Dev=Dev/0"]);
    }

    #[test]
    fn insertion_reported_between_matches() {
        let a = vec![task("Plan", 1, 3), task("Dev", 4, 15)];
        let b = vec![task("Plan", 1, 3), task("Docs", 20, 25), task("Dev", 4, 15)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(
            shape(&m.match_siblings(&a, &b)),
            ["Plan=Plan/0", "+Docs", "Dev=Dev/0"]
        );
    }

    #[test]
    fn trailing_removal_and_addition() {
        let a = vec![task("Plan", 1, 3), task("Dev", 4, 15)];
        let b = vec![task("Plan", 1, 3)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(shape(&m.match_siblings(&a, &b)), ["Plan=Plan/0", "-Dev"]);

        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(shape(&m.match_siblings(&b, &a)), ["Plan=Plan/0", "+Dev"]);
    }

    #[test]
    fn unrelated_leaves_do_not_pair() {
        let a = vec![task("Plan", 1, 3)];
        let b = vec![task("Ship", 10, 12)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(shape(&m.match_siblings(&a, &b)), ["-Plan", "+Ship"]);
    }

    #[test]
    fn renamed_task_pairs_on_dates() {
        let a = vec![task("Plan", 1, 3)];
        let b = vec![task("Planning", 1, 3)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        let pairings = m.match_siblings(&a, &b);
        assert_eq!(shape(&pairings), ["Plan=Planning/1"]);
        match &pairings[0] {
            Pairing::Matched { differences, .. } => {
                assert_eq!(differences, &[Attribute::Field(Field::Name)]);
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn ties_go_to_earliest_candidate() {
        let a = vec![task("Plan", 1, 3)];
        let b = vec![task("Plan", 1, 4), task("Plan", 1, 5)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(shape(&m.match_siblings(&a, &b)), ["Plan=Plan/2", "+Plan"]);
    }

    #[test]
    fn matching_never_looks_behind_cursor() {
        // "Dev" pairs with the last entry first, so "Plan" cannot reach back.
        let a = vec![task("Dev", 4, 15), task("Plan", 1, 3)];
        let b = vec![task("Plan", 1, 3), task("Dev", 4, 15)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(
            shape(&m.match_siblings(&a, &b)),
            ["+Plan", "Dev=Dev/0", "-Plan"]
        );
    }

    #[test]
    fn better_later_candidate_wins() {
        let a = vec![task("Dev", 4, 15)];
        let b = vec![task("Dev", 4, 16), task("Dev", 4, 15)];
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert_eq!(shape(&m.match_siblings(&a, &b)), ["+Dev", "Dev=Dev/0"]);
    }

    #[test]
    fn subtree_hash_difference_detected() {
        let a = vec![Task::new("R").with_children([task("x", 1, 2)])];
        let b = vec![Task::new("R").with_children([task("y", 1, 2)])];
        let mut m = Matcher::new(&MATCH_FIELDS);
        match &m.match_siblings(&a, &b)[0] {
            Pairing::Matched { differences, .. } => {
                assert_eq!(differences, &[Attribute::SubtreeHash]);
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn hash_fields_limit_what_subtrees_compare() {
        let a = vec![Task::new("R").with_children([task("x", 1, 2)])];
        let b = vec![Task::new("R").with_children([task("x", 1, 9)])];
        let mut m = Matcher::new(&[Field::Name]);
        assert_eq!(shape(&m.match_siblings(&a, &b)), ["R=R/0"]);
    }

    #[test]
    fn empty_lists() {
        let a = vec![task("Plan", 1, 3)];
        let none: Vec<Task> = Vec::new();
        let mut m = Matcher::new(&MATCH_FIELDS);
        assert!(m.match_siblings(&none, &none).is_empty());
        assert_eq!(shape(&m.match_siblings(&a, &none)), ["-Plan"]);
        assert_eq!(shape(&m.match_siblings(&none, &a)), ["+Plan"]);
    }

    #[test]
    fn attribute_names() {
        let names: Vec<String> = Attribute::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            ["name", "planned_start", "planned_finish", "actual_start", "actual_finish", "subtree_hash"]
        );
    }
}
