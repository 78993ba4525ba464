//! Recursive change reports built from matcher pairings.

use std::slice;

use plandiff_model::{Field, Schedule, Task};
use serde::Serialize;
use tracing::debug;

use crate::config::DiffConfig;
use crate::matcher::{Attribute, Matcher, Pairing};

/// Marker-level status of a report node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    Unchanged,
    Added,
    Removed,
    Changed,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Unchanged => "unchanged",
            DiffStatus::Added => "added",
            DiffStatus::Removed => "removed",
            DiffStatus::Changed => "changed",
        }
    }

    /// Three-character marker used by the text rendering.
    pub fn marker(&self) -> &'static str {
        match self {
            DiffStatus::Unchanged => "   ",
            DiffStatus::Added => "[+]",
            DiffStatus::Removed => "[-]",
            DiffStatus::Changed => "[M]",
        }
    }
}

/// What happened at one compared position.
#[derive(Clone, Debug, PartialEq)]
pub enum DiffKind<'a> {
    Unchanged(&'a Task),
    Added(&'a Task),
    Removed(&'a Task),
    Changed {
        old: &'a Task,
        new: &'a Task,
        /// Scalar attributes that differ, in matcher order.
        attributes: Vec<Field>,
    },
}

/// One node of the change report. Every node carries its own children,
/// including unchanged ones.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffNode<'a> {
    pub kind: DiffKind<'a>,
    pub children: Vec<DiffNode<'a>>,
}

impl<'a> DiffNode<'a> {
    pub fn status(&self) -> DiffStatus {
        match self.kind {
            DiffKind::Unchanged(_) => DiffStatus::Unchanged,
            DiffKind::Added(_) => DiffStatus::Added,
            DiffKind::Removed(_) => DiffStatus::Removed,
            DiffKind::Changed { .. } => DiffStatus::Changed,
        }
    }

    /// The task shown for this node: the new side, or the old one if removed.
    pub fn task(&self) -> &'a Task {
        match self.kind {
            DiffKind::Unchanged(t) | DiffKind::Added(t) | DiffKind::Removed(t) => t,
            DiffKind::Changed { new, .. } => new,
        }
    }

    /// Pre-order walk over this node and its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &DiffNode<'a>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Mirror whole task subtrees with one kind, without recursing per level.
    fn expand(tasks: &'a [Task], wrap: fn(&'a Task) -> DiffKind<'a>) -> Vec<Self> {
        let mut stack: Vec<(Option<&'a Task>, slice::Iter<'a, Task>, Vec<Self>)> =
            vec![(None, tasks.iter(), Vec::with_capacity(tasks.len()))];
        while let Some((_, pending, _)) = stack.last_mut() {
            if let Some(task) = pending.next() {
                stack.push((Some(task), task.children.iter(), Vec::with_capacity(task.children.len())));
                continue;
            }
            let Some((head, _, built)) = stack.pop() else {
                break;
            };
            match (head, stack.last_mut()) {
                (Some(task), Some((_, _, parent))) => parent.push(Self {
                    kind: wrap(task),
                    children: built,
                }),
                _ => return built,
            }
        }
        Vec::new()
    }

    pub(crate) fn unchanged(tasks: &'a [Task]) -> Vec<Self> {
        Self::expand(tasks, DiffKind::Unchanged)
    }

    pub(crate) fn added(tasks: &'a [Task]) -> Vec<Self> {
        Self::expand(tasks, DiffKind::Added)
    }

    pub(crate) fn removed(tasks: &'a [Task]) -> Vec<Self> {
        Self::expand(tasks, DiffKind::Removed)
    }
}

impl Drop for DiffNode<'_> {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Node counts per status over a whole report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub unchanged: usize,
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
}

impl DiffStats {
    fn record(&mut self, status: DiffStatus) {
        match status {
            DiffStatus::Unchanged => self.unchanged += 1,
            DiffStatus::Added => self.added += 1,
            DiffStatus::Removed => self.removed += 1,
            DiffStatus::Changed => self.changed += 1,
        }
    }

    /// Returns `true` if any node is added, removed, or changed.
    pub fn has_changes(&self) -> bool {
        self.added + self.removed + self.changed > 0
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.added + self.removed + self.changed
    }
}

/// The full change report between two schedules.
#[derive(Clone, Debug)]
pub struct ScheduleDiff<'a> {
    pub old: &'a Schedule,
    pub new: &'a Schedule,
    pub nodes: Vec<DiffNode<'a>>,
}

impl<'a> ScheduleDiff<'a> {
    pub fn stats(&self) -> DiffStats {
        stats_of(&self.nodes)
    }

    pub fn has_changes(&self) -> bool {
        self.stats().has_changes()
    }

    /// Pre-order walk over every report node.
    pub fn iter(&self) -> impl Iterator<Item = &DiffNode<'a>> {
        self.nodes.iter().flat_map(DiffNode::iter)
    }
}

/// Per-status counts over a list of report trees.
pub fn stats_of(nodes: &[DiffNode<'_>]) -> DiffStats {
    let mut stats = DiffStats::default();
    for node in nodes.iter().flat_map(DiffNode::iter) {
        stats.record(node.status());
    }
    stats
}

/// Compare two schedules from their root task lists downward.
///
/// Never fails: an empty side simply yields an all-added or all-removed report.
pub fn diff_schedules<'a>(
    old: &'a Schedule,
    new: &'a Schedule,
    config: &DiffConfig,
) -> ScheduleDiff<'a> {
    let nodes = diff_tasks(&old.tasks, &new.tasks, config);
    let diff = ScheduleDiff { old, new, nodes };
    let stats = diff.stats();
    debug!(
        unchanged = stats.unchanged,
        added = stats.added,
        removed = stats.removed,
        changed = stats.changed,
        "schedule diff complete"
    );
    diff
}

/// Compare two sibling lists, recursing into matched subtrees.
pub fn diff_tasks<'a>(old: &'a [Task], new: &'a [Task], config: &DiffConfig) -> Vec<DiffNode<'a>> {
    let mut builder = ReportBuilder {
        matcher: Matcher::new(&config.hash_fields),
    };
    builder.level(old, new)
}

struct ReportBuilder<'a> {
    matcher: Matcher<'a>,
}

/// One sibling level in progress: the kind of the parent waiting for these
/// children (`None` at the top), the pairings still to visit, and the nodes
/// built so far.
struct Frame<'a> {
    head: Option<DiffKind<'a>>,
    pending: std::vec::IntoIter<Pairing<'a>>,
    built: Vec<DiffNode<'a>>,
}

impl<'a> Frame<'a> {
    fn new(head: Option<DiffKind<'a>>, pairings: Vec<Pairing<'a>>) -> Self {
        Self {
            head,
            built: Vec::with_capacity(pairings.len()),
            pending: pairings.into_iter(),
        }
    }
}

impl<'a> ReportBuilder<'a> {
    /// Matches level by level on an explicit stack of frames.
    ///
    /// A pair whose fingerprints differ opens a frame for its children;
    /// identical fingerprints pass the new side's descendants through as
    /// unchanged.
    fn level(&mut self, old: &'a [Task], new: &'a [Task]) -> Vec<DiffNode<'a>> {
        let mut stack = vec![Frame::new(None, self.matcher.match_siblings(old, new))];
        while let Some(frame) = stack.last_mut() {
            match frame.pending.next() {
                Some(Pairing::Added(task)) => {
                    frame.built.extend(DiffNode::added(slice::from_ref(task)));
                }
                Some(Pairing::Removed(task)) => {
                    frame.built.extend(DiffNode::removed(slice::from_ref(task)));
                }
                Some(Pairing::Matched { old, new, differences }) => {
                    let kind = classify(old, new, &differences);
                    if differences.contains(&Attribute::SubtreeHash) {
                        let pairings = self.matcher.match_siblings(&old.children, &new.children);
                        stack.push(Frame::new(Some(kind), pairings));
                    } else {
                        let children = DiffNode::unchanged(&new.children);
                        frame.built.push(DiffNode { kind, children });
                    }
                }
                None => {
                    let Some(done) = stack.pop() else {
                        break;
                    };
                    match (done.head, stack.last_mut()) {
                        (Some(kind), Some(parent)) => parent.built.push(DiffNode {
                            kind,
                            children: done.built,
                        }),
                        _ => return done.built,
                    }
                }
            }
        }
        Vec::new()
    }
}

/// `Unchanged` unless a scalar field differs; a fingerprint difference
/// alone is left to the children.
fn classify<'a>(old: &'a Task, new: &'a Task, differences: &[Attribute]) -> DiffKind<'a> {
    let attributes: Vec<Field> = differences
        .iter()
        .filter_map(|attr| match attr {
            Attribute::Field(field) => Some(*field),
            Attribute::SubtreeHash => None,
        })
        .collect();
    if attributes.is_empty() {
        DiffKind::Unchanged(new)
    } else {
        DiffKind::Changed { old, new, attributes }
    }
}
