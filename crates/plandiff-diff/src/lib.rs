//! Diff engine for plandiff.
//!
//! Compares two schedule trees whose tasks share no stable identifiers.
//! Two modes are provided:
//!
//! - **Tree mode** ([`diff_schedules`]): a greedy, forward-only matcher pairs
//!   sibling lists by attribute similarity and recurses into subtrees whose
//!   fingerprints differ, producing a [`ScheduleDiff`] of
//!   unchanged/added/removed/changed nodes.
//! - **Flat mode** ([`flat_diff`]): a positional, path-addressed diff over the
//!   dict form, filtered to an attribute allowlist.
//!
//! # Key Types
//!
//! - [`Matcher`] / [`Pairing`] -- Sibling-list alignment
//! - [`ScheduleDiff`] / [`DiffNode`] / [`DiffKind`] -- Recursive change report
//! - [`FlatDiff`] / [`FlatChange`] / [`DiffPath`] -- Flat-path diff
//! - [`DiffConfig`] -- Fingerprint fields, whole-days mode, allowlist

pub mod config;
pub mod error;
pub mod flat;
pub mod matcher;
pub mod render;
pub mod report;

pub use config::DiffConfig;
pub use error::{DiffError, DiffResult};
pub use flat::{flat_diff, flat_diff_schedules, DiffPath, FlatChange, FlatDiff, PathSegment};
pub use matcher::{Attribute, Matcher, Pairing};
pub use render::{node_to_json, nodes_to_json, render_nodes, task_summary};
pub use report::{
    diff_schedules, diff_tasks, stats_of, DiffKind, DiffNode, DiffStats, DiffStatus, ScheduleDiff,
};
