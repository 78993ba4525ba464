//! Schedule tree model for plandiff.
//!
//! Every import adapter produces a [`Schedule`] and every diff mode consumes
//! one. Trees are built once, then treated as read-only while they are
//! compared or exported.
//!
//! # Key Types
//!
//! - [`Task`]: one node with identity, dates, metadata and ordered children
//! - [`Schedule`]: root container with changelog and derived bounds/flags
//! - [`Field`]: the comparable task attributes, addressable by name
//! - [`SubtreeHasher`]: per-invocation memo of subtree fingerprints

pub mod error;
pub mod field;
pub mod filter;
pub mod hash;
pub mod schedule;
pub mod task;

pub use error::{ModelError, ModelResult};
pub use field::{canonical_fields, parse_field_list, Field, MATCH_FIELDS, STAMP_FORMAT};
pub use hash::SubtreeHasher;
pub use schedule::{slugify, ChangelogEntry, Schedule};
pub use task::{Task, TaskIter, DEFAULT_PRIORITY, PHASE_FLAG};
