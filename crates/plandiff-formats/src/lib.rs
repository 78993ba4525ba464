//! Format adapters for plandiff.
//!
//! Each document format implements [`ScheduleFormat`] and is added to a
//! [`FormatRegistry`] explicitly; there is no discovery by scanning the
//! filesystem. The built-in set holds the canonical JSON form.

pub mod error;
pub mod format;
pub mod json;
pub mod registry;
pub mod source;

pub use error::{FormatError, FormatResult};
pub use format::ScheduleFormat;
pub use json::JsonFormat;
pub use registry::FormatRegistry;
pub use source::Source;
