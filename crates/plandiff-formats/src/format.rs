use plandiff_model::Schedule;

use crate::error::FormatResult;
use crate::source::Source;

/// An import/export adapter for one document format.
///
/// Implementations are registered explicitly in a
/// [`crate::FormatRegistry`]. The trait is object-safe and `Send + Sync` so
/// adapters can be stored as `Box<dyn ScheduleFormat>`.
pub trait ScheduleFormat: Send + Sync {
    /// Short identifier, e.g. `"json"`.
    fn name(&self) -> &str;

    /// Cheap check whether `source` looks like this format.
    fn is_valid_source(&self, source: &Source) -> bool;

    /// Build a normalized schedule from `source`.
    fn import(&self, source: &Source) -> FormatResult<Schedule>;

    /// Serialize `schedule` into this format.
    fn export(&self, schedule: &Schedule) -> FormatResult<Vec<u8>>;
}
