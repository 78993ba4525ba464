use plandiff_model::Schedule;
use tracing::debug;

use crate::error::{FormatError, FormatResult};
use crate::format::ScheduleFormat;
use crate::json::JsonFormat;
use crate::source::Source;

/// Ordered table of format adapters.
///
/// Detection asks each adapter in registration order and takes the first
/// that accepts the source.
pub struct FormatRegistry {
    formats: Vec<Box<dyn ScheduleFormat>>,
}

impl FormatRegistry {
    /// An empty registry. Use [`Self::register`] to add adapters, or
    /// [`Self::with_builtin_formats`] for the standard set.
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// A registry holding every built-in adapter.
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(JsonFormat));
        registry
    }

    /// Append an adapter. A later adapter with a duplicate name is shadowed
    /// by the earlier one for [`Self::get`].
    pub fn register(&mut self, format: Box<dyn ScheduleFormat>) {
        self.formats.push(format);
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    pub fn get(&self, name: &str) -> FormatResult<&dyn ScheduleFormat> {
        self.formats
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::UnknownFormat(name.to_string()))
    }

    /// First adapter that accepts `source`.
    pub fn detect(&self, source: &Source) -> FormatResult<&dyn ScheduleFormat> {
        let format = self
            .formats
            .iter()
            .find(|f| f.is_valid_source(source))
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::Unrecognized(source.name.clone()))?;
        debug!(source = %source.name, format = format.name(), "detected format");
        Ok(format)
    }

    /// Detect the format of `source` and import it.
    pub fn import(&self, source: &Source) -> FormatResult<Schedule> {
        self.detect(source)?.import(source)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtin_formats()
    }
}
