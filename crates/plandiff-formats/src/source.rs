use std::path::Path;

use crate::error::FormatResult;

/// Raw input handed to a format adapter: a name hint plus the bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// File name or other label, used for detection hints and messages.
    pub name: String,
    pub data: Vec<u8>,
}

impl Source {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Load a source from disk.
    pub fn read(path: &Path) -> FormatResult<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::new(path.display().to_string(), data))
    }

    /// Lowercased extension of `name`, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}
