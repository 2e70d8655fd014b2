use crate::tpl::reader::DEFAULT_MAX_LINE_SIZE;
use std::path::PathBuf;

pub const DEFAULT_EXTENSION: &str = "mustache";

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Directory searched for partials by the default file loader.
    pub directory: PathBuf,
    /// Extension appended to a partial name by the default file loader.
    pub extension: String,
    /// Longest line the normalizer buffers before failing.
    pub max_line_size: usize,
}

impl ParserOptions {
    pub fn new() -> Self {
        ParserOptions {
            directory: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_string(),
            max_line_size: DEFAULT_MAX_LINE_SIZE,
        }
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn max_line_size(mut self, max_line_size: usize) -> Self {
        self.max_line_size = max_line_size;
        self
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::new()
    }
}
