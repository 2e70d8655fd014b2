use crate::error::TemplateError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supplies the raw source of a partial given its name.
pub trait PartialLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<String, TemplateError>;
}

impl<F> PartialLoader for F
where
    F: Fn(&str) -> Result<String, TemplateError> + Send + Sync,
{
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        self(name)
    }
}

/// Loads `directory/name.extension` from the file system.
#[derive(Debug, Clone)]
pub struct FileLoader {
    directory: PathBuf,
    extension: String,
}

impl FileLoader {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", name, self.extension))
    }
}

impl PartialLoader for FileLoader {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.path_for(name);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TemplateError::PartialNotFound(name.to_string()),
            _ => TemplateError::Io(e),
        })
    }
}

/// Partials held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            sources: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.sources.insert(name.into(), source.into());
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl PartialLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::PartialNotFound(name.to_string()))
    }
}

/// Recursively lists the files under `dir` carrying `extension`, paired with
/// the partial name they answer to: the relative path without extension,
/// always `/`-separated.
pub(crate) fn discover(
    dir: &Path,
    extension: &str,
) -> Result<Vec<(String, PathBuf)>, TemplateError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();

        if !path.is_file() || path.extension().is_none_or(|ext| ext != extension) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        found.push((name, path.to_path_buf()));
    }
    found.sort();
    Ok(found)
}
