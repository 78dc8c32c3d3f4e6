use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;

use crate::persist::{AtomicFile, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("{path} is not a JSON list of strings: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write store: {0}")]
    Persist(#[from] PersistError),
}

/// Reads a whole file; a missing file reads as empty.
fn read_optional(path: &Path) -> Result<String, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn replace(path: &Path, content: &str) -> Result<(), StoreError> {
    AtomicFile::new(path).replace(content)?;
    Ok(())
}

/// Ordered channel identifiers persisted as a pretty-printed JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListStore {
    path: PathBuf,
}

impl ChannelListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<String>, StoreError> {
        let text = read_optional(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, channels: &[String]) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        channels
            .serialize(&mut serializer)
            .map_err(|source| StoreError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        let json = String::from_utf8_lossy(&buf);
        replace(&self.path, &json)
    }
}

/// Newline-delimited config strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTextStore {
    path: PathBuf,
}

impl ConfigTextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_text(&self) -> Result<String, StoreError> {
        read_optional(&self.path)
    }

    /// Write one config per line with a single trailing newline.
    pub fn save(&self, configs: &[String]) -> Result<(), StoreError> {
        let mut content = configs.join("\n");
        content.push('\n');
        replace(&self.path, &content)
    }
}
