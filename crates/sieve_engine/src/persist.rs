use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} is not a usable directory: {source}", path.display())]
    Dir { path: PathBuf, source: io::Error },
    #[error("failed to replace {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Create `dir` and its parents if missing; fail if it exists as a file.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    let dir_err = |source: io::Error| PersistError::Dir {
        path: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(dir_err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "exists and is not a directory",
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir).map_err(dir_err),
        Err(err) => Err(dir_err(err)),
    }
}

/// A file replaced whole: content goes to a sibling temp file which is then
/// renamed over the target, so readers see either the old or the new bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the temp file is created in; a bare file name uses `.`.
    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    pub fn replace(&self, content: &str) -> Result<(), PersistError> {
        let dir = self.dir();
        ensure_dir(dir)?;

        let io_err = |source: io::Error| PersistError::Io {
            path: self.path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file_mut().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}
