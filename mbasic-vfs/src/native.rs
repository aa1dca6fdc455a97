//! Directory-backed store implementation

use crate::error::{StoreError, StoreResult};
use crate::HostStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A store keeping one OS file per name under a base directory.
///
/// Names are flat: separators and parent references are rejected so a
/// program can never reach outside the base directory.
///
/// # Example
/// ```no_run
/// use mbasic_vfs::{DirectoryStore, HostStore};
///
/// let store = DirectoryStore::new("./basic-files");
/// store.write("SCORES.DAT", b"42\n").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at `base`. The directory is created on first write.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The directory this store writes into.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, name: &str) -> StoreResult<PathBuf> {
        let invalid = |reason: &str| StoreError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if name.contains(['/', '\\']) {
            return Err(invalid("path separators are not allowed"));
        }
        if name == "." || name == ".." {
            return Err(invalid("reserved name"));
        }
        Ok(self.base.join(name))
    }
}

impl HostStore for DirectoryStore {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.resolve(name)?;
        match std::fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        let path = self.resolve(name)?;
        std::fs::create_dir_all(&self.base)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let path = self.resolve(name)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn rename(&self, old: &str, new: &str) -> StoreResult<bool> {
        let from = self.resolve(old)?;
        let to = self.resolve(new)?;
        if !from.is_file() {
            return Ok(false);
        }
        std::fs::rename(from, to)?;
        Ok(true)
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
