//! HostStore trait definition

use crate::error::StoreResult;
use std::sync::Arc;

/// Host-facing blob store
///
/// The only component that touches host-persisted state. Names are opaque
/// keys; content is opaque bytes.
///
/// # Implementations
/// - `MemoryStore`: in-memory map, clones share data
/// - `DirectoryStore`: one file per name under a base directory
/// - `LayeredStore`: a backend wrapped in a middleware chain
pub trait HostStore: Send + Sync {
    /// Read the content stored under `name`
    ///
    /// # Returns
    /// `Ok(None)` when the name is absent
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `content` under `name`, replacing any previous content
    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()>;

    /// Remove `name`
    ///
    /// # Returns
    /// `true` if something was removed
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Move the content of `old` to `new`
    ///
    /// # Returns
    /// `false` (and no change) if `old` is absent
    fn rename(&self, old: &str, new: &str) -> StoreResult<bool>;

    /// Check whether `name` is present
    fn exists(&self, name: &str) -> bool;

    /// All stored names, sorted
    fn names(&self) -> StoreResult<Vec<String>>;
}

impl<S: HostStore + ?Sized> HostStore for Arc<S> {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).read(name)
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        (**self).write(name, content)
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        (**self).delete(name)
    }

    fn rename(&self, old: &str, new: &str) -> StoreResult<bool> {
        (**self).rename(old, new)
    }

    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        (**self).names()
    }
}
