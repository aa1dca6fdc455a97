//! In-memory store implementation

use crate::error::{StoreError, StoreResult};
use crate::HostStore;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// An in-memory blob store.
///
/// All content lives in a `BTreeMap`. Clones share the same map, so a host
/// can keep one clone for inspection while sessions write through another.
///
/// # Example
/// ```
/// use mbasic_vfs::{HostStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.write("HELLO.TXT", b"hello").unwrap();
/// assert_eq!(store.read("HELLO.TXT").unwrap().unwrap(), b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (name, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let map = files
            .into_iter()
            .map(|(name, content)| (name.as_ref().to_string(), content))
            .collect();
        Self {
            files: Arc::new(RwLock::new(map)),
        }
    }

    /// Snapshot of one file, `None` if absent or the lock is poisoned.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().ok()?.get(name).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HostStore for MemoryStore {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let files = self.files.read().map_err(|_| StoreError::Poisoned)?;
        Ok(files.get(name).cloned())
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        let mut files = self.files.write().map_err(|_| StoreError::Poisoned)?;
        files.insert(name.to_string(), content.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut files = self.files.write().map_err(|_| StoreError::Poisoned)?;
        Ok(files.remove(name).is_some())
    }

    fn rename(&self, old: &str, new: &str) -> StoreResult<bool> {
        let mut files = self.files.write().map_err(|_| StoreError::Poisoned)?;
        match files.remove(old) {
            Some(content) => {
                files.insert(new.to_string(), content);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn exists(&self, name: &str) -> bool {
        match self.files.read() {
            Ok(files) => files.contains_key(name),
            Err(_) => false,
        }
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        let files = self.files.read().map_err(|_| StoreError::Poisoned)?;
        Ok(files.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_store_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(!store.exists("ANYTHING.TXT"));
        assert_eq!(store.read("ANYTHING.TXT").unwrap(), None);
    }

    #[test]
    fn test_write_and_read() {
        let store = MemoryStore::new();
        store.write("TEST.TXT", b"hello world").unwrap();
        assert_eq!(store.read("TEST.TXT").unwrap().unwrap(), b"hello world");
    }

    #[test]
    fn test_empty_content() {
        let store = MemoryStore::new();
        store.write("EMPTY.TXT", b"").unwrap();
        assert!(store.exists("EMPTY.TXT"));
        assert!(store.read("EMPTY.TXT").unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_binary_content() {
        let store = MemoryStore::new();
        let binary: Vec<u8> = (0..=255).collect();
        store.write("BIN.DAT", &binary).unwrap();
        assert_eq!(store.read("BIN.DAT").unwrap().unwrap(), binary);
    }

    #[test]
    fn test_overwrite() {
        let store = MemoryStore::new();
        store.write("F", b"first").unwrap();
        store.write("F", b"second").unwrap();
        assert_eq!(store.get("F").unwrap(), b"second");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::with_files([("A", b"a".to_vec())]);
        assert!(store.delete("A").unwrap());
        assert!(!store.delete("A").unwrap());
        assert!(!store.exists("A"));
    }

    #[test]
    fn test_rename() {
        let store = MemoryStore::with_files([("OLD", b"payload".to_vec())]);
        assert!(store.rename("OLD", "NEW").unwrap());
        assert!(!store.exists("OLD"));
        assert_eq!(store.get("NEW").unwrap(), b"payload");
    }

    #[test]
    fn test_rename_absent_leaves_store_unchanged() {
        let store = MemoryStore::with_files([("KEEP", b"k".to_vec())]);
        assert!(!store.rename("MISSING", "KEEP").unwrap());
        assert_eq!(store.get("KEEP").unwrap(), b"k");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let store = MemoryStore::with_files([
            ("ZED", vec![]),
            ("ALPHA", vec![]),
            ("MID", vec![]),
        ]);
        assert_eq!(store.names().unwrap(), vec!["ALPHA", "MID", "ZED"]);
    }

    #[test]
    fn test_clone_shares_data() {
        let s1 = MemoryStore::new();
        s1.write("SHARED", b"shared").unwrap();

        let s2 = s1.clone();
        assert_eq!(s2.get("SHARED").unwrap(), b"shared");

        s2.write("SHARED", b"modified").unwrap();
        assert_eq!(s1.get("SHARED").unwrap(), b"modified");
    }

    #[test]
    fn test_concurrent_writes() {
        let store = MemoryStore::new();
        let mut handles = vec![];

        for i in 0..10 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let data = format!("data{}", i);
                for _ in 0..10 {
                    store.write("CONCURRENT", data.as_bytes()).unwrap();
                    let _ = store.read("CONCURRENT");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.exists("CONCURRENT"));
    }
}
