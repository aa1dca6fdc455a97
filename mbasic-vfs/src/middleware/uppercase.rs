//! Case-folding middleware
//!
//! CP/M file names are case-insensitive. Folding every name to upper case
//! before it reaches the backend lets `open "scores.dat"` and
//! `open "SCORES.DAT"` address the same blob.

use super::Stage;
use super::{Middleware, Next};
use crate::StoreResult;

#[derive(Debug, Default)]
pub struct UppercaseLayer;

impl UppercaseLayer {
    pub fn new() -> Self {
        Self
    }
}

fn fold(name: &str) -> String {
    name.to_ascii_uppercase()
}

impl Middleware for UppercaseLayer {
    fn stage(&self) -> Stage {
        Stage::Mapping
    }

    fn read(&self, name: &str, next: &dyn Next) -> StoreResult<Option<Vec<u8>>> {
        next.read(&fold(name))
    }

    fn write(&self, name: &str, content: &[u8], next: &dyn Next) -> StoreResult<()> {
        next.write(&fold(name), content)
    }

    fn delete(&self, name: &str, next: &dyn Next) -> StoreResult<bool> {
        next.delete(&fold(name))
    }

    fn rename(&self, old: &str, new: &str, next: &dyn Next) -> StoreResult<bool> {
        next.rename(&fold(old), &fold(new))
    }

    fn exists(&self, name: &str, next: &dyn Next) -> bool {
        next.exists(&fold(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HostStore, MemoryStore, StoreBuilder};

    #[test]
    fn test_names_fold_to_upper_case() {
        let backend = MemoryStore::new();
        let store = StoreBuilder::new(backend.clone())
            .with(UppercaseLayer::new())
            .build();

        store.write("scores.dat", b"10").unwrap();
        assert_eq!(backend.names().unwrap(), vec!["SCORES.DAT"]);
        assert_eq!(store.read("Scores.Dat").unwrap().unwrap(), b"10");

        assert!(store.rename("scores.dat", "old.dat").unwrap());
        assert!(backend.exists("OLD.DAT"));
        assert!(store.delete("old.DAT").unwrap());
        assert!(backend.is_empty());
    }
}
