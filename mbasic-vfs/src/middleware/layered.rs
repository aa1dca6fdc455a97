//! Layered store that executes middleware chain

use super::{Middleware, Next};
use crate::{HostStore, StoreResult};
use std::sync::Arc;

/// Store implementation that executes a middleware chain
pub struct LayeredStore {
    backend: Arc<dyn HostStore>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl LayeredStore {
    pub(crate) fn new(backend: Arc<dyn HostStore>, middlewares: Vec<Box<dyn Middleware>>) -> Self {
        Self {
            backend,
            middlewares,
        }
    }

    fn chain(&self) -> ChainExecutor<'_> {
        ChainExecutor::new(&*self.backend, &self.middlewares, 0)
    }
}

/// Chain executor for a specific operation
struct ChainExecutor<'a> {
    backend: &'a dyn HostStore,
    middlewares: &'a [Box<dyn Middleware>],
    index: usize,
}

impl<'a> ChainExecutor<'a> {
    fn new(backend: &'a dyn HostStore, middlewares: &'a [Box<dyn Middleware>], index: usize) -> Self {
        Self {
            backend,
            middlewares,
            index,
        }
    }

    /// The middleware at this position plus the executor for the rest,
    /// or `None` once the chain reaches the backend.
    fn split(&self) -> Option<(&'a dyn Middleware, ChainExecutor<'a>)> {
        let middleware = self.middlewares.get(self.index)?;
        Some((
            &**middleware,
            ChainExecutor::new(self.backend, self.middlewares, self.index + 1),
        ))
    }
}

impl<'a> Next for ChainExecutor<'a> {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        match self.split() {
            Some((middleware, next)) => middleware.read(name, &next),
            None => self.backend.read(name),
        }
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        match self.split() {
            Some((middleware, next)) => middleware.write(name, content, &next),
            None => self.backend.write(name, content),
        }
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        match self.split() {
            Some((middleware, next)) => middleware.delete(name, &next),
            None => self.backend.delete(name),
        }
    }

    fn rename(&self, old: &str, new: &str) -> StoreResult<bool> {
        match self.split() {
            Some((middleware, next)) => middleware.rename(old, new, &next),
            None => self.backend.rename(old, new),
        }
    }

    fn exists(&self, name: &str) -> bool {
        match self.split() {
            Some((middleware, next)) => middleware.exists(name, &next),
            None => self.backend.exists(name),
        }
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        match self.split() {
            Some((middleware, next)) => middleware.names(&next),
            None => self.backend.names(),
        }
    }
}

impl HostStore for LayeredStore {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        self.chain().read(name)
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        self.chain().write(name, content)
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        self.chain().delete(name)
    }

    fn rename(&self, old: &str, new: &str) -> StoreResult<bool> {
        self.chain().rename(old, new)
    }

    fn exists(&self, name: &str) -> bool {
        self.chain().exists(name)
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        self.chain().names()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Stage, StoreBuilder};
    use super::*;
    use crate::MemoryStore;
    use std::sync::Mutex;

    /// Records the order in which layers see a call.
    struct Recorder {
        label: &'static str,
        stage: Stage,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recorder {
        fn stage(&self) -> Stage {
            self.stage
        }

        fn write(&self, name: &str, content: &[u8], next: &dyn Next) -> StoreResult<()> {
            self.seen.lock().unwrap().push(self.label);
            next.write(name, content)
        }
    }

    #[test]
    fn test_layers_run_in_stage_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let backend = MemoryStore::new();
        let store = StoreBuilder::new(backend.clone())
            .with(Recorder {
                label: "mapping",
                stage: Stage::Mapping,
                seen: seen.clone(),
            })
            .with(Recorder {
                label: "outer",
                stage: Stage::Outer,
                seen: seen.clone(),
            })
            .build();

        store.write("F", b"x").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["outer", "mapping"]);
        assert_eq!(backend.get("F").unwrap(), b"x");
    }

    #[test]
    fn test_empty_chain_is_transparent() {
        let backend = MemoryStore::with_files([("A", b"1".to_vec())]);
        let store = StoreBuilder::new(backend).build();
        assert_eq!(store.read("A").unwrap().unwrap(), b"1");
        assert!(store.rename("A", "B").unwrap());
        assert_eq!(store.names().unwrap(), vec!["B"]);
        assert!(store.delete("B").unwrap());
        assert!(!store.exists("B"));
    }
}
