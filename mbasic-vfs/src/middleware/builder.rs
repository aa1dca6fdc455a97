//! Store builder for constructing middleware chains

use super::{LayeredStore, Middleware};
use crate::HostStore;
use std::sync::Arc;

/// Builder for constructing a store with middleware chain
///
/// # Example
/// ```
/// use mbasic_vfs::middleware::{LoggedLayer, UppercaseLayer};
/// use mbasic_vfs::{HostStore, MemoryStore, StoreBuilder};
///
/// let store = StoreBuilder::new(MemoryStore::new())
///     .with(UppercaseLayer::new())
///     .with(LoggedLayer::new())
///     .build();
/// store.write("scores.dat", b"1").unwrap();
/// assert!(store.exists("SCORES.DAT"));
/// ```
pub struct StoreBuilder {
    backend: Arc<dyn HostStore>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl StoreBuilder {
    /// Create a new builder with the given backend
    pub fn new(backend: impl HostStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the chain
    ///
    /// Middlewares are automatically sorted by stage when built.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Build the final store with middleware chain
    ///
    /// Middlewares are sorted by stage (lower priority first).
    pub fn build(self) -> LayeredStore {
        let mut middlewares = self.middlewares;
        middlewares.sort_by_key(|m| m.stage().priority());
        LayeredStore::new(self.backend, middlewares)
    }
}
