//! Middleware trait definition

use super::Stage;
use crate::StoreResult;

/// Middleware trait for store operations
///
/// Middleware can intercept and transform store operations.
/// Each middleware declares its stage for automatic ordering.
pub trait Middleware: Send + Sync {
    /// Get the execution stage for this middleware
    fn stage(&self) -> Stage;

    /// Intercept read operation
    fn read(&self, name: &str, next: &dyn Next) -> StoreResult<Option<Vec<u8>>> {
        next.read(name)
    }

    /// Intercept write operation
    fn write(&self, name: &str, content: &[u8], next: &dyn Next) -> StoreResult<()> {
        next.write(name, content)
    }

    /// Intercept delete operation
    fn delete(&self, name: &str, next: &dyn Next) -> StoreResult<bool> {
        next.delete(name)
    }

    /// Intercept rename operation
    fn rename(&self, old: &str, new: &str, next: &dyn Next) -> StoreResult<bool> {
        next.rename(old, new)
    }

    /// Intercept exists operation
    fn exists(&self, name: &str, next: &dyn Next) -> bool {
        next.exists(name)
    }

    /// Intercept names operation
    fn names(&self, next: &dyn Next) -> StoreResult<Vec<String>> {
        next.names()
    }
}

/// Handle to the next middleware in chain
pub trait Next {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()>;

    fn delete(&self, name: &str) -> StoreResult<bool>;

    fn rename(&self, old: &str, new: &str) -> StoreResult<bool>;

    fn exists(&self, name: &str) -> bool;

    fn names(&self) -> StoreResult<Vec<String>>;
}
