//! Logging middleware for store operations

use super::Stage;
use super::{Middleware, Next};
use crate::StoreResult;
use tracing::{debug, warn};

const TARGET: &str = "mbasic::store";

/// Middleware that traces every store call
#[derive(Debug, Default)]
pub struct LoggedLayer;

impl LoggedLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggedLayer {
    fn stage(&self) -> Stage {
        Stage::Outer
    }

    fn read(&self, name: &str, next: &dyn Next) -> StoreResult<Option<Vec<u8>>> {
        let result = next.read(name);
        match &result {
            Ok(Some(content)) => debug!(target: TARGET, name, bytes = content.len(), "read"),
            Ok(None) => debug!(target: TARGET, name, "read: absent"),
            Err(e) => warn!(target: TARGET, name, error = %e, "read failed"),
        }
        result
    }

    fn write(&self, name: &str, content: &[u8], next: &dyn Next) -> StoreResult<()> {
        debug!(target: TARGET, name, bytes = content.len(), "write");
        let result = next.write(name, content);
        if let Err(e) = &result {
            warn!(target: TARGET, name, error = %e, "write failed");
        }
        result
    }

    fn delete(&self, name: &str, next: &dyn Next) -> StoreResult<bool> {
        let result = next.delete(name);
        debug!(target: TARGET, name, ?result, "delete");
        result
    }

    fn rename(&self, old: &str, new: &str, next: &dyn Next) -> StoreResult<bool> {
        let result = next.rename(old, new);
        debug!(target: TARGET, old, new, ?result, "rename");
        result
    }

    fn exists(&self, name: &str, next: &dyn Next) -> bool {
        let result = next.exists(name);
        debug!(target: TARGET, name, result, "exists");
        result
    }
}
