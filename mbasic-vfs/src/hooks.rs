//! Host interception hooks

use crate::file::OpenMode;

/// What an open hook decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOpen {
    /// Not intercepted; use the store as usual
    Store,
    /// Use this as the file's initial content, whatever the store holds
    Content(Vec<u8>),
    /// Treat the file as not found
    Refuse,
}

/// Callbacks a host can install to mirror files elsewhere (a real disk, a
/// remote service) or to supply content the store does not hold.
///
/// Every method has a pass-through default.
pub trait FileHooks: Send + Sync {
    /// Called before the store lookup on every open; a non-`Store` answer
    /// takes precedence.
    fn open(&self, _name: &str, _mode: OpenMode, _record_length: usize) -> HookOpen {
        HookOpen::Store
    }

    /// Overrides the store's answer to `exists` when `Some`.
    fn exists(&self, _name: &str) -> Option<bool> {
        None
    }

    /// Called after a buffer was persisted by close or flush.
    fn on_save(&self, _name: &str, _content: &[u8]) {}

    /// Called before a name is removed from the store.
    fn on_delete(&self, _name: &str) {}

    /// Called after a successful rename.
    fn on_rename(&self, _old: &str, _new: &str) {}
}
