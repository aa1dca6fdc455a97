//! MBASIC Virtual File Store
//!
//! Maps a BASIC program's mode-based file operations (sequential lines,
//! fixed-length records, raw bytes) onto a host that only stores named blobs.
//!
//! The crate has two layers:
//! - [`HostStore`]: the host-facing contract (`read`/`write`/`delete`/`rename`),
//!   with [`MemoryStore`], [`DirectoryStore`] and a middleware chain
//!   ([`StoreBuilder`]) as implementations.
//! - [`FileSystem`]: the program-facing bridge owning the open-file table.
//!
//! # Usage
//! ```rust,ignore
//! use mbasic_vfs::{FileSystem, MemoryStore, OpenMode};
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! let mut fs = FileSystem::new(Arc::new(store.clone()));
//! let h = fs.open("DATA.TXT", OpenMode::Output, 128)?;
//! fs.write_line(h, "hello")?;
//! fs.close(h)?;
//! assert_eq!(store.get("DATA.TXT").unwrap(), b"hello\n");
//! ```

mod bridge;
mod error;
mod file;
mod hooks;
mod memory;
pub mod middleware;
mod native;
mod r#trait;

pub use bridge::FileSystem;
pub use error::{FileError, FileResult, StoreError, StoreResult};
pub use file::{Handle, OpenFile, OpenMode, MAX_FILE_LENGTH};
pub use hooks::{FileHooks, HookOpen};
pub use memory::MemoryStore;
pub use middleware::{LayeredStore, StoreBuilder};
pub use native::DirectoryStore;
pub use r#trait::HostStore;

