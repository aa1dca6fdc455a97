//! Program-facing file API over a [`HostStore`]

use crate::error::{FileError, FileResult};
use crate::file::{Handle, OpenFile, OpenMode, MAX_FILE_LENGTH};
use crate::hooks::{FileHooks, HookOpen};
use crate::HostStore;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

const TARGET: &str = "mbasic::files";

/// Translates open/read/write/seek/close onto a name-keyed blob store.
///
/// Each open file works on a private buffer; the store only changes when a
/// writable handle is flushed or closed (last closer wins). Handles are owned
/// by this table, so two sessions sharing a store never see each other's
/// handles.
pub struct FileSystem {
    store: Arc<dyn HostStore>,
    hooks: Option<Arc<dyn FileHooks>>,
    open_files: BTreeMap<Handle, OpenFile>,
    next_handle: u32,
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("open_files", &self.open_files)
            .field("next_handle", &self.next_handle)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl FileSystem {
    pub fn new(store: Arc<dyn HostStore>) -> Self {
        Self {
            store,
            hooks: None,
            open_files: BTreeMap::new(),
            next_handle: 1,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FileHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn set_hooks(&mut self, hooks: Option<Arc<dyn FileHooks>>) {
        self.hooks = hooks;
    }

    pub fn store(&self) -> &Arc<dyn HostStore> {
        &self.store
    }

    /// Number of currently open handles
    pub fn open_count(&self) -> usize {
        self.open_files.len()
    }

    pub fn is_open(&self, handle: Handle) -> bool {
        self.open_files.contains_key(&handle)
    }

    fn allocate_handle(&mut self) -> Handle {
        loop {
            let candidate = Handle(self.next_handle);
            self.next_handle = self.next_handle.checked_add(1).unwrap_or(1);
            if !self.open_files.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn file(&self, handle: Handle) -> FileResult<&OpenFile> {
        self.open_files.get(&handle).ok_or(FileError::BadHandle(handle))
    }

    fn file_mut(&mut self, handle: Handle) -> FileResult<&mut OpenFile> {
        self.open_files
            .get_mut(&handle)
            .ok_or(FileError::BadHandle(handle))
    }

    /// Open `name` in `mode`.
    ///
    /// Input requires the name to exist. Output starts empty. Append and
    /// Random start from the stored content, or empty. An installed open hook
    /// is asked first and its answer wins.
    pub fn open(&mut self, name: &str, mode: OpenMode, record_length: usize) -> FileResult<Handle> {
        let hooked = match &self.hooks {
            Some(hooks) => hooks.open(name, mode, record_length),
            None => HookOpen::Store,
        };

        let data = match hooked {
            HookOpen::Content(data) => data,
            HookOpen::Refuse => {
                debug!(target: TARGET, name, %mode, "open refused by host hook");
                return Err(FileError::NotFound {
                    name: name.to_string(),
                });
            }
            HookOpen::Store => match mode {
                OpenMode::Input => self.store.read(name)?.ok_or_else(|| FileError::NotFound {
                    name: name.to_string(),
                })?,
                OpenMode::Output => Vec::new(),
                OpenMode::Append | OpenMode::Random => self.store.read(name)?.unwrap_or_default(),
            },
        };

        let handle = self.allocate_handle();
        debug!(target: TARGET, %handle, name, %mode, record_length, bytes = data.len(), "open");
        self.open_files
            .insert(handle, OpenFile::new(name, mode, record_length, data));
        Ok(handle)
    }

    /// Next line, or `None` once the cursor is at the end.
    pub fn read_line(&mut self, handle: Handle) -> FileResult<Option<String>> {
        Ok(self.file_mut(handle)?.read_line())
    }

    /// Append `text` plus a line terminator at the end of the buffer.
    pub fn write_line(&mut self, handle: Handle, text: &str) -> FileResult<()> {
        let file = self.file_mut(handle)?;
        file.append_text(text);
        file.append_text("\n");
        Ok(())
    }

    /// Append `text` at the end of the buffer.
    pub fn write(&mut self, handle: Handle, text: &str) -> FileResult<()> {
        self.file_mut(handle)?.append_text(text);
        Ok(())
    }

    pub fn read_chars(&mut self, handle: Handle, n: usize) -> FileResult<String> {
        Ok(self.file_mut(handle)?.read_chars(n))
    }

    /// Move the cursor to the start of 1-based `record`.
    pub fn seek_record(&mut self, handle: Handle, record: u64, record_length: usize) -> FileResult<()> {
        if record == 0 {
            return Err(FileError::BadRecord { record });
        }
        if record_length == 0 {
            return Err(FileError::BadRecordLength {
                length: record_length,
            });
        }
        let position = usize::try_from(record - 1)
            .ok()
            .and_then(|r| r.checked_mul(record_length))
            .filter(|position| *position <= MAX_FILE_LENGTH)
            .ok_or(FileError::BadRecord { record })?;
        trace!(target: TARGET, %handle, record, position, "seek");
        self.file_mut(handle)?.seek(position);
        Ok(())
    }

    pub fn read_raw(&mut self, handle: Handle, size: usize) -> FileResult<Vec<u8>> {
        self.file_mut(handle)?.read_raw(size)
    }

    /// Positioned overwrite at the cursor. Writing past the end zero-fills
    /// the gap.
    pub fn write_raw(&mut self, handle: Handle, bytes: &[u8]) -> FileResult<()> {
        self.file_mut(handle)?.write_raw(bytes)
    }

    fn persist(&self, file: &OpenFile) -> FileResult<()> {
        self.store.write(file.name(), file.data())?;
        if let Some(hooks) = &self.hooks {
            hooks.on_save(file.name(), file.data());
        }
        debug!(target: TARGET, name = file.name(), bytes = file.len(), "persisted");
        Ok(())
    }

    /// Persist a writable handle without closing it. Input handles are left
    /// alone.
    pub fn flush(&mut self, handle: Handle) -> FileResult<()> {
        let file = self.file(handle)?;
        if file.mode().persists() {
            self.persist(file)?;
        }
        Ok(())
    }

    /// Close `handle`, persisting it first unless it was opened for Input.
    ///
    /// The handle is released even when persisting fails.
    pub fn close(&mut self, handle: Handle) -> FileResult<()> {
        let file = self
            .open_files
            .remove(&handle)
            .ok_or(FileError::BadHandle(handle))?;
        debug!(target: TARGET, %handle, name = file.name(), "close");
        if file.mode().persists() {
            self.persist(&file)?;
        }
        Ok(())
    }

    /// Close every open handle with normal close semantics.
    ///
    /// Returns how many handles were closed; the first persistence failure is
    /// reported after all handles are released.
    pub fn close_all(&mut self) -> FileResult<usize> {
        let handles: Vec<Handle> = self.open_files.keys().copied().collect();
        let mut first_error = None;
        for handle in &handles {
            if let Err(e) = self.close(*handle) {
                warn!(target: TARGET, %handle, error = %e, "close failed during teardown");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(handles.len()),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        if let Some(answer) = self.hooks.as_ref().and_then(|h| h.exists(name)) {
            return answer;
        }
        self.store.exists(name)
    }

    /// Remove `name` from the store; `false` if it was not there.
    pub fn remove(&mut self, name: &str) -> FileResult<bool> {
        if let Some(hooks) = &self.hooks {
            hooks.on_delete(name);
        }
        let removed = self.store.delete(name)?;
        debug!(target: TARGET, name, removed, "remove");
        Ok(removed)
    }

    /// Rename persisted content. Fails with `NotFound` when `old` is absent.
    pub fn rename(&mut self, old: &str, new: &str) -> FileResult<()> {
        if !self.store.exists(old) || !self.store.rename(old, new)? {
            return Err(FileError::NotFound {
                name: old.to_string(),
            });
        }
        if let Some(hooks) = &self.hooks {
            hooks.on_rename(old, new);
        }
        debug!(target: TARGET, old, new, "rename");
        Ok(())
    }

    /// Stored files with their sizes, sorted by name.
    pub fn list(&self) -> FileResult<Vec<(String, usize)>> {
        let mut listing = Vec::new();
        for name in self.store.names()? {
            let size = self.store.read(&name)?.map(|d| d.len()).unwrap_or(0);
            listing.push((name, size));
        }
        Ok(listing)
    }

    pub fn length(&self, handle: Handle) -> FileResult<usize> {
        Ok(self.file(handle)?.len())
    }

    pub fn position(&self, handle: Handle) -> FileResult<usize> {
        Ok(self.file(handle)?.position())
    }

    pub fn eof(&self, handle: Handle) -> FileResult<bool> {
        Ok(self.file(handle)?.eof())
    }

    pub fn record_length(&self, handle: Handle) -> FileResult<usize> {
        Ok(self.file(handle)?.record_length())
    }

    pub fn mode(&self, handle: Handle) -> FileResult<OpenMode> {
        Ok(self.file(handle)?.mode())
    }

    pub fn name(&self, handle: Handle) -> FileResult<&str> {
        Ok(self.file(handle)?.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Mutex;

    fn fs_with(store: &MemoryStore) -> FileSystem {
        FileSystem::new(Arc::new(store.clone()))
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
        content: Option<Vec<u8>>,
        refuse: bool,
        exists: Option<bool>,
    }

    impl RecordingHooks {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl FileHooks for RecordingHooks {
        fn open(&self, name: &str, mode: OpenMode, record_length: usize) -> HookOpen {
            self.events
                .lock()
                .unwrap()
                .push(format!("open {} {} {}", name, mode, record_length));
            if self.refuse {
                HookOpen::Refuse
            } else if let Some(content) = &self.content {
                HookOpen::Content(content.clone())
            } else {
                HookOpen::Store
            }
        }

        fn exists(&self, _name: &str) -> Option<bool> {
            self.exists
        }

        fn on_save(&self, name: &str, content: &[u8]) {
            self.events
                .lock()
                .unwrap()
                .push(format!("save {} {}", name, content.len()));
        }

        fn on_delete(&self, name: &str) {
            self.events.lock().unwrap().push(format!("delete {}", name));
        }

        fn on_rename(&self, old: &str, new: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("rename {} {}", old, new));
        }
    }

    #[test]
    fn test_line_round_trip() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);

        let h = fs.open("LINES.TXT", OpenMode::Output, 128).unwrap();
        for line in ["alpha", "", "gamma delta"] {
            fs.write_line(h, line).unwrap();
        }
        fs.close(h).unwrap();

        let h = fs.open("LINES.TXT", OpenMode::Input, 128).unwrap();
        assert_eq!(fs.read_line(h).unwrap().as_deref(), Some("alpha"));
        assert!(!fs.eof(h).unwrap());
        assert_eq!(fs.read_line(h).unwrap().as_deref(), Some(""));
        assert!(!fs.eof(h).unwrap());
        assert_eq!(fs.read_line(h).unwrap().as_deref(), Some("gamma delta"));
        assert!(fs.eof(h).unwrap());
        assert_eq!(fs.read_line(h).unwrap(), None);
        fs.close(h).unwrap();
    }

    #[test]
    fn test_input_open_of_absent_name_fails() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        assert_eq!(
            fs.open("NOPE", OpenMode::Input, 128),
            Err(FileError::NotFound {
                name: "NOPE".into()
            })
        );
        assert_eq!(fs.open_count(), 0);
    }

    #[test]
    fn test_output_truncates_but_store_waits_for_close() {
        let store = MemoryStore::with_files([("F", b"old content".to_vec())]);
        let mut fs = fs_with(&store);

        let h = fs.open("F", OpenMode::Output, 128).unwrap();
        assert_eq!(fs.length(h).unwrap(), 0);
        fs.write(h, "new").unwrap();
        assert_eq!(store.get("F").unwrap(), b"old content");

        fs.close(h).unwrap();
        assert_eq!(store.get("F").unwrap(), b"new");
    }

    #[test]
    fn test_append_extends_stored_content() {
        let store = MemoryStore::with_files([("LOG", b"one\n".to_vec())]);
        let mut fs = fs_with(&store);

        let h = fs.open("LOG", OpenMode::Append, 128).unwrap();
        fs.write_line(h, "two").unwrap();
        fs.close(h).unwrap();
        assert_eq!(store.get("LOG").unwrap(), b"one\ntwo\n");

        let h = fs.open("FRESH", OpenMode::Append, 128).unwrap();
        assert_eq!(fs.length(h).unwrap(), 0);
        fs.close(h).unwrap();
        assert_eq!(store.get("FRESH").unwrap(), b"");
    }

    #[test]
    fn test_input_close_does_not_persist() {
        let store = MemoryStore::with_files([("R", b"data".to_vec())]);
        let mut fs = fs_with(&store);
        let h = fs.open("R", OpenMode::Input, 128).unwrap();
        store.write("R", b"changed elsewhere").unwrap();
        fs.close(h).unwrap();
        assert_eq!(store.get("R").unwrap(), b"changed elsewhere");
    }

    #[test]
    fn test_line_write_appends_after_seek() {
        let store = MemoryStore::with_files([("R", b"0123456789".to_vec())]);
        let mut fs = fs_with(&store);
        let h = fs.open("R", OpenMode::Random, 4).unwrap();
        fs.seek_record(h, 1, 4).unwrap();
        fs.write(h, "AB").unwrap();
        assert_eq!(fs.position(h).unwrap(), 12);
        fs.close(h).unwrap();
        assert_eq!(store.get("R").unwrap(), b"0123456789AB");
    }

    #[test]
    fn test_raw_write_then_read_within_at_and_beyond_end() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let h = fs.open("RAW", OpenMode::Random, 4).unwrap();
        fs.write_raw(h, b"abcdefgh").unwrap();

        // within
        fs.seek_record(h, 1, 2).unwrap();
        fs.write_raw(h, b"XY").unwrap();
        fs.seek_record(h, 1, 2).unwrap();
        assert_eq!(fs.read_raw(h, 2).unwrap(), b"XY");

        // window ends exactly at the end
        fs.seek_record(h, 4, 2).unwrap();
        fs.write_raw(h, b"PQ").unwrap();
        fs.seek_record(h, 4, 2).unwrap();
        assert_eq!(fs.read_raw(h, 2).unwrap(), b"PQ");
        assert_eq!(fs.length(h).unwrap(), 8);

        // beyond the end, gap zero-filled
        fs.seek_record(h, 4, 4).unwrap();
        fs.write_raw(h, b"ZZZZ").unwrap();
        assert_eq!(fs.length(h).unwrap(), 16);
        fs.seek_record(h, 4, 4).unwrap();
        assert_eq!(fs.read_raw(h, 4).unwrap(), b"ZZZZ");
        fs.seek_record(h, 3, 4).unwrap();
        assert_eq!(fs.read_raw(h, 4).unwrap(), vec![0u8; 4]);

        fs.close(h).unwrap();
        assert_eq!(store.get("RAW").unwrap(), b"XYcdefPQ\0\0\0\0ZZZZ");
    }

    #[test]
    fn test_seek_record_reads_record_range() {
        let store = MemoryStore::with_files([("REC", b"AAAABBBBCCCC".to_vec())]);
        let mut fs = fs_with(&store);
        let h = fs.open("REC", OpenMode::Random, 4).unwrap();

        fs.seek_record(h, 1, 4).unwrap();
        assert_eq!(fs.position(h).unwrap(), 0);
        assert_eq!(fs.read_raw(h, 4).unwrap(), b"AAAA");

        fs.seek_record(h, 3, 4).unwrap();
        assert_eq!(fs.read_raw(h, 4).unwrap(), b"CCCC");
        assert!(fs.eof(h).unwrap());

        fs.seek_record(h, 9, 4).unwrap();
        assert!(fs.eof(h).unwrap());
        assert_eq!(fs.read_raw(h, 4).unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn test_seek_record_zero_rejected() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let h = fs.open("R", OpenMode::Random, 4).unwrap();
        assert_eq!(fs.seek_record(h, 0, 4), Err(FileError::BadRecord { record: 0 }));
        assert!(matches!(
            fs.seek_record(h, 1, 0),
            Err(FileError::BadRecordLength { .. })
        ));
    }

    #[test]
    fn test_far_seek_is_bad_record() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let h = fs.open("R", OpenMode::Random, 2).unwrap();
        let record = (usize::MAX / 2) as u64;
        assert_eq!(fs.seek_record(h, record, 2), Err(FileError::BadRecord { record }));
        assert_eq!(fs.seek_record(h, u64::MAX, 4), Err(FileError::BadRecord { record: u64::MAX }));

        // the cursor stays where it was
        fs.write_raw(h, b"abcdefgh").unwrap();
        assert_eq!(fs.position(h).unwrap(), 8);
        assert_eq!(fs.length(h).unwrap(), 8);
    }

    #[test]
    fn test_window_past_limit_is_too_large() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let length = 4096;
        let h = fs.open("R", OpenMode::Random, length).unwrap();
        let last = (MAX_FILE_LENGTH / length) as u64 + 1;
        fs.seek_record(h, last, length).unwrap();
        assert!(matches!(fs.read_raw(h, length), Err(FileError::TooLarge { .. })));
        assert!(matches!(fs.write_raw(h, &[1u8; 4096]), Err(FileError::TooLarge { .. })));
        assert_eq!(fs.length(h).unwrap(), 0);
    }

    #[test]
    fn test_flush_keeps_handle_open() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let h = fs.open("F", OpenMode::Output, 128).unwrap();
        fs.write_line(h, "first").unwrap();
        fs.flush(h).unwrap();
        assert_eq!(store.get("F").unwrap(), b"first\n");
        fs.write_line(h, "second").unwrap();
        assert!(fs.is_open(h));
        fs.close(h).unwrap();
        assert_eq!(store.get("F").unwrap(), b"first\nsecond\n");
    }

    #[test]
    fn test_last_closer_wins() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let a = fs.open("SHARED", OpenMode::Output, 128).unwrap();
        let b = fs.open("SHARED", OpenMode::Output, 128).unwrap();
        assert_ne!(a, b);
        fs.write(a, "from a").unwrap();
        fs.write(b, "from b").unwrap();
        fs.close(b).unwrap();
        fs.close(a).unwrap();
        assert_eq!(store.get("SHARED").unwrap(), b"from a");
    }

    #[test]
    fn test_bad_handle_everywhere() {
        let store = MemoryStore::new();
        let mut fs = fs_with(&store);
        let h = fs.open("F", OpenMode::Output, 128).unwrap();
        fs.close(h).unwrap();

        assert_eq!(fs.close(h), Err(FileError::BadHandle(h)));
        assert_eq!(fs.read_line(h), Err(FileError::BadHandle(h)));
        assert_eq!(fs.write_line(h, "x"), Err(FileError::BadHandle(h)));
        assert_eq!(fs.eof(h), Err(FileError::BadHandle(h)));
        assert_eq!(fs.length(h), Err(FileError::BadHandle(h)));
    }

    #[test]
    fn test_close_all_persists_writable_handles() {
        let store = MemoryStore::with_files([("IN", b"x".to_vec())]);
        let mut fs = fs_with(&store);
        let out = fs.open("OUT", OpenMode::Output, 128).unwrap();
        fs.open("IN", OpenMode::Input, 128).unwrap();
        fs.write_line(out, "saved").unwrap();

        assert_eq!(fs.close_all().unwrap(), 2);
        assert_eq!(fs.open_count(), 0);
        assert_eq!(store.get("OUT").unwrap(), b"saved\n");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemoryStore::with_files([("GONE", b"x".to_vec())]);
        let mut fs = fs_with(&store);
        assert!(fs.remove("GONE").unwrap());
        assert!(!fs.remove("GONE").unwrap());
        assert!(!fs.exists("GONE"));
    }

    #[test]
    fn test_rename() {
        let store = MemoryStore::with_files([("OLD", b"content".to_vec())]);
        let mut fs = fs_with(&store);

        assert_eq!(
            fs.rename("MISSING", "NEW"),
            Err(FileError::NotFound {
                name: "MISSING".into()
            })
        );
        assert_eq!(store.len(), 1);

        fs.rename("OLD", "NEW").unwrap();
        assert!(!fs.exists("OLD"));
        let h = fs.open("NEW", OpenMode::Input, 128).unwrap();
        assert_eq!(fs.read_chars(h, 100).unwrap(), "content");
    }

    #[test]
    fn test_list_reports_sizes() {
        let store = MemoryStore::with_files([("B", vec![0; 3]), ("A", vec![0; 10])]);
        let fs = fs_with(&store);
        assert_eq!(
            fs.list().unwrap(),
            vec![("A".to_string(), 10), ("B".to_string(), 3)]
        );
    }

    #[test]
    fn test_open_hook_content_takes_precedence() {
        let store = MemoryStore::with_files([("F", b"from store".to_vec())]);
        let hooks = Arc::new(RecordingHooks {
            content: Some(b"from hook".to_vec()),
            ..Default::default()
        });
        let mut fs = fs_with(&store).with_hooks(hooks.clone());

        let h = fs.open("F", OpenMode::Input, 64).unwrap();
        assert_eq!(fs.read_chars(h, 100).unwrap(), "from hook");
        assert_eq!(hooks.events(), vec!["open F input 64"]);

        // absent from the store, still opens
        assert!(fs.open("ONLY.HOOK", OpenMode::Input, 128).is_ok());
    }

    #[test]
    fn test_open_hook_refusal_is_not_found() {
        let store = MemoryStore::with_files([("F", b"x".to_vec())]);
        let hooks = Arc::new(RecordingHooks {
            refuse: true,
            ..Default::default()
        });
        let mut fs = fs_with(&store).with_hooks(hooks);
        assert!(matches!(
            fs.open("F", OpenMode::Output, 128),
            Err(FileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_persistence_hooks_fire() {
        let store = MemoryStore::new();
        let hooks = Arc::new(RecordingHooks {
            exists: Some(true),
            ..Default::default()
        });
        let mut fs = fs_with(&store).with_hooks(hooks.clone());

        let h = fs.open("A", OpenMode::Output, 128).unwrap();
        fs.write(h, "abc").unwrap();
        fs.close(h).unwrap();
        fs.rename("A", "B").unwrap();
        fs.remove("B").unwrap();

        assert!(fs.exists("NEVER.WRITTEN"));
        assert_eq!(
            hooks.events(),
            vec![
                "open A output 128",
                "save A 3",
                "rename A B",
                "delete B"
            ]
        );
    }
}
