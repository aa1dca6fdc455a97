//! Open-file state and the cursor semantics of each access path

use crate::error::{FileError, FileResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest buffer an open file may grow to, and the furthest a cursor may
/// be placed.
pub const MAX_FILE_LENGTH: usize = 32 * 1024 * 1024;

/// Identifies an open file between `open` and `close`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// File access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    Input,
    Output,
    Append,
    Random,
}

impl OpenMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Input => "input",
            OpenMode::Output => "output",
            OpenMode::Append => "append",
            OpenMode::Random => "random",
        }
    }

    /// Whether closing a handle in this mode writes back to the store
    pub fn persists(&self) -> bool {
        !matches!(self, OpenMode::Input)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file while it is open: its name, mode and a private copy of its bytes.
///
/// Line writes and raw writes are two separate paths on purpose:
/// `append_text` always lands at the end, `write_raw` lands at the cursor.
#[derive(Debug, Clone)]
pub struct OpenFile {
    name: String,
    mode: OpenMode,
    record_length: usize,
    position: usize,
    eof: bool,
    data: Vec<u8>,
}

impl OpenFile {
    pub fn new(name: impl Into<String>, mode: OpenMode, record_length: usize, data: Vec<u8>) -> Self {
        let position = match mode {
            OpenMode::Append => data.len(),
            _ => 0,
        };
        Self {
            name: name.into(),
            mode,
            record_length,
            position,
            eof: false,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn record_length(&self) -> usize {
        self.record_length
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sticky flag from the last read, or the cursor sitting at/after the end.
    pub fn eof(&self) -> bool {
        self.eof || self.position >= self.data.len()
    }

    fn settle_eof(&mut self) {
        self.eof = self.position >= self.data.len();
    }

    /// Next `\n`-terminated line; a trailing `\r` is dropped.
    pub fn read_line(&mut self) -> Option<String> {
        if self.position >= self.data.len() {
            self.eof = true;
            return None;
        }
        let rest = &self.data[self.position..];
        let (end, next) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (self.position + i, self.position + i + 1),
            None => (self.data.len(), self.data.len()),
        };
        let mut line = &self.data[self.position..end];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        let text = String::from_utf8_lossy(line).into_owned();
        self.position = next;
        self.settle_eof();
        Some(text)
    }

    /// Append text at the end regardless of the cursor; the cursor follows.
    pub fn append_text(&mut self, text: &str) {
        self.data.extend_from_slice(text.as_bytes());
        self.position = self.data.len();
    }

    /// Up to `n` bytes from the cursor.
    pub fn read_chars(&mut self, n: usize) -> String {
        let start = self.position.min(self.data.len());
        let end = start.saturating_add(n).min(self.data.len());
        let text = String::from_utf8_lossy(&self.data[start..end]).into_owned();
        self.position = end;
        self.settle_eof();
        text
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position;
        self.settle_eof();
    }

    /// End of a `size`-byte window at the cursor, if it stays within
    /// [`MAX_FILE_LENGTH`].
    fn window_end(&self, size: usize) -> FileResult<usize> {
        self.position
            .checked_add(size)
            .filter(|end| *end <= MAX_FILE_LENGTH)
            .ok_or(FileError::TooLarge {
                length: self.position.saturating_add(size),
            })
    }

    /// Exactly `size` bytes from the cursor, zero past the end.
    pub fn read_raw(&mut self, size: usize) -> FileResult<Vec<u8>> {
        let end = self.window_end(size)?;
        let mut out = vec![0u8; size];
        if self.position < self.data.len() {
            let available = (self.data.len() - self.position).min(size);
            out[..available].copy_from_slice(&self.data[self.position..self.position + available]);
        }
        self.position = end;
        self.settle_eof();
        Ok(out)
    }

    /// Overwrite the window at the cursor, zero-filling any gap before it and
    /// growing the buffer when the window runs past the end.
    pub fn write_raw(&mut self, bytes: &[u8]) -> FileResult<()> {
        let end = self.window_end(bytes.len())?;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }
}
