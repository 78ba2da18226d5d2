//! Rope-based text buffer abstraction and the document read interface
//! consumed by the view layer.
//!
//! The view-layer structures (wrap map, fold map, highlight cache) never own
//! the text storage; they read it through [`Document`] and receive edit
//! notifications as `(from_line, to_line, delta_lines)` triples from whoever
//! applies the edits. [`Buffer`] is the rope-backed reference implementation
//! used by the editor proper and by tests.
//!
//! Invariants:
//! * `line(i)` returns line content without the trailing newline; `\r` is
//!   preserved (width handling downstream treats it as zero-width).
//! * `line_hash(i)` changes whenever `line(i)` changes (hash of the exact
//!   content plus its length to shorten collision odds).
//! * Out-of-range line indices degrade to the empty line, never panic; the
//!   view layer sits on a render hot path and clamps rather than errors.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use ahash::AHasher;
use anyhow::Result;
use ropey::Rope;

pub mod position;
pub use position::{Position, Range};

/// Read interface onto the text storage.
///
/// Implementations must be internally consistent: `line_count` bounds the
/// valid indices for `line`/`line_hash`, and the hash of a line must change
/// whenever its text does.
pub trait Document {
    /// Total number of logical lines. A document always has at least one.
    fn line_count(&self) -> usize;

    /// Content of line `idx` without the trailing newline. Out-of-range
    /// indices return the empty string.
    fn line(&self, idx: usize) -> Cow<'_, str>;

    /// Content hash of line `idx`, used for staleness detection.
    fn line_hash(&self, idx: usize) -> u64;

    /// True while a bulk load is still in flight. Wrap reconstruction is
    /// deferred until loading completes.
    fn is_loading(&self) -> bool {
        false
    }
}

/// Compute the content hash for a single line (no trailing newline).
pub fn hash_line(content: &str) -> u64 {
    let mut hasher = AHasher::default();
    content.hash(&mut hasher);
    content.len().hash(&mut hasher);
    hasher.finish()
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Debug, Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
    loading: bool,
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
            loading: false,
        })
    }

    /// Mark the buffer as mid-load (or loaded). While loading, dependent
    /// wrap state defers reconstruction.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Replace the whole-line span `[from_line, to_line]` with `replacement`
    /// (verbatim text; include a trailing newline when lines follow).
    /// Returns the net line delta, i.e. the `delta_lines` value for the
    /// matching edit notification.
    pub fn replace_lines(&mut self, from_line: usize, to_line: usize, replacement: &str) -> isize {
        let old_lines = self.rope.len_lines() as isize;
        let from_line = from_line.min(self.rope.len_lines().saturating_sub(1));
        let to_line = to_line
            .max(from_line)
            .min(self.rope.len_lines().saturating_sub(1));
        let start = self.rope.line_to_char(from_line);
        let end = if to_line + 1 < self.rope.len_lines() {
            self.rope.line_to_char(to_line + 1)
        } else {
            self.rope.len_chars()
        };
        self.rope.remove(start..end);
        if !replacement.is_empty() {
            self.rope.insert(start, replacement);
        }
        self.rope.len_lines() as isize - old_lines
    }

    /// Full rope contents (test/diagnostic helper).
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

impl Document for Buffer {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, idx: usize) -> Cow<'_, str> {
        if idx >= self.rope.len_lines() {
            return Cow::Borrowed("");
        }
        let line = self.rope.line(idx);
        let len = line.len_chars();
        let content = if len > 0 && line.char(len - 1) == '\n' {
            line.slice(..len - 1)
        } else {
            line
        };
        Cow::from(content)
    }

    fn line_hash(&self, idx: usize) -> u64 {
        hash_line(&self.line(idx))
    }

    fn is_loading(&self) -> bool {
        self.loading
    }
}
