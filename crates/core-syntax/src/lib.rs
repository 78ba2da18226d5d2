//! Incremental syntax-highlighting cache.
//!
//! Tokenizes document lines lazily through an opaque [`Tokenizer`], caches
//! the result per line keyed by content hash, and propagates tokenizer-state
//! invalidation across dependent lines a bounded window at a time.
//!
//! The cache is a state machine per document, not per line: it tracks the
//! lowest invalidated line and the highest line ever requested (the visible
//! frontier), and [`Highlighter::update_dirty`] walks the stale window once
//! per frame. Re-tokenization stops propagating as soon as a line's required
//! input state matches the state it was last tokenized with: tokenizers are
//! pure, so equal input state implies equal output (the fixed point of
//! incremental lexing).
//!
//! Invariants:
//! * A cached entry is served only when its stored content hash matches the
//!   document line's current hash; stale hits are structurally impossible.
//! * `first_invalid_line` only moves forward inside `update_dirty` and only
//!   backward through `invalidate`.
//!
//! Single-threaded: confine a `Highlighter` to the thread owning its view.

use std::collections::HashMap;

use core_text::Document;
use tracing::{debug, trace};

/// Tokenizer state carried between consecutive lines ("none" = column 0 of
/// a fresh document, outside any multi-line construct).
pub const STATE_NONE: u64 = 0;

/// Opaque token-type identifier assigned by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenKind(pub u32);

/// A typed span of a single line; `len` is in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub len: usize,
}

/// Grammar engine boundary: line text + input state in, token list + output
/// state out. Must be pure and deterministic; the caching and fixed-point
/// stopping rules rely on it.
pub trait Tokenizer {
    fn tokenize(&self, text: &str, state: u64) -> (Vec<Token>, u64);
}

/// Cached tokenization of one document line.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedLine {
    /// Content hash of the text this entry was computed from.
    pub hash: u64,
    /// Tokenizer state the line was tokenized with.
    pub init_state: u64,
    /// Tokenizer state the line produced.
    pub state: u64,
    pub tokens: Vec<Token>,
    /// Rolling hash over token types only; equal signatures mean the line
    /// is visually equivalent even if its text changed.
    pub signature: u64,
}

/// djb2-style fold of one value into a rolling signature, byte by byte.
fn mix_signature(signature: u64, val: u64) -> u64 {
    let mut sig = signature;
    for shift in (0..8).rev() {
        sig = sig
            .wrapping_mul(33)
            .wrapping_add((val >> (shift * 8)) & 0xff);
    }
    sig
}

/// Per-document incremental highlight cache.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    lines: HashMap<usize, TokenizedLine>,
    first_invalid_line: usize,
    max_wanted_line: usize,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached line and rewind the invalidation frontier.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.first_invalid_line = 0;
        self.max_wanted_line = 0;
    }

    /// Rebind to a fresh document: full reset, then treat the whole
    /// document as wanted so `update_dirty` re-tokenizes from the top.
    pub fn rebind<D: Document>(&mut self, doc: &D) {
        self.reset();
        self.max_wanted_line = doc.line_count().saturating_sub(1);
    }

    /// Record that lines at or after `from_line` may be stale. Also clamps
    /// the wanted frontier in case the document shrank.
    pub fn invalidate<D: Document>(&mut self, doc: &D, from_line: usize) {
        self.first_invalid_line = self.first_invalid_line.min(from_line);
        self.max_wanted_line = self
            .max_wanted_line
            .min(doc.line_count().saturating_sub(1));
    }

    pub fn first_invalid_line(&self) -> usize {
        self.first_invalid_line
    }

    pub fn max_wanted_line(&self) -> usize {
        self.max_wanted_line
    }

    /// Cached entry for `index`, if any, without recomputing.
    pub fn cached_line(&self, index: usize) -> Option<&TokenizedLine> {
        self.lines.get(&index)
    }

    /// Token-type signature of `index`, if cached.
    pub fn signature(&self, index: usize) -> Option<u64> {
        self.lines.get(&index).map(|l| l.signature)
    }

    fn tokenize_line<D: Document, T: Tokenizer + ?Sized>(
        &self,
        doc: &D,
        tokenizer: &T,
        index: usize,
        state: u64,
    ) -> TokenizedLine {
        trace!(index, state, "tokenizing line");
        let hash = doc.line_hash(index);
        let (tokens, out_state) = tokenizer.tokenize(&doc.line(index), state);
        let mut signature = 5381u64;
        for token in &tokens {
            signature = mix_signature(signature, token.kind.0 as u64);
        }
        TokenizedLine {
            hash,
            init_state: state,
            state: out_state,
            tokens,
            signature,
        }
    }

    fn prev_state(&self, index: usize) -> u64 {
        if index == 0 {
            return STATE_NONE;
        }
        self.lines
            .get(&(index - 1))
            .map(|l| l.state)
            .unwrap_or(STATE_NONE)
    }

    /// Tokenization of line `index`, recomputed if missing or if the
    /// document line's content hash no longer matches the cached one.
    /// Cache hits raise the wanted frontier to at least `index`.
    pub fn line<D: Document, T: Tokenizer + ?Sized>(
        &mut self,
        doc: &D,
        tokenizer: &T,
        index: usize,
    ) -> &TokenizedLine {
        let stale = match self.lines.get(&index) {
            None => true,
            Some(entry) => index < doc.line_count() && doc.line_hash(index) != entry.hash,
        };
        if stale {
            let entry = self.tokenize_line(doc, tokenizer, index, self.prev_state(index));
            self.lines.insert(index, entry);
        } else {
            self.max_wanted_line = self.max_wanted_line.max(index);
        }
        &self.lines[&index]
    }

    /// Amortized incremental step; call once per frame with the number of
    /// visible lines. Re-tokenizes at most one window of the stale range,
    /// skipping lines whose required input state already matches what they
    /// were tokenized with. Returns whether any line actually changed.
    pub fn update_dirty<D: Document, T: Tokenizer + ?Sized>(
        &mut self,
        doc: &D,
        tokenizer: &T,
        visible_line_count: usize,
    ) -> bool {
        if visible_line_count == 0 {
            return false;
        }
        if self.first_invalid_line > self.max_wanted_line {
            // Nothing stale inside the visible frontier; go idle.
            self.max_wanted_line = 0;
            return false;
        }

        let mut changed = false;
        let max = (self.first_invalid_line + visible_line_count).min(self.max_wanted_line);
        for index in self.first_invalid_line..=max {
            let state = self.prev_state(index);
            let needs_retokenize = match self.lines.get(&index) {
                None => true,
                Some(entry) => entry.init_state != state,
            };
            if needs_retokenize {
                let entry = self.tokenize_line(doc, tokenizer, index, state);
                self.lines.insert(index, entry);
                changed = true;
            }
        }
        self.first_invalid_line = max + 1;
        if changed {
            debug!(
                up_to = max,
                first_invalid = self.first_invalid_line,
                "highlight window re-tokenized"
            );
        }
        changed
    }
}
