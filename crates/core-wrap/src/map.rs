//! Wrap map: document-line to visual-line index translation.
//!
//! Holds, for the whole document, the ordered list of (line, column) wrap
//! breakpoints, per-line indentation padding, a line -> first-breakpoint
//! lookup table, and per-line fold visibility. Built in one O(document) pass
//! by [`WrapMap::reconstruct`] and patched in place by [`WrapMap::update`]
//! after each edit.
//!
//! The map does not own the document or the font metrics; operations that
//! need them take them as parameters so the map stays a plain value with no
//! shared mutable state.
//!
//! Invariants (hold after every mutation):
//! * `breaks` is ordered by (line, column); each document line contributes
//!   one run whose first entry has column 0.
//! * `line_to_first` is strictly increasing and
//!   `breaks[line_to_first[l]].line == l`.
//! * `hidden[l]` is true iff `l` lies inside a collapsed fold region.
//! * `hidden_lines` / `hidden_visual_lines` match the collapsed set.
//! * An incremental `update` leaves the tables byte-identical to a full
//!   `reconstruct` of the same document state (asserted in debug builds).
//!
//! Failure semantics: queries clamp out-of-range indices instead of
//! erroring; this sits on the render hot path where a panic on transient
//! inconsistency would be worse than a clamped answer.

use std::collections::HashMap;

use core_text::{Document, Position, Range};
use tracing::{debug, trace};

use crate::calculator::{WrapMode, compute_line_breaks};
use crate::metrics::{FontMetrics, StyleFlags};

/// A visual-line start anchor: the wrapped sub-line of `line` beginning at
/// char offset `column`. Every document line has one break at column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapBreak {
    pub line: usize,
    pub column: usize,
}

impl WrapBreak {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Wrap policy configuration for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapConfig {
    pub mode: WrapMode,
    pub keep_indentation: bool,
    pub tab_width: u32,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            mode: WrapMode::NoWrap,
            keep_indentation: true,
            tab_width: 4,
        }
    }
}

/// All visual sub-lines of one document line, plus its render metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLine {
    /// Folded-visual index of the first sub-line.
    pub visual_index: usize,
    /// Indentation padding applied to continuation sub-lines.
    pub padding_start: f32,
    /// True when the line is inside a collapsed fold.
    pub hidden: bool,
    /// Start anchor of each sub-line, in order.
    pub anchors: Vec<Position>,
}

/// The visual sub-line owning a document position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualLineInfo {
    pub visual_index: usize,
    pub range: Range,
}

/// Stateful wrap/fold index for a single document.
#[derive(Debug, Clone, Default)]
pub struct WrapMap {
    config: WrapConfig,
    style: StyleFlags,
    max_width: f32,
    /// One run of breakpoints per document line, ordered by (line, column).
    breaks: Vec<WrapBreak>,
    /// Leading indentation padding per document line.
    line_offset: Vec<f32>,
    /// Index into `breaks` of each line's first breakpoint.
    line_to_first: Vec<usize>,
    /// Per-line collapsed-fold visibility flags.
    pub(crate) hidden: Vec<bool>,
    /// Registered foldable regions, keyed by start line.
    pub(crate) fold_regions: HashMap<usize, Range>,
    /// Currently collapsed regions, sorted by start position.
    pub(crate) collapsed: Vec<Range>,
    pub(crate) hidden_lines: usize,
    pub(crate) hidden_visual_lines: usize,
    pending_reconstruction: bool,
}

impl WrapMap {
    pub fn new(config: WrapConfig, style: StyleFlags) -> Self {
        Self {
            config,
            style,
            ..Self::default()
        }
    }

    pub fn config(&self) -> WrapConfig {
        self.config
    }

    pub fn is_wrap_enabled(&self) -> bool {
        self.config.mode != WrapMode::NoWrap
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    pub fn pending_reconstruction(&self) -> bool {
        self.pending_reconstruction
    }

    /// True once `reconstruct` produced wrap tables that are in use.
    fn wrap_active(&self) -> bool {
        self.config.mode != WrapMode::NoWrap && !self.breaks.is_empty()
    }

    /// Replace the whole configuration; rebuilds only on actual change.
    pub fn set_config<D: Document, M: FontMetrics + ?Sized>(
        &mut self,
        doc: &D,
        metrics: &M,
        config: WrapConfig,
    ) {
        if config != self.config {
            self.config = config;
            self.reconstruct(doc, metrics);
        }
    }

    pub fn set_mode<D: Document, M: FontMetrics + ?Sized>(
        &mut self,
        doc: &D,
        metrics: &M,
        mode: WrapMode,
    ) {
        if mode != self.config.mode {
            self.config.mode = mode;
            self.reconstruct(doc, metrics);
        }
    }

    /// Set the wrap width in pixels. `force` reruns the rebuild even when
    /// the width is unchanged (used after deferred loading completes).
    pub fn set_max_width<D: Document, M: FontMetrics + ?Sized>(
        &mut self,
        doc: &D,
        metrics: &M,
        max_width: f32,
        force: bool,
    ) {
        if max_width != self.max_width {
            self.max_width = max_width;
            self.reconstruct(doc, metrics);
        } else if force || self.pending_reconstruction {
            self.reconstruct(doc, metrics);
        }
    }

    pub fn set_style<D: Document, M: FontMetrics + ?Sized>(
        &mut self,
        doc: &D,
        metrics: &M,
        style: StyleFlags,
    ) {
        if style != self.style {
            self.style = style;
            self.reconstruct(doc, metrics);
        }
    }

    /// Drop every table, including registered and collapsed fold regions.
    /// Used when rebinding the view to a fresh document.
    pub fn clear(&mut self) {
        self.breaks.clear();
        self.line_to_first.clear();
        self.line_offset.clear();
        self.hidden.clear();
        self.fold_regions.clear();
        self.collapsed.clear();
        self.hidden_lines = 0;
        self.hidden_visual_lines = 0;
    }

    /// Full O(lines x length) rebuild of every table from the document.
    ///
    /// Deferred (pending flag) while the document reports itself mid-load;
    /// rerun via `set_max_width(.., force)` once loading completes. Also the
    /// correctness fallback the incremental path is checked against.
    pub fn reconstruct<D: Document, M: FontMetrics + ?Sized>(&mut self, doc: &D, metrics: &M) {
        if doc.is_loading() {
            self.pending_reconstruction = self.config.mode != WrapMode::NoWrap;
            return;
        }

        let lines = doc.line_count();
        self.breaks.clear();
        self.line_to_first.clear();
        self.line_offset.clear();
        self.hidden.clear();

        // Visibility flags are maintained in every mode; wrap tables only
        // when wrapping is live.
        self.refresh_hidden(lines);

        if self.config.mode == WrapMode::NoWrap || self.max_width <= 0.0 {
            self.recalculate_hidden_counts();
            self.pending_reconstruction = false;
            return;
        }

        self.breaks.reserve(lines);
        self.line_offset.reserve(lines);
        for i in 0..lines {
            let lb = compute_line_breaks(
                &doc.line(i),
                metrics,
                self.style,
                self.max_width,
                self.config.mode,
                self.config.keep_indentation,
                self.config.tab_width,
            );
            self.line_offset.push(lb.padding_start);
            for col in lb.offsets {
                self.breaks.push(WrapBreak::new(i, col));
            }
        }

        self.line_to_first.reserve(lines);
        let mut last_line = usize::MAX;
        for (i, wb) in self.breaks.iter().enumerate() {
            if wb.line != last_line {
                self.line_to_first.push(i);
                last_line = wb.line;
            }
        }

        self.recalculate_hidden_counts();
        self.pending_reconstruction = false;
        debug!(
            lines,
            breaks = self.breaks.len(),
            mode = self.config.mode.name(),
            "wrap tables reconstructed"
        );
    }

    /// Incremental patch after an edit that replaced document lines
    /// `[from_line, to_line]` with a block shifted by `delta_lines`.
    ///
    /// Erases the affected wrapped span, shifts the suffix and the fold
    /// regions, recomputes breaks for the new lines, splices them in, and
    /// repairs the lookup table for the touched suffix. Fold regions shift
    /// before per-line visibility is recomputed so the flags reflect the
    /// post-edit boundaries.
    pub fn update<D: Document, M: FontMetrics + ?Sized>(
        &mut self,
        doc: &D,
        metrics: &M,
        from_line: usize,
        to_line: usize,
        delta_lines: isize,
    ) {
        trace!(from_line, to_line, delta_lines, "incremental wrap update");

        if !self.wrap_active() {
            // No wrap tables to patch, but fold regions and visibility
            // flags still track the edit.
            if delta_lines != 0 {
                self.shift_fold_regions(from_line, delta_lines);
            }
            self.refresh_hidden(doc.line_count());
            self.recalculate_hidden_counts();
            return;
        }

        let last_line = self.line_to_first.len().saturating_sub(1);
        let from_line = from_line.min(last_line);
        let to_line = to_line.clamp(from_line, last_line);

        // 1. Old wrapped span covering [from_line, to_line].
        let old_from = self.to_wrapped_index(from_line, false);
        let old_to = self.to_wrapped_index(to_line, true);

        // 2. Erase the span and the per-line entries.
        self.breaks.drain(old_from..=old_to);
        self.line_offset.drain(from_line..=to_line);

        // 3. Shift the suffix and the fold regions.
        if delta_lines != 0 {
            for wb in &mut self.breaks[old_from..] {
                wb.line = (wb.line as isize + delta_lines) as usize;
            }
            self.shift_fold_regions(from_line, delta_lines);
        }

        // 4. Recompute breaks for the new line range and splice them in.
        let new_to = to_line as isize + delta_lines;
        let mut idx_offset = old_from;
        if new_to >= from_line as isize {
            for i in from_line..=new_to as usize {
                let lb = compute_line_breaks(
                    &doc.line(i),
                    metrics,
                    self.style,
                    self.max_width,
                    self.config.mode,
                    self.config.keep_indentation,
                    self.config.tab_width,
                );
                self.line_offset.insert(i, lb.padding_start);
                for col in lb.offsets {
                    self.breaks.insert(idx_offset, WrapBreak::new(i, col));
                    idx_offset += 1;
                }
            }
        }

        // 5. Rebuild the lookup table for the affected suffix.
        self.line_to_first.resize(doc.line_count(), 0);
        let mut line = from_line;
        for widx in old_from..self.breaks.len() {
            if self.breaks[widx].column == 0 {
                if line < self.line_to_first.len() {
                    self.line_to_first[line] = widx;
                }
                line += 1;
            }
        }
        self.line_to_first.truncate(doc.line_count());

        // 6. Visibility flags and counters come straight from the shifted
        // collapsed set; a straddling region can leave stale flags in the
        // kept suffix otherwise.
        self.refresh_hidden(doc.line_count());
        self.recalculate_hidden_counts();

        debug_assert!(
            self.matches_reconstruct(doc, metrics),
            "incremental update diverged from full reconstruct"
        );
    }

    /// Rebuild the per-line visibility flags from the collapsed set.
    fn refresh_hidden(&mut self, lines: usize) {
        self.hidden.clear();
        self.hidden.reserve(lines);
        for i in 0..lines {
            let folded = self.is_folded(i);
            self.hidden.push(folded);
        }
    }

    /// Compare the live tables against a from-scratch rebuild of the same
    /// document state. Test utility backing the debug equivalence assert;
    /// expensive (full reconstruct), so never call it on a hot path.
    pub fn matches_reconstruct<D: Document, M: FontMetrics + ?Sized>(
        &self,
        doc: &D,
        metrics: &M,
    ) -> bool {
        let mut fresh = self.clone();
        fresh.reconstruct(doc, metrics);
        self.breaks == fresh.breaks
            && self.line_offset == fresh.line_offset
            && self.line_to_first == fresh.line_to_first
            && self.hidden == fresh.hidden
            && self.hidden_lines == fresh.hidden_lines
            && self.hidden_visual_lines == fresh.hidden_visual_lines
    }

    /// Document position of the wrapped sub-line at `wrapped` (unfolded
    /// visual space). Clamps out-of-range indices.
    pub fn document_line_at(&self, wrapped: usize) -> Position {
        if !self.wrap_active() {
            return Position::new(wrapped, 0);
        }
        let wb = self.breaks[wrapped.min(self.breaks.len() - 1)];
        Position::new(wb.line, wb.column)
    }

    /// First (or, with `want_last`, last) wrapped sub-line of `doc_line` in
    /// the unfolded wrapped sequence.
    pub fn to_wrapped_index(&self, doc_line: usize, want_last: bool) -> usize {
        if !self.wrap_active() || self.line_to_first.is_empty() {
            return doc_line;
        }
        let mut idx = self.line_to_first[doc_line.min(self.line_to_first.len() - 1)];
        if want_last {
            let line = self.breaks[idx].line;
            for i in idx + 1..self.breaks.len() {
                if self.breaks[i].line == line {
                    idx = i;
                } else {
                    break;
                }
            }
        }
        idx
    }

    /// Fold-aware visual index of a wrapped index: subtract the visual
    /// length of every collapsed region entirely before the owning line.
    pub(crate) fn visual_index_from_wrapped(&self, wrapped: usize) -> usize {
        if self.collapsed.is_empty() {
            return wrapped;
        }
        let doc_idx = if self.wrap_active() {
            self.breaks[wrapped.min(self.breaks.len() - 1)].line
        } else {
            wrapped
        };
        let mut idx = wrapped;
        for fold in &self.collapsed {
            if fold.start.line < doc_idx {
                idx = idx.saturating_sub(
                    self.fold_visual_length(fold.start.line, fold.end.line.min(doc_idx)),
                );
            } else if fold.start.line > doc_idx {
                break;
            }
        }
        idx
    }

    /// Folded-visual index of the first sub-line of `doc_line`.
    pub fn visual_index(&self, doc_line: usize) -> usize {
        self.visual_index_from_wrapped(self.to_wrapped_index(doc_line, false))
    }

    /// Vertical pixel offset of `doc_line` given a uniform line height.
    pub fn line_y_offset(&self, doc_line: usize, line_height: f32) -> f32 {
        self.visual_index(doc_line) as f32 * line_height
    }

    /// Indentation padding of `doc_line` (0 outside wrap mode).
    pub fn line_padding(&self, doc_line: usize) -> f32 {
        if !self.wrap_active() || self.line_offset.is_empty() {
            return 0.0;
        }
        self.line_offset[doc_line.min(self.line_offset.len() - 1)]
    }

    /// True when `doc_line` spans more than one visual sub-line.
    pub fn is_wrapped_line(&self, doc_line: usize) -> bool {
        if !self.wrap_active() {
            return false;
        }
        let idx = self.to_wrapped_index(doc_line, false);
        idx + 1 < self.breaks.len() && self.breaks[idx + 1].line == self.breaks[idx].line
    }

    /// All sub-line anchors of `doc_line` plus its render metadata.
    pub fn visual_line(&self, doc_line: usize) -> VisualLine {
        if !self.wrap_active() {
            return VisualLine {
                visual_index: self.visual_index(doc_line),
                padding_start: 0.0,
                hidden: self.is_line_hidden(doc_line),
                anchors: vec![Position::new(doc_line, 0)],
            };
        }
        let from = self.to_wrapped_index(doc_line, false);
        let to = self.to_wrapped_index(doc_line, true);
        let anchors = self.breaks[from..=to]
            .iter()
            .map(|wb| Position::new(wb.line, wb.column))
            .collect();
        VisualLine {
            visual_index: self.visual_index_from_wrapped(from),
            padding_start: self.line_padding(doc_line),
            hidden: self.is_line_hidden(doc_line),
            anchors,
        }
    }

    /// Locate the visual sub-line owning `pos`.
    ///
    /// `allow_visual_line_end` treats the first column of the next sub-line
    /// as still belonging to the current one (cursor-at-wrap semantics).
    pub fn visual_line_of<D: Document>(
        &self,
        doc: &D,
        pos: Position,
        allow_visual_line_end: bool,
    ) -> VisualLineInfo {
        if !self.wrap_active() {
            let len = doc.line(pos.line).chars().count();
            return VisualLineInfo {
                visual_index: self.visual_index(pos.line),
                range: Range::new(Position::new(pos.line, 0), Position::new(pos.line, len)),
            };
        }
        let from = self.to_wrapped_index(pos.line, false);
        let to = self.to_wrapped_index(pos.line, true);
        for i in from..to {
            let from_col = self.breaks[i].column;
            let to_col = self.breaks[i + 1].column - if allow_visual_line_end { 0 } else { 1 };
            if pos.column >= from_col && pos.column <= to_col {
                return VisualLineInfo {
                    visual_index: self.visual_index_from_wrapped(i),
                    range: Range::new(
                        Position::new(pos.line, from_col),
                        Position::new(pos.line, to_col),
                    ),
                };
            }
        }
        let len = doc.line(pos.line).chars().count();
        VisualLineInfo {
            visual_index: self.visual_index_from_wrapped(to),
            range: Range::new(
                Position::new(pos.line, self.breaks[to].column),
                Position::new(pos.line, len),
            ),
        }
    }

    /// Document char range spanned by one visual (wrapped) line.
    pub fn visual_line_range<D: Document>(&self, doc: &D, visual: usize) -> Range {
        if !self.wrap_active() {
            let line = visual.min(doc.line_count().saturating_sub(1));
            let len = doc.line(line).chars().count();
            return Range::new(Position::new(line, 0), Position::new(line, len));
        }
        let start = self.document_line_at(visual);
        let visual = visual.min(self.breaks.len() - 1);
        let end_col = if visual + 1 < self.breaks.len() && self.breaks[visual + 1].line == start.line
        {
            self.breaks[visual + 1].column
        } else {
            doc.line(start.line).chars().count()
        };
        Range::new(start, Position::new(start.line, end_col))
    }

    /// Total on-screen lines: document lines minus hidden lines in NoWrap
    /// mode, wrapped sub-lines minus hidden sub-lines otherwise.
    pub fn total_visible_lines<D: Document>(&self, doc: &D) -> usize {
        if self.wrap_active() {
            self.breaks.len().saturating_sub(self.hidden_visual_lines)
        } else {
            doc.line_count().saturating_sub(self.hidden_lines)
        }
    }

    /// Document-line bounds `(first, last)` of the view window starting at
    /// `start_visual` and spanning `view_line_count` rows, skipping folded
    /// lines. A zero-row window collapses to the start line. With
    /// `visual_indexes`, both the input and the scan are in visual space;
    /// otherwise they are document-line indices.
    pub fn visible_line_range<D: Document>(
        &self,
        doc: &D,
        start_visual: usize,
        view_line_count: usize,
        visual_indexes: bool,
    ) -> (usize, usize) {
        if self.collapsed.is_empty() {
            if self.wrap_active() && !visual_indexes {
                return (
                    self.document_line_at(start_visual).line,
                    self.document_line_at(start_visual + view_line_count).line,
                );
            }
            let last = if visual_indexes {
                self.total_visible_lines(doc).saturating_sub(1)
            } else {
                doc.line_count().saturating_sub(1)
            };
            return (start_visual, (start_visual + view_line_count).min(last));
        }

        if self.wrap_active() && visual_indexes {
            let start_doc = self.document_line_at(start_visual).line;
            if view_line_count == 0 {
                return (start_doc, start_doc);
            }
            let mut left = view_line_count;
            for i in start_doc + 1..self.breaks.len() {
                if self.is_line_hidden(self.breaks[i].line) {
                    continue;
                }
                left -= 1;
                if left == 0 {
                    return (start_doc, self.document_line_at(i).line);
                }
            }
            return (start_doc, self.breaks[self.breaks.len() - 1].line);
        }

        let start_doc = start_visual;
        if view_line_count == 0 {
            return (start_doc, start_doc);
        }
        let mut left = view_line_count;
        for i in start_doc + 1..doc.line_count() {
            if self.is_line_hidden(i) {
                continue;
            }
            left -= 1;
            if left == 0 {
                return (start_doc, i);
            }
        }
        (start_doc, doc.line_count().saturating_sub(1))
    }

    /// True if `doc_line` is inside a collapsed fold.
    pub fn is_line_hidden(&self, doc_line: usize) -> bool {
        self.hidden.get(doc_line).copied().unwrap_or(false)
    }

    pub fn is_next_line_hidden(&self, doc_line: usize) -> bool {
        self.is_line_hidden(doc_line + 1)
    }
}
