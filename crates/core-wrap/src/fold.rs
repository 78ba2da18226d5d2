//! Fold map: registered foldable regions and the collapsed subset.
//!
//! Fold state lives on [`WrapMap`] because collapsing needs the wrap tables
//! for visual-length accounting, and edits must shift fold boundaries and
//! wrap breakpoints in the same pass to keep both index spaces consistent.
//!
//! Invariants:
//! * `collapsed` stays sorted by start position and holds at most one entry
//!   per region; collapse/expand of an already-collapsed/expanded region is
//!   a no-op.
//! * `hidden_lines` equals the summed heights of collapsed regions;
//!   `hidden_visual_lines` their summed visual lengths.

use core_text::Range;
use tracing::debug;

use crate::map::WrapMap;

impl WrapMap {
    /// Register a foldable region. Normalized and keyed by start line; a
    /// later registration with the same start line replaces the earlier one.
    pub fn add_fold_region(&mut self, mut region: Range) {
        region.normalize();
        self.fold_regions.insert(region.start.line, region);
    }

    /// True if a foldable region starts at `doc_line`.
    pub fn has_fold_region_at(&self, doc_line: usize) -> bool {
        self.fold_regions.contains_key(&doc_line)
    }

    /// Collapse the region registered at `start_line`. Unknown start lines
    /// and already-collapsed regions are silent no-ops.
    pub fn fold(&mut self, start_line: usize) {
        let Some(region) = self.fold_regions.get(&start_line).copied() else {
            return;
        };
        if self.collapsed.contains(&region) {
            return;
        }
        let to_line = region.end.line;
        let visual_len = self.fold_visual_length(start_line, to_line);
        self.hidden_lines += region.height();
        self.hidden_visual_lines += visual_len;
        self.set_lines_hidden(start_line, to_line, true);
        self.collapsed.push(region);
        self.collapsed.sort_unstable();
        debug!(start_line, to_line, "fold region collapsed");
    }

    /// Expand the region registered at `start_line`. Inverse of [`fold`];
    /// a no-op when the region is not currently collapsed.
    ///
    /// [`fold`]: WrapMap::fold
    pub fn unfold(&mut self, start_line: usize) {
        let Some(region) = self.fold_regions.get(&start_line).copied() else {
            return;
        };
        let Some(pos) = self.collapsed.iter().position(|r| *r == region) else {
            return;
        };
        let to_line = region.end.line;
        let visual_len = self.fold_visual_length(start_line, to_line);
        self.hidden_lines -= region.height();
        self.hidden_visual_lines -= visual_len;
        self.set_lines_hidden(start_line, to_line, false);
        self.collapsed.remove(pos);
        debug!(start_line, to_line, "fold region expanded");
    }

    /// True if `doc_line` lies inside any collapsed region. Linear over the
    /// collapsed set, which stays small relative to the document.
    pub fn is_folded(&self, doc_line: usize) -> bool {
        self.collapsed.iter().any(|r| r.contains_line(doc_line))
    }

    /// Number of wrapped sub-lines spanned by document lines
    /// `[from_line, to_line]` (inclusive, either order). In NoWrap mode this
    /// degrades to the plain line count.
    pub fn fold_visual_length(&self, from_line: usize, to_line: usize) -> usize {
        let (from_line, to_line) = if from_line <= to_line {
            (from_line, to_line)
        } else {
            (to_line, from_line)
        };
        let start = self.to_wrapped_index(from_line, false);
        let end = self.to_wrapped_index(to_line, true);
        end - start + 1
    }

    pub fn hidden_lines_count(&self) -> usize {
        self.hidden_lines
    }

    pub fn hidden_visual_lines_count(&self) -> usize {
        self.hidden_visual_lines
    }

    /// Currently collapsed regions, sorted by start position.
    pub fn collapsed_regions(&self) -> &[Range] {
        &self.collapsed
    }

    fn set_lines_hidden(&mut self, from_line: usize, to_line: usize, hidden: bool) {
        if from_line >= self.hidden.len() {
            return;
        }
        for i in from_line..=to_line.min(self.hidden.len() - 1) {
            self.hidden[i] = hidden;
        }
    }

    /// Shift every registered and collapsed region at or after `from_line`
    /// by `delta_lines`. Registered regions are rekeyed by their new start.
    pub(crate) fn shift_fold_regions(&mut self, from_line: usize, delta_lines: isize) {
        let shift = |line: usize| (line as isize + delta_lines).max(0) as usize;
        self.fold_regions = self
            .fold_regions
            .drain()
            .map(|(key, mut region)| {
                if region.start.line >= from_line {
                    region.start.line = shift(region.start.line);
                    region.end.line = shift(region.end.line);
                    (region.start.line, region)
                } else {
                    (key, region)
                }
            })
            .collect();
        for region in &mut self.collapsed {
            if region.start.line >= from_line {
                region.start.line = shift(region.start.line);
                region.end.line = shift(region.end.line);
            }
        }
    }

    /// Recompute both hidden counters from the collapsed set. Bounded by
    /// fold-region count, not document size.
    pub(crate) fn recalculate_hidden_counts(&mut self) {
        let mut lines = 0;
        let mut visual = 0;
        for region in &self.collapsed {
            lines += region.height();
            visual += self.fold_visual_length(region.start.line, region.end.line);
        }
        self.hidden_lines = lines;
        self.hidden_visual_lines = visual;
    }
}
