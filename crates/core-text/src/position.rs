//! Document position and range value types.
//!
//! Positions address a location in the logical document as
//! (line index, column), where columns are char offsets within the line.
//! Ordering is lexicographic: line first, then column. `Range` is an ordered
//! pair of positions with a normalized form (start <= end); most consumers
//! normalize on construction and rely on it afterwards.

/// A location in the logical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn origin() -> Self {
        Self { line: 0, column: 0 }
    }
}

/// An ordered pair of positions describing a span of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Swap endpoints in place if they are out of order.
    pub fn normalize(&mut self) {
        if self.end < self.start {
            std::mem::swap(&mut self.start, &mut self.end);
        }
    }

    /// Return the normalized form (start <= end) without mutating.
    pub fn normalized(&self) -> Self {
        let mut r = *self;
        r.normalize();
        r
    }

    /// True if `pos` lies within the range (inclusive ends).
    ///
    /// Assumes the range is normalized.
    pub fn contains(&self, pos: Position) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// True if `line` falls inside the line span of the range (inclusive).
    ///
    /// Assumes the range is normalized.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start.line && line <= self.end.line
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Number of line transitions covered: end line minus start line.
    ///
    /// Assumes the range is normalized. A single-line range has height 0.
    pub fn height(&self) -> usize {
        self.end.line - self.start.line
    }
}
