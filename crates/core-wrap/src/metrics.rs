//! Font measurement interface.
//!
//! The wrap engine never talks to a font backend directly; it measures text
//! through [`FontMetrics`] so the break calculator stays a pure function of
//! its arguments. Hosts with a real glyph cache implement the trait over it;
//! terminal-like hosts and tests use [`MonospaceMetrics`].

use bitflags::bitflags;

bitflags! {
    /// Style variants that affect glyph measurement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StyleFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
    }
}

/// Per-glyph measurement provider.
///
/// Implementations must be pure: the same (char, style) inputs always yield
/// the same advance, and kerning depends only on the character pair. The
/// wrap tables cache derived widths and rely on re-measurement producing
/// bit-identical results.
pub trait FontMetrics {
    /// Horizontal advance of `ch` in pixels.
    fn advance(&self, ch: char, style: StyleFlags) -> f32;

    /// Kerning adjustment between `prev` and `ch` in pixels.
    fn kerning(&self, prev: char, ch: char, style: StyleFlags) -> f32;

    /// True when every glyph has the same advance. Lets the calculator skip
    /// per-glyph lookups and kerning entirely.
    fn is_monospace(&self) -> bool;
}

/// Fixed-advance metrics: every glyph is `advance` wide, kerning is zero.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    pub advance: f32,
}

impl MonospaceMetrics {
    pub fn new(advance: f32) -> Self {
        Self { advance }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn advance(&self, _ch: char, _style: StyleFlags) -> f32 {
        self.advance
    }

    fn kerning(&self, _prev: char, _ch: char, _style: StyleFlags) -> f32 {
        0.0
    }

    fn is_monospace(&self) -> bool {
        true
    }
}
