//! Line-break calculator.
//!
//! Pure functions mapping (line text, style, max width, wrap mode, options)
//! to ordered break offsets plus the leading indentation padding. Offsets
//! are char indices into the line. This is the correctness foundation of
//! every index-mapping table built on top of it: given identical inputs the
//! output must be bit-identical, so nothing here reads ambient state.
//!
//! Invariants:
//! * `offsets` is non-empty and starts with 0.
//! * Offsets strictly increase.
//! * `NoWrap` mode and empty lines yield exactly one offset and no padding.

use crate::metrics::{FontMetrics, StyleFlags};

/// Wrap policy for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    NoWrap,
    /// Hard break at the first glyph that exceeds the max width.
    Letter,
    /// Prefer breaking after the last soft-break candidate (space, period,
    /// hyphen, comma); fall back to a hard break when none exists.
    Word,
}

impl WrapMode {
    /// Parse a config-file name. Unknown names fall back to `NoWrap`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "word" => WrapMode::Word,
            "letter" => WrapMode::Letter,
            _ => WrapMode::NoWrap,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WrapMode::Word => "word",
            WrapMode::Letter => "letter",
            WrapMode::NoWrap => "nowrap",
        }
    }
}

/// Result of wrapping a single document line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBreaks {
    /// Char offsets where each visual sub-line starts. First entry is 0.
    pub offsets: Vec<usize>,
    /// Leading indentation width applied to continuation sub-lines when
    /// `keep_indentation` is enabled.
    pub padding_start: f32,
}

const INDENT_CHARS: &[char] = &[' ', '\t', '\n', '\x0b', '\x0c', '\r'];

fn is_soft_break(ch: char) -> bool {
    matches!(ch, ' ' | '.' | '-' | ',')
}

/// Measured width of `text`, honoring tabs and carriage returns the same way
/// the break walk does.
fn text_width<M: FontMetrics + ?Sized>(
    text: &str,
    metrics: &M,
    style: StyleFlags,
    tab_width: u32,
) -> f32 {
    let monospace = metrics.is_monospace();
    let hspace = metrics.advance(' ', style);
    let mut width = 0.0f32;
    let mut prev = '\0';
    for ch in text.chars() {
        let mut w = if monospace {
            hspace
        } else {
            metrics.advance(ch, style)
        };
        if ch == '\t' {
            w += hspace * tab_width as f32;
        } else if ch == '\r' {
            w = 0.0;
        }
        if !monospace && ch != '\r' {
            w += metrics.kerning(prev, ch, style);
            prev = ch;
        }
        width += w;
    }
    width
}

/// Width of the leading whitespace run of `text`.
pub fn compute_indent_width<M: FontMetrics + ?Sized>(
    text: &str,
    metrics: &M,
    style: StyleFlags,
    tab_width: u32,
) -> f32 {
    match text.find(|c| !INDENT_CHARS.contains(&c)) {
        Some(0) | None => 0.0,
        Some(byte_end) => text_width(&text[..byte_end], metrics, style, tab_width),
    }
}

/// Compute the wrap breakpoints for one line of text.
///
/// Walks chars left to right accumulating advance width. Monospace metrics
/// use a constant advance per glyph; proportional metrics add kerning
/// against the previous char, except after `\r`, which is zero-width and
/// excluded from kerning. Tabs contribute `space_advance * tab_width` on
/// top of their own advance.
///
/// When the accumulated width exceeds `max_width`: in `Word` mode with a
/// pending soft-break candidate the break lands after the candidate and the
/// width consumed since the candidate carries over (plus the indentation
/// padding); otherwise the break is a hard one at the current char. The
/// candidate resets after every break.
pub fn compute_line_breaks<M: FontMetrics + ?Sized>(
    text: &str,
    metrics: &M,
    style: StyleFlags,
    max_width: f32,
    mode: WrapMode,
    keep_indentation: bool,
    tab_width: u32,
) -> LineBreaks {
    let mut info = LineBreaks {
        offsets: vec![0],
        padding_start: 0.0,
    };
    if text.is_empty() || mode == WrapMode::NoWrap {
        return info;
    }

    if keep_indentation {
        info.padding_start = compute_indent_width(text, metrics, style, tab_width);
    }

    let monospace = metrics.is_monospace();
    let hspace = metrics.advance(' ', style);
    let mut xoffset = 0.0f32;
    let mut candidate_width = 0.0f32;
    // Char index of the last soft-break candidate; 0 doubles as "none",
    // since a break after index 0 never helps.
    let mut candidate = 0usize;
    let mut prev = '\0';

    for (idx, ch) in text.chars().enumerate() {
        let mut w = if monospace {
            hspace
        } else {
            metrics.advance(ch, style)
        };
        if ch == '\t' {
            w += hspace * tab_width as f32;
        } else if ch == '\r' {
            w = 0.0;
        }
        if !monospace && ch != '\r' {
            w += metrics.kerning(prev, ch, style);
            prev = ch;
        }

        xoffset += w;

        if xoffset > max_width {
            if mode == WrapMode::Word && candidate != 0 {
                info.offsets.push(candidate + 1);
                xoffset = w + info.padding_start + (xoffset - candidate_width);
            } else {
                info.offsets.push(idx);
                xoffset = w + info.padding_start;
            }
            candidate = 0;
        } else if is_soft_break(ch) {
            candidate = idx;
            candidate_width = xoffset;
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MonospaceMetrics;

    /// Proportional test font: 'i' is narrow, everything else 10px, and the
    /// pair "av" kerns by -2px.
    struct PropMetrics;

    impl FontMetrics for PropMetrics {
        fn advance(&self, ch: char, _style: StyleFlags) -> f32 {
            if ch == 'i' { 4.0 } else { 10.0 }
        }
        fn kerning(&self, prev: char, ch: char, _style: StyleFlags) -> f32 {
            if prev == 'a' && ch == 'v' { -2.0 } else { 0.0 }
        }
        fn is_monospace(&self) -> bool {
            false
        }
    }

    const M1: MonospaceMetrics = MonospaceMetrics { advance: 1.0 };
    const S: StyleFlags = StyleFlags::empty();

    fn offsets(text: &str, max: f32, mode: WrapMode) -> Vec<usize> {
        compute_line_breaks(text, &M1, S, max, mode, false, 4).offsets
    }

    #[test]
    fn empty_line_single_break() {
        let lb = compute_line_breaks("", &M1, S, 10.0, WrapMode::Word, true, 4);
        assert_eq!(lb.offsets, vec![0]);
        assert_eq!(lb.padding_start, 0.0);
    }

    #[test]
    fn nowrap_short_circuits() {
        let lb = compute_line_breaks("some long text here", &M1, S, 2.0, WrapMode::NoWrap, true, 4);
        assert_eq!(lb.offsets, vec![0]);
    }

    #[test]
    fn letter_mode_hard_breaks() {
        // Advance 1.0, max width 4: break at every 4th char.
        assert_eq!(offsets("abcdefghij", 4.0, WrapMode::Letter), vec![0, 4, 8]);
    }

    #[test]
    fn word_mode_breaks_after_space() {
        // "hello world" with max width 8: width exceeds at 'r' (idx 8);
        // candidate is the space at idx 5, so the break lands at idx 6.
        assert_eq!(offsets("hello world", 8.0, WrapMode::Word), vec![0, 6]);
    }

    #[test]
    fn word_mode_without_candidate_falls_back_to_letter() {
        assert_eq!(
            offsets("abcdefghij", 4.0, WrapMode::Word),
            offsets("abcdefghij", 4.0, WrapMode::Letter)
        );
    }

    #[test]
    fn candidate_resets_after_break() {
        // One space early on must not be reused for a second break.
        let got = offsets("ab cdefghijkl", 5.0, WrapMode::Word);
        assert_eq!(got[0], 0);
        assert_eq!(got[1], 3, "first break lands after the space");
        // Later breaks are hard breaks (no candidate since idx 3).
        for pair in got.windows(2) {
            assert!(pair[0] < pair[1], "offsets must strictly increase");
        }
    }

    #[test]
    fn tab_expands_by_tab_width() {
        // '\t' costs 1 + 4 = 5 at tab_width 4, so "\ta" exceeds width 5.
        assert_eq!(offsets("\tab", 5.0, WrapMode::Letter), vec![0, 1]);
    }

    #[test]
    fn carriage_return_is_zero_width() {
        let with_cr = offsets("ab\rcd", 4.0, WrapMode::Letter);
        let without = offsets("abcd", 4.0, WrapMode::Letter);
        assert_eq!(with_cr, vec![0]);
        assert_eq!(without, vec![0]);
    }

    #[test]
    fn keep_indentation_measures_leading_whitespace() {
        let lb = compute_line_breaks("    code", &M1, S, 100.0, WrapMode::Word, true, 4);
        assert_eq!(lb.padding_start, 4.0);
        let lb = compute_line_breaks("\tcode", &M1, S, 100.0, WrapMode::Word, true, 4);
        // Tab: own advance + 4 spaces.
        assert_eq!(lb.padding_start, 5.0);
    }

    #[test]
    fn all_whitespace_line_has_no_padding() {
        let lb = compute_line_breaks("    ", &M1, S, 100.0, WrapMode::Word, true, 4);
        assert_eq!(lb.padding_start, 0.0);
    }

    #[test]
    fn padding_carries_into_continuation_width() {
        // With keep_indentation, continuation lines start at the padding, so
        // breaks come sooner than without it.
        let with_pad = compute_line_breaks("  abcdefghij", &M1, S, 6.0, WrapMode::Letter, true, 4);
        let no_pad = compute_line_breaks("  abcdefghij", &M1, S, 6.0, WrapMode::Letter, false, 4);
        assert!(with_pad.offsets.len() >= no_pad.offsets.len());
    }

    #[test]
    fn proportional_metrics_apply_kerning() {
        // "av" = 10 + (10 - 2) = 18; break when exceeding 17.
        let lb = compute_line_breaks("av", &PropMetrics, S, 17.0, WrapMode::Letter, false, 4);
        assert_eq!(lb.offsets, vec![0, 1]);
        // Without the kerned pair the same budget fits two glyphs.
        let lb = compute_line_breaks("ab", &PropMetrics, S, 20.0, WrapMode::Letter, false, 4);
        assert_eq!(lb.offsets, vec![0]);
    }

    #[test]
    fn prefix_agrees_with_full_text() {
        // Wrap monotonicity: breaks of a prefix match the full text's breaks
        // restricted to the prefix.
        let full = offsets("the quick brown fox jumps over the lazy dog", 10.0, WrapMode::Word);
        let prefix_text = &"the quick brown fox jumps over the lazy dog"[..20];
        let prefix = offsets(prefix_text, 10.0, WrapMode::Word);
        let bounded: Vec<usize> = full.iter().copied().filter(|&o| o <= 20).collect();
        assert_eq!(prefix, bounded[..prefix.len()]);
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in [WrapMode::NoWrap, WrapMode::Letter, WrapMode::Word] {
            assert_eq!(WrapMode::from_name(mode.name()), mode);
        }
        assert_eq!(WrapMode::from_name("WORD"), WrapMode::Word);
        assert_eq!(WrapMode::from_name("bogus"), WrapMode::NoWrap);
    }
}
