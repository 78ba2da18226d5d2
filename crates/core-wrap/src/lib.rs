//! Line wrapping and code folding for the editor view layer.
//!
//! Maps a document's logical lines onto the sequence of visual (on-screen)
//! lines under a wrap policy and keeps that mapping correct and cheap as the
//! document is edited or regions are folded. Three index spaces stay in
//! step: document lines, wrapped visual lines, and folded visual lines.
//!
//! Components, leaf-first:
//! * [`metrics`] — font measurement interface (external adapter boundary).
//! * [`calculator`] — pure line-break computation.
//! * [`map`] — the stateful wrap map with incremental edit patching.
//! * [`fold`] — fold regions and visibility, layered on the wrap map.
//!
//! Everything here is single-threaded and synchronous; a map instance must
//! be confined to the thread that owns its view.

pub mod calculator;
pub mod fold;
pub mod map;
pub mod metrics;

pub use calculator::{LineBreaks, WrapMode, compute_indent_width, compute_line_breaks};
pub use map::{VisualLine, VisualLineInfo, WrapBreak, WrapConfig, WrapMap};
pub use metrics::{FontMetrics, MonospaceMetrics, StyleFlags};
