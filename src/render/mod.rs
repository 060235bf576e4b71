//! Text rendering for relayed process output.
//!
//! Collapsing terminal control characters, splitting long output into
//! channel-sized pieces and building the live preview message.

mod chunk;
mod collapse;
mod preview;

pub use chunk::{split_by_lines, ChunkError};
pub use collapse::{collapse, collapse_bytes, Collapsed};
pub use preview::{escape_html, keep_tail, live_preview, Wrap, EMPTY_PLACEHOLDER};
