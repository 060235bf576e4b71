//! Backspace / carriage-return collapsing.
//!
//! Turns raw process output into the text a terminal would leave on screen.
//! Only `\b` and `\r` are interpreted; every other character, including ANSI
//! escape bytes, is kept as-is.

use std::borrow::Cow;

/// Result of collapsing a stream of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collapsed {
    /// Visible text after all control characters were applied.
    pub text: String,
    /// Largest visible length (in chars) observed right before a carriage
    /// return erased anything.
    pub high_water: usize,
    /// What a terminal leaves on screen: `text` plus any overwritten chars
    /// that a shorter redraw did not cover, up to the high-water mark.
    pub screen: String,
}

impl Collapsed {
    /// Reported length: the high-water mark or the final text, whichever is
    /// longer. Always equal to the char count of `screen`.
    pub fn len(&self) -> usize {
        self.high_water.max(self.text.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collapse a raw byte snapshot.
///
/// A snapshot can end in the middle of a UTF-8 sequence, so decoding is lossy.
pub fn collapse_bytes(bytes: &[u8]) -> Collapsed {
    let text: Cow<'_, str> = String::from_utf8_lossy(bytes);
    collapse(&text)
}

/// Interpret `\b` and `\r` over a visible buffer.
///
/// - `\b` erases the previous visible char (no-op on empty output).
/// - `\r` erases back to just after the most recent `\n`, or everything
///   when there is no `\n` yet. `\r\n` is a plain line ending.
///
/// Erased chars are kept behind the visible end and overwritten by later
/// output; `screen` shows them up to the high-water mark, the way a shorter
/// redraw leaves the end of a longer line visible.
pub fn collapse(input: &str) -> Collapsed {
    let mut buffer: Vec<char> = Vec::with_capacity(input.len());
    let mut visible = 0usize;
    let mut high_water = 0usize;

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\u{8}' => visible = visible.saturating_sub(1),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' => {
                high_water = high_water.max(visible);
                visible = buffer[..visible]
                    .iter()
                    .rposition(|&c| c == '\n')
                    .map_or(0, |idx| idx + 1);
            }
            other => {
                if visible < buffer.len() {
                    buffer[visible] = other;
                } else {
                    buffer.push(other);
                }
                visible += 1;
            }
        }
    }

    // The buffer never shrinks, so it is at least high_water long.
    let shown = visible.max(high_water);
    Collapsed {
        text: buffer[..visible].iter().collect(),
        high_water,
        screen: buffer[..shown].iter().collect(),
    }
}
