use super::collapse::collapse_bytes;

/// Placeholder shown while a command has not printed anything yet.
pub const EMPTY_PLACEHOLDER: &str = "...";

/// Fixed text placed around every relayed piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrap {
    pub prefix: &'static str,
    pub postfix: &'static str,
}

impl Wrap {
    /// Preformatted (monospace) block in HTML parse mode.
    pub const fn pre() -> Self {
        Self {
            prefix: "<pre>",
            postfix: "</pre>",
        }
    }

    pub const fn none() -> Self {
        Self {
            prefix: "",
            postfix: "",
        }
    }

    /// Chars taken by the prefix and postfix together.
    pub fn overhead(&self) -> usize {
        self.prefix.chars().count() + self.postfix.chars().count()
    }

    /// Surround `body` with the prefix and postfix.
    ///
    /// When there is markup around the body it is HTML-escaped so command
    /// output cannot break the block.
    pub fn apply(&self, body: &str) -> String {
        if self.prefix.is_empty() && self.postfix.is_empty() {
            return body.to_string();
        }
        format!("{}{}{}", self.prefix, escape_html(body), self.postfix)
    }
}

/// Escape the three characters Telegram's HTML mode treats specially.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// The last `max_chars` chars of `text`.
pub fn keep_tail(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let skip = total - max_chars;
    match text.char_indices().nth(skip) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}

/// Render the in-place "live" message for the current output snapshot.
///
/// The body keeps the tail of the collapsed screen so that, together with
/// the wrap, it stays within `limit` chars.
pub fn live_preview(snapshot: &[u8], limit: usize, wrap: &Wrap) -> String {
    let collapsed = collapse_bytes(snapshot);
    let body = if collapsed.screen.is_empty() {
        EMPTY_PLACEHOLDER
    } else {
        collapsed.screen.as_str()
    };
    let budget = limit.saturating_sub(wrap.overhead());
    wrap.apply(keep_tail(body, budget))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_tail_returns_whole_text_when_it_fits() {
        assert_eq!(keep_tail("abc", 3), "abc");
        assert_eq!(keep_tail("abc", 10), "abc");
    }

    #[test]
    fn keep_tail_keeps_exactly_max_chars() {
        assert_eq!(keep_tail("abcdef", 4), "cdef");
        assert_eq!(keep_tail("abcdef", 1), "f");
        assert_eq!(keep_tail("abcdef", 0), "");
    }

    #[test]
    fn keep_tail_respects_char_boundaries() {
        assert_eq!(keep_tail("añbç", 2), "bç");
        assert_eq!(keep_tail("日本語", 2), "本語");
    }

    #[test]
    fn pre_wrap_escapes_markup() {
        assert_eq!(Wrap::pre().apply("a<b>&c"), "<pre>a&lt;b&gt;&amp;c</pre>");
        assert_eq!(Wrap::pre().overhead(), 11);
    }

    #[test]
    fn empty_wrap_leaves_text_alone() {
        assert_eq!(Wrap::none().apply("a<b"), "a<b");
        assert_eq!(Wrap::none().overhead(), 0);
    }

    #[test]
    fn preview_of_empty_output_uses_placeholder() {
        assert_eq!(live_preview(b"", 4000, &Wrap::pre()), "<pre>...</pre>");
    }

    #[test]
    fn preview_collapses_progress_output() {
        let out = live_preview(b"10%\r55%\r100%\n", 4000, &Wrap::pre());
        assert_eq!(out, "<pre>100%\n</pre>");
    }

    #[test]
    fn preview_respects_high_water_floor() {
        let collapsed = collapse_bytes(b"abc\rxy");
        let out = live_preview(b"abc\rxy", 4000, &Wrap::none());
        assert_eq!(out, "xyc");
        assert!(out.chars().count() >= collapsed.len());
    }

    #[test]
    fn preview_shows_partially_redrawn_progress() {
        let out = live_preview(b"building 100%\rok", 4000, &Wrap::pre());
        assert_eq!(out, "<pre>okilding 100%</pre>");
    }

    #[test]
    fn preview_keeps_the_tail_within_limit() {
        let snapshot = format!("{}END", "x".repeat(5000));
        let out = live_preview(snapshot.as_bytes(), 100, &Wrap::pre());
        let body = out
            .strip_prefix("<pre>")
            .and_then(|s| s.strip_suffix("</pre>"))
            .unwrap();
        assert_eq!(body.chars().count(), 89);
        assert!(body.ends_with("END"));
        assert_eq!(out.chars().count(), 100);
    }
}
