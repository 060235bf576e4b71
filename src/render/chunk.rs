use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Chunk limit must be at least one character")]
    ZeroLimit,
}

/// Split `input` into pieces of at most `limit` chars, cutting on line
/// boundaries where possible.
///
/// Text that already fits comes back as a single trimmed piece, even when
/// that piece is empty. Longer text is cut after the last `\n` inside each
/// `limit`-sized window, or hard-cut at `limit` when the window has no
/// newline. Every piece is trimmed and empty pieces are dropped.
pub fn split_by_lines(input: &str, limit: usize) -> Result<Vec<String>, ChunkError> {
    if limit == 0 {
        return Err(ChunkError::ZeroLimit);
    }

    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= limit {
        return Ok(vec![input.trim().to_string()]);
    }

    let mut raw: Vec<&[char]> = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let remaining = chars.len() - start;
        if remaining <= limit {
            raw.push(&chars[start..]);
            break;
        }

        let window = &chars[start..start + limit];
        let end = match window.iter().rposition(|&c| c == '\n') {
            Some(newline) => start + newline + 1,
            None => start + limit,
        };
        raw.push(&chars[start..end]);
        start = end;
    }

    Ok(raw
        .into_iter()
        .map(|piece| piece.iter().collect::<String>())
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect())
}
