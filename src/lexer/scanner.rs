//! External scanner capability
//!
//! Some tokens cannot be described by a regular expression (raw strings with
//! a variable number of delimiters, heredocs, indentation). A language can
//! carry an [`ExternalScanner`] that the lexer consults before its own
//! tables, whenever at least one external token is valid in the current
//! parse state.

/// Recognises a grammar's external tokens.
///
/// Scanners are shared between threads and must not keep state between
/// calls; everything they decide has to follow from the input alone so that
/// incremental reparses see the same tokens as full parses.
pub trait ExternalScanner: Send + Sync {
    /// Try to scan one token at the input position.
    ///
    /// `valid[i]` tells whether the i-th external token (in the order given
    /// to [`GrammarBuilder::externals`](crate::grammar::GrammarBuilder::externals))
    /// is acceptable here. Return the index of the recognised token, after
    /// calling [`ScanInput::mark_end`] or leaving the cursor where the token
    /// ends. Zero-width results are ignored.
    fn scan(&self, input: &mut ScanInput<'_>, valid: &[bool]) -> Option<u16>;
}

/// A read cursor over the source handed to an [`ExternalScanner`].
#[derive(Debug)]
pub struct ScanInput<'a> {
    source: &'a [u8],
    start: usize,
    position: usize,
    marked_end: Option<usize>,
    examined: usize,
}

impl<'a> ScanInput<'a> {
    pub(crate) fn new(source: &'a [u8], start: usize) -> Self {
        Self {
            source,
            start,
            position: start,
            marked_end: None,
            examined: start,
        }
    }

    /// The character under the cursor, or `None` at end of input.
    /// Invalid UTF-8 reads as U+FFFD.
    pub fn lookahead(&mut self) -> Option<char> {
        match decode_char(self.source, self.position) {
            Some((c, len)) => {
                self.examined = self.examined.max(self.position + len);
                Some(c)
            }
            None => {
                self.examined = self.source.len() + 1;
                None
            }
        }
    }

    /// Move past the current character.
    pub fn advance(&mut self) {
        if let Some((_, len)) = decode_char(self.source, self.position) {
            self.position += len;
            self.examined = self.examined.max(self.position);
        }
    }

    /// Fix the token's end at the current position. Later `advance` calls
    /// only look ahead.
    pub fn mark_end(&mut self) {
        self.marked_end = Some(self.position);
    }

    pub fn eof(&mut self) -> bool {
        self.lookahead().is_none()
    }

    /// Absolute byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Absolute byte offset where scanning started.
    pub fn start(&self) -> usize {
        self.start
    }

    pub(crate) fn token_end(&self) -> usize {
        self.marked_end.unwrap_or(self.position)
    }

    pub(crate) fn examined(&self) -> usize {
        self.examined
    }
}

/// Decode the character at `pos` leniently: invalid sequences count as a
/// single replacement character one byte wide.
pub(crate) fn decode_char(source: &[u8], pos: usize) -> Option<(char, usize)> {
    let first = *source.get(pos)?;
    let width = match first {
        0x00..=0x7F => return Some((first as char, 1)),
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Some((char::REPLACEMENT_CHARACTER, 1)),
    };
    let bytes = source.get(pos..pos + width);
    match bytes.and_then(|b| std::str::from_utf8(b).ok()) {
        Some(text) => text.chars().next().map(|c| (c, width)),
        None => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii_and_multibyte() {
        let source = "aé€😀".as_bytes();
        assert_eq!(decode_char(source, 0), Some(('a', 1)));
        assert_eq!(decode_char(source, 1), Some(('é', 2)));
        assert_eq!(decode_char(source, 3), Some(('€', 3)));
        assert_eq!(decode_char(source, 6), Some(('😀', 4)));
        assert_eq!(decode_char(source, 10), None);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert_eq!(decode_char(&[0xFF, b'a'], 0), Some((char::REPLACEMENT_CHARACTER, 1)));
        // truncated two-byte sequence
        assert_eq!(decode_char(&[0xC3], 0), Some((char::REPLACEMENT_CHARACTER, 1)));
    }

    #[test]
    fn test_scan_input_tracks_examined_extent() {
        let mut input = ScanInput::new(b"r#\"x\"#", 0);
        assert_eq!(input.lookahead(), Some('r'));
        input.advance();
        input.advance();
        input.mark_end();
        assert_eq!(input.lookahead(), Some('"'));
        assert_eq!(input.token_end(), 2);
        assert_eq!(input.examined(), 3);
    }

    #[test]
    fn test_scan_input_eof_counts_past_buffer() {
        let mut input = ScanInput::new(b"ab", 2);
        assert!(input.eof());
        assert_eq!(input.examined(), 3);
    }
}
