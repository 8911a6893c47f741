//! Character level phases of compilation
//!
//! GLSL ES 3.20 section 3.10 "Logical Phases of Compilation" lists the
//! transformations applied before tokenization. Phases 1 to 3 (character set
//! and UTF-8 handling) are assumed done; the iterators here stack up phases
//! 4 to 7:
//!
//! ```text
//! &str → CharsAndLocation → SkipBackslashNewline → ReplaceComments → Lexer
//! ```
//!
//! All of them are `Copy` so the lexer can snapshot a position and rewind
//! to it cheaply.

use crate::token::Location;

/// A character with the location it was read at.
pub type CharAndLocation = (char, Location);

/// Whitespace stand-in for a comment.
///
/// Every `\r` has been turned into `\n` by [`CharsAndLocation`], so the lexer
/// can use it to tell comments apart from ordinary whitespace.
pub const COMMENT_SENTINEL_VALUE: char = '\r';

/// Phases 4 and 5: newline normalization and line numbering.
///
/// `\r\n`, `\n\r` and lone `\r` or `\n` all become a single `'\n'`, and each
/// character is tagged with its line (preceding newlines plus one) and column.
#[derive(Clone, Copy, Debug)]
pub struct CharsAndLocation<'a> {
    input: &'a str,
    loc: Location,
}

impl<'a> CharsAndLocation<'a> {
    /// Start iterating at line 1, column 0.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            loc: Location { line: 1, pos: 0 },
        }
    }
}

impl<'a> Iterator for CharsAndLocation<'a> {
    type Item = CharAndLocation;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chars = self.input.chars();
        let current = chars.next()?;
        let current_loc = self.loc;
        self.input = chars.as_str();

        let partner = match current {
            '\n' => '\r',
            '\r' => '\n',
            _ => {
                self.loc.pos += 1;
                return Some((current, current_loc));
            }
        };

        // A newline pair collapses into one newline
        if chars.next() == Some(partner) {
            self.input = chars.as_str();
        }

        self.loc.line += 1;
        self.loc.pos = 0;
        Some(('\n', current_loc))
    }
}

/// Phase 6: line continuation.
///
/// A backslash directly followed by a newline is removed together with the
/// newline, so a token can span lines.
#[derive(Clone, Copy, Debug)]
pub struct SkipBackslashNewline<'a> {
    inner: CharsAndLocation<'a>,
}

impl<'a> SkipBackslashNewline<'a> {
    /// Wrap the phase 4/5 iterator over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: CharsAndLocation::new(input),
        }
    }
}

impl<'a> Iterator for SkipBackslashNewline<'a> {
    type Item = CharAndLocation;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.inner.next()?;
            if current.0 != '\\' {
                return Some(current);
            }

            let mut lookahead = self.inner;
            match lookahead.next() {
                Some(('\n', _)) => self.inner = lookahead,
                _ => return Some(current),
            }
        }
    }
}

/// Phase 7: comment removal.
///
/// `//` comments run up to (not including) the newline, `/* */` comments
/// include both markers. Each is replaced by a single
/// [`COMMENT_SENTINEL_VALUE`] located at its opening `/`.
#[derive(Clone, Copy, Debug)]
pub struct ReplaceComments<'a> {
    inner: SkipBackslashNewline<'a>,
}

impl<'a> ReplaceComments<'a> {
    /// Wrap the phase 6 iterator over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: SkipBackslashNewline::new(input),
        }
    }

    fn skip_line_comment(&mut self) {
        let mut save_point = self.inner;
        while let Some((next, _)) = self.inner.next() {
            if next == '\n' {
                break;
            }
            save_point = self.inner;
        }
        // Leave the newline for the lexer
        self.inner = save_point;
    }

    fn skip_block_comment(&mut self) {
        let mut was_star = false;
        for (next, _) in self.inner.by_ref() {
            if was_star && next == '/' {
                return;
            }
            was_star = next == '*';
        }
    }
}

impl<'a> Iterator for ReplaceComments<'a> {
    type Item = CharAndLocation;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.inner.next()?;
        debug_assert_ne!(current.0, COMMENT_SENTINEL_VALUE);

        if current.0 != '/' {
            return Some(current);
        }

        let mut lookahead = self.inner;
        match lookahead.next() {
            Some(('/', _)) => {
                self.inner = lookahead;
                self.skip_line_comment();
                Some((COMMENT_SENTINEL_VALUE, current.1))
            }
            Some(('*', _)) => {
                self.inner = lookahead;
                self.skip_block_comment();
                Some((COMMENT_SENTINEL_VALUE, current.1))
            }
            _ => Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars<I: Iterator<Item = CharAndLocation>>(iter: I) -> String {
        iter.map(|(c, _)| c).collect()
    }

    #[test]
    fn test_newline_pairs_collapse() {
        assert_eq!(chars(CharsAndLocation::new("a\r\nb\n\rc\rd\ne")), "a\nb\nc\nd\ne");
    }

    #[test]
    fn test_double_newline_is_not_a_pair() {
        assert_eq!(chars(CharsAndLocation::new("a\n\nb")), "a\n\nb");
    }

    #[test]
    fn test_locations() {
        let locs: Vec<_> = CharsAndLocation::new("ab\r\nc").collect();
        assert_eq!(
            locs,
            vec![
                ('a', Location::new(1, 0)),
                ('b', Location::new(1, 1)),
                ('\n', Location::new(1, 2)),
                ('c', Location::new(2, 0)),
            ]
        );
    }

    #[test]
    fn test_backslash_newline_removed() {
        assert_eq!(chars(SkipBackslashNewline::new("ab\\\ncd")), "abcd");
        assert_eq!(chars(SkipBackslashNewline::new("a\\\r\n\\\nb")), "ab");
    }

    #[test]
    fn test_lone_backslash_kept() {
        assert_eq!(chars(SkipBackslashNewline::new("a\\b\\")), "a\\b\\");
    }

    #[test]
    fn test_backslash_newline_keeps_line_numbers() {
        let locs: Vec<_> = SkipBackslashNewline::new("a\\\nb").collect();
        assert_eq!(locs[1], ('b', Location::new(2, 0)));
    }

    #[test]
    fn test_line_comment_replaced() {
        assert_eq!(chars(ReplaceComments::new("a // b\nc")), "a \r\nc");
    }

    #[test]
    fn test_block_comment_replaced() {
        assert_eq!(chars(ReplaceComments::new("a/* b\n * c */d")), "a\rd");
    }

    #[test]
    fn test_unterminated_block_comment_eats_input() {
        assert_eq!(chars(ReplaceComments::new("a /* b")), "a \r");
    }

    #[test]
    fn test_slash_is_not_a_comment() {
        assert_eq!(chars(ReplaceComments::new("a / b /")), "a / b /");
    }

    #[test]
    fn test_line_comment_continued_by_backslash() {
        assert_eq!(chars(ReplaceComments::new("// a \\\n b\nc")), "\r\nc");
    }

    #[test]
    fn test_comment_sentinel_location() {
        let locs: Vec<_> = ReplaceComments::new("x /**/").collect();
        assert_eq!(locs[2], (COMMENT_SENTINEL_VALUE, Location::new(1, 2)));
    }
}
