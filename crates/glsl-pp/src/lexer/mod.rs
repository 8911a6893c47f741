//! Preprocessing token lexer
//!
//! The lexer produces GLSL tokens plus the two extra tokens the preprocessor
//! needs to find directives: `#` and newlines. Each token also records
//! whether it had whitespace before it and whether it starts a line.
//!
//! # Example
//!
//! ```
//! use glsl_pp::lexer::{Lexer, TokenValue};
//!
//! let values: Vec<_> = Lexer::new("#define X 1")
//!     .map(|token| token.unwrap().value)
//!     .collect();
//! assert_eq!(values[0], TokenValue::Hash);
//! assert_eq!(values[1], TokenValue::Ident("define".to_string()));
//! assert_eq!(values.last(), Some(&TokenValue::NewLine));
//! ```

mod chars;

pub use chars::{
    CharAndLocation, CharsAndLocation, ReplaceComments, SkipBackslashNewline,
    COMMENT_SENTINEL_VALUE,
};

use std::fmt;
use std::iter::Peekable;

use crate::error::{LocatedError, PreprocessorError};
use crate::token::{self, Float, Integer, Location, Punct};

/// Values the lexer produces: a superset of the preprocessed token values.
#[derive(Clone, PartialEq, Debug)]
pub enum TokenValue {
    /// `#`
    Hash,
    /// End of a line
    NewLine,

    /// An identifier or keyword
    Ident(String),
    /// An integer literal
    Integer(Integer),
    /// A float literal
    Float(Float),
    /// A punctuator
    Punct(Punct),
}

impl From<Punct> for TokenValue {
    fn from(punct: Punct) -> Self {
        TokenValue::Punct(punct)
    }
}

impl TokenValue {
    /// Convert into a preprocessed token value.
    ///
    /// Fails for `#` and newlines, which never survive preprocessing.
    pub fn into_token_value(self) -> Result<token::TokenValue, PreprocessorError> {
        match self {
            TokenValue::Ident(name) => Ok(token::TokenValue::Ident(name)),
            TokenValue::Integer(integer) => Ok(token::TokenValue::Integer(integer)),
            TokenValue::Float(float) => Ok(token::TokenValue::Float(float)),
            TokenValue::Punct(punct) => Ok(token::TokenValue::Punct(punct)),
            TokenValue::Hash => Err(PreprocessorError::UnexpectedHash),
            TokenValue::NewLine => Err(PreprocessorError::UnexpectedNewLine),
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Hash => f.write_str("#"),
            TokenValue::NewLine => f.write_str("\n"),
            TokenValue::Ident(name) => f.write_str(name),
            TokenValue::Integer(integer) => integer.fmt(f),
            TokenValue::Float(float) => float.fmt(f),
            TokenValue::Punct(punct) => punct.fmt(f),
        }
    }
}

/// A token with the layout information the preprocessor cares about.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    /// What the token is
    pub value: TokenValue,
    /// Where the token starts
    pub location: Location,
    /// Whether whitespace or a comment came right before the token
    pub leading_whitespace: bool,
    /// Whether the token is the first on its line
    pub start_of_line: bool,
}

/// One item produced by the lexer.
pub type LexerItem = Result<Token, LocatedError>;

/// Lexer over GLSL source text.
pub struct Lexer<'a> {
    inner: Peekable<ReplaceComments<'a>>,
    leading_whitespace: bool,
    start_of_line: bool,
    last_location: Location,
    had_comments: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: ReplaceComments::new(input).peekable(),
            leading_whitespace: true,
            start_of_line: true,
            last_location: Location { line: 0, pos: 0 },
            had_comments: false,
        }
    }

    /// Whether a comment has been skipped so far.
    pub fn had_comments(&self) -> bool {
        self.had_comments
    }

    fn peek_char(&mut self) -> Option<char> {
        self.inner.peek().map(|&(c, _)| c)
    }

    fn consume_chars(&mut self, filter: impl Fn(char) -> bool) -> String {
        let mut result = String::new();

        while let Some(current) = self.peek_char() {
            if !filter(current) {
                break;
            }
            self.inner.next();
            result.push(current);
        }

        result
    }

    fn parse_identifier(&mut self) -> TokenValue {
        TokenValue::Ident(self.consume_chars(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    fn parse_integer_signedness_suffix(&mut self) -> bool {
        match self.peek_char() {
            Some('u' | 'U') => {
                self.inner.next();
                false
            }
            _ => true,
        }
    }

    fn parse_integer_width_suffix(&mut self) -> Result<i32, PreprocessorError> {
        match self.peek_char() {
            Some('l' | 'L') => Err(PreprocessorError::NotSupported64BitLiteral),
            Some('s' | 'S') => Err(PreprocessorError::NotSupported16BitLiteral),
            _ => Ok(32),
        }
    }

    fn parse_float_width_suffix(&mut self) -> Result<i32, PreprocessorError> {
        match self.peek_char() {
            Some('l' | 'L') => Err(PreprocessorError::NotSupported64BitLiteral),
            Some('h' | 'H') => Err(PreprocessorError::NotSupported16BitLiteral),
            Some('f' | 'F') => {
                self.inner.next();
                match self.peek_char() {
                    // `lf` is the double suffix, `fl` is not a suffix at all
                    Some('l' | 'L') => Err(PreprocessorError::NotSupported64BitLiteral),
                    _ => Ok(32),
                }
            }
            _ => Ok(32),
        }
    }

    /// Parse a number whose first character has already been consumed.
    fn parse_number(&mut self, first_char: char) -> Result<TokenValue, PreprocessorError> {
        let mut is_float = first_char == '.';
        let mut radix = 10;
        let mut raw = String::new();
        raw.push(first_char);

        if first_char == '0' {
            match self.peek_char() {
                Some('x' | 'X') => {
                    self.inner.next();
                    raw += &self.consume_chars(|c| c.is_ascii_hexdigit());
                    radix = 16;
                }
                // Could still turn out to be a float like 00009.0, so the
                // digits are consumed below and only the radix is noted.
                Some('0'..='9') => radix = 8,
                _ => {}
            }
        }

        if radix != 16 {
            if !is_float {
                raw += &self.consume_chars(|c| c.is_ascii_digit());
                if self.peek_char() == Some('.') {
                    self.inner.next();
                    raw.push('.');
                    is_float = true;
                }
            }

            if is_float {
                raw += &self.consume_chars(|c| c.is_ascii_digit());
            }

            if let Some('e' | 'E') = self.peek_char() {
                self.inner.next();
                raw.push('e');
                if let Some(sign @ ('+' | '-')) = self.peek_char() {
                    self.inner.next();
                    raw.push(sign);
                }
                raw += &self.consume_chars(|c| c.is_ascii_digit());
                is_float = true;
            }
        }

        if is_float {
            let width = self.parse_float_width_suffix()?;
            let value = raw
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or(PreprocessorError::FloatParsingError)?;
            return Ok(TokenValue::Float(Float { value, width }));
        }

        let signed = self.parse_integer_signedness_suffix();
        let width = self.parse_integer_width_suffix()?;

        // Drop the leading 0 of hexadecimal and octal literals ('x' was never added)
        let digits = if radix == 10 { &raw[..] } else { &raw[1..] };
        let value =
            u64::from_str_radix(digits, radix).map_err(|_| PreprocessorError::IntegerOverflow)?;

        Ok(TokenValue::Integer(Integer {
            value,
            signed,
            width,
        }))
    }

    fn parse_punctuation(&mut self) -> Result<TokenValue, PreprocessorError> {
        let mut lookahead = self.inner.clone();
        let mut next_char = || lookahead.next().map(|(c, _)| c).unwrap_or('\0');
        let chars = (next_char(), next_char(), next_char());

        let (value, size) = match chars {
            ('<', '<', '=') => (Punct::LeftShiftAssign.into(), 3),
            ('<', '<', _) => (Punct::LeftShift.into(), 2),
            ('<', '=', _) => (Punct::LessEqual.into(), 2),
            ('<', _, _) => (Punct::LeftAngle.into(), 1),

            ('>', '>', '=') => (Punct::RightShiftAssign.into(), 3),
            ('>', '>', _) => (Punct::RightShift.into(), 2),
            ('>', '=', _) => (Punct::GreaterEqual.into(), 2),
            ('>', _, _) => (Punct::RightAngle.into(), 1),

            ('+', '+', _) => (Punct::Increment.into(), 2),
            ('+', '=', _) => (Punct::AddAssign.into(), 2),
            ('+', _, _) => (Punct::Plus.into(), 1),

            ('-', '-', _) => (Punct::Decrement.into(), 2),
            ('-', '=', _) => (Punct::SubAssign.into(), 2),
            ('-', _, _) => (Punct::Minus.into(), 1),

            ('&', '&', _) => (Punct::LogicalAnd.into(), 2),
            ('&', '=', _) => (Punct::AndAssign.into(), 2),
            ('&', _, _) => (Punct::Ampersand.into(), 1),

            ('|', '|', _) => (Punct::LogicalOr.into(), 2),
            ('|', '=', _) => (Punct::OrAssign.into(), 2),
            ('|', _, _) => (Punct::Pipe.into(), 1),

            ('^', '^', _) => (Punct::LogicalXor.into(), 2),
            ('^', '=', _) => (Punct::XorAssign.into(), 2),
            ('^', _, _) => (Punct::Caret.into(), 1),

            ('=', '=', _) => (Punct::EqualEqual.into(), 2),
            ('=', _, _) => (Punct::Equal.into(), 1),
            ('!', '=', _) => (Punct::NotEqual.into(), 2),
            ('!', _, _) => (Punct::Bang.into(), 1),

            ('*', '=', _) => (Punct::MulAssign.into(), 2),
            ('*', _, _) => (Punct::Star.into(), 1),
            ('/', '=', _) => (Punct::DivAssign.into(), 2),
            ('/', _, _) => (Punct::Slash.into(), 1),
            ('%', '=', _) => (Punct::ModAssign.into(), 2),
            ('%', _, _) => (Punct::Percent.into(), 1),

            ('(', _, _) => (Punct::LeftParen.into(), 1),
            (')', _, _) => (Punct::RightParen.into(), 1),
            ('{', _, _) => (Punct::LeftBrace.into(), 1),
            ('}', _, _) => (Punct::RightBrace.into(), 1),
            ('[', _, _) => (Punct::LeftBracket.into(), 1),
            (']', _, _) => (Punct::RightBracket.into(), 1),

            ('.', _, _) => (Punct::Dot.into(), 1),
            (',', _, _) => (Punct::Comma.into(), 1),
            (';', _, _) => (Punct::Semicolon.into(), 1),
            (':', _, _) => (Punct::Colon.into(), 1),
            ('~', _, _) => (Punct::Tilde.into(), 1),
            ('?', _, _) => (Punct::Question.into(), 1),

            ('#', _, _) => (TokenValue::Hash, 1),

            _ => {
                // Skip the character so lexing can resume after the error
                self.inner.next();
                return Err(PreprocessorError::UnexpectedCharacter);
            }
        };

        for _ in 0..size {
            self.inner.next();
        }
        Ok(value)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexerItem;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(current_char, current_loc)) = self.inner.peek() {
            let had_leading_whitespace = self.leading_whitespace;
            self.leading_whitespace = false;

            let was_start_of_line = self.start_of_line;
            self.start_of_line = false;

            let value = match current_char {
                ' ' | '\t' | '\x0b' | '\x0c' | COMMENT_SENTINEL_VALUE => {
                    if current_char == COMMENT_SENTINEL_VALUE {
                        self.had_comments = true;
                    }
                    self.start_of_line = was_start_of_line;
                    self.leading_whitespace = true;
                    self.inner.next();
                    continue;
                }
                '\n' => {
                    self.leading_whitespace = true;
                    self.start_of_line = true;
                    self.inner.next();
                    Ok(TokenValue::NewLine)
                }

                'a'..='z' | 'A'..='Z' | '_' => Ok(self.parse_identifier()),
                c @ '0'..='9' => {
                    self.inner.next();
                    self.parse_number(c)
                }

                // A dot may start a float such as .5
                '.' => {
                    self.inner.next();
                    match self.peek_char() {
                        Some('0'..='9') => self.parse_number('.'),
                        _ => Ok(Punct::Dot.into()),
                    }
                }

                _ => self.parse_punctuation(),
            };

            self.last_location = current_loc;

            return Some(
                value
                    .map(|value| Token {
                        value,
                        location: current_loc,
                        leading_whitespace: had_leading_whitespace,
                        start_of_line: was_start_of_line,
                    })
                    .map_err(|error| LocatedError::new(error, current_loc)),
            );
        }

        // Always end with a newline so the last directive is terminated
        if self.start_of_line {
            return None;
        }

        self.start_of_line = true;
        self.last_location.pos += 1;
        Some(Ok(Token {
            value: TokenValue::NewLine,
            location: self.last_location,
            leading_whitespace: self.leading_whitespace,
            start_of_line: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(input: &str) -> Vec<TokenValue> {
        Lexer::new(input)
            .map(|item| item.map(|token| token.value))
            .collect::<Result<_, _>>()
            .expect("lexing failed")
    }

    fn lex_error(input: &str) -> PreprocessorError {
        Lexer::new(input)
            .find_map(|item| item.err())
            .expect("expected a lexer error")
            .error
    }

    fn int(value: u64) -> TokenValue {
        TokenValue::Integer(Integer {
            value,
            signed: true,
            width: 32,
        })
    }

    fn float(value: f32) -> TokenValue {
        TokenValue::Float(Float { value, width: 32 })
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex(""), vec![]);
        assert_eq!(lex("   \t "), vec![]);
    }

    #[test]
    fn test_identifier() {
        assert_eq!(
            lex("foo _bar2"),
            vec![
                TokenValue::Ident("foo".into()),
                TokenValue::Ident("_bar2".into()),
                TokenValue::NewLine,
            ]
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(lex("0")[0], int(0));
        assert_eq!(lex("42")[0], int(42));
        assert_eq!(lex("0x1F")[0], int(31));
        assert_eq!(lex("0XfF")[0], int(255));
        assert_eq!(lex("017")[0], int(15));
        assert_eq!(
            lex("7u")[0],
            TokenValue::Integer(Integer {
                value: 7,
                signed: false,
                width: 32,
            })
        );
    }

    #[test]
    fn test_integer_errors() {
        assert_eq!(lex_error("99999999999999999999"), PreprocessorError::IntegerOverflow);
        assert_eq!(lex_error("09"), PreprocessorError::IntegerOverflow);
        assert_eq!(lex_error("1l"), PreprocessorError::NotSupported64BitLiteral);
        assert_eq!(lex_error("1us"), PreprocessorError::NotSupported16BitLiteral);
    }

    #[test]
    fn test_floats() {
        assert_eq!(lex("1.0")[0], float(1.0));
        assert_eq!(lex("1.")[0], float(1.0));
        assert_eq!(lex(".5")[0], float(0.5));
        assert_eq!(lex("2.5f")[0], float(2.5));
        assert_eq!(lex("00009.0")[0], float(9.0));
    }

    #[test]
    fn test_float_exponents() {
        assert_eq!(lex("1e3")[0], float(1000.0));
        assert_eq!(lex("1.5E-1")[0], float(0.15));
        assert_eq!(lex(".5e+1")[0], float(5.0));
        assert_eq!(lex("2e2F")[0], float(200.0));
    }

    #[test]
    fn test_float_errors() {
        assert_eq!(lex_error("1e"), PreprocessorError::FloatParsingError);
        assert_eq!(lex_error("1.0lf"), PreprocessorError::NotSupported64BitLiteral);
        assert_eq!(lex_error("1.0fl"), PreprocessorError::NotSupported64BitLiteral);
        assert_eq!(lex_error("1.0h"), PreprocessorError::NotSupported16BitLiteral);
    }

    #[test]
    fn test_dot_is_punctuation() {
        assert_eq!(
            lex("a.b"),
            vec![
                TokenValue::Ident("a".into()),
                Punct::Dot.into(),
                TokenValue::Ident("b".into()),
                TokenValue::NewLine,
            ]
        );
    }

    #[test]
    fn test_maximal_munch() {
        assert_eq!(
            lex("<<= << <= < >>=+++"),
            vec![
                Punct::LeftShiftAssign.into(),
                Punct::LeftShift.into(),
                Punct::LessEqual.into(),
                Punct::LeftAngle.into(),
                Punct::RightShiftAssign.into(),
                Punct::Increment.into(),
                Punct::Plus.into(),
                TokenValue::NewLine,
            ]
        );
    }

    #[test]
    fn test_all_single_punctuation() {
        assert_eq!(
            lex("(){}[];,:~?"),
            vec![
                Punct::LeftParen.into(),
                Punct::RightParen.into(),
                Punct::LeftBrace.into(),
                Punct::RightBrace.into(),
                Punct::LeftBracket.into(),
                Punct::RightBracket.into(),
                Punct::Semicolon.into(),
                Punct::Comma.into(),
                Punct::Colon.into(),
                Punct::Tilde.into(),
                Punct::Question.into(),
                TokenValue::NewLine,
            ]
        );
    }

    #[test]
    fn test_hash_and_unexpected_character() {
        assert_eq!(lex("#")[0], TokenValue::Hash);
        assert_eq!(lex_error("$"), PreprocessorError::UnexpectedCharacter);
        assert_eq!(lex_error("a @"), PreprocessorError::UnexpectedCharacter);
    }

    #[test]
    fn test_start_of_line_and_whitespace_flags() {
        let tokens: Vec<_> = Lexer::new("a b\n  #c").map(|t| t.unwrap()).collect();

        assert!(tokens[0].start_of_line);
        assert!(tokens[0].leading_whitespace);
        assert!(!tokens[1].start_of_line);
        assert!(tokens[1].leading_whitespace);
        assert_eq!(tokens[2].value, TokenValue::NewLine);
        assert!(tokens[3].start_of_line);
        assert!(tokens[3].leading_whitespace);
        assert_eq!(tokens[3].value, TokenValue::Hash);
        assert!(!tokens[4].start_of_line);
        assert!(!tokens[4].leading_whitespace);
    }

    #[test]
    fn test_comment_counts_as_whitespace() {
        let tokens: Vec<_> = Lexer::new("a/**/b").map(|t| t.unwrap()).collect();
        assert!(tokens[1].leading_whitespace);
    }

    #[test]
    fn test_had_comments() {
        let mut lexer = Lexer::new("a // hi\nb");
        assert!(!lexer.had_comments());
        lexer.next();
        lexer.next();
        assert!(lexer.had_comments());
    }

    #[test]
    fn test_trailing_newline_added_once() {
        assert_eq!(lex("a\n"), vec![TokenValue::Ident("a".into()), TokenValue::NewLine]);

        let tokens: Vec<_> = Lexer::new("ab").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[1].value, TokenValue::NewLine);
        assert_eq!(tokens[1].location, Location::new(1, 1));
    }

    #[test]
    fn test_locations() {
        let tokens: Vec<_> = Lexer::new("a\n  bc = 1;").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].location, Location::new(1, 0));
        assert_eq!(tokens[2].location, Location::new(2, 2));
        assert_eq!(tokens[3].location, Location::new(2, 5));
        assert_eq!(tokens[4].location, Location::new(2, 7));
    }

    #[test]
    fn test_error_location() {
        let err = Lexer::new("a\n  $").find_map(|item| item.err()).unwrap();
        assert_eq!(err.location, Location::new(2, 2));
    }

    #[test]
    fn test_display_roundtrips_spelling() {
        let spelled: Vec<String> = lex("x += 0x10u;").iter().map(|v| v.to_string()).collect();
        assert_eq!(spelled, vec!["x", "+=", "16u", ";", "\n"]);
    }
}
