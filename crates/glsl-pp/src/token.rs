//! Preprocessed token types
//!
//! These are the tokens handed to a GLSL parser once directives have been
//! interpreted and macros expanded. The lexer has its own superset of
//! [`TokenValue`] that also carries `#` and newlines, see [`crate::lexer`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A position in the source text.
///
/// `line` is 1-based (the number of preceding newlines plus one) and `pos` is
/// the 0-based column of the character within its line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Location {
    /// Line number, starting at 1
    pub line: u32,
    /// Column within the line, starting at 0
    pub pos: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(line: u32, pos: u32) -> Self {
        Self { line, pos }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.pos)
    }
}

/// GLSL punctuators.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Punct {
    // Compound assignments
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
    /// `<<=`
    LeftShiftAssign,
    /// `>>=`
    RightShiftAssign,
    /// `&=`
    AndAssign,
    /// `^=`
    XorAssign,
    /// `|=`
    OrAssign,

    // Two character punctuation
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `^^`
    LogicalXor,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,

    // Brackets
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,

    // One character punctuation
    /// `<`
    LeftAngle,
    /// `>`
    RightAngle,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `=`
    Equal,
    /// `!`
    Bang,
    /// `-`
    Minus,
    /// `~`
    Tilde,
    /// `+`
    Plus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `&`
    Ampersand,
    /// `?`
    Question,
}

impl Punct {
    /// The source spelling of this punctuator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Punct::AddAssign => "+=",
            Punct::SubAssign => "-=",
            Punct::MulAssign => "*=",
            Punct::DivAssign => "/=",
            Punct::ModAssign => "%=",
            Punct::LeftShiftAssign => "<<=",
            Punct::RightShiftAssign => ">>=",
            Punct::AndAssign => "&=",
            Punct::XorAssign => "^=",
            Punct::OrAssign => "|=",
            Punct::Increment => "++",
            Punct::Decrement => "--",
            Punct::LogicalAnd => "&&",
            Punct::LogicalOr => "||",
            Punct::LogicalXor => "^^",
            Punct::LessEqual => "<=",
            Punct::GreaterEqual => ">=",
            Punct::EqualEqual => "==",
            Punct::NotEqual => "!=",
            Punct::LeftShift => "<<",
            Punct::RightShift => ">>",
            Punct::LeftBrace => "{",
            Punct::RightBrace => "}",
            Punct::LeftParen => "(",
            Punct::RightParen => ")",
            Punct::LeftBracket => "[",
            Punct::RightBracket => "]",
            Punct::LeftAngle => "<",
            Punct::RightAngle => ">",
            Punct::Semicolon => ";",
            Punct::Comma => ",",
            Punct::Colon => ":",
            Punct::Dot => ".",
            Punct::Equal => "=",
            Punct::Bang => "!",
            Punct::Minus => "-",
            Punct::Tilde => "~",
            Punct::Plus => "+",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Pipe => "|",
            Punct::Caret => "^",
            Punct::Ampersand => "&",
            Punct::Question => "?",
        }
    }
}

impl fmt::Display for Punct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer literal.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Integer {
    /// Literal value, before any sign is applied
    pub value: u64,
    /// `false` when the literal had a `u` suffix
    pub signed: bool,
    /// Bit width of the literal type
    pub width: i32,
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if !self.signed {
            f.write_str("u")?;
        }
        Ok(())
    }
}

/// A floating point literal.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Float {
    /// Literal value
    pub value: f32,
    /// Bit width of the literal type
    pub width: i32,
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug formatting always keeps a fractional part or an exponent.
        write!(f, "{:?}", self.value)
    }
}

/// A `#version` directive.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Version {
    /// Unexpanded tokens following `version`
    pub tokens: Vec<Token>,
    /// Whether nothing but whitespace and comments preceded the directive
    pub is_first_directive: bool,
    /// Whether a comment appeared before the directive
    pub has_comments_before: bool,
}

/// An `#extension` directive.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Extension {
    /// Unexpanded tokens following `extension`
    pub tokens: Vec<Token>,
    /// Whether a non-directive token was produced before the directive
    pub has_non_directive_before: bool,
}

/// A `#pragma` directive.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Pragma {
    /// Unexpanded tokens following `pragma`
    pub tokens: Vec<Token>,
}

/// The value of a preprocessed token.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum TokenValue {
    /// An identifier or keyword
    Ident(String),

    /// An integer literal
    Integer(Integer),
    /// A float literal
    Float(Float),
    /// A punctuator
    Punct(Punct),

    /// A `#version` directive
    Version(Version),
    /// An `#extension` directive
    Extension(Extension),
    /// A `#pragma` directive
    Pragma(Pragma),
}

impl From<Punct> for TokenValue {
    fn from(punct: Punct) -> Self {
        TokenValue::Punct(punct)
    }
}

fn write_directive(f: &mut fmt::Formatter<'_>, name: &str, tokens: &[Token]) -> fmt::Result {
    write!(f, "#{}", name)?;
    for token in tokens {
        write!(f, " {}", token.value)?;
    }
    Ok(())
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Ident(name) => f.write_str(name),
            TokenValue::Integer(integer) => integer.fmt(f),
            TokenValue::Float(float) => float.fmt(f),
            TokenValue::Punct(punct) => punct.fmt(f),
            TokenValue::Version(version) => write_directive(f, "version", &version.tokens),
            TokenValue::Extension(extension) => {
                write_directive(f, "extension", &extension.tokens)
            }
            TokenValue::Pragma(pragma) => write_directive(f, "pragma", &pragma.tokens),
        }
    }
}

/// A preprocessed token.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token {
    /// What the token is
    pub value: TokenValue,
    /// Where the token (or the macro invocation producing it) starts
    pub location: Location,
}

impl Token {
    /// Create a new token.
    pub fn new(value: TokenValue, location: Location) -> Self {
        Self { value, location }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punct_spelling() {
        assert_eq!(Punct::LeftShiftAssign.to_string(), "<<=");
        assert_eq!(Punct::LogicalXor.to_string(), "^^");
        assert_eq!(Punct::Question.to_string(), "?");
    }

    #[test]
    fn test_integer_display_keeps_unsigned_suffix() {
        let signed = Integer {
            value: 42,
            signed: true,
            width: 32,
        };
        let unsigned = Integer {
            value: 42,
            signed: false,
            width: 32,
        };
        assert_eq!(signed.to_string(), "42");
        assert_eq!(unsigned.to_string(), "42u");
    }

    #[test]
    fn test_float_display_is_a_float_literal() {
        let float = Float {
            value: 1.0,
            width: 32,
        };
        assert_eq!(float.to_string(), "1.0");
    }

    #[test]
    fn test_directive_display() {
        let pragma = TokenValue::Pragma(Pragma {
            tokens: vec![
                Token::new(TokenValue::Ident("optimize".into()), Location::new(1, 8)),
                Token::new(Punct::LeftParen.into(), Location::new(1, 16)),
                Token::new(TokenValue::Ident("on".into()), Location::new(1, 17)),
                Token::new(Punct::RightParen.into(), Location::new(1, 19)),
            ],
        });
        assert_eq!(pragma.to_string(), "#pragma optimize ( on )");
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new(3, 7).to_string(), "3:7");
    }
}
