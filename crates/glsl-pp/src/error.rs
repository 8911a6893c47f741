//! Error types for lexing and preprocessing

use thiserror::Error;

use crate::token::{Location, TokenValue};

/// Everything that can go wrong while turning GLSL source into tokens.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum PreprocessorError {
    /// Integer literal does not fit in 64 bits (or has invalid digits)
    #[error("integer literal is too large")]
    IntegerOverflow,

    /// Float literal could not be parsed
    #[error("invalid float literal")]
    FloatParsingError,

    /// Character that cannot start any token
    #[error("unexpected character")]
    UnexpectedCharacter,

    /// Token that is not allowed here
    #[error("unexpected token `{0}`")]
    UnexpectedToken(TokenValue),

    /// `#` outside of a directive position
    #[error("unexpected `#`")]
    UnexpectedHash,

    /// Line ended before the directive was complete
    #[error("unexpected end of line")]
    UnexpectedNewLine,

    /// Input ended in the middle of a construct
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    /// Function-like macro invoked with too few arguments
    #[error("too few arguments in macro invocation")]
    TooFewDefineArguments,

    /// Function-like macro invoked with too many arguments
    #[error("too many arguments in macro invocation")]
    TooManyDefineArguments,

    /// `#error` directive was reached
    #[error("#error directive")]
    ErrorDirective,

    /// Parameter name repeated in a `#define`
    #[error("duplicate macro parameter")]
    DuplicateParameter,

    /// Directive name is not a known directive
    #[error("unknown preprocessor directive")]
    UnknownDirective,

    /// Macro redefined with a different body, or a built-in macro touched
    #[error("macro redefined")]
    DefineRedefined,

    /// `#elif` without `#if`
    #[error("#elif outside of a conditional block")]
    ElifOutsideOfBlock,

    /// `#else` without `#if`
    #[error("#else outside of a conditional block")]
    ElseOutsideOfBlock,

    /// `#endif` without `#if`
    #[error("#endif outside of a conditional block")]
    EndifOutsideOfBlock,

    /// `#elif` following `#else` in the same block
    #[error("#elif after #else")]
    ElifAfterElse,

    /// Second `#else` in the same block
    #[error("more than one #else in a conditional block")]
    MoreThanOneElse,

    /// Conditional block still open at end of input
    #[error("unterminated conditional block")]
    UnfinishedBlock,

    /// `#line` value does not fit in a line number
    #[error("line number overflow")]
    LineOverflow,

    /// 16-bit literal suffix (`s`, `h`)
    #[error("16-bit literals are not supported")]
    NotSupported16BitLiteral,

    /// 64-bit literal suffix (`l`)
    #[error("64-bit literals are not supported")]
    NotSupported64BitLiteral,

    /// Identifier in an `#if` expression that is not a macro
    #[error("macro is not defined")]
    MacroNotDefined,

    /// Macro expansion nested deeper than the configured limit
    #[error("macro expansion recursion limit reached")]
    RecursionLimitReached,

    /// Division or remainder by zero in an `#if` expression
    #[error("division by zero in preprocessor expression")]
    DivisionByZero,
}

/// A [`PreprocessorError`] together with where it was detected.
#[derive(Error, Clone, PartialEq, Debug)]
#[error("{location}: {error}")]
pub struct LocatedError {
    /// What went wrong
    pub error: PreprocessorError,
    /// Where it went wrong
    pub location: Location,
}

impl LocatedError {
    /// Attach a location to an error.
    pub fn new(error: PreprocessorError, location: Location) -> Self {
        Self { error, location }
    }
}

impl From<(PreprocessorError, Location)> for LocatedError {
    fn from((error, location): (PreprocessorError, Location)) -> Self {
        Self::new(error, location)
    }
}

/// Result type alias for preprocessing operations
pub type Result<T> = std::result::Result<T, LocatedError>;
