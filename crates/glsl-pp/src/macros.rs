//! Macro definitions
//!
//! The macro table holds everything `#define` has introduced, keyed by name
//! and kept in definition order. It also knows which names are built in and
//! may never be defined or undefined.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{LocatedError, PreprocessorError};
use crate::lexer::{Token, TokenValue};
use crate::token::{Location, Punct};

/// Macros provided by the preprocessor itself.
pub const BUILTIN_MACROS: [&str; 3] = ["__LINE__", "__FILE__", "__VERSION__"];

/// Whether `name` is one of the [`BUILTIN_MACROS`].
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_MACROS.contains(&name)
}

/// A `#define`d macro.
#[derive(Clone, PartialEq)]
pub struct Define {
    /// Name of the macro
    pub name: String,

    /// Parameter names, `None` for an object-like macro
    pub params: Option<Vec<String>>,

    /// Replacement list
    pub body: Vec<Token>,

    /// Where the macro name appeared in the `#define`
    pub location: Location,
}

impl Define {
    /// Create an object-like macro.
    pub fn object(name: impl Into<String>, body: Vec<Token>, location: Location) -> Self {
        Self {
            name: name.into(),
            params: None,
            body,
            location,
        }
    }

    /// Parse the tokens of a `#define` line following the directive name.
    ///
    /// `tokens` must not include the terminating newline.
    pub fn parse(tokens: &[Token]) -> Result<Self, LocatedError> {
        let (name_token, rest) = match tokens.split_first() {
            Some(split) => split,
            None => {
                return Err(LocatedError::new(
                    PreprocessorError::UnexpectedNewLine,
                    Location::default(),
                ))
            }
        };

        let name = match &name_token.value {
            TokenValue::Ident(name) => name.clone(),
            other => return Err(unexpected(other, name_token.location)),
        };

        // Only a parenthesis glued to the name makes a function-like macro
        let (params, body) = match rest.first() {
            Some(paren)
                if paren.value == TokenValue::Punct(Punct::LeftParen)
                    && !paren.leading_whitespace =>
            {
                let (params, consumed) = parse_params(&rest[1..], paren.location)?;
                (Some(params), &rest[1 + consumed..])
            }
            _ => (None, rest),
        };

        validate_body(body)?;

        Ok(Self {
            name,
            params,
            body: body.to_vec(),
            location: name_token.location,
        })
    }

    /// Whether the macro takes arguments.
    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    /// Whether `other` is an acceptable redefinition of this macro.
    ///
    /// Parameters and replacement list must match, including where
    /// whitespace separates the replacement tokens.
    pub fn same_definition(&self, other: &Define) -> bool {
        self.params == other.params
            && self.body.len() == other.body.len()
            && self.body.iter().zip(&other.body).enumerate().all(|(i, (a, b))| {
                a.value == b.value && (i == 0 || a.leading_whitespace == b.leading_whitespace)
            })
    }

    /// Index of a parameter by name.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params
            .as_ref()
            .and_then(|params| params.iter().position(|p| p == name))
    }
}

impl fmt::Debug for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body: Vec<String> = self.body.iter().map(|t| t.value.to_string()).collect();
        write!(
            f,
            "Define {{ name: {}, params: {:?}, body: {:?} }}",
            self.name, self.params, body
        )
    }
}

fn unexpected(value: &TokenValue, location: Location) -> LocatedError {
    let error = match value.clone().into_token_value() {
        Ok(value) => PreprocessorError::UnexpectedToken(value),
        Err(error) => error,
    };
    LocatedError::new(error, location)
}

/// Parse `a, b, c)` returning the names and how many tokens were consumed.
fn parse_params(
    tokens: &[Token],
    open_location: Location,
) -> Result<(Vec<String>, usize), LocatedError> {
    let mut params: Vec<String> = Vec::new();
    let mut iter = tokens.iter().enumerate();

    // Empty list
    if let Some(first) = tokens.first() {
        if first.value == TokenValue::Punct(Punct::RightParen) {
            return Ok((params, 1));
        }
    }

    loop {
        let (_, token) = iter.next().ok_or_else(|| {
            LocatedError::new(PreprocessorError::UnexpectedNewLine, open_location)
        })?;
        match &token.value {
            TokenValue::Ident(name) => {
                if params.contains(name) {
                    return Err(LocatedError::new(
                        PreprocessorError::DuplicateParameter,
                        token.location,
                    ));
                }
                params.push(name.clone());
            }
            other => return Err(unexpected(other, token.location)),
        }

        let (index, token) = iter.next().ok_or_else(|| {
            LocatedError::new(PreprocessorError::UnexpectedNewLine, open_location)
        })?;
        match &token.value {
            TokenValue::Punct(Punct::Comma) => continue,
            TokenValue::Punct(Punct::RightParen) => return Ok((params, index + 1)),
            other => return Err(unexpected(other, token.location)),
        }
    }
}

/// Check that `#` only appears as part of a `##` with operands on both sides.
fn validate_body(body: &[Token]) -> Result<(), LocatedError> {
    let mut i = 0;
    while i < body.len() {
        if body[i].value == TokenValue::Hash {
            let is_paste = is_paste_at(body, i);
            let has_left = i > 0;
            let has_right = i + 2 < body.len();
            if !(is_paste && has_left && has_right) {
                return Err(LocatedError::new(
                    PreprocessorError::UnexpectedHash,
                    body[i].location,
                ));
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Whether `tokens[i..]` starts with a `##` operator.
pub(crate) fn is_paste_at(tokens: &[Token], i: usize) -> bool {
    matches!(
        (tokens.get(i), tokens.get(i + 1)),
        (Some(first), Some(second))
            if first.value == TokenValue::Hash
                && second.value == TokenValue::Hash
                && !second.leading_whitespace
    )
}

/// Table of macros currently defined.
///
/// # Example
///
/// ```
/// use glsl_pp::macros::{Define, MacroTable};
/// use glsl_pp::Location;
///
/// let mut table = MacroTable::new();
/// table.define(Define::object("FOO", vec![], Location::default())).unwrap();
/// assert!(table.contains("FOO"));
///
/// table.undefine("FOO").unwrap();
/// assert!(!table.contains("FOO"));
/// ```
#[derive(Clone, Default)]
pub struct MacroTable {
    /// Definitions in the order they were made
    macros: IndexMap<String, Arc<Define>>,
}

impl MacroTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            macros: IndexMap::new(),
        }
    }

    /// Add a definition.
    ///
    /// Redefining a macro is only allowed when the new definition is the
    /// same as the old one. Built-in names can never be defined.
    pub fn define(&mut self, define: Define) -> Result<(), PreprocessorError> {
        if is_builtin(&define.name) {
            return Err(PreprocessorError::DefineRedefined);
        }

        if let Some(existing) = self.macros.get(&define.name) {
            if !existing.same_definition(&define) {
                return Err(PreprocessorError::DefineRedefined);
            }
            return Ok(());
        }

        self.macros.insert(define.name.clone(), Arc::new(define));
        Ok(())
    }

    /// Remove a definition, returning it if there was one.
    ///
    /// Undefining an unknown name is not an error.
    pub fn undefine(&mut self, name: &str) -> Result<Option<Arc<Define>>, PreprocessorError> {
        if is_builtin(name) {
            return Err(PreprocessorError::DefineRedefined);
        }
        Ok(self.macros.shift_remove(name))
    }

    /// Look up a macro by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Define>> {
        self.macros.get(name)
    }

    /// Whether `name` is defined, built-in macros included.
    pub fn contains(&self, name: &str) -> bool {
        is_builtin(name) || self.macros.contains_key(name)
    }

    /// Names of the user and predefined macros, in definition order.
    pub fn names(&self) -> Vec<&str> {
        self.macros.keys().map(|s| s.as_str()).collect()
    }

    /// Number of macros (built-ins excluded).
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    /// Whether no macros are defined (built-ins excluded).
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

impl fmt::Debug for MacroTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacroTable {{ macros: {:?} }}", self.names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use pretty_assertions::assert_eq;

    /// Lex a `#define` line and return the tokens after `define`.
    fn define_tokens(line: &str) -> Vec<Token> {
        Lexer::new(line)
            .map(|t| t.unwrap())
            .filter(|t| t.value != TokenValue::NewLine)
            .skip(2)
            .collect()
    }

    fn parse(line: &str) -> Result<Define, PreprocessorError> {
        Define::parse(&define_tokens(line)).map_err(|e| e.error)
    }

    #[test]
    fn test_parse_object_like() {
        let define = parse("#define FOO 1 + 2").unwrap();
        assert_eq!(define.name, "FOO");
        assert!(!define.is_function_like());
        assert_eq!(define.body.len(), 3);
    }

    #[test]
    fn test_parse_object_like_with_parenthesized_body() {
        let define = parse("#define FOO (1)").unwrap();
        assert!(!define.is_function_like());
        assert_eq!(define.body.len(), 3);
    }

    #[test]
    fn test_parse_function_like() {
        let define = parse("#define ADD(a, b) a + b").unwrap();
        assert_eq!(define.params, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(define.param_index("b"), Some(1));
        assert_eq!(define.body.len(), 3);
    }

    #[test]
    fn test_parse_no_params() {
        let define = parse("#define F() 1").unwrap();
        assert_eq!(define.params, Some(vec![]));
        assert_eq!(define.body.len(), 1);
    }

    #[test]
    fn test_parse_empty_body() {
        let define = parse("#define EMPTY").unwrap();
        assert!(define.body.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse("#define").unwrap_err(),
            PreprocessorError::UnexpectedNewLine
        );
        assert!(matches!(
            parse("#define 1 2").unwrap_err(),
            PreprocessorError::UnexpectedToken(_)
        ));
        assert_eq!(
            parse("#define F(a, a) a").unwrap_err(),
            PreprocessorError::DuplicateParameter
        );
        assert_eq!(
            parse("#define F(a").unwrap_err(),
            PreprocessorError::UnexpectedNewLine
        );
        assert!(matches!(
            parse("#define F(a b) a").unwrap_err(),
            PreprocessorError::UnexpectedToken(_)
        ));
    }

    #[test]
    fn test_parse_hash_in_body() {
        assert!(parse("#define CAT(a, b) a ## b").is_ok());
        assert_eq!(
            parse("#define S(a) # a").unwrap_err(),
            PreprocessorError::UnexpectedHash
        );
        assert_eq!(
            parse("#define P(a) ## a").unwrap_err(),
            PreprocessorError::UnexpectedHash
        );
        assert_eq!(
            parse("#define P(a) a ##").unwrap_err(),
            PreprocessorError::UnexpectedHash
        );
    }

    #[test]
    fn test_identical_redefinition_allowed() {
        let mut table = MacroTable::new();
        table.define(parse("#define A 1 + 2").unwrap()).unwrap();
        assert!(table.define(parse("#define A   1 +   2").unwrap()).is_ok());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_different_redefinition_rejected() {
        let mut table = MacroTable::new();
        table.define(parse("#define A 1+2").unwrap()).unwrap();
        assert_eq!(
            table.define(parse("#define A 1 + 2").unwrap()),
            Err(PreprocessorError::DefineRedefined)
        );
        assert_eq!(
            table.define(parse("#define A(x) 1+2").unwrap()),
            Err(PreprocessorError::DefineRedefined)
        );
    }

    #[test]
    fn test_builtins_are_protected() {
        let mut table = MacroTable::new();
        assert_eq!(
            table.define(parse("#define __LINE__ 3").unwrap()),
            Err(PreprocessorError::DefineRedefined)
        );
        assert_eq!(
            table.undefine("__FILE__"),
            Err(PreprocessorError::DefineRedefined)
        );
        assert!(table.contains("__VERSION__"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_undefine_unknown_is_fine() {
        let mut table = MacroTable::new();
        assert_eq!(table.undefine("NOPE").unwrap(), None);
    }

    #[test]
    fn test_names_in_definition_order() {
        let mut table = MacroTable::new();
        table.define(parse("#define B").unwrap()).unwrap();
        table.define(parse("#define A").unwrap()).unwrap();
        table.define(parse("#define C").unwrap()).unwrap();
        table.undefine("A").unwrap();
        assert_eq!(table.names(), vec!["B", "C"]);
    }
}
