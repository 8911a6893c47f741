//! Macro expansion
//!
//! Expansion works on a queue of tokens. When a macro name is found its
//! replacement is pushed back to the front of the queue and rescanned
//! together with whatever follows, so a replacement ending in the name of a
//! function-like macro can pick up its arguments from the source.
//!
//! Every token carries a hide set: the names of the macros whose expansion
//! produced it. A name in its own hide set is never expanded again, which
//! is what stops `#define A A` from looping forever.
//!
//! ```text
//! tokens → [scan] → macro? → [collect args] → [substitute] → queue front
//!             ↓
//!           output
//! ```

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{LocatedError, PreprocessorError};
use crate::lexer::{Lexer, Token, TokenValue};
use crate::macros::{is_paste_at, Define, MacroTable};
use crate::token::{Integer, Location, Punct};

/// Result type for expansion operations.
pub type ExpansionResult<T> = std::result::Result<T, LocatedError>;

/// What a [`TokenSource`] has to offer once the current line is used up.
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// The tokens of the next text line, without its newline
    Line(Vec<Token>),
    /// The next line is a directive, which ends any macro invocation
    Directive,
    /// No more input
    End,
}

/// Supplier of further lines for macro invocations that span lines.
pub trait TokenSource {
    /// Fetch the next line of text.
    fn next_line(&mut self) -> ExpansionResult<Continuation>;
}

/// A source with nothing more to give, used for directive lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMoreLines;

impl TokenSource for NoMoreLines {
    fn next_line(&mut self) -> ExpansionResult<Continuation> {
        Ok(Continuation::End)
    }
}

/// Values of the built-in macros at the point of expansion.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    /// Added to a token's physical line to get the value of `__LINE__`
    pub line_offset: i64,
    /// Value of `__FILE__`
    pub file: u32,
    /// Value of `__VERSION__`
    pub version: u32,
}

impl Default for Builtins {
    fn default() -> Self {
        Self {
            line_offset: 0,
            file: 0,
            version: 100,
        }
    }
}

/// A token taking part in expansion.
#[derive(Debug, Clone)]
struct PpToken {
    token: Token,
    hide_set: Vec<String>,
}

impl PpToken {
    fn new(token: Token) -> Self {
        Self {
            token,
            hide_set: Vec::new(),
        }
    }

    fn is_punct(&self, punct: Punct) -> bool {
        self.token.value == TokenValue::Punct(punct)
    }
}

/// Macro expander over a [`MacroTable`].
pub struct Expander<'m> {
    macros: &'m MacroTable,
    builtins: Builtins,
    max_depth: usize,
}

impl<'m> Expander<'m> {
    /// Create an expander.
    pub fn new(macros: &'m MacroTable, builtins: Builtins, max_depth: usize) -> Self {
        Self {
            macros,
            builtins,
            max_depth,
        }
    }

    /// Fully expand `tokens`, pulling more lines from `source` when a
    /// function-like macro invocation needs them.
    pub fn expand(
        &self,
        tokens: Vec<Token>,
        source: &mut dyn TokenSource,
    ) -> ExpansionResult<Vec<Token>> {
        let queue = tokens.into_iter().map(PpToken::new).collect();
        let expanded = self.expand_queue(queue, source, 0)?;
        Ok(expanded.into_iter().map(|t| t.token).collect())
    }

    fn expand_queue(
        &self,
        mut queue: VecDeque<PpToken>,
        source: &mut dyn TokenSource,
        depth: usize,
    ) -> ExpansionResult<Vec<PpToken>> {
        if depth > self.max_depth {
            let location = queue.front().map(|t| t.token.location).unwrap_or_default();
            return Err(LocatedError::new(
                PreprocessorError::RecursionLimitReached,
                location,
            ));
        }

        let mut output = Vec::new();

        while let Some(current) = queue.pop_front() {
            let name = match &current.token.value {
                TokenValue::Ident(name) if !current.hide_set.contains(name) => name.clone(),
                _ => {
                    output.push(current);
                    continue;
                }
            };

            if let Some(value) = self.builtin_value(&name, &current)? {
                output.push(PpToken {
                    token: Token {
                        value,
                        ..current.token
                    },
                    hide_set: current.hide_set,
                });
                continue;
            }

            let define = match self.macros.get(&name) {
                Some(define) => define.clone(),
                None => {
                    output.push(current);
                    continue;
                }
            };

            if current.hide_set.len() >= self.max_depth {
                return Err(LocatedError::new(
                    PreprocessorError::RecursionLimitReached,
                    current.token.location,
                ));
            }

            let replacement = if define.is_function_like() {
                if !fill(&mut queue, source)? || !queue[0].is_punct(Punct::LeftParen) {
                    // A function-like macro name without arguments is just a name
                    output.push(current);
                    continue;
                }
                let args = collect_args(&define, &current, &mut queue, source)?;
                self.substitute(&define, &current, &args, depth)?
            } else {
                self.substitute(&define, &current, &[], depth)?
            };

            trace!(
                name = %name,
                tokens = replacement.len(),
                "expanded macro"
            );

            for token in replacement.into_iter().rev() {
                queue.push_front(token);
            }
        }

        Ok(output)
    }

    fn builtin_value(
        &self,
        name: &str,
        current: &PpToken,
    ) -> ExpansionResult<Option<TokenValue>> {
        let value = match name {
            "__LINE__" => {
                let line = i64::from(current.token.location.line) + self.builtins.line_offset;
                u32::try_from(line).map_err(|_| {
                    LocatedError::new(PreprocessorError::LineOverflow, current.token.location)
                })?
            }
            "__FILE__" => self.builtins.file,
            "__VERSION__" => self.builtins.version,
            _ => return Ok(None),
        };

        Ok(Some(TokenValue::Integer(Integer {
            value: u64::from(value),
            signed: true,
            width: 32,
        })))
    }

    /// Build the replacement list of `define` for the invocation `invocation`.
    fn substitute(
        &self,
        define: &Define,
        invocation: &PpToken,
        args: &[Vec<PpToken>],
        depth: usize,
    ) -> ExpansionResult<Vec<PpToken>> {
        let body = &define.body;
        let mut expanded_args: Vec<Option<Vec<PpToken>>> = vec![None; args.len()];
        let mut result: Vec<PpToken> = Vec::with_capacity(body.len());

        let mut i = 0;
        while i < body.len() {
            if is_paste_at(body, i) {
                // The right operand is never macro expanded before pasting
                let right = self.operand(define, &body[i + 2], args);
                self.paste(&mut result, right, invocation.token.location)?;
                i += 3;
                continue;
            }

            let token = &body[i];
            match param_of(define, token) {
                Some(index) if is_paste_at(body, i + 1) => {
                    result.extend(with_leading_whitespace(
                        args[index].clone(),
                        token.leading_whitespace,
                    ));
                }
                Some(index) => {
                    if expanded_args[index].is_none() {
                        let queue = args[index].iter().cloned().collect();
                        expanded_args[index] =
                            Some(self.expand_queue(queue, &mut NoMoreLines, depth + 1)?);
                    }
                    let expanded = expanded_args[index].clone().unwrap_or_default();
                    result.extend(with_leading_whitespace(expanded, token.leading_whitespace));
                }
                None => result.push(PpToken::new(token.clone())),
            }
            i += 1;
        }

        // Everything produced here is attributed to the invocation
        for (i, token) in result.iter_mut().enumerate() {
            token.token.location = invocation.token.location;
            token.token.start_of_line = false;
            if i == 0 {
                token.token.leading_whitespace = invocation.token.leading_whitespace;
            }
            for name in invocation.hide_set.iter().chain(Some(&define.name)) {
                if !token.hide_set.contains(name) {
                    token.hide_set.push(name.clone());
                }
            }
        }

        Ok(result)
    }

    /// The tokens a `##` operand stands for.
    fn operand(&self, define: &Define, token: &Token, args: &[Vec<PpToken>]) -> Vec<PpToken> {
        match param_of(define, token) {
            Some(index) => args[index].clone(),
            None => vec![PpToken::new(token.clone())],
        }
    }

    /// Glue the last token of `result` to the first token of `right`.
    fn paste(
        &self,
        result: &mut Vec<PpToken>,
        right: Vec<PpToken>,
        location: Location,
    ) -> ExpansionResult<()> {
        let mut right = right.into_iter();
        let (left, first_right) = match (result.pop(), right.next()) {
            (Some(left), Some(first_right)) => (left, first_right),
            // An empty operand leaves the other side untouched
            (Some(left), None) => {
                result.push(left);
                return Ok(());
            }
            (None, Some(first_right)) => {
                result.push(first_right);
                result.extend(right);
                return Ok(());
            }
            (None, None) => return Ok(()),
        };

        let spelling = format!("{}{}", left.token.value, first_right.token.value);
        let value = relex_single(&spelling).ok_or_else(|| {
            let error = match first_right.token.value.clone().into_token_value() {
                Ok(value) => PreprocessorError::UnexpectedToken(value),
                Err(error) => error,
            };
            LocatedError::new(error, location)
        })?;

        result.push(PpToken {
            token: Token { value, ..left.token },
            hide_set: left.hide_set,
        });
        result.extend(right);
        Ok(())
    }
}

/// Make sure the queue is not empty, pulling a line if needed.
///
/// Returns `false` when no more text is available.
fn fill(queue: &mut VecDeque<PpToken>, source: &mut dyn TokenSource) -> ExpansionResult<bool> {
    while queue.is_empty() {
        match source.next_line()? {
            Continuation::Line(tokens) => queue.extend(tokens.into_iter().map(PpToken::new)),
            Continuation::Directive | Continuation::End => return Ok(false),
        }
    }
    Ok(true)
}

/// Collect the arguments of a function-like macro invocation.
///
/// The front of `queue` is the opening parenthesis.
fn collect_args(
    define: &Define,
    invocation: &PpToken,
    queue: &mut VecDeque<PpToken>,
    source: &mut dyn TokenSource,
) -> ExpansionResult<Vec<Vec<PpToken>>> {
    let location = invocation.token.location;
    queue.pop_front();

    let mut args = Vec::new();
    let mut current = Vec::new();
    let mut nesting = 0usize;

    loop {
        while queue.is_empty() {
            match source.next_line()? {
                Continuation::Line(tokens) => queue.extend(tokens.into_iter().map(PpToken::new)),
                Continuation::Directive => {
                    return Err(LocatedError::new(PreprocessorError::UnexpectedHash, location))
                }
                Continuation::End => {
                    return Err(LocatedError::new(
                        PreprocessorError::UnexpectedEndOfInput,
                        location,
                    ))
                }
            }
        }

        let Some(token) = queue.pop_front() else {
            continue;
        };
        if token.is_punct(Punct::LeftParen) {
            nesting += 1;
        } else if token.is_punct(Punct::RightParen) {
            if nesting == 0 {
                args.push(current);
                break;
            }
            nesting -= 1;
        } else if token.is_punct(Punct::Comma) && nesting == 0 {
            args.push(std::mem::take(&mut current));
            continue;
        }
        current.push(token);
    }

    let expected = define.params.as_ref().map_or(0, Vec::len);

    // `F()` passes one empty argument, which is no argument at all for `F()`
    if expected == 0 && args.len() == 1 && args[0].is_empty() {
        args.clear();
    }

    if args.len() < expected {
        return Err(LocatedError::new(
            PreprocessorError::TooFewDefineArguments,
            location,
        ));
    }
    if args.len() > expected {
        return Err(LocatedError::new(
            PreprocessorError::TooManyDefineArguments,
            location,
        ));
    }

    Ok(args)
}

fn param_of(define: &Define, token: &Token) -> Option<usize> {
    match &token.value {
        TokenValue::Ident(name) => define.param_index(name),
        _ => None,
    }
}

fn with_leading_whitespace(mut tokens: Vec<PpToken>, leading: bool) -> Vec<PpToken> {
    if let Some(first) = tokens.first_mut() {
        first.token.leading_whitespace = leading;
    }
    tokens
}

/// Lex `spelling`, expecting exactly one token.
fn relex_single(spelling: &str) -> Option<TokenValue> {
    let mut tokens = Lexer::new(spelling)
        .filter(|item| !matches!(item, Ok(token) if token.value == TokenValue::NewLine));

    let value = match tokens.next()? {
        Ok(token) => token.value,
        Err(_) => return None,
    };

    match tokens.next() {
        None if value != TokenValue::Hash => Some(value),
        _ => None,
    }
}
