//! The preprocessor
//!
//! Reads the lexer output a line at a time. Lines starting with `#` are
//! directives; every other line is text, which is macro expanded and handed
//! out as [`Token`]s when the enclosing conditional blocks are active.
//!
//! ```text
//! Lexer → [LineReader] → directive? → [directive handlers] → Version / Extension / Pragma
//!                            ↓
//!                          text → [Expander] → Token
//! ```
//!
//! Errors do not stop preprocessing: they are yielded in order with the
//! tokens and processing resumes on the next line.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::conditional::ConditionalStack;
use crate::config::PreprocessorConfig;
use crate::error::{LocatedError, PreprocessorError};
use crate::expand::{Builtins, Continuation, ExpansionResult, Expander, NoMoreLines, TokenSource};
use crate::expr;
use crate::lexer::{self, Lexer, LexerItem};
use crate::macros::{Define, MacroTable};
use crate::token::{Extension, Integer, Location, Pragma, Punct, Token, TokenValue, Version};

/// Macro predefined for every shader.
const PREDEFINED: [(&str, u64); 1] = [("GL_ES", 1)];

/// One source line as seen by the preprocessor.
struct Line {
    /// Tokens, without the terminating newline
    tokens: Vec<lexer::Token>,
    /// Location of the terminating newline
    end: Location,
    /// Lexer errors found on the line
    errors: Vec<LocatedError>,
    /// Whether any comment had been seen once the line's first token was read
    had_comments: bool,
}

/// Splits the lexer output into lines.
struct LineReader<'a> {
    lexer: Lexer<'a>,
    peeked: Option<LexerItem>,
    /// Lexer errors from lines pulled in by macro invocations
    errors: Vec<LocatedError>,
}

impl<'a> LineReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            peeked: None,
            errors: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<&LexerItem> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next();
        }
        self.peeked.as_ref()
    }

    fn next_item(&mut self) -> Option<LexerItem> {
        self.peeked.take().or_else(|| self.lexer.next())
    }

    fn read_line(&mut self) -> Option<Line> {
        let first = self.next_item()?;
        let mut line = Line {
            tokens: Vec::new(),
            end: Location::default(),
            errors: Vec::new(),
            had_comments: self.lexer.had_comments(),
        };

        let mut item = Some(first);
        while let Some(current) = item {
            match current {
                Ok(token) if token.value == lexer::TokenValue::NewLine => {
                    line.end = token.location;
                    return Some(line);
                }
                Ok(token) => {
                    line.end = token.location;
                    line.tokens.push(token);
                }
                Err(error) => {
                    line.end = error.location;
                    line.errors.push(error);
                }
            }
            item = self.next_item();
        }

        Some(line)
    }
}

impl<'a> TokenSource for LineReader<'a> {
    fn next_line(&mut self) -> ExpansionResult<Continuation> {
        loop {
            match self.peek() {
                None => return Ok(Continuation::End),
                Some(Ok(token)) if token.value == lexer::TokenValue::Hash && token.start_of_line => {
                    return Ok(Continuation::Directive)
                }
                Some(_) => {}
            }

            let Some(line) = self.read_line() else {
                return Ok(Continuation::End);
            };
            self.errors.extend(line.errors);
            if !line.tokens.is_empty() {
                return Ok(Continuation::Line(line.tokens));
            }
        }
    }
}

/// GLSL preprocessor over a source string.
///
/// # Example
///
/// ```
/// use glsl_pp::Preprocessor;
///
/// let source = "#define SIZE 4\nfloat weights[SIZE];";
/// let values: Vec<String> = Preprocessor::new(source)
///     .map(|token| token.unwrap().value.to_string())
///     .collect();
/// assert_eq!(values, vec!["float", "weights", "[", "4", "]", ";"]);
/// ```
pub struct Preprocessor<'a> {
    reader: LineReader<'a>,
    config: PreprocessorConfig,
    macros: MacroTable,
    conditionals: ConditionalStack,
    builtins: Builtins,
    output: VecDeque<Result<Token, LocatedError>>,
    /// Any token at all has been read (directives and skipped text included)
    seen_token: bool,
    /// A text token has been produced
    seen_text: bool,
    finished: bool,
}

impl<'a> Preprocessor<'a> {
    /// Create a preprocessor with the default configuration.
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, PreprocessorConfig::default())
    }

    /// Create a preprocessor with a custom configuration.
    pub fn with_config(input: &'a str, config: PreprocessorConfig) -> Self {
        let mut preprocessor = Self::build(input, config, MacroTable::new());
        preprocessor.predefine();
        preprocessor
    }

    /// Continue with macros defined by an earlier run.
    ///
    /// Nothing is predefined: `GL_ES` and the configured defines are expected
    /// to be in `macros` already, as they are in any table taken from
    /// [`Preprocessor::into_macros`].
    pub fn with_macros(input: &'a str, config: PreprocessorConfig, macros: MacroTable) -> Self {
        Self::build(input, config, macros)
    }

    fn build(input: &'a str, config: PreprocessorConfig, macros: MacroTable) -> Self {
        Self {
            reader: LineReader::new(input),
            config,
            macros,
            conditionals: ConditionalStack::new(),
            builtins: Builtins::default(),
            output: VecDeque::new(),
            seen_token: false,
            seen_text: false,
            finished: false,
        }
    }

    /// Macros defined so far.
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Give up the macro table, e.g. to carry it into another run.
    pub fn into_macros(self) -> MacroTable {
        self.macros
    }

    fn predefine(&mut self) {
        for (name, value) in PREDEFINED {
            let body = vec![lexer::Token {
                value: lexer::TokenValue::Integer(Integer {
                    value,
                    signed: true,
                    width: 32,
                }),
                location: Location::default(),
                leading_whitespace: true,
                start_of_line: false,
            }];
            if let Err(error) = self.macros.define(Define::object(name, body, Location::default()))
            {
                self.output
                    .push_back(Err(LocatedError::new(error, Location::default())));
            }
        }

        let defines: Vec<(String, String)> = self
            .config
            .defines
            .iter()
            .map(|(name, body)| (name.clone(), body.clone()))
            .collect();

        for (name, body) in defines {
            let mut tokens = Vec::new();
            for item in Lexer::new(&body) {
                match item {
                    Ok(token) if token.value == lexer::TokenValue::NewLine => {}
                    Ok(token) => tokens.push(token),
                    Err(error) => self.output.push_back(Err(error)),
                }
            }
            debug!(name = %name, "predefined macro");
            if let Err(error) = self
                .macros
                .define(Define::object(name, tokens, Location::default()))
            {
                self.output
                    .push_back(Err(LocatedError::new(error, Location::default())));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Output
    // ═══════════════════════════════════════════════════════════════════

    /// Apply `#line` renumbering to a physical location.
    fn map_location(&self, location: Location) -> Result<Location, LocatedError> {
        let line = i64::from(location.line) + self.builtins.line_offset;
        u32::try_from(line)
            .map(|line| Location {
                line,
                pos: location.pos,
            })
            .map_err(|_| LocatedError::new(PreprocessorError::LineOverflow, location))
    }

    fn report(&mut self, error: LocatedError) {
        let location = self.map_location(error.location).unwrap_or(error.location);
        self.output
            .push_back(Err(LocatedError::new(error.error, location)));
    }

    fn emit(&mut self, value: TokenValue, location: Location) {
        match self.map_location(location) {
            Ok(location) => self.output.push_back(Ok(Token::new(value, location))),
            Err(error) => self.output.push_back(Err(error)),
        }
    }

    fn emit_lexer_token(&mut self, token: lexer::Token) {
        match token.value.into_token_value() {
            Ok(value) => self.emit(value, token.location),
            Err(error) => self.report(LocatedError::new(error, token.location)),
        }
    }

    fn drain_reader_errors(&mut self) {
        let errors: Vec<_> = self.reader.errors.drain(..).collect();
        for error in errors {
            self.report(error);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Line Processing
    // ═══════════════════════════════════════════════════════════════════

    fn step(&mut self) {
        let Some(line) = self.reader.read_line() else {
            self.finish();
            return;
        };

        let active = self.conditionals.is_active();
        if active {
            for error in line.errors.iter().cloned() {
                self.report(error);
            }
        }

        let is_directive = matches!(
            line.tokens.first(),
            Some(first) if first.value == lexer::TokenValue::Hash && first.start_of_line
        );

        if is_directive {
            self.directive(line);
            self.seen_token = true;
        } else if !line.tokens.is_empty() {
            if active {
                self.text(line);
            }
            self.seen_token = true;
        }
    }

    fn finish(&mut self) {
        if let Some(location) = self.conditionals.finish() {
            self.report(LocatedError::new(PreprocessorError::UnfinishedBlock, location));
        }
        self.finished = true;
    }

    fn text(&mut self, line: Line) {
        trace!(line = line.end.line, tokens = line.tokens.len(), "text line");
        self.seen_text = true;

        let result = {
            let expander = Expander::new(
                &self.macros,
                self.builtins,
                self.config.max_expansion_depth,
            );
            expander.expand(line.tokens, &mut self.reader)
        };
        self.drain_reader_errors();

        match result {
            Ok(tokens) => {
                for token in tokens {
                    self.emit_lexer_token(token);
                }
            }
            Err(error) => self.report(error),
        }
    }

    fn directive(&mut self, line: Line) {
        let hash = &line.tokens[0];
        let hash_location = hash.location;

        let Some(name_token) = line.tokens.get(1) else {
            // The null directive
            return;
        };

        let name = match &name_token.value {
            lexer::TokenValue::Ident(name) => name.clone(),
            other => {
                if self.conditionals.is_active() {
                    self.report(unexpected(other, name_token.location));
                }
                return;
            }
        };

        let args = &line.tokens[2..];
        let end = line.end;

        let result = match name.as_str() {
            "if" => self.directive_if(args, end, hash_location),
            "ifdef" => self.directive_ifdef(args, end, hash_location, true),
            "ifndef" => self.directive_ifdef(args, end, hash_location, false),
            "elif" => self.directive_elif(args, end, hash_location),
            "else" => self.directive_else(args, hash_location),
            "endif" => self.directive_endif(args, hash_location),

            // Everything else only matters in included text
            _ if !self.conditionals.is_active() => Ok(()),

            "define" => self.directive_define(args, end),
            "undef" => self.directive_undef(args, end),
            "error" => Err(LocatedError::new(
                PreprocessorError::ErrorDirective,
                hash_location,
            )),
            "line" => self.directive_line(args, end),
            "version" => self.directive_version(args, hash_location, line.had_comments),
            "extension" => self.directive_extension(args, hash_location),
            "pragma" => self.directive_pragma(args, hash_location),
            _ => Err(LocatedError::new(
                PreprocessorError::UnknownDirective,
                name_token.location,
            )),
        };

        if let Err(error) = result {
            self.report(error);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Conditional Directives
    // ═══════════════════════════════════════════════════════════════════

    fn directive_if(
        &mut self,
        args: &[lexer::Token],
        end: Location,
        location: Location,
    ) -> Result<(), LocatedError> {
        if !self.conditionals.is_active() {
            self.conditionals.push_if(false, location);
            return Ok(());
        }

        match self.evaluate_condition(args, end) {
            Ok(condition) => {
                self.conditionals.push_if(condition, location);
                Ok(())
            }
            Err(error) => {
                // Still open the block so the matching #endif lines up
                self.conditionals.push_if(false, location);
                Err(error)
            }
        }
    }

    fn directive_ifdef(
        &mut self,
        args: &[lexer::Token],
        end: Location,
        location: Location,
        want_defined: bool,
    ) -> Result<(), LocatedError> {
        if !self.conditionals.is_active() {
            self.conditionals.push_if(false, location);
            return Ok(());
        }

        match single_identifier(args, end) {
            Ok(name) => {
                let defined = self.macros.contains(name);
                self.conditionals.push_if(defined == want_defined, location);
                Ok(())
            }
            Err(error) => {
                self.conditionals.push_if(false, location);
                Err(error)
            }
        }
    }

    fn directive_elif(
        &mut self,
        args: &[lexer::Token],
        end: Location,
        location: Location,
    ) -> Result<(), LocatedError> {
        let needs_condition = self
            .conditionals
            .elif_needs_condition()
            .map_err(|error| LocatedError::new(error, location))?;

        let (condition, error) = if needs_condition {
            match self.evaluate_condition(args, end) {
                Ok(condition) => (condition, None),
                Err(error) => (false, Some(error)),
            }
        } else {
            (false, None)
        };

        self.conditionals
            .elif(condition)
            .map_err(|error| LocatedError::new(error, location))?;

        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn directive_else(
        &mut self,
        args: &[lexer::Token],
        location: Location,
    ) -> Result<(), LocatedError> {
        self.conditionals
            .else_branch()
            .map_err(|error| LocatedError::new(error, location))?;
        no_extra_tokens(args)
    }

    fn directive_endif(
        &mut self,
        args: &[lexer::Token],
        location: Location,
    ) -> Result<(), LocatedError> {
        self.conditionals
            .endif()
            .map_err(|error| LocatedError::new(error, location))?;
        no_extra_tokens(args)
    }

    /// Resolve `defined`, expand macros and evaluate an `#if` condition.
    fn evaluate_condition(
        &self,
        args: &[lexer::Token],
        end: Location,
    ) -> Result<bool, LocatedError> {
        let resolved = self.resolve_defined(args, end)?;
        let expander = Expander::new(
            &self.macros,
            self.builtins,
            self.config.max_expansion_depth,
        );
        let expanded = expander.expand(resolved, &mut NoMoreLines)?;
        let value = expr::evaluate(&expanded, end)?;
        trace!(value, "evaluated condition");
        Ok(value != 0)
    }

    /// Replace `defined NAME` and `defined(NAME)` with 1 or 0.
    fn resolve_defined(
        &self,
        args: &[lexer::Token],
        end: Location,
    ) -> Result<Vec<lexer::Token>, LocatedError> {
        let mut resolved = Vec::with_capacity(args.len());
        let mut iter = args.iter();

        while let Some(token) = iter.next() {
            if !matches!(&token.value, lexer::TokenValue::Ident(name) if name == "defined") {
                resolved.push(token.clone());
                continue;
            }

            let missing = || LocatedError::new(PreprocessorError::UnexpectedNewLine, end);
            let operand = iter.next().ok_or_else(missing)?;
            let name_token = if operand.value == lexer::TokenValue::Punct(Punct::LeftParen) {
                let name_token = iter.next().ok_or_else(missing)?;
                let close = iter.next().ok_or_else(missing)?;
                if close.value != lexer::TokenValue::Punct(Punct::RightParen) {
                    return Err(unexpected(&close.value, close.location));
                }
                name_token
            } else {
                operand
            };

            let defined = match &name_token.value {
                lexer::TokenValue::Ident(name) => self.macros.contains(name),
                other => return Err(unexpected(other, name_token.location)),
            };

            resolved.push(lexer::Token {
                value: lexer::TokenValue::Integer(Integer {
                    value: u64::from(defined),
                    signed: true,
                    width: 32,
                }),
                ..token.clone()
            });
        }

        Ok(resolved)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Other Directives
    // ═══════════════════════════════════════════════════════════════════

    fn directive_define(&mut self, args: &[lexer::Token], end: Location) -> Result<(), LocatedError> {
        if args.is_empty() {
            return Err(LocatedError::new(PreprocessorError::UnexpectedNewLine, end));
        }

        let define = Define::parse(args)?;
        let location = define.location;
        debug!(
            name = %define.name,
            params = ?define.params,
            "define"
        );
        self.macros
            .define(define)
            .map_err(|error| LocatedError::new(error, location))
    }

    fn directive_undef(&mut self, args: &[lexer::Token], end: Location) -> Result<(), LocatedError> {
        let name = single_identifier(args, end)?;
        debug!(name = %name, "undef");
        self.macros
            .undefine(name)
            .map(|_| ())
            .map_err(|error| LocatedError::new(error, args[0].location))
    }

    fn directive_line(&mut self, args: &[lexer::Token], end: Location) -> Result<(), LocatedError> {
        let expander = Expander::new(
            &self.macros,
            self.builtins,
            self.config.max_expansion_depth,
        );
        let expanded = expander.expand(args.to_vec(), &mut NoMoreLines)?;
        let mut iter = expanded.iter();

        let line_token = iter
            .next()
            .ok_or_else(|| LocatedError::new(PreprocessorError::UnexpectedNewLine, end))?;
        let line = integer_value(line_token)?;

        let file = match iter.next() {
            Some(token) => Some((integer_value(token)?, token.location)),
            None => None,
        };

        if let Some(extra) = iter.next() {
            return Err(unexpected(&extra.value, extra.location));
        }

        let line = u32::try_from(line)
            .map_err(|_| LocatedError::new(PreprocessorError::LineOverflow, line_token.location))?;
        let file = match file {
            Some((file, location)) => u32::try_from(file)
                .map_err(|_| LocatedError::new(PreprocessorError::IntegerOverflow, location))?,
            None => self.builtins.file,
        };

        // The line after the directive gets number `line`
        let next_physical = i64::from(end.line) + 1;
        self.builtins.line_offset = i64::from(line) - next_physical;
        self.builtins.file = file;

        debug!(
            line,
            file = self.builtins.file,
            "line directive"
        );
        Ok(())
    }

    fn directive_version(
        &mut self,
        args: &[lexer::Token],
        location: Location,
        had_comments: bool,
    ) -> Result<(), LocatedError> {
        let tokens = self.directive_tokens(args)?;

        if let Some(Token {
            value: TokenValue::Integer(integer),
            ..
        }) = tokens.first()
        {
            if let Ok(version) = u32::try_from(integer.value) {
                self.builtins.version = version;
            }
        }

        debug!(version = self.builtins.version, "version directive");
        let version = Version {
            tokens,
            is_first_directive: !self.seen_token,
            has_comments_before: had_comments,
        };
        self.emit(TokenValue::Version(version), location);
        Ok(())
    }

    fn directive_extension(
        &mut self,
        args: &[lexer::Token],
        location: Location,
    ) -> Result<(), LocatedError> {
        let extension = Extension {
            tokens: self.directive_tokens(args)?,
            has_non_directive_before: self.seen_text,
        };
        self.emit(TokenValue::Extension(extension), location);
        Ok(())
    }

    fn directive_pragma(
        &mut self,
        args: &[lexer::Token],
        location: Location,
    ) -> Result<(), LocatedError> {
        let pragma = Pragma {
            tokens: self.directive_tokens(args)?,
        };
        self.emit(TokenValue::Pragma(pragma), location);
        Ok(())
    }

    /// Convert the unexpanded tokens of a directive into output tokens.
    fn directive_tokens(&self, args: &[lexer::Token]) -> Result<Vec<Token>, LocatedError> {
        args.iter()
            .map(|token| {
                let value = token
                    .value
                    .clone()
                    .into_token_value()
                    .map_err(|error| LocatedError::new(error, token.location))?;
                Ok(Token::new(value, self.map_location(token.location)?))
            })
            .collect()
    }
}

impl<'a> Iterator for Preprocessor<'a> {
    type Item = Result<Token, LocatedError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.output.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            self.step();
        }
    }
}

/// Preprocess `input`, stopping at the first error.
///
/// # Example
///
/// ```
/// let tokens = glsl_pp::preprocess("#if 0\nhidden\n#endif\nshown").unwrap();
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(tokens[0].value.to_string(), "shown");
/// ```
pub fn preprocess(input: &str) -> Result<Vec<Token>, LocatedError> {
    Preprocessor::new(input).collect()
}

fn unexpected(value: &lexer::TokenValue, location: Location) -> LocatedError {
    let error = match value.clone().into_token_value() {
        Ok(value) => PreprocessorError::UnexpectedToken(value),
        Err(error) => error,
    };
    LocatedError::new(error, location)
}

fn no_extra_tokens(args: &[lexer::Token]) -> Result<(), LocatedError> {
    match args.first() {
        Some(token) => Err(unexpected(&token.value, token.location)),
        None => Ok(()),
    }
}

/// The name in `#ifdef NAME`, `#ifndef NAME` or `#undef NAME`.
fn single_identifier(args: &[lexer::Token], end: Location) -> Result<&str, LocatedError> {
    let token = args
        .first()
        .ok_or_else(|| LocatedError::new(PreprocessorError::UnexpectedNewLine, end))?;

    let name = match &token.value {
        lexer::TokenValue::Ident(name) => name.as_str(),
        other => return Err(unexpected(other, token.location)),
    };

    no_extra_tokens(&args[1..])?;
    Ok(name)
}

fn integer_value(token: &lexer::Token) -> Result<u64, LocatedError> {
    match &token.value {
        lexer::TokenValue::Integer(integer) => Ok(integer.value),
        other => Err(unexpected(other, token.location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(src: &str) -> Vec<String> {
        Preprocessor::new(src)
            .map(|item| item.unwrap().value.to_string())
            .collect()
    }

    fn errors(src: &str) -> Vec<PreprocessorError> {
        Preprocessor::new(src)
            .filter_map(|item| item.err())
            .map(|error| error.error)
            .collect()
    }

    #[test]
    fn test_text_passes_through() {
        assert_eq!(values("float x = 1.0;"), vec!["float", "x", "=", "1.0", ";"]);
    }

    #[test]
    fn test_object_macro() {
        assert_eq!(values("#define N 3\nN + N"), vec!["3", "+", "3"]);
    }

    #[test]
    fn test_invocation_spans_lines() {
        let src = "#define ADD(a, b) a + b\nADD(1,\n2)";
        assert_eq!(values(src), vec!["1", "+", "2"]);
    }

    #[test]
    fn test_invocation_cut_by_directive() {
        let src = "#define F(a) a\nF(\n#define X\n";
        assert!(errors(src).contains(&PreprocessorError::UnexpectedHash));
    }

    #[test]
    fn test_if_defined_forms() {
        let src = "#define A\n#if defined(A) && !defined B\nyes\n#else\nno\n#endif";
        assert_eq!(values(src), vec!["yes"]);
    }

    #[test]
    fn test_undefined_identifier_in_if_skips_block() {
        let items: Vec<_> = Preprocessor::new("#if FOO\nx\n#endif\ny").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].clone().unwrap_err().error,
            PreprocessorError::MacroNotDefined
        );
        assert_eq!(items[1].clone().unwrap().value.to_string(), "y");
    }

    #[test]
    fn test_skipped_region_ignores_unknown_directives() {
        assert_eq!(values("#if 0\n#foo\n#error\n#endif\nz"), vec!["z"]);
    }

    #[test]
    fn test_error_directive_then_resume() {
        let items: Vec<_> = Preprocessor::new("#error stop\nx").collect();
        assert_eq!(
            items[0],
            Err(LocatedError::new(
                PreprocessorError::ErrorDirective,
                Location::new(1, 0)
            ))
        );
        assert_eq!(items[1].clone().unwrap().value.to_string(), "x");
    }

    #[test]
    fn test_unfinished_block() {
        let items: Vec<_> = Preprocessor::new("#if 1\nx").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1],
            Err(LocatedError::new(
                PreprocessorError::UnfinishedBlock,
                Location::new(1, 0)
            ))
        );
    }

    #[test]
    fn test_line_directive_renumbers() {
        let tokens = preprocess("#line 10\nfoo\n__LINE__").unwrap();
        assert_eq!(tokens[0].location.line, 10);
        assert_eq!(tokens[1].value.to_string(), "11");
        assert_eq!(tokens[1].location.line, 11);
    }

    #[test]
    fn test_line_directive_sets_file() {
        let tokens = preprocess("#line 1 7\n__FILE__").unwrap();
        assert_eq!(tokens[0].value.to_string(), "7");
    }

    #[test]
    fn test_version_directive() {
        let tokens = preprocess("#version 300 es\n__VERSION__").unwrap();
        match &tokens[0].value {
            TokenValue::Version(version) => {
                assert_eq!(version.tokens.len(), 2);
                assert!(version.is_first_directive);
                assert!(!version.has_comments_before);
            }
            other => panic!("expected version, got {other:?}"),
        }
        assert_eq!(tokens[1].value.to_string(), "300");
    }

    #[test]
    fn test_version_after_comment_and_text() {
        let tokens = preprocess("// header\n#version 100").unwrap();
        match &tokens[0].value {
            TokenValue::Version(version) => {
                assert!(version.is_first_directive);
                assert!(version.has_comments_before);
            }
            other => panic!("expected version, got {other:?}"),
        }

        let tokens = preprocess("x\n#version 100").unwrap();
        match &tokens[1].value {
            TokenValue::Version(version) => assert!(!version.is_first_directive),
            other => panic!("expected version, got {other:?}"),
        }
    }

    #[test]
    fn test_extension_tracks_preceding_text() {
        let tokens = preprocess("#extension GL_foo : enable\nx;\n#extension GL_bar : warn").unwrap();
        let flags: Vec<bool> = tokens
            .iter()
            .filter_map(|token| match &token.value {
                TokenValue::Extension(extension) => Some(extension.has_non_directive_before),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn test_pragma_is_not_expanded() {
        let tokens = preprocess("#define X 1\n#pragma optimize(X)").unwrap();
        assert_eq!(tokens[0].value.to_string(), "#pragma optimize ( X )");
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(errors("#frobnicate"), vec![PreprocessorError::UnknownDirective]);
    }

    #[test]
    fn test_extra_tokens_after_endif() {
        assert_eq!(
            errors("#if 1\n#endif junk"),
            vec![PreprocessorError::UnexpectedToken(TokenValue::Ident(
                "junk".to_string()
            ))]
        );
    }

    #[test]
    fn test_predefined_and_configured_macros() {
        let config = PreprocessorConfig::new().with_define("SCALE", "2 * 3");
        let values: Vec<String> = Preprocessor::with_config("GL_ES SCALE", config)
            .map(|item| item.unwrap().value.to_string())
            .collect();
        assert_eq!(values, vec!["1", "2", "*", "3"]);
    }

    #[test]
    fn test_macros_carry_between_runs() {
        let mut first = Preprocessor::new("#define W 640");
        assert!(first.next().is_none());
        let macros = first.into_macros();

        let values: Vec<String> =
            Preprocessor::with_macros("W GL_ES", PreprocessorConfig::default(), macros)
                .map(|item| item.unwrap().value.to_string())
                .collect();
        assert_eq!(values, vec!["640", "1"]);
    }

    #[test]
    fn test_carried_macros_are_not_predefined_again() {
        let config = PreprocessorConfig::new().with_define("BAD", "1 @");
        let startup: Vec<_> = Preprocessor::with_config("", config.clone()).collect();
        assert_eq!(startup.len(), 1);
        let macros = Preprocessor::with_config("", config.clone()).into_macros();

        let items: Vec<_> = Preprocessor::with_macros("BAD", config, macros).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].clone().unwrap().value.to_string(), "1");
    }

    #[test]
    fn test_stray_hash_in_text() {
        assert_eq!(errors("a # b"), vec![PreprocessorError::UnexpectedHash]);
    }
}
