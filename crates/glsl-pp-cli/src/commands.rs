//! The `tokenize` and `preprocess` commands

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use glsl_pp::lexer::{self, Lexer};
use glsl_pp::{LocatedError, Preprocessor, PreprocessorConfig, Token};
use tracing::debug;

/// Source text together with the name used in diagnostics.
pub struct Source {
    /// File name, or `<stdin>`
    pub name: String,
    /// Contents
    pub text: String,
}

impl Source {
    /// Read `path`, or stdin when it is `-`.
    pub fn read(path: &Path) -> Result<Self> {
        if path == Path::new("-") {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            return Ok(Self {
                name: "<stdin>".to_string(),
                text,
            });
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self {
            name: path.display().to_string(),
            text,
        })
    }
}

/// Format an error as `file:line:pos: error: message`.
pub fn format_error(name: &str, error: &LocatedError) -> String {
    format!(
        "{}:{}:{}: error: {}",
        name, error.location.line, error.location.pos, error.error
    )
}

/// Lay tokens out as text, one output line per source line.
pub fn render(tokens: &[Token]) -> String {
    let mut text = String::new();
    let mut line = None;

    for token in tokens {
        match line {
            Some(current) if current == token.location.line => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        line = Some(token.location.line);
        text.push_str(&token.value.to_string());
    }

    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Print the lexer's tokens. Returns whether any error was reported.
pub fn tokenize(source: &Source, out: &mut impl Write, err: &mut impl Write) -> Result<bool> {
    let mut had_errors = false;

    for item in Lexer::new(&source.text) {
        match item {
            Ok(token) => {
                let value = match token.value {
                    lexer::TokenValue::NewLine => "\\n".to_string(),
                    value => value.to_string(),
                };
                writeln!(out, "{}\t{}", token.location, value)?;
            }
            Err(error) => {
                had_errors = true;
                writeln!(err, "{}", format_error(&source.name, &error))?;
            }
        }
    }

    Ok(had_errors)
}

/// Preprocess and print as text or JSON lines. Returns whether any error
/// was reported.
pub fn preprocess(
    source: &Source,
    config: PreprocessorConfig,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    let mut tokens = Vec::new();
    let mut error_count = 0usize;

    for item in Preprocessor::with_config(&source.text, config) {
        match item {
            Ok(token) => tokens.push(token),
            Err(error) => {
                error_count += 1;
                writeln!(err, "{}", format_error(&source.name, &error))?;
            }
        }
    }
    debug!(
        file = %source.name,
        tokens = tokens.len(),
        errors = error_count,
        "preprocessed"
    );

    if json {
        for token in &tokens {
            let line = serde_json::to_string(token).context("failed to serialize token")?;
            writeln!(out, "{line}")?;
        }
    } else {
        out.write_all(render(&tokens).as_bytes())?;
    }

    Ok(error_count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glsl_pp::PreprocessorError;
    use pretty_assertions::assert_eq;

    fn source(text: &str) -> Source {
        Source {
            name: "test.frag".to_string(),
            text: text.to_string(),
        }
    }

    fn run(text: &str, json: bool) -> (String, String, bool) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let had_errors = preprocess(
            &source(text),
            PreprocessorConfig::default(),
            json,
            &mut out,
            &mut err,
        )
        .unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            had_errors,
        )
    }

    #[test]
    fn test_format_error() {
        let error = LocatedError::new(
            PreprocessorError::UnknownDirective,
            glsl_pp::Location::new(3, 1),
        );
        assert_eq!(
            format_error("a.vert", &error),
            "a.vert:3:1: error: unknown preprocessor directive"
        );
    }

    #[test]
    fn test_preprocess_text_output() {
        let (out, err, had_errors) = run("#define N 2\nint a = N;\nint b;", false);
        assert_eq!(out, "int a = 2 ;\nint b ;\n");
        assert_eq!(err, "");
        assert!(!had_errors);
    }

    #[test]
    fn test_preprocess_reports_errors() {
        let (out, err, had_errors) = run("#bogus\nx", false);
        assert_eq!(out, "x\n");
        assert_eq!(err, "test.frag:1:1: error: unknown preprocessor directive\n");
        assert!(had_errors);
    }

    #[test]
    fn test_preprocess_json_lines() {
        let (out, _, _) = run("a b", true);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["value"]["Ident"], "a");
        assert_eq!(lines[1]["location"]["pos"], 2);
    }

    #[test]
    fn test_tokenize_output() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let had_errors = tokenize(&source("#x 1"), &mut out, &mut err).unwrap();
        assert!(!had_errors);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1:0\t#\n1:1\tx\n1:3\t1\n1:4\t\\n\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }
}
