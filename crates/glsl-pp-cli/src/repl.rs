//! Interactive preprocessing
//!
//! Each entered line is preprocessed on its own; macros defined on one line
//! stay defined for the following ones. Conditional blocks must open and
//! close within a single entry.

use anyhow::{Context, Result};
use glsl_pp::{MacroTable, Preprocessor, PreprocessorConfig};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::commands::{format_error, render};

const PROMPT: &str = "glsl> ";
const SOURCE_NAME: &str = "<repl>";

/// What the REPL should do after an entry.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print this and keep reading
    Print(String),
    /// Stop
    Quit,
}

/// Session state carried from one entry to the next.
pub struct Session {
    config: PreprocessorConfig,
    macros: MacroTable,
    startup_errors: Vec<String>,
}

impl Session {
    /// Start a session with the configured predefined macros.
    pub fn new(config: PreprocessorConfig) -> Self {
        let mut preprocessor = Preprocessor::with_config("", config.clone());
        let startup_errors = preprocessor
            .by_ref()
            .filter_map(|item| item.err())
            .map(|error| format_error(SOURCE_NAME, &error))
            .collect();
        Self {
            config,
            macros: preprocessor.into_macros(),
            startup_errors,
        }
    }

    /// Errors from predefining the configured macros, already formatted.
    pub fn startup_errors(&self) -> &[String] {
        &self.startup_errors
    }

    /// Handle one entry.
    pub fn eval(&mut self, entry: &str) -> Outcome {
        match entry.trim() {
            ":quit" | ":q" => return Outcome::Quit,
            ":macros" => return Outcome::Print(self.macro_listing()),
            ":help" => {
                return Outcome::Print(
                    ":macros  list defined macros\n:quit    leave\n".to_string(),
                )
            }
            _ => {}
        }

        let macros = std::mem::take(&mut self.macros);
        let mut preprocessor = Preprocessor::with_macros(entry, self.config.clone(), macros);

        let mut tokens = Vec::new();
        let mut output = String::new();
        for item in preprocessor.by_ref() {
            match item {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    output.push_str(&format_error(SOURCE_NAME, &error));
                    output.push('\n');
                }
            }
        }
        self.macros = preprocessor.into_macros();
        debug!(macros = self.macros.len(), "entry done");

        output.push_str(&render(&tokens));
        Outcome::Print(output)
    }

    fn macro_listing(&self) -> String {
        self.macros
            .names()
            .into_iter()
            .map(|name| format!("{name}\n"))
            .collect()
    }
}

/// Run the read-eval-print loop until end of input.
pub fn run(config: PreprocessorConfig) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    let mut session = Session::new(config);
    for error in session.startup_errors() {
        eprintln!("{error}");
    }

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor
                    .add_history_entry(line.as_str())
                    .context("failed to record history")?;
                match session.eval(&line) {
                    Outcome::Print(text) => print!("{text}"),
                    Outcome::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read line"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_macros_persist_between_entries() {
        let mut session = Session::new(PreprocessorConfig::default());
        assert_eq!(
            session.eval("#define AREA(w, h) w * h"),
            Outcome::Print(String::new())
        );
        assert_eq!(
            session.eval("AREA(2, 3)"),
            Outcome::Print("2 * 3\n".to_string())
        );
    }

    #[test]
    fn test_configured_defines_available() {
        let config = PreprocessorConfig::new().with_define("N", "4");
        let mut session = Session::new(config);
        assert_eq!(session.eval("N"), Outcome::Print("4\n".to_string()));
    }

    #[test]
    fn test_bad_define_reported_once() {
        let config = PreprocessorConfig::new().with_define("BAD", "1 @");
        let mut session = Session::new(config);
        assert_eq!(
            session.startup_errors(),
            ["<repl>:1:2: error: unexpected character".to_string()]
        );
        assert_eq!(session.eval("BAD"), Outcome::Print("1\n".to_string()));
        assert_eq!(session.eval("BAD"), Outcome::Print("1\n".to_string()));
    }

    #[test]
    fn test_errors_are_printed() {
        let mut session = Session::new(PreprocessorConfig::default());
        assert_eq!(
            session.eval("#nope"),
            Outcome::Print("<repl>:1:1: error: unknown preprocessor directive\n".to_string())
        );
    }

    #[test]
    fn test_meta_commands() {
        let mut session = Session::new(PreprocessorConfig::default());
        session.eval("#define ZED 1");
        match session.eval(":macros") {
            Outcome::Print(listing) => assert!(listing.lines().any(|name| name == "ZED")),
            Outcome::Quit => panic!("expected listing"),
        }
        assert_eq!(session.eval(":quit"), Outcome::Quit);
    }
}
