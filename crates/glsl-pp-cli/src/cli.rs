//! CLI Argument Parsing

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use glsl_pp::lexer::{Lexer, TokenValue};
use glsl_pp::{PreprocessorConfig, DEFAULT_MAX_EXPANSION_DEPTH};

/// Lex and preprocess GLSL shaders
#[derive(Parser, Debug, Clone)]
#[command(name = "glsl-pp", version)]
#[command(about = "Lex and preprocess GLSL shaders", long_about = None)]
pub struct Args {
    /// Log debug events (GLSL_PP_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the raw preprocessing tokens of a file
    Tokenize {
        /// Shader file, `-` for stdin
        file: PathBuf,
    },

    /// Preprocess a file and print the result
    Preprocess {
        /// Shader file, `-` for stdin
        file: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        options: PreprocessOptions,
    },

    /// Preprocess lines typed at a prompt
    Repl {
        #[command(flatten)]
        options: PreprocessOptions,
    },
}

/// Options shared by the commands that run the preprocessor.
#[derive(ClapArgs, Debug, Clone)]
pub struct PreprocessOptions {
    /// Predefine a macro, NAME or NAME=VALUE
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,

    /// Maximum nesting of macro expansions
    #[arg(long, env = "GLSL_PP_MAX_DEPTH", default_value_t = DEFAULT_MAX_EXPANSION_DEPTH)]
    pub max_depth: usize,
}

impl PreprocessOptions {
    /// Build the library configuration.
    ///
    /// A define without a value gets the body `1`. Names must be a single
    /// identifier.
    pub fn to_config(&self) -> Result<PreprocessorConfig> {
        let mut config = PreprocessorConfig::new().with_max_expansion_depth(self.max_depth);
        for define in &self.defines {
            let (name, value) = define.split_once('=').unwrap_or((define.as_str(), "1"));
            check_macro_name(name)?;
            config = config.with_define(name, value);
        }
        Ok(config)
    }
}

fn check_macro_name(name: &str) -> Result<()> {
    let mut tokens = Lexer::new(name).filter(|item| {
        !matches!(item, Ok(token) if token.value == TokenValue::NewLine)
    });
    match (tokens.next(), tokens.next()) {
        (Some(Ok(token)), None) if token.value == TokenValue::Ident(name.to_string()) => Ok(()),
        _ => bail!("invalid macro name `{name}` in -D, expected an identifier"),
    }
}
