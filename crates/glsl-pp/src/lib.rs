//! # glsl-pp
//!
//! A preprocessor for GLSL shaders.
//!
//! Turns shader source into a stream of preprocessed tokens: comments and
//! line continuations are removed, directives are interpreted, conditional
//! blocks are resolved and macros are expanded. `#version`, `#extension`
//! and `#pragma` are passed on as tokens of their own for the parser to act
//! on.
//!
//! ## Architecture
//!
//! - **Lexer**: Characters to preprocessing tokens ([`lexer`])
//! - **Macros**: Macro definitions and the table they live in ([`macros`])
//! - **Expansion**: Hide-set based macro expansion ([`expand`])
//! - **Expressions**: `#if` condition evaluation ([`expr`])
//! - **Conditionals**: Nesting of `#if` blocks ([`conditional`])
//! - **Preprocessor**: Line by line driver tying it together ([`Preprocessor`])
//!
//! ## Example
//!
//! ```
//! use glsl_pp::{Preprocessor, TokenValue};
//!
//! let source = "#version 300 es\n#define TWICE(x) (x) * 2\nint y = TWICE(3);";
//! let tokens: Vec<_> = Preprocessor::new(source)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert!(matches!(tokens[0].value, TokenValue::Version(_)));
//! let text: Vec<String> = tokens[1..].iter().map(|t| t.value.to_string()).collect();
//! assert_eq!(text, vec!["int", "y", "=", "(", "3", ")", "*", "2", ";"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conditional;
pub mod config;
pub mod error;
pub mod expand;
pub mod expr;
pub mod lexer;
pub mod macros;
pub mod preprocessor;
pub mod token;

// Re-export main types
pub use config::{PreprocessorConfig, DEFAULT_MAX_EXPANSION_DEPTH};
pub use error::{LocatedError, PreprocessorError, Result};
pub use macros::{Define, MacroTable};
pub use preprocessor::{preprocess, Preprocessor};
pub use token::{Extension, Float, Integer, Location, Pragma, Punct, Token, TokenValue, Version};

/// glsl-pp version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
