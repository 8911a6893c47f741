//! glsl-pp - GLSL preprocessor command line
//!
//! Tokenizes or preprocesses shader files, or runs an interactive session.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod logging;
mod repl;

use cli::{Args, Command};
use commands::Source;

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init_logging(args.verbose)?;

    let had_errors = match args.command {
        Command::Tokenize { file } => {
            let source = Source::read(&file)?;
            commands::tokenize(&source, &mut io::stdout().lock(), &mut io::stderr().lock())?
        }
        Command::Preprocess {
            file,
            json,
            options,
        } => {
            let source = Source::read(&file)?;
            commands::preprocess(
                &source,
                options.to_config()?,
                json,
                &mut io::stdout().lock(),
                &mut io::stderr().lock(),
            )?
        }
        Command::Repl { options } => {
            repl::run(options.to_config()?)?;
            false
        }
    };

    Ok(if had_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
