mod cli;

use std::{fs, io, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser as CliParser;
use lago_lang::{Lexer, Parser, Source};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

use crate::cli::Cli;

fn main() -> Result<ExitCode> {
    // Logging setup
    let fmt_layer = fmt::layer();
    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()
        .context("error reading logging directives")?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let args = Cli::parse();
    let contents = fs::read_to_string(&args.input).context("error reading input file")?;
    let source = Source::new(args.input.display().to_string(), contents);

    let lexed = Lexer::new(source.contents()).lex();
    if let Some(err) = &lexed.error {
        source.fmt_diagnostic(err, io::stderr())?;
        return Ok(ExitCode::FAILURE);
    }
    let program = match Parser::new(&lexed.tokens).parse() {
        Ok(program) => program,
        Err(err) => {
            source.fmt_diagnostic(&err, io::stderr())?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let out = match lago_codegen::compile(&program) {
        Ok(out) => out,
        Err(err) => {
            source.fmt_diagnostic(&err, io::stderr())?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let out_path = args.out.unwrap_or_else(|| "out.wasm".into());
    fs::write(&out_path, &out.bytes).context("error writing module to out file")?;

    Ok(ExitCode::SUCCESS)
}
