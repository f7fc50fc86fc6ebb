use std::path::PathBuf;

use clap::Parser;

/// Compile a lago script to a WebAssembly module.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// The input file to compile.
    pub input: PathBuf,

    /// Where to write the compiled module.
    #[arg(short, value_name = "PATH")]
    pub out: Option<PathBuf>,
}
