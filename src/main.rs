use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::info;

use vmil_translator::{
    source,
    translator::{translate_program, EmitterOptions},
};

#[derive(Parser, Debug)]
#[command(
    name = "vmil",
    version,
    about = "Translate Hack VM code (.vm) to Hack assembly (.asm)"
)]
struct Cli {
    /// A .vm file, or a directory whose .vm files form one program
    path: PathBuf,

    /// Output file [default: <name>.asm beside the input]
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Skip the SP setup and entry call (single-file test programs)
    #[arg(long = "no-bootstrap", action = ArgAction::SetTrue)]
    no_bootstrap: bool,

    /// Function called by the bootstrap
    #[arg(long = "entry", value_name = "NAME", default_value = "Sys.init")]
    entry: String,

    /// Precede each translated command with a comment naming it
    #[arg(long = "annotate", action = ArgAction::SetTrue)]
    annotate: bool,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let files = source::collect(&cli.path)?
        .iter()
        .map(|path| source::load(path))
        .collect::<vmil_translator::Result<Vec<_>>>()?;

    let options = EmitterOptions {
        bootstrap: !cli.no_bootstrap,
        entry: cli.entry,
        annotate: cli.annotate,
    };
    let translation = translate_program(options, &files)?;

    let outfilename = cli
        .output
        .unwrap_or_else(|| source::output_path(&cli.path));
    let text: String = translation
        .iter()
        .map(|instruction| format!("{}\n", instruction))
        .collect();
    if let Err(err) = fs::write(&outfilename, text) {
        // Never leave a truncated program behind.
        let _ = fs::remove_file(&outfilename);
        return Err(err)
            .with_context(|| format!("Error while writing file: {}", outfilename.display()));
    }

    info!(
        "wrote {} line(s) from {} file(s) to {}",
        translation.len(),
        files.len(),
        outfilename.display()
    );
    Ok(())
}
