use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::debug;

use vmil2asm::parser;
use vmil2asm::translator::Translator;

#[derive(Parser, Debug)]
#[command(
    name = "vmil2asm",
    version,
    about = "Translates stack-machine VM bytecode into assembly for a 16-bit single-register machine"
)]
struct Cli {
    /// A single .vm source file, or a directory of .vm files
    input: PathBuf,

    /// Output file; defaults to the input path with an .asm extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the bootstrap prologue (stack pointer init plus a call to Sys.init)
    #[arg(long = "init", action = ArgAction::SetTrue)]
    init: bool,
}

/// Translation units in file-name order, so multi-unit output is stable.
fn collect_units(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(input)
        .with_context(|| format!("reading directory {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension() == Some(OsStr::new("vm")))
        .collect();
    if files.is_empty() {
        bail!("no .vm files in {}", input.display());
    }
    files.sort();
    Ok(files)
}

fn unit_name(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .with_context(|| format!("{} has no usable file stem", path.display()))
}

fn default_output(input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        let dirname = unit_name(input)?;
        Ok(input.join(format!("{}.asm", dirname)))
    } else {
        Ok(input.with_extension("asm"))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let files = collect_units(&cli.input)?;
    let mut translator = Translator::new();
    if cli.init {
        translator.emit_bootstrap();
    }

    for file in &files {
        let unit = unit_name(file)?;
        let source =
            fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        let commands =
            parser::parse(&source).with_context(|| format!("parsing unit `{}`", unit))?;
        debug!("unit `{}`: {} commands", unit, commands.len());

        translator.set_unit(unit);
        for command in &commands {
            translator
                .emit(command)
                .with_context(|| format!("translating `{}` in unit `{}`", command, unit))?;
        }
    }

    let outpath = match cli.output {
        Some(path) => path,
        None => default_output(&cli.input)?,
    };
    fs::write(&outpath, translator.finish())
        .with_context(|| format!("writing {}", outpath.display()))?;
    Ok(())
}
