mod config;
mod emitter;
mod explain;
mod fs;
mod grouper;
mod logging;
mod pipeline;
mod selector;
mod utils;

use std::{
    fmt::{self, Display},
    io::{IsTerminal, Write},
    path::PathBuf,
    process::ExitCode,
};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use config::Config;
use emitter::DESCRIPTOR_FILE_NAME;
use fs::Disk;
use utils::KVPairs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum EmitTarget {
    #[default]
    Files,
    Stdout,
    Explain,
}

impl Display for EmitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Files => "files",
            Self::Stdout => "stdout",
            Self::Explain => "explain",
        })
    }
}

/// [`EmitTarget`] with everything it needs checked up front.
enum Mode {
    Files(PathBuf),
    Stdout,
    Explain,
}

#[derive(Parser)]
#[command(name = "cxxtest-split", about)]
struct Cli {
    #[arg(
        long,
        default_value_t,
        value_name = "what",
        help = "What to emit: project directories, their descriptors on stdout, \
                or why tests were left out",
        next_line_help = true,
    )]
    emit: EmitTarget,
    #[arg(
        long,
        value_name = "path",
        help = "Path to the config file, searched for from the current directory if omitted",
    )]
    config_path: Option<PathBuf>,
    #[arg(
        long,
        default_value = "",
        value_name = "key1=val1,key2=val2...",
        help = "Set options from the command line, overriding the config file",
    )]
    config: KVPairs,
    #[arg(short, long, help = "Log every rejected file")]
    verbose: bool,
    #[arg(help = "Absolute path to the corpus root")]
    input: PathBuf,
    #[arg(help = "Where to create the projects, required when emitting files")]
    output: Option<PathBuf>,
}

pub fn main() -> anyhow::Result<ExitCode> {
    let Cli { emit, config_path, config, verbose, input, output } = Cli::parse();
    logging::init(verbose)?;

    let output = pipeline::check_roots(&input, output.as_deref())?;
    let mode = match emit {
        EmitTarget::Files => {
            Mode::Files(output.context("an output path is required when emitting files")?)
        }
        EmitTarget::Stdout => Mode::Stdout,
        EmitTarget::Explain => Mode::Explain,
    };
    let config = Config::fetch(config_path.as_deref(), &*config)?;
    let selection = pipeline::select(&Disk, &config, &input)?;

    match mode {
        Mode::Files(output) => {
            let projects = pipeline::plan(&selection.accepted, &config);
            let zip = pipeline::emit_all(&Disk, &config, &projects, &input, &output)?;
            println!("{zip}");
        }
        Mode::Stdout => {
            let mut stdout = std::io::stdout().lock();
            for project in pipeline::plan(&selection.accepted, &config) {
                write!(
                    stdout,
                    "{}/{DESCRIPTOR_FILE_NAME}:\n{}",
                    project.name,
                    project.descriptor(&config.template)
                )
                .context("failed to write to stdout")?;
            }
        }
        Mode::Explain => {
            let color = if std::io::stderr().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            };
            let mut stderr = StandardStream::stderr(color);
            let n = explain::explain(&Disk, &selection.rejected, &mut stderr)?;
            tracing::info!(explained = n, "explained the rejections");
        }
    }
    Ok(ExitCode::SUCCESS)
}
