//! CLI argument definitions.
//!
//! Everything after the options is handed to the builder as one invocation:
//! an optional action name followed by `key=value`, `--flag` and
//! `--no-flag` words.

use clap::Parser;
use std::path::PathBuf;

/// modbuild - Build, test and install software distributions.
#[derive(Debug, Parser)]
#[command(name = "modbuild")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Run 'modbuild help' to list the available actions.")]
pub struct Cli {
    /// Distribution root (defaults to the nearest directory with modbuild.yml)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Ignore the user rc file
    #[arg(long)]
    pub no_rc: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Action followed by property arguments, e.g. `install destdir=/tmp/stage`
    #[arg(
        value_name = "ACTION [ARGS]",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}
