use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A tool to translate between trace filter models and query text
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for command results
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the command output to this file in addition to stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// When to colorize output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Print diagnostic information to stderr
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse query text and show the resulting filter
    Parse {
        /// Query text, e.g. '{ status = error && duration >= 100ms }'
        query: String,

        /// Show the raw token stream before clause classification
        #[arg(long)]
        tokens: bool,
    },
    /// Render a filter document (JSON or JSON5) as canonical query text
    Format {
        /// Path to the filter document
        file: PathBuf,
    },
    /// Verify that query text survives a parse/serialize round trip unchanged
    Check {
        /// Query text to round-trip
        query: String,
    },
    /// Assign deterministic palette colors to service names
    Colors {
        /// Service names to color
        #[arg(required = true)]
        services: Vec<String>,

        /// Services that should draw from the error color family
        #[arg(long = "error", value_name = "SERVICE")]
        errors: Vec<String>,

        /// Assign colors by palette index instead of by name
        #[arg(long)]
        indexed: bool,

        /// Path to a TOML palette config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// Machine-readable JSON output
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Colorize when stdout is a terminal
    Auto,
    /// Always colorize output
    Always,
    /// Never colorize output
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
