// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tagflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tagflow",
    version,
    about = "Route tagged records through executable pipeline stages.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Tagflow.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Tagflow.toml")]
    pub config: String,

    /// Directory of stage executables (overrides `[pipeline].stages`).
    #[arg(long, value_name = "DIR")]
    pub stages: Option<String>,

    /// Directory of content files to process (overrides `[pipeline].content`).
    #[arg(long, value_name = "DIR")]
    pub content: Option<String>,

    /// Discover stages and print the tag graph, but process no content.
    ///
    /// Stage `config` verbs still run; that is where the graph comes from.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TAGFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
