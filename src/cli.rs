//! Command line interface for the `storyplan` binary.
//!
//! Kept free of library types so the build script can render the man page
//! from the same definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command line arguments for the `storyplan` binary.
#[derive(Debug, Parser)]
#[command(
    name = "storyplan",
    version,
    about = "Preview story test plans and replay execution traces against them"
)]
pub struct Cli {
    /// Report granularity. Falls back to `STORYPLAN_REPORT_LEVEL`, then `step`.
    #[arg(short, long, value_enum, global = true)]
    pub granularity: Option<Level>,

    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the `storyplan` binary.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the plan outline built from a JSON story model.
    Plan {
        /// JSON file with `stories`, `steps` and optional `keywords`.
        input: PathBuf,
    },
    /// Replay a JSON execution trace and print the resulting notifications.
    Replay {
        /// JSON file with `stories`, `steps` and optional `keywords`.
        input: PathBuf,
        /// JSON array of recorded execution events.
        trace: PathBuf,
    },
}

/// Granularity accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Level {
    /// One test per story.
    Story,
    /// Stories, scenarios, example rows and steps.
    Step,
}
