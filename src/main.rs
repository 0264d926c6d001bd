//! `storyplan` binary: plan preview and trace replay over JSON inputs.

mod cli;
mod preview;

use std::process::ExitCode;

use clap::Parser;
use storyplan::Granularity;

use crate::{
    cli::{Cli, Command, Level},
    preview::{PlanInput, PreviewError, TraceEvent, read_json, replay},
};

fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "storyplan failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PreviewError> {
    let granularity = match cli.granularity {
        Some(Level::Story) => Granularity::Story,
        Some(Level::Step) => Granularity::Step,
        None => Granularity::from_env()?,
    };
    match cli.command {
        Command::Plan { input } => {
            let input: PlanInput = read_json(&input)?;
            let plan = input.plan(granularity)?;
            print!("{plan}");
            println!("planned steps: {}", plan.step_count());
        }
        Command::Replay { input, trace } => {
            let input: PlanInput = read_json(&input)?;
            let events: Vec<TraceEvent> = read_json(&trace)?;
            let plan = input.plan(granularity)?;
            for line in replay(&plan, events)?.lines() {
                println!("{line}");
            }
        }
    }
    Ok(())
}
