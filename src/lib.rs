#![doc(html_root_url = "https://docs.rs/storyplan/latest")]
//! Public API for the `storyplan` library.
//!
//! This crate compiles behavioural story models into an immutable test plan
//! and replays live execution events against that plan, turning them into
//! per-node start, finish, failure and ignore notifications.
//!
//! A run has two phases:
//!
//! 1. [`PlanBuilder`] turns stories, scenarios, example rows and composite
//!    steps into a [`Plan`] whose labels are unique.
//! 2. [`ExecutionBridge`] receives the engine's callbacks through
//!    [`StoryReporter`] and walks forward-only cursors over the plan, driving a
//!    [`NotificationSink`].
//!
//! [`StoryRunner`](runner::StoryRunner) wires both phases to a host's story
//! loader and execution engine.

pub mod bridge;
pub mod config;
pub mod dedup;
pub mod error;
pub mod keywords;
pub mod label;
pub mod model;
pub mod plan;
pub mod reporter;
pub mod runner;
pub mod steps;
pub mod test_helpers;

pub use bridge::{ExecutionBridge, NotificationSink};
pub use config::{Granularity, RunnerConfig};
pub use error::{
    ConfigError,
    CorrelatedFailure,
    PlanConstructionError,
    RunError,
    StepError,
    StepFailure,
    TraceMismatchError,
};
pub use plan::{OwnerKind, Plan, PlanBuilder, PlanNode};
pub use reporter::{ExecutionEvent, LoggingReporter, StoryReporter};
pub use steps::{PatternStep, StepCandidate, StepRegistry};
