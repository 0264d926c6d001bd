//! Error taxonomy for plan construction, trace replay and step failures.
//!
//! Plan construction and trace mismatches are fatal: the first aborts the
//! build before any notification is emitted, the second means the plan and
//! the executed structure diverged. Step failures are ordinary outcomes and
//! are reported to the notification sink instead of being propagated.

use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

/// Shared, type-erased cause of a failed step.
pub type StepError = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors raised while building a plan from a story model.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlanConstructionError {
    /// A child was added to a leaf node.
    #[error("plan node `{label}` is a leaf and cannot hold children")]
    LeafHasNoChildren {
        /// Label of the leaf that rejected the child.
        label: String,
    },
    /// A composite step declares a sub-step that no candidate matches.
    #[error("composite step `{composite}` declares unresolved sub-step `{step}`")]
    UnresolvedCompositeStep {
        /// Text of the composite step being expanded.
        composite: String,
        /// Sub-step text that could not be matched.
        step: String,
    },
    /// A composite step transitively composes itself.
    #[error("composite step `{step}` expands into itself")]
    CompositeCycle {
        /// Step text that re-entered its own expansion.
        step: String,
    },
    /// An examples row does not have one value per header.
    #[error("examples row {row} of scenario `{scenario}` has {found} values, expected {expected}")]
    MalformedExampleRow {
        /// Title of the scenario owning the table.
        scenario: String,
        /// Zero-based row index.
        row: usize,
        /// Number of headers declared by the table.
        expected: usize,
        /// Number of values found in the row.
        found: usize,
    },
    /// A story without a name cannot be matched during replay.
    #[error("story at position {index} has an empty name")]
    EmptyStoryName {
        /// Zero-based position of the story in the model.
        index: usize,
    },
}

/// Cursor scope named in trace mismatch diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorLevel {
    /// Top-level stories and bookends.
    Story,
    /// Scenario slots of the current story.
    Scenario,
    /// Flattened step slots of the current scenario.
    Step,
    /// Example rows of the current scenario.
    Example,
}

impl std::fmt::Display for CursorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Story => "story",
            Self::Scenario => "scenario",
            Self::Step => "step",
            Self::Example => "example",
        };
        f.write_str(name)
    }
}

/// Errors raised when a live event cannot be matched against the plan.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TraceMismatchError {
    /// The event needs a cursor that has not been opened.
    #[error("`{event}` arrived with no open {level} cursor")]
    NoActiveCursor {
        /// Callback that triggered the lookup.
        event: &'static str,
        /// Cursor scope that was required.
        level: CursorLevel,
    },
    /// The cursor has no slot left for the event.
    #[error("`{event}` found no {level} slot left under `{parent}`")]
    CursorExhausted {
        /// Callback that triggered the lookup.
        event: &'static str,
        /// Cursor scope that ran dry.
        level: CursorLevel,
        /// Label of the node whose children were exhausted.
        parent: String,
    },
    /// The next slot does not have the shape the event expects.
    #[error("`{event}` expected a {expected} slot but found `{found}`")]
    UnexpectedNode {
        /// Callback that consumed the slot.
        event: &'static str,
        /// Description of the expected slot.
        expected: &'static str,
        /// Label of the slot that was found instead.
        found: String,
    },
    /// The event refers to a node that is not open.
    #[error("`{event}` arrived with no current {level}")]
    NoCurrentNode {
        /// Callback that required an open node.
        event: &'static str,
        /// Scope of the missing node.
        level: CursorLevel,
    },
    /// The event would open or close a scope while a node inside it is
    /// still running.
    #[error("`{event}` arrived while {level} `{open}` is still open")]
    NodeStillOpen {
        /// Callback that found the open node.
        event: &'static str,
        /// Scope of the open node.
        level: CursorLevel,
        /// Label of the open node.
        open: String,
    },
}

/// A reported step failure, delivered to the sink with its unwrapped cause.
#[derive(Clone, Debug, Error)]
#[error("step `{step}` failed: {cause}")]
pub struct StepFailure {
    step: String,
    #[source]
    cause: StepError,
}

impl StepFailure {
    /// Create a failure for `step` caused by `cause`.
    #[must_use]
    pub fn new(step: impl Into<String>, cause: StepError) -> Self {
        Self {
            step: step.into(),
            cause,
        }
    }

    /// Text of the failed step as reported by the engine.
    #[must_use]
    pub fn step(&self) -> &str { &self.step }

    /// Underlying cause, with any [`CorrelatedFailure`] wrapper removed.
    #[must_use]
    pub fn cause(&self) -> &StepError { &self.cause }
}

/// Wrapper the execution engine uses to tag a failure with a correlation id.
///
/// The bridge strips one level of this wrapper before reporting, so sinks see
/// the error raised by the step itself.
#[derive(Clone, Debug, Error)]
#[error("{cause} [{correlation}]")]
pub struct CorrelatedFailure {
    correlation: String,
    #[source]
    cause: StepError,
}

impl CorrelatedFailure {
    /// Wrap `cause` under `correlation`.
    #[must_use]
    pub fn new(correlation: impl Into<String>, cause: StepError) -> Self {
        Self {
            correlation: correlation.into(),
            cause,
        }
    }

    /// Correlation identifier assigned by the engine.
    #[must_use]
    pub fn correlation(&self) -> &str { &self.correlation }

    /// The wrapped cause.
    #[must_use]
    pub fn inner(&self) -> &StepError { &self.cause }
}

/// Strip one [`CorrelatedFailure`] layer from `cause`, if present.
#[must_use]
pub fn unwrap_cause(cause: &StepError) -> StepError {
    let erased: &(dyn StdError + Send + Sync + 'static) = cause.as_ref();
    match erased.downcast_ref::<CorrelatedFailure>() {
        Some(wrapper) => Arc::clone(wrapper.inner()),
        None => Arc::clone(cause),
    }
}

/// Errors raised while reading runner configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested granularity is not `story` or `step`.
    #[error("unknown report granularity `{value}`; expected `story` or `step`")]
    UnknownGranularity {
        /// Value that failed to parse.
        value: String,
    },
}

/// Errors surfaced by [`StoryRunner`](crate::runner::StoryRunner).
#[derive(Debug, Error)]
pub enum RunError {
    /// The plan could not be built.
    #[error("plan construction failed: {0}")]
    Plan(#[from] PlanConstructionError),
    /// The execution trace diverged from the plan.
    #[error("execution trace diverged from plan: {0}")]
    Trace(#[from] TraceMismatchError),
    /// A story path could not be loaded into a model.
    #[error("failed to load story `{path}`: {source}")]
    Load {
        /// Path handed to the loader.
        path: String,
        /// Loader failure.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
    /// The execution engine aborted the run.
    #[error("story engine failed: {0}")]
    Engine(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

#[cfg(test)]
mod tests {
    use std::{error::Error as _, sync::Arc};

    use super::{CorrelatedFailure, StepError, StepFailure, unwrap_cause};

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn unwrap_cause_strips_correlation_wrapper() {
        let inner: StepError = Arc::new(Boom);
        let wrapped: StepError = Arc::new(CorrelatedFailure::new("id-1", Arc::clone(&inner)));
        let cause = unwrap_cause(&wrapped);
        assert!(Arc::ptr_eq(&cause, &inner));
    }

    #[test]
    fn unwrap_cause_keeps_plain_errors() {
        let inner: StepError = Arc::new(Boom);
        let cause = unwrap_cause(&inner);
        assert!(Arc::ptr_eq(&cause, &inner));
    }

    #[test]
    fn step_failure_exposes_cause_as_source() {
        let failure = StepFailure::new("Then it fails", Arc::new(Boom));
        assert_eq!(failure.to_string(), "step `Then it fails` failed: boom");
        assert_eq!(failure.source().map(ToString::to_string), Some("boom".to_owned()));
    }
}
