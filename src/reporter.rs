//! Execution callback surface and the passive logging reporter.
//!
//! The execution engine reports progress through [`StoryReporter`], one
//! synchronous call per lifecycle event, in execution order. Every method has
//! a no-op default so implementations only override what they observe.
//! [`ExecutionEvent`] is the recorded form of the same surface, used to replay
//! a fixed trace.

use std::time::Duration;

use log::{error, info, warn};

use crate::{
    error::{StepError, TraceMismatchError},
    model::{ExampleRow, ExamplesTable},
};

/// Outcome of a reporter callback.
pub type ReportResult = Result<(), TraceMismatchError>;

/// Receiver of execution lifecycle events.
///
/// Callbacks return [`ReportResult`] so that a reporter tracking plan
/// structure can reject events the plan did not anticipate. Plain observers
/// return `Ok(())`.
pub trait StoryReporter {
    /// A story starts. `given` marks a story executed as a dependency.
    fn before_story(&mut self, _story: &str, _given: bool) -> ReportResult { Ok(()) }

    /// The most recently started story ends.
    fn after_story(&mut self, _given_or_restarting: bool) -> ReportResult { Ok(()) }

    /// A scenario starts.
    fn before_scenario(&mut self, _title: &str) -> ReportResult { Ok(()) }

    /// The current scenario ends.
    fn after_scenario(&mut self) -> ReportResult { Ok(()) }

    /// A step is about to execute.
    fn before_step(&mut self, _step: &str) -> ReportResult { Ok(()) }

    /// The current step passed.
    fn successful(&mut self, _step: &str) -> ReportResult { Ok(()) }

    /// The current step failed with `cause`.
    fn failed(&mut self, _step: &str, _cause: &StepError) -> ReportResult { Ok(()) }

    /// A step was skipped after an earlier failure. No `before_step` precedes
    /// this call.
    fn not_performed(&mut self, _step: &str) -> ReportResult { Ok(()) }

    /// A step has no implementation. No `before_step` precedes this call.
    fn pending(&mut self, _step: &str) -> ReportResult { Ok(()) }

    /// An examples row starts.
    fn example(&mut self, _row: &ExampleRow) -> ReportResult { Ok(()) }

    /// The last examples row of the current scenario ended.
    fn after_examples(&mut self) -> ReportResult { Ok(()) }

    /// A story was excluded by `filter`.
    fn story_not_allowed(&mut self, _story: &str, _filter: &str) -> ReportResult { Ok(()) }

    /// A story was cancelled after running for `duration`.
    fn story_cancelled(&mut self, _story: &str, _duration: Duration) -> ReportResult { Ok(()) }

    /// A scenario was excluded by `filter`.
    fn scenario_not_allowed(&mut self, _title: &str, _filter: &str) -> ReportResult { Ok(()) }

    /// The given stories about to run for the current story or scenario.
    fn given_stories(&mut self, _paths: &[String]) -> ReportResult { Ok(()) }

    /// The examples table and steps about to run row by row.
    fn before_examples(&mut self, _steps: &[String], _table: &ExamplesTable) -> ReportResult {
        Ok(())
    }

    /// A step was ignored, for instance a comment.
    fn ignorable(&mut self, _step: &str) -> ReportResult { Ok(()) }

    /// A step is being retried after `cause`.
    fn restarted(&mut self, _step: &str, _cause: &StepError) -> ReportResult { Ok(()) }

    /// A story is being restarted after `cause`.
    fn restarted_story(&mut self, _story: &str, _cause: &StepError) -> ReportResult { Ok(()) }

    /// The run only resolves steps without executing them.
    fn dry_run(&mut self) -> ReportResult { Ok(()) }

    /// Step methods that have no implementation yet.
    fn pending_methods(&mut self, _methods: &[String]) -> ReportResult { Ok(()) }
}

/// Recorded form of one [`StoryReporter`] callback.
#[derive(Clone, Debug)]
pub enum ExecutionEvent {
    /// See [`StoryReporter::before_story`].
    BeforeStory { story: String, given: bool },
    /// See [`StoryReporter::after_story`].
    AfterStory { given_or_restarting: bool },
    /// See [`StoryReporter::before_scenario`].
    BeforeScenario { title: String },
    /// See [`StoryReporter::after_scenario`].
    AfterScenario,
    /// See [`StoryReporter::before_step`].
    BeforeStep { step: String },
    /// See [`StoryReporter::successful`].
    Successful { step: String },
    /// See [`StoryReporter::failed`].
    Failed { step: String, cause: StepError },
    /// See [`StoryReporter::not_performed`].
    NotPerformed { step: String },
    /// See [`StoryReporter::pending`].
    Pending { step: String },
    /// See [`StoryReporter::example`].
    Example { row: ExampleRow },
    /// See [`StoryReporter::after_examples`].
    AfterExamples,
    /// See [`StoryReporter::story_not_allowed`].
    StoryNotAllowed { story: String, filter: String },
    /// See [`StoryReporter::story_cancelled`].
    StoryCancelled { story: String, duration: Duration },
    /// See [`StoryReporter::scenario_not_allowed`].
    ScenarioNotAllowed { title: String, filter: String },
    /// See [`StoryReporter::given_stories`].
    GivenStories { paths: Vec<String> },
    /// See [`StoryReporter::before_examples`].
    BeforeExamples { steps: Vec<String>, table: ExamplesTable },
    /// See [`StoryReporter::ignorable`].
    Ignorable { step: String },
    /// See [`StoryReporter::restarted`].
    Restarted { step: String, cause: StepError },
    /// See [`StoryReporter::restarted_story`].
    RestartedStory { story: String, cause: StepError },
    /// See [`StoryReporter::dry_run`].
    DryRun,
    /// See [`StoryReporter::pending_methods`].
    PendingMethods { methods: Vec<String> },
}

impl ExecutionEvent {
    /// Name of the callback this event stands for.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeStory { .. } => "before_story",
            Self::AfterStory { .. } => "after_story",
            Self::BeforeScenario { .. } => "before_scenario",
            Self::AfterScenario => "after_scenario",
            Self::BeforeStep { .. } => "before_step",
            Self::Successful { .. } => "successful",
            Self::Failed { .. } => "failed",
            Self::NotPerformed { .. } => "not_performed",
            Self::Pending { .. } => "pending",
            Self::Example { .. } => "example",
            Self::AfterExamples => "after_examples",
            Self::StoryNotAllowed { .. } => "story_not_allowed",
            Self::StoryCancelled { .. } => "story_cancelled",
            Self::ScenarioNotAllowed { .. } => "scenario_not_allowed",
            Self::GivenStories { .. } => "given_stories",
            Self::BeforeExamples { .. } => "before_examples",
            Self::Ignorable { .. } => "ignorable",
            Self::Restarted { .. } => "restarted",
            Self::RestartedStory { .. } => "restarted_story",
            Self::DryRun => "dry_run",
            Self::PendingMethods { .. } => "pending_methods",
        }
    }

    /// Deliver this event to `reporter`.
    ///
    /// # Errors
    ///
    /// Propagates whatever the reporter returns.
    pub fn dispatch<R>(&self, reporter: &mut R) -> ReportResult
    where
        R: StoryReporter + ?Sized,
    {
        match self {
            Self::BeforeStory { story, given } => reporter.before_story(story, *given),
            Self::AfterStory {
                given_or_restarting,
            } => reporter.after_story(*given_or_restarting),
            Self::BeforeScenario { title } => reporter.before_scenario(title),
            Self::AfterScenario => reporter.after_scenario(),
            Self::BeforeStep { step } => reporter.before_step(step),
            Self::Successful { step } => reporter.successful(step),
            Self::Failed { step, cause } => reporter.failed(step, cause),
            Self::NotPerformed { step } => reporter.not_performed(step),
            Self::Pending { step } => reporter.pending(step),
            Self::Example { row } => reporter.example(row),
            Self::AfterExamples => reporter.after_examples(),
            Self::StoryNotAllowed { story, filter } => reporter.story_not_allowed(story, filter),
            Self::StoryCancelled { story, duration } => reporter.story_cancelled(story, *duration),
            Self::ScenarioNotAllowed { title, filter } => {
                reporter.scenario_not_allowed(title, filter)
            }
            Self::GivenStories { paths } => reporter.given_stories(paths),
            Self::BeforeExamples { steps, table } => reporter.before_examples(steps, table),
            Self::Ignorable { step } => reporter.ignorable(step),
            Self::Restarted { step, cause } => reporter.restarted(step, cause),
            Self::RestartedStory { story, cause } => reporter.restarted_story(story, cause),
            Self::DryRun => reporter.dry_run(),
            Self::PendingMethods { methods } => reporter.pending_methods(methods),
        }
    }
}

/// Reporter writing one `log` record per callback.
///
/// Lifecycle events log at `info`, skipped steps at `warn`, and failures,
/// pending steps and restarted stories at `error`. It never rejects an event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingReporter;

impl StoryReporter for LoggingReporter {
    fn before_story(&mut self, story: &str, given: bool) -> ReportResult {
        let marker = if given { " (given story)" } else { "" };
        info!("Before story: {story}{marker}");
        Ok(())
    }

    fn after_story(&mut self, _given_or_restarting: bool) -> ReportResult {
        info!("After story");
        Ok(())
    }

    fn before_scenario(&mut self, title: &str) -> ReportResult {
        info!("Before scenario: {title}");
        Ok(())
    }

    fn after_scenario(&mut self) -> ReportResult {
        info!("After scenario");
        Ok(())
    }

    fn before_step(&mut self, step: &str) -> ReportResult {
        info!("Before step: {step}");
        Ok(())
    }

    fn successful(&mut self, step: &str) -> ReportResult {
        info!("Successful step: {step}");
        Ok(())
    }

    fn failed(&mut self, step: &str, cause: &StepError) -> ReportResult {
        error!("Failed step: {step} cause: {cause}");
        Ok(())
    }

    fn not_performed(&mut self, step: &str) -> ReportResult {
        warn!("Not performed step: {step}");
        Ok(())
    }

    fn pending(&mut self, step: &str) -> ReportResult {
        error!("Pending step: {step}");
        Ok(())
    }

    fn example(&mut self, row: &ExampleRow) -> ReportResult {
        info!("Example: {row}");
        Ok(())
    }

    fn after_examples(&mut self) -> ReportResult {
        info!("After examples");
        Ok(())
    }

    fn story_not_allowed(&mut self, story: &str, filter: &str) -> ReportResult {
        info!("Story: {story} not allowed for filter: {filter}");
        Ok(())
    }

    fn story_cancelled(&mut self, story: &str, duration: Duration) -> ReportResult {
        info!("Story: {story} cancelled in: {}s", duration.as_secs());
        Ok(())
    }

    fn scenario_not_allowed(&mut self, title: &str, filter: &str) -> ReportResult {
        info!("Scenario: {title} not allowed by filter: {filter}");
        Ok(())
    }

    fn given_stories(&mut self, paths: &[String]) -> ReportResult {
        info!("Given stories: {paths:?}");
        Ok(())
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) -> ReportResult {
        info!(
            "Before steps: {steps:?} with example table: headers={:?}, rows={}",
            table.headers,
            table.len()
        );
        Ok(())
    }

    fn ignorable(&mut self, step: &str) -> ReportResult {
        info!("Ignorable step: {step}");
        Ok(())
    }

    fn restarted(&mut self, step: &str, cause: &StepError) -> ReportResult {
        info!("Restarted step: {step} because of: {cause}");
        Ok(())
    }

    fn restarted_story(&mut self, story: &str, cause: &StepError) -> ReportResult {
        error!("Restarted story: {story} because of: {cause}");
        Ok(())
    }

    fn dry_run(&mut self) -> ReportResult {
        info!("Dry run");
        Ok(())
    }

    fn pending_methods(&mut self, methods: &[String]) -> ReportResult {
        error!("Pending methods: {methods:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::{ExecutionEvent, ReportResult, StoryReporter};
    use crate::model::ExampleRow;

    #[derive(Default)]
    struct Names(Vec<String>);

    impl StoryReporter for Names {
        fn before_story(&mut self, story: &str, given: bool) -> ReportResult {
            self.0.push(format!("story:{story}:{given}"));
            Ok(())
        }

        fn example(&mut self, row: &ExampleRow) -> ReportResult {
            self.0.push(format!("example:{row}"));
            Ok(())
        }

        fn failed(&mut self, step: &str, cause: &crate::error::StepError) -> ReportResult {
            self.0.push(format!("failed:{step}:{cause}"));
            Ok(())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("bad")]
    struct Bad;

    #[test]
    fn dispatch_routes_to_matching_callback() {
        let events = [
            ExecutionEvent::BeforeStory {
                story: "Login".to_owned(),
                given: true,
            },
            ExecutionEvent::Example {
                row: ExampleRow::new([("user", "Bob")]),
            },
            ExecutionEvent::Failed {
                step: "Then x".to_owned(),
                cause: Arc::new(Bad),
            },
            ExecutionEvent::DryRun,
        ];
        let mut names = Names::default();
        for event in &events {
            event.dispatch(&mut names).expect("observer accepts events");
        }
        assert_eq!(
            names.0,
            ["story:Login:true", "example:{user=Bob}", "failed:Then x:bad"]
        );
    }

    #[rstest]
    #[case(ExecutionEvent::AfterScenario, "after_scenario")]
    #[case(ExecutionEvent::NotPerformed { step: String::new() }, "not_performed")]
    #[case(ExecutionEvent::PendingMethods { methods: Vec::new() }, "pending_methods")]
    fn names_follow_callbacks(#[case] event: ExecutionEvent, #[case] expected: &str) {
        assert_eq!(event.name(), expected);
    }
}
