//! Orchestration of a full run: resolve story paths, load stories, build the
//! plan once, then let the execution engine drive a bridge over it.
//!
//! Parsing story files and executing steps are delegated to the host through
//! [`StoryLoader`] and [`StoryEngine`].

use std::error::Error as StdError;

use tracing::{info, warn};

use crate::{
    bridge::{ExecutionBridge, NotificationSink},
    config::RunnerConfig,
    error::RunError,
    model::Story,
    plan::{Plan, PlanBuilder},
    reporter::StoryReporter,
    steps::StepRegistry,
};

/// Supplies the ordered story paths of a run.
pub trait StoryPathSource {
    /// Story paths in execution order.
    fn story_paths(&self) -> Vec<String>;
}

impl StoryPathSource for Vec<String> {
    fn story_paths(&self) -> Vec<String> { self.clone() }
}

impl StoryPathSource for [&str] {
    fn story_paths(&self) -> Vec<String> { self.iter().map(|path| (*path).to_owned()).collect() }
}

/// A source resolving to exactly one story.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleStory(pub String);

impl StoryPathSource for SingleStory {
    fn story_paths(&self) -> Vec<String> { vec![self.0.clone()] }
}

/// Turns a story path into a story model.
pub trait StoryLoader {
    /// Load the story at `path`.
    ///
    /// # Errors
    ///
    /// Returns the parser's error when the story cannot be read.
    fn load(&self, path: &str) -> Result<Story, Box<dyn StdError + Send + Sync>>;
}

/// Executes stories and reports progress through a [`StoryReporter`].
pub trait StoryEngine {
    /// Execute `stories` in order, reporting every lifecycle event.
    ///
    /// # Errors
    ///
    /// Implementations propagate reporter errors as [`RunError::Trace`] and
    /// wrap their own failures in [`RunError::Engine`].
    fn run(&mut self, stories: &[Story], reporter: &mut dyn StoryReporter) -> Result<(), RunError>;
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome<S> {
    /// The plan the run was reported against.
    pub plan: Plan,
    /// The sink after the last notification.
    pub sink: S,
}

/// Builds the plan for a set of stories and runs them through an engine.
///
/// # Examples
///
/// ```
/// use storyplan::{
///     config::{Granularity, RunnerConfig},
///     model::Story,
///     runner::StoryRunner,
///     steps::StepRegistry,
/// };
///
/// let registry = StepRegistry::new();
/// let runner = StoryRunner::new(&registry)
///     .with_config(RunnerConfig::default().with_granularity(Granularity::Story));
/// let plan = runner.plan(&[Story::new("Login.story")]).expect("plan builds");
/// assert_eq!(plan.step_count(), 1);
/// ```
#[derive(Debug)]
pub struct StoryRunner<'r> {
    registry: &'r StepRegistry,
    config: RunnerConfig,
}

impl<'r> StoryRunner<'r> {
    /// Create a runner with the default configuration.
    #[must_use]
    pub fn new(registry: &'r StepRegistry) -> Self {
        Self {
            registry,
            config: RunnerConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig { &self.config }

    /// Load every path of `source` with `loader`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Load`] for the first path that fails to load.
    pub fn load(
        &self,
        source: &(impl StoryPathSource + ?Sized),
        loader: &(impl StoryLoader + ?Sized),
    ) -> Result<Vec<Story>, RunError> {
        source
            .story_paths()
            .into_iter()
            .map(|path| {
                loader
                    .load(&path)
                    .map_err(|source| RunError::Load { path, source })
            })
            .collect()
    }

    /// Build the plan for `stories`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Plan`] when the story model is malformed.
    pub fn plan(&self, stories: &[Story]) -> Result<Plan, RunError> {
        Ok(PlanBuilder::new(self.registry)
            .with_config(self.config.clone())
            .build(stories)?)
    }

    /// Plan `stories`, then execute them with `engine` while a bridge turns
    /// the reported events into notifications on `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Plan`] before anything executes when the model is
    /// malformed, and otherwise whatever the engine returns.
    pub fn run_stories<S: NotificationSink>(
        &self,
        stories: &[Story],
        engine: &mut dyn StoryEngine,
        sink: S,
    ) -> Result<RunOutcome<S>, RunError> {
        let plan = self.plan(stories)?;
        info!(
            stories = stories.len(),
            steps = plan.step_count(),
            granularity = ?plan.granularity(),
            "running stories"
        );
        let sink = {
            let mut bridge = ExecutionBridge::new(&plan, sink);
            engine.run(stories, &mut bridge)?;
            if bridge.in_given_story() {
                warn!("run ended inside a given story");
            }
            bridge.into_sink()
        };
        Ok(RunOutcome { plan, sink })
    }

    /// Resolve, load, plan and execute the stories of `source`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load) and [`run_stories`](Self::run_stories).
    pub fn run<S: NotificationSink>(
        &self,
        source: &(impl StoryPathSource + ?Sized),
        loader: &(impl StoryLoader + ?Sized),
        engine: &mut dyn StoryEngine,
        sink: S,
    ) -> Result<RunOutcome<S>, RunError> {
        let stories = self.load(source, loader)?;
        self.run_stories(&stories, engine, sink)
    }
}
