//! JSON-driven plan preview and trace replay for the binary.

use std::{fs, path::Path, sync::Arc};

use serde::{Deserialize, de::DeserializeOwned};
use storyplan::{
    ConfigError,
    ExecutionBridge,
    ExecutionEvent,
    Granularity,
    NotificationSink,
    Plan,
    PlanBuilder,
    PlanConstructionError,
    PlanNode,
    RunnerConfig,
    StepFailure,
    StepRegistry,
    TraceMismatchError,
    keywords::Keywords,
    model::{ExampleRow, Story},
    steps::PatternStep,
};
use thiserror::Error;

/// Errors reported by the binary.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// An input file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// An input file is not valid JSON for its role.
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// `STORYPLAN_REPORT_LEVEL` holds an unknown value.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The story model is malformed.
    #[error(transparent)]
    Plan(#[from] PlanConstructionError),
    /// The trace does not fit the plan.
    #[error(transparent)]
    Trace(#[from] TraceMismatchError),
}

/// Story model plus the step definitions to plan it with.
#[derive(Debug, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub keywords: Option<Keywords>,
    #[serde(default)]
    pub steps: Vec<PatternStep>,
    pub stories: Vec<Story>,
}

impl PlanInput {
    fn registry(&self) -> StepRegistry {
        self.steps
            .iter()
            .cloned()
            .map(|step| match &self.keywords {
                Some(keywords) => step.with_keywords(keywords.clone()),
                None => step,
            })
            .collect()
    }

    /// Build the plan at `granularity`.
    ///
    /// # Errors
    ///
    /// Propagates plan construction failures.
    pub fn plan(&self, granularity: Granularity) -> Result<Plan, PlanConstructionError> {
        let mut config = RunnerConfig::default().with_granularity(granularity);
        if let Some(keywords) = &self.keywords {
            config = config.with_keywords(keywords.clone());
        }
        PlanBuilder::new(&self.registry())
            .with_config(config)
            .build(&self.stories)
    }
}

/// Serialised form of the execution events a trace file may contain.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    BeforeStory {
        story: String,
        #[serde(default)]
        given: bool,
    },
    AfterStory {
        #[serde(default)]
        given_or_restarting: bool,
    },
    BeforeScenario {
        title: String,
    },
    AfterScenario,
    BeforeStep {
        step: String,
    },
    Successful {
        step: String,
    },
    Failed {
        step: String,
        message: String,
    },
    NotPerformed {
        step: String,
    },
    Pending {
        step: String,
    },
    Example {
        row: ExampleRow,
    },
    AfterExamples,
}

#[derive(Debug, Error)]
#[error("{0}")]
struct RecordedFailure(String);

impl From<TraceEvent> for ExecutionEvent {
    fn from(event: TraceEvent) -> Self {
        match event {
            TraceEvent::BeforeStory { story, given } => Self::BeforeStory { story, given },
            TraceEvent::AfterStory {
                given_or_restarting,
            } => Self::AfterStory {
                given_or_restarting,
            },
            TraceEvent::BeforeScenario { title } => Self::BeforeScenario { title },
            TraceEvent::AfterScenario => Self::AfterScenario,
            TraceEvent::BeforeStep { step } => Self::BeforeStep { step },
            TraceEvent::Successful { step } => Self::Successful { step },
            TraceEvent::Failed { step, message } => Self::Failed {
                step,
                cause: Arc::new(RecordedFailure(message)),
            },
            TraceEvent::NotPerformed { step } => Self::NotPerformed { step },
            TraceEvent::Pending { step } => Self::Pending { step },
            TraceEvent::Example { row } => Self::Example { row },
            TraceEvent::AfterExamples => Self::AfterExamples,
        }
    }
}

/// Sink rendering each notification as one line.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    /// Rendered lines in notification order.
    pub fn lines(&self) -> &[String] { &self.lines }
}

impl NotificationSink for Transcript {
    fn started(&mut self, node: &PlanNode) { self.lines.push(format!("started  {}", node.label())); }

    fn finished(&mut self, node: &PlanNode) {
        self.lines.push(format!("finished {}", node.label()));
    }

    fn failed(&mut self, node: &PlanNode, failure: &StepFailure) {
        self.lines
            .push(format!("failed   {}: {}", node.label(), failure.cause()));
    }

    fn ignored(&mut self, node: &PlanNode) { self.lines.push(format!("ignored  {}", node.label())); }
}

/// Replay `events` against `plan`.
///
/// # Errors
///
/// Returns the first trace mismatch.
pub fn replay(plan: &Plan, events: Vec<TraceEvent>) -> Result<Transcript, TraceMismatchError> {
    let events: Vec<ExecutionEvent> = events.into_iter().map(ExecutionEvent::from).collect();
    let mut bridge = ExecutionBridge::new(plan, Transcript::default());
    bridge.replay(&events)?;
    Ok(bridge.into_sink())
}

/// Read and deserialise the JSON file at `path`.
///
/// # Errors
///
/// Returns [`PreviewError::Read`] or [`PreviewError::Parse`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PreviewError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| PreviewError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PreviewError::Parse {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use storyplan::Granularity;

    use super::{PlanInput, TraceEvent, replay};

    #[fixture]
    fn input() -> PlanInput {
        serde_json::from_str(
            r#"{
                "steps": [
                    {"keyword": "Given", "pattern": "say Hello", "owner": "TestSteps"},
                    {"keyword": "When", "pattern": "Sign in user $name"}
                ],
                "stories": [{
                    "name": "Login.story",
                    "scenarios": [{
                        "title": "Successful login",
                        "steps": ["Given say Hello", "When Sign in user Bob"]
                    }]
                }]
            }"#,
        )
        .expect("valid input")
    }

    #[rstest]
    fn plans_json_input(input: PlanInput) {
        let plan = input.plan(Granularity::Step).expect("plan builds");
        assert_eq!(plan.step_count(), 2);
        assert!(plan.to_string().contains("- Given say Hello [TestSteps]"));
    }

    #[rstest]
    fn replays_json_trace(input: PlanInput) {
        let plan = input.plan(Granularity::Step).expect("plan builds");
        let events: Vec<TraceEvent> = serde_json::from_str(
            r#"[
                {"event": "before_story", "story": "Login.story"},
                {"event": "before_scenario", "title": "Successful login"},
                {"event": "before_step", "step": "Given say Hello"},
                {"event": "successful", "step": "Given say Hello"},
                {"event": "before_step", "step": "When Sign in user Bob"},
                {"event": "failed", "step": "When Sign in user Bob", "message": "no Bob"},
                {"event": "after_scenario"},
                {"event": "after_story"}
            ]"#,
        )
        .expect("valid trace");
        let transcript = replay(&plan, events).expect("trace matches");
        assert_eq!(transcript.lines().len(), 9);
        assert_eq!(transcript.lines()[5], "failed   When Sign in user Bob: no Bob");
    }
}
