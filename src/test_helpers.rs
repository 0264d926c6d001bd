#![cfg(any(test, feature = "test-helpers"))]
//! Test-only helpers for shared test utilities.

use crate::{
    bridge::NotificationSink,
    error::{RunError, StepFailure},
    model::Story,
    plan::PlanNode,
    reporter::{ExecutionEvent, StoryReporter},
    runner::StoryEngine,
};

/// One notification as observed by [`RecordingSink`], keyed by node label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// `started(node)`.
    Started(String),
    /// `finished(node)`.
    Finished(String),
    /// `failed(node, cause)` with the cause rendered through `Display`.
    Failed {
        /// Label of the failed node.
        node: String,
        /// Rendered cause.
        cause: String,
    },
    /// `ignored(node)`.
    Ignored(String),
}

/// Sink recording every notification in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    notifications: Vec<Notification>,
}

impl RecordingSink {
    /// Notifications received so far.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] { &self.notifications }

    /// Consume the sink and return its notifications.
    #[must_use]
    pub fn into_notifications(self) -> Vec<Notification> { self.notifications }
}

impl NotificationSink for RecordingSink {
    fn started(&mut self, node: &PlanNode) {
        self.notifications
            .push(Notification::Started(node.label().to_owned()));
    }

    fn finished(&mut self, node: &PlanNode) {
        self.notifications
            .push(Notification::Finished(node.label().to_owned()));
    }

    fn failed(&mut self, node: &PlanNode, failure: &StepFailure) {
        self.notifications.push(Notification::Failed {
            node: node.label().to_owned(),
            cause: failure.cause().to_string(),
        });
    }

    fn ignored(&mut self, node: &PlanNode) {
        self.notifications
            .push(Notification::Ignored(node.label().to_owned()));
    }
}

/// Engine that ignores the stories it is given and reports a fixed script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEngine {
    script: Vec<ExecutionEvent>,
    runs: Vec<Vec<String>>,
}

impl ScriptedEngine {
    /// Create an engine reporting `script` on every run.
    #[must_use]
    pub fn new(script: Vec<ExecutionEvent>) -> Self {
        Self {
            script,
            runs: Vec::new(),
        }
    }

    /// Story names handed to each run, in call order.
    #[must_use]
    pub fn runs(&self) -> &[Vec<String>] { &self.runs }
}

impl StoryEngine for ScriptedEngine {
    fn run(&mut self, stories: &[Story], reporter: &mut dyn StoryReporter) -> Result<(), RunError> {
        self.runs
            .push(stories.iter().map(|story| story.name.clone()).collect());
        for event in &self.script {
            event.dispatch(reporter)?;
        }
        Ok(())
    }
}
