//! Replays live execution events against a prebuilt [`Plan`].
//!
//! [`ExecutionBridge`] implements [`StoryReporter`]. Each callback is first
//! forwarded to a [`LoggingReporter`], then, unless a given story is running,
//! matched against the plan by advancing forward-only cursors. Matched slots
//! are announced to a [`NotificationSink`].
//!
//! The plan and the event stream are coupled only through traversal order.
//! When the stream asks for a slot the plan does not have, or for a slot of
//! the wrong shape, the bridge returns a [`TraceMismatchError`] instead of
//! guessing.

mod cursor;

use std::collections::HashSet;

use tracing::{debug, warn};

use self::cursor::Cursor;
use crate::{
    config::Granularity,
    dedup::is_variant_of,
    error::{CursorLevel, StepError, StepFailure, TraceMismatchError, unwrap_cause},
    label::{normalize_story_name, story_label},
    model::{ExampleRow, ExamplesTable},
    plan::{ContainerRole, OwnerKind, Plan, PlanNode},
    reporter::{ExecutionEvent, LoggingReporter, ReportResult, StoryReporter},
};

/// Receiver of per-node test notifications.
///
/// Every `started` is eventually paired with one `finished` for the same
/// node unless the run is aborted. `ignored` nodes are never started.
pub trait NotificationSink {
    /// `node` began executing.
    fn started(&mut self, node: &PlanNode);

    /// `node` completed, successfully or not.
    fn finished(&mut self, node: &PlanNode);

    /// `node` failed; `finished` follows.
    fn failed(&mut self, node: &PlanNode, failure: &StepFailure);

    /// `node` was skipped.
    fn ignored(&mut self, node: &PlanNode);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &mut T {
    fn started(&mut self, node: &PlanNode) { (**self).started(node); }

    fn finished(&mut self, node: &PlanNode) { (**self).finished(node); }

    fn failed(&mut self, node: &PlanNode, failure: &StepFailure) { (**self).failed(node, failure); }

    fn ignored(&mut self, node: &PlanNode) { (**self).ignored(node); }
}

/// Whether notifications are currently suppressed by a running given story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GivenStoryState<'p> {
    Normal,
    /// A given story is executing. `slot` is the reserved leaf finished when
    /// the outermost given story ends; `depth` counts nested given stories.
    InGivenStory {
        slot: Option<&'p PlanNode>,
        depth: usize,
    },
}

#[derive(Debug)]
struct StoryFrame<'p> {
    node: &'p PlanNode,
    /// Open for story containers only.
    slots: Option<Cursor<'p>>,
}

#[derive(Debug)]
struct ScenarioFrame<'p> {
    node: &'p PlanNode,
    steps: Cursor<'p>,
    examples: Cursor<'p>,
    example: Option<&'p PlanNode>,
    step: Option<&'p PlanNode>,
}

/// Drives a [`NotificationSink`] from execution callbacks.
///
/// # Examples
///
/// ```
/// use storyplan::{
///     bridge::{ExecutionBridge, NotificationSink},
///     error::StepFailure,
///     model::{Scenario, Story},
///     plan::{PlanBuilder, PlanNode},
///     reporter::StoryReporter,
///     steps::{PatternStep, StepRegistry},
/// };
///
/// #[derive(Default)]
/// struct Started(Vec<String>);
///
/// impl NotificationSink for Started {
///     fn started(&mut self, node: &PlanNode) { self.0.push(node.label().to_owned()); }
///     fn finished(&mut self, _node: &PlanNode) {}
///     fn failed(&mut self, _node: &PlanNode, _failure: &StepFailure) {}
///     fn ignored(&mut self, _node: &PlanNode) {}
/// }
///
/// let registry = StepRegistry::new().with(PatternStep::new("Given", "say Hello"));
/// let stories = [Story::new("Greeting.story")
///     .with_scenario(Scenario::new("Hello").with_steps(["Given say Hello"]))];
/// let plan = PlanBuilder::new(&registry).build(&stories).expect("plan builds");
///
/// let mut bridge = ExecutionBridge::new(&plan, Started::default());
/// bridge.before_story("Greeting.story", false).expect("story is planned");
/// bridge.before_scenario("Hello").expect("scenario is planned");
/// bridge.before_step("Given say Hello").expect("step is planned");
/// bridge.successful("Given say Hello").expect("step is open");
///
/// assert_eq!(
///     bridge.into_sink().0,
///     ["Story: Greeting", "Scenario Hello", "Given say Hello"]
/// );
/// ```
#[derive(Debug)]
pub struct ExecutionBridge<'p, S> {
    plan: &'p Plan,
    sink: S,
    logger: LoggingReporter,
    state: GivenStoryState<'p>,
    consumed_stories: HashSet<usize>,
    story: Option<StoryFrame<'p>>,
    scenario: Option<ScenarioFrame<'p>>,
}

impl<'p, S: NotificationSink> ExecutionBridge<'p, S> {
    /// Create a bridge replaying events against `plan` into `sink`.
    #[must_use]
    pub fn new(plan: &'p Plan, sink: S) -> Self {
        Self {
            plan,
            sink,
            logger: LoggingReporter,
            state: GivenStoryState::Normal,
            consumed_stories: HashSet::new(),
            story: None,
            scenario: None,
        }
    }

    /// The plan events are matched against.
    #[must_use]
    pub fn plan(&self) -> &'p Plan { self.plan }

    /// Borrow the sink.
    #[must_use]
    pub fn sink(&self) -> &S { &self.sink }

    /// Consume the bridge and return the sink.
    #[must_use]
    pub fn into_sink(self) -> S { self.sink }

    /// Whether a given story is currently executing.
    #[must_use]
    pub fn in_given_story(&self) -> bool {
        matches!(self.state, GivenStoryState::InGivenStory { .. })
    }

    /// Dispatch every event of `events` in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first [`TraceMismatchError`].
    pub fn replay<'e, I>(&mut self, events: I) -> ReportResult
    where
        I: IntoIterator<Item = &'e ExecutionEvent>,
    {
        for event in events {
            event.dispatch(&mut *self)?;
        }
        Ok(())
    }

    fn tracks_steps(&self) -> bool {
        self.state == GivenStoryState::Normal && self.plan.granularity() == Granularity::Step
    }

    fn start(&mut self, event: &'static str, node: &'p PlanNode) {
        debug!(event, slot = node.label(), "plan slot started");
        self.sink.started(node);
    }

    fn finish(&mut self, event: &'static str, node: &'p PlanNode) {
        debug!(event, slot = node.label(), "plan slot finished");
        self.sink.finished(node);
    }

    /// First unconsumed top-level slot standing for the story `name`.
    fn find_story(&self, name: &str) -> Option<(usize, &'p PlanNode)> {
        let stem = normalize_story_name(name);
        let label = story_label(stem);
        self.plan
            .root()
            .children()
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.consumed_stories.contains(index))
            .find(|(_, node)| {
                if node.is_leaf_of(&OwnerKind::Bookend) {
                    is_variant_of(node.label(), stem)
                } else {
                    (node.has_role(ContainerRole::Story) || node.is_leaf_of(&OwnerKind::Story))
                        && is_variant_of(node.label(), &label)
                }
            })
    }

    fn enter_story(&mut self, name: &str) -> ReportResult {
        const EVENT: &str = "before_story";
        if let Some(frame) = &self.story {
            return Err(TraceMismatchError::NodeStillOpen {
                event: EVENT,
                level: CursorLevel::Story,
                open: frame.node.label().to_owned(),
            });
        }
        let Some((index, node)) = self.find_story(name) else {
            warn!(story = name, "story is not part of the plan; not reported");
            return Ok(());
        };
        self.consumed_stories.insert(index);
        self.start(EVENT, node);
        let slots = node
            .has_role(ContainerRole::Story)
            .then(|| Cursor::children(node, CursorLevel::Scenario));
        self.story = Some(StoryFrame { node, slots });
        Ok(())
    }

    /// Reject `event` while a scenario is running.
    fn ensure_no_open_scenario(&self, event: &'static str) -> ReportResult {
        match &self.scenario {
            Some(frame) => Err(TraceMismatchError::NodeStillOpen {
                event,
                level: CursorLevel::Scenario,
                open: frame.node.label().to_owned(),
            }),
            None => Ok(()),
        }
    }

    fn enter_given_story(&mut self) -> ReportResult {
        const EVENT: &str = "before_story";
        if self.plan.granularity() == Granularity::Story {
            self.state = GivenStoryState::InGivenStory {
                slot: None,
                depth: 1,
            };
            return Ok(());
        }
        let cursor = match (&mut self.scenario, &mut self.story) {
            (Some(scenario), _) => &mut scenario.steps,
            (None, Some(StoryFrame { slots: Some(slots), .. })) => slots,
            (None, _) => {
                return Err(TraceMismatchError::NoActiveCursor {
                    event: EVENT,
                    level: CursorLevel::Scenario,
                });
            }
        };
        let slot = cursor.advance(EVENT)?;
        if !slot.is_leaf_of(&OwnerKind::GivenStory) {
            return Err(TraceMismatchError::UnexpectedNode {
                event: EVENT,
                expected: "given-story",
                found: slot.label().to_owned(),
            });
        }
        self.start(EVENT, slot);
        self.state = GivenStoryState::InGivenStory {
            slot: Some(slot),
            depth: 1,
        };
        Ok(())
    }

    fn scenario_mut(
        &mut self,
        event: &'static str,
        level: CursorLevel,
    ) -> Result<&mut ScenarioFrame<'p>, TraceMismatchError> {
        self.scenario
            .as_mut()
            .ok_or(TraceMismatchError::NoActiveCursor { event, level })
    }

    /// Consume the next step slot; given-story slots are never steps.
    fn next_step(&mut self, event: &'static str) -> Result<&'p PlanNode, TraceMismatchError> {
        let frame = self.scenario_mut(event, CursorLevel::Step)?;
        let node = frame.steps.advance(event)?;
        if node.is_leaf_of(&OwnerKind::GivenStory) {
            return Err(TraceMismatchError::UnexpectedNode {
                event,
                expected: "step",
                found: node.label().to_owned(),
            });
        }
        frame.step = Some(node);
        Ok(node)
    }

    fn current_step(&self, event: &'static str) -> Result<&'p PlanNode, TraceMismatchError> {
        self.scenario
            .as_ref()
            .and_then(|frame| frame.step)
            .ok_or(TraceMismatchError::NoCurrentNode {
                event,
                level: CursorLevel::Step,
            })
    }

    fn skip_step(&mut self, event: &'static str) -> ReportResult {
        let node = self.next_step(event)?;
        debug!(event, slot = node.label(), "plan slot ignored");
        self.sink.ignored(node);
        Ok(())
    }
}

impl<S: NotificationSink> StoryReporter for ExecutionBridge<'_, S> {
    fn before_story(&mut self, story: &str, given: bool) -> ReportResult {
        self.logger.before_story(story, given)?;
        if let GivenStoryState::InGivenStory { depth, .. } = &mut self.state {
            *depth += 1;
            return Ok(());
        }
        if given {
            return self.enter_given_story();
        }
        self.enter_story(story)
    }

    fn after_story(&mut self, given_or_restarting: bool) -> ReportResult {
        const EVENT: &str = "after_story";
        self.logger.after_story(given_or_restarting)?;
        match self.state {
            GivenStoryState::InGivenStory { slot, depth } if depth > 1 => {
                self.state = GivenStoryState::InGivenStory {
                    slot,
                    depth: depth - 1,
                };
            }
            GivenStoryState::InGivenStory { slot, .. } => {
                self.state = GivenStoryState::Normal;
                if let Some(slot) = slot {
                    self.finish(EVENT, slot);
                }
            }
            GivenStoryState::Normal => {
                self.ensure_no_open_scenario(EVENT)?;
                if let Some(frame) = self.story.take() {
                    self.finish(EVENT, frame.node);
                }
            }
        }
        Ok(())
    }

    fn before_scenario(&mut self, title: &str) -> ReportResult {
        const EVENT: &str = "before_scenario";
        self.logger.before_scenario(title)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        self.ensure_no_open_scenario(EVENT)?;
        let cursor = self
            .story
            .as_mut()
            .and_then(|frame| frame.slots.as_mut())
            .ok_or(TraceMismatchError::NoActiveCursor {
                event: EVENT,
                level: CursorLevel::Scenario,
            })?;
        let node = cursor.advance(EVENT)?;
        if !node.has_role(ContainerRole::Scenario) {
            return Err(TraceMismatchError::UnexpectedNode {
                event: EVENT,
                expected: "scenario",
                found: node.label().to_owned(),
            });
        }
        self.start(EVENT, node);
        self.scenario = Some(ScenarioFrame {
            node,
            steps: Cursor::steps(node),
            examples: Cursor::examples(node),
            example: None,
            step: None,
        });
        Ok(())
    }

    fn after_scenario(&mut self) -> ReportResult {
        const EVENT: &str = "after_scenario";
        self.logger.after_scenario()?;
        if !self.tracks_steps() {
            return Ok(());
        }
        let frame = self.scenario.take().ok_or(TraceMismatchError::NoCurrentNode {
            event: EVENT,
            level: CursorLevel::Scenario,
        })?;
        if let Some(row) = frame.example {
            self.scenario = Some(frame);
            return Err(TraceMismatchError::NodeStillOpen {
                event: EVENT,
                level: CursorLevel::Example,
                open: row.label().to_owned(),
            });
        }
        let remaining = frame.steps.remaining();
        if remaining > 0 {
            warn!(
                scenario = frame.node.label(),
                remaining, "scenario ended with unconsumed step slots"
            );
        }
        self.finish(EVENT, frame.node);
        Ok(())
    }

    fn before_step(&mut self, step: &str) -> ReportResult {
        const EVENT: &str = "before_step";
        self.logger.before_step(step)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        let node = self.next_step(EVENT)?;
        self.start(EVENT, node);
        Ok(())
    }

    fn successful(&mut self, step: &str) -> ReportResult {
        const EVENT: &str = "successful";
        self.logger.successful(step)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        let node = self.current_step(EVENT)?;
        self.finish(EVENT, node);
        Ok(())
    }

    fn failed(&mut self, step: &str, cause: &StepError) -> ReportResult {
        const EVENT: &str = "failed";
        let cause = unwrap_cause(cause);
        self.logger.failed(step, &cause)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        let node = self.current_step(EVENT)?;
        debug!(event = EVENT, slot = node.label(), "plan slot failed");
        self.sink.failed(node, &StepFailure::new(step, cause));
        self.finish(EVENT, node);
        Ok(())
    }

    fn not_performed(&mut self, step: &str) -> ReportResult {
        self.logger.not_performed(step)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        self.skip_step("not_performed")
    }

    fn pending(&mut self, step: &str) -> ReportResult {
        self.logger.pending(step)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        self.skip_step("pending")
    }

    fn example(&mut self, row: &ExampleRow) -> ReportResult {
        const EVENT: &str = "example";
        self.logger.example(row)?;
        if !self.tracks_steps() {
            return Ok(());
        }
        let frame = self.scenario_mut(EVENT, CursorLevel::Example)?;
        let previous = frame.example.take();
        let node = frame.examples.advance(EVENT)?;
        frame.example = Some(node);
        if let Some(previous) = previous {
            self.finish(EVENT, previous);
        }
        self.start(EVENT, node);
        Ok(())
    }

    fn after_examples(&mut self) -> ReportResult {
        const EVENT: &str = "after_examples";
        self.logger.after_examples()?;
        if !self.tracks_steps() {
            return Ok(());
        }
        let node = self
            .scenario
            .as_mut()
            .and_then(|frame| frame.example.take())
            .ok_or(TraceMismatchError::NoCurrentNode {
                event: EVENT,
                level: CursorLevel::Example,
            })?;
        self.finish(EVENT, node);
        Ok(())
    }

    fn story_not_allowed(&mut self, story: &str, filter: &str) -> ReportResult {
        self.logger.story_not_allowed(story, filter)
    }

    fn story_cancelled(&mut self, story: &str, duration: std::time::Duration) -> ReportResult {
        self.logger.story_cancelled(story, duration)
    }

    fn scenario_not_allowed(&mut self, title: &str, filter: &str) -> ReportResult {
        self.logger.scenario_not_allowed(title, filter)
    }

    fn given_stories(&mut self, paths: &[String]) -> ReportResult { self.logger.given_stories(paths) }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) -> ReportResult {
        self.logger.before_examples(steps, table)
    }

    fn ignorable(&mut self, step: &str) -> ReportResult { self.logger.ignorable(step) }

    fn restarted(&mut self, step: &str, cause: &StepError) -> ReportResult {
        self.logger.restarted(step, cause)
    }

    fn restarted_story(&mut self, story: &str, cause: &StepError) -> ReportResult {
        self.logger.restarted_story(story, cause)
    }

    fn dry_run(&mut self) -> ReportResult { self.logger.dry_run() }

    fn pending_methods(&mut self, methods: &[String]) -> ReportResult {
        self.logger.pending_methods(methods)
    }
}
