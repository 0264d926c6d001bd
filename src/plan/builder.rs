//! Compiles a story model into a [`Plan`].

use tracing::debug;

use super::{ContainerRole, OwnerKind, Plan, PlanNode};
use crate::{
    config::{Granularity, RunnerConfig},
    dedup::NameDeduplicator,
    error::PlanConstructionError,
    keywords::Keywords,
    label::{
        AFTER_STORIES,
        BEFORE_STORIES,
        example_label,
        normalize_step_text,
        normalize_story_name,
        scenario_label,
        story_label,
    },
    model::{ExampleRow, ExamplesTable, Scenario, Story},
    steps::StepRegistry,
};

/// Builds plans from a story model and a step registry.
///
/// Each call to [`build`](Self::build) uses a fresh [`NameDeduplicator`], so
/// repeated builds over the same inputs yield identical trees.
///
/// # Examples
///
/// ```
/// use storyplan::{
///     model::{Scenario, Story},
///     plan::PlanBuilder,
///     steps::{PatternStep, StepRegistry},
/// };
///
/// let registry = StepRegistry::new().with(PatternStep::new("Given", "say Hello"));
/// let stories = [Story::new("Greeting.story")
///     .with_scenario(Scenario::new("Hello").with_steps(["Given say Hello"]))];
/// let plan = PlanBuilder::new(&registry).build(&stories).expect("plan builds");
/// assert_eq!(plan.step_count(), 1);
/// ```
#[derive(Debug)]
pub struct PlanBuilder<'r> {
    registry: &'r StepRegistry,
    config: RunnerConfig,
}

impl<'r> PlanBuilder<'r> {
    /// Create a builder resolving steps against `registry` with default
    /// configuration.
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

    /// Shorthand for switching granularity only.
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.config = self.config.with_granularity(granularity);
        self
    }

    /// Build the plan for `stories`.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanConstructionError`] for malformed models: unnamed
    /// stories, ragged examples rows, composite steps with unresolved or
    /// cyclic sub-steps. No partial plan is returned.
    pub fn build(&self, stories: &[Story]) -> Result<Plan, PlanConstructionError> {
        if let Some(index) = stories.iter().position(|story| story.name.trim().is_empty()) {
            return Err(PlanConstructionError::EmptyStoryName { index });
        }
        let granularity = self.config.granularity();
        let mut session = BuildSession {
            registry: self.registry,
            keywords: self.config.keywords(),
            names: NameDeduplicator::new(),
            step_count: 0,
        };
        let root = session.root(self.config.root_label(), stories, granularity)?;
        debug!(
            ?granularity,
            stories = stories.len(),
            steps = session.step_count,
            "built story plan"
        );
        Ok(Plan::new(granularity, root, session.step_count))
    }
}

struct BuildSession<'b> {
    registry: &'b StepRegistry,
    keywords: &'b Keywords,
    names: NameDeduplicator,
    step_count: usize,
}

/// Keyword context threaded through the steps of one scenario or example.
type PreviousKeyword = Option<String>;

impl BuildSession<'_> {
    fn root(
        &mut self,
        root_label: &str,
        stories: &[Story],
        granularity: Granularity,
    ) -> Result<PlanNode, PlanConstructionError> {
        let mut root = PlanNode::container(ContainerRole::Suite, self.names.unique(root_label));
        // Bookend labels are reserved first so given-story paths never take them.
        let before = self.names.unique(BEFORE_STORIES);
        let after = self.names.unique(AFTER_STORIES);
        root.add_child(PlanNode::leaf(OwnerKind::Bookend, before))?;
        for story in stories {
            let node = match granularity {
                Granularity::Story => self.story_leaf(story),
                Granularity::Step => self.story_container(story)?,
            };
            root.add_child(node)?;
        }
        root.add_child(PlanNode::leaf(OwnerKind::Bookend, after))?;
        Ok(root)
    }

    fn story_leaf(&mut self, story: &Story) -> PlanNode {
        self.step_count += 1;
        let label = self
            .names
            .unique(&story_label(normalize_story_name(&story.name)));
        PlanNode::leaf(OwnerKind::Story, label)
    }

    fn story_container(&mut self, story: &Story) -> Result<PlanNode, PlanConstructionError> {
        let label = self
            .names
            .unique(&story_label(normalize_story_name(&story.name)));
        let mut node = PlanNode::container(ContainerRole::Story, label);
        self.given_story_slots(&mut node, &story.given_stories)?;
        for scenario in &story.scenarios {
            node.add_child(self.scenario(scenario)?)?;
        }
        Ok(node)
    }

    fn given_story_slots(
        &mut self,
        parent: &mut PlanNode,
        paths: &[String],
    ) -> Result<(), PlanConstructionError> {
        for path in paths {
            let label = self.names.unique(normalize_story_name(path));
            parent.add_child(PlanNode::leaf(OwnerKind::GivenStory, label))?;
        }
        Ok(())
    }

    fn scenario(&mut self, scenario: &Scenario) -> Result<PlanNode, PlanConstructionError> {
        let label = self
            .names
            .unique(&scenario_label(&self.keywords.scenario, &scenario.title));
        let mut node = PlanNode::container(ContainerRole::Scenario, label);
        match scenario.examples.as_ref().filter(|table| !table.is_empty()) {
            // Given stories are not reserved per example row.
            Some(table) => {
                for index in 0..table.len() {
                    let row = bind_row(scenario, table, index)?;
                    let label = self.names.unique(&example_label(
                        &self.keywords.examples_table_row,
                        &row.to_string(),
                    ));
                    let mut example = PlanNode::container(ContainerRole::Example, label);
                    self.steps(&mut example, &scenario.steps)?;
                    node.add_child(example)?;
                }
            }
            None => {
                self.given_story_slots(&mut node, &scenario.given_stories)?;
                self.steps(&mut node, &scenario.steps)?;
            }
        }
        Ok(node)
    }

    fn steps(&mut self, parent: &mut PlanNode, lines: &[String]) -> Result<(), PlanConstructionError> {
        let mut previous = PreviousKeyword::None;
        let mut chain = Vec::new();
        for text in lines {
            self.step(parent, text, &mut previous, None, &mut chain)?;
        }
        Ok(())
    }

    /// Expand one step line into `parent`.
    ///
    /// `composite` names the composite being expanded, if any; unresolved
    /// lines are only tolerated at the top level. `chain` holds the composite
    /// texts currently being expanded.
    fn step(
        &mut self,
        parent: &mut PlanNode,
        text: &str,
        previous: &mut PreviousKeyword,
        composite: Option<&str>,
        chain: &mut Vec<String>,
    ) -> Result<(), PlanConstructionError> {
        let registry = self.registry;
        if registry.is_comment(text) {
            return Ok(());
        }
        let Some(candidate) = registry.find(text, previous.as_deref()) else {
            if let Some(composite) = composite {
                return Err(PlanConstructionError::UnresolvedCompositeStep {
                    composite: composite.to_owned(),
                    step: text.to_owned(),
                });
            }
            debug!(step = text, "no step candidate matches; planning unknown step");
            self.step_count += 1;
            let label = self.names.unique(&normalize_step_text(text));
            return parent.add_child(PlanNode::leaf(OwnerKind::Unknown, label));
        };
        if !candidate.is_continuation() {
            *previous = Some(candidate.keyword().to_owned());
        }
        let label = self.names.unique(&normalize_step_text(text));
        if !candidate.is_composite() {
            self.step_count += 1;
            return parent.add_child(PlanNode::leaf(candidate.owner_kind(), label));
        }
        if chain.iter().any(|expanding| expanding == text) {
            return Err(PlanConstructionError::CompositeCycle {
                step: text.to_owned(),
            });
        }
        chain.push(text.to_owned());
        let mut node = PlanNode::container(ContainerRole::Composite, label);
        let mut composed_previous = previous.clone();
        for sub_step in candidate.composed_steps() {
            self.step(&mut node, sub_step, &mut composed_previous, Some(text), chain)?;
        }
        chain.pop();
        parent.add_child(node)
    }
}

fn bind_row(
    scenario: &Scenario,
    table: &ExamplesTable,
    index: usize,
) -> Result<ExampleRow, PlanConstructionError> {
    let expected = table.headers.len();
    let found = table.rows.get(index).map_or(0, Vec::len);
    if found != expected {
        return Err(PlanConstructionError::MalformedExampleRow {
            scenario: scenario.title.clone(),
            row: index,
            expected,
            found,
        });
    }
    table
        .row(index)
        .ok_or_else(|| PlanConstructionError::MalformedExampleRow {
            scenario: scenario.title.clone(),
            row: index,
            expected,
            found: 0,
        })
}
