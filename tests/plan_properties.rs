//! Property tests for plan construction over generated story models.

use std::collections::HashSet;

use proptest::prelude::*;
use storyplan::{
    Granularity,
    PlanBuilder,
    model::{ExamplesTable, Scenario, Story},
};
use storyplan_testing::login_registry;

const STEP_LINES: &[&str] = &[
    "Given say Hello",
    "When Sign in user Bob",
    "When Sign in user Alice",
    "Then User with name Bob is properly signed in",
    "And say Hello",
    "Given an unmatched step",
    "When Sign up with audit",
    "!-- reminder for the reader",
];

const COMPOSITE: &str = "When Sign up with audit";

const COMPOSED_LEAVES: usize = 2;

const GIVEN_PATHS: &[&str] = &["Setup.story", "Seed.story", "Login.story"];

const USERS: &[&str] = &["Bob", "Eve", "Alice"];

const SCENARIO_TITLES: &[&str] = &["Login", "Logout", "Sign up"];

const STORY_NAMES: &[&str] = &["Login.story", "Audit.story", "login"];

fn step_line() -> impl Strategy<Value = String> {
    proptest::sample::select(STEP_LINES).prop_map(str::to_owned)
}

fn given_paths() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(proptest::sample::select(GIVEN_PATHS), 0..3)
}

fn examples() -> impl Strategy<Value = Option<ExamplesTable>> {
    prop::option::of(
        prop::collection::vec(proptest::sample::select(USERS), 0..4).prop_map(|users| {
            users
                .into_iter()
                .fold(ExamplesTable::new(["user"]), |table, user| table.with_row([user]))
        }),
    )
}

fn scenario() -> impl Strategy<Value = Scenario> {
    (
        proptest::sample::select(SCENARIO_TITLES),
        prop::collection::vec(step_line(), 0..6),
        given_paths(),
        examples(),
    )
        .prop_map(|(title, steps, given, examples)| {
            let scenario = Scenario::new(title)
                .with_steps(steps)
                .with_given_stories(given);
            match examples {
                Some(table) => scenario.with_examples(table),
                None => scenario,
            }
        })
}

fn story() -> impl Strategy<Value = Story> {
    (
        proptest::sample::select(STORY_NAMES),
        given_paths(),
        prop::collection::vec(scenario(), 0..4),
    )
        .prop_map(|(name, given, scenarios)| {
            scenarios.into_iter().fold(
                Story::new(name).with_given_stories(given),
                Story::with_scenario,
            )
        })
}

fn stories() -> impl Strategy<Value = Vec<Story>> { prop::collection::vec(story(), 0..5) }

fn planned_leaves(line: &str) -> usize {
    match line {
        comment if comment.starts_with("!--") => 0,
        COMPOSITE => COMPOSED_LEAVES,
        _ => 1,
    }
}

/// Step leaves a scenario contributes: once, or once per examples row.
fn scenario_steps(scenario: &Scenario) -> usize {
    let per_run: usize = scenario.steps.iter().map(|line| planned_leaves(line)).sum();
    let runs = scenario
        .examples
        .as_ref()
        .filter(|table| !table.is_empty())
        .map_or(1, ExamplesTable::len);
    per_run * runs
}

fn executable_steps(stories: &[Story]) -> usize {
    stories
        .iter()
        .flat_map(|story| &story.scenarios)
        .map(scenario_steps)
        .sum()
}

proptest! {
    #[test]
    fn labels_are_unique_across_the_plan(stories in stories()) {
        let registry = login_registry();
        let plan = PlanBuilder::new(&registry).build(&stories).expect("plan builds");
        let mut seen = HashSet::new();
        for label in plan.labels() {
            prop_assert!(seen.insert(label.to_owned()), "duplicate label {label:?}");
        }
    }

    #[test]
    fn step_count_matches_executable_steps(stories in stories()) {
        let registry = login_registry();
        let plan = PlanBuilder::new(&registry).build(&stories).expect("plan builds");
        prop_assert_eq!(plan.step_count(), executable_steps(&stories));
    }

    #[test]
    fn story_granularity_counts_stories(stories in stories()) {
        let registry = login_registry();
        let plan = PlanBuilder::new(&registry)
            .with_granularity(Granularity::Story)
            .build(&stories)
            .expect("plan builds");
        prop_assert_eq!(plan.step_count(), stories.len());
        prop_assert_eq!(plan.root().children().len(), stories.len() + 2);
    }

    #[test]
    fn rebuilding_yields_the_same_tree(stories in stories()) {
        let registry = login_registry();
        let builder = PlanBuilder::new(&registry);
        let first = builder.build(&stories).expect("plan builds");
        let second = builder.build(&stories).expect("plan builds");
        prop_assert_eq!(first.root(), second.root());
        prop_assert_eq!(first.step_count(), second.step_count());
    }
}
