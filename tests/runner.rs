//! End-to-end runs through `StoryRunner` with a scripted engine.

use std::error::Error;

use rstest::rstest;
use storyplan::{
    ExecutionEvent,
    Granularity,
    RunError,
    RunnerConfig,
    StepRegistry,
    TraceMismatchError,
    model::Story,
    runner::{SingleStory, StoryLoader, StoryRunner},
    test_helpers::{Notification, RecordingSink, ScriptedEngine},
};
use storyplan_testing::{login_registry, login_story, login_trace};

struct LoginLoader;

impl StoryLoader for LoginLoader {
    fn load(&self, path: &str) -> Result<Story, Box<dyn Error + Send + Sync>> {
        match path {
            "Login.story" => Ok(login_story()),
            other => Err(format!("unknown story `{other}`").into()),
        }
    }
}

fn started(label: &str) -> Notification { Notification::Started(label.to_owned()) }

fn finished(label: &str) -> Notification { Notification::Finished(label.to_owned()) }

#[rstest]
fn login_run_reports_failing_step(login_registry: StepRegistry, login_trace: Vec<ExecutionEvent>) {
    let runner = StoryRunner::new(&login_registry);
    let mut engine = ScriptedEngine::new(login_trace);
    let outcome = runner
        .run(
            &SingleStory("Login.story".to_owned()),
            &LoginLoader,
            &mut engine,
            RecordingSink::default(),
        )
        .expect("run succeeds");

    assert_eq!(outcome.plan.step_count(), 3);
    assert_eq!(
        outcome.sink.into_notifications(),
        [
            started("Story: Login"),
            started("Scenario Successful login"),
            started("Given say Hello"),
            finished("Given say Hello"),
            started("When Sign in user Bob"),
            Notification::Failed {
                node: "When Sign in user Bob".to_owned(),
                cause: "user Bob was not signed in".to_owned(),
            },
            finished("When Sign in user Bob"),
            started("Then User with name Bob is properly signed in"),
            finished("Then User with name Bob is properly signed in"),
            finished("Scenario Successful login"),
            finished("Story: Login"),
        ]
    );
}

#[rstest]
fn story_granularity_reports_only_the_story(
    login_registry: StepRegistry,
    login_trace: Vec<ExecutionEvent>,
) {
    let runner = StoryRunner::new(&login_registry)
        .with_config(RunnerConfig::default().with_granularity(Granularity::Story));
    let mut engine = ScriptedEngine::new(login_trace);
    let outcome = runner
        .run(
            &SingleStory("Login.story".to_owned()),
            &LoginLoader,
            &mut engine,
            RecordingSink::default(),
        )
        .expect("run succeeds");

    assert_eq!(outcome.plan.step_count(), 1);
    assert_eq!(
        outcome.sink.into_notifications(),
        [started("Story: Login"), finished("Story: Login")]
    );
}

#[rstest]
fn unknown_story_path_fails_to_load(login_registry: StepRegistry) {
    let runner = StoryRunner::new(&login_registry);
    let mut engine = ScriptedEngine::new(Vec::new());
    let err = runner
        .run(
            &["Login.story", "Missing.story"][..],
            &LoginLoader,
            &mut engine,
            RecordingSink::default(),
        )
        .expect_err("second story is missing");

    assert!(matches!(err, RunError::Load { ref path, .. } if path == "Missing.story"));
    assert!(err.to_string().contains("Missing.story"));
    assert!(engine.runs().is_empty());
}

#[rstest]
fn extra_step_exceeds_scenario_slots(
    login_registry: StepRegistry,
    mut login_trace: Vec<ExecutionEvent>,
) {
    let runner = StoryRunner::new(&login_registry);
    let extra = ExecutionEvent::BeforeStep {
        step: "Then User with name Bob is properly signed in".to_owned(),
    };
    login_trace.insert(8, extra);
    let mut engine = ScriptedEngine::new(login_trace);
    let err = runner
        .run_stories(&[login_story()], &mut engine, RecordingSink::default())
        .expect_err("fourth step has no slot");

    assert!(matches!(
        err,
        RunError::Trace(TraceMismatchError::CursorExhausted { .. })
    ));
}
