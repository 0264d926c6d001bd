//! Login story, its step definitions and a recorded run.

use std::sync::Arc;

use rstest::fixture;
use storyplan::{
    ExecutionEvent,
    PatternStep,
    StepRegistry,
    model::{Scenario, Story},
};

/// Steps type owning the login step definitions.
pub const LOGIN_STEPS: &str = "TestSteps";

/// Cause reported for the failing step of [`login_trace`].
#[derive(Debug, thiserror::Error)]
#[error("user Bob was not signed in")]
pub struct LoginFailure;

/// Registry with one literal, two placeholder and one composite definition.
#[fixture]
pub fn login_registry() -> StepRegistry {
    StepRegistry::new()
        .with(PatternStep::new("Given", "say Hello").owned_by(LOGIN_STEPS))
        .with(PatternStep::new("When", "Sign in user $userName").owned_by(LOGIN_STEPS))
        .with(
            PatternStep::new("Then", "User with name $userName is properly signed in")
                .owned_by(LOGIN_STEPS),
        )
        .with(PatternStep::new("When", "Sign up user").owned_by(LOGIN_STEPS))
        .with(PatternStep::new("When", "Auditing user").owned_by(LOGIN_STEPS))
        .with(
            PatternStep::new("When", "Sign up with audit")
                .composed_of(["When Sign up user", "When Auditing user"])
                .owned_by(LOGIN_STEPS),
        )
}

/// `Login.story` with one three-step scenario.
#[fixture]
pub fn login_story() -> Story {
    Story::new("Login.story").with_scenario(Scenario::new("Successful login").with_steps([
        "Given say Hello",
        "When Sign in user Bob",
        "Then User with name Bob is properly signed in",
    ]))
}

/// Execution of [`login_story`] where the second step fails.
#[fixture]
pub fn login_trace() -> Vec<ExecutionEvent> {
    let step = |text: &str| text.to_owned();
    vec![
        ExecutionEvent::BeforeStory {
            story: "Login.story".to_owned(),
            given: false,
        },
        ExecutionEvent::BeforeScenario {
            title: "Successful login".to_owned(),
        },
        ExecutionEvent::BeforeStep {
            step: step("Given say Hello"),
        },
        ExecutionEvent::Successful {
            step: step("Given say Hello"),
        },
        ExecutionEvent::BeforeStep {
            step: step("When Sign in user Bob"),
        },
        ExecutionEvent::Failed {
            step: step("When Sign in user Bob"),
            cause: Arc::new(LoginFailure),
        },
        ExecutionEvent::BeforeStep {
            step: step("Then User with name Bob is properly signed in"),
        },
        ExecutionEvent::Successful {
            step: step("Then User with name Bob is properly signed in"),
        },
        ExecutionEvent::AfterScenario,
        ExecutionEvent::AfterStory {
            given_or_restarting: false,
        },
    ]
}
