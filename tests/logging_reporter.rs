//! Log output of the reporter callbacks, captured through `logtest`.

use std::{sync::Arc, time::Duration};

use log::Level;
use rstest::rstest;
use serial_test::serial;
use storyplan::{
    ExecutionBridge,
    ExecutionEvent,
    LoggingReporter,
    PlanBuilder,
    StepError,
    StepRegistry,
    StoryReporter,
    model::{ExampleRow, Story},
    test_helpers::RecordingSink,
};
use storyplan_testing::{LoggerHandle, LoginFailure, logger, login_registry, login_story, login_trace};

const REPORTER: &str = "storyplan::reporter";

fn line(level: Level, message: &str) -> (Level, String) { (level, message.to_owned()) }

#[rstest]
#[serial]
fn logs_story_lifecycle_at_info(mut logger: LoggerHandle) {
    let mut reporter = LoggingReporter;
    reporter.before_story("Login.story", false).expect("logged");
    reporter.before_story("Setup.story", true).expect("logged");
    reporter.before_scenario("Successful login").expect("logged");
    reporter.after_scenario().expect("logged");
    reporter.after_story(false).expect("logged");

    assert_eq!(
        logger.messages_from(REPORTER),
        [
            line(Level::Info, "Before story: Login.story"),
            line(Level::Info, "Before story: Setup.story (given story)"),
            line(Level::Info, "Before scenario: Successful login"),
            line(Level::Info, "After scenario"),
            line(Level::Info, "After story"),
        ]
    );
}

#[rstest]
#[serial]
fn step_outcomes_use_matching_levels(mut logger: LoggerHandle) {
    let mut reporter = LoggingReporter;
    reporter.successful("Given say Hello").expect("logged");
    reporter.not_performed("When Sign in user Bob").expect("logged");
    reporter.pending("Then it works").expect("logged");
    let cause: StepError = Arc::new(LoginFailure);
    reporter.failed("When Sign in user Bob", &cause).expect("logged");

    assert_eq!(
        logger.messages_from(REPORTER),
        [
            line(Level::Info, "Successful step: Given say Hello"),
            line(Level::Warn, "Not performed step: When Sign in user Bob"),
            line(Level::Error, "Pending step: Then it works"),
            line(
                Level::Error,
                "Failed step: When Sign in user Bob cause: user Bob was not signed in"
            ),
        ]
    );
}

#[rstest]
#[serial]
fn engine_only_callbacks_are_logged(mut logger: LoggerHandle) {
    let events = [
        ExecutionEvent::StoryNotAllowed {
            story: "Audit.story".to_owned(),
            filter: "-skip".to_owned(),
        },
        ExecutionEvent::StoryCancelled {
            story: "Slow.story".to_owned(),
            duration: Duration::from_secs(30),
        },
        ExecutionEvent::Example {
            row: ExampleRow::new([("user", "Bob")]),
        },
        ExecutionEvent::DryRun,
    ];
    let mut reporter = LoggingReporter;
    for event in &events {
        event.dispatch(&mut reporter).expect("logged");
    }

    let messages = logger.messages_from(REPORTER);
    assert_eq!(messages.len(), 4);
    assert_eq!(
        messages[0],
        line(Level::Info, "Story: Audit.story not allowed for filter: -skip")
    );
    assert_eq!(messages[1], line(Level::Info, "Story: Slow.story cancelled in: 30s"));
    assert_eq!(messages[2].0, Level::Info);
    assert!(messages[2].1.starts_with("Example: "));
    assert_eq!(messages[3], line(Level::Info, "Dry run"));
}

#[rstest]
#[serial]
fn bridge_logs_every_callback_it_receives(mut logger: LoggerHandle) {
    let registry = login_registry();
    let plan = PlanBuilder::new(&registry)
        .build(&[login_story()])
        .expect("plan builds");
    let mut bridge = ExecutionBridge::new(&plan, RecordingSink::default());
    bridge.replay(&login_trace()).expect("trace matches");

    let messages = logger.messages_from(REPORTER);
    assert_eq!(messages.len(), login_trace().len());
    assert_eq!(messages[0], line(Level::Info, "Before story: Login.story"));
    assert!(
        messages
            .iter()
            .any(|(level, text)| *level == Level::Error
                && text.starts_with("Failed step: When Sign in user Bob"))
    );
}

#[rstest]
#[serial]
fn unplanned_story_is_reported_as_warning(mut logger: LoggerHandle) {
    let registry = StepRegistry::new();
    let plan = PlanBuilder::new(&registry)
        .build(&[Story::new("Login.story")])
        .expect("plan builds");
    let mut bridge = ExecutionBridge::new(&plan, RecordingSink::default());
    bridge.before_story("Unknown.story", false).expect("tolerated");

    let warnings: Vec<_> = logger
        .messages_from("storyplan::bridge")
        .into_iter()
        .filter(|(level, _)| *level == Level::Warn)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].1.contains("story is not part of the plan"));
}
