//! Shared fixtures for `storyplan` tests.
//!
//! Provides a serialised [`logtest`] logger, the step registry and story used
//! by the login examples, and the matching execution trace.
//!
//! ```rust
//! use storyplan::PlanBuilder;
//! use storyplan_testing::{login_registry, login_story};
//!
//! let registry = login_registry();
//! let plan = PlanBuilder::new(&registry)
//!     .build(&[login_story()])
//!     .expect("plan builds");
//! assert_eq!(plan.step_count(), 3);
//! ```

pub mod fixtures;
pub mod logging;

pub use fixtures::{LoginFailure, login_registry, login_story, login_trace};
pub use logging::{LoggerHandle, logger};
