//! Runner configuration.
//!
//! Granularity is read once, before the plan is built, and selects both the
//! plan shape and the event handling of the bridge.

use std::{env, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, keywords::Keywords};

/// Environment variable selecting the report granularity.
pub const GRANULARITY_ENV: &str = "STORYPLAN_REPORT_LEVEL";

/// Label of the plan root when none is configured.
pub const DEFAULT_ROOT_LABEL: &str = "Stories";

/// How much structure the plan and the notifications track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One leaf per story.
    Story,
    /// Stories, scenarios, example rows and steps.
    #[default]
    Step,
}

impl Granularity {
    /// Read the granularity from [`GRANULARITY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownGranularity`] when the variable holds
    /// anything but `story` or `step`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_value(env::var(GRANULARITY_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Result<Self, ConfigError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => raw.parse(),
        }
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("story") {
            Ok(Self::Story)
        } else if value.eq_ignore_ascii_case("step") {
            Ok(Self::Step)
        } else {
            Err(ConfigError::UnknownGranularity {
                value: value.to_owned(),
            })
        }
    }
}

/// Settings shared by plan construction and replay.
///
/// # Examples
///
/// ```
/// use storyplan::config::{Granularity, RunnerConfig};
///
/// let config = RunnerConfig::default()
///     .with_granularity(Granularity::Story)
///     .with_root_label("Acceptance");
/// assert_eq!(config.granularity(), Granularity::Story);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    granularity: Granularity,
    keywords: Keywords,
    root_label: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            keywords: Keywords::default(),
            root_label: DEFAULT_ROOT_LABEL.to_owned(),
        }
    }
}

impl RunnerConfig {
    /// Default configuration with the granularity taken from the environment.
    ///
    /// # Errors
    ///
    /// Propagates [`Granularity::from_env`] failures.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::default().with_granularity(Granularity::from_env()?))
    }

    /// Set the granularity.
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set the keyword vocabulary.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// Set the label of the plan root.
    #[must_use]
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    /// Configured granularity.
    #[must_use]
    pub fn granularity(&self) -> Granularity { self.granularity }

    /// Configured keywords.
    #[must_use]
    pub fn keywords(&self) -> &Keywords { &self.keywords }

    /// Configured root label.
    #[must_use]
    pub fn root_label(&self) -> &str { &self.root_label }
}
