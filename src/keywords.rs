//! Story keywords used when labelling plan nodes and matching steps.

use serde::{Deserialize, Serialize};

/// Keywords of the story language in use.
///
/// Defaults describe the English vocabulary: `Scenario`, `Example`, the
/// `Given`/`When`/`Then` starters, the `And` continuation and the `!--`
/// comment marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keywords {
    /// Prefix of scenario labels.
    pub scenario: String,
    /// Prefix of example-row labels.
    pub examples_table_row: String,
    /// Starter for precondition steps.
    pub given: String,
    /// Starter for action steps.
    pub when: String,
    /// Starter for outcome steps.
    pub then: String,
    /// Continuation starter that inherits the previous keyword.
    pub and: String,
    /// Marker that turns a step line into a comment.
    pub ignorable: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            scenario: "Scenario".to_owned(),
            examples_table_row: "Example".to_owned(),
            given: "Given".to_owned(),
            when: "When".to_owned(),
            then: "Then".to_owned(),
            and: "And".to_owned(),
            ignorable: "!--".to_owned(),
        }
    }
}

impl Keywords {
    /// Return the step starter `text` begins with, if any.
    ///
    /// The continuation keyword is reported like any other starter.
    #[must_use]
    pub fn starter_of<'t>(&self, text: &'t str) -> Option<&'t str> {
        let word = text.split_whitespace().next()?;
        [&self.given, &self.when, &self.then, &self.and]
            .into_iter()
            .any(|starter| starter == word)
            .then_some(word)
    }

    /// Whether `word` is the continuation keyword.
    #[must_use]
    pub fn is_continuation(&self, word: &str) -> bool { self.and == word }

    /// Whether `text` is a comment line.
    #[must_use]
    pub fn is_comment(&self, text: &str) -> bool { text.trim_start().starts_with(&self.ignorable) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Keywords;

    #[rstest]
    #[case("Given say Hello", Some("Given"))]
    #[case("And Sign in user Bob", Some("And"))]
    #[case("Sign in user Bob", None)]
    #[case("", None)]
    fn finds_step_starter(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(Keywords::default().starter_of(text), expected);
    }

    #[rstest]
    #[case("!-- ignored", true)]
    #[case("   !-- indented", true)]
    #[case("Given !-- not a comment", false)]
    fn detects_comments(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(Keywords::default().is_comment(text), expected);
    }
}
