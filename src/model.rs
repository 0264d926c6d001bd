//! Read-only story model consumed by the plan builder.
//!
//! The model is produced by an external story parser. It mirrors the story
//! file structure: stories hold scenarios, scenarios hold either an examples
//! table and step lines or just step lines, and both may reference given
//! stories by path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named story and its scenarios.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story name, usually the story file name.
    pub name: String,
    /// Paths of stories executed before this story's scenarios.
    #[serde(default)]
    pub given_stories: Vec<String>,
    /// Scenarios in declaration order.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl Story {
    /// Create an empty story called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append given-story paths.
    #[must_use]
    pub fn with_given_stories<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.given_stories.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Append a scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }
}

/// A titled sequence of step lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario title.
    pub title: String,
    /// Paths of stories executed before the scenario's steps.
    #[serde(default)]
    pub given_stories: Vec<String>,
    /// Parameter rows; when present the steps run once per row.
    #[serde(default)]
    pub examples: Option<ExamplesTable>,
    /// Literal step lines, comments included.
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Scenario {
    /// Create an empty scenario titled `title`.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Append step lines.
    #[must_use]
    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Append given-story paths.
    #[must_use]
    pub fn with_given_stories<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.given_stories.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Attach an examples table.
    #[must_use]
    pub fn with_examples(mut self, table: ExamplesTable) -> Self {
        self.examples = Some(table);
        self
    }
}

/// Header row plus value rows of a scenario's examples.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplesTable {
    /// Column names.
    pub headers: Vec<String>,
    /// Value rows; each should hold one value per header.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl ExamplesTable {
    /// Create a table with the given column names and no rows.
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a value row.
    #[must_use]
    pub fn with_row<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of value rows.
    #[must_use]
    pub fn len(&self) -> usize { self.rows.len() }

    /// Whether the table has no value rows.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Bind row `index` to the headers, if the row exists.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<ExampleRow> {
        let values = self.rows.get(index)?;
        Some(ExampleRow::new(
            self.headers.iter().cloned().zip(values.iter().cloned()),
        ))
    }
}

/// One parameter binding of an examples table, in header order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRow(Vec<(String, String)>);

impl ExampleRow {
    /// Build a row from `(name, value)` pairs.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Look up the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(name, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl fmt::Display for ExampleRow {
    /// Renders `{name=value, other=value}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}
