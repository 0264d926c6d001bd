//! Canonical display labels for plan nodes.
//!
//! Every function here is pure and total. Labels are later passed through a
//! [`NameDeduplicator`](crate::dedup::NameDeduplicator), so these helpers only
//! produce the base form.

/// Label of the bookend leaf run before all stories.
pub const BEFORE_STORIES: &str = "BeforeStories";

/// Label of the bookend leaf run after all stories.
pub const AFTER_STORIES: &str = "AfterStories";

const STORY_PREFIX: &str = "Story";

/// Build the label of a story: `Story: <name>` with dots removed.
#[must_use]
pub fn story_label(name: &str) -> String { format!("{STORY_PREFIX}: {}", strip_dots(name)) }

/// Build the label of a scenario: `<keyword> <title>` with dots removed.
#[must_use]
pub fn scenario_label(keyword: &str, title: &str) -> String {
    format!("{keyword} {}", strip_dots(title))
}

/// Build the label of an example row: `<keyword> <params>` with dots removed.
#[must_use]
pub fn example_label(keyword: &str, params: &str) -> String {
    format!("{keyword} {}", strip_dots(params))
}

/// Drop everything from the first `.` onwards.
///
/// `login.story` becomes `login`; names without a dot are returned unchanged.
#[must_use]
pub fn normalize_story_name(path: &str) -> &str {
    path.split_once('.').map_or(path, |(stem, _)| stem)
}

/// Collapse whitespace and control characters into single spaces.
///
/// Multi-line step text (tables, doc strings) is flattened so the label stays
/// on one line.
#[must_use]
pub fn normalize_step_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_dots(text: &str) -> String { text.replace('.', "") }
