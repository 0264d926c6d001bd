//! Run-scoped registry that keeps plan labels unique.
//!
//! Results depend only on call order, so callers must visit the story model
//! in the same order on every build.

use std::collections::{HashMap, HashSet};

/// Hands out unique labels, suffixing repeats with an ordinal.
///
/// The first occurrence of a label is returned unchanged; later occurrences
/// become `<label> (2)`, `<label> (3)` and so on. A suffixed candidate that
/// collides with a label issued earlier is skipped, so no two calls ever
/// return the same string.
///
/// # Examples
///
/// ```
/// use storyplan::dedup::NameDeduplicator;
///
/// let mut names = NameDeduplicator::new();
/// assert_eq!(names.unique("When Sign up user"), "When Sign up user");
/// assert_eq!(names.unique("When Sign up user"), "When Sign up user (2)");
/// ```
#[derive(Debug, Default)]
pub struct NameDeduplicator {
    occurrences: HashMap<String, usize>,
    first_seen: Vec<String>,
    issued: HashSet<String>,
}

impl NameDeduplicator {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Return a label derived from `label` that has not been issued before.
    pub fn unique(&mut self, label: &str) -> String {
        let count = match self.occurrences.get_mut(label) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                self.occurrences.insert(label.to_owned(), 1);
                self.first_seen.push(label.to_owned());
                1
            }
        };
        if count == 1 && self.issued.insert(label.to_owned()) {
            return label.to_owned();
        }
        let mut ordinal = count.max(2);
        loop {
            let candidate = format!("{label} ({ordinal})");
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
            ordinal += 1;
        }
    }

    /// Number of times `label` has been requested.
    #[must_use]
    pub fn occurrences(&self, label: &str) -> usize {
        self.occurrences.get(label).copied().unwrap_or(0)
    }

    /// Base labels in the order they were first requested.
    pub fn labels(&self) -> impl Iterator<Item = &str> { self.first_seen.iter().map(String::as_str) }
}

/// Whether `label` is `base` itself or `base` with a deduplication suffix.
#[must_use]
pub fn is_variant_of(label: &str, base: &str) -> bool {
    let Some(rest) = label.strip_prefix(base) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    rest.strip_prefix(" (")
        .and_then(|tail| tail.strip_suffix(')'))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}
