//! Step candidates and the registry the plan builder resolves steps against.
//!
//! Matching text to executable code belongs to the execution engine. The
//! planner only needs to know whether some candidate accepts a line, whether
//! the line is a comment, and whether the accepted candidate expands into
//! composed sub-steps.

use serde::{Deserialize, Serialize};

use crate::{keywords::Keywords, plan::OwnerKind};

/// A registered step definition as seen by the planner.
pub trait StepCandidate {
    /// Whether this candidate accepts `text`.
    ///
    /// `previous_keyword` is the leading keyword of the last non-continuation
    /// step in the same scenario or example row, used to resolve `And` lines.
    fn matches(&self, text: &str, previous_keyword: Option<&str>) -> bool;

    /// Whether `text` is a comment line.
    fn is_comment(&self, text: &str) -> bool;

    /// Whether the candidate expands into composed sub-steps.
    fn is_composite(&self) -> bool { !self.composed_steps().is_empty() }

    /// Sub-step texts of a composite candidate, in declared order.
    fn composed_steps(&self) -> &[String] { &[] }

    /// Classification of the leaves this candidate produces.
    fn owner_kind(&self) -> OwnerKind;

    /// Leading keyword of the candidate, such as `Given`.
    fn keyword(&self) -> &str;

    /// Whether the candidate is itself a continuation (`And`-style) step.
    fn is_continuation(&self) -> bool { false }
}

/// Ordered collection of step candidates; the first match wins.
#[derive(Default)]
pub struct StepRegistry {
    candidates: Vec<Box<dyn StepCandidate>>,
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

impl StepRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append a candidate after those already registered.
    pub fn register(&mut self, candidate: impl StepCandidate + 'static) {
        self.candidates.push(Box::new(candidate));
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, candidate: impl StepCandidate + 'static) -> Self {
        self.register(candidate);
        self
    }

    /// Number of registered candidates.
    #[must_use]
    pub fn len(&self) -> usize { self.candidates.len() }

    /// Whether no candidates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.candidates.is_empty() }

    /// Whether `text` is a comment.
    ///
    /// Only the first registered candidate is consulted; an empty registry
    /// treats nothing as a comment.
    #[must_use]
    pub fn is_comment(&self, text: &str) -> bool {
        self.candidates
            .first()
            .is_some_and(|candidate| candidate.is_comment(text))
    }

    /// Find the first candidate accepting `text`.
    #[must_use]
    pub fn find(&self, text: &str, previous_keyword: Option<&str>) -> Option<&dyn StepCandidate> {
        self.candidates
            .iter()
            .map(|candidate| &**candidate)
            .find(|candidate| candidate.matches(text, previous_keyword))
    }
}

impl<C: StepCandidate + 'static> FromIterator<C> for StepRegistry {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        let mut registry = Self::new();
        for candidate in iter {
            registry.register(candidate);
        }
        registry
    }
}

/// Step definition matched by keyword and a `$name` placeholder pattern.
///
/// A placeholder matches one or more words. Lines must open with one of the
/// vocabulary's starters. A line starting with the continuation keyword
/// matches when the previous keyword equals the definition's keyword.
///
/// # Examples
///
/// ```
/// use storyplan::steps::{PatternStep, StepCandidate};
///
/// let step = PatternStep::new("When", "Sign in user $name");
/// assert!(step.matches("When Sign in user Bob", None));
/// assert!(step.matches("And Sign in user Bob", Some("When")));
/// assert!(!step.matches("And Sign in user Bob", Some("Given")));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStep {
    keyword: String,
    pattern: String,
    #[serde(default = "default_owner")]
    owner: String,
    #[serde(default)]
    composed: Vec<String>,
    #[serde(default)]
    keywords: Keywords,
}

fn default_owner() -> String { "steps".to_owned() }

impl PatternStep {
    /// Create a definition for `<keyword> <pattern>`.
    #[must_use]
    pub fn new(keyword: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            pattern: pattern.into(),
            owner: default_owner(),
            composed: Vec::new(),
            keywords: Keywords::default(),
        }
    }

    /// Turn the definition into a composite of `steps`.
    #[must_use]
    pub fn composed_of<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.composed = steps.into_iter().map(Into::into).collect();
        self
    }

    /// Name the steps type owning this definition.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Use a non-default keyword vocabulary.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// The placeholder pattern following the keyword.
    #[must_use]
    pub fn pattern(&self) -> &str { &self.pattern }
}

impl StepCandidate for PatternStep {
    fn matches(&self, text: &str, previous_keyword: Option<&str>) -> bool {
        let Some(starter) = self.keywords.starter_of(text) else {
            return false;
        };
        let words = text.split_whitespace().skip(1);
        let effective = if self.keywords.is_continuation(starter) {
            match previous_keyword {
                Some(previous) => previous,
                None => return false,
            }
        } else {
            starter
        };
        if effective != self.keyword {
            return false;
        }
        let body: Vec<&str> = words.collect();
        let pattern: Vec<&str> = self.pattern.split_whitespace().collect();
        words_match(&pattern, &body)
    }

    fn is_comment(&self, text: &str) -> bool { self.keywords.is_comment(text) }

    fn composed_steps(&self) -> &[String] { &self.composed }

    fn owner_kind(&self) -> OwnerKind { OwnerKind::Steps(self.owner.clone()) }

    fn keyword(&self) -> &str { &self.keyword }

    fn is_continuation(&self) -> bool { self.keywords.is_continuation(&self.keyword) }
}

fn words_match(pattern: &[&str], text: &[&str]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((token, rest)) if token.starts_with('$') => {
            (1..=text.len()).any(|taken| text.get(taken..).is_some_and(|tail| words_match(rest, tail)))
        }
        Some((token, rest)) => match text.split_first() {
            Some((word, tail)) => word == token && words_match(rest, tail),
            None => false,
        },
    }
}
