// src/watch/patterns.rs

use regex::Regex;

/// Outcome of matching an event name against the catch pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchOutcome {
    /// No catch pattern, or it matched. `capture` is the first group, if any.
    Accepted { capture: Option<String> },
    Rejected,
}

/// Exclude / catch filters applied to bare entry names (never full paths).
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    exclude: Option<Regex>,
    catch: Option<Regex>,
}

impl NameFilter {
    pub fn new(exclude: Option<Regex>, catch: Option<Regex>) -> Self {
        Self { exclude, catch }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(name))
    }

    pub fn catch(&self, name: &str) -> CatchOutcome {
        let Some(re) = &self.catch else {
            return CatchOutcome::Accepted { capture: None };
        };
        match re.captures(name) {
            Some(caps) => CatchOutcome::Accepted {
                capture: caps.get(1).map(|m| m.as_str().to_string()),
            },
            None => CatchOutcome::Rejected,
        }
    }

    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(Regex::as_str)
    }

    pub fn catch_pattern(&self) -> Option<&str> {
        self.catch.as_ref().map(Regex::as_str)
    }
}
