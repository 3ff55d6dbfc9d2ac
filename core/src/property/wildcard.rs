//! Wildcard column-name patterns (`?` = one character, `*` = any run).

use once_cell::unsync::OnceCell;
use regex::{Regex, RegexBuilder};
use std::time::{Duration, Instant};

use crate::config::WildcardTimeout;

/// Whether `alias` contains a wildcard character.
pub fn is_wildcard(alias: &str) -> bool {
    alias.contains(|c| c == '*' || c == '?')
}

/// Anchored regex source for a wildcard pattern.
///
/// Literal parts are escaped, `?` becomes `.` and `*` the non-greedy `.*?`.
pub fn to_regex_source(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut literal = String::new();

    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '*' { ".*?" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

/// A wildcard alias, compiled lazily once per case sensitivity.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    case_sensitive: OnceCell<Option<Regex>>,
    case_insensitive: OnceCell<Option<Regex>>,
}

impl WildcardPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            source: to_regex_source(pattern),
            case_sensitive: OnceCell::new(),
            case_insensitive: OnceCell::new(),
        }
    }

    pub fn regex_source(&self) -> &str {
        &self.source
    }

    fn regex(&self, case_sensitive: bool) -> Option<&Regex> {
        let cell = if case_sensitive {
            &self.case_sensitive
        } else {
            &self.case_insensitive
        };
        cell.get_or_init(|| {
            RegexBuilder::new(&self.source)
                .case_insensitive(!case_sensitive)
                .dot_matches_new_line(true)
                .build()
                .map_err(|e| {
                    tracing::warn!(pattern = %self.source, error = %e, "wildcard alias does not compile")
                })
                .ok()
        })
        .as_ref()
    }

    /// Index of the first name matching within `timeout`.
    ///
    /// A match that overruns the budget counts as no match for that name;
    /// scanning goes on with the next one.
    pub fn find(
        &self,
        names: &[String],
        case_sensitive: bool,
        timeout: WildcardTimeout,
    ) -> Option<usize> {
        self.find_with(names, case_sensitive, timeout, |regex, name| {
            let started = Instant::now();
            let matched = regex.is_match(name);
            (matched, started.elapsed())
        })
    }

    /// [`WildcardPattern::find`] with the timed match supplied by the caller.
    pub(crate) fn find_with<F>(
        &self,
        names: &[String],
        case_sensitive: bool,
        timeout: WildcardTimeout,
        mut timed_match: F,
    ) -> Option<usize>
    where
        F: FnMut(&Regex, &str) -> (bool, Duration),
    {
        let regex = self.regex(case_sensitive)?;

        for (index, name) in names.iter().enumerate() {
            let (matched, elapsed) = timed_match(regex, name);

            if timeout.is_exceeded(elapsed) {
                tracing::trace!(
                    column = %name,
                    elapsed_us = elapsed.as_micros() as u64,
                    "wildcard match exceeded its budget, skipping column"
                );
                continue;
            }
            if matched {
                return Some(index);
            }
        }
        None
    }
}
