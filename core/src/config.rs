//! Library configuration.
//!
//! Constants bounding wildcard name resolution and conversion error
//! messages, plus the process-wide [`Settings`] read when a name
//! property is created without an explicit timeout.

use once_cell::sync::Lazy;
use std::sync::RwLock;
use std::time::Duration;

/// Upper bound for a wildcard match budget (in milliseconds).
///
/// Larger values are clamped down to this, never rejected.
pub const MAX_WILDCARD_TIMEOUT_MS: u64 = 500;

/// Wildcard match budget used when nothing else is configured.
pub const DEFAULT_WILDCARD_TIMEOUT_MS: u64 = 10;

/// Longest field text quoted verbatim in a conversion error.
pub const PREVIEW_MAX_CHARS: usize = 40;

/// Written by `Binding::to_display_string` in place of a value that failed to convert.
pub const DISPLAY_PLACEHOLDER: &str = "<conversion error>";

/// Environment variable overriding the default wildcard timeout.
///
/// Milliseconds, or `0` / `infinite` for no budget.
pub const WILDCARD_TIMEOUT_ENV: &str = "CSVBIND_WILDCARD_TIMEOUT_MS";

// =============================================================================
// Wildcard Timeout
// =============================================================================

/// Time budget for matching one column name against a wildcard alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardTimeout {
    /// Bounded budget, always within `1..=MAX_WILDCARD_TIMEOUT_MS` milliseconds.
    Finite(Duration),
    /// No budget.
    Infinite,
}

impl WildcardTimeout {
    /// Budget in milliseconds, clamped into `[1, MAX_WILDCARD_TIMEOUT_MS]`.
    pub fn from_millis(ms: u64) -> Self {
        Self::Finite(Duration::from_millis(ms.clamp(1, MAX_WILDCARD_TIMEOUT_MS)))
    }

    /// Same clamping as [`WildcardTimeout::from_millis`].
    pub fn from_duration(duration: Duration) -> Self {
        let min = Duration::from_millis(1);
        let max = Duration::from_millis(MAX_WILDCARD_TIMEOUT_MS);
        Self::Finite(duration.clamp(min, max))
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Finite(d) => Some(*d),
            Self::Infinite => None,
        }
    }

    /// Whether a match that took `elapsed` overran the budget.
    pub fn is_exceeded(&self, elapsed: Duration) -> bool {
        match self {
            Self::Finite(d) => elapsed > *d,
            Self::Infinite => false,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("infinite") {
            return Some(Self::Infinite);
        }
        match raw.parse::<u64>().ok()? {
            0 => Some(Self::Infinite),
            ms => Some(Self::from_millis(ms)),
        }
    }
}

impl Default for WildcardTimeout {
    fn default() -> Self {
        Self::from_millis(DEFAULT_WILDCARD_TIMEOUT_MS)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Process-wide defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    /// Budget given to name properties created without an explicit timeout.
    pub wildcard_timeout: WildcardTimeout,
}

static SETTINGS: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::default()));

impl Settings {
    /// Currently installed settings.
    pub fn current() -> Self {
        match SETTINGS.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Replace the process-wide settings.
    pub fn install(self) {
        match SETTINGS.write() {
            Ok(mut guard) => *guard = self,
            Err(poisoned) => *poisoned.into_inner() = self,
        }
    }

    /// Defaults overridden by [`WILDCARD_TIMEOUT_ENV`] when it is set and valid.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(raw) = std::env::var(WILDCARD_TIMEOUT_ENV) {
            match WildcardTimeout::parse(&raw) {
                Some(timeout) => settings.wildcard_timeout = timeout,
                None => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {}",
                    WILDCARD_TIMEOUT_ENV
                ),
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_clamped_to_max() {
        let t = WildcardTimeout::from_millis(10_000);
        assert_eq!(
            t.as_duration(),
            Some(Duration::from_millis(MAX_WILDCARD_TIMEOUT_MS))
        );
    }

    #[test]
    fn test_timeout_clamped_to_min() {
        let t = WildcardTimeout::from_millis(0);
        assert_eq!(t.as_duration(), Some(Duration::from_millis(1)));

        let t = WildcardTimeout::from_duration(Duration::from_micros(10));
        assert_eq!(t.as_duration(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_infinite_never_exceeded() {
        assert!(!WildcardTimeout::Infinite.is_exceeded(Duration::from_secs(3600)));
        assert!(WildcardTimeout::from_millis(5).is_exceeded(Duration::from_millis(6)));
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(WildcardTimeout::parse("0"), Some(WildcardTimeout::Infinite));
        assert_eq!(
            WildcardTimeout::parse(" Infinite "),
            Some(WildcardTimeout::Infinite)
        );
        assert_eq!(
            WildcardTimeout::parse("25"),
            Some(WildcardTimeout::from_millis(25))
        );
        assert_eq!(WildcardTimeout::parse("soon"), None);
    }
}
