//! Debounce policy for live typing.
//!
//! [`DebouncePolicy::decide`] is a pure function of a [`DebounceSnapshot`];
//! [`DebounceTracker`] records keystroke and parse times and builds the
//! snapshot for it.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why the policy decided to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum ParseReason {
    /// Nothing has been parsed yet
    FirstKeystroke,
    /// The pending edit has waited the maximum delay
    MaxDelay,
    /// The user stopped typing
    TypingPause,
    /// Enough time has passed since the previous parse
    MinInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceDecision {
    ParseNow(ParseReason),
    /// Ask again after this long
    Wait(Duration),
}

impl DebounceDecision {
    #[must_use]
    pub const fn should_parse(&self) -> bool {
        matches!(self, Self::ParseNow(_))
    }
}

/// Elapsed times the policy decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceSnapshot {
    /// Time since the previous parse; `None` before the first parse
    pub since_last_parse: Option<Duration>,
    /// Time since the most recent keystroke
    pub since_last_keystroke: Duration,
    /// Time since the first keystroke not yet covered by a parse
    pub pending_for: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct DebouncePolicy {
    /// Minimum time between two parses
    pub min_interval: Duration,
    /// Longest a pending edit may wait
    pub max_delay: Duration,
    /// Quiet time that counts as a typing pause
    pub pause_threshold: Duration,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(150),
            max_delay: Duration::from_millis(500),
            pause_threshold: Duration::from_millis(300),
        }
    }
}

impl DebouncePolicy {
    #[must_use]
    pub const fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_pause_threshold(mut self, threshold: Duration) -> Self {
        self.pause_threshold = threshold;
        self
    }

    /// Decide whether to parse now
    #[must_use]
    pub fn decide(&self, snapshot: DebounceSnapshot) -> DebounceDecision {
        let Some(since_last_parse) = snapshot.since_last_parse else {
            return DebounceDecision::ParseNow(ParseReason::FirstKeystroke);
        };
        if snapshot.pending_for >= self.max_delay {
            return DebounceDecision::ParseNow(ParseReason::MaxDelay);
        }
        if snapshot.since_last_keystroke >= self.pause_threshold {
            return DebounceDecision::ParseNow(ParseReason::TypingPause);
        }
        if since_last_parse >= self.min_interval {
            return DebounceDecision::ParseNow(ParseReason::MinInterval);
        }
        let remaining = (self.max_delay - snapshot.pending_for)
            .min(self.pause_threshold - snapshot.since_last_keystroke)
            .min(self.min_interval - since_last_parse);
        DebounceDecision::Wait(remaining)
    }
}

/// Keystroke and parse timestamps for one editing session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTracker {
    last_parse: Option<Duration>,
    last_keystroke: Option<Duration>,
    pending_since: Option<Duration>,
}

impl DebounceTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_parse: None,
            last_keystroke: None,
            pending_since: None,
        }
    }

    pub fn record_keystroke(&mut self, now: Duration) {
        self.last_keystroke = Some(now);
        if self.pending_since.is_none() {
            self.pending_since = Some(now);
        }
    }

    pub fn record_parse(&mut self, now: Duration) {
        self.last_parse = Some(now);
        self.pending_since = None;
    }

    /// Whether keystrokes arrived since the last parse
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    #[must_use]
    pub fn snapshot(&self, now: Duration) -> DebounceSnapshot {
        let since = |at: Option<Duration>| at.map(|at| now.saturating_sub(at));
        DebounceSnapshot {
            since_last_parse: since(self.last_parse),
            since_last_keystroke: since(self.last_keystroke).unwrap_or_default(),
            pending_for: since(self.pending_since).unwrap_or_default(),
        }
    }
}
