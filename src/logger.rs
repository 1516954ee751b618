// src/logger.rs

//! In-memory capture logger.
//!
//! Stands in for the agent logger. Nothing is filtered, formatted or
//! written anywhere: every call appends the logged value to the list kept
//! for its level so tests can assert on it afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{lock_ignore_poison, Message};

/// Severity levels understood by the agent logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// All levels, least severe first.
    pub const ALL: [Level; 6] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captures logged values per level.
///
/// Shared by every facade created from the same
/// [`FakeHub`](crate::FakeHub); see [`Agent::logger`](crate::Agent::logger).
#[derive(Default)]
pub struct TestLogger {
    // ---
    logs: Mutex<HashMap<Level, Vec<Message>>>,
}

/// Handle on the entries captured for one level.
///
/// Every method takes the logger's lock for the duration of the call only,
/// so a handle may be kept across code that logs, reads or resets.
#[derive(Clone, Copy)]
pub struct LevelLog<'a> {
    logger: &'a TestLogger,
    level: Level,
}

impl LevelLog<'_> {
    pub fn level(&self) -> Level {
        self.level
    }

    fn with<R>(&self, f: impl FnOnce(&mut Vec<Message>) -> R) -> R {
        let mut logs = lock_ignore_poison(&self.logger.logs);
        f(logs.entry(self.level).or_default())
    }

    /// Append an entry as if it had been logged at this level.
    pub fn push(&self, value: impl Into<Message>) {
        let value = value.into();
        self.with(|entries| entries.push(value));
    }

    pub fn len(&self) -> usize {
        self.with(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with(|entries| entries.is_empty())
    }

    pub fn contains(&self, value: &Message) -> bool {
        self.with(|entries| entries.contains(value))
    }

    pub fn get(&self, index: usize) -> Option<Message> {
        self.with(|entries| entries.get(index).cloned())
    }

    pub fn last(&self) -> Option<Message> {
        self.with(|entries| entries.last().cloned())
    }

    /// Keep only the entries matching `keep`.
    ///
    /// `keep` runs under the logger's lock and must not log.
    pub fn retain(&self, keep: impl FnMut(&Message) -> bool) {
        self.with(|entries| entries.retain(keep));
    }

    pub fn clear(&self) {
        self.with(Vec::clear);
    }

    /// Copy of the entries currently captured.
    pub fn to_vec(&self) -> Vec<Message> {
        self.with(|entries| entries.clone())
    }
}

impl fmt::Debug for LevelLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelLog")
            .field("level", &self.level)
            .field("entries", &self.to_vec())
            .finish()
    }
}

macro_rules! level_methods {
    ($($level:ident => $name:ident, $name_with:ident;)*) => {
        $(
            #[doc = concat!("Capture `value` at `", stringify!($name), "` level.")]
            pub fn $name(&self, value: impl Into<Message>) {
                self.append(Level::$level, value.into());
            }

            #[doc = concat!("Capture the result of `producer` at `", stringify!($name), "` level.")]
            ///
            /// The producer runs immediately; its result is stored, never the
            /// producer itself.
            pub fn $name_with<F, M>(&self, producer: F)
            where
                F: FnOnce() -> M,
                M: Into<Message>,
            {
                self.append(Level::$level, producer().into());
            }
        )*
    };
}

impl TestLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries captured for `level`, creating the list if absent.
    ///
    /// The returned handle reads and edits the live list, so tests may keep
    /// it while the code under test logs and inspect it afterwards.
    pub fn log(&self, level: Level) -> LevelLog<'_> {
        // ---
        lock_ignore_poison(&self.logs).entry(level).or_default();
        LevelLog { logger: self, level }
    }

    /// Snapshot of the entries captured for `level`.
    pub fn entries(&self, level: Level) -> Vec<Message> {
        self.log(level).to_vec()
    }

    level_methods! {
        Verbose => verbose, verbose_with;
        Debug => debug, debug_with;
        Info => info, info_with;
        Warn => warn, warn_with;
        Error => error, error_with;
        Fatal => fatal, fatal_with;
    }

    /// True when no level holds any entry.
    pub fn is_empty(&self) -> bool {
        lock_ignore_poison(&self.logs).values().all(Vec::is_empty)
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        lock_ignore_poison(&self.logs).clear();
    }

    fn append(&self, level: Level, value: Message) {
        self.log(level).push(value);
    }
}

impl fmt::Debug for TestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestLogger")
            .field("logs", &*lock_ignore_poison(&self.logs))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_creates_empty_level() {
        // ---
        let logger = TestLogger::new();
        assert!(logger.log(Level::Warn).is_empty());
        assert!(logger.entries(Level::Fatal).is_empty());
    }

    #[test]
    fn test_levels_are_kept_apart() {
        // ---
        let logger = TestLogger::new();
        logger.info("started");
        logger.error(json!({"code": 7}));
        logger.info("stopped");

        assert_eq!(logger.entries(Level::Info), vec![json!("started"), json!("stopped")]);
        assert_eq!(logger.entries(Level::Error), vec![json!({"code": 7})]);
        assert!(logger.entries(Level::Debug).is_empty());
    }

    fn log_literal(logger: &TestLogger, level: Level, value: Message) {
        match level {
            Level::Verbose => logger.verbose(value),
            Level::Debug => logger.debug(value),
            Level::Info => logger.info(value),
            Level::Warn => logger.warn(value),
            Level::Error => logger.error(value),
            Level::Fatal => logger.fatal(value),
        }
    }

    fn log_lazy(logger: &TestLogger, level: Level, value: Message) {
        match level {
            Level::Verbose => logger.verbose_with(|| value),
            Level::Debug => logger.debug_with(|| value),
            Level::Info => logger.info_with(|| value),
            Level::Warn => logger.warn_with(|| value),
            Level::Error => logger.error_with(|| value),
            Level::Fatal => logger.fatal_with(|| value),
        }
    }

    #[test]
    fn test_producer_and_literal_capture_the_same() {
        // ---
        let literal = TestLogger::new();
        let lazy = TestLogger::new();

        for level in Level::ALL {
            for value in [json!(level.as_str()), json!({"level": level, "n": 1}), json!(null)] {
                log_literal(&literal, level, value.clone());
                log_lazy(&lazy, level, value);
            }
        }

        for level in Level::ALL {
            assert_eq!(literal.entries(level).len(), 3);
            assert_eq!(literal.entries(level), lazy.entries(level));
        }
    }

    #[test]
    fn test_producer_runs_once_per_call() {
        // ---
        let logger = TestLogger::new();
        let mut calls = 0;
        logger.debug_with(|| {
            calls += 1;
            json!(calls)
        });

        assert_eq!(calls, 1);
        assert_eq!(logger.entries(Level::Debug), vec![json!(1)]);
    }

    #[test]
    fn test_log_view_is_mutable() {
        // ---
        let logger = TestLogger::new();
        logger.warn("a");
        logger.log(Level::Warn).push(json!("b"));
        logger.log(Level::Warn).retain(|m| m != &json!("a"));

        assert_eq!(logger.entries(Level::Warn), vec![json!("b")]);
        assert_eq!(logger.log(Level::Warn).last(), Some(json!("b")));
    }

    #[test]
    fn test_held_view_sees_later_logging() {
        // ---
        let logger = TestLogger::new();
        let view = logger.log(Level::Info);

        logger.info("x");
        logger.info_with(|| "y");
        assert!(!logger.is_empty());

        assert_eq!(view.len(), 2);
        assert!(view.contains(&json!("x")));
        assert_eq!(view.get(1), Some(json!("y")));
        assert_eq!(logger.entries(Level::Info), view.to_vec());

        logger.clear();
        assert!(view.is_empty());
        view.push("z");
        assert_eq!(logger.entries(Level::Info), vec![json!("z")]);
    }

    #[test]
    fn test_clear() {
        // ---
        let logger = TestLogger::new();
        logger.fatal("boom");
        assert!(!logger.is_empty());

        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_level_names_round_trip_through_serde() {
        // ---
        let level: Level = serde_json::from_value(json!("warn")).unwrap();
        assert_eq!(level, Level::Warn);
        assert_eq!(Level::Fatal.to_string(), "fatal");
    }
}
