//! Log sinks for operation messages.
//!
//! An operation never talks to a global logger directly: it checks
//! [`LogSink::enabled`] and its own silence flag, then hands the message to
//! the sink. [`TracingSink`] is the default and forwards to `tracing`.

use std::sync::{Arc, Mutex};
use tracing::Level;

/// Target used for events emitted through [`TracingSink`].
pub const TARGET: &str = "jbang_op";

pub trait LogSink: Send + Sync {
    fn enabled(&self, level: Level) -> bool;

    /// Must not panic or block on failure.
    fn log(&self, level: Level, message: &str);
}

macro_rules! dispatch_level {
    ($level:expr, $mac:ident) => {
        if $level == Level::ERROR {
            $mac!(Level::ERROR)
        } else if $level == Level::WARN {
            $mac!(Level::WARN)
        } else if $level == Level::INFO {
            $mac!(Level::INFO)
        } else if $level == Level::DEBUG {
            $mac!(Level::DEBUG)
        } else {
            $mac!(Level::TRACE)
        }
    };
}

/// Forwards messages to the installed `tracing` subscriber, whose filter
/// decides what is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn enabled(&self, level: Level) -> bool {
        macro_rules! check {
            ($lvl:expr) => {
                tracing::enabled!(target: TARGET, $lvl)
            };
        }
        dispatch_level!(level, check)
    }

    fn log(&self, level: Level, message: &str) {
        macro_rules! emit {
            ($lvl:expr) => {
                tracing::event!(target: TARGET, $lvl, "{}", message)
            };
        }
        dispatch_level!(level, emit)
    }
}

pub(crate) fn tracing_sink() -> Arc<dyn LogSink> {
    Arc::new(TracingSink)
}

/// In-memory sink that records every enabled message.
///
/// `threshold` is the most verbose level recorded; `None` turns the sink
/// off entirely.
#[derive(Debug)]
pub struct MemorySink {
    threshold: Option<Level>,
    records: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    /// Records everything.
    pub fn new() -> Self {
        Self::with_threshold(Some(Level::TRACE))
    }

    pub fn with_threshold(threshold: Option<Level>) -> Self {
        Self {
            threshold,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, msg)| msg).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    pub fn contains_message(&self, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(_, msg)| msg.contains(needle))
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for MemorySink {
    fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: ERROR < WARN < ... < TRACE
        match self.threshold {
            Some(threshold) => level <= threshold,
            None => false,
        }
    }

    fn log(&self, level: Level, message: &str) {
        if self.enabled(level) {
            self.records
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((level, message.to_string()));
        }
    }
}
