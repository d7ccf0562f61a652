//! Time-related utilities with clock abstraction for testability.

use chrono::Local;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current local wall-clock time rendered as `HH:MM:SS`
    fn now_hms(&self) -> String;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_hms(&self) -> String {
        local_time_hms()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone)]
pub struct FixedClock {
    fixed_time: String,
}

impl FixedClock {
    /// Create a new fixed clock with the given `HH:MM:SS` string
    pub fn new(fixed_time: impl Into<String>) -> Self {
        Self {
            fixed_time: fixed_time.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now_hms(&self) -> String {
        self.fixed_time.clone()
    }
}

/// Current local time rendered as `HH:MM:SS`.
///
/// This is the timestamp the server stamps on every message at broadcast
/// time; it travels on the wire as text.
pub fn local_time_hms() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
