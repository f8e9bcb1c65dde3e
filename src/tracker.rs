//! Elapsed-time tracking for pipeline stages.

use std::time::Instant;
use tracing::debug;

/// Logs how long a stage took when it goes out of scope.
///
/// Bind it to a named variable (`let _timer = ...`) so it lives until the end of
/// the enclosing scope.
pub struct TrackTime {
    start: Instant,
    description: String,
}

impl TrackTime {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            description: description.into(),
        }
    }
}

impl Drop for TrackTime {
    fn drop(&mut self) {
        debug!("{} took {:?}", self.description, self.start.elapsed());
    }
}
