use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Logs how long an operation took once stopped
pub struct Timer {
    operation: &'static str,
    start: Instant,
    stopped: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Get elapsed time without stopping the timer
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and log the duration
    pub fn stop(mut self) {
        self.stopped = true;
        let duration_ms = self.start.elapsed().as_millis();
        info!(operation = self.operation, duration_ms, "Operation completed");
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        // Dropped without stop(): the future was cancelled or an error
        // short-circuited with `?`.
        if !self.stopped {
            debug!(
                operation = self.operation,
                duration_ms = self.start.elapsed().as_millis(),
                "Timer dropped before completion"
            );
        }
    }
}
