//! Wall-clock timing of loop assembly.
//!
//! Off unless [`enable_timing`] was called or `IC_TIMING` is set. Elapsed
//! times go to `tracing` at debug level under the `ic::timing` target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("IC_TIMING").is_some()
}

/// Labelled stopwatch; a no-op when timing is disabled at start.
pub struct Timer {
    label: &'static str,
    started: Option<Instant>,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: is_enabled().then(Instant::now),
        }
    }

    /// Elapsed seconds, or `None` if the timer was started disabled.
    pub fn stop(self) -> Option<f64> {
        self.started.map(|t| t.elapsed().as_secs_f64())
    }

    pub fn stop_and_log(self) {
        let label = self.label;
        if let Some(elapsed_s) = self.stop() {
            tracing::debug!(target: "ic::timing", label, elapsed_s, "timer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_timer_reports() {
        enable_timing();
        let t = Timer::start("tickle");
        assert!(t.stop().is_some_and(|s| s >= 0.0));
        disable_timing();
    }
}
