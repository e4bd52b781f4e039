//! Lightweight performance timing utilities.
//!
//! Simple wall-clock measurement for build and run phases. Enabled through
//! the `PF_TIMING` environment variable or programmatically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("PF_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }
}

/// Performance statistics for one build + run.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub build_time_s: f64,
    pub run_time_s: f64,
    pub ticks: u64,
    pub simulated_s: f64,
    pub numeric_warnings: u64,
}

impl RunStats {
    /// Simulated seconds per wall-clock second.
    pub fn realtime_factor(&self) -> Option<f64> {
        (self.run_time_s > 0.0).then(|| self.simulated_s / self.run_time_s)
    }

    /// Formatted summary lines, empty when timing is disabled.
    pub fn summary_lines(&self) -> Vec<String> {
        if !is_enabled() {
            return Vec::new();
        }
        let mut lines = vec![
            format!("Build time:          {:.3}s", self.build_time_s),
            format!("Run time:            {:.3}s", self.run_time_s),
            format!("  Ticks:             {}", self.ticks),
        ];
        if self.ticks > 0 {
            lines.push(format!(
                "  Avg tick time:     {:.3}us",
                self.run_time_s / self.ticks as f64 * 1e6
            ));
        }
        if let Some(factor) = self.realtime_factor() {
            lines.push(format!("  Realtime factor:   {:.1}x", factor));
        }
        if self.numeric_warnings > 0 {
            lines.push(format!("Numeric warnings:    {}", self.numeric_warnings));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_factor_requires_run_time() {
        let mut stats = RunStats::default();
        assert!(stats.realtime_factor().is_none());
        stats.run_time_s = 2.0;
        stats.simulated_s = 10.0;
        assert_eq!(stats.realtime_factor(), Some(5.0));
    }
}
