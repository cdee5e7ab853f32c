//! Lightweight performance timing utilities.
//!
//! Timing is off unless enabled programmatically or through the
//! `CAV_TIMING` environment variable. Disabled timers cost one atomic load.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn kernel timing on for the whole process.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Turn kernel timing off again.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Whether kernel timers record.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("CAV_TIMING").is_ok()
}

/// Wall-clock timer for one labelled section.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Start a timer that measures only when timing is enabled.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// A timer that always measures, regardless of the global switch.
    pub fn always(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: true,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Elapsed seconds, or `None` for a disabled timer.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop and add the elapsed time to `acc` when enabled.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }
}

/// Running total of many short measurements, shareable as a `static`.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Seconds recorded so far.
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn average_seconds(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.total_seconds() / n as f64,
        }
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Per-kernel timers for the relaxation loop.
pub mod kernel_timing {
    use super::AccumulatingTimer;

    /// Local time-step estimation
    pub static TIME_STEP: AccumulatingTimer = AccumulatingTimer::new();
    /// Artificial dissipation evaluation
    pub static DISSIPATION: AccumulatingTimer = AccumulatingTimer::new();
    /// Relaxation sweeps (forward, backward or Jacobi pass)
    pub static SWEEP: AccumulatingTimer = AccumulatingTimer::new();
    /// Boundary condition application
    pub static BOUNDARY: AccumulatingTimer = AccumulatingTimer::new();
    /// Residual norms and convergence ratio
    pub static MONITOR: AccumulatingTimer = AccumulatingTimer::new();

    fn all() -> [(&'static str, &'static AccumulatingTimer); 5] {
        [
            ("time step", &TIME_STEP),
            ("dissipation", &DISSIPATION),
            ("sweep", &SWEEP),
            ("boundary", &BOUNDARY),
            ("monitor", &MONITOR),
        ]
    }

    /// Reset all kernel timers.
    pub fn reset_all() {
        for (_, timer) in all() {
            timer.reset();
        }
    }

    /// Formatted breakdown, one kernel per line. Empty when nothing was recorded.
    pub fn summary() -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        for (label, timer) in all() {
            let count = timer.count();
            if count > 0 {
                let _ = writeln!(
                    out,
                    "{:<12} {} calls, {:.3}s total, {:.4}ms avg",
                    label,
                    count,
                    timer.total_seconds(),
                    timer.average_seconds() * 1000.0
                );
            }
        }
        out
    }
}

/// Wall-clock breakdown of one run.
#[derive(Clone, Debug, Default)]
pub struct PerfStats {
    pub setup_time_s: f64,
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub iterations: usize,
}

impl PerfStats {
    pub fn total_time_s(&self) -> f64 {
        self.setup_time_s + self.solve_time_s + self.save_time_s
    }

    /// Formatted summary including the kernel breakdown when timing is enabled.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Setup:  {:.3}s", self.setup_time_s);
        let _ = writeln!(out, "Solve:  {:.3}s", self.solve_time_s);
        if self.iterations > 0 {
            let _ = writeln!(
                out,
                "  Avg iteration: {:.4}ms",
                1000.0 * self.solve_time_s / self.iterations as f64
            );
        }
        let _ = writeln!(out, "Save:   {:.3}s", self.save_time_s);
        let _ = writeln!(out, "Total:  {:.3}s", self.total_time_s());
        if is_enabled() {
            out.push_str(&kernel_timing::summary());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_averages() {
        let acc = AccumulatingTimer::new();
        acc.record(0.5);
        acc.record(1.5);
        assert_eq!(acc.count(), 2);
        assert!((acc.total_seconds() - 2.0).abs() < 1e-9);
        assert!((acc.average_seconds() - 1.0).abs() < 1e-9);
        acc.reset();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.average_seconds(), 0.0);
    }

    #[test]
    fn always_timer_reports_elapsed() {
        let t = Timer::always("test");
        assert_eq!(t.label(), "test");
        assert!(t.stop().is_some());
    }

    #[test]
    fn perf_stats_total_sums_phases() {
        let stats = PerfStats {
            setup_time_s: 0.25,
            solve_time_s: 1.0,
            save_time_s: 0.5,
            iterations: 10,
        };
        assert!((stats.total_time_s() - 1.75).abs() < 1e-12);
        assert!(stats.summary().contains("Avg iteration"));
    }
}
