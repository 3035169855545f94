use std::time::{Duration, Instant};

/// Rate limiter that lets at most one trigger through per interval
///
/// Time is passed in by the caller so the game loop and tests can drive it
/// from the same clock.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    last_trigger: Option<Instant>,
    interval: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified interval in milliseconds
    pub fn new(interval_ms: u64) -> Self {
        Self {
            last_trigger: None,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Check if enough time has passed since last trigger
    /// Returns true if we should trigger, false if still inside the interval
    pub fn should_trigger(&mut self, now: Instant) -> bool {
        match self.last_trigger {
            None => {
                self.last_trigger = Some(now);
                true
            }
            Some(last) => {
                if now.saturating_duration_since(last) >= self.interval {
                    self.last_trigger = Some(now);
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Timing measurements for a single loop iteration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IterationTiming {
    pub capture_us: f64,
    pub locate_us: f64,
    pub score_us: f64,
    pub render_us: f64,
    pub total_us: f64,
}

impl IterationTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> f64 {
        self.total_us / 1000.0
    }
}

/// Elapsed microseconds since `start`
pub fn micros_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000_000.0
}

/// Per-stage latency summary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageStats {
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Statistics collector for latency measurements
#[derive(Debug, Default)]
pub struct LatencyStats {
    timings: Vec<IterationTiming>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timings: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, timing: IterationTiming) {
        self.timings.push(timing);
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Nearest-rank percentile from sorted data
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx]
    }

    /// Calculate statistics for a specific stage
    pub fn stage_stats(&self, extract: impl Fn(&IterationTiming) -> f64) -> StageStats {
        if self.timings.is_empty() {
            return StageStats::default();
        }

        let mut values: Vec<f64> = self.timings.iter().map(&extract).collect();
        values.sort_by(|a, b| a.total_cmp(b));

        StageStats {
            mean: values.iter().sum::<f64>() / values.len() as f64,
            p50: Self::percentile(&values, 50.0),
            p95: Self::percentile(&values, 95.0),
            p99: Self::percentile(&values, 99.0),
        }
    }

    /// Log the latency table
    pub fn report(&self) {
        if self.timings.is_empty() {
            tracing::info!("No timing data collected");
            return;
        }

        let stages = [
            ("Capture", self.stage_stats(|t| t.capture_us)),
            ("Locate", self.stage_stats(|t| t.locate_us)),
            ("Score", self.stage_stats(|t| t.score_us)),
            ("Render", self.stage_stats(|t| t.render_us)),
        ];
        let total = self.stage_stats(|t| t.total_us);

        tracing::info!("Latency over {} frames", self.timings.len());
        tracing::info!("┌─────────────────┬───────────┬───────────┬───────────┬───────────┐");
        tracing::info!("│ Stage           │   Mean    │   p50     │   p95     │   p99     │");
        tracing::info!("├─────────────────┼───────────┼───────────┼───────────┼───────────┤");
        for (name, stats) in &stages {
            Self::log_row(name, stats);
        }
        tracing::info!("├─────────────────┼───────────┼───────────┼───────────┼───────────┤");
        Self::log_row("TOTAL", &total);
        tracing::info!("└─────────────────┴───────────┴───────────┴───────────┴───────────┘");

        if let Some((name, stats)) = stages.iter().max_by(|a, b| a.1.p95.total_cmp(&b.1.p95)) {
            tracing::info!("Bottleneck: {} ({:.0} µs p95)", name, stats.p95);
        }
    }

    fn log_row(name: &str, stats: &StageStats) {
        tracing::info!(
            "│ {:<15} │ {:>6.0} µs │ {:>6.0} µs │ {:>6.0} µs │ {:>6.0} µs │",
            name,
            stats.mean,
            stats.p50,
            stats.p95,
            stats.p99
        );
    }
}
