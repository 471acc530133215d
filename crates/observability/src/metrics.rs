//! Metric recorders and run timing
//!
//! Recorders are no-ops until a recorder (e.g. Prometheus) is installed.

use std::fmt;
use std::time::Duration;

use contracts::SubscriptionState;
use metrics::{counter, histogram};

/// Record one element delivered to a subscriber
pub fn record_element_emitted() {
    counter!("streamlab_elements_emitted_total").increment(1);
}

/// Record a subscription reaching a terminal state
pub fn record_subscription_finished(state: SubscriptionState) {
    counter!(
        "streamlab_subscriptions_finished_total",
        "state" => state.as_str()
    )
    .increment(1);
}

/// Record an HTTP request served
pub fn record_http_request(path: &str, status: u16) {
    counter!(
        "streamlab_http_requests_total",
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record demo scenario wall time
pub fn record_scenario_duration_ms(scenario: &str, duration_ms: f64) {
    histogram!(
        "streamlab_scenario_duration_ms",
        "scenario" => scenario.to_string()
    )
    .record(duration_ms);
}

/// Wall-time samples for a batch of runs
#[derive(Debug, Clone, Default)]
pub struct TimingStats {
    samples: Vec<Duration>,
}

impl TimingStats {
    pub fn record(&mut self, elapsed: Duration) {
        self.samples.push(elapsed);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    /// Upper median for even sample counts
    pub fn median(&self) -> Option<Duration> {
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        sorted.get(sorted.len() / 2).copied()
    }

    pub fn summary(&self) -> TimingSummary {
        TimingSummary {
            runs: self.samples.len(),
            total: self.total(),
            fastest: self.samples.iter().min().copied(),
            slowest: self.samples.iter().max().copied(),
            median: self.median(),
        }
    }
}

/// Snapshot of a `TimingStats`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSummary {
    pub runs: usize,
    pub total: Duration,
    pub fastest: Option<Duration>,
    pub slowest: Option<Duration>,
    pub median: Option<Duration>,
}

impl fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.fastest, self.median, self.slowest) {
            (Some(fastest), Some(median), Some(slowest)) => write!(
                f,
                "{} runs in {:?} (fastest {:?}, median {:?}, slowest {:?})",
                self.runs, self.total, fastest, median, slowest
            ),
            _ => f.write_str("no runs"),
        }
    }
}
