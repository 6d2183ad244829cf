//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use crate::domain::types::{epoch_ms, RejectKind};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps the interval counters to get a
/// consistent snapshot.
pub struct Metrics {
    /// Total events ever processed (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Sum of processing latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max processing latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Touches that entered the open state (monotonic)
    touches_started: AtomicU64,
    /// Touches closed with an emission (monotonic)
    touches_completed: AtomicU64,
    /// Events dropped as malformed (monotonic)
    rejected_malformed: AtomicU64,
    /// Events dropped for an unknown station key (monotonic)
    rejected_unknown_station: AtomicU64,
    /// end_touch dropped while session not open (monotonic)
    rejected_invalid_transition: AtomicU64,
    /// Events with an unrecognized flavor (monotonic)
    ignored_flavors: AtomicU64,
    /// Heartbeats recorded (monotonic)
    beats_total: AtomicU64,
    /// Datagrams decoded and forwarded (monotonic)
    udp_received: AtomicU64,
    /// Datagrams dropped because the event channel was full (monotonic)
    udp_dropped: AtomicU64,
    /// Emissions dropped because the emit channel was full (monotonic)
    emit_dropped: AtomicU64,
    /// Epoch ms of the previous report, for events-per-second
    last_report_ms: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            touches_started: AtomicU64::new(0),
            touches_completed: AtomicU64::new(0),
            rejected_malformed: AtomicU64::new(0),
            rejected_unknown_station: AtomicU64::new(0),
            rejected_invalid_transition: AtomicU64::new(0),
            ignored_flavors: AtomicU64::new(0),
            beats_total: AtomicU64::new(0),
            udp_received: AtomicU64::new(0),
            udp_dropped: AtomicU64::new(0),
            emit_dropped: AtomicU64::new(0),
            last_report_ms: AtomicU64::new(epoch_ms()),
        }
    }

    /// Record one processed event and its processing latency (lock-free)
    pub fn record_event_processed(&self, latency_us: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    pub fn record_touch_started(&self) {
        self.touches_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_touch_completed(&self) {
        self.touches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, kind: RejectKind) {
        let counter = match kind {
            RejectKind::MalformedMessage => &self.rejected_malformed,
            RejectKind::UnknownStation => &self.rejected_unknown_station,
            RejectKind::InvalidTransition => &self.rejected_invalid_transition,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored_flavor(&self) {
        self.ignored_flavors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_beat(&self) {
        self.beats_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_udp_received(&self) {
        self.udp_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_udp_dropped(&self) {
        self.udp_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emit_dropped(&self) {
        self.emit_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Produce a snapshot, resetting the interval counters
    pub fn report(&self, open_touches: usize) -> MetricsSummary {
        let now_ms = epoch_ms();
        let last_ms = self.last_report_ms.swap(now_ms, Ordering::Relaxed);
        let interval_ms = now_ms.saturating_sub(last_ms).max(1);

        let events_interval = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);

        let avg_latency_us = if events_interval > 0 { latency_sum / events_interval } else { 0 };
        let events_per_sec = events_interval as f64 * 1000.0 / interval_ms as f64;

        MetricsSummary {
            events_total: self.events_total.load(Ordering::Relaxed),
            events_per_sec,
            avg_latency_us,
            max_latency_us: latency_max,
            open_touches,
            touches_started: self.touches_started.load(Ordering::Relaxed),
            touches_completed: self.touches_completed.load(Ordering::Relaxed),
            rejected_malformed: self.rejected_malformed.load(Ordering::Relaxed),
            rejected_unknown_station: self.rejected_unknown_station.load(Ordering::Relaxed),
            rejected_invalid_transition: self.rejected_invalid_transition.load(Ordering::Relaxed),
            ignored_flavors: self.ignored_flavors.load(Ordering::Relaxed),
            beats_total: self.beats_total.load(Ordering::Relaxed),
            udp_received: self.udp_received.load(Ordering::Relaxed),
            udp_dropped: self.udp_dropped.load(Ordering::Relaxed),
            emit_dropped: self.emit_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Consistent snapshot of the counters at report time
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub events_total: u64,
    pub events_per_sec: f64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    pub open_touches: usize,
    pub touches_started: u64,
    pub touches_completed: u64,
    pub rejected_malformed: u64,
    pub rejected_unknown_station: u64,
    pub rejected_invalid_transition: u64,
    pub ignored_flavors: u64,
    pub beats_total: u64,
    pub udp_received: u64,
    pub udp_dropped: u64,
    pub emit_dropped: u64,
}

impl MetricsSummary {
    /// Emit the snapshot as a structured log line
    pub fn log(&self) {
        info!(
            events_total = %self.events_total,
            events_per_sec = %format!("{:.1}", self.events_per_sec),
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            open_touches = %self.open_touches,
            touches_started = %self.touches_started,
            touches_completed = %self.touches_completed,
            rejected_malformed = %self.rejected_malformed,
            rejected_unknown_station = %self.rejected_unknown_station,
            rejected_invalid_transition = %self.rejected_invalid_transition,
            ignored_flavors = %self.ignored_flavors,
            beats_total = %self.beats_total,
            udp_received = %self.udp_received,
            udp_dropped = %self.udp_dropped,
            emit_dropped = %self.emit_dropped,
            "metrics_report"
        );
    }
}
