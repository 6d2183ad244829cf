//! Touch session tracking and event orchestration
//!
//! The TouchTracker is the central event processor that coordinates:
//! - Session state management (one open/closed touch per station key)
//! - Duration-to-radius mapping on touch completion
//! - Emission to the rendering collaborator
//! - Station heartbeat bookkeeping

mod handlers;

use crate::domain::radius::RadiusMap;
use crate::domain::types::{Flavor, StationKey, TouchMsg, TouchSession};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::emit_channel::EmitSender;
use crate::io::vote_log::VoteLog;
use crate::services::station_index::StationIndex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::warn;

/// Central event processor for touch session tracking
pub struct TouchTracker {
    /// Immutable station lookup
    pub(crate) stations: StationIndex,
    /// One session per station key, pre-allocated closed
    pub(crate) sessions: FxHashMap<StationKey, TouchSession>,
    /// Last heartbeat per distinct source
    pub(crate) beats: FxHashMap<String, Instant>,
    /// Duration-to-radius mapping
    pub(crate) radius: RadiusMap,
    /// Writes accepted touch events to file
    pub(crate) vote_log: VoteLog,
    /// Application configuration
    pub(crate) config: Config,
    /// Metrics collector
    pub(crate) metrics: Arc<Metrics>,
    /// Emission channel to the rendering collaborator (optional)
    pub(crate) emit_sender: Option<EmitSender>,
}

impl TouchTracker {
    /// Create a new TouchTracker with the given configuration and dependencies
    ///
    /// Sessions are created together with the index, one per station key;
    /// no session ever exists for a key the index does not hold.
    pub fn new(
        config: Config,
        stations: StationIndex,
        metrics: Arc<Metrics>,
        emit_sender: Option<EmitSender>,
    ) -> Self {
        let sessions = stations
            .keys()
            .cloned()
            .map(|key| (key, TouchSession::default()))
            .collect();
        let beats = stations
            .sources()
            .into_iter()
            .map(|source| (source, Instant::now()))
            .collect();
        let radius =
            RadiusMap::new(config.max_duration_ms(), config.min_radius(), config.max_radius());
        let vote_log = VoteLog::new(config.vote_log_file());
        Self { stations, sessions, beats, radius, vote_log, config, metrics, emit_sender }
    }

    /// Start the tracker, consuming events from the channel
    pub async fn run(&mut self, mut event_rx: mpsc::Receiver<TouchMsg>) {
        // Tick interval for heartbeat staleness checks
        let mut tick_interval =
            interval(Duration::from_secs(self.config.beat_check_interval_secs().max(1)));

        loop {
            tokio::select! {
                // Process incoming events
                event = event_rx.recv() => {
                    match event {
                        Some(msg) => self.process_event(msg),
                        None => break, // Channel closed
                    }
                }
                // Periodic tick for heartbeat staleness
                _ = tick_interval.tick() => {
                    self.check_beats();
                }
            }
        }
    }

    /// Process a single event, dispatching to the appropriate handler
    pub fn process_event(&mut self, msg: TouchMsg) {
        let process_start = Instant::now();

        match msg.flavor {
            Flavor::StartTouch => self.handle_start_touch(&msg),
            Flavor::EndTouch => self.handle_end_touch(&msg),
            Flavor::TouchBeat => self.handle_touch_beat(&msg),
            Flavor::Unknown(_) => {
                self.metrics.record_ignored_flavor();
            }
        }

        // Record processing latency (lock-free)
        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_event_processed(latency_us);
    }

    /// Warn once per tick for each source past the beat timeout
    fn check_beats(&self) {
        let timeout_ms = self.config.beat_timeout_ms() as u128;
        for (source, last_beat) in &self.beats {
            let age = last_beat.elapsed();
            if age.as_millis() > timeout_ms {
                warn!(
                    source = %source,
                    age_ms = %age.as_millis(),
                    "station_beat_stale"
                );
            }
        }
    }

    /// Get current count of open touches
    pub fn open_touches(&self) -> usize {
        self.sessions.values().filter(|s| s.is_open()).count()
    }
}
