//! Event handlers for the TouchTracker
//!
//! Each handler processes one event flavor, updating session state and
//! triggering side effects (emissions, vote log records).

use super::TouchTracker;
use crate::domain::types::{epoch_ms, RejectKind, TouchMsg};
use crate::infra::config::EmitMode;
use crate::io::emit_channel::{BubblePayload, VotePayload};
use crate::io::vote_log::VoteRecord;
use tracing::{debug, info, warn};

impl TouchTracker {
    /// Handle a touch opening at a station
    ///
    /// A start while already touching re-arms the timestamp; the key stays
    /// in the touching state and no second vote_start is emitted.
    pub(crate) fn handle_start_touch(&mut self, msg: &TouchMsg) {
        let ts = epoch_ms();

        let Some(station) = self.stations.lookup(&msg.source, &msg.choice) else {
            warn!(
                source = %msg.source,
                choice = %msg.choice,
                "cannot start touch from unexpected station"
            );
            self.metrics.record_rejected(RejectKind::UnknownStation);
            return;
        };
        let station_id = station.id;
        let key = station.key();

        // Sessions are created together with the index, 1:1 per key
        let Some(session) = self.sessions.get_mut(&key) else {
            return;
        };

        if session.started_at.replace(msg.received_at).is_some() {
            debug!(key = %key, "touch_rearmed");
        } else {
            debug!(key = %key, station_id = %station_id, "touch_started");
            self.metrics.record_touch_started();

            if self.config.emit_mode() == EmitMode::IdOnly {
                if let Some(ref sender) = self.emit_sender {
                    sender.send_vote_start(VotePayload { station_id: station_id.0, ts });
                }
            }
        }

        self.vote_log.record(&VoteRecord::started(&msg.source, &msg.choice, ts));
    }

    /// Handle a touch closing at a station
    ///
    /// Computes the elapsed duration, maps it to a radius, and emits the
    /// result. An end with no open session is rejected.
    pub(crate) fn handle_end_touch(&mut self, msg: &TouchMsg) {
        let ts = epoch_ms();

        let Some(station) = self.stations.lookup(&msg.source, &msg.choice) else {
            warn!(
                source = %msg.source,
                choice = %msg.choice,
                "cannot end touch from unexpected station"
            );
            self.metrics.record_rejected(RejectKind::UnknownStation);
            return;
        };
        let station_id = station.id;
        let key = station.key();
        let (x, y) = (station.x.unwrap_or(0.0), station.y.unwrap_or(0.0));

        let Some(session) = self.sessions.get_mut(&key) else {
            return;
        };

        let Some(started_at) = session.started_at.take() else {
            warn!(
                source = %msg.source,
                choice = %msg.choice,
                "cannot end unstarted touch"
            );
            self.metrics.record_rejected(RejectKind::InvalidTransition);
            return;
        };

        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        let radius = self.radius.radius_for(elapsed_ms);

        info!(
            key = %key,
            station_id = %station_id,
            elapsed_ms = %elapsed_ms,
            radius = %radius,
            "touch_completed"
        );
        self.metrics.record_touch_completed();

        if let Some(ref sender) = self.emit_sender {
            match self.config.emit_mode() {
                EmitMode::Coordinates => sender.send_bubble(BubblePayload {
                    x,
                    y,
                    radius,
                    station_id: station_id.0,
                    ts,
                }),
                EmitMode::IdOnly => {
                    sender.send_vote_end(VotePayload { station_id: station_id.0, ts })
                }
            }
        }

        self.vote_log.record(&VoteRecord::ended(&msg.source, &msg.choice, ts, elapsed_ms, radius));
    }

    /// Handle a heartbeat from station firmware
    pub(crate) fn handle_touch_beat(&mut self, msg: &TouchMsg) {
        match self.beats.get_mut(&msg.source) {
            Some(last_beat) => {
                *last_beat = msg.received_at;
                self.metrics.record_beat();
                debug!(source = %msg.source, "touch_beat");
            }
            None => {
                warn!(source = %msg.source, "unrecognized touch beat source");
                self.metrics.record_rejected(RejectKind::UnknownStation);
            }
        }
    }
}
