//! Typed channel for rendering emissions
//!
//! Provides a non-blocking way to hand results to the rendering
//! collaborator. Uses a bounded mpsc channel to prevent unbounded memory
//! growth; a full channel drops the message and counts it.

use crate::infra::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Messages that can be sent to the rendering collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum EmitMessage {
    /// Completed touch with coordinates and duration-derived radius
    Bubble(BubblePayload),
    /// A station key entered the touching state
    VoteStart(VotePayload),
    /// A station key left the touching state
    VoteEnd(VotePayload),
}

/// Payload for a completed touch in coordinates mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePayload {
    /// Display coordinates of the station
    pub x: f64,
    pub y: f64,
    /// Duration-derived radius (pixels)
    pub radius: f64,
    pub station_id: i64,
    /// Timestamp (epoch ms)
    pub ts: u64,
}

/// Payload for vote transitions in id-only mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VotePayload {
    pub station_id: i64,
    /// Timestamp (epoch ms)
    pub ts: u64,
}

/// Sender handle for emissions
///
/// Clone this to share across producers. Non-blocking - if the channel is
/// full, messages are dropped and counted.
#[derive(Clone)]
pub struct EmitSender {
    tx: mpsc::Sender<EmitMessage>,
    metrics: Arc<Metrics>,
}

impl EmitSender {
    pub fn new(tx: mpsc::Sender<EmitMessage>, metrics: Arc<Metrics>) -> Self {
        Self { tx, metrics }
    }

    pub fn send_bubble(&self, payload: BubblePayload) {
        self.send(EmitMessage::Bubble(payload));
    }

    pub fn send_vote_start(&self, payload: VotePayload) {
        self.send(EmitMessage::VoteStart(payload));
    }

    pub fn send_vote_end(&self, payload: VotePayload) {
        self.send(EmitMessage::VoteEnd(payload));
    }

    fn send(&self, message: EmitMessage) {
        // Use try_send to avoid blocking the tracker - drop if channel full
        if self.tx.try_send(message).is_err() {
            self.metrics.record_emit_dropped();
        }
    }
}

/// Create a new emit channel pair
///
/// Returns (sender, receiver) where sender can be cloned and shared.
/// Buffer size determines how many messages can be queued.
pub fn create_emit_channel(
    buffer_size: usize,
    metrics: Arc<Metrics>,
) -> (EmitSender, mpsc::Receiver<EmitMessage>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EmitSender::new(tx, metrics), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_receive() {
        let metrics = Arc::new(Metrics::new());
        let (sender, mut rx) = create_emit_channel(4, metrics);

        sender.send_bubble(BubblePayload { x: 1.0, y: 2.0, radius: 10.0, station_id: 1, ts: 0 });
        sender.send_vote_end(VotePayload { station_id: 2, ts: 0 });

        assert!(matches!(rx.try_recv().unwrap(), EmitMessage::Bubble(_)));
        match rx.try_recv().unwrap() {
            EmitMessage::VoteEnd(p) => assert_eq!(p.station_id, 2),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let metrics = Arc::new(Metrics::new());
        let (sender, _rx) = create_emit_channel(1, metrics.clone());

        sender.send_vote_start(VotePayload { station_id: 1, ts: 0 });
        sender.send_vote_start(VotePayload { station_id: 1, ts: 0 });

        assert_eq!(metrics.report(0).emit_dropped, 1);
    }

    #[test]
    fn test_bubble_serializes_tagged() {
        let msg = EmitMessage::Bubble(BubblePayload {
            x: 1.5,
            y: 2.5,
            radius: 7.5,
            station_id: 3,
            ts: 1000,
        });
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(json["t"], "bubble");
        assert_eq!(json["radius"], 7.5);
        assert_eq!(json["station_id"], 3);
    }
}
