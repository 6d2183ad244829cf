//! UDP listener for station firmware datagrams
//!
//! Listens on port 3333 for JSON messages from the station firmware,
//! one message per datagram. Decoded events are forwarded to the tracker
//! via try_send to never block the socket loop - drops are counted in
//! metrics.

use crate::domain::types::{Flavor, RejectKind, TouchMsg, WireMsg};
use crate::infra::metrics::Metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// UDP listener configuration
#[derive(Debug, Clone)]
pub struct UdpListenerConfig {
    pub port: u16,
    pub enabled: bool,
}

impl Default for UdpListenerConfig {
    fn default() -> Self {
        Self { port: 3333, enabled: true }
    }
}

/// Decode one datagram into a touch message
///
/// A message without a flavor field is malformed. Missing source or choice
/// default to empty strings and fail station lookup downstream, matching
/// the firmware's sparse error handling.
pub fn decode_touch_msg(payload: &[u8], received_at: Instant) -> anyhow::Result<TouchMsg> {
    let wire: WireMsg = serde_json::from_slice(payload)?;

    let Some(flavor) = wire.flavor else {
        anyhow::bail!("message missing flavor field");
    };
    // FromStr on Flavor is infallible; unknown strings map to Flavor::Unknown
    let flavor: Flavor = flavor.parse().unwrap();

    Ok(TouchMsg {
        flavor,
        source: wire.source.unwrap_or_default(),
        choice: wire.choice.unwrap_or_default(),
        received_at,
    })
}

/// Start the UDP listener
///
/// Receives datagrams from station firmware and sends decoded events to
/// the tracker.
pub async fn start_udp_listener(
    config: UdpListenerConfig,
    event_tx: mpsc::Sender<TouchMsg>,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !config.enabled {
        info!("udp_listener_disabled");
        return Ok(());
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let socket = UdpSocket::bind(&addr).await?;

    info!(port = %config.port, "udp_listener_started");

    let mut buf = [0u8; 1024];
    // Rate-limit drop warnings to 1 per second
    let mut last_drop_warn = Instant::now() - Duration::from_secs(2);

    loop {
        tokio::select! {
            // Check for shutdown
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("udp_listener_shutdown");
                    return Ok(());
                }
            }
            // Receive datagrams
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, peer)) => {
                        match decode_touch_msg(&buf[..len], Instant::now()) {
                            Ok(msg) => {
                                debug!(
                                    flavor = %msg.flavor.as_str(),
                                    source = %msg.source,
                                    choice = %msg.choice,
                                    "udp_message_received"
                                );
                                metrics.record_udp_received();
                                match event_tx.try_send(msg) {
                                    Ok(()) => {}
                                    Err(TrySendError::Full(_)) => {
                                        metrics.record_udp_dropped();
                                        if last_drop_warn.elapsed() > Duration::from_secs(1) {
                                            warn!(peer = %peer, "udp_message_dropped: channel full");
                                            last_drop_warn = Instant::now();
                                        }
                                    }
                                    Err(TrySendError::Closed(_)) => {
                                        warn!("event channel closed");
                                        return Ok(());
                                    }
                                }
                            }
                            Err(e) => {
                                metrics.record_rejected(RejectKind::MalformedMessage);
                                warn!(
                                    peer = %peer,
                                    payload = %String::from_utf8_lossy(&buf[..len]),
                                    error = %e,
                                    "malformed_message"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "udp_recv_failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(payload: &str) -> anyhow::Result<TouchMsg> {
        decode_touch_msg(payload.as_bytes(), Instant::now())
    }

    #[test]
    fn test_decode_start_touch() {
        let msg =
            decode(r#"{"source": 101, "flavor": "start_touch", "choice": "right"}"#).unwrap();
        assert_eq!(msg.flavor, Flavor::StartTouch);
        assert_eq!(msg.source, "101");
        assert_eq!(msg.choice, "right");
    }

    #[test]
    fn test_decode_string_source() {
        let msg =
            decode(r#"{"source": "102", "flavor": "end_touch", "choice": "left"}"#).unwrap();
        assert_eq!(msg.flavor, Flavor::EndTouch);
        assert_eq!(msg.source, "102");
    }

    #[test]
    fn test_decode_touch_beat() {
        let msg = decode(r#"{"source": 101, "flavor": "touch_beat", "choice": ""}"#).unwrap();
        assert_eq!(msg.flavor, Flavor::TouchBeat);
    }

    #[test]
    fn test_decode_unknown_flavor_passes_through() {
        let msg = decode(r#"{"source": 101, "flavor": "new_word", "choice": "left"}"#).unwrap();
        assert!(matches!(msg.flavor, Flavor::Unknown(_)));
    }

    #[test]
    fn test_missing_flavor_is_malformed() {
        let err = decode(r#"{"source": 101, "choice": "left"}"#).unwrap_err();
        assert!(err.to_string().contains("missing flavor"));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(decode("not json").is_err());
    }

    #[test]
    fn test_missing_source_defaults_empty() {
        let msg = decode(r#"{"flavor": "start_touch", "choice": "left"}"#).unwrap();
        assert_eq!(msg.source, "");
    }
}
