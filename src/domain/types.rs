//! Shared types for votewave

use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Newtype wrapper for station IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StationId(pub i64);

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite station key: source and choice concatenated
///
/// Must be unique across all loaded stations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationKey(String);

impl StationKey {
    pub fn new(source: &str, choice: &str) -> Self {
        Self(format!("{source}{choice}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw station record as read from the station file
///
/// Coordinate fields also accept the legacy `x3`/`y3` names used by the
/// projection-mapped station files.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStation {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_source")]
    pub source: String,
    pub choice: String,
    #[serde(default, alias = "x3")]
    pub x: Option<f64>,
    #[serde(default, alias = "y3")]
    pub y: Option<f64>,
}

/// One physical voting button
///
/// Created once at load time, immutable thereafter, owned by the StationIndex.
#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub source: String,
    pub choice: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Station {
    pub fn key(&self) -> StationKey {
        StationKey::new(&self.source, &self.choice)
    }
}

impl From<RawStation> for Station {
    fn from(raw: RawStation) -> Self {
        Self { id: StationId(raw.id), source: raw.source, choice: raw.choice, x: raw.x, y: raw.y }
    }
}

/// Open/closed touch state at one station key
///
/// `None` is the "not open" sentinel. Sessions are pre-allocated when the
/// station index is built and are reset rather than removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchSession {
    pub started_at: Option<Instant>,
}

impl TouchSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Classification of inbound events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flavor {
    StartTouch,
    EndTouch,
    TouchBeat,
    Unknown(String),
}

impl std::str::FromStr for Flavor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "start_touch" => Flavor::StartTouch,
            "end_touch" => Flavor::EndTouch,
            "touch_beat" => Flavor::TouchBeat,
            other => Flavor::Unknown(other.to_string()),
        })
    }
}

impl Flavor {
    pub fn as_str(&self) -> &str {
        match self {
            Flavor::StartTouch => "start_touch",
            Flavor::EndTouch => "end_touch",
            Flavor::TouchBeat => "touch_beat",
            Flavor::Unknown(s) => s,
        }
    }
}

/// Wire shape of a station firmware datagram:
/// {
///     "source": <last octet of the device ip, int or string>,
///     "flavor": "start_touch" | "end_touch" | "touch_beat",
///     "choice": "left" | "right"
/// }
#[derive(Debug, Deserialize)]
pub struct WireMsg {
    #[serde(default)]
    pub flavor: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_source")]
    pub source: Option<String>,
    #[serde(default)]
    pub choice: Option<String>,
}

/// Parsed inbound event for tracker processing
#[derive(Debug, Clone)]
pub struct TouchMsg {
    pub flavor: Flavor,
    pub source: String,
    pub choice: String,
    pub received_at: Instant,
}

/// Classification of dropped inbound events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    /// Event missing required fields
    MalformedMessage,
    /// Event references a (source, choice) pair not in the station index
    UnknownStation,
    /// end_touch received while the session is not open
    InvalidTransition,
}

impl RejectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectKind::MalformedMessage => "malformed_message",
            RejectKind::UnknownStation => "unknown_station",
            RejectKind::InvalidTransition => "invalid_transition",
        }
    }
}

/// Source that can be either a JSON string or an integer
///
/// Station firmware sends the source as a bare integer; station files and
/// hand-written test payloads use strings. Both normalize to a string key.
fn deserialize_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct SourceVisitor;

    impl<'de> Visitor<'de> for SourceVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer source")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(SourceVisitor)
}

fn deserialize_opt_source<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_source")] String);

    let wrapper: Option<Wrapper> = Option::deserialize(deserializer)?;
    Ok(wrapper.map(|w| w.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_from_str() {
        assert_eq!("start_touch".parse::<Flavor>().unwrap(), Flavor::StartTouch);
        assert_eq!("end_touch".parse::<Flavor>().unwrap(), Flavor::EndTouch);
        assert_eq!("touch_beat".parse::<Flavor>().unwrap(), Flavor::TouchBeat);
        assert!(matches!("new_word".parse::<Flavor>().unwrap(), Flavor::Unknown(_)));
    }

    #[test]
    fn test_station_key_concatenation() {
        let key = StationKey::new("101", "left");
        assert_eq!(key.as_str(), "101left");
        assert_eq!(key, StationKey::new("101", "left"));
        assert_ne!(key, StationKey::new("101", "right"));
    }

    #[test]
    fn test_raw_station_accepts_int_source() {
        let raw: RawStation =
            serde_json::from_str(r#"{"id": 1, "source": 101, "choice": "left"}"#).unwrap();
        assert_eq!(raw.source, "101");
        assert_eq!(raw.x, None);
    }

    #[test]
    fn test_raw_station_accepts_legacy_coordinate_names() {
        let raw: RawStation = serde_json::from_str(
            r#"{"id": 2, "source": "102", "choice": "right", "x3": 1.5, "y3": -2.0}"#,
        )
        .unwrap();
        assert_eq!(raw.x, Some(1.5));
        assert_eq!(raw.y, Some(-2.0));
    }

    #[test]
    fn test_touch_session_sentinel() {
        let mut session = TouchSession::default();
        assert!(!session.is_open());
        session.started_at = Some(Instant::now());
        assert!(session.is_open());
    }
}
