use serde::{Deserialize, Serialize};

use crate::log::LogRecord;

/// Current protocol version.  Bump this when the wire format changes in a
/// breaking way.  The shell checks this on `Hello` and can refuse to talk
/// to an incompatible engine.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a single frame body.  Anything larger is a corrupt
/// stream, not a state snapshot.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Detailed playback status as reported by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing loaded / explicitly stopped
    Connecting, // source opening / buffering
    Playing,    // audio flowing
    Paused,     // explicitly paused
    Error,      // failed to play
}

/// Decoding metadata for the currently playing track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrackFacts {
    pub codec: Option<String>,
    /// Bitrate in bits per second; 0 = unknown.
    #[serde(default)]
    pub bitrate_bps: u32,
    /// Sample rate in Hz; 0 = unknown.
    #[serde(default)]
    pub sample_rate_hz: u32,
    /// Channel count; 0 = unknown.
    #[serde(default)]
    pub channels: u32,
    /// Replay gain in dB; 0.0 = none applied.
    #[serde(default)]
    pub gain_db: f32,
}

/// Full state snapshot of the engine.  `rev` is a monotonically
/// increasing counter incremented every time the state changes; clients
/// can use it to detect missed updates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineState {
    #[serde(default)]
    pub rev: u64,
    pub playback: PlaybackStatus,
    /// True once the engine has a decoded source and can report facts.
    #[serde(default)]
    pub ready: bool,
    pub track: Option<TrackFacts>,
    /// Summed length of the selected playlist entries, in ms.
    #[serde(default)]
    pub selected_length_ms: i64,
    /// Total playlist length, in ms.
    #[serde(default)]
    pub total_length_ms: i64,
}

/// Messages the engine pushes to the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "update")]
pub enum EngineUpdate {
    /// Sent immediately on connect: engine version + full state snapshot.
    Hello {
        protocol_version: u32,
        state: EngineState,
    },
    State {
        data: EngineState,
    },
    /// A log message from the engine's own subsystems.
    Log {
        record: LogRecord,
    },
}

/// Framing failures.  `ShortHeader`/`ShortBody` mean "wait for more
/// bytes"; the rest are fatal for the stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("insufficient data for length header")]
    ShortHeader,
    #[error("insufficient data for frame body")]
    ShortBody,
    #[error("frame length {0} exceeds limit")]
    Oversized(usize),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FrameError {
    /// True when more bytes may complete the frame.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::ShortHeader | Self::ShortBody)
    }
}

impl EngineUpdate {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let len = json.len() as u32;
        let mut result = Vec::with_capacity(4 + json.len());
        result.extend_from_slice(&len.to_be_bytes());
        result.extend_from_slice(&json);
        Ok(result)
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize), FrameError> {
        if data.len() < 4 {
            return Err(FrameError::ShortHeader);
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(FrameError::Oversized(len));
        }
        if data.len() < 4 + len {
            return Err(FrameError::ShortBody);
        }
        let update: Self = serde_json::from_slice(&data[4..4 + len])?;
        Ok((update, 4 + len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Severity;

    #[test]
    fn test_state_encode_decode() {
        let msg = EngineUpdate::State {
            data: EngineState {
                rev: 7,
                playback: PlaybackStatus::Playing,
                ready: true,
                track: Some(TrackFacts {
                    codec: Some("FLAC".to_string()),
                    bitrate_bps: 912_000,
                    sample_rate_hz: 44_100,
                    channels: 2,
                    gain_db: -3.2,
                }),
                selected_length_ms: 215_000,
                total_length_ms: 3_721_000,
            },
        };
        let encoded = msg.encode().unwrap();
        let (decoded, len) = EngineUpdate::decode(&encoded).unwrap();
        assert_eq!(len, encoded.len());
        match decoded {
            EngineUpdate::State { data } => {
                assert_eq!(data.rev, 7);
                assert_eq!(data.playback, PlaybackStatus::Playing);
                assert_eq!(data.track.unwrap().codec.as_deref(), Some("FLAC"));
            }
            _ => panic!("Wrong update type"),
        }
    }

    #[test]
    fn test_hello_encode_decode() {
        let msg = EngineUpdate::Hello {
            protocol_version: PROTOCOL_VERSION,
            state: EngineState {
                rev: 42,
                ..Default::default()
            },
        };
        let encoded = msg.encode().unwrap();
        let (decoded, _) = EngineUpdate::decode(&encoded).unwrap();
        match decoded {
            EngineUpdate::Hello {
                protocol_version,
                state,
            } => {
                assert_eq!(protocol_version, PROTOCOL_VERSION);
                assert_eq!(state.rev, 42);
            }
            _ => panic!("Wrong update type"),
        }
    }

    #[test]
    fn test_log_encode_decode() {
        let msg = EngineUpdate::Log {
            record: LogRecord {
                level: Severity::Warning,
                target: "engine::output".to_string(),
                file: Some("output.rs".to_string()),
                line: Some(81),
                text: "underrun".to_string(),
            },
        };
        let encoded = msg.encode().unwrap();
        let (decoded, _) = EngineUpdate::decode(&encoded).unwrap();
        match decoded {
            EngineUpdate::Log { record } => {
                assert_eq!(record.level, Severity::Warning);
                assert_eq!(record.text, "underrun");
            }
            _ => panic!("Wrong update type"),
        }
    }

    #[test]
    fn test_partial_frames_are_incomplete() {
        let encoded = EngineUpdate::State {
            data: EngineState::default(),
        }
        .encode()
        .unwrap();

        let err = EngineUpdate::decode(&encoded[..2]).unwrap_err();
        assert!(err.is_incomplete());

        let err = EngineUpdate::decode(&encoded[..encoded.len() - 1]).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_oversized_frame_is_fatal() {
        let mut data = Vec::new();
        data.extend_from_slice(&(MAX_FRAME_LEN as u32 + 1).to_be_bytes());
        let err = EngineUpdate::decode(&data).unwrap_err();
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_garbage_body_is_fatal() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(b"{{{{");
        let err = EngineUpdate::decode(&data).unwrap_err();
        assert!(!err.is_incomplete());
    }
}
