//! Message types for the clock control link
//!
//! Message types are divided into two categories:
//! - Host → Clock: commands, time updates, heartbeat requests
//! - Clock → Host: command replies, heartbeat responses
//!
//! Bodies are postcard-encoded core types; the frame TYPE byte selects
//! which one.

use serde::{de::DeserializeOwned, Serialize};
use wheelclock_core::control::{Command, Reply};

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

// Message type IDs: Host → Clock
pub const MSG_COMMAND: u8 = 0x01;
pub const MSG_SET_TIME: u8 = 0x02;
pub const MSG_PING: u8 = 0x03;

// Message type IDs: Clock → Host
pub const MSG_REPLY: u8 = 0x81;
pub const MSG_PONG: u8 = 0x82;

/// Latest accepted wall time, 9999-12-31T23:59:59Z
pub const MAX_UNIX_SECONDS: u64 = 253_402_300_799;

/// Messages from the host to the clock
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostMessage {
    /// Control surface command, answered by exactly one reply
    Command(Command),
    /// Set the wall clock
    SetTime {
        /// Seconds since the Unix epoch, UTC
        unix_seconds: u64,
        /// Local offset from UTC including any daylight saving
        utc_offset_minutes: i16,
    },
    /// Heartbeat request
    Ping,
}

/// Messages from the clock to the host
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockMessage {
    Reply(Reply),
    /// Heartbeat response
    Pong,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SetTimeBody {
    unix_seconds: u64,
    utc_offset_minutes: i16,
}

fn encode_body<T: Serialize>(msg_type: u8, body: &T) -> Result<Frame, FrameError> {
    let mut buf = [0u8; MAX_PAYLOAD_SIZE];
    let used = postcard::to_slice(body, &mut buf).map_err(|err| match err {
        postcard::Error::SerializeBufferFull => FrameError::PayloadTooLarge,
        _ => FrameError::Encode,
    })?;
    Frame::new(msg_type, used)
}

fn decode_body<T: DeserializeOwned>(frame: &Frame) -> Result<T, FrameError> {
    postcard::from_bytes(&frame.payload).map_err(|_| FrameError::Decode)
}

impl HostMessage {
    /// Parse a message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_COMMAND => decode_body(frame).map(HostMessage::Command),
            MSG_SET_TIME => {
                let body: SetTimeBody = decode_body(frame)?;
                if body.unix_seconds > MAX_UNIX_SECONDS {
                    return Err(FrameError::Decode);
                }
                Ok(HostMessage::SetTime {
                    unix_seconds: body.unix_seconds,
                    utc_offset_minutes: body.utc_offset_minutes,
                })
            }
            MSG_PING => Ok(HostMessage::Ping),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this message into a frame (host side and tests)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            HostMessage::Command(command) => encode_body(MSG_COMMAND, command),
            HostMessage::SetTime {
                unix_seconds,
                utc_offset_minutes,
            } => encode_body(
                MSG_SET_TIME,
                &SetTimeBody {
                    unix_seconds: *unix_seconds,
                    utc_offset_minutes: *utc_offset_minutes,
                },
            ),
            HostMessage::Ping => Ok(Frame::empty(MSG_PING)),
        }
    }
}

impl ClockMessage {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ClockMessage::Reply(reply) => encode_body(MSG_REPLY, reply),
            ClockMessage::Pong => Ok(Frame::empty(MSG_PONG)),
        }
    }

    /// Parse a message from a frame (host side and tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_REPLY => decode_body(frame).map(ClockMessage::Reply),
            MSG_PONG => Ok(ClockMessage::Pong),
            _ => Err(FrameError::InvalidFrame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameParser;
    use wheelclock_core::calibration::CalibrationReport;
    use wheelclock_core::config::{CalibrationData, ClockSettings};
    use wheelclock_core::control::{ClockStatus, CommandError};
    use wheelclock_core::scheduler::DisplayMode;
    use wheelclock_core::state::PerAxis;

    fn through_wire(frame: &Frame) -> Frame {
        let bytes = frame.encode_to_vec().unwrap();
        let mut parser = FrameParser::new();
        parser.feed_bytes(&bytes).unwrap().unwrap()
    }

    #[test]
    fn test_ping_is_empty() {
        let frame = HostMessage::Ping.to_frame().unwrap();
        assert_eq!(frame.msg_type, MSG_PING);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_set_manual_command() {
        let msg = HostMessage::Command(Command::SetManual {
            hour: 7,
            minute: 45,
        });
        let frame = through_wire(&msg.to_frame().unwrap());
        assert_eq!(frame.msg_type, MSG_COMMAND);
        assert_eq!(HostMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_set_time_negative_offset() {
        let msg = HostMessage::SetTime {
            unix_seconds: 1_737_158_400,
            utc_offset_minutes: -300,
        };
        let frame = through_wire(&msg.to_frame().unwrap());
        assert_eq!(HostMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_set_time_past_year_9999_rejected() {
        let msg = HostMessage::SetTime {
            unix_seconds: u64::MAX - 1,
            utc_offset_minutes: 0,
        };
        let frame = through_wire(&msg.to_frame().unwrap());
        assert_eq!(HostMessage::from_frame(&frame), Err(FrameError::Decode));
    }

    #[test]
    fn test_settings_command_fits() {
        let mut settings = ClockSettings::default();
        settings.timezone.clear();
        for _ in 0..6 {
            settings.timezone.push_str("ABCDEFGH").unwrap();
        }
        let msg = HostMessage::Command(Command::ApplySettings(settings));
        let frame = msg.to_frame().unwrap();
        assert_eq!(HostMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_full_status_reply_fits() {
        let mut report = CalibrationReport::default();
        report.status.clear();
        for _ in 0..8 {
            report.status.push_str("12345678").unwrap();
        }
        let status = ClockStatus {
            displayed: PerAxis::new(Some(9), Some(30)),
            date: heapless::String::try_from("Jan 18").unwrap(),
            mode: DisplayMode::ManualOverride {
                hour: 9,
                minute: 30,
            },
            sensors: PerAxis::new(true, false),
            outputs_enabled: PerAxis::splat(true),
            calibration: CalibrationData::new(),
            session: report,
            settings: ClockSettings::default(),
        };
        let msg = ClockMessage::Reply(Reply::Status(status));
        let frame = through_wire(&msg.to_frame().unwrap());
        assert_eq!(frame.msg_type, MSG_REPLY);
        assert_eq!(ClockMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_rejection_reply() {
        let msg = ClockMessage::Reply(Reply::Rejected(CommandError::SessionActive));
        let frame = msg.to_frame().unwrap();
        assert_eq!(ClockMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let frame = Frame::empty(0x7F);
        assert_eq!(HostMessage::from_frame(&frame), Err(FrameError::InvalidFrame));
        assert_eq!(ClockMessage::from_frame(&frame), Err(FrameError::InvalidFrame));
    }

    #[test]
    fn test_truncated_body_is_decode_error() {
        let frame = Frame::new(MSG_SET_TIME, &[0x80]).unwrap();
        assert_eq!(HostMessage::from_frame(&frame), Err(FrameError::Decode));
    }
}
