use crate::msr_tool_error::MsrToolError;
use std::fmt;

/// Status byte sent by the device after ESC. The discriminant is the wire byte.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum TrackStatus {
    Ok = 0x30,
    ReadWriteError = 0x31,
    CommandFormatError = 0x32,
    InvalidCommand = 0x34,
    InvalidCardSwipeForWrite = 0x39,
    SetError = 0x41,
}

const STATUSES: [TrackStatus; 6] = [
    TrackStatus::Ok,
    TrackStatus::ReadWriteError,
    TrackStatus::CommandFormatError,
    TrackStatus::InvalidCommand,
    TrackStatus::InvalidCardSwipeForWrite,
    TrackStatus::SetError,
];

impl TrackStatus {
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == TrackStatus::Ok
    }

    /// `Ok(())` for [`TrackStatus::Ok`], the matching status error otherwise.
    pub fn into_result(self) -> Result<(), MsrToolError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(MsrToolError::Status(self))
        }
    }
}

impl TryFrom<u8> for TrackStatus {
    type Error = MsrToolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        STATUSES
            .iter()
            .copied()
            .find(|status| status.byte() == value)
            .ok_or(MsrToolError::UnknownStatus(value))
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TrackStatus::Ok => "ok",
            TrackStatus::ReadWriteError => "read/write error",
            TrackStatus::CommandFormatError => "command format error",
            TrackStatus::InvalidCommand => "invalid command",
            TrackStatus::InvalidCardSwipeForWrite => "invalid card swipe for write",
            TrackStatus::SetError => "set error",
        };
        f.write_str(text)
    }
}
