use crate::msr::SelfTest;
use crate::track_status::TrackStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MsrToolError {
    #[error("serial port error")]
    SerialPort(#[from] serialport::Error),
    #[error("i/o error")]
    Io(#[from] std::io::Error),
    #[error("expected {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    Framing { expected: Vec<u8>, actual: Vec<u8> },
    #[error("unknown status byte 0x{0:02x}")]
    UnknownStatus(u8),
    #[error("device reported {0}")]
    Status(TrackStatus),
    #[error("{0} test failed")]
    SelfTestFailed(SelfTest),
    #[error("character {character:?} is not in the {alphabet} alphabet")]
    CharacterNotInAlphabet {
        character: char,
        alphabet: &'static str,
    },
    #[error("timed out after {received} of {expected} bytes")]
    Timeout { expected: usize, received: usize },
    #[error("track {track} holds {len} bytes, a frame fits at most 255")]
    TrackTooLong { track: u8, len: usize },
    #[error("session lost framing sync, reset the device first")]
    Desynchronized,
    #[error("unexpected reply byte 0x{0:02x}")]
    UnexpectedReply(u8),
    #[error("firmware version {} is not text", hex::encode(.0))]
    InvalidFirmwareVersion(Vec<u8>),
    #[error("track data is not valid text")]
    InvalidUtf8DataInTrack,
    #[error("invalid track input: {0}")]
    InvalidTrackInput(String),
    #[error("invalid hex in track input")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("unsupported data format")]
    UnsupportedDataFormat,
    #[error("unsupported output format")]
    UnsupportedOutputFormat,
    #[error("unsupported input format")]
    UnsupportedInputFormat,
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

impl MsrToolError {
    /// Errors after which the byte stream can no longer be trusted to sit on a frame
    /// boundary. Only a reset brings the session back.
    pub fn is_session_disrupting(&self) -> bool {
        matches!(
            self,
            MsrToolError::SerialPort(_)
                | MsrToolError::Io(_)
                | MsrToolError::Framing { .. }
                | MsrToolError::UnknownStatus(_)
                | MsrToolError::Timeout { .. }
                | MsrToolError::UnexpectedReply(_)
        )
    }
}
