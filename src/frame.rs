//! Wire framing: command packets, expected replies, status bytes and the two
//! track block layouts.
//!
//! ```text
//! raw block:  ESC 's' (ESC <track> <len> <len bytes>){1,3} '?' FS, ESC <status>
//! iso block:  ESC 's' ESC 01 <track 1> ESC 02 <track 2> ESC 03 <track 3> '?' FS, ESC <status>
//! ```
//!
//! Nothing here retries. A mismatch aborts the exchange and leaves recovery to a reset.

use crate::command::{Command, BLOCK_END, BLOCK_START, ESC, FS};
use crate::msr_tool_error::MsrToolError;
use crate::raw_tracks_data::RawTracksData;
use crate::track::{Track, TRACKS};
use crate::track_status::TrackStatus;
use crate::tracks_data::TracksData;
use crate::transport::Transport;
use log::trace;

pub struct FrameCodec<T: Transport> {
    transport: T,
}

impl<T: Transport> FrameCodec<T> {
    pub fn new(transport: T) -> Self {
        FrameCodec { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Drops anything left over from an earlier exchange, then sends ESC, opcode and arguments
    /// in a single write.
    pub fn send_command(&mut self, command: Command, args: &[u8]) -> Result<(), MsrToolError> {
        self.transport.clear_input()?;
        self.transport.clear_output()?;
        trace!("{:?} {}", command, hex::encode(args));
        self.transport.write(&command.with_payload(args))?;
        self.transport.flush()
    }

    /// Whatever arrives within the timeout, at most `len` bytes.
    pub fn read_reply(&mut self, len: usize) -> Result<Vec<u8>, MsrToolError> {
        self.transport.read(len)
    }

    pub fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, MsrToolError> {
        let data = self.transport.read(len)?;
        if data.len() < len {
            return Err(MsrToolError::Timeout {
                expected: len,
                received: data.len(),
            });
        }
        Ok(data)
    }

    pub fn read_byte(&mut self) -> Result<u8, MsrToolError> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn expect(&mut self, expected: &[u8]) -> Result<(), MsrToolError> {
        let actual = self.read_exact(expected.len())?;
        if actual != expected {
            return Err(MsrToolError::Framing {
                expected: expected.to_vec(),
                actual,
            });
        }
        Ok(())
    }

    /// Reads byte by byte until the data ends with `delimiter`. The delimiter is included.
    pub fn read_until(&mut self, delimiter: &[u8]) -> Result<Vec<u8>, MsrToolError> {
        let mut data = Vec::new();
        while !data.ends_with(delimiter) {
            data.push(self.read_byte()?);
        }
        Ok(data)
    }

    /// Reads ESC and a status byte. Error statuses come back as [`MsrToolError::Status`],
    /// bytes outside the status table as [`MsrToolError::UnknownStatus`].
    pub fn read_status(&mut self) -> Result<TrackStatus, MsrToolError> {
        self.expect(&[ESC])?;
        let status = TrackStatus::try_from(self.read_byte()?)?;
        status.into_result()?;
        Ok(status)
    }

    /// Parses a length-prefixed block and the status that follows it.
    pub fn read_raw_block(&mut self) -> Result<RawTracksData, MsrToolError> {
        self.expect(&[ESC, BLOCK_START])?;

        let mut tracks = RawTracksData::default();
        let mut previous = 0;
        loop {
            let marker = self.read_byte()?;
            if marker == BLOCK_END {
                self.expect(&[FS])?;
                break;
            }
            if marker != ESC {
                return Err(MsrToolError::Framing {
                    expected: vec![ESC],
                    actual: vec![marker],
                });
            }
            let number = self.read_byte()?;
            let track = match Track::from_number(number) {
                Some(track) if number > previous => track,
                _ => {
                    return Err(MsrToolError::Framing {
                        expected: vec![ESC, previous + 1],
                        actual: vec![ESC, number],
                    })
                }
            };
            previous = number;
            let len = self.read_byte()? as usize;
            *tracks.track_mut(track) = self.read_exact(len)?;
        }
        self.read_status()?;

        Ok(tracks)
    }

    /// Parses a delimiter-terminated ISO block and the status that follows it.
    /// Track payloads are returned as sent, sentinels included.
    pub fn read_iso_block(&mut self) -> Result<[Vec<u8>; 3], MsrToolError> {
        self.expect(&[ESC, BLOCK_START])?;
        self.expect(&[ESC, 0x01])?;
        let mut track1 = self.read_until(&[ESC, 0x02])?;
        track1.truncate(track1.len() - 2);
        let mut track2 = self.read_until(&[ESC, 0x03])?;
        track2.truncate(track2.len() - 2);
        let mut track3 = self.read_until(&[FS])?;
        track3.truncate(track3.len() - 1);
        // a block end marker only follows track 3's own end sentinel or an empty track
        if track3.ends_with(&[BLOCK_END, BLOCK_END]) || track3 == [BLOCK_END] {
            track3.pop();
        }
        self.read_status()?;

        Ok([track1, track2, track3])
    }
}

/// Builds the argument of a raw write. Lengths are checked before anything is sent.
pub fn encode_raw_block(tracks: &RawTracksData) -> Result<Vec<u8>, MsrToolError> {
    let mut block = vec![ESC, BLOCK_START];
    for (track, data) in tracks.iter() {
        let len = u8::try_from(data.len()).map_err(|_| MsrToolError::TrackTooLong {
            track: track.number(),
            len: data.len(),
        })?;
        block.extend_from_slice(&[ESC, track.number(), len]);
        block.extend_from_slice(data);
    }
    block.extend_from_slice(&[BLOCK_END, FS]);

    Ok(block)
}

/// Builds the argument of a native ISO write from sentinel-free track text.
pub fn encode_iso_block(tracks: &TracksData) -> Vec<u8> {
    let mut block = vec![ESC, BLOCK_START];
    for track in TRACKS {
        block.extend_from_slice(&[ESC, track.number()]);
        block.extend_from_slice(tracks.track(track).as_bytes());
    }
    block.extend_from_slice(&[BLOCK_END, FS]);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn codec(input: &[u8]) -> FrameCodec<MockTransport> {
        FrameCodec::new(MockTransport::with_input(input))
    }

    #[test]
    fn test_send_command_drops_stale_input() -> Result<(), MsrToolError> {
        let mut transport = MockTransport::with_input(b"\x1b\x30\x1b\x31");
        transport.replies.push_back(vec![0x1b, 0x30]);
        let mut frame = FrameCodec::new(transport);

        frame.send_command(Command::SetLeadingZeros, &[61, 22])?;
        assert_eq!(frame.read_status()?, TrackStatus::Ok);
        assert_eq!(
            frame.transport().written,
            vec![vec![0x1b, 0x7a, 61, 22]]
        );
        Ok(())
    }

    #[test]
    fn test_expect_mismatch_carries_both_sides() {
        match codec(b"\x1b\x31").expect(&[ESC, BLOCK_START]) {
            Err(MsrToolError::Framing { expected, actual }) => {
                assert_eq!(expected, vec![0x1b, 0x73]);
                assert_eq!(actual, vec![0x1b, 0x31]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_short_read_is_a_timeout() {
        assert!(matches!(
            codec(b"\x1b").expect(&[ESC, BLOCK_START]),
            Err(MsrToolError::Timeout {
                expected: 2,
                received: 1
            })
        ));
    }

    #[test]
    fn test_read_until_includes_delimiter() -> Result<(), MsrToolError> {
        let mut frame = codec(b"abc\x1b\x02rest");
        assert_eq!(frame.read_until(&[ESC, 0x02])?, b"abc\x1b\x02".to_vec());
        assert_eq!(frame.read_exact(4)?, b"rest".to_vec());
        Ok(())
    }

    #[test]
    fn test_read_until_times_out_without_delimiter() {
        assert!(matches!(
            codec(b"abc").read_until(&[FS]),
            Err(MsrToolError::Timeout { .. })
        ));
    }

    mod status {
        use super::*;

        #[test]
        fn test_ok() -> Result<(), MsrToolError> {
            assert_eq!(codec(b"\x1b\x30").read_status()?, TrackStatus::Ok);
            Ok(())
        }

        #[test]
        fn test_command_format_error() {
            assert!(matches!(
                codec(b"\x1b\x32").read_status(),
                Err(MsrToolError::Status(TrackStatus::CommandFormatError))
            ));
        }

        #[test]
        fn test_every_error_status() {
            for (byte, expected) in [
                (0x31, TrackStatus::ReadWriteError),
                (0x32, TrackStatus::CommandFormatError),
                (0x34, TrackStatus::InvalidCommand),
                (0x39, TrackStatus::InvalidCardSwipeForWrite),
                (0x41, TrackStatus::SetError),
            ] {
                match codec(&[ESC, byte]).read_status() {
                    Err(MsrToolError::Status(status)) => assert_eq!(status, expected),
                    other => panic!("unexpected {other:?}"),
                }
            }
        }

        #[test]
        fn test_undefined_byte_is_a_framing_anomaly() {
            let error = codec(b"\x1b\xff").read_status().unwrap_err();
            assert!(matches!(error, MsrToolError::UnknownStatus(0xff)));
            assert!(error.is_session_disrupting());
        }

        #[test]
        fn test_missing_escape() {
            assert!(matches!(
                codec(b"\x30").read_status(),
                Err(MsrToolError::Framing { .. })
            ));
        }
    }

    mod raw_block {
        use super::*;

        fn status_ok(mut block: Vec<u8>) -> Vec<u8> {
            block.extend_from_slice(&[ESC, 0x30]);
            block
        }

        #[test]
        fn test_read_raw_block() -> Result<(), MsrToolError> {
            let data = b"\x1b\x73\x1b\x01\x03\x41\x42\x43\x1b\x02\x00\x1b\x03\x00\x3f\x1c\x1b\x30";
            let tracks = codec(data).read_raw_block()?;
            assert_eq!(tracks, RawTracksData::new(b"ABC".to_vec(), vec![], vec![]));
            Ok(())
        }

        #[test]
        fn test_round_trip_lengths() -> Result<(), MsrToolError> {
            for len in [0usize, 1, 79, 255] {
                let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
                let tracks = RawTracksData::new(payload.clone(), vec![0x1b; len], payload.clone());
                let block = encode_raw_block(&tracks)?;
                let parsed = codec(&status_ok(block)).read_raw_block()?;
                assert_eq!(parsed, tracks);
            }
            Ok(())
        }

        #[test]
        fn test_too_long_track_is_rejected() {
            let tracks = RawTracksData::new(vec![], vec![0; 256], vec![]);
            assert!(matches!(
                encode_raw_block(&tracks),
                Err(MsrToolError::TrackTooLong { track: 2, len: 256 })
            ));
        }

        #[test]
        fn test_missing_tracks_are_empty() -> Result<(), MsrToolError> {
            let data = b"\x1b\x73\x1b\x03\x02\xaf\xc2\x3f\x1c\x1b\x30";
            let tracks = codec(data).read_raw_block()?;
            assert_eq!(tracks, RawTracksData::new(vec![], vec![], vec![0xaf, 0xc2]));
            Ok(())
        }

        #[test]
        fn test_out_of_order_track_marker() {
            let data = b"\x1b\x73\x1b\x02\x00\x1b\x01\x00\x3f\x1c\x1b\x30";
            assert!(matches!(
                codec(data).read_raw_block(),
                Err(MsrToolError::Framing { .. })
            ));
        }

        #[test]
        fn test_error_status_after_block() {
            let data = b"\x1b\x73\x1b\x01\x00\x1b\x02\x00\x1b\x03\x00\x3f\x1c\x1b\x31";
            assert!(matches!(
                codec(data).read_raw_block(),
                Err(MsrToolError::Status(TrackStatus::ReadWriteError))
            ));
        }

        #[test]
        fn test_not_card_data() {
            assert!(matches!(
                codec(b"\x1b\x31").read_raw_block(),
                Err(MsrToolError::Framing { .. })
            ));
        }
    }

    mod iso_block {
        use super::*;

        #[test]
        fn test_read_iso_block() -> Result<(), MsrToolError> {
            let mut data = b"\x1b\x73\x1b\x01%ABCDEFGHIJKLMNOPQRSTU1234567890?".to_vec();
            data.extend_from_slice(b"\x1b\x02;0987654321?\x1b\x03;12345??\x1c\x1b\x30");

            let [track1, track2, track3] = codec(&data).read_iso_block()?;
            assert_eq!(track1, b"%ABCDEFGHIJKLMNOPQRSTU1234567890?".to_vec());
            assert_eq!(track2, b";0987654321?".to_vec());
            assert_eq!(track3, b";12345?".to_vec());
            Ok(())
        }

        #[test]
        fn test_block_without_end_marker() -> Result<(), MsrToolError> {
            let data = b"\x1b\x73\x1b\x01\x1b\x02\x1b\x03;12345?\x1c\x1b\x30";
            let [track1, track2, track3] = codec(data).read_iso_block()?;
            assert!(track1.is_empty() && track2.is_empty());
            assert_eq!(track3, b";12345?".to_vec());
            Ok(())
        }

        #[test]
        fn test_empty_tracks() -> Result<(), MsrToolError> {
            let data = b"\x1b\x73\x1b\x01\x1b\x02\x1b\x03\x3f\x1c\x1b\x30";
            let tracks = codec(data).read_iso_block()?;
            assert_eq!(tracks, [vec![], vec![], vec![]]);
            Ok(())
        }

        #[test]
        fn test_encode_iso_block() {
            let tracks = TracksData::new("ABC", "123", "");
            assert_eq!(
                encode_iso_block(&tracks),
                b"\x1b\x73\x1b\x01ABC\x1b\x02123\x1b\x03\x3f\x1c".to_vec()
            );
        }
    }
}
