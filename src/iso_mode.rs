//! The two ways of moving ISO track text: let the device do the ISO 7811 coding, or
//! switch it to raw mode and do the coding here. Older firmware revisions only get
//! the second one right.

use crate::char_bits_conversion::{decode, encode, lrc, reverse_bits, to_device_order, Alphabet};
use crate::command::Command;
use crate::config::{DeviceConfig, RawWriteLayout};
use crate::frame::{encode_iso_block, encode_raw_block, FrameCodec};
use crate::msr;
use crate::msr_tool_error::MsrToolError;
use crate::raw_tracks_data::RawTracksData;
use crate::track::{Track, END_SENTINEL, TRACKS};
use crate::tracks_data::TracksData;
use crate::transport::Transport;
use log::debug;

pub trait IsoPath<T: Transport> {
    /// Reads a swiped card. Returned track text has its sentinels removed.
    fn read_tracks(
        &self,
        frame: &mut FrameCodec<T>,
        config: &mut DeviceConfig,
    ) -> Result<TracksData, MsrToolError>;

    /// Writes sentinel-free, validated track text to the next swiped card.
    fn write_tracks(
        &self,
        frame: &mut FrameCodec<T>,
        config: &mut DeviceConfig,
        tracks: &TracksData,
    ) -> Result<(), MsrToolError>;
}

/// Device-side ISO coding.
pub struct NativeIso;

/// Raw mode with ISO coding done by [`crate::char_bits_conversion`].
pub struct SoftIso;

impl<T: Transport> IsoPath<T> for NativeIso {
    fn read_tracks(
        &self,
        frame: &mut FrameCodec<T>,
        _config: &mut DeviceConfig,
    ) -> Result<TracksData, MsrToolError> {
        frame.send_command(Command::ReadIso, &[])?;
        let [track1, track2, track3] = frame.read_iso_block()?;

        let text = |data: Vec<u8>| {
            String::from_utf8(data).map_err(|_| MsrToolError::InvalidUtf8DataInTrack)
        };
        Ok(TracksData::new(text(track1)?, text(track2)?, text(track3)?).strip_sentinels())
    }

    fn write_tracks(
        &self,
        frame: &mut FrameCodec<T>,
        _config: &mut DeviceConfig,
        tracks: &TracksData,
    ) -> Result<(), MsrToolError> {
        frame.send_command(Command::WriteIso, &encode_iso_block(tracks))?;
        frame.read_status()?;
        Ok(())
    }
}

impl<T: Transport> IsoPath<T> for SoftIso {
    fn read_tracks(
        &self,
        frame: &mut FrameCodec<T>,
        config: &mut DeviceConfig,
    ) -> Result<TracksData, MsrToolError> {
        msr::apply_iso_mode(frame, config)?;
        frame.send_command(Command::ReadRaw, &[])?;
        let raw = frame.read_raw_block()?;

        let mut tracks = TracksData::default();
        for track in TRACKS {
            *tracks.track_mut(track) = extract_track_text(raw.track(track), track);
        }
        Ok(tracks)
    }

    fn write_tracks(
        &self,
        frame: &mut FrameCodec<T>,
        config: &mut DeviceConfig,
        tracks: &TracksData,
    ) -> Result<(), MsrToolError> {
        let mut raw = RawTracksData::default();
        // an empty track is still written as a sentinel-only record
        for (track, text) in tracks.iter() {
            let units = encode(&track.wrap(text), track.alphabet())?;
            *raw.track_mut(track) = layout_units(&units, track.alphabet(), config.raw_write_layout);
        }
        let block = encode_raw_block(&raw)?;

        msr::apply_iso_mode(frame, config)?;
        frame.send_command(Command::WriteRaw, &block)?;
        frame.read_status()?;
        Ok(())
    }
}

fn layout_units(units: &[u8], alphabet: &Alphabet, layout: RawWriteLayout) -> Vec<u8> {
    match layout {
        RawWriteLayout::ByteReversed => reverse_bits(units),
        RawWriteLayout::AsRead => to_device_order(units, alphabet),
    }
}

/// Decodes a raw track and keeps the text between its sentinels. Leading zero units
/// before the start sentinel are skipped. The LRC is checked but a mismatch only gets
/// logged, in line with the parity bits that are never checked either.
fn extract_track_text(raw: &[u8], track: Track) -> String {
    let alphabet = track.alphabet();
    let decoded = decode(raw, alphabet);
    let Some(start) = decoded.find(track.start_sentinel()) else {
        if !raw.is_empty() {
            debug!("{track}: no start sentinel in {} units", raw.len());
        }
        return String::new();
    };
    let body = &decoded[start + 1..];
    let Some(end) = body.find(END_SENTINEL) else {
        debug!("{track}: no end sentinel");
        return body.to_string();
    };

    let framed = &decoded[start..start + end + 2];
    let checksum = lrc(framed.chars().filter_map(|c| alphabet.symbol(c).ok()));
    match body[end + 1..].chars().next() {
        Some(reported) if alphabet.symbol(reported).ok() == Some(checksum) => {}
        reported => debug!("{track}: LRC {reported:?} does not match {checksum:#04x}"),
    }

    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_units(text: &str, track: Track) -> Result<Vec<u8>, MsrToolError> {
        let units = encode(text, track.alphabet())?;
        Ok(to_device_order(&units, track.alphabet()))
    }

    #[test]
    fn test_extract_skips_leading_zeros() -> Result<(), MsrToolError> {
        let mut raw = vec![0u8; 22];
        raw.extend(device_units(";1234=5678?", Track::Two)?);
        raw.extend([0u8; 10]);
        assert_eq!(extract_track_text(&raw, Track::Two), "1234=5678");
        Ok(())
    }

    #[test]
    fn test_extract_track1() -> Result<(), MsrToolError> {
        let raw = device_units("%B4111111111111111^DOE/JOHN^2512?", Track::One)?;
        assert_eq!(
            extract_track_text(&raw, Track::One),
            "B4111111111111111^DOE/JOHN^2512"
        );
        Ok(())
    }

    #[test]
    fn test_extract_blank_track() {
        assert_eq!(extract_track_text(&[], Track::Three), "");
        assert_eq!(extract_track_text(&[0; 40], Track::Three), "");
    }

    #[test]
    fn test_extract_tolerates_bad_lrc() -> Result<(), MsrToolError> {
        let mut raw = device_units(";123?", Track::Three)?;
        raw.pop();
        raw.push(0);
        assert_eq!(extract_track_text(&raw, Track::Three), "123");
        Ok(())
    }

    #[test]
    fn test_layouts() -> Result<(), MsrToolError> {
        let units = encode("3", Track::Two.alphabet())?;
        // '3' is 0b10011, LRC of '3' is the same unit
        assert_eq!(
            layout_units(&units, Track::Two.alphabet(), RawWriteLayout::AsRead),
            vec![0b11001, 0b11001]
        );
        assert_eq!(
            layout_units(&units, Track::Two.alphabet(), RawWriteLayout::ByteReversed),
            vec![0b1100_1000, 0b1100_1000]
        );
        Ok(())
    }
}
