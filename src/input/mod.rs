use crate::msr_tool_error::MsrToolError;
use crate::raw_tracks_data::RawTracksData;
use crate::tracks_data::TracksData;
use std::str::FromStr;

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum InputFormat {
    /// This format reads all tracks as one string, tracks separated by separator-character
    Combined,
}

impl FromStr for InputFormat {
    type Err = MsrToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combined" => Ok(InputFormat::Combined),
            _ => Err(MsrToolError::UnsupportedInputFormat),
        }
    }
}

pub fn parse_tracks(
    text: &str,
    format: &InputFormat,
    separator: &char,
) -> Result<TracksData, MsrToolError> {
    match format {
        InputFormat::Combined => TracksData::from_str(text, separator),
    }
}

/// Same layout as [`parse_tracks`] with every track given as hex.
pub fn parse_raw_tracks(
    text: &str,
    format: &InputFormat,
    separator: &char,
) -> Result<RawTracksData, MsrToolError> {
    let tracks = parse_tracks(text, format, separator)?;
    Ok(RawTracksData::new(
        hex::decode(tracks.track1.trim())?,
        hex::decode(tracks.track2.trim())?,
        hex::decode(tracks.track3.trim())?,
    ))
}
