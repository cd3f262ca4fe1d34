use crate::msr_tool_error::MsrToolError;
use crate::raw_tracks_data::RawTracksData;
use crate::track::TRACKS;
use crate::tracks_data::TracksData;
use std::str::FromStr;

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum OutputFormat {
    /// One line per track, prefixed with the track number
    Lines,
    /// This format combines all tracks into one string, tracks separated by separator-character
    Combined,
}

impl FromStr for OutputFormat {
    type Err = MsrToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(OutputFormat::Lines),
            "combined" => Ok(OutputFormat::Combined),
            _ => Err(MsrToolError::UnsupportedOutputFormat),
        }
    }
}

pub fn format_tracks(tracks: &TracksData, format: OutputFormat, separator: Option<char>) -> String {
    let strings = TRACKS.map(|track| tracks.track(track).to_string());
    join(strings, format, separator)
}

/// Raw tracks are shown as hex.
pub fn format_raw_tracks(
    tracks: &RawTracksData,
    format: OutputFormat,
    separator: Option<char>,
) -> String {
    let strings = TRACKS.map(|track| hex::encode(tracks.track(track)));
    join(strings, format, separator)
}

fn join(strings: [String; 3], format: OutputFormat, separator: Option<char>) -> String {
    match format {
        OutputFormat::Combined => strings.join(&separator.unwrap_or('_').to_string()),
        OutputFormat::Lines => strings
            .iter()
            .zip(TRACKS)
            .map(|(text, track)| format!("{}: {}", track.number(), text))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
