use crate::msr_tool_error::MsrToolError;
use crate::track::{Track, TRACKS};

/// Text content of the three tracks. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracksData {
    pub track1: String,
    pub track2: String,
    pub track3: String,
}

impl TracksData {
    pub fn new(
        track1: impl Into<String>,
        track2: impl Into<String>,
        track3: impl Into<String>,
    ) -> Self {
        TracksData {
            track1: track1.into(),
            track2: track2.into(),
            track3: track3.into(),
        }
    }

    pub fn track(&self, track: Track) -> &str {
        match track {
            Track::One => &self.track1,
            Track::Two => &self.track2,
            Track::Three => &self.track3,
        }
    }

    pub fn track_mut(&mut self, track: Track) -> &mut String {
        match track {
            Track::One => &mut self.track1,
            Track::Two => &mut self.track2,
            Track::Three => &mut self.track3,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Track, &str)> {
        TRACKS.into_iter().map(move |track| (track, self.track(track)))
    }

    pub fn strip_sentinels(&self) -> TracksData {
        TracksData::new(
            Track::One.strip_sentinels(&self.track1),
            Track::Two.strip_sentinels(&self.track2),
            Track::Three.strip_sentinels(&self.track3),
        )
    }

    /// Checks every track against its alphabet before anything reaches the device.
    pub fn validate(&self) -> Result<(), MsrToolError> {
        self.iter()
            .try_for_each(|(track, text)| track.alphabet().validate(text))
    }

    /// Parses tracks joined by `separator`. Missing trailing tracks are empty.
    pub fn from_str(text: &str, separator: &char) -> Result<Self, MsrToolError> {
        let parts: Vec<&str> = text.trim_end_matches(['\r', '\n']).split(*separator).collect();
        if parts.len() > TRACKS.len() {
            return Err(MsrToolError::InvalidTrackInput(format!(
                "{} tracks given, a card has 3",
                parts.len()
            )));
        }
        let part = |index: usize| parts.get(index).copied().unwrap_or_default();

        Ok(TracksData::new(part(0), part(1), part(2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod from_str {
        use super::*;

        #[test]
        fn test_parse_text() -> Result<(), MsrToolError> {
            let separator = '_';

            let data_to_parse = vec![
                "%ABCDEFGHIJKLMNOPQRSTU1234567890ABCDEFGHIJKLMNOPQRSTU1234567890ABCDEFGHIJKLMN?",
                ";0987654321098765432109876543210987654?",
                ";12345?",
            ]
            .join(&separator.to_string());

            let result = TracksData::from_str(&data_to_parse, &separator)?;

            assert_eq!(
                result.track1,
                "%ABCDEFGHIJKLMNOPQRSTU1234567890ABCDEFGHIJKLMNOPQRSTU1234567890ABCDEFGHIJKLMN?"
            );
            assert_eq!(result.track2, ";0987654321098765432109876543210987654?");
            assert_eq!(result.track3, ";12345?");
            Ok(())
        }

        #[test]
        fn test_missing_tracks_are_empty() -> Result<(), MsrToolError> {
            let result = TracksData::from_str("%ABC?\n", &'|')?;
            assert_eq!(result, TracksData::new("%ABC?", "", ""));
            Ok(())
        }

        #[test]
        fn test_too_many_tracks() {
            assert!(matches!(
                TracksData::from_str("1_2_3_4", &'_'),
                Err(MsrToolError::InvalidTrackInput(_))
            ));
        }
    }

    #[test]
    fn test_validate_after_stripping() {
        let tracks = TracksData::new("%HELLO WORLD?", ";1234=5678?", "");
        assert!(tracks.strip_sentinels().validate().is_ok());

        let tracks = TracksData::new("", "12A4", "");
        assert!(matches!(
            tracks.validate(),
            Err(MsrToolError::CharacterNotInAlphabet { character: 'A', .. })
        ));
    }
}
