use crate::track::{Track, TRACKS};

/// Raw bytes of the three tracks, as carried in a length-prefixed block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTracksData {
    pub track1: Vec<u8>,
    pub track2: Vec<u8>,
    pub track3: Vec<u8>,
}

impl RawTracksData {
    pub fn new(track1: Vec<u8>, track2: Vec<u8>, track3: Vec<u8>) -> Self {
        RawTracksData {
            track1,
            track2,
            track3,
        }
    }

    pub fn track(&self, track: Track) -> &[u8] {
        match track {
            Track::One => &self.track1,
            Track::Two => &self.track2,
            Track::Three => &self.track3,
        }
    }

    pub fn track_mut(&mut self, track: Track) -> &mut Vec<u8> {
        match track {
            Track::One => &mut self.track1,
            Track::Two => &mut self.track2,
            Track::Three => &mut self.track3,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Track, &[u8])> {
        TRACKS.into_iter().map(move |track| (track, self.track(track)))
    }
}
