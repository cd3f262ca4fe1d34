use crate::char_bits_conversion::{Alphabet, TRACK1_ALPHABET, TRACK2_3_ALPHABET};
use std::fmt;

pub const END_SENTINEL: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    One,
    Two,
    Three,
}

pub const TRACKS: [Track; 3] = [Track::One, Track::Two, Track::Three];

impl Track {
    pub fn from_number(number: u8) -> Option<Track> {
        match number {
            1 => Some(Track::One),
            2 => Some(Track::Two),
            3 => Some(Track::Three),
            _ => None,
        }
    }

    /// 1-based number used in track markers.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn index(self) -> usize {
        match self {
            Track::One => 0,
            Track::Two => 1,
            Track::Three => 2,
        }
    }

    pub fn alphabet(self) -> &'static Alphabet {
        match self {
            Track::One => &TRACK1_ALPHABET,
            Track::Two | Track::Three => &TRACK2_3_ALPHABET,
        }
    }

    pub fn start_sentinel(self) -> char {
        match self {
            Track::One => '%',
            Track::Two | Track::Three => ';',
        }
    }

    /// Removes one leading start sentinel and one trailing end sentinel, if present.
    pub fn strip_sentinels(self, text: &str) -> &str {
        let text = text.strip_prefix(self.start_sentinel()).unwrap_or(text);
        text.strip_suffix(END_SENTINEL).unwrap_or(text)
    }

    pub fn wrap(self, data: &str) -> String {
        format!("{}{}{}", self.start_sentinel(), data, END_SENTINEL)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {}", self.number())
    }
}
