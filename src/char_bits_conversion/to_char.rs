use crate::char_bits_conversion::{reverse_unit, Alphabet};

pub trait FromTrackUnit {
    /// Reads a unit as the device reports it: parity in bit 0, data bits mirrored above.
    fn from_track_unit(&self, alphabet: &Alphabet) -> char;
}

impl FromTrackUnit for u8 {
    fn from_track_unit(&self, alphabet: &Alphabet) -> char {
        let symbol = reverse_unit(*self >> 1, alphabet.data_bits());
        // masked to data_bits, always inside the alphabet
        alphabet.character(symbol).unwrap_or('?')
    }
}
