use crate::char_bits_conversion::{with_parity, Alphabet};
use crate::msr_tool_error::MsrToolError;

pub trait ToTrackUnit {
    /// Position of the character in the track alphabet.
    fn to_symbol(&self, alphabet: &Alphabet) -> Result<u8, MsrToolError>;
    /// Symbol with its odd parity bit on top, right aligned.
    fn to_track_unit(&self, alphabet: &Alphabet) -> Result<u8, MsrToolError>;
}

impl ToTrackUnit for char {
    fn to_symbol(&self, alphabet: &Alphabet) -> Result<u8, MsrToolError> {
        alphabet.symbol(*self)
    }

    fn to_track_unit(&self, alphabet: &Alphabet) -> Result<u8, MsrToolError> {
        let symbol = self.to_symbol(alphabet)?;
        Ok(with_parity(symbol, alphabet.data_bits()))
    }
}
