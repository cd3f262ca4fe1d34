/// Char bits conversion
/// ISO 7811-2 track encoding: characters become odd-parity units and every track
/// ends with an LRC unit. Track 1 supports a wider range of characters than tracks 2 and 3.
///
/// Units produced by [`encode`] hold the symbol in the low data bits and the parity bit
/// above them. The device reports raw tracks with each unit mirrored across its width
/// (parity in bit 0), which is what [`decode`] reads; [`to_device_order`] converts.
pub mod from_char;
pub mod to_char;
use crate::msr_tool_error::MsrToolError;
use from_char::ToTrackUnit;
use to_char::FromTrackUnit;

const TRACK1_SUPPORTED_ASCII: &str =
    " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_";
const TRACK2_3_SUPPORTED_ASCII: &str = "0123456789:;<=>?";

/// Ordered character set of a track. A character's position is its symbol value.
#[derive(Debug, PartialEq, Eq)]
pub struct Alphabet {
    name: &'static str,
    characters: &'static str,
    data_bits: u8,
}

pub const TRACK1_ALPHABET: Alphabet = Alphabet {
    name: "track 1",
    characters: TRACK1_SUPPORTED_ASCII,
    data_bits: 6,
};

pub const TRACK2_3_ALPHABET: Alphabet = Alphabet {
    name: "track 2/3",
    characters: TRACK2_3_SUPPORTED_ASCII,
    data_bits: 4,
};

impl Alphabet {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn data_bits(&self) -> u8 {
        self.data_bits
    }

    /// Data bits plus the parity bit.
    pub fn unit_bits(&self) -> u8 {
        self.data_bits + 1
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.characters.chars()
    }

    pub fn symbol(&self, character: char) -> Result<u8, MsrToolError> {
        self.characters
            .chars()
            .position(|c| c == character)
            .map(|position| position as u8)
            .ok_or(MsrToolError::CharacterNotInAlphabet {
                character,
                alphabet: self.name,
            })
    }

    pub fn character(&self, symbol: u8) -> Option<char> {
        self.characters
            .as_bytes()
            .get(symbol as usize)
            .map(|byte| *byte as char)
    }

    /// Fails on the first character the track cannot hold.
    pub fn validate(&self, data: &str) -> Result<(), MsrToolError> {
        data.chars().try_for_each(|c| self.symbol(c).map(|_| ()))
    }
}

/// Odd parity: 0 when the data bits already hold an odd number of ones.
fn parity(symbol: u8) -> u8 {
    if symbol.count_ones() % 2 != 0 {
        0
    } else {
        1
    }
}

fn with_parity(symbol: u8, data_bits: u8) -> u8 {
    symbol | (parity(symbol) << data_bits)
}

/// Mirrors the low `bits` bits of `value`. Higher bits are dropped.
pub fn reverse_unit(value: u8, bits: u8) -> u8 {
    debug_assert!((1..=8).contains(&bits));
    value.reverse_bits() >> (8 - bits)
}

/// Mirrors every byte, bit i trading places with bit 7 - i.
pub fn reverse_bits(data: &[u8]) -> Vec<u8> {
    data.iter().map(|byte| byte.reverse_bits()).collect()
}

/// XOR of the symbol values.
pub fn lrc(symbols: impl IntoIterator<Item = u8>) -> u8 {
    symbols.into_iter().fold(0, |lrc, symbol| lrc ^ symbol)
}

/// Encodes `data` one unit per byte, followed by the LRC unit.
pub fn encode(data: &str, alphabet: &Alphabet) -> Result<Vec<u8>, MsrToolError> {
    let mut units = Vec::with_capacity(data.len() + 1);
    let mut checksum = 0;
    for character in data.chars() {
        checksum ^= character.to_symbol(alphabet)?;
        units.push(character.to_track_unit(alphabet)?);
    }
    units.push(with_parity(checksum, alphabet.data_bits));

    Ok(units)
}

/// Decodes units in device order. Parity is dropped without being checked.
pub fn decode(units: &[u8], alphabet: &Alphabet) -> String {
    units
        .iter()
        .map(|unit| unit.from_track_unit(alphabet))
        .collect()
}

/// Mirrors each encoded unit across its own width, the layout raw reads come back in.
pub fn to_device_order(units: &[u8], alphabet: &Alphabet) -> Vec<u8> {
    units
        .iter()
        .map(|unit| reverse_unit(*unit, alphabet.unit_bits()))
        .collect()
}

/// Whether the last character of decoded track text is the LRC of the ones before it.
pub fn verify_lrc(decoded: &str, alphabet: &Alphabet) -> Result<bool, MsrToolError> {
    let mut symbols = decoded
        .chars()
        .map(|c| alphabet.symbol(c))
        .collect::<Result<Vec<u8>, MsrToolError>>()?;
    match symbols.pop() {
        Some(checksum) => Ok(lrc(symbols) == checksum),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_odd_ones() {
        assert_eq!(parity(0b00100), 0);
    }

    #[test]
    fn test_parity_even_ones() {
        assert_eq!(parity(0b00110), 1);
        assert_eq!(parity(0), 1);
    }

    #[test]
    fn test_alphabet_sizes() {
        assert_eq!(TRACK1_ALPHABET.len(), 64);
        assert_eq!(TRACK2_3_ALPHABET.len(), 16);
        assert_eq!(TRACK1_ALPHABET.symbol('%').ok(), Some(5));
        assert_eq!(TRACK1_ALPHABET.symbol('?').ok(), Some(31));
        assert_eq!(TRACK2_3_ALPHABET.symbol(';').ok(), Some(11));
    }

    #[test]
    fn test_alphabet_is_a_bijection() {
        for alphabet in [&TRACK1_ALPHABET, &TRACK2_3_ALPHABET] {
            for (index, character) in alphabet.chars().enumerate() {
                assert_eq!(alphabet.symbol(character).ok(), Some(index as u8));
                assert_eq!(alphabet.character(index as u8), Some(character));
            }
        }
    }

    #[test]
    fn test_every_unit_has_odd_parity() -> Result<(), MsrToolError> {
        for alphabet in [&TRACK1_ALPHABET, &TRACK2_3_ALPHABET] {
            let data: String = alphabet.chars().collect();
            for unit in encode(&data, alphabet)? {
                assert_eq!(unit.count_ones() % 2, 1, "unit {unit:#010b}");
                assert!(unit < 1 << alphabet.unit_bits());
            }
        }
        Ok(())
    }

    #[test]
    fn test_every_character_survives_the_device_round_trip() -> Result<(), MsrToolError> {
        for alphabet in [&TRACK1_ALPHABET, &TRACK2_3_ALPHABET] {
            for character in alphabet.chars() {
                let unit = character.to_track_unit(alphabet)?;
                let device_unit = reverse_unit(unit, alphabet.unit_bits());
                assert_eq!(device_unit.from_track_unit(alphabet), character);
            }
        }
        Ok(())
    }

    #[test]
    fn test_track2_digits_round_trip() -> Result<(), MsrToolError> {
        let data = "1234567890123456";
        let units = encode(data, &TRACK2_3_ALPHABET)?;
        assert_eq!(units.len(), data.len() + 1);

        let decoded = decode(&to_device_order(&units, &TRACK2_3_ALPHABET), &TRACK2_3_ALPHABET);
        let (text, checksum) = decoded.split_at(data.len());
        assert_eq!(text, data);
        // 1^2^..^9^0 = 1, 1^..^6 = 7
        assert_eq!(checksum, "6");
        assert!(verify_lrc(&decoded, &TRACK2_3_ALPHABET)?);

        Ok(())
    }

    #[test]
    fn test_lrc_covers_sentinels() -> Result<(), MsrToolError> {
        let units = encode("%B12?", &TRACK1_ALPHABET)?;
        let expected = lrc([5, 34, 17, 18, 31]);
        assert_eq!(units.last().map(|unit| unit & 0x3f), Some(expected));

        let decoded = decode(&to_device_order(&units, &TRACK1_ALPHABET), &TRACK1_ALPHABET);
        assert!(verify_lrc(&decoded, &TRACK1_ALPHABET)?);
        Ok(())
    }

    #[test]
    fn test_encode_empty_track_is_only_the_lrc() -> Result<(), MsrToolError> {
        assert_eq!(encode("", &TRACK2_3_ALPHABET)?, vec![0b10000]);
        Ok(())
    }

    #[test]
    fn test_encode_rejects_foreign_characters() {
        match encode("12a4", &TRACK2_3_ALPHABET) {
            Err(MsrToolError::CharacterNotInAlphabet {
                character,
                alphabet,
            }) => {
                assert_eq!(character, 'a');
                assert_eq!(alphabet, "track 2/3");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(TRACK1_ALPHABET.validate("lowercase").is_err());
        assert!(TRACK1_ALPHABET.validate("UPPER CASE").is_ok());
    }

    #[test]
    fn test_decode_ignores_bad_parity() {
        // '3' in device order is 0b11001; flip the parity bit
        assert_eq!(decode(&[0b11000], &TRACK2_3_ALPHABET), "3");
    }

    #[test]
    fn test_reverse_bits_is_an_involution() {
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(reverse_bits(&reverse_bits(&all)), all);
        assert_eq!(reverse_bits(&[0b0000_0001, 0b1100_0000]), vec![0b1000_0000, 0b0000_0011]);
    }

    #[test]
    fn test_reverse_unit() {
        assert_eq!(reverse_unit(0b10011, 5), 0b11001);
        assert_eq!(reverse_unit(0b0010011, 7), 0b1100100);
        // bits above the width are discarded
        assert_eq!(reverse_unit(0b1110_0001, 5), 0b10000);
    }
}
