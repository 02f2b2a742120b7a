//! Semioctet (swapped-nibble BCD) packing.
//!
//! Each octet carries two digits, the first in the low nibble. An odd digit
//! count leaves the final high nibble holding [`FILL`].

use super::{CodecError, DecodeError};

/// Fill nibble used to pad an odd-length digit string.
pub const FILL: u8 = 0x0F;

fn nibble_for(symbol: char) -> Option<u8> {
    match symbol {
        '0'..='9' => Some(symbol as u8 - b'0'),
        '*' => Some(0x0A),
        '#' => Some(0x0B),
        'a' | 'A' => Some(0x0C),
        'b' | 'B' => Some(0x0D),
        'c' | 'C' => Some(0x0E),
        _ => None,
    }
}

fn symbol_for(nibble: u8) -> Option<char> {
    match nibble {
        0..=9 => Some((b'0' + nibble) as char),
        0x0A => Some('*'),
        0x0B => Some('#'),
        0x0C => Some('a'),
        0x0D => Some('b'),
        0x0E => Some('c'),
        _ => None,
    }
}

/// Pack a digit string into semioctets.
pub fn encode(digits: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(digits.len().div_ceil(2));
    let mut low: Option<u8> = None;
    for (offset, symbol) in digits.chars().enumerate() {
        let n = nibble_for(symbol).ok_or(CodecError::InvalidDigit {
            field: "addr",
            offset,
            symbol,
        })?;
        match low.take() {
            Some(l) => out.push(l | (n << 4)),
            None => low = Some(n),
        }
    }
    if let Some(l) = low {
        out.push(l | (FILL << 4));
    }
    Ok(out)
}

/// Unpack semioctets into a digit string. `base` is the offset of `src`
/// within the enclosing buffer and is only used for error reporting.
///
/// Fill is accepted only in the high half of the final octet. Fill elsewhere
/// or any other unmapped nibble is an error.
pub fn decode(src: &[u8], base: usize) -> Result<String, DecodeError> {
    let mut out = String::with_capacity(src.len() * 2);
    let last = src.len().saturating_sub(1);
    for (i, &octet) in src.iter().enumerate() {
        let low = symbol_for(octet & 0x0F)
            .ok_or(DecodeError::invalid_digit("addr", base + i))?;
        out.push(low);
        let high = octet >> 4;
        match symbol_for(high) {
            Some(symbol) => out.push(symbol),
            None if high == FILL && i == last => {}
            None => return Err(DecodeError::invalid_digit("addr", base + i)),
        }
    }
    Ok(out)
}

/// Number of octets needed to pack `digits` semioctets.
pub fn packed_len(digits: usize) -> usize {
    digits.div_ceil(2)
}
