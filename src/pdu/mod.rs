//! # PDU Address Codec
//!
//! Binary marshalling of phone-number addresses into the semioctet form used by
//! SMS PDUs. Two layouts share the same digit packing but disagree on what the
//! leading length byte counts:
//!
//! - [`Address`] (recipient / TP-DA form): `[digit count][TOA][packed digits]`
//! - [`SmscAddress`] (service-center form): `[octets incl. TOA][TOA][packed digits]`,
//!   with the empty address encoded as a single `0x00` ("use the stored SMSC").
//!
//! The role decides the layout; nothing in the bytes themselves distinguishes them.
//!
//! ```rust
//! use smsmodem::pdu::{Address, SmscAddress};
//!
//! let smsc = SmscAddress(Address::parse("+447785016005"));
//! let bytes = smsc.marshal_binary().unwrap();
//! assert_eq!(bytes, vec![0x07, 0x91, 0x44, 0x77, 0x58, 0x10, 0x06, 0x50]);
//!
//! let (decoded, used) = SmscAddress::unmarshal_binary(&bytes).unwrap();
//! assert_eq!(decoded, smsc);
//! assert_eq!(used, bytes.len());
//! ```

pub mod address;
pub mod semioctet;
pub mod smsc;

pub use address::{Address, TypeOfAddress};
pub use smsc::SmscAddress;

use thiserror::Error;

/// Largest value the single-byte length field can carry.
pub const MAX_LENGTH_FIELD: usize = u8::MAX as usize;

/// Reasons a decode step can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Fewer bytes remain than the field requires.
    Underflow,
    /// A nibble outside the semioctet alphabet, or fill where a digit belongs.
    InvalidDigit,
    /// The decoded digit count disagrees with the length field.
    LengthMismatch,
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeErrorKind::Underflow => write!(f, "underflow"),
            DecodeErrorKind::InvalidDigit => write!(f, "invalid digit"),
            DecodeErrorKind::LengthMismatch => write!(f, "length mismatch"),
        }
    }
}

/// Structured decode failure identifying the field and byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode {field} at offset {offset}: {kind}")]
pub struct DecodeError {
    pub field: &'static str,
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn underflow(field: &'static str, offset: usize) -> Self {
        Self {
            field,
            offset,
            kind: DecodeErrorKind::Underflow,
        }
    }

    pub fn invalid_digit(field: &'static str, offset: usize) -> Self {
        Self {
            field,
            offset,
            kind: DecodeErrorKind::InvalidDigit,
        }
    }

    pub fn length_mismatch(field: &'static str, offset: usize) -> Self {
        Self {
            field,
            offset,
            kind: DecodeErrorKind::LengthMismatch,
        }
    }
}

/// Errors produced while marshalling or unmarshalling addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A symbol outside the semioctet alphabet was found while encoding.
    #[error("encode {field}: invalid digit {symbol:?} at offset {offset}")]
    InvalidDigit {
        field: &'static str,
        offset: usize,
        symbol: char,
    },

    /// The length field would not fit in a single byte.
    #[error("encode {field}: length {length} exceeds {max}", max = MAX_LENGTH_FIELD)]
    TooLong { field: &'static str, length: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Render bytes as contiguous upper-case hex, as modems expect in PDU mode.
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02X}", b);
    }
    out
}

/// Parse a hex string (whitespace ignored, either case) into bytes.
pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = s
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some(((hi << 4) | lo) as u8)
        })
        .collect()
}
