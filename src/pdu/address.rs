//! Recipient addresses and their TP-DA wire layout.

use super::{semioctet, CodecError, DecodeError, MAX_LENGTH_FIELD};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-of-address octet: `1 | TON(3) | NPI(4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeOfAddress(pub u8);

impl TypeOfAddress {
    /// Unknown type of number, ISDN/telephone numbering plan.
    pub const UNKNOWN: TypeOfAddress = TypeOfAddress(0x81);
    /// International number, ISDN/telephone numbering plan.
    pub const INTERNATIONAL: TypeOfAddress = TypeOfAddress(0x91);
    /// National number, ISDN/telephone numbering plan.
    pub const NATIONAL: TypeOfAddress = TypeOfAddress(0xA1);

    /// Type-of-number bits (0 unknown, 1 international, 2 national, ...).
    pub fn type_of_number(self) -> u8 {
        (self.0 >> 4) & 0x07
    }

    /// Numbering-plan bits (1 is ISDN/telephone).
    pub fn numbering_plan(self) -> u8 {
        self.0 & 0x0F
    }

    pub fn is_international(self) -> bool {
        self.type_of_number() == 1
    }
}

impl Default for TypeOfAddress {
    fn default() -> Self {
        TypeOfAddress::UNKNOWN
    }
}

/// A directory number plus its type-of-address tag.
///
/// Digits are kept exactly as they go on the wire: no leading `+`, letters
/// folded to lower case. No validation happens here; an unsupported symbol
/// only surfaces when the address is marshalled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Address {
    digits: String,
    toa: TypeOfAddress,
}

impl Address {
    pub fn new(digits: impl Into<String>, toa: TypeOfAddress) -> Self {
        Self {
            digits: digits.into().to_ascii_lowercase(),
            toa,
        }
    }

    /// Build an address from a dialable string. A leading `+` selects the
    /// international tag and is stripped; anything else is tagged unknown.
    pub fn parse(number: &str) -> Self {
        let number = number.trim();
        match number.strip_prefix('+') {
            Some(rest) => Self::new(rest, TypeOfAddress::INTERNATIONAL),
            None => Self::new(number, TypeOfAddress::UNKNOWN),
        }
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn toa(&self) -> TypeOfAddress {
        self.toa
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Marshal in the recipient layout: the length byte counts digits.
    pub fn marshal_binary(&self) -> Result<Vec<u8>, CodecError> {
        let packed = semioctet::encode(&self.digits)?;
        let count = self.digits.chars().count();
        if count > MAX_LENGTH_FIELD {
            return Err(CodecError::TooLong {
                field: "addr",
                length: count,
            });
        }
        let mut dst = Vec::with_capacity(2 + packed.len());
        dst.push(count as u8);
        dst.push(self.toa.0);
        dst.extend_from_slice(&packed);
        Ok(dst)
    }

    /// Unmarshal a recipient-layout address, returning it with the number of
    /// bytes consumed from `src`.
    pub fn unmarshal_binary(src: &[u8]) -> Result<(Self, usize), CodecError> {
        let count = *src.first().ok_or(DecodeError::underflow("length", 0))? as usize;
        let toa = *src.get(1).ok_or(DecodeError::underflow("toa", 1))?;
        let ri = 2;
        let octets = semioctet::packed_len(count);
        let packed = src
            .get(ri..ri + octets)
            .ok_or(DecodeError::underflow("addr", ri))?;
        let digits = semioctet::decode(packed, ri)?;
        if digits.len() != count {
            return Err(DecodeError::length_mismatch("length", 0).into());
        }
        Ok((
            Self {
                digits,
                toa: TypeOfAddress(toa),
            },
            ri + octets,
        ))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.toa.is_international() {
            write!(f, "+{}", self.digits)
        } else {
            write!(f, "{}", self.digits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::DecodeErrorKind;

    #[test]
    fn parse_international() {
        let a = Address::parse("+15551234567");
        assert_eq!(a.digits(), "15551234567");
        assert_eq!(a.toa(), TypeOfAddress::INTERNATIONAL);
        assert_eq!(a.to_string(), "+15551234567");
    }

    #[test]
    fn parse_local_is_unknown() {
        let a = Address::parse(" 0123 ");
        assert_eq!(a.digits(), "0123");
        assert_eq!(a.toa(), TypeOfAddress::UNKNOWN);
    }

    #[test]
    fn toa_bits() {
        assert_eq!(TypeOfAddress::NATIONAL.type_of_number(), 2);
        assert_eq!(TypeOfAddress::NATIONAL.numbering_plan(), 1);
        assert!(!TypeOfAddress::UNKNOWN.is_international());
    }

    #[test]
    fn length_counts_digits() {
        let a = Address::new("46708251358", TypeOfAddress::INTERNATIONAL);
        let bytes = a.marshal_binary().unwrap();
        assert_eq!(
            bytes,
            vec![0x0B, 0x91, 0x64, 0x07, 0x28, 0x15, 0x53, 0xF8]
        );
        assert_eq!(Address::unmarshal_binary(&bytes).unwrap(), (a, 8));
    }

    #[test]
    fn empty_recipient_keeps_toa() {
        let a = Address::new("", TypeOfAddress::UNKNOWN);
        let bytes = a.marshal_binary().unwrap();
        assert_eq!(bytes, vec![0x00, 0x81]);
        assert_eq!(Address::unmarshal_binary(&[0x00, 0x81, 0xFF]).unwrap(), (a, 2));
    }

    #[test]
    fn trailing_bytes_not_consumed() {
        let bytes = [0x04, 0x81, 0x21, 0x43, 0xAA, 0xBB];
        let (a, used) = Address::unmarshal_binary(&bytes).unwrap();
        assert_eq!(a.digits(), "1234");
        assert_eq!(used, 4);
    }

    #[test]
    fn underflow_names_field() {
        let cases: [(&[u8], &str, usize); 3] = [
            (&[], "length", 0),
            (&[0x04], "toa", 1),
            (&[0x04, 0x81, 0x21], "addr", 2),
        ];
        for (src, field, offset) in cases {
            match Address::unmarshal_binary(src) {
                Err(CodecError::Decode(e)) => {
                    assert_eq!(e.field, field);
                    assert_eq!(e.offset, offset);
                    assert_eq!(e.kind, DecodeErrorKind::Underflow);
                }
                other => panic!("expected underflow for {:?}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn short_digit_run_is_length_mismatch() {
        // declares four digits but the final octet carries fill
        let err = Address::unmarshal_binary(&[0x04, 0x81, 0x21, 0xF3]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Decode(DecodeError::length_mismatch("length", 0))
        );
        // odd count without fill decodes one digit too many
        assert!(Address::unmarshal_binary(&[0x03, 0x81, 0x21, 0x43]).is_err());
    }

    #[test]
    fn misplaced_fill_rejected() {
        let err = Address::unmarshal_binary(&[0x04, 0x81, 0xF1, 0x32]).unwrap_err();
        assert_eq!(err, CodecError::Decode(DecodeError::invalid_digit("addr", 2)));
    }

    #[test]
    fn too_many_digits_rejected() {
        let a = Address::new("1".repeat(256), TypeOfAddress::UNKNOWN);
        assert_eq!(
            a.marshal_binary().unwrap_err(),
            CodecError::TooLong {
                field: "addr",
                length: 256
            }
        );
        assert!(Address::new("1".repeat(255), TypeOfAddress::UNKNOWN)
            .marshal_binary()
            .is_ok());
    }

    #[test]
    fn invalid_digit_rejected() {
        let a = Address::new("12-34", TypeOfAddress::UNKNOWN);
        assert!(matches!(
            a.marshal_binary(),
            Err(CodecError::InvalidDigit { offset: 2, symbol: '-', .. })
        ));
    }
}
