//! Service-center address (SCA) layout.
//!
//! Same digits and TOA as a recipient [`Address`], but the length byte counts
//! octets *including* the TOA byte, and an empty address is a lone `0x00`.

use super::{semioctet, Address, CodecError, DecodeError, TypeOfAddress, MAX_LENGTH_FIELD};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct SmscAddress(pub Address);

impl SmscAddress {
    pub fn address(&self) -> &Address {
        &self.0
    }

    /// Marshal in the service-center layout.
    pub fn marshal_binary(&self) -> Result<Vec<u8>, CodecError> {
        let packed = semioctet::encode(self.0.digits())?;
        if packed.is_empty() {
            return Ok(vec![0]);
        }
        let l = packed.len() + 1; // in octets and includes the toa
        if l > MAX_LENGTH_FIELD {
            return Err(CodecError::TooLong {
                field: "addr",
                length: l,
            });
        }
        let mut dst = Vec::with_capacity(l + 1);
        dst.push(l as u8);
        dst.push(self.0.toa().0);
        dst.extend_from_slice(&packed);
        Ok(dst)
    }

    /// Unmarshal a service-center address, returning it with the number of
    /// bytes consumed. A zero length consumes one byte and yields the empty
    /// address regardless of what follows.
    pub fn unmarshal_binary(src: &[u8]) -> Result<(Self, usize), CodecError> {
        let l = *src.first().ok_or(DecodeError::underflow("length", 0))? as usize;
        if l == 0 {
            return Ok((SmscAddress::default(), 1));
        }
        let toa = *src.get(1).ok_or(DecodeError::underflow("toa", 1))?;
        let ri = 2;
        let octets = l - 1; // encoded length includes toa
        let packed = src
            .get(ri..ri + octets)
            .ok_or(DecodeError::underflow("addr", ri))?;
        let digits = semioctet::decode(packed, ri)?;
        Ok((
            SmscAddress(Address::new(digits, TypeOfAddress(toa))),
            ri + octets,
        ))
    }
}

impl From<Address> for SmscAddress {
    fn from(a: Address) -> Self {
        SmscAddress(a)
    }
}

impl fmt::Display for SmscAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "(default)")
        } else {
            fmt::Display::fmt(&self.0, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_single_zero() {
        let sca = SmscAddress::default();
        assert_eq!(sca.marshal_binary().unwrap(), vec![0x00]);
        assert_eq!(
            SmscAddress::unmarshal_binary(&[0x00, 0x91, 0x12]).unwrap(),
            (sca, 1)
        );
    }

    #[test]
    fn length_includes_toa() {
        let sca = SmscAddress(Address::new("123", TypeOfAddress::NATIONAL));
        let bytes = sca.marshal_binary().unwrap();
        assert_eq!(bytes, vec![0x03, 0xA1, 0x21, 0xF3]);
        assert_eq!(SmscAddress::unmarshal_binary(&bytes).unwrap(), (sca, 4));
    }

    #[test]
    fn layouts_differ_for_same_address() {
        let a = Address::parse("+61409000000");
        let recipient = a.marshal_binary().unwrap();
        let sca = SmscAddress(a).marshal_binary().unwrap();
        assert_eq!(recipient[0], 11);
        assert_eq!(sca[0], 7);
        assert_eq!(recipient[1..], sca[1..]);
    }

    #[test]
    fn underflow_offsets() {
        let err = SmscAddress::unmarshal_binary(&[]).unwrap_err();
        assert_eq!(err, CodecError::Decode(DecodeError::underflow("length", 0)));
        let err = SmscAddress::unmarshal_binary(&[0x03]).unwrap_err();
        assert_eq!(err, CodecError::Decode(DecodeError::underflow("toa", 1)));
        let err = SmscAddress::unmarshal_binary(&[0x03, 0x91, 0x21]).unwrap_err();
        assert_eq!(err, CodecError::Decode(DecodeError::underflow("addr", 2)));
    }

    #[test]
    fn fill_outside_final_octet_rejected() {
        let err = SmscAddress::unmarshal_binary(&[0x03, 0x91, 0xF1, 0x32]).unwrap_err();
        assert_eq!(err, CodecError::Decode(DecodeError::invalid_digit("addr", 2)));
        let (sca, used) = SmscAddress::unmarshal_binary(&[0x03, 0x91, 0x21, 0xF3]).unwrap();
        assert_eq!(sca.address().digits(), "123");
        assert_eq!(used, 4);
    }

    #[test]
    fn packed_octets_over_limit_rejected() {
        // 255 packed octets plus the toa does not fit the length byte
        let sca = SmscAddress(Address::new("1".repeat(510), TypeOfAddress::UNKNOWN));
        assert_eq!(
            sca.marshal_binary().unwrap_err(),
            CodecError::TooLong {
                field: "addr",
                length: 256
            }
        );
        let sca = SmscAddress(Address::new("1".repeat(508), TypeOfAddress::UNKNOWN));
        assert_eq!(sca.marshal_binary().unwrap()[0], 255);
    }

    #[test]
    fn display_marks_default() {
        assert_eq!(SmscAddress::default().to_string(), "(default)");
        assert_eq!(SmscAddress(Address::parse("+44")).to_string(), "+44");
    }
}
