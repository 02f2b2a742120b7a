use smsmodem::pdu::{Address, CodecError, SmscAddress, TypeOfAddress};

fn samples() -> Vec<Address> {
    vec![
        Address::parse("+447785016005"),
        Address::parse("+1555123456"),
        Address::new("0612345678", TypeOfAddress::NATIONAL),
        Address::new("7", TypeOfAddress::UNKNOWN),
        Address::new("*100#", TypeOfAddress::UNKNOWN),
        Address::new("12abc", TypeOfAddress::UNKNOWN),
    ]
}

#[test]
fn recipient_layout_round_trips() {
    for a in samples() {
        let bytes = a.marshal_binary().expect("encode");
        let (decoded, used) = Address::unmarshal_binary(&bytes).expect("decode");
        assert_eq!(decoded, a, "bytes={:02X?}", bytes);
        assert_eq!(used, bytes.len());
    }
}

#[test]
fn smsc_layout_round_trips() {
    for a in samples() {
        let sca = SmscAddress(a);
        let bytes = sca.marshal_binary().expect("encode");
        let (decoded, used) = SmscAddress::unmarshal_binary(&bytes).expect("decode");
        assert_eq!(decoded, sca, "bytes={:02X?}", bytes);
        assert_eq!(used, bytes.len());
    }
}

#[test]
fn empty_smsc_is_one_zero_byte() {
    let bytes = SmscAddress::default().marshal_binary().unwrap();
    assert_eq!(bytes, vec![0x00]);

    // trailing bytes belong to the next field and are left alone
    let (decoded, used) = SmscAddress::unmarshal_binary(&[0x00, 0x11, 0x00, 0x0B]).unwrap();
    assert!(decoded.address().is_empty());
    assert_eq!(used, 1);
}

#[test]
fn decode_with_following_tpdu() {
    // SCA followed by the first octet of an SMS-SUBMIT
    let src = [0x07, 0x91, 0x44, 0x77, 0x58, 0x10, 0x06, 0x50, 0x11, 0x00];
    let (sca, used) = SmscAddress::unmarshal_binary(&src).unwrap();
    assert_eq!(sca.to_string(), "+447785016005");
    assert_eq!(used, 8);
    assert_eq!(src[used], 0x11);
}

#[test]
fn truncated_input_is_an_error_not_a_panic() {
    let full = Address::parse("+447785016005").marshal_binary().unwrap();
    for cut in 0..full.len() {
        let res = Address::unmarshal_binary(&full[..cut]);
        assert!(
            matches!(res, Err(CodecError::Decode(_))),
            "cut={} res={:?}",
            cut,
            res
        );
    }
    let full = SmscAddress(Address::parse("+447785016005"))
        .marshal_binary()
        .unwrap();
    for cut in 0..full.len() {
        assert!(SmscAddress::unmarshal_binary(&full[..cut]).is_err());
    }
}
