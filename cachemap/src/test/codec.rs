use crate::bitfield::{decode, BitField};
use crate::error::SimError;
use super::{all_addresses, direct4, every_kind, full4, set2};

#[test]
fn direct_mapped_fields() {
    let geometry = direct4().validate().unwrap();
    let parsed = decode("10110110", &geometry).unwrap();
    assert_eq!(parsed.tag, BitField::new(0b1011, 4));
    assert_eq!(parsed.index, Some(BitField::new(0b01, 2)));
    assert_eq!(parsed.word, BitField::new(0b10, 2));
    assert_eq!(parsed.block_number(), 0b101101);
    assert_eq!(parsed.value(), 0b10110110);
}

#[test]
fn fully_associative_has_no_index() {
    let geometry = full4().validate().unwrap();
    let parsed = decode("10110110", &geometry).unwrap();
    assert_eq!(parsed.tag.to_string(), "101101");
    assert_eq!(parsed.index, None);
    assert_eq!(parsed.index_value(), None);
    assert_eq!(parsed.word.to_string(), "10");
}

#[test]
fn set_associative_fields() {
    let geometry = set2().validate().unwrap();
    let parsed = decode("00001000", &geometry).unwrap();
    assert_eq!(parsed.tag.to_string(), "00001");
    assert_eq!(parsed.index.unwrap().to_string(), "0");
    assert_eq!(parsed.word.to_string(), "00");
}

#[test]
fn decode_round_trip() {
    for config in every_kind() {
        let geometry = config.validate().unwrap();
        for address in all_addresses(&config) {
            let parsed = decode(&address, &geometry).unwrap();
            assert_eq!(parsed.tag.width(), geometry.tag_bits());
            assert_eq!(parsed.index.map_or(0, |index| index.width()), geometry.index_bits());
            assert_eq!(parsed.word.width(), geometry.word_bits());
            assert_eq!(parsed.to_string(), address, "{}", config.name);
        }
    }
}

#[test]
fn wrong_length_is_rejected() {
    let geometry = direct4().validate().unwrap();
    assert_eq!(
        decode("1011011", &geometry),
        Err(SimError::InvalidAddressLength { expected: 8, actual: 7 })
    );
    assert_eq!(
        decode("101101100", &geometry),
        Err(SimError::InvalidAddressLength { expected: 8, actual: 9 })
    );
    assert_eq!(
        decode("", &geometry),
        Err(SimError::InvalidAddressLength { expected: 8, actual: 0 })
    );
}

#[test]
fn non_binary_digits_are_rejected() {
    let geometry = direct4().validate().unwrap();
    assert_eq!(
        decode("10120110", &geometry),
        Err(SimError::InvalidAddressDigit { position: 3, found: '2' })
    );
    // Counted in characters, not bytes
    assert_eq!(
        decode("1011011é", &geometry),
        Err(SimError::InvalidAddressDigit { position: 7, found: 'é' })
    );
}

#[test]
fn bit_field_rendering_keeps_leading_zeros() {
    assert_eq!(BitField::new(1, 6).to_string(), "000001");
    assert_eq!(BitField::zero(3).to_string(), "000");
    assert_eq!(BitField::zero(0).to_string(), "");
    assert_eq!(BitField::parse("000001").unwrap(), BitField::new(1, 6));
    // Same value, different width
    assert_ne!(BitField::new(1, 6), BitField::new(1, 5));
}

#[test]
#[should_panic]
fn bit_field_rejects_values_wider_than_the_field() {
    BitField::new(0b100, 2);
}

#[test]
fn bit_fields_serialise_as_strings() {
    let json = serde_json::to_string(&BitField::new(5, 4)).unwrap();
    assert_eq!(json, "\"0101\"");
}
