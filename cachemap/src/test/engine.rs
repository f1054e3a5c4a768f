use crate::bitfield::{decode, BitField};
use crate::config::CacheConfig;
use crate::lookup::{lookup, Placement};
use crate::replacement_policies::{fetch_block, replace, FirstInvalid, NoPolicy, ReplacementPolicy};
use crate::store::{CacheLine, LineRef, LineStore};
use super::{direct4, full4, set2};

fn tag(bits: &str) -> BitField {
    BitField::parse(bits).unwrap()
}

#[test]
fn store_starts_invalid() {
    let geometry = set2().validate().unwrap();
    let store = LineStore::initialize(&geometry);
    assert_eq!(store.lines().len(), 4);
    assert_eq!(store.get_invalid_line_count(), 4);
    assert_eq!(store.sets().count(), 2);
    assert!(store.lines().iter().all(|line| line.tag == BitField::zero(5) && line.data == vec![0; 4]));
}

#[test]
fn store_addresses_sets_by_way() {
    let geometry = set2().validate().unwrap();
    let mut store = LineStore::initialize(&geometry);
    store.replace(LineRef::Way { set: 1, way: 0 }, tag("10110"), vec![1, 2, 3, 4]);
    assert_eq!(store.flat_index(LineRef::Way { set: 1, way: 0 }), 2);
    assert_eq!(store.line_ref(3), LineRef::Way { set: 1, way: 1 });
    assert!(store.lines()[2].valid);
    assert_eq!(store.read(LineRef::Way { set: 1, way: 0 }).data, vec![1, 2, 3, 4]);
    assert_eq!(store.get_invalid_line_count(), 3);
}

#[test]
#[should_panic]
fn out_of_range_line_is_fatal() {
    let store = LineStore::initialize(&direct4().validate().unwrap());
    store.read(LineRef::Line(4));
}

#[test]
#[should_panic]
fn way_reference_into_direct_cache_is_fatal() {
    let store = LineStore::initialize(&direct4().validate().unwrap());
    store.read(LineRef::Way { set: 0, way: 0 });
}

#[test]
#[should_panic]
fn way_past_the_set_is_fatal() {
    let store = LineStore::initialize(&set2().validate().unwrap());
    store.read(LineRef::Way { set: 0, way: 2 });
}

#[test]
fn placement_domains() {
    let direct = LineStore::initialize(&direct4().validate().unwrap());
    assert_eq!(Placement::DirectMapped { index: 2 }.domain(&direct), 2..3);
    let full = LineStore::initialize(&full4().validate().unwrap());
    assert_eq!(Placement::FullyAssociative.domain(&full), 0..4);
    let set = LineStore::initialize(&set2().validate().unwrap());
    assert_eq!(Placement::SetAssociative { set: 1 }.domain(&set), 2..4);
}

#[test]
fn fully_associative_tag_search() {
    let geometry = full4().validate().unwrap();
    let mut store = LineStore::initialize(&geometry);
    store.replace(LineRef::Line(0), tag("101101"), vec![10, 11, 12, 13]);
    store.replace(LineRef::Line(2), tag("111000"), vec![20, 21, 22, 23]);

    let first = decode("10110111", &geometry).unwrap();
    let result = lookup(&first, &store, Placement::FullyAssociative);
    assert!(result.hit);
    assert_eq!(result.located_at, Some(LineRef::Line(0)));
    assert_eq!(result.delivered_word, Some(13));

    let second = decode("11100001", &geometry).unwrap();
    let result = lookup(&second, &store, Placement::FullyAssociative);
    assert_eq!(result.located_at, Some(LineRef::Line(2)));
    assert_eq!(result.delivered_word, Some(21));
    let matched: Vec<bool> = result.comparisons.iter().map(|c| c.matched).collect();
    assert_eq!(matched, vec![false, false, true, false]);

    let missing = decode("00000100", &geometry).unwrap();
    let result = lookup(&missing, &store, Placement::FullyAssociative);
    assert!(!result.hit);
    assert_eq!(result.located_at, None);
    assert_eq!(result.delivered_word, None);
    assert_eq!(result.comparisons.len(), 4);
}

#[test]
fn invalid_lines_never_match() {
    let geometry = direct4().validate().unwrap();
    let store = LineStore::initialize(&geometry);
    // The empty line's tag is all zeroes, as is this address's
    let address = decode("00000100", &geometry).unwrap();
    let result = lookup(&address, &store, Placement::DirectMapped { index: 1 });
    assert!(!result.hit);
    assert_eq!(result.comparisons.len(), 1);
    assert!(!result.comparisons[0].valid);
    assert_eq!(result.comparisons[0].stored_tag, address.tag);
    assert!(!result.comparisons[0].matched);
}

#[test]
fn first_match_wins() {
    let geometry = full4().validate().unwrap();
    let mut store = LineStore::initialize(&geometry);
    store.replace(LineRef::Line(1), tag("101101"), vec![1, 1, 1, 1]);
    store.replace(LineRef::Line(3), tag("101101"), vec![3, 3, 3, 3]);
    let address = decode("10110100", &geometry).unwrap();
    let result = lookup(&address, &store, Placement::FullyAssociative);
    assert_eq!(result.located_at, Some(LineRef::Line(1)));
    assert_eq!(result.delivered_word, Some(1));
    // Both duplicates are still reported
    assert_eq!(result.comparisons.iter().filter(|c| c.matched).count(), 2);
}

#[test]
fn policies_pick_within_the_set() {
    let empty = CacheLine { valid: false, tag: BitField::zero(4), data: vec![0; 4] };
    let full = CacheLine { valid: true, ..empty.clone() };
    assert_eq!(NoPolicy.get_new_line(5, &[full.clone()]), 5);
    assert_eq!(FirstInvalid.get_new_line(4, &[full.clone(), empty.clone(), empty.clone()]), 5);
    assert_eq!(FirstInvalid.get_new_line(4, &[full.clone(), full.clone()]), 4);
    assert_eq!(FirstInvalid.get_new_line(0, &[empty, full]), 0);
}

#[test]
fn replacement_installs_the_requested_block() {
    let geometry = set2().validate().unwrap();
    let mut store = LineStore::initialize(&geometry);
    store.replace(LineRef::Way { set: 1, way: 0 }, tag("11111"), vec![9, 9, 9, 9]);
    let address = decode("00010110", &geometry).unwrap();
    let placement = Placement::SetAssociative { set: 1 };
    let replacement = replace(&address, &mut store, placement, &mut FirstInvalid);
    assert_eq!(replacement.victim, LineRef::Way { set: 1, way: 1 });
    assert_eq!(replacement.evicted, None);
    assert_eq!(replacement.block_number, 0b000101);
    assert_eq!(replacement.delivered_word, 0b00010110);
    let line = store.read(LineRef::Way { set: 1, way: 1 });
    assert!(line.valid);
    assert_eq!(line.tag, address.tag);
    assert_eq!(line.data, fetch_block(&geometry, 0b000101));
    // The other way is untouched
    assert_eq!(store.read(LineRef::Way { set: 1, way: 0 }).tag, tag("11111"));
}

#[test]
fn fetched_words_hold_their_addresses() {
    let geometry = CacheConfig::direct("d", 8, 4, 64).validate().unwrap();
    assert_eq!(fetch_block(&geometry, 3), vec![24, 25, 26, 27, 28, 29, 30, 31]);
}
