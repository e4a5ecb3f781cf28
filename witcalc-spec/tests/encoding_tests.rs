//! Wire encoding tests across the three element forms

use num_bigint::BigUint;
use num_traits::One;
use witcalc_spec::encoding::{LONG_FLAG, MONTGOMERY_FLAG};
use witcalc_spec::memory::{read_u32, write_u32};
use witcalc_spec::{load_element, store_element, FieldParams, SpecError, WireElement};

const BN254: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

fn bn254() -> FieldParams {
    FieldParams::new(BN254.parse().unwrap(), 32).unwrap()
}

// ============================================================================
// Round Trips at Form Boundaries
// ============================================================================

#[test]
fn test_boundary_roundtrips() {
    let field = bn254();
    let one = BigUint::one();
    let boundaries = [
        BigUint::from(0u32),
        field.short_max() - &one,
        field.short_max().clone(),
        field.short_min().clone(),
        field.short_min() + &one,
        field.prime() - &one,
    ];

    let mut mem = vec![0u8; 64];
    for value in boundaries {
        store_element(&mut mem, 16, &field, &value).unwrap();
        assert_eq!(load_element(&mem, 16, &field).unwrap(), value, "value {value}");
    }
}

#[test]
fn test_overwrite_long_with_short_then_long() {
    // A short store leaves the old payload behind; a later long store must
    // not pick up any of it
    let field = bn254();
    let mut mem = vec![0u8; 40];
    let big = field.short_min() - BigUint::one();
    store_element(&mut mem, 0, &field, &big).unwrap();
    store_element(&mut mem, 0, &field, &BigUint::from(9u32)).unwrap();
    assert_eq!(load_element(&mem, 0, &field).unwrap(), BigUint::from(9u32));

    let small_long = field.short_max().clone();
    store_element(&mut mem, 0, &field, &small_long).unwrap();
    assert_eq!(load_element(&mem, 0, &field).unwrap(), small_long);
}

// ============================================================================
// Guest-Written Elements
// ============================================================================

#[test]
fn test_decode_guest_montgomery_one() {
    // Guests commonly hold the constant 1 as R mod p in Montgomery form
    let field = bn254();
    let mut mem = vec![0u8; 40];
    write_u32(&mut mem, 4, LONG_FLAG | MONTGOMERY_FLAG).unwrap();
    let r_mod_p = field.r() % field.prime();
    let bytes = r_mod_p.to_bytes_le();
    mem[8..8 + bytes.len()].copy_from_slice(&bytes);

    assert_eq!(load_element(&mem, 0, &field).unwrap(), BigUint::one());
}

#[test]
fn test_decode_guest_short_negative() {
    let field = bn254();
    let mut mem = vec![0u8; 8];
    write_u32(&mut mem, 0, 0xFFFF_FFFE).unwrap();
    assert_eq!(
        load_element(&mem, 0, &field).unwrap(),
        field.prime() - BigUint::from(2u32)
    );
}

#[test]
fn test_short_forms_need_only_header() {
    let field = bn254();
    let mut mem = vec![0u8; 8];
    store_element(&mut mem, 0, &field, &BigUint::from(77u32)).unwrap();
    assert_eq!(read_u32(&mem, 0).unwrap(), 77);
    assert_eq!(read_u32(&mem, 4).unwrap(), 0);
    assert_eq!(
        WireElement::load(&mem, 0, field.n8()).unwrap(),
        WireElement::ShortPositive(77)
    );
}

#[test]
fn test_long_form_needs_payload_space() {
    let field = bn254();
    let mut mem = vec![0u8; 8];
    let err = store_element(&mut mem, 0, &field, field.short_max()).unwrap_err();
    assert!(matches!(err, SpecError::OutOfBounds { offset: 8, len: 32, size: 8 }));
}
