// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Adversarial-input tests: every malformed buffer must produce a typed
//! error, never a panic, an out-of-bounds read or a partial value.

use didl::{
    decode_one, encode_one, CodecError, IdlType, PrimitiveKind, RecordBuilder, TypeRegistry, Value,
};
use std::sync::Arc;

#[test]
fn truncation_always_fails_cleanly() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(
        RecordBuilder::new()
            .prim_field("id", PrimitiveKind::Nat64)
            .prim_field("name", PrimitiveKind::Text)
            .field("tags", IdlType::vec(IdlType::prim(PrimitiveKind::Nat32)))
            .build(),
    );
    let value = Value::record([
        ("id", Value::Nat64(77)),
        ("name", Value::from("sensor")),
        (
            "tags",
            Value::Vector(vec![Value::Nat32(1), Value::Nat32(2)]),
        ),
    ]);
    let bytes = encode_one(&registry, &ty, &value).expect("encode");

    // Every strict prefix must fail with a typed error; the value section
    // consumes exact byte counts, so no prefix can decode successfully.
    for len in 0..bytes.len() {
        let result = decode_one(&registry, &ty, &bytes[..len]);
        assert!(result.is_err(), "prefix of {} bytes decoded", len);
    }
    assert!(decode_one(&registry, &ty, &bytes).is_ok());
}

#[test]
fn empty_and_garbage_inputs() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::prim(PrimitiveKind::Nat32));
    assert!(decode_one(&registry, &ty, &[]).is_err());
    assert!(decode_one(&registry, &ty, b"XXXX").is_err());
    assert!(matches!(
        decode_one(&registry, &ty, b"DIDQ\x00\x01\x79\x2A\x00\x00\x00"),
        Err(CodecError::InvalidData { offset: 0, .. })
    ));
}

#[test]
fn vector_length_bomb_is_truncated_input() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::vec(IdlType::prim(PrimitiveKind::Nat32)));
    // Claims ~4 billion nat32 elements, provides none.
    let bytes = [
        0x44, 0x49, 0x44, 0x4C, 0x01, 0x6D, 0x79, 0x01, 0x00, // header
        0xFF, 0xFF, 0xFF, 0xFF, 0x0F, // leb128 length 0xFFFFFFFF
    ];
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::TruncatedInput { .. })
    ));
}

#[test]
fn zero_size_element_flood_is_rejected() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::vec(IdlType::prim(PrimitiveKind::Null)));
    // `vec null` elements occupy no bytes, so the length alone cannot be
    // checked against the input; implausible counts are refused instead.
    let bytes = [
        0x44, 0x49, 0x44, 0x4C, 0x01, 0x6D, 0x7F, 0x01, 0x00, // header
        0x80, 0x89, 0x7A, // leb128 length 2_000_000
    ];
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));

    // A modest count of zero-size elements is legal.
    let small = encode_one(
        &registry,
        &ty,
        &Value::Vector(vec![Value::Null, Value::Null]),
    )
    .unwrap();
    assert_eq!(
        decode_one(&registry, &ty, &small).unwrap(),
        Value::Vector(vec![Value::Null, Value::Null])
    );
}

#[test]
fn invalid_utf8_text_is_rejected() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::prim(PrimitiveKind::Text));
    let bytes = [0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x71, 0x02, 0xFF, 0xFE];
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn invalid_bool_byte_is_rejected() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::prim(PrimitiveKind::Bool));
    let bytes = [0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x7E, 0x02];
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn invalid_option_flag_is_rejected() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::opt(IdlType::prim(PrimitiveKind::Nat8)));
    let bytes = [0x44, 0x49, 0x44, 0x4C, 0x01, 0x6E, 0x7B, 0x01, 0x00, 0x07];
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn unbounded_leb128_is_rejected() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::prim(PrimitiveKind::Nat));
    let mut bytes = vec![0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x7D];
    bytes.extend(std::iter::repeat(0x80).take(19));
    bytes.push(0x01);
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn oversized_principal_is_rejected() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::prim(PrimitiveKind::Principal));
    let mut bytes = vec![0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x68, 0x01, 0x1E];
    bytes.extend(std::iter::repeat(0xAA).take(30));
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn wire_level_opt_tower_hits_depth_guard() {
    let mut registry = TypeRegistry::new();
    // Expected type: the infinite option `T = opt T`.
    let handle = registry
        .knot(|handle| IdlType::opt(IdlType::rec(handle)))
        .unwrap();
    let ty = Arc::new(IdlType::rec(handle));

    // Wire side: a self-referential opt entry and 600 nested presence flags.
    let mut bytes = vec![
        0x44, 0x49, 0x44, 0x4C, 0x01, 0x6E, 0x00, // entry 0: opt -> entry 0
        0x01, 0x00, // one arg, index 0
    ];
    bytes.extend(std::iter::repeat(0x01).take(600));
    bytes.push(0x00);
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn dangling_wire_type_index_is_malformed_table() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::opt(IdlType::prim(PrimitiveKind::Nat8)));
    // Arg references entry 3 of a 1-entry table.
    let bytes = [0x44, 0x49, 0x44, 0x4C, 0x01, 0x6E, 0x7B, 0x01, 0x03, 0x00];
    assert!(matches!(
        decode_one(&registry, &ty, &bytes),
        Err(CodecError::MalformedTypeTable { .. })
    ));
}

#[test]
fn truncated_fixed_width_read_reports_offsets() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::prim(PrimitiveKind::Nat64));
    let bytes = [0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x78, 0x2A, 0x00];
    match decode_one(&registry, &ty, &bytes) {
        Err(CodecError::TruncatedInput { offset, need, have }) => {
            assert_eq!(offset, 7);
            assert_eq!(need, 8);
            assert_eq!(have, 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn record_decode_is_atomic() {
    let registry = TypeRegistry::new();
    let ty = Arc::new(
        RecordBuilder::new()
            .prim_field("a", PrimitiveKind::Nat32)
            .prim_field("b", PrimitiveKind::Text)
            .build(),
    );
    let value = Value::record([("a", Value::Nat32(5)), ("b", Value::from("ok"))]);
    let bytes = encode_one(&registry, &ty, &value).unwrap();
    // Cut inside the second field: the whole decode fails, no partial
    // record is observable.
    let cut = &bytes[..bytes.len() - 1];
    assert!(decode_one(&registry, &ty, cut).is_err());

    // Unrelated sanity: a field list mismatch is a type mismatch, not a
    // partial success.
    let narrower = Arc::new(
        RecordBuilder::new()
            .prim_field("a", PrimitiveKind::Nat32)
            .build(),
    );
    assert!(matches!(
        decode_one(&registry, &narrower, &bytes),
        Err(CodecError::TypeMismatch { .. })
    ));
}
