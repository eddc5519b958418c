// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bit-exact wire vectors.
//!
//! These byte sequences are fixed by the Candid binary format; they must
//! never change, or interoperability with existing consumers breaks.

use didl::{
    decode_one, encode_args, encode_one, IdlType, Principal, PrimitiveKind, TypeRegistry, Value,
};
use std::sync::Arc;

fn check(ty: IdlType, value: Value, expected: &[u8]) {
    let registry = TypeRegistry::new();
    let ty = Arc::new(ty);
    let bytes = encode_one(&registry, &ty, &value).expect("encode");
    assert_eq!(bytes, expected, "encoding of {}", ty);
    assert_eq!(
        decode_one(&registry, &ty, &bytes).expect("decode"),
        value,
        "round trip of {}",
        ty
    );
}

#[test]
fn empty_argument_list() {
    let registry = TypeRegistry::new();
    let bytes = encode_args(&registry, &[], &[]).expect("encode");
    assert_eq!(bytes, b"DIDL\x00\x00");
}

#[test]
fn fixed_width_nat32() {
    check(
        IdlType::prim(PrimitiveKind::Nat32),
        Value::Nat32(42),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x79, 0x2A, 0x00, 0x00, 0x00],
    );
}

#[test]
fn booleans() {
    check(
        IdlType::prim(PrimitiveKind::Bool),
        Value::Bool(true),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x7E, 0x01],
    );
    check(
        IdlType::prim(PrimitiveKind::Bool),
        Value::Bool(false),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x7E, 0x00],
    );
}

#[test]
fn leb128_nat() {
    check(
        IdlType::prim(PrimitiveKind::Nat),
        Value::Nat(624485),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x7D, 0xE5, 0x8E, 0x26],
    );
}

#[test]
fn sleb128_int() {
    check(
        IdlType::prim(PrimitiveKind::Int),
        Value::Int(-123456),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x7C, 0xC0, 0xBB, 0x78],
    );
}

#[test]
fn text_is_length_prefixed_utf8() {
    check(
        IdlType::prim(PrimitiveKind::Text),
        Value::from("hi"),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x71, 0x02, 0x68, 0x69],
    );
}

#[test]
fn float64_is_little_endian_ieee() {
    check(
        IdlType::prim(PrimitiveKind::Float64),
        Value::Float64(1.0),
        &[
            0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x72, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0,
            0x3F,
        ],
    );
}

#[test]
fn blob_vector() {
    check(
        IdlType::blob(),
        Value::Blob(vec![1, 2, 3]),
        &[0x44, 0x49, 0x44, 0x4C, 0x01, 0x6D, 0x7B, 0x01, 0x00, 0x03, 0x01, 0x02, 0x03],
    );
}

#[test]
fn principal_reference() {
    check(
        IdlType::prim(PrimitiveKind::Principal),
        Value::Principal(Principal::from_slice(&[1, 2, 3])),
        &[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x68, 0x01, 0x03, 0x01, 0x02, 0x03],
    );
}

#[test]
fn foreign_table_layouts_are_accepted() {
    // A peer may emit a table with unused or differently-ordered entries;
    // only the referenced indices matter. Entry 0 is unused here.
    let registry = TypeRegistry::new();
    let ty = Arc::new(IdlType::opt(IdlType::prim(PrimitiveKind::Nat32)));
    let bytes = [
        0x44, 0x49, 0x44, 0x4C, // magic
        0x02, // two entries
        0x6D, 0x71, // entry 0: vec text (unused)
        0x6E, 0x79, // entry 1: opt nat32
        0x01, 0x01, // one arg, index 1
        0x01, 0x07, 0x00, 0x00, 0x00, // present, 7
    ];
    assert_eq!(
        decode_one(&registry, &ty, &bytes).expect("decode"),
        Value::some(Value::Nat32(7))
    );
}
