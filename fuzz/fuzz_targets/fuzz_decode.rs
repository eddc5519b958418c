// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use didl::{decode_one, IdlType, PrimitiveKind, RecordBuilder, TypeRegistry};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let registry = TypeRegistry::new();

    // Fuzz against a representative flat record.
    let record = Arc::new(
        RecordBuilder::new()
            .prim_field("id", PrimitiveKind::Nat64)
            .prim_field("name", PrimitiveKind::Text)
            .field("payload", IdlType::blob())
            .field("flag", IdlType::opt(IdlType::prim(PrimitiveKind::Bool)))
            .build(),
    );
    let _ = decode_one(&registry, &record, data);

    // And against a bare arbitrary-precision integer (varint paths).
    let nat = Arc::new(IdlType::prim(PrimitiveKind::Nat));
    let _ = decode_one(&registry, &nat, data);
});
