// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use didl::{decode_one, Field, IdlType, PrimitiveKind, TypeRegistry};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Self-referential list type: exercises the recursive-handle and
    // depth-guard paths of the decoder.
    let mut registry = TypeRegistry::new();
    let node = registry
        .knot(|node| {
            IdlType::record(vec![
                Field::new("value", IdlType::prim(PrimitiveKind::Nat32)),
                Field::new("next", IdlType::opt(IdlType::rec(node))),
            ])
        })
        .expect("knot");
    let ty = Arc::new(IdlType::rec(node));
    let _ = decode_one(&registry, &ty, data);
});
