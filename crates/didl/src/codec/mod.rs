// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encode/decode entry points.
//!
//! One call encodes or decodes one complete message: the type-table header
//! followed by the argument values. Calls are synchronous, perform no I/O
//! and share no mutable state; concurrent calls over the same (read-only)
//! registry and descriptors are safe.

mod decode;
mod encode;

use crate::error::{CodecError, CodecResult};
use crate::idl::{IdlType, TypeRegistry};
use crate::table::parse::parse_header;
use crate::table::TypeTable;
use crate::value::Value;
use crate::wire::cursor::Cursor;
use decode::ValueDecoder;
use encode::ValueEncoder;
use std::sync::Arc;

/// Encode argument values against their descriptors into one message.
///
/// Fails with [`CodecError::TypeMismatch`] when a value's dynamic shape
/// disagrees with its descriptor; nothing is partially written in that case
/// as far as the caller is concerned (the returned buffer is dropped).
pub fn encode_args(
    registry: &TypeRegistry,
    types: &[Arc<IdlType>],
    values: &[Value],
) -> CodecResult<Vec<u8>> {
    if types.len() != values.len() {
        return Err(CodecError::TypeMismatch {
            expected: format!("{} argument values", types.len()),
            found: format!("{} argument values", values.len()),
        });
    }
    let table = TypeTable::build(registry, types)?;
    let mut buf = Vec::with_capacity(64);
    table.serialize(&mut buf);
    let mut encoder = ValueEncoder::new(registry, &mut buf);
    for (value, ty) in values.iter().zip(types) {
        encoder.encode_value(value, ty)?;
    }
    Ok(buf)
}

/// Encode a single value. Convenience wrapper over [`encode_args`].
pub fn encode_one(
    registry: &TypeRegistry,
    ty: &Arc<IdlType>,
    value: &Value,
) -> CodecResult<Vec<u8>> {
    encode_args(
        registry,
        std::slice::from_ref(ty),
        std::slice::from_ref(value),
    )
}

/// Decode one message against the expected argument descriptors.
///
/// The wire's own type table directs the byte layout; the expected
/// descriptors direct the shape and naming of the produced values. The two
/// must agree structurally. Trailing bytes after the last argument are
/// ignored (message framing belongs to the transport).
pub fn decode_args(
    registry: &TypeRegistry,
    types: &[Arc<IdlType>],
    bytes: &[u8],
) -> CodecResult<Vec<Value>> {
    let mut cursor = Cursor::new(bytes);
    let table = parse_header(&mut cursor)?;
    if table.args.len() != types.len() {
        return Err(CodecError::TypeMismatch {
            expected: format!("{} arguments", types.len()),
            found: format!("{} arguments", table.args.len()),
        });
    }
    let mut decoder = ValueDecoder::new(registry, &table, cursor);
    let mut values = Vec::with_capacity(types.len());
    for (wire, expected) in table.args.iter().zip(types) {
        values.push(decoder.decode_value(*wire, expected)?);
    }
    log::trace!(
        "[CODEC] decoded {} arguments, {} bytes consumed",
        values.len(),
        decoder.offset()
    );
    Ok(values)
}

/// Decode a single value. Convenience wrapper over [`decode_args`].
pub fn decode_one(
    registry: &TypeRegistry,
    ty: &Arc<IdlType>,
    bytes: &[u8],
) -> CodecResult<Value> {
    let mut values = decode_args(registry, std::slice::from_ref(ty), bytes)?;
    Ok(values.remove(0))
}
