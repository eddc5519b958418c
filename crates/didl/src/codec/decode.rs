// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-directed value decoding.
//!
//! The mirror of the encoder, plus everything the encoder does not need:
//! bytes are laid out according to the *wire* type table and matched in
//! lockstep against the *expected* descriptor. Every length prefix is
//! checked against the remaining input before use, every variant tag index
//! against the declared tag count, and recursion depth is bounded so
//! adversarial nesting fails with a typed error instead of exhausting the
//! stack. Decoding either yields a fully valid value or fails; there is no
//! partial result.

use crate::error::{CodecError, CodecResult};
use crate::idl::{Field, IdlType, Label, PrimitiveKind, TypeRegistry};
use crate::table::parse::{WireEntry, WireTable, WireType};
use crate::value::{Principal, Value, PRINCIPAL_MAX_LEN};
use crate::wire::cursor::Cursor;
use crate::wire::leb128::{read_leb128, read_leb128_len, read_sleb128};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Maximum nesting of the value traversal. Adversarial input (e.g. an `opt`
/// tower) must fail closed, not overflow the stack.
const MAX_NESTING: usize = 512;

/// Maximum element count for vectors whose elements occupy zero value bytes
/// (`vec null`, `vec reserved`); bounds decode time and memory for inputs
/// whose claimed length is not backed by any bytes.
const MAX_FLAT_ELEMS: usize = 1 << 20;

pub(crate) struct ValueDecoder<'a> {
    registry: &'a TypeRegistry,
    table: &'a WireTable,
    cursor: Cursor<'a>,
    depth: usize,
}

impl<'a> ValueDecoder<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry, table: &'a WireTable, cursor: Cursor<'a>) -> Self {
        Self {
            registry,
            table,
            cursor,
            depth: 0,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.cursor.offset()
    }

    pub(crate) fn decode_value(&mut self, wire: WireType, expected: &IdlType) -> CodecResult<Value> {
        self.enter()?;
        let result = self.decode_value_inner(wire, expected);
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> CodecResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(CodecError::InvalidData {
                offset: self.cursor.offset(),
                reason: format!("nesting depth exceeds {}", MAX_NESTING),
            });
        }
        Ok(())
    }

    fn decode_value_inner(&mut self, wire: WireType, expected: &IdlType) -> CodecResult<Value> {
        // Recursive handles are transparent at the value level.
        if let IdlType::Rec(handle) = expected {
            let target = self.registry.resolve(*handle)?.clone();
            return self.decode_value(wire, &target);
        }
        // Reserved accepts any wire value: consume it, keep nothing.
        if matches!(expected, IdlType::Prim(PrimitiveKind::Reserved)) {
            self.skip_value(wire)?;
            return Ok(Value::Reserved);
        }

        match wire {
            WireType::Prim(kind) => match expected {
                IdlType::Prim(want) if *want == kind => self.decode_primitive(kind),
                _ => Err(self.wire_mismatch(wire, expected)),
            },
            WireType::Indexed(index) => {
                let table = self.table;
                match (&table.entries[index], expected) {
                    (WireEntry::Opt(elem), IdlType::Opt(want)) => self.decode_opt(*elem, want),
                    (WireEntry::Vec(elem), IdlType::Vec(want)) => self.decode_vec(*elem, want),
                    (WireEntry::Record(fields), IdlType::Record(want)) => {
                        self.decode_record(fields, want)
                    }
                    (WireEntry::Record(fields), IdlType::Tuple(want)) => {
                        self.decode_tuple(fields, want)
                    }
                    (WireEntry::Variant(tags), IdlType::Variant(want)) => {
                        self.decode_variant(tags, want)
                    }
                    (WireEntry::Func { .. }, IdlType::Func(_)) => {
                        self.check_compat(wire, expected)?;
                        self.decode_func_ref()
                    }
                    (WireEntry::Service(_), IdlType::Service(_)) => {
                        self.check_compat(wire, expected)?;
                        Ok(Value::Service(self.read_principal()?))
                    }
                    _ => Err(self.wire_mismatch(wire, expected)),
                }
            }
        }
    }

    fn decode_opt(&mut self, elem: WireType, want: &Arc<IdlType>) -> CodecResult<Value> {
        let offset = self.cursor.offset();
        match self.cursor.read_u8()? {
            0 => Ok(Value::Opt(None)),
            1 => Ok(Value::some(self.decode_value(elem, want)?)),
            flag => Err(CodecError::InvalidData {
                offset,
                reason: format!("invalid option flag {}", flag),
            }),
        }
    }

    fn decode_vec(&mut self, elem: WireType, want: &Arc<IdlType>) -> CodecResult<Value> {
        let len = self.read_checked_len(elem)?;
        // Blob fast path: the canonical value form of `vec nat8`.
        if elem == WireType::Prim(PrimitiveKind::Nat8)
            && matches!(**want, IdlType::Prim(PrimitiveKind::Nat8))
        {
            let bytes = self.cursor.read_bytes(len)?;
            return Ok(Value::Blob(bytes.to_vec()));
        }
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(self.decode_value(elem, want)?);
        }
        Ok(Value::Vector(items))
    }

    /// Read a vector length prefix and reject lengths the remaining input
    /// cannot possibly satisfy, before any allocation.
    fn read_checked_len(&mut self, elem: WireType) -> CodecResult<usize> {
        let offset = self.cursor.offset();
        let len = read_leb128_len(&mut self.cursor)?;
        let min = self.min_size(elem);
        if min > 0 {
            let need = len.saturating_mul(min);
            if need > self.cursor.remaining() {
                return Err(CodecError::TruncatedInput {
                    offset,
                    need,
                    have: self.cursor.remaining(),
                });
            }
        } else if len > MAX_FLAT_ELEMS {
            return Err(CodecError::InvalidData {
                offset,
                reason: format!("implausible length {} for zero-size elements", len),
            });
        }
        Ok(len)
    }

    fn decode_record(&mut self, fields: &[(u32, WireType)], want: &[Field]) -> CodecResult<Value> {
        let mut expected: Vec<&Field> = want.iter().collect();
        expected.sort_by_key(|f| f.label.id());
        if fields.len() != expected.len() {
            return Err(CodecError::TypeMismatch {
                expected: format!("record with {} fields", expected.len()),
                found: format!("record with {} fields", fields.len()),
            });
        }
        let mut map = HashMap::with_capacity(fields.len());
        for ((wire_id, wire_ty), field) in fields.iter().zip(expected) {
            if *wire_id != field.label.id() {
                return Err(CodecError::TypeMismatch {
                    expected: format!("record field id {}", field.label.id()),
                    found: format!("field id {}", wire_id),
                });
            }
            let value = self.decode_value(*wire_ty, &field.ty)?;
            let key = match &field.label {
                Label::Named(name) => name.clone(),
                Label::Id(id) => id.to_string(),
            };
            map.insert(key, value);
        }
        Ok(Value::Record(map))
    }

    fn decode_tuple(
        &mut self,
        fields: &[(u32, WireType)],
        want: &[Arc<IdlType>],
    ) -> CodecResult<Value> {
        if fields.len() != want.len() {
            return Err(CodecError::TypeMismatch {
                expected: format!("tuple of {}", want.len()),
                found: format!("record with {} fields", fields.len()),
            });
        }
        let mut items = Vec::with_capacity(fields.len());
        for (position, ((wire_id, wire_ty), elem)) in fields.iter().zip(want).enumerate() {
            if *wire_id != position as u32 {
                return Err(CodecError::TypeMismatch {
                    expected: format!("tuple field id {}", position),
                    found: format!("field id {}", wire_id),
                });
            }
            items.push(self.decode_value(*wire_ty, elem)?);
        }
        Ok(Value::Tuple(items))
    }

    fn decode_variant(&mut self, tags: &[(u32, WireType)], want: &[Field]) -> CodecResult<Value> {
        let offset = self.cursor.offset();
        let index = read_leb128(&mut self.cursor)?;
        if index >= tags.len() as u128 {
            return Err(CodecError::UnknownVariant {
                offset,
                index: u64::try_from(index).unwrap_or(u64::MAX),
                count: tags.len(),
            });
        }
        let (wire_id, wire_ty) = tags[index as usize];

        let mut expected: Vec<&Field> = want.iter().collect();
        expected.sort_by_key(|f| f.label.id());
        let field = expected
            .iter()
            .find(|f| f.label.id() == wire_id)
            .ok_or_else(|| CodecError::TypeMismatch {
                expected: format!("variant with {} known tags", expected.len()),
                found: format!("tag id {}", wire_id),
            })?;

        let value = self.decode_value(wire_ty, &field.ty)?;
        let tag = match &field.label {
            Label::Named(name) => name.clone(),
            Label::Id(id) => id.to_string(),
        };
        Ok(Value::variant(tag, value))
    }

    fn decode_primitive(&mut self, kind: PrimitiveKind) -> CodecResult<Value> {
        match kind {
            PrimitiveKind::Null => Ok(Value::Null),
            PrimitiveKind::Reserved => Ok(Value::Reserved),
            PrimitiveKind::Empty => Err(CodecError::InvalidData {
                offset: self.cursor.offset(),
                reason: "cannot decode a value of type empty".into(),
            }),
            PrimitiveKind::Bool => {
                let offset = self.cursor.offset();
                match self.cursor.read_u8()? {
                    0 => Ok(Value::Bool(false)),
                    1 => Ok(Value::Bool(true)),
                    byte => Err(CodecError::InvalidData {
                        offset,
                        reason: format!("invalid bool byte {}", byte),
                    }),
                }
            }
            PrimitiveKind::Nat => Ok(Value::Nat(read_leb128(&mut self.cursor)?)),
            PrimitiveKind::Int => Ok(Value::Int(read_sleb128(&mut self.cursor)?)),
            PrimitiveKind::Nat8 => Ok(Value::Nat8(self.cursor.read_u8()?)),
            PrimitiveKind::Nat16 => Ok(Value::Nat16(self.cursor.read_u16_le()?)),
            PrimitiveKind::Nat32 => Ok(Value::Nat32(self.cursor.read_u32_le()?)),
            PrimitiveKind::Nat64 => Ok(Value::Nat64(self.cursor.read_u64_le()?)),
            PrimitiveKind::Int8 => Ok(Value::Int8(self.cursor.read_i8()?)),
            PrimitiveKind::Int16 => Ok(Value::Int16(self.cursor.read_i16_le()?)),
            PrimitiveKind::Int32 => Ok(Value::Int32(self.cursor.read_i32_le()?)),
            PrimitiveKind::Int64 => Ok(Value::Int64(self.cursor.read_i64_le()?)),
            PrimitiveKind::Float32 => Ok(Value::Float32(self.cursor.read_f32_le()?)),
            PrimitiveKind::Float64 => Ok(Value::Float64(self.cursor.read_f64_le()?)),
            PrimitiveKind::Text => {
                let len = read_leb128_len(&mut self.cursor)?;
                let offset = self.cursor.offset();
                let bytes = self.cursor.read_bytes(len)?;
                String::from_utf8(bytes.to_vec())
                    .map(Value::Text)
                    .map_err(|_| CodecError::InvalidData {
                        offset,
                        reason: "text is not valid UTF-8".into(),
                    })
            }
            PrimitiveKind::Principal => Ok(Value::Principal(self.read_principal()?)),
        }
    }

    fn decode_func_ref(&mut self) -> CodecResult<Value> {
        let offset = self.cursor.offset();
        let flag = self.cursor.read_u8()?;
        if flag != 1 {
            return Err(CodecError::InvalidData {
                offset,
                reason: format!("unsupported function reference flag {}", flag),
            });
        }
        let service = self.read_principal()?;
        let len = read_leb128_len(&mut self.cursor)?;
        let name_offset = self.cursor.offset();
        let bytes = self.cursor.read_bytes(len)?;
        let method = String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidData {
            offset: name_offset,
            reason: "method name is not valid UTF-8".into(),
        })?;
        Ok(Value::Func { service, method })
    }

    fn read_principal(&mut self) -> CodecResult<Principal> {
        let offset = self.cursor.offset();
        let flag = self.cursor.read_u8()?;
        if flag != 1 {
            return Err(CodecError::InvalidData {
                offset,
                reason: format!("unsupported reference flag {}", flag),
            });
        }
        let len_offset = self.cursor.offset();
        let len = read_leb128_len(&mut self.cursor)?;
        if len > PRINCIPAL_MAX_LEN {
            return Err(CodecError::InvalidData {
                offset: len_offset,
                reason: format!("principal length {} exceeds {}", len, PRINCIPAL_MAX_LEN),
            });
        }
        Ok(Principal::from_slice(self.cursor.read_bytes(len)?))
    }

    /// Advance the cursor past one value of the given wire type without
    /// materializing it (the `reserved` path). Shares all validation with
    /// the decoding path except UTF-8 checks on skipped text.
    fn skip_value(&mut self, wire: WireType) -> CodecResult<()> {
        self.enter()?;
        let result = self.skip_value_inner(wire);
        self.depth -= 1;
        result
    }

    fn skip_value_inner(&mut self, wire: WireType) -> CodecResult<()> {
        match wire {
            WireType::Prim(kind) => match kind {
                PrimitiveKind::Null | PrimitiveKind::Reserved => Ok(()),
                PrimitiveKind::Empty => Err(CodecError::InvalidData {
                    offset: self.cursor.offset(),
                    reason: "cannot decode a value of type empty".into(),
                }),
                PrimitiveKind::Nat => read_leb128(&mut self.cursor).map(|_| ()),
                PrimitiveKind::Int => read_sleb128(&mut self.cursor).map(|_| ()),
                PrimitiveKind::Text => {
                    let len = read_leb128_len(&mut self.cursor)?;
                    self.cursor.read_bytes(len).map(|_| ())
                }
                PrimitiveKind::Principal => self.read_principal().map(|_| ()),
                fixed => {
                    // Remaining kinds all have a fixed size.
                    let size = fixed.fixed_size().unwrap_or(0);
                    self.cursor.read_bytes(size).map(|_| ())
                }
            },
            WireType::Indexed(index) => {
                let table = self.table;
                match &table.entries[index] {
                    WireEntry::Opt(elem) => {
                        let offset = self.cursor.offset();
                        match self.cursor.read_u8()? {
                            0 => Ok(()),
                            1 => self.skip_value(*elem),
                            flag => Err(CodecError::InvalidData {
                                offset,
                                reason: format!("invalid option flag {}", flag),
                            }),
                        }
                    }
                    WireEntry::Vec(elem) => {
                        let len = self.read_checked_len(*elem)?;
                        if *elem == WireType::Prim(PrimitiveKind::Nat8) {
                            return self.cursor.read_bytes(len).map(|_| ());
                        }
                        for _ in 0..len {
                            self.skip_value(*elem)?;
                        }
                        Ok(())
                    }
                    WireEntry::Record(fields) => {
                        for (_, field_ty) in fields {
                            self.skip_value(*field_ty)?;
                        }
                        Ok(())
                    }
                    WireEntry::Variant(tags) => {
                        let offset = self.cursor.offset();
                        let tag_index = read_leb128(&mut self.cursor)?;
                        if tag_index >= tags.len() as u128 {
                            return Err(CodecError::UnknownVariant {
                                offset,
                                index: u64::try_from(tag_index).unwrap_or(u64::MAX),
                                count: tags.len(),
                            });
                        }
                        self.skip_value(tags[tag_index as usize].1)
                    }
                    WireEntry::Func { .. } => {
                        let offset = self.cursor.offset();
                        let flag = self.cursor.read_u8()?;
                        if flag != 1 {
                            return Err(CodecError::InvalidData {
                                offset,
                                reason: format!("unsupported function reference flag {}", flag),
                            });
                        }
                        self.read_principal()?;
                        let len = read_leb128_len(&mut self.cursor)?;
                        self.cursor.read_bytes(len).map(|_| ())
                    }
                    WireEntry::Service(_) => self.read_principal().map(|_| ()),
                }
            }
        }
    }

    /// Minimum number of value bytes one instance of `wire` can occupy.
    /// Used to reject unsatisfiable vector lengths up front. Conservative
    /// on cycles and very deep tables (returns 1).
    fn min_size(&self, wire: WireType) -> usize {
        let mut visiting = Vec::new();
        self.min_size_guarded(wire, &mut visiting, 0)
    }

    fn min_size_guarded(&self, wire: WireType, visiting: &mut Vec<usize>, depth: usize) -> usize {
        if depth > MAX_NESTING {
            return 1;
        }
        match wire {
            WireType::Prim(kind) => kind.fixed_size().unwrap_or(1),
            WireType::Indexed(index) => {
                if visiting.contains(&index) {
                    return 1;
                }
                visiting.push(index);
                let size = match &self.table.entries[index] {
                    WireEntry::Opt(_) | WireEntry::Vec(_) | WireEntry::Variant(_) => 1,
                    WireEntry::Record(fields) => fields.iter().fold(0usize, |acc, (_, ty)| {
                        acc.saturating_add(self.min_size_guarded(*ty, visiting, depth + 1))
                    }),
                    // Reference values: flag byte + principal flag at least.
                    WireEntry::Func { .. } | WireEntry::Service(_) => 2,
                };
                visiting.pop();
                size
            }
        }
    }

    /// Structural compatibility between a wire type and an expected
    /// descriptor, used for reference values whose payload does not exercise
    /// the signature. Memoized and cycle-safe.
    fn check_compat(&self, wire: WireType, expected: &IdlType) -> CodecResult<()> {
        let mut seen = HashSet::new();
        self.check_compat_inner(wire, expected, &mut seen, 0)
    }

    fn check_compat_inner(
        &self,
        wire: WireType,
        expected: &IdlType,
        seen: &mut HashSet<(usize, usize)>,
        depth: usize,
    ) -> CodecResult<()> {
        if depth > MAX_NESTING {
            return Err(CodecError::InvalidData {
                offset: self.cursor.offset(),
                reason: format!("type nesting depth exceeds {}", MAX_NESTING),
            });
        }
        // Chase expected-side recursive handles.
        let mut current: &IdlType = expected;
        let mut hops = 0usize;
        while let IdlType::Rec(handle) = current {
            hops += 1;
            if hops > self.registry.len() {
                return Err(CodecError::MalformedTypeTable {
                    offset: 0,
                    reason: format!("recursive handle cycle through #{}", handle.index()),
                });
            }
            current = self.registry.resolve(*handle)?.as_ref();
        }

        match wire {
            WireType::Prim(kind) => match current {
                IdlType::Prim(want) if *want == kind => Ok(()),
                _ => Err(self.wire_mismatch(wire, current)),
            },
            WireType::Indexed(index) => {
                // Coinductive: a pair under examination is assumed
                // compatible, which is what lets recursive types terminate.
                if !seen.insert((index, current as *const IdlType as usize)) {
                    return Ok(());
                }
                match (&self.table.entries[index], current) {
                    (WireEntry::Opt(elem), IdlType::Opt(want)) => {
                        self.check_compat_inner(*elem, want, seen, depth + 1)
                    }
                    (WireEntry::Vec(elem), IdlType::Vec(want)) => {
                        self.check_compat_inner(*elem, want, seen, depth + 1)
                    }
                    (WireEntry::Record(fields), IdlType::Record(want)) => {
                        self.check_fields_compat(fields, want, seen, depth)
                    }
                    (WireEntry::Record(fields), IdlType::Tuple(want)) => {
                        if fields.len() != want.len() {
                            return Err(self.wire_mismatch(wire, current));
                        }
                        for (position, ((id, ty), elem)) in fields.iter().zip(want).enumerate() {
                            if *id != position as u32 {
                                return Err(self.wire_mismatch(wire, current));
                            }
                            self.check_compat_inner(*ty, elem, seen, depth + 1)?;
                        }
                        Ok(())
                    }
                    (WireEntry::Variant(tags), IdlType::Variant(want)) => {
                        self.check_fields_compat(tags, want, seen, depth)
                    }
                    (
                        WireEntry::Func {
                            args,
                            rets,
                            annotations,
                        },
                        IdlType::Func(signature),
                    ) => {
                        if args.len() != signature.args.len() || rets.len() != signature.rets.len()
                        {
                            return Err(self.wire_mismatch(wire, current));
                        }
                        let mut wire_ann: Vec<u8> =
                            annotations.iter().map(|a| a.wire_byte()).collect();
                        let mut want_ann: Vec<u8> = signature
                            .annotations
                            .iter()
                            .map(|a| a.wire_byte())
                            .collect();
                        wire_ann.sort_unstable();
                        want_ann.sort_unstable();
                        if wire_ann != want_ann {
                            return Err(self.wire_mismatch(wire, current));
                        }
                        for (ty, want) in args.iter().zip(&signature.args) {
                            self.check_compat_inner(*ty, want, seen, depth + 1)?;
                        }
                        for (ty, want) in rets.iter().zip(&signature.rets) {
                            self.check_compat_inner(*ty, want, seen, depth + 1)?;
                        }
                        Ok(())
                    }
                    (WireEntry::Service(methods), IdlType::Service(want)) => {
                        let mut expected_methods: Vec<_> = want.iter().collect();
                        expected_methods.sort_by(|a, b| a.name.cmp(&b.name));
                        if methods.len() != expected_methods.len() {
                            return Err(self.wire_mismatch(wire, current));
                        }
                        for ((name, ty), method) in methods.iter().zip(expected_methods) {
                            if *name != method.name {
                                return Err(self.wire_mismatch(wire, current));
                            }
                            self.check_compat_inner(*ty, &method.ty, seen, depth + 1)?;
                        }
                        Ok(())
                    }
                    _ => Err(self.wire_mismatch(wire, current)),
                }
            }
        }
    }

    fn check_fields_compat(
        &self,
        fields: &[(u32, WireType)],
        want: &[Field],
        seen: &mut HashSet<(usize, usize)>,
        depth: usize,
    ) -> CodecResult<()> {
        let mut expected: Vec<&Field> = want.iter().collect();
        expected.sort_by_key(|f| f.label.id());
        if fields.len() != expected.len() {
            return Err(CodecError::TypeMismatch {
                expected: format!("{} fields", expected.len()),
                found: format!("{} fields", fields.len()),
            });
        }
        for ((id, ty), field) in fields.iter().zip(expected) {
            if *id != field.label.id() {
                return Err(CodecError::TypeMismatch {
                    expected: format!("field id {}", field.label.id()),
                    found: format!("field id {}", id),
                });
            }
            self.check_compat_inner(*ty, &field.ty, seen, depth + 1)?;
        }
        Ok(())
    }

    fn wire_mismatch(&self, wire: WireType, expected: &IdlType) -> CodecError {
        let found = match wire {
            WireType::Prim(kind) => kind.name().to_string(),
            WireType::Indexed(index) => self.table.entries[index].shape().to_string(),
        };
        CodecError::TypeMismatch {
            expected: expected.to_string(),
            found,
        }
    }
}
