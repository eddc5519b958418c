// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type table construction and header serialization.
//!
//! The table flattens a descriptor tree (including cycles) into an ordered,
//! deduplicated list of compound-type entries with back-references. A slot
//! is reserved *before* a type's children are visited, so a self-reference
//! resolves to the reserved slot instead of re-traversing infinitely.
//! Primitives are never tabled; they encode inline through the negative
//! short-form opcode range.
//!
//! Record and variant fields are emitted in ascending id order regardless of
//! declaration order. This is the canonicalization invariant: two
//! structurally equal types serialize to identical header bytes.

pub(crate) mod parse;

use crate::error::{CodecError, CodecResult};
use crate::idl::{IdlType, Label, TypeRegistry};
use crate::wire::leb128::{write_leb128, write_sleb128};
use crate::wire::MAGIC;
use std::collections::HashMap;
use std::sync::Arc;

/// One compound-type entry. Child references are either table indices
/// (`>= 0`) or primitive opcodes (`< 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TableEntry {
    Opt(i64),
    Vec(i64),
    Record(Vec<(u32, i64)>),
    Variant(Vec<(u32, i64)>),
    Func {
        args: Vec<i64>,
        rets: Vec<i64>,
        annotations: Vec<u8>,
    },
    Service(Vec<(String, i64)>),
}

/// A built type table plus the argument type indices, ready to serialize as
/// the wire header. Immutable after construction; safe to share across
/// concurrent encode calls.
#[derive(Debug)]
pub struct TypeTable {
    entries: Vec<TableEntry>,
    args: Vec<i64>,
}

impl TypeTable {
    /// Flatten `types` (and everything they reference through `registry`)
    /// into a table.
    pub fn build(registry: &TypeRegistry, types: &[Arc<IdlType>]) -> CodecResult<Self> {
        let mut builder = Builder {
            registry,
            slots: Vec::new(),
            index: HashMap::new(),
        };
        let mut args = Vec::with_capacity(types.len());
        for ty in types {
            args.push(builder.visit(ty)?);
        }
        let mut entries = Vec::with_capacity(builder.slots.len());
        for (slot, entry) in builder.slots.into_iter().enumerate() {
            entries.push(entry.ok_or_else(|| CodecError::MalformedTypeTable {
                offset: 0,
                reason: format!("table slot {} left unresolved", slot),
            })?);
        }
        log::trace!(
            "[TABLE] built type table: {} entries, {} args",
            entries.len(),
            args.len()
        );
        Ok(Self { entries, args })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn arg_indices(&self) -> &[i64] {
        &self.args
    }

    /// Serialize the wire header: magic, entry count, entries, argument
    /// count and argument type indices.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&MAGIC);
        write_leb128(buf, self.entries.len() as u128);
        for entry in &self.entries {
            match entry {
                TableEntry::Opt(elem) => {
                    write_sleb128(buf, -18);
                    write_sleb128(buf, i128::from(*elem));
                }
                TableEntry::Vec(elem) => {
                    write_sleb128(buf, -19);
                    write_sleb128(buf, i128::from(*elem));
                }
                TableEntry::Record(fields) => {
                    write_sleb128(buf, -20);
                    Self::serialize_fields(buf, fields);
                }
                TableEntry::Variant(tags) => {
                    write_sleb128(buf, -21);
                    Self::serialize_fields(buf, tags);
                }
                TableEntry::Func {
                    args,
                    rets,
                    annotations,
                } => {
                    write_sleb128(buf, -22);
                    write_leb128(buf, args.len() as u128);
                    for idx in args {
                        write_sleb128(buf, i128::from(*idx));
                    }
                    write_leb128(buf, rets.len() as u128);
                    for idx in rets {
                        write_sleb128(buf, i128::from(*idx));
                    }
                    write_leb128(buf, annotations.len() as u128);
                    buf.extend_from_slice(annotations);
                }
                TableEntry::Service(methods) => {
                    write_sleb128(buf, -23);
                    write_leb128(buf, methods.len() as u128);
                    for (name, idx) in methods {
                        write_leb128(buf, name.len() as u128);
                        buf.extend_from_slice(name.as_bytes());
                        write_sleb128(buf, i128::from(*idx));
                    }
                }
            }
        }
        write_leb128(buf, self.args.len() as u128);
        for idx in &self.args {
            write_sleb128(buf, i128::from(*idx));
        }
    }

    fn serialize_fields(buf: &mut Vec<u8>, fields: &[(u32, i64)]) {
        write_leb128(buf, fields.len() as u128);
        for (id, idx) in fields {
            write_leb128(buf, u128::from(*id));
            write_sleb128(buf, i128::from(*idx));
        }
    }
}

struct Builder<'a> {
    registry: &'a TypeRegistry,
    slots: Vec<Option<TableEntry>>,
    index: HashMap<IdlType, usize>,
}

impl Builder<'_> {
    /// Visit a type, returning its wire reference: a primitive opcode
    /// (negative) or a table index.
    fn visit(&mut self, ty: &IdlType) -> CodecResult<i64> {
        match ty {
            IdlType::Prim(kind) => Ok(kind.opcode()),
            IdlType::Rec(handle) => {
                if let Some(&slot) = self.index.get(ty) {
                    return Ok(slot as i64);
                }
                // Chase handle chains to the underlying definition; a pure
                // handle cycle has no definition at all.
                let mut seen = vec![*handle];
                let mut target = self.registry.resolve(*handle)?;
                while let IdlType::Rec(next) = &**target {
                    if seen.contains(next) {
                        return Err(CodecError::MalformedTypeTable {
                            offset: 0,
                            reason: format!("recursive handle cycle through #{}", next.index()),
                        });
                    }
                    seen.push(*next);
                    target = self.registry.resolve(*next)?;
                }
                if let IdlType::Prim(kind) = &**target {
                    return Ok(kind.opcode());
                }
                // Reserve the slot under the handle key before recursing so
                // the self-reference inside resolves to it.
                let slot = self.reserve(ty.clone());
                let target = target.clone();
                let entry = self.build_entry(&target)?;
                self.slots[slot] = Some(entry);
                Ok(slot as i64)
            }
            _ => {
                if let Some(&slot) = self.index.get(ty) {
                    return Ok(slot as i64);
                }
                let slot = self.reserve(ty.clone());
                let entry = self.build_entry(ty)?;
                self.slots[slot] = Some(entry);
                Ok(slot as i64)
            }
        }
    }

    fn reserve(&mut self, key: IdlType) -> usize {
        let slot = self.slots.len();
        self.slots.push(None);
        self.index.insert(key, slot);
        slot
    }

    fn build_entry(&mut self, ty: &IdlType) -> CodecResult<TableEntry> {
        match ty {
            IdlType::Opt(elem) => Ok(TableEntry::Opt(self.visit(elem)?)),
            IdlType::Vec(elem) => Ok(TableEntry::Vec(self.visit(elem)?)),
            IdlType::Record(fields) => Ok(TableEntry::Record(self.build_fields(fields)?)),
            IdlType::Variant(tags) => Ok(TableEntry::Variant(self.build_fields(tags)?)),
            IdlType::Tuple(elems) => {
                let mut fields = Vec::with_capacity(elems.len());
                for (position, elem) in elems.iter().enumerate() {
                    fields.push((position as u32, self.visit(elem)?));
                }
                Ok(TableEntry::Record(fields))
            }
            IdlType::Func(signature) => {
                let mut args = Vec::with_capacity(signature.args.len());
                for arg in &signature.args {
                    args.push(self.visit(arg)?);
                }
                let mut rets = Vec::with_capacity(signature.rets.len());
                for ret in &signature.rets {
                    rets.push(self.visit(ret)?);
                }
                let annotations = signature
                    .annotations
                    .iter()
                    .map(|a| a.wire_byte())
                    .collect();
                Ok(TableEntry::Func {
                    args,
                    rets,
                    annotations,
                })
            }
            IdlType::Service(methods) => {
                let mut table = Vec::with_capacity(methods.len());
                for method in methods {
                    self.check_method_is_func(&method.ty)?;
                    table.push((method.name.clone(), self.visit(&method.ty)?));
                }
                table.sort_by(|a, b| a.0.cmp(&b.0));
                for pair in table.windows(2) {
                    if pair[0].0 == pair[1].0 {
                        return Err(CodecError::MalformedTypeTable {
                            offset: 0,
                            reason: format!("duplicate service method {:?}", pair[0].0),
                        });
                    }
                }
                Ok(TableEntry::Service(table))
            }
            IdlType::Prim(_) | IdlType::Rec(_) => Err(CodecError::MalformedTypeTable {
                offset: 0,
                reason: "primitive or handle cannot form a table entry".into(),
            }),
        }
    }

    /// Canonicalize fields: ascending id order, duplicate ids rejected.
    fn build_fields(&mut self, fields: &[crate::idl::Field]) -> CodecResult<Vec<(u32, i64)>> {
        let mut ordered: Vec<(u32, &Label, i64)> = Vec::with_capacity(fields.len());
        for field in fields {
            ordered.push((field.label.id(), &field.label, self.visit(&field.ty)?));
        }
        ordered.sort_by_key(|(id, _, _)| *id);
        for pair in ordered.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(CodecError::FieldIdCollision {
                    id: pair[0].0,
                    first: pair[0].1.to_string(),
                    second: pair[1].1.to_string(),
                });
            }
        }
        Ok(ordered.into_iter().map(|(id, _, idx)| (id, idx)).collect())
    }

    /// Service methods must resolve (possibly through handles) to functions.
    fn check_method_is_func(&self, ty: &IdlType) -> CodecResult<()> {
        let mut current = ty;
        let mut hops = 0usize;
        loop {
            match current {
                IdlType::Func(_) => return Ok(()),
                IdlType::Rec(handle) => {
                    hops += 1;
                    if hops > self.registry.len() {
                        return Err(CodecError::MalformedTypeTable {
                            offset: 0,
                            reason: format!("recursive handle cycle through #{}", handle.index()),
                        });
                    }
                    current = self.registry.resolve(*handle)?.as_ref();
                }
                other => {
                    return Err(CodecError::MalformedTypeTable {
                        offset: 0,
                        reason: format!("service method type is not a function: {}", other),
                    })
                }
            }
        }
    }
}
