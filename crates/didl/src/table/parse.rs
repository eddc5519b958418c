// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire type-table parsing and validation.
//!
//! The decoder never trusts the header: every type index is checked against
//! the entry count, field ids must be strictly ascending (the canonical
//! order doubles as the duplicate check), annotation bytes and method names
//! are validated, and counts are sanity-checked against the remaining input
//! before anything is allocated.

use crate::error::{CodecError, CodecResult};
use crate::idl::{FuncAnnotation, PrimitiveKind};
use crate::wire::cursor::Cursor;
use crate::wire::leb128::{read_leb128_len, read_sleb128};
use crate::wire::MAGIC;

/// A type reference as it appears on the wire: a primitive opcode or an
/// index into the wire table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireType {
    Prim(PrimitiveKind),
    Indexed(usize),
}

/// One parsed compound entry.
#[derive(Debug, Clone)]
pub(crate) enum WireEntry {
    Opt(WireType),
    Vec(WireType),
    Record(Vec<(u32, WireType)>),
    Variant(Vec<(u32, WireType)>),
    Func {
        args: Vec<WireType>,
        rets: Vec<WireType>,
        annotations: Vec<FuncAnnotation>,
    },
    Service(Vec<(String, WireType)>),
}

impl WireEntry {
    /// Short shape name for error messages.
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Self::Opt(_) => "opt",
            Self::Vec(_) => "vec",
            Self::Record(_) => "record",
            Self::Variant(_) => "variant",
            Self::Func { .. } => "func",
            Self::Service(_) => "service",
        }
    }
}

/// The parsed and validated header of one message.
#[derive(Debug)]
pub(crate) struct WireTable {
    pub entries: Vec<WireEntry>,
    pub args: Vec<WireType>,
}

/// Parse the wire header, leaving the cursor at the first value byte.
pub(crate) fn parse_header(cursor: &mut Cursor<'_>) -> CodecResult<WireTable> {
    let magic = cursor.read_bytes(MAGIC.len())?;
    if magic != MAGIC {
        return Err(CodecError::InvalidData {
            offset: 0,
            reason: format!("bad magic {:02x?}", magic),
        });
    }

    let entry_count = read_leb128_len(cursor)?;
    // Every entry occupies at least one byte; a count beyond the remaining
    // input is unsatisfiable however the entries are shaped.
    if entry_count > cursor.remaining() {
        return Err(CodecError::MalformedTypeTable {
            offset: cursor.offset(),
            reason: format!(
                "entry count {} exceeds remaining input ({} bytes)",
                entry_count,
                cursor.remaining()
            ),
        });
    }

    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        entries.push(parse_entry(cursor, entry_count)?);
    }

    let arg_count = read_leb128_len(cursor)?;
    if arg_count > cursor.remaining() {
        return Err(CodecError::MalformedTypeTable {
            offset: cursor.offset(),
            reason: format!(
                "argument count {} exceeds remaining input ({} bytes)",
                arg_count,
                cursor.remaining()
            ),
        });
    }
    let mut args = Vec::with_capacity(arg_count);
    for _ in 0..arg_count {
        args.push(read_type_ref(cursor, entry_count)?);
    }

    log::trace!(
        "[TABLE] parsed wire header: {} entries, {} args, value section at offset {}",
        entries.len(),
        args.len(),
        cursor.offset()
    );
    Ok(WireTable { entries, args })
}

fn parse_entry(cursor: &mut Cursor<'_>, entry_count: usize) -> CodecResult<WireEntry> {
    let opcode_offset = cursor.offset();
    let opcode = read_opcode(cursor)?;
    match opcode {
        -18 => Ok(WireEntry::Opt(read_type_ref(cursor, entry_count)?)),
        -19 => Ok(WireEntry::Vec(read_type_ref(cursor, entry_count)?)),
        -20 => Ok(WireEntry::Record(read_fields(cursor, entry_count)?)),
        -21 => Ok(WireEntry::Variant(read_fields(cursor, entry_count)?)),
        -22 => {
            let args = read_type_refs(cursor, entry_count)?;
            let rets = read_type_refs(cursor, entry_count)?;
            let annotation_count = read_leb128_len(cursor)?;
            if annotation_count > cursor.remaining() {
                return Err(CodecError::MalformedTypeTable {
                    offset: cursor.offset(),
                    reason: "annotation count exceeds remaining input".into(),
                });
            }
            let mut annotations = Vec::with_capacity(annotation_count);
            for _ in 0..annotation_count {
                let offset = cursor.offset();
                let byte = cursor.read_u8()?;
                annotations.push(FuncAnnotation::from_wire_byte(byte).ok_or_else(|| {
                    CodecError::MalformedTypeTable {
                        offset,
                        reason: format!("unknown function annotation {}", byte),
                    }
                })?);
            }
            Ok(WireEntry::Func {
                args,
                rets,
                annotations,
            })
        }
        -23 => {
            let method_count = read_leb128_len(cursor)?;
            if method_count > cursor.remaining() {
                return Err(CodecError::MalformedTypeTable {
                    offset: cursor.offset(),
                    reason: "method count exceeds remaining input".into(),
                });
            }
            let mut methods: Vec<(String, WireType)> = Vec::with_capacity(method_count);
            for _ in 0..method_count {
                let name_len = read_leb128_len(cursor)?;
                let name_offset = cursor.offset();
                let name_bytes = cursor.read_bytes(name_len)?;
                let name = std::str::from_utf8(name_bytes)
                    .map_err(|_| CodecError::MalformedTypeTable {
                        offset: name_offset,
                        reason: "method name is not valid UTF-8".into(),
                    })?
                    .to_string();
                if let Some((previous, _)) = methods.last() {
                    if *previous >= name {
                        return Err(CodecError::MalformedTypeTable {
                            offset: name_offset,
                            reason: format!("method names not strictly ascending at {:?}", name),
                        });
                    }
                }
                let ty = read_type_ref(cursor, entry_count)?;
                methods.push((name, ty));
            }
            Ok(WireEntry::Service(methods))
        }
        other => Err(CodecError::MalformedTypeTable {
            offset: opcode_offset,
            reason: format!("invalid table entry opcode {}", other),
        }),
    }
}

/// Record/variant field lists: `(id, type)` pairs, strictly ascending ids.
fn read_fields(cursor: &mut Cursor<'_>, entry_count: usize) -> CodecResult<Vec<(u32, WireType)>> {
    let field_count = read_leb128_len(cursor)?;
    if field_count > cursor.remaining() {
        return Err(CodecError::MalformedTypeTable {
            offset: cursor.offset(),
            reason: "field count exceeds remaining input".into(),
        });
    }
    let mut fields: Vec<(u32, WireType)> = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let id_offset = cursor.offset();
        let raw_id = crate::wire::leb128::read_leb128(cursor)?;
        let id = u32::try_from(raw_id).map_err(|_| CodecError::MalformedTypeTable {
            offset: id_offset,
            reason: format!("field id {} exceeds 32 bits", raw_id),
        })?;
        if let Some((previous, _)) = fields.last() {
            if *previous == id {
                return Err(CodecError::MalformedTypeTable {
                    offset: id_offset,
                    reason: format!("duplicate field id {}", id),
                });
            }
            if *previous > id {
                return Err(CodecError::MalformedTypeTable {
                    offset: id_offset,
                    reason: format!("field ids not ascending at {}", id),
                });
            }
        }
        let ty = read_type_ref(cursor, entry_count)?;
        fields.push((id, ty));
    }
    Ok(fields)
}

fn read_type_refs(cursor: &mut Cursor<'_>, entry_count: usize) -> CodecResult<Vec<WireType>> {
    let count = read_leb128_len(cursor)?;
    if count > cursor.remaining() {
        return Err(CodecError::MalformedTypeTable {
            offset: cursor.offset(),
            reason: "type count exceeds remaining input".into(),
        });
    }
    let mut refs = Vec::with_capacity(count);
    for _ in 0..count {
        refs.push(read_type_ref(cursor, entry_count)?);
    }
    Ok(refs)
}

/// Read one type reference: a negative primitive opcode or a table index
/// bounded by `entry_count` (forward references are legal).
fn read_type_ref(cursor: &mut Cursor<'_>, entry_count: usize) -> CodecResult<WireType> {
    let offset = cursor.offset();
    let code = read_opcode(cursor)?;
    if code >= 0 {
        let index = usize::try_from(code).unwrap_or(usize::MAX);
        if index >= entry_count {
            return Err(CodecError::MalformedTypeTable {
                offset,
                reason: format!("type index {} out of range ({} entries)", index, entry_count),
            });
        }
        return Ok(WireType::Indexed(index));
    }
    PrimitiveKind::from_opcode(code)
        .map(WireType::Prim)
        .ok_or_else(|| CodecError::MalformedTypeTable {
            offset,
            reason: format!("invalid type code {}", code),
        })
}

fn read_opcode(cursor: &mut Cursor<'_>) -> CodecResult<i64> {
    let offset = cursor.offset();
    let raw = read_sleb128(cursor)?;
    i64::try_from(raw).map_err(|_| CodecError::MalformedTypeTable {
        offset,
        reason: format!("type code {} out of range", raw),
    })
}
