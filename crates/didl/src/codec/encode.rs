// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-directed value encoding.
//!
//! A pure transformation: the encoder only appends to its caller-owned
//! buffer and keeps no state across calls. Shape disagreements between the
//! dynamic value and the descriptor surface as `TypeMismatch`, never as a
//! panic.

use crate::error::{CodecError, CodecResult};
use crate::idl::{Field, IdlType, Label, PrimitiveKind, TypeRegistry};
use crate::value::{Principal, Value, PRINCIPAL_MAX_LEN};
use crate::wire::leb128::{write_leb128, write_sleb128};
use std::sync::Arc;

/// Generate encode paths for fixed-width unsigned kinds: the exact value
/// variant passes through, an arbitrary-precision `nat` is range-checked.
macro_rules! fixed_nat {
    ($self:ident, $value:expr, $kind:expr, $variant:ident, $ty:ty) => {{
        let narrow: $ty = match $value {
            Value::$variant(v) => *v,
            Value::Nat(n) => <$ty>::try_from(*n).map_err(|_| CodecError::TypeMismatch {
                expected: $kind.name().to_string(),
                found: format!("nat {} (out of range)", n),
            })?,
            other => return Err(mismatch($kind.name(), other)),
        };
        $self.buf.extend_from_slice(&narrow.to_le_bytes());
        Ok(())
    }};
}

/// Signed twin of `fixed_nat!`.
macro_rules! fixed_int {
    ($self:ident, $value:expr, $kind:expr, $variant:ident, $ty:ty) => {{
        let narrow: $ty = match $value {
            Value::$variant(v) => *v,
            Value::Int(n) => <$ty>::try_from(*n).map_err(|_| CodecError::TypeMismatch {
                expected: $kind.name().to_string(),
                found: format!("int {} (out of range)", n),
            })?,
            other => return Err(mismatch($kind.name(), other)),
        };
        $self.buf.extend_from_slice(&narrow.to_le_bytes());
        Ok(())
    }};
}

fn mismatch(expected: impl ToString, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.shape().to_string(),
    }
}

pub(crate) struct ValueEncoder<'a> {
    registry: &'a TypeRegistry,
    buf: &'a mut Vec<u8>,
}

impl<'a> ValueEncoder<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry, buf: &'a mut Vec<u8>) -> Self {
        Self { registry, buf }
    }

    pub(crate) fn encode_value(&mut self, value: &Value, ty: &IdlType) -> CodecResult<()> {
        match ty {
            IdlType::Prim(kind) => self.encode_primitive(value, *kind),
            IdlType::Opt(elem) => match value {
                Value::Opt(None) | Value::Null => {
                    self.buf.push(0);
                    Ok(())
                }
                Value::Opt(Some(inner)) => {
                    self.buf.push(1);
                    self.encode_value(inner, elem)
                }
                other => Err(mismatch(ty, other)),
            },
            IdlType::Vec(elem) => self.encode_vec(value, elem),
            IdlType::Record(fields) => self.encode_record(fields, value),
            IdlType::Tuple(elems) => match value {
                Value::Tuple(items) if items.len() == elems.len() => {
                    for (item, elem) in items.iter().zip(elems) {
                        self.encode_value(item, elem)?;
                    }
                    Ok(())
                }
                Value::Tuple(items) => Err(CodecError::TypeMismatch {
                    expected: format!("tuple of {}", elems.len()),
                    found: format!("tuple of {}", items.len()),
                }),
                other => Err(mismatch(ty, other)),
            },
            IdlType::Variant(tags) => self.encode_variant(tags, value),
            IdlType::Func(_) => match value {
                Value::Func { service, method } => {
                    self.buf.push(1);
                    self.encode_principal_bytes(service)?;
                    write_leb128(self.buf, method.len() as u128);
                    self.buf.extend_from_slice(method.as_bytes());
                    Ok(())
                }
                other => Err(mismatch("func reference", other)),
            },
            IdlType::Service(_) => match value {
                // A service reference is a principal; accept either form.
                Value::Service(principal) | Value::Principal(principal) => {
                    self.encode_principal_bytes(principal)
                }
                other => Err(mismatch("service reference", other)),
            },
            IdlType::Rec(handle) => {
                // Transparent at the value level; only the table records the
                // cycle. Handle chains were validated at table-build time.
                let target = self.registry.resolve(*handle)?.clone();
                self.encode_value(value, &target)
            }
        }
    }

    fn encode_primitive(&mut self, value: &Value, kind: PrimitiveKind) -> CodecResult<()> {
        match kind {
            PrimitiveKind::Null => match value {
                Value::Null => Ok(()),
                other => Err(mismatch("null", other)),
            },
            // Reserved accepts any value and encodes nothing.
            PrimitiveKind::Reserved => Ok(()),
            PrimitiveKind::Empty => Err(CodecError::TypeMismatch {
                expected: "empty (no values exist)".to_string(),
                found: value.shape().to_string(),
            }),
            PrimitiveKind::Bool => match value {
                Value::Bool(v) => {
                    self.buf.push(u8::from(*v));
                    Ok(())
                }
                other => Err(mismatch("bool", other)),
            },
            PrimitiveKind::Nat => {
                let wide = match value {
                    Value::Nat(n) => *n,
                    Value::Nat8(n) => u128::from(*n),
                    Value::Nat16(n) => u128::from(*n),
                    Value::Nat32(n) => u128::from(*n),
                    Value::Nat64(n) => u128::from(*n),
                    other => return Err(mismatch("nat", other)),
                };
                write_leb128(self.buf, wide);
                Ok(())
            }
            PrimitiveKind::Int => {
                let wide = match value {
                    Value::Int(n) => *n,
                    Value::Int8(n) => i128::from(*n),
                    Value::Int16(n) => i128::from(*n),
                    Value::Int32(n) => i128::from(*n),
                    Value::Int64(n) => i128::from(*n),
                    other => return Err(mismatch("int", other)),
                };
                write_sleb128(self.buf, wide);
                Ok(())
            }
            PrimitiveKind::Nat8 => fixed_nat!(self, value, kind, Nat8, u8),
            PrimitiveKind::Nat16 => fixed_nat!(self, value, kind, Nat16, u16),
            PrimitiveKind::Nat32 => fixed_nat!(self, value, kind, Nat32, u32),
            PrimitiveKind::Nat64 => fixed_nat!(self, value, kind, Nat64, u64),
            PrimitiveKind::Int8 => fixed_int!(self, value, kind, Int8, i8),
            PrimitiveKind::Int16 => fixed_int!(self, value, kind, Int16, i16),
            PrimitiveKind::Int32 => fixed_int!(self, value, kind, Int32, i32),
            PrimitiveKind::Int64 => fixed_int!(self, value, kind, Int64, i64),
            PrimitiveKind::Float32 => match value {
                Value::Float32(v) => {
                    self.buf.extend_from_slice(&v.to_le_bytes());
                    Ok(())
                }
                other => Err(mismatch("float32", other)),
            },
            PrimitiveKind::Float64 => match value {
                Value::Float64(v) => {
                    self.buf.extend_from_slice(&v.to_le_bytes());
                    Ok(())
                }
                other => Err(mismatch("float64", other)),
            },
            PrimitiveKind::Text => match value {
                Value::Text(s) => {
                    write_leb128(self.buf, s.len() as u128);
                    self.buf.extend_from_slice(s.as_bytes());
                    Ok(())
                }
                other => Err(mismatch("text", other)),
            },
            PrimitiveKind::Principal => match value {
                Value::Principal(principal) => self.encode_principal_bytes(principal),
                other => Err(mismatch("principal", other)),
            },
        }
    }

    fn encode_vec(&mut self, value: &Value, elem: &Arc<IdlType>) -> CodecResult<()> {
        let elem_is_nat8 = matches!(**elem, IdlType::Prim(PrimitiveKind::Nat8));
        match value {
            Value::Blob(bytes) if elem_is_nat8 => {
                write_leb128(self.buf, bytes.len() as u128);
                self.buf.extend_from_slice(bytes);
                Ok(())
            }
            Value::Vector(items) => {
                write_leb128(self.buf, items.len() as u128);
                for item in items {
                    self.encode_value(item, elem)?;
                }
                Ok(())
            }
            other => Err(mismatch(format!("vec {}", elem), other)),
        }
    }

    fn encode_record(&mut self, fields: &[Field], value: &Value) -> CodecResult<()> {
        // Ascending id order, matching the canonical table entry.
        let mut ordered: Vec<&Field> = fields.iter().collect();
        ordered.sort_by_key(|f| f.label.id());

        for field in ordered {
            let field_value = self.lookup_field(value, &field.label)?;
            self.encode_value(field_value, &field.ty)?;
        }
        Ok(())
    }

    fn lookup_field<'v>(&self, value: &'v Value, label: &Label) -> CodecResult<&'v Value> {
        let found = match (value, label) {
            (Value::Record(map), Label::Named(name)) => map.get(name.as_str()),
            (Value::Record(map), Label::Id(id)) => map.get(&id.to_string()),
            // Tuple values satisfy positional (numeric-label) records.
            (Value::Tuple(items), Label::Id(id)) => items.get(*id as usize),
            (other, _) => return Err(mismatch("record", other)),
        };
        found.ok_or_else(|| CodecError::TypeMismatch {
            expected: format!("record field {}", label),
            found: "missing field".to_string(),
        })
    }

    fn encode_variant(&mut self, tags: &[Field], value: &Value) -> CodecResult<()> {
        let (tag, payload) = match value {
            Value::Variant { tag, value } => (tag.as_str(), &**value),
            other => return Err(mismatch("variant", other)),
        };

        let mut ordered: Vec<&Field> = tags.iter().collect();
        ordered.sort_by_key(|f| f.label.id());

        let position = ordered
            .iter()
            .position(|field| match &field.label {
                Label::Named(name) => name == tag,
                Label::Id(id) => tag.parse::<u32>() == Ok(*id),
            })
            .ok_or_else(|| CodecError::TypeMismatch {
                expected: format!("one of {} variant tags", ordered.len()),
                found: format!("tag {:?}", tag),
            })?;

        write_leb128(self.buf, position as u128);
        self.encode_value(payload, &ordered[position].ty)
    }

    fn encode_principal_bytes(&mut self, principal: &Principal) -> CodecResult<()> {
        if principal.len() > PRINCIPAL_MAX_LEN {
            return Err(CodecError::TypeMismatch {
                expected: format!("principal of at most {} bytes", PRINCIPAL_MAX_LEN),
                found: format!("principal of {} bytes", principal.len()),
            });
        }
        self.buf.push(1);
        write_leb128(self.buf, principal.len() as u128);
        self.buf.extend_from_slice(principal.as_slice());
        Ok(())
    }
}
