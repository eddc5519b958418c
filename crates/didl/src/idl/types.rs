// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for the IDL type system.
//!
//! `IdlType` is a closed tagged union; every codec component pattern-matches
//! exhaustively over it. Descriptors are immutable once constructed and
//! shared by reference (`Arc`) across encode/decode calls.

use crate::idl::hash::Label;
use crate::idl::registry::RecId;
use std::fmt;
use std::sync::Arc;

/// Primitive type kinds with their wire opcodes.
///
/// Primitives are never entered into the type table; they encode inline via
/// the reserved negative short-form opcode range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Null,
    Bool,
    /// Arbitrary-precision unsigned (LEB128 on the wire).
    Nat,
    /// Arbitrary-precision signed (SLEB128 on the wire).
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    /// Accepts any value; occupies zero value bytes.
    Reserved,
    /// Has no values at all.
    Empty,
    /// Opaque reference id (flag byte + length-prefixed blob).
    Principal,
}

impl PrimitiveKind {
    /// Wire opcode (SLEB128-encoded where it appears).
    pub fn opcode(self) -> i64 {
        match self {
            Self::Null => -1,
            Self::Bool => -2,
            Self::Nat => -3,
            Self::Int => -4,
            Self::Nat8 => -5,
            Self::Nat16 => -6,
            Self::Nat32 => -7,
            Self::Nat64 => -8,
            Self::Int8 => -9,
            Self::Int16 => -10,
            Self::Int32 => -11,
            Self::Int64 => -12,
            Self::Float32 => -13,
            Self::Float64 => -14,
            Self::Text => -15,
            Self::Reserved => -16,
            Self::Empty => -17,
            Self::Principal => -24,
        }
    }

    /// Inverse of [`opcode`](Self::opcode). Compound opcodes return `None`.
    pub fn from_opcode(opcode: i64) -> Option<Self> {
        match opcode {
            -1 => Some(Self::Null),
            -2 => Some(Self::Bool),
            -3 => Some(Self::Nat),
            -4 => Some(Self::Int),
            -5 => Some(Self::Nat8),
            -6 => Some(Self::Nat16),
            -7 => Some(Self::Nat32),
            -8 => Some(Self::Nat64),
            -9 => Some(Self::Int8),
            -10 => Some(Self::Int16),
            -11 => Some(Self::Int32),
            -12 => Some(Self::Int64),
            -13 => Some(Self::Float32),
            -14 => Some(Self::Float64),
            -15 => Some(Self::Text),
            -16 => Some(Self::Reserved),
            -17 => Some(Self::Empty),
            -24 => Some(Self::Principal),
            _ => None,
        }
    }

    /// Fixed value-section size in bytes (None for variable-width kinds).
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Null | Self::Reserved => Some(0),
            Self::Bool | Self::Nat8 | Self::Int8 => Some(1),
            Self::Nat16 | Self::Int16 => Some(2),
            Self::Nat32 | Self::Int32 | Self::Float32 => Some(4),
            Self::Nat64 | Self::Int64 | Self::Float64 => Some(8),
            Self::Nat | Self::Int | Self::Text | Self::Empty | Self::Principal => None,
        }
    }

    /// Textual name, as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Nat => "nat",
            Self::Int => "int",
            Self::Nat8 => "nat8",
            Self::Nat16 => "nat16",
            Self::Nat32 => "nat32",
            Self::Nat64 => "nat64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Reserved => "reserved",
            Self::Empty => "empty",
            Self::Principal => "principal",
        }
    }
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdlType {
    /// Primitive type.
    Prim(PrimitiveKind),
    /// Optional value (1-byte presence flag on the wire).
    Opt(Arc<IdlType>),
    /// Variable-length sequence.
    Vec(Arc<IdlType>),
    /// Named fields, wire-ordered by ascending id.
    Record(Vec<Field>),
    /// Positional fields; encodes as a record with ids `0..n-1`.
    Tuple(Vec<Arc<IdlType>>),
    /// Tagged union; exactly one alternative populated at a time.
    Variant(Vec<Field>),
    /// Function reference with its signature.
    Func(FuncType),
    /// Service reference with its method table.
    Service(Vec<Method>),
    /// Handle into a [`TypeRegistry`](crate::idl::TypeRegistry) slot; stands
    /// in wherever a descriptor would otherwise require infinite depth.
    Rec(RecId),
}

impl IdlType {
    pub fn prim(kind: PrimitiveKind) -> Self {
        Self::Prim(kind)
    }

    pub fn opt(elem: impl Into<Arc<IdlType>>) -> Self {
        Self::Opt(elem.into())
    }

    pub fn vec(elem: impl Into<Arc<IdlType>>) -> Self {
        Self::Vec(elem.into())
    }

    /// `vec nat8` — the raw-bytes type.
    pub fn blob() -> Self {
        Self::Vec(Arc::new(Self::Prim(PrimitiveKind::Nat8)))
    }

    pub fn record(fields: Vec<Field>) -> Self {
        Self::Record(fields)
    }

    pub fn tuple(elems: Vec<Arc<IdlType>>) -> Self {
        Self::Tuple(elems)
    }

    pub fn variant(tags: Vec<Field>) -> Self {
        Self::Variant(tags)
    }

    pub fn func(signature: FuncType) -> Self {
        Self::Func(signature)
    }

    pub fn service(methods: Vec<Method>) -> Self {
        Self::Service(methods)
    }

    pub fn rec(handle: RecId) -> Self {
        Self::Rec(handle)
    }

    /// Check if this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Prim(_))
    }

    /// Get fields if this is a record.
    pub fn fields(&self) -> Option<&[Field]> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by label name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields()?.iter().find(|f| f.label.name() == Some(name))
    }
}

impl From<PrimitiveKind> for IdlType {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Prim(kind)
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prim(kind) => f.write_str(kind.name()),
            Self::Opt(elem) => write!(f, "opt {}", elem),
            Self::Vec(elem) => write!(f, "vec {}", elem),
            Self::Record(fields) => {
                write!(f, "record {{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", field.label, field.ty)?;
                }
                write!(f, "}}")
            }
            Self::Tuple(elems) => {
                write!(f, "record {{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "}}")
            }
            Self::Variant(tags) => {
                write!(f, "variant {{")?;
                for (i, tag) in tags.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", tag.label, tag.ty)?;
                }
                write!(f, "}}")
            }
            Self::Func(_) => f.write_str("func"),
            Self::Service(_) => f.write_str("service"),
            Self::Rec(handle) => write!(f, "rec#{}", handle.index()),
        }
    }
}

/// Field descriptor for record members and variant tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub label: Label,
    pub ty: Arc<IdlType>,
}

impl Field {
    pub fn new(label: impl Into<Label>, ty: impl Into<Arc<IdlType>>) -> Self {
        Self {
            label: label.into(),
            ty: ty.into(),
        }
    }
}

/// Function signature: parameter/result type lists plus annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub args: Vec<Arc<IdlType>>,
    pub rets: Vec<Arc<IdlType>>,
    pub annotations: Vec<FuncAnnotation>,
}

/// Function call-mode annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncAnnotation {
    Query,
    Oneway,
    CompositeQuery,
}

impl FuncAnnotation {
    pub fn wire_byte(self) -> u8 {
        match self {
            Self::Query => 1,
            Self::Oneway => 2,
            Self::CompositeQuery => 3,
        }
    }

    pub fn from_wire_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Query),
            2 => Some(Self::Oneway),
            3 => Some(Self::CompositeQuery),
            _ => None,
        }
    }
}

/// A service method: name plus function type.
///
/// The type must resolve (possibly through a recursive handle) to a
/// [`IdlType::Func`]; the table builder rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub ty: Arc<IdlType>,
}

impl Method {
    pub fn new(name: impl Into<String>, ty: impl Into<Arc<IdlType>>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_round_trip() {
        for kind in [
            PrimitiveKind::Null,
            PrimitiveKind::Bool,
            PrimitiveKind::Nat,
            PrimitiveKind::Int,
            PrimitiveKind::Nat8,
            PrimitiveKind::Nat64,
            PrimitiveKind::Int32,
            PrimitiveKind::Float64,
            PrimitiveKind::Text,
            PrimitiveKind::Reserved,
            PrimitiveKind::Empty,
            PrimitiveKind::Principal,
        ] {
            assert_eq!(PrimitiveKind::from_opcode(kind.opcode()), Some(kind));
        }
        // Compound opcodes are not primitives.
        for op in [-18i64, -19, -20, -21, -22, -23] {
            assert_eq!(PrimitiveKind::from_opcode(op), None);
        }
    }

    #[test]
    fn blob_is_vec_nat8() {
        match IdlType::blob() {
            IdlType::Vec(elem) => assert_eq!(*elem, IdlType::Prim(PrimitiveKind::Nat8)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn field_lookup_by_name() {
        let ty = IdlType::record(vec![
            Field::new("a", IdlType::prim(PrimitiveKind::Nat32)),
            Field::new("b", IdlType::prim(PrimitiveKind::Text)),
        ]);
        assert!(ty.field("a").is_some());
        assert!(ty.field("c").is_none());
    }

    #[test]
    fn display_is_compact() {
        let ty = IdlType::opt(IdlType::vec(IdlType::prim(PrimitiveKind::Nat32)));
        assert_eq!(ty.to_string(), "opt vec nat32");
    }
}
