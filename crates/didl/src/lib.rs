// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DIDL - self-describing IDL wire-format codec
//!
//! A pure Rust codec for the Candid binary format: type-directed conversion
//! between dynamically-shaped in-memory values and the compact,
//! self-describing wire representation used at host/remote call boundaries.
//!
//! ## Quick Start
//!
//! ```rust
//! use didl::{decode_one, encode_one, IdlType, PrimitiveKind, TypeRegistry, Value};
//! use std::sync::Arc;
//!
//! let registry = TypeRegistry::new();
//! let ty = Arc::new(IdlType::record(vec![
//!     didl::Field::new("a", IdlType::prim(PrimitiveKind::Nat32)),
//!     didl::Field::new("b", IdlType::prim(PrimitiveKind::Text)),
//! ]));
//!
//! let value = Value::record([("a", Value::Nat32(42)), ("b", Value::from("hi"))]);
//! let bytes = encode_one(&registry, &ty, &value).unwrap();
//! assert_eq!(&bytes[..4], b"DIDL");
//!
//! let back = decode_one(&registry, &ty, &bytes).unwrap();
//! assert_eq!(back, value);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                        Application Layer                           |
//! |        descriptors (IdlType) + dynamic values (Value)              |
//! +--------------------------------------------------------------------+
//! |                          Codec Layer                               |
//! |   encode_args / decode_args  (type-directed, lockstep-checked)     |
//! +--------------------------------------------------------------------+
//! |                        Type Table Layer                            |
//! |   build (dedup, reserve-before-recurse) | parse (full validation)  |
//! +--------------------------------------------------------------------+
//! |                          Wire Layer                                |
//! |        bounds-checked cursor | LEB128/SLEB128 varints              |
//! +--------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`IdlType`] | Closed tagged union over the IDL type shapes |
//! | [`TypeRegistry`] | Slot arena resolving recursive type handles |
//! | [`Value`] | Dynamically-shaped in-memory datum |
//! | [`TypeTable`] | Flattened, canonicalized wire header |
//! | [`CodecError`] | Typed failure taxonomy (never panics on bad input) |
//!
//! ## Guarantees
//!
//! - **Round-trip**: `decode(encode(v, T), T) == v` for canonical values.
//! - **Canonical ordering**: record/variant fields serialize in ascending
//!   id order regardless of declaration order, so structurally equal types
//!   produce byte-identical encodings.
//! - **Fail closed**: malformed or adversarial input yields a typed error;
//!   decoding never reads out of bounds, never returns a partial value and
//!   never panics.
//!
//! One encode or decode call runs to completion on the calling thread, over
//! a buffer it owns exclusively. Descriptors, the registry and built type
//! tables are immutable after construction and safe to share across
//! concurrent calls without locking.

/// Encode/decode entry points.
pub mod codec;
/// Error taxonomy.
pub mod error;
/// IDL type descriptors, field-id hashing, recursive-type registry.
pub mod idl;
/// Type table construction (encode) and parsing/validation (decode).
pub mod table;
/// Dynamic values.
pub mod value;
/// Wire-level primitives (cursor, varints).
pub mod wire;

pub use codec::{decode_args, decode_one, encode_args, encode_one};
pub use error::{CodecError, CodecResult};
pub use idl::{
    field_hash, Field, FuncAnnotation, FuncBuilder, FuncType, IdlType, Label, Method,
    PrimitiveKind, RecId, RecordBuilder, ServiceBuilder, TypeRegistry, VariantBuilder,
};
pub use table::TypeTable;
pub use value::{Principal, Value};
