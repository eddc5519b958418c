// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! IDL type descriptor model.
//!
//! The closed set of type shapes ([`IdlType`]), field/variant identifier
//! hashing ([`field_hash`], [`Label`]), the recursive-type arena
//! ([`TypeRegistry`]) and fluent builders.

mod builder;
mod hash;
mod registry;
mod types;

pub use builder::{FuncBuilder, RecordBuilder, ServiceBuilder, VariantBuilder};
pub use hash::{field_hash, Label};
pub use registry::{RecId, TypeRegistry};
pub use types::{Field, FuncAnnotation, FuncType, IdlType, Method, PrimitiveKind};
