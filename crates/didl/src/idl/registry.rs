// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive-type resolution via a slot arena.
//!
//! Self-referential and mutually-recursive definitions cannot be expressed
//! as finite descriptor trees, so a [`RecId`] handle stands in for the
//! recursive occurrence. Handles are reserved first (placeholder slot) and
//! defined once the full graph is known; resolution is a plain slot lookup,
//! so repeated visits never re-walk the type graph. The registry is mutated
//! only while the graph is being assembled — afterwards it is read-only and
//! safe to share across concurrent encode/decode calls.

use crate::error::{CodecError, CodecResult};
use crate::idl::types::IdlType;
use std::sync::Arc;

/// Opaque handle to a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecId(u32);

impl RecId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Arena of recursive type definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    slots: Vec<Option<Arc<IdlType>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for a definition that is not yet known.
    ///
    /// The returned handle may be embedded in descriptors immediately; it
    /// only has to be [`define`](Self::define)d before the first encode or
    /// decode that traverses it.
    pub fn reserve(&mut self) -> RecId {
        self.slots.push(None);
        RecId((self.slots.len() - 1) as u32)
    }

    /// Fill a reserved slot. Defining a slot twice is an error.
    pub fn define(&mut self, handle: RecId, ty: impl Into<Arc<IdlType>>) -> CodecResult<()> {
        let slot = self
            .slots
            .get_mut(handle.0 as usize)
            .ok_or_else(|| CodecError::MalformedTypeTable {
                offset: 0,
                reason: format!("unknown recursive handle #{}", handle.0),
            })?;
        if slot.is_some() {
            return Err(CodecError::MalformedTypeTable {
                offset: 0,
                reason: format!("recursive handle #{} defined twice", handle.0),
            });
        }
        *slot = Some(ty.into());
        Ok(())
    }

    /// Reserve and define in one step, for non-mutual recursion built with
    /// the handle already in hand via a closure.
    pub fn knot(&mut self, build: impl FnOnce(RecId) -> IdlType) -> CodecResult<RecId> {
        let handle = self.reserve();
        let ty = build(handle);
        self.define(handle, ty)?;
        Ok(handle)
    }

    /// Resolve a handle to its target descriptor.
    ///
    /// A reserved-but-never-defined handle is a dangling reference.
    pub fn resolve(&self, handle: RecId) -> CodecResult<&Arc<IdlType>> {
        self.slots
            .get(handle.0 as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| CodecError::MalformedTypeTable {
                offset: 0,
                reason: format!("dangling recursive handle #{}", handle.0),
            })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::types::{Field, PrimitiveKind};

    #[test]
    fn knot_builds_self_reference() {
        let mut registry = TypeRegistry::new();
        let node = registry
            .knot(|node| {
                IdlType::record(vec![
                    Field::new("value", IdlType::prim(PrimitiveKind::Nat32)),
                    Field::new("next", IdlType::opt(IdlType::rec(node))),
                ])
            })
            .unwrap();
        let resolved = registry.resolve(node).unwrap();
        assert!(matches!(**resolved, IdlType::Record(_)));
    }

    #[test]
    fn mutual_recursion_resolves() {
        let mut registry = TypeRegistry::new();
        let a = registry.reserve();
        let b = registry.reserve();
        registry
            .define(a, IdlType::opt(IdlType::rec(b)))
            .unwrap();
        registry
            .define(b, IdlType::vec(IdlType::rec(a)))
            .unwrap();
        assert!(registry.resolve(a).is_ok());
        assert!(registry.resolve(b).is_ok());
    }

    #[test]
    fn dangling_handle_is_reported() {
        let mut registry = TypeRegistry::new();
        let handle = registry.reserve();
        assert!(matches!(
            registry.resolve(handle),
            Err(CodecError::MalformedTypeTable { .. })
        ));
    }

    #[test]
    fn double_define_is_rejected() {
        let mut registry = TypeRegistry::new();
        let handle = registry.reserve();
        registry
            .define(handle, IdlType::prim(PrimitiveKind::Null))
            .unwrap();
        assert!(matches!(
            registry.define(handle, IdlType::prim(PrimitiveKind::Bool)),
            Err(CodecError::MalformedTypeTable { .. })
        ));
    }
}
