// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for type descriptors.

use crate::idl::hash::Label;
use crate::idl::types::{Field, FuncAnnotation, FuncType, IdlType, Method, PrimitiveKind};
use std::sync::Arc;

/// Builder for record types.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: Vec<Field>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named field.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<Arc<IdlType>>) -> Self {
        self.fields.push(Field::new(Label::Named(name.into()), ty));
        self
    }

    /// Add a field with an explicit numeric id.
    pub fn numbered(mut self, id: u32, ty: impl Into<Arc<IdlType>>) -> Self {
        self.fields.push(Field::new(Label::Id(id), ty));
        self
    }

    /// Add a named primitive field.
    pub fn prim_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.field(name, IdlType::prim(kind))
    }

    pub fn build(self) -> IdlType {
        IdlType::Record(self.fields)
    }
}

/// Builder for variant types.
#[derive(Debug, Default)]
pub struct VariantBuilder {
    tags: Vec<Field>,
}

impl VariantBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag carrying a payload type.
    pub fn tag(mut self, name: impl Into<String>, ty: impl Into<Arc<IdlType>>) -> Self {
        self.tags.push(Field::new(Label::Named(name.into()), ty));
        self
    }

    /// Add a payload-free tag (`null` payload).
    pub fn unit_tag(self, name: impl Into<String>) -> Self {
        self.tag(name, IdlType::prim(PrimitiveKind::Null))
    }

    pub fn build(self) -> IdlType {
        IdlType::Variant(self.tags)
    }
}

/// Builder for function signatures.
#[derive(Debug, Default)]
pub struct FuncBuilder {
    signature: FuncType,
}

impl FuncBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, ty: impl Into<Arc<IdlType>>) -> Self {
        self.signature.args.push(ty.into());
        self
    }

    pub fn ret(mut self, ty: impl Into<Arc<IdlType>>) -> Self {
        self.signature.rets.push(ty.into());
        self
    }

    pub fn query(mut self) -> Self {
        self.signature.annotations.push(FuncAnnotation::Query);
        self
    }

    pub fn oneway(mut self) -> Self {
        self.signature.annotations.push(FuncAnnotation::Oneway);
        self
    }

    pub fn composite_query(mut self) -> Self {
        self.signature
            .annotations
            .push(FuncAnnotation::CompositeQuery);
        self
    }

    pub fn build(self) -> IdlType {
        IdlType::Func(self.signature)
    }

    pub fn build_signature(self) -> FuncType {
        self.signature
    }
}

/// Builder for service types.
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    methods: Vec<Method>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, name: impl Into<String>, func: impl Into<Arc<IdlType>>) -> Self {
        self.methods.push(Method::new(name, func));
        self
    }

    pub fn build(self) -> IdlType {
        IdlType::Service(self.methods)
    }
}
