// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field/variant identifier hashing.
//!
//! Per the Candid specification, a named field's 32-bit identifier is
//! `hash(name) = ( Sum utf8(name)[i] * 223^(k-i) ) mod 2^32`. The id, not
//! the name, crosses the wire, so this function is pinned: changing it
//! breaks interoperability silently.

use std::fmt;

/// Canonical 32-bit identifier for a field or variant tag name.
pub fn field_hash(name: &str) -> u32 {
    name.as_bytes()
        .iter()
        .fold(0u32, |h, &b| h.wrapping_mul(223).wrapping_add(u32::from(b)))
}

/// A field or variant tag label: either a source-level name (hashed) or an
/// explicit numeric id (tuple-as-record positional fields).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Named(String),
    Id(u32),
}

impl Label {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The 32-bit identifier that determines wire order.
    pub fn id(&self) -> u32 {
        match self {
            Self::Named(name) => field_hash(name),
            Self::Id(id) => *id,
        }
    }

    /// Source-level name, if the label has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Id(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<u32> for Label {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hash_values() {
        // Hand-computed against the pinned 223-fold.
        assert_eq!(field_hash(""), 0);
        assert_eq!(field_hash("a"), 97);
        assert_eq!(field_hash("hi"), 23297);
        assert_eq!(field_hash("Ok"), 17724);
        assert_eq!(field_hash("Err"), 3_456_837);
        assert_eq!(field_hash("value"), 834_174_833);
        assert_eq!(field_hash("next"), 1_224_901_875);
        assert_eq!(field_hash("temperature"), 1_016_116_276);
    }

    #[test]
    fn distinct_names_can_collide() {
        // Two distinct names with the same 32-bit id; table building must
        // reject records containing both.
        assert_eq!(field_hash("cstachq"), field_hash("tekhtfo"));
        assert_eq!(field_hash("cstachq"), 448_520_751);
    }

    #[test]
    fn numeric_labels_are_literal() {
        assert_eq!(Label::Id(3).id(), 3);
        assert_eq!(Label::named("a").id(), 97);
        assert_eq!(Label::Id(3).name(), None);
        assert_eq!(Label::named("a").name(), Some("a"));
    }
}
