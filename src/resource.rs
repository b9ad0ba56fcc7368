//! Resource type registry primitives
//!
//! A closed tagged-variant model for everything that can sit in a pool:
//! goods (ingots, components, ammunition) and the single currency type.
//! Goods carry an opaque equality key; the core never inspects the key
//! beyond matching it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Goods category.
///
/// The category only matters to the catalog (pricing, limits) and to
/// display; the transfer core treats all goods uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Ingot,
    Component,
    Ammunition,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Ingot => "Ingot",
            ResourceKind::Component => "Component",
            ResourceKind::Ammunition => "Ammunition",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resource type: either a goods category + key, or the currency.
///
/// Resolution from item identity to `ResourceType` happens once at
/// catalog-load time; it is never re-derived from string contents per call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Goods { kind: ResourceKind, key: String },
    Currency,
}

impl ResourceType {
    pub fn goods(kind: ResourceKind, key: impl Into<String>) -> Self {
        ResourceType::Goods {
            kind,
            key: key.into(),
        }
    }

    pub fn ingot(key: impl Into<String>) -> Self {
        Self::goods(ResourceKind::Ingot, key)
    }

    pub fn component(key: impl Into<String>) -> Self {
        Self::goods(ResourceKind::Component, key)
    }

    pub fn ammunition(key: impl Into<String>) -> Self {
        Self::goods(ResourceKind::Ammunition, key)
    }

    #[inline]
    pub fn is_currency(&self) -> bool {
        matches!(self, ResourceType::Currency)
    }

    /// Opaque equality key, or `None` for the currency.
    pub fn key(&self) -> Option<&str> {
        match self {
            ResourceType::Goods { key, .. } => Some(key),
            ResourceType::Currency => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Goods { kind, key } => write!(f, "{}/{}", kind, key),
            ResourceType::Currency => write!(f, "Currency"),
        }
    }
}
