//! # Relations
//!
//! Records which attributes hold related resources. The codec leaves these out
//! of every outbound payload; inbound data is still decoded onto them.

use std::collections::HashMap;

/// How an attribute refers to another model, by model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    HasOne(String),
    HasMany(String),
}

impl RelationKind {
    /// Name of the related model.
    pub fn target(&self) -> &str {
        match self {
            RelationKind::HasOne(target) | RelationKind::HasMany(target) => target,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: HashMap<String, RelationKind>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_relation(&mut self, attribute: impl Into<String>, kind: RelationKind) {
        self.relations.insert(attribute.into(), kind);
    }

    pub fn is_relation(&self, attribute: &str) -> bool {
        self.relations.contains_key(attribute)
    }

    pub fn kind(&self, attribute: &str) -> Option<&RelationKind> {
        self.relations.get(attribute)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
