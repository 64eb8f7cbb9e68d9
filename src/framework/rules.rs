//! # Path Rules
//!
//! Per-attribute transforms that override the default value handling of the
//! codec. Rules are addressed by dotted paths in internal (camel) names:
//! `user.name` reaches the `name` field of the `user` object, and the same
//! path reaches `name` in every element when `user` holds an array.

use crate::framework::value::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// A value transform. An `Err` aborts the surrounding decode/encode call.
pub type Transform = Rc<dyn Fn(Value) -> Result<Value, String>>;

/// Boxes a closure as a [`Transform`].
pub fn transform<F>(f: F) -> Transform
where
    F: Fn(Value) -> Result<Value, String> + 'static,
{
    Rc::new(f)
}

/// Which way data is flowing through the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Wire payload to resource attributes.
    Decode,
    /// Resource attributes to wire payload.
    Encode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Decode => write!(f, "decode"),
            Direction::Encode => write!(f, "encode"),
        }
    }
}

/// Transform overrides keyed by dotted path, at most one per path and direction.
#[derive(Clone, Default)]
pub struct PathRuleTable {
    decoders: HashMap<String, Transform>,
    encoders: HashMap<String, Transform>,
    verbatim: HashSet<String>,
}

impl PathRuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transform; a second rule for the same path and direction replaces the first.
    pub fn insert(&mut self, path: impl Into<String>, direction: Direction, transform: Transform) {
        let table = match direction {
            Direction::Decode => &mut self.decoders,
            Direction::Encode => &mut self.encoders,
        };
        table.insert(path.into(), transform);
    }

    pub fn get(&self, path: &str, direction: Direction) -> Option<&Transform> {
        match direction {
            Direction::Decode => self.decoders.get(path),
            Direction::Encode => self.encoders.get(path),
        }
    }

    /// Exempts the key at `path` from case conversion in both directions.
    pub fn keep_name(&mut self, path: impl Into<String>) {
        self.verbatim.insert(path.into());
    }

    pub fn is_verbatim(&self, path: &str) -> bool {
        self.verbatim.contains(path)
    }

    pub fn len(&self) -> usize {
        self.decoders.len() + self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.verbatim.is_empty()
    }
}

impl fmt::Debug for PathRuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decoders: Vec<_> = self.decoders.keys().collect();
        let mut encoders: Vec<_> = self.encoders.keys().collect();
        decoders.sort();
        encoders.sort();
        f.debug_struct("PathRuleTable")
            .field("decoders", &decoders)
            .field("encoders", &encoders)
            .field("verbatim", &self.verbatim)
            .finish()
    }
}

/// Joins a parent path and a key with a dot.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
