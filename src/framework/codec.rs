//! # Codec
//!
//! Converts wire payloads into resource attributes (decode) and back (encode).
//!
//! Both directions walk the tree recursively with a dotted path in internal
//! names. At each key:
//!
//! 1. Opaque values (encode only) are copied as they are.
//! 2. A path rule for the current direction replaces the value.
//! 3. Otherwise objects and arrays are walked; primitives are copied.
//! 4. The key is renamed (`snake_case` <-> `camelCase`) unless exempted.
//!
//! Array elements share their parent's path, so a rule for `users.name`
//! applies to the `name` of every element of `users`.

use crate::framework::error::CodecError;
use crate::framework::relations::RelationRegistry;
use crate::framework::rules::{join_path, Direction, PathRuleTable};
use crate::framework::value::{Attributes, Value};
use serde_json::Map;

/// Wire-case to internal-case: each underscore followed by a letter becomes that letter, uppercased.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == '_' && next.is_alphabetic() => {
                out.extend(next.to_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Internal-case to wire-case: an underscore goes before each internal uppercase letter, which is lowercased.
///
/// A leading uppercase letter is left untouched.
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// A borrowed view over one model's rules, ready to decode or encode.
pub struct Codec<'a> {
    rules: &'a PathRuleTable,
    relations: &'a RelationRegistry,
    system_prefix: &'a str,
    rename_keys: bool,
}

impl<'a> Codec<'a> {
    pub fn new(
        rules: &'a PathRuleTable,
        relations: &'a RelationRegistry,
        system_prefix: &'a str,
        rename_keys: bool,
    ) -> Self {
        Self {
            rules,
            relations,
            system_prefix,
            rename_keys,
        }
    }

    // =========================================================================
    // DECODE
    // =========================================================================

    /// Decodes a raw wire object into internal attributes.
    ///
    /// Path rules are not consulted at or below a relation attribute; keys
    /// there are still renamed.
    pub fn decode(&self, raw: &serde_json::Value) -> Result<Attributes, CodecError> {
        match raw {
            serde_json::Value::Object(object) => self.decode_object(object, "", false),
            other => Err(CodecError::NotAnObject {
                found: json_kind(other),
            }),
        }
    }

    fn decode_object(
        &self,
        object: &Map<String, serde_json::Value>,
        prefix: &str,
        shielded: bool,
    ) -> Result<Attributes, CodecError> {
        let mut out = Attributes::new();
        for (wire_key, raw) in object {
            let key = self.internal_key(wire_key, prefix);
            let path = join_path(prefix, &key);
            let shielded = shielded || (prefix.is_empty() && self.relations.is_relation(&key));
            let value = self.decode_value(raw, &path, shielded)?;
            out.insert(key, value);
        }
        Ok(out)
    }

    fn decode_value(
        &self,
        raw: &serde_json::Value,
        path: &str,
        shielded: bool,
    ) -> Result<Value, CodecError> {
        if !shielded {
            if let Some(rule) = self.rules.get(path, Direction::Decode) {
                return rule(Value::from(raw.clone())).map_err(|reason| CodecError::Transform {
                    path: path.to_string(),
                    direction: Direction::Decode,
                    reason,
                });
            }
        }
        self.decode_structure(raw, path, shielded)
    }

    fn decode_structure(
        &self,
        raw: &serde_json::Value,
        path: &str,
        shielded: bool,
    ) -> Result<Value, CodecError> {
        match raw {
            serde_json::Value::Object(object) => {
                Ok(Value::Object(self.decode_object(object, path, shielded)?))
            }
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| self.decode_structure(item, path, shielded))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(Value::from(other.clone())),
        }
    }

    fn internal_key(&self, wire_key: &str, prefix: &str) -> String {
        if !self.rename_keys || self.rules.is_verbatim(&join_path(prefix, wire_key)) {
            wire_key.to_string()
        } else {
            snake_to_camel(wire_key)
        }
    }

    // =========================================================================
    // ENCODE
    // =========================================================================

    /// Encodes internal attributes into a wire object.
    ///
    /// Top-level system attributes and relation attributes are left out. The
    /// result may still hold opaque values; see [`Value::to_json`].
    pub fn encode(&self, attributes: &Attributes) -> Result<Attributes, CodecError> {
        self.encode_object(attributes, "")
    }

    fn encode_object(&self, object: &Attributes, prefix: &str) -> Result<Attributes, CodecError> {
        let mut out = Attributes::new();
        for (key, value) in object {
            if prefix.is_empty()
                && (key.starts_with(self.system_prefix) || self.relations.is_relation(key))
            {
                continue;
            }
            let path = join_path(prefix, key);
            let encoded = self.encode_value(value, &path)?;
            out.insert(self.wire_key(key, &path), encoded);
        }
        Ok(out)
    }

    fn encode_value(&self, value: &Value, path: &str) -> Result<Value, CodecError> {
        if value.is_opaque() {
            return Ok(value.clone());
        }
        if let Some(rule) = self.rules.get(path, Direction::Encode) {
            return rule(value.clone()).map_err(|reason| CodecError::Transform {
                path: path.to_string(),
                direction: Direction::Encode,
                reason,
            });
        }
        self.encode_structure(value, path)
    }

    fn encode_structure(&self, value: &Value, path: &str) -> Result<Value, CodecError> {
        match value {
            Value::Object(object) => Ok(Value::Object(self.encode_object(object, path)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| self.encode_structure(item, path))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn wire_key(&self, key: &str, path: &str) -> String {
        if !self.rename_keys || self.rules.is_verbatim(path) {
            key.to_string()
        } else {
            camel_to_snake(key)
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
