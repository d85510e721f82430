//! Type policies: how records are identified and which fields are local.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::key::{CacheKey, REF_FIELD, TYPENAME_FIELD};

/// Computes a `@client` field from the record it belongs to.
pub type LocalResolver = fn(&Map<String, Value>) -> Option<Value>;

const DEFAULT_KEY_FIELD: &str = "id";

fn author_full_name(record: &Map<String, Value>) -> Option<Value> {
    let first = record.get("firstName")?.as_str()?;
    let last = record.get("lastName")?.as_str()?;
    Some(Value::String(format!("{first} {last}")))
}

/// Per-typename identification and local field rules.
#[derive(Debug, Clone)]
pub struct TypePolicies {
    key_fields: HashMap<String, String>,
    local_fields: HashMap<(String, String), LocalResolver>,
}

impl Default for TypePolicies {
    fn default() -> Self {
        let mut policies = Self::empty();
        policies.add_local_field("Author", "fullName", author_full_name);
        policies
    }
}

impl TypePolicies {
    /// Policies with no local fields and `id` as the key everywhere.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            key_fields: HashMap::new(),
            local_fields: HashMap::new(),
        }
    }

    /// Use `field` instead of `id` to identify `typename` records.
    pub fn set_key_field(&mut self, typename: impl Into<String>, field: impl Into<String>) {
        self.key_fields.insert(typename.into(), field.into());
    }

    /// Register a resolver for `typename.field`.
    pub fn add_local_field(
        &mut self,
        typename: impl Into<String>,
        field: impl Into<String>,
        resolver: LocalResolver,
    ) {
        self.local_fields
            .insert((typename.into(), field.into()), resolver);
    }

    /// The identity field for `typename`.
    #[must_use]
    pub fn key_field(&self, typename: &str) -> &str {
        self.key_fields
            .get(typename)
            .map_or(DEFAULT_KEY_FIELD, String::as_str)
    }

    /// Canonical key of `value`.
    ///
    /// Reference markers yield their target. Objects yield a key when they
    /// carry `__typename` and a string or numeric key field. Anything else is
    /// not identifiable.
    #[must_use]
    pub fn identify(&self, value: &Value) -> Option<CacheKey> {
        let obj = value.as_object()?;
        if let Some(target) = obj.get(REF_FIELD) {
            return target.as_str().map(CacheKey::from_raw);
        }
        let typename = obj.get(TYPENAME_FIELD)?.as_str()?;
        let id = match obj.get(self.key_field(typename))? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(CacheKey::new(typename, &id))
    }

    /// Evaluate a local field of a record, if a resolver is registered.
    #[must_use]
    pub fn resolve_local(&self, record: &Map<String, Value>, field: &str) -> Option<Value> {
        let typename = record.get(TYPENAME_FIELD)?.as_str()?;
        let resolver = self
            .local_fields
            .get(&(typename.to_string(), field.to_string()))?;
        resolver(record)
    }
}
