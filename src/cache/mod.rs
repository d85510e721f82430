//! Normalized object cache.
//!
//! Responses are flattened into records keyed by `"{typename}:{id}"`; a
//! relational field holds a `{"__ref": key}` marker instead of a nested copy.
//! Top level query fields live on the `ROOT_QUERY` record under store field
//! names that include their arguments (`authors({"filter":{}})`).
//!
//! The [`NormalizedCache`] trait is the narrow surface consumers such as the
//! relation patcher depend on; [`InMemoryCache`] is the implementation.

mod key;
mod memory;
mod policy;
mod watch;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::Document;

pub use key::{field_name_of, reference_target, CacheKey, REF_FIELD, TYPENAME_FIELD};
pub use memory::InMemoryCache;
pub use policy::{LocalResolver, TypePolicies};
pub use watch::{CacheEvent, CacheWatch};

/// Serializable image of the whole cache (`extract` / `restore`).
pub type CacheSnapshot = BTreeMap<String, Value>;

/// Context handed to a field modifier.
pub struct ModifierDetails<'a> {
    /// Field name without arguments.
    pub field_name: &'a str,
    /// Full store field name, arguments included.
    pub store_field_name: &'a str,
    policies: &'a TypePolicies,
}

impl<'a> ModifierDetails<'a> {
    pub(crate) fn new(field_name: &'a str, store_field_name: &'a str, policies: &'a TypePolicies) -> Self {
        Self {
            field_name,
            store_field_name,
            policies,
        }
    }

    /// Canonical key of `value` under the cache's policies.
    #[must_use]
    pub fn identify(&self, value: &Value) -> Option<CacheKey> {
        self.policies.identify(value)
    }
}

/// A rewrite of one field: receives the current value, returns the new one.
pub type FieldModifier<'a> = Box<dyn FnMut(&Value, &ModifierDetails<'_>) -> Value + 'a>;

/// Field modifiers for a single [`NormalizedCache::modify`] call.
#[derive(Default)]
pub struct Modifiers<'a> {
    fields: Vec<(String, FieldModifier<'a>)>,
}

impl<'a> Modifiers<'a> {
    /// No modifiers.
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Rewrite every store field named `name` (any arguments).
    #[must_use]
    pub fn field<F>(mut self, name: impl Into<String>, modifier: F) -> Self
    where
        F: FnMut(&Value, &ModifierDetails<'_>) -> Value + 'a,
    {
        self.fields.push((name.into(), Box::new(modifier)));
        self
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldModifier<'a>> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Returns true if no field is targeted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The cache surface used by post-mutation hooks.
pub trait NormalizedCache: Send + Sync {
    /// Denormalize the cached result of `document`, or `None` if any selected
    /// field is missing.
    fn read_query(&self, document: &Document, variables: &Value) -> Option<Value>;

    /// Canonical key of an object or reference marker.
    fn identify(&self, value: &Value) -> Option<CacheKey>;

    /// Rewrite fields of the record at `key` in place.
    ///
    /// Fields the record does not have are skipped. Returns true if any
    /// field value changed.
    fn modify(&self, key: &CacheKey, modifiers: Modifiers<'_>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_normalized_cache_object_safe(_: &dyn NormalizedCache) {}

    #[test]
    fn modifiers_lookup_by_field_name() {
        let mut mods = Modifiers::new().field("books", |v, _| v.clone());
        assert!(!mods.is_empty());
        assert!(mods.get_mut("books").is_some());
        assert!(mods.get_mut("author").is_none());
    }
}
