//! Canonical cache keys and reference markers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Marker field of a reference object: `{"__ref": "Book:b:1"}`.
pub const REF_FIELD: &str = "__ref";

/// Field carrying an object's GraphQL type.
pub const TYPENAME_FIELD: &str = "__typename";

/// Canonical identity of a cache record: `"{typename}:{id}"`.
///
/// The two root records use fixed names ([`CacheKey::root_query`],
/// [`CacheKey::root_mutation`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Combines a typename and an id.
    ///
    /// ```
    /// use author_books::cache::CacheKey;
    ///
    /// assert_eq!(CacheKey::new("Book", "b:1").as_str(), "Book:b:1");
    /// ```
    #[must_use]
    pub fn new(typename: &str, id: &str) -> Self {
        Self(format!("{typename}:{id}"))
    }

    /// Wraps an already-composed key (as found in a `__ref`).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The record aggregating top level query fields.
    #[must_use]
    pub fn root_query() -> Self {
        Self("ROOT_QUERY".to_string())
    }

    /// The record aggregating mutation results.
    #[must_use]
    pub fn root_mutation() -> Self {
        Self("ROOT_MUTATION".to_string())
    }

    /// Returns true for `ROOT_QUERY` and `ROOT_MUTATION`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "ROOT_QUERY" || self.0 == "ROOT_MUTATION"
    }

    /// Borrow the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reference marker pointing at this key.
    #[must_use]
    pub fn to_reference(&self) -> Value {
        json!({ REF_FIELD: self.0 })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The key a reference marker points at, if `value` is one.
#[must_use]
pub fn reference_target(value: &Value) -> Option<&str> {
    value.as_object()?.get(REF_FIELD)?.as_str()
}

/// The part of a store field name before its arguments:
/// `authors({"filter":{}})` → `authors`.
#[must_use]
pub fn field_name_of(store_field_name: &str) -> &str {
    store_field_name
        .split_once('(')
        .map_or(store_field_name, |(name, _)| name)
}
