//! Local repair of a one-to-many relation after a child loses its parent.
//!
//! `removeBookAuthor` only returns the book, so the cached author listing
//! still lists the book under its former author. [`RelationCachePatcher`]
//! finds that author in the cached listing and drops the book from its
//! `books` field without going back to the network.

use serde_json::{json, Value};
use tracing::debug;

use crate::cache::{CacheKey, Modifiers, NormalizedCache, TYPENAME_FIELD};
use crate::document::{catalog, Document};
use crate::entity::Typename;

/// Where a parent/child relation lives in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationEdge {
    /// The cached query listing the parents.
    pub parent_query: Document,
    /// Variables the listing was cached under.
    pub variables: Value,
    /// Root list field of the listing (`authors`).
    pub list_field: String,
    /// Child collection field on each parent (`books`).
    pub children_field: String,
    /// Typename of the children (`Book`).
    pub child_typename: String,
}

impl RelationEdge {
    /// `Author.books`, read through `AUTHORS` with an empty filter.
    #[must_use]
    pub fn authors_books() -> Self {
        Self {
            parent_query: catalog::authors(),
            variables: json!({ "filter": {} }),
            list_field: "authors".to_string(),
            children_field: "books".to_string(),
            child_typename: Typename::Book.as_str().to_string(),
        }
    }

    fn child_key<C: NormalizedCache + ?Sized>(&self, cache: &C, child_id: &str) -> Option<CacheKey> {
        cache.identify(&json!({
            TYPENAME_FIELD: self.child_typename,
            "id": child_id,
        }))
    }
}

/// Result of [`RelationCachePatcher::detach_child`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The parent listing is not in the cache.
    QueryNotCached,
    /// No cached parent lists the child.
    OwnerNotFound,
    /// The owner or the child could not be identified.
    Unidentifiable,
    /// The child was removed from `parent`'s collection.
    Detached {
        /// The owner whose collection shrank.
        parent: CacheKey,
        /// Entries dropped; more than one when the child was listed twice.
        removed: usize,
    },
}

impl PatchOutcome {
    /// Returns true if the cache was changed.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        matches!(self, Self::Detached { .. })
    }
}

/// Removes a child from its former parent's cached collection.
pub struct RelationCachePatcher<'c, C: NormalizedCache + ?Sized> {
    cache: &'c C,
}

impl<'c, C: NormalizedCache + ?Sized> RelationCachePatcher<'c, C> {
    /// Create a patcher over `cache`.
    #[must_use]
    pub const fn new(cache: &'c C) -> Self {
        Self { cache }
    }

    /// Drop `child_id` from the collection of the first cached parent that
    /// lists it.
    ///
    /// Misses are not errors: an uncached listing or an unowned child leave
    /// the cache untouched. Entries are compared by cache key, so full
    /// objects and bare references match alike.
    pub fn detach_child(&self, edge: &RelationEdge, child_id: &str) -> PatchOutcome {
        let outcome = self.detach(edge, child_id);
        debug!(
            child = child_id,
            relation = %format!("{}.{}", edge.list_field, edge.children_field),
            outcome = ?outcome,
            "relation patch"
        );
        outcome
    }

    fn detach(&self, edge: &RelationEdge, child_id: &str) -> PatchOutcome {
        let Some(data) = self.cache.read_query(&edge.parent_query, &edge.variables) else {
            return PatchOutcome::QueryNotCached;
        };
        let Some(parents) = data.get(&edge.list_field).and_then(Value::as_array) else {
            return PatchOutcome::QueryNotCached;
        };

        let owner = parents.iter().find(|parent| {
            parent
                .get(&edge.children_field)
                .and_then(Value::as_array)
                .is_some_and(|children| {
                    children
                        .iter()
                        .any(|c| c.get("id").and_then(Value::as_str) == Some(child_id))
                })
        });
        let Some(owner) = owner else {
            return PatchOutcome::OwnerNotFound;
        };

        let (Some(parent), Some(target)) = (self.cache.identify(owner), edge.child_key(self.cache, child_id))
        else {
            return PatchOutcome::Unidentifiable;
        };

        let mut removed = 0;
        self.cache.modify(
            &parent,
            Modifiers::new().field(edge.children_field.clone(), |current, details| {
                let Some(entries) = current.as_array() else {
                    return current.clone();
                };
                let kept: Vec<Value> = entries
                    .iter()
                    .filter(|entry| details.identify(entry).as_ref() != Some(&target))
                    .cloned()
                    .collect();
                removed += entries.len() - kept.len();
                Value::Array(kept)
            }),
        );

        PatchOutcome::Detached { parent, removed }
    }
}
