use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{CacheWatch, InMemoryCache, NormalizedCache};
use crate::document::Document;

/// A live view of one cached query.
///
/// [`poll`](Self::poll) re-reads the query after cache changes and reports
/// the result only when it differs from the last one seen.
#[derive(Debug)]
pub struct QueryWatch {
    cache: Arc<InMemoryCache>,
    document: Document,
    variables: Value,
    events: CacheWatch,
    last: Option<Value>,
    primed: bool,
}

impl QueryWatch {
    pub(super) fn new(cache: Arc<InMemoryCache>, document: Document, variables: Value) -> Self {
        let events = cache.watch();
        Self {
            cache,
            document,
            variables,
            events,
            last: None,
            primed: false,
        }
    }

    /// The last result seen, if the query was fully cached at the time.
    #[must_use]
    pub fn current(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    fn refresh(&mut self) -> Option<Value> {
        let next = self.cache.read_query(&self.document, &self.variables);
        if next == self.last {
            return None;
        }
        self.last.clone_from(&next);
        next
    }

    /// A fresh result if the cache changed it since the last poll.
    ///
    /// The first poll always reads. A result that became incomplete (for
    /// example after an eviction) is not reported; [`current`](Self::current)
    /// then returns `None`.
    pub fn poll(&mut self) -> Option<Value> {
        let changed = !self.events.drain().is_empty();
        if self.primed && !changed {
            return None;
        }
        self.primed = true;
        self.refresh()
    }

    /// Like [`poll`](Self::poll), waiting up to `timeout` for a change.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<Value> {
        if !self.primed {
            return self.poll();
        }
        self.events.next_timeout(timeout)?;
        // Collapse whatever else queued up behind the first event.
        let _ = self.events.drain();
        self.refresh()
    }
}
