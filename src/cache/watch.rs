//! Change notifications for cache consumers.
//!
//! Every mutation of the cache is published to all subscribers over bounded
//! channels. Publishing never blocks: a full subscriber queue drops the event
//! and the drop is counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

use super::key::CacheKey;

/// What changed in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A response was normalized into these records.
    Written {
        /// Records written, in normalization order.
        keys: Vec<CacheKey>,
    },
    /// Fields of a single record were rewritten in place.
    Modified {
        /// The rewritten record.
        key: CacheKey,
        /// Store field names that changed.
        fields: Vec<String>,
    },
    /// Records were removed.
    Evicted {
        /// Records that no longer exist.
        keys: Vec<CacheKey>,
    },
    /// The whole cache was replaced or cleared.
    Reset,
}

impl CacheEvent {
    /// Returns true if the event touches `key`.
    #[must_use]
    pub fn touches(&self, key: &CacheKey) -> bool {
        match self {
            Self::Written { keys } | Self::Evicted { keys } => keys.contains(key),
            Self::Modified { key: k, .. } => k == key,
            Self::Reset => true,
        }
    }
}

/// A subscription to cache changes.
#[derive(Debug)]
pub struct CacheWatch {
    rx: Receiver<CacheEvent>,
}

impl CacheWatch {
    /// Next event, if one is queued.
    #[must_use]
    pub fn try_next(&self) -> Option<CacheEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    #[must_use]
    pub fn next_timeout(&self, timeout: Duration) -> Option<CacheEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drain every queued event.
    #[must_use]
    pub fn drain(&self) -> Vec<CacheEvent> {
        self.rx.try_iter().collect()
    }
}

/// Fan-out of cache events to subscribers.
#[derive(Debug)]
pub(crate) struct Broadcaster {
    capacity: usize,
    subscribers: Mutex<Vec<Sender<CacheEvent>>>,
    dropped: AtomicU64,
}

impl Broadcaster {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
            dropped: AtomicU64::new(0),
        }
    }

    pub(crate) fn subscribe(&self) -> CacheWatch {
        let (tx, rx) = bounded(self.capacity);
        self.subscribers.lock().push(tx);
        CacheWatch { rx }
    }

    pub(crate) fn publish(&self, event: &CacheEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub(crate) fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber() {
        let hub = Broadcaster::new(4);
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.publish(&CacheEvent::Reset);
        assert_eq!(a.try_next(), Some(CacheEvent::Reset));
        assert_eq!(b.try_next(), Some(CacheEvent::Reset));
    }

    #[test]
    fn full_queues_drop_and_count() {
        let hub = Broadcaster::new(1);
        let watch = hub.subscribe();
        hub.publish(&CacheEvent::Reset);
        hub.publish(&CacheEvent::Reset);
        assert_eq!(hub.dropped_events(), 1);
        assert_eq!(watch.drain().len(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = Broadcaster::new(2);
        let watch = hub.subscribe();
        drop(watch);
        hub.publish(&CacheEvent::Reset);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn touches_matches_keys() {
        let key = CacheKey::new("Author", "a:1");
        let event = CacheEvent::Modified {
            key: key.clone(),
            fields: vec!["books".to_string()],
        };
        assert!(event.touches(&key));
        assert!(!event.touches(&CacheKey::new("Author", "a:2")));
        assert!(CacheEvent::Reset.touches(&key));
    }
}
