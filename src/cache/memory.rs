//! In-memory normalized cache.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::document::{Document, Field, OperationKind};

use super::key::{field_name_of, reference_target, CacheKey, TYPENAME_FIELD};
use super::policy::TypePolicies;
use super::watch::{Broadcaster, CacheEvent, CacheWatch};
use super::{CacheSnapshot, ModifierDetails, Modifiers, NormalizedCache};

type Record = Map<String, Value>;

#[derive(Debug, Default)]
struct CacheState {
    records: HashMap<String, Record>,
}

impl CacheState {
    fn root_mut(&mut self, kind: OperationKind) -> &mut Record {
        let (key, typename) = match kind {
            OperationKind::Query => (CacheKey::root_query(), "Query"),
            OperationKind::Mutation => (CacheKey::root_mutation(), "Mutation"),
        };
        self.records.entry(key.as_str().to_string()).or_insert_with(|| {
            let mut root = Record::new();
            root.insert(TYPENAME_FIELD.to_string(), Value::String(typename.to_string()));
            root
        })
    }
}

/// Normalizes responses into flat records.
struct Writer<'a> {
    state: &'a mut CacheState,
    policies: &'a TypePolicies,
    variables: &'a Value,
    written: BTreeSet<String>,
}

impl Writer<'_> {
    fn value(&mut self, value: &Value, selection: &[Field]) -> Value {
        if selection.is_empty() {
            return value.clone();
        }
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.value(v, selection)).collect()),
            Value::Object(obj) => self.object(obj, value, selection),
            other => other.clone(),
        }
    }

    fn object(&mut self, obj: &Record, whole: &Value, selection: &[Field]) -> Value {
        let mut fields = Record::new();
        if let Some(typename) = obj.get(TYPENAME_FIELD) {
            fields.insert(TYPENAME_FIELD.to_string(), typename.clone());
        }
        for field in selection.iter().filter(|f| !f.client_only) {
            let Some(incoming) = obj.get(&field.name) else {
                continue;
            };
            let stored = self.value(incoming, &field.selection);
            fields.insert(field.store_field_name(self.variables), stored);
        }

        let Some(key) = self.policies.identify(whole) else {
            return Value::Object(fields);
        };
        // Field-level merge: incoming fields win, fields not selected this
        // time keep their previous values.
        let record = self.state.records.entry(key.as_str().to_string()).or_default();
        for (name, value) in fields {
            record.insert(name, value);
        }
        self.written.insert(key.as_str().to_string());
        key.to_reference()
    }
}

/// Denormalizes records along a selection set.
struct Reader<'a> {
    state: &'a CacheState,
    policies: &'a TypePolicies,
    variables: &'a Value,
}

impl Reader<'_> {
    fn value(&self, raw: &Value, selection: &[Field]) -> Option<Value> {
        if selection.is_empty() {
            return Some(raw.clone());
        }
        match raw {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    // Dangling references inside lists are skipped, not fatal.
                    if let Some(target) = reference_target(item) {
                        if !self.state.records.contains_key(target) {
                            continue;
                        }
                    }
                    out.push(self.value(item, selection)?);
                }
                Some(Value::Array(out))
            }
            Value::Object(obj) => match reference_target(raw) {
                Some(target) => {
                    let record = self.state.records.get(target)?;
                    self.object(record, selection)
                }
                None => self.object(obj, selection),
            },
            other => Some(other.clone()),
        }
    }

    fn object(&self, record: &Record, selection: &[Field]) -> Option<Value> {
        let mut out = Record::new();
        if let Some(typename) = record.get(TYPENAME_FIELD) {
            out.insert(TYPENAME_FIELD.to_string(), typename.clone());
        }
        for field in selection {
            let value = if field.client_only {
                self.policies.resolve_local(record, &field.name)?
            } else {
                let raw = record.get(&field.store_field_name(self.variables))?;
                self.value(raw, &field.selection)?
            };
            out.insert(field.name.clone(), value);
        }
        Some(Value::Object(out))
    }
}

fn collect_references(value: &Value, into: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, into)),
        Value::Object(obj) => {
            if let Some(target) = reference_target(value) {
                into.push(target.to_string());
            } else {
                obj.values().for_each(|v| collect_references(v, into));
            }
        }
        _ => {}
    }
}

/// Thread-safe normalized cache.
///
/// Reads and writes take a single `RwLock`; change events are published
/// after the lock is released.
#[derive(Debug)]
pub struct InMemoryCache {
    state: RwLock<CacheState>,
    policies: TypePolicies,
    events: Broadcaster,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_config(&CacheConfig::default())
    }
}

impl InMemoryCache {
    /// Create an empty cache with default policies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache from configuration.
    #[must_use]
    pub fn with_config(config: &CacheConfig) -> Self {
        let mut policies = TypePolicies::default();
        for (typename, field) in &config.key_fields {
            policies.set_key_field(typename.clone(), field.clone());
        }
        Self::with_policies(policies, config.watch_capacity)
    }

    /// Create an empty cache with explicit policies.
    #[must_use]
    pub fn with_policies(policies: TypePolicies, watch_capacity: usize) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            policies,
            events: Broadcaster::new(watch_capacity),
        }
    }

    /// The policies used to identify records.
    #[must_use]
    pub fn policies(&self) -> &TypePolicies {
        &self.policies
    }

    /// Normalize `data` (a response's `data` object) for `document`.
    ///
    /// Query results are attached to `ROOT_QUERY`, mutation results to
    /// `ROOT_MUTATION`. Returns the keys of every record written.
    pub fn write_query(&self, document: &Document, variables: &Value, data: &Value) -> Vec<CacheKey> {
        let root = &document.root;
        let written = {
            let mut state = self.state.write();
            let mut writer = Writer {
                state: &mut state,
                policies: &self.policies,
                variables,
                written: BTreeSet::new(),
            };
            let Some(incoming) = data.get(&root.name) else {
                return Vec::new();
            };
            let stored = writer.value(incoming, &root.selection);
            let store_name = root.store_field_name(variables);
            let mut written = writer.written;
            writer.state.root_mut(document.kind).insert(store_name, stored);
            let root_key = match document.kind {
                OperationKind::Query => CacheKey::root_query(),
                OperationKind::Mutation => CacheKey::root_mutation(),
            };
            written.insert(root_key.as_str().to_string());
            written
        };

        let keys: Vec<CacheKey> = written.into_iter().map(CacheKey::from_raw).collect();
        debug!(operation = %document.name, records = keys.len(), "cache write");
        self.events.publish(&CacheEvent::Written { keys: keys.clone() });
        keys
    }

    /// A copy of the record at `key`.
    #[must_use]
    pub fn read_entity(&self, key: &CacheKey) -> Option<Map<String, Value>> {
        self.state.read().records.get(key.as_str()).cloned()
    }

    /// Returns true if a record exists at `key`.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.read().records.contains_key(key.as_str())
    }

    /// Remove the record at `key`. References to it are left dangling.
    pub fn evict(&self, key: &CacheKey) -> bool {
        let removed = self.state.write().records.remove(key.as_str()).is_some();
        if removed {
            trace!(key = %key, "cache evict");
            self.events.publish(&CacheEvent::Evicted {
                keys: vec![key.clone()],
            });
        }
        removed
    }

    /// Remove every record not reachable from the root records.
    pub fn gc(&self) -> Vec<CacheKey> {
        let removed: Vec<CacheKey> = {
            let mut state = self.state.write();
            let mut reachable: BTreeSet<String> = BTreeSet::new();
            let mut pending: Vec<String> = state
                .records
                .keys()
                .filter(|k| CacheKey::from_raw(k.as_str()).is_root())
                .cloned()
                .collect();
            while let Some(key) = pending.pop() {
                if !reachable.insert(key.clone()) {
                    continue;
                }
                if let Some(record) = state.records.get(&key) {
                    let mut refs = Vec::new();
                    record.values().for_each(|v| collect_references(v, &mut refs));
                    pending.extend(refs);
                }
            }
            let unreachable: Vec<String> = state
                .records
                .keys()
                .filter(|k| !reachable.contains(*k))
                .cloned()
                .collect();
            for key in &unreachable {
                state.records.remove(key);
            }
            unreachable.into_iter().map(CacheKey::from_raw).collect()
        };
        if !removed.is_empty() {
            debug!(records = removed.len(), "cache gc");
            self.events.publish(&CacheEvent::Evicted {
                keys: removed.clone(),
            });
        }
        removed
    }

    /// Serialize every record.
    #[must_use]
    pub fn extract(&self) -> CacheSnapshot {
        self.state
            .read()
            .records
            .iter()
            .map(|(k, v)| (k.clone(), Value::Object(v.clone())))
            .collect()
    }

    /// Replace the cache contents with `snapshot`.
    ///
    /// Entries that are not JSON objects are ignored.
    pub fn restore(&self, snapshot: CacheSnapshot) {
        {
            let mut state = self.state.write();
            state.records = snapshot
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::Object(record) => Some((k, record)),
                    _ => None,
                })
                .collect();
        }
        self.events.publish(&CacheEvent::Reset);
    }

    /// Remove every record.
    pub fn reset(&self) {
        self.state.write().records.clear();
        self.events.publish(&CacheEvent::Reset);
    }

    /// Number of records, roots included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Returns true if the cache holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Subscribe to change events.
    #[must_use]
    pub fn watch(&self) -> CacheWatch {
        self.events.subscribe()
    }

    /// Events dropped because a subscriber queue was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped_events()
    }
}

impl NormalizedCache for InMemoryCache {
    fn read_query(&self, document: &Document, variables: &Value) -> Option<Value> {
        let state = self.state.read();
        let root_key = match document.kind {
            OperationKind::Query => CacheKey::root_query(),
            OperationKind::Mutation => CacheKey::root_mutation(),
        };
        let root_record = state.records.get(root_key.as_str())?;
        let reader = Reader {
            state: &state,
            policies: &self.policies,
            variables,
        };
        let raw = root_record.get(&document.root.store_field_name(variables))?;
        let value = reader.value(raw, &document.root.selection)?;
        let mut out = Map::new();
        out.insert(document.root.name.clone(), value);
        Some(Value::Object(out))
    }

    fn identify(&self, value: &Value) -> Option<CacheKey> {
        self.policies.identify(value)
    }

    fn modify(&self, key: &CacheKey, mut modifiers: Modifiers<'_>) -> bool {
        if modifiers.is_empty() {
            return false;
        }
        let changed_fields: Vec<String> = {
            let mut state = self.state.write();
            let Some(record) = state.records.get_mut(key.as_str()) else {
                return false;
            };
            let mut changed = Vec::new();
            let store_names: Vec<String> = record.keys().cloned().collect();
            for store_name in store_names {
                let field_name = field_name_of(&store_name);
                let Some(modifier) = modifiers.get_mut(field_name) else {
                    continue;
                };
                let Some(current) = record.get(&store_name) else {
                    continue;
                };
                let details = ModifierDetails::new(field_name, &store_name, &self.policies);
                let next = modifier(current, &details);
                if &next != current {
                    record.insert(store_name.clone(), next);
                    changed.push(store_name);
                }
            }
            changed
        };

        if changed_fields.is_empty() {
            return false;
        }
        debug!(key = %key, fields = ?changed_fields, "cache modify");
        self.events.publish(&CacheEvent::Modified {
            key: key.clone(),
            fields: changed_fields,
        });
        true
    }
}
