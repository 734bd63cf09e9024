//! Storage core: versioned namespacing, envelopes, stamped CRUD.
//!
//! [`StoreContext`] is the single entry point to the persistence layer.
//! It is constructed once at application start and handed to every
//! consumer — there is no module-level singleton. Each collection is
//! persisted as one [`Envelope`] (a complete snapshot plus a last-write
//! timestamp) under one versioned key, and every mutation is a full
//! read-modify-write of that snapshot.
//!
//! Failure semantics: medium and serialization failures are caught
//! here, logged, and degraded — a failed read yields an empty
//! collection, a failed write is dropped. Callers treat every write as
//! best-effort; nothing in this module panics or propagates storage
//! errors.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bus::{ChangeBus, ChangeEvent, Subscription};
use crate::collection::Collection;
use crate::medium::{MemoryMedium, Medium};

/// Schema version baked into every physical key. Bumping it orphans
/// data written under previous versions; there is no migration.
pub const SCHEMA_VERSION: &str = "v3";

/// Application prefix shared by every physical key.
const KEY_PREFIX: &str = "magang";

/// The persisted unit for one collection: the full snapshot plus the
/// epoch-millisecond time of the last write. A collection is always
/// stored whole, never as deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Every record in the collection.
    pub data: Vec<Value>,
    /// Epoch milliseconds of the last write.
    pub timestamp: i64,
}

/// Current time as an RFC 3339 string with millisecond precision — the
/// format of every `created_at` / `updated_at` stamp.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn epoch_ms_now() -> i64 {
    Utc::now().timestamp_millis()
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

// ---------------------------------------------------------------------------
// StoreContext
// ---------------------------------------------------------------------------

/// Handle to the embedded store. Cheaply cloneable; clones share the
/// same medium, schema version, and change bus.
#[derive(Clone)]
pub struct StoreContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    medium: Arc<dyn Medium>,
    version: String,
    bus: ChangeBus,
}

impl StoreContext {
    /// Start building a context. Defaults to a [`MemoryMedium`] and
    /// [`SCHEMA_VERSION`].
    pub fn builder() -> StoreContextBuilder {
        StoreContextBuilder::default()
    }

    /// Create a context over `medium` with the default schema version.
    pub fn new(medium: Arc<dyn Medium>) -> Self {
        Self::builder().medium(medium).build()
    }

    /// A globally unique record identifier (UUID v7).
    pub fn generate_id() -> String {
        Uuid::now_v7().to_string()
    }

    /// The physical key for a logical collection name. Deterministic
    /// within a schema version; versions never collide.
    pub fn namespaced_key(&self, name: &str) -> String {
        format!("{KEY_PREFIX}.{}.{name}", self.inner.version)
    }

    fn key_namespace(&self) -> String {
        format!("{KEY_PREFIX}.{}.", self.inner.version)
    }

    /// A typed handle over the collection `name`. Two handles with the
    /// same name share the backing key and observe each other's writes.
    pub fn collection<T>(&self, name: impl Into<String>) -> Collection<T>
    where
        T: Serialize + DeserializeOwned,
    {
        Collection::new(self.clone(), name.into())
    }

    // ── raw collection primitives ────────────────────────────────────

    /// Read the full snapshot for `name`. An absent key, a failed read,
    /// or a corrupt envelope all degrade to an empty collection.
    pub fn read_collection(&self, name: &str) -> Vec<Value> {
        let key = self.namespaced_key(name);
        let raw = match self.inner.medium.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(collection = name, error = %err, "medium read failed, treating collection as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Envelope>(&raw) {
            Ok(envelope) => envelope.data,
            Err(err) => {
                warn!(collection = name, error = %err, "corrupt envelope, treating collection as empty");
                Vec::new()
            }
        }
    }

    /// Persist `items` as the complete snapshot for `name`. Best-effort:
    /// returns whether the write landed.
    pub fn write_collection(&self, name: &str, items: Vec<Value>) -> bool {
        let key = self.namespaced_key(name);
        let envelope = Envelope {
            data: items,
            timestamp: epoch_ms_now(),
        };

        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(collection = name, error = %err, "envelope serialization failed, dropping write");
                return false;
            }
        };

        match self.inner.medium.set(&key, &raw) {
            Ok(()) => true,
            Err(err) => {
                warn!(collection = name, error = %err, "medium write failed, dropping write");
                false
            }
        }
    }

    /// Create a record in `name`.
    ///
    /// Stamps `id` (kept if the caller supplied a non-empty one,
    /// generated otherwise), `created_at`, and `updated_at`, prepends
    /// the record to the snapshot, persists, and notifies subscribers.
    /// The stamped record is returned even when the write was dropped.
    pub fn create(&self, name: &str, record: Value) -> Value {
        let mut object = match record {
            Value::Object(object) => object,
            other => {
                warn!(collection = name, "create requires a JSON object, record not stored");
                return other;
            }
        };

        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Self::generate_id(),
        };
        let now = iso_now();
        object.insert("id".into(), json!(id));
        object.insert("created_at".into(), json!(now));
        object.insert("updated_at".into(), json!(now));
        let record = Value::Object(object);

        let mut items = self.read_collection(name);
        items.insert(0, record.clone());

        if self.write_collection(name, items) {
            debug!(collection = name, id = %id, "record created");
            self.inner
                .bus
                .publish(name, &ChangeEvent::Upserted(Arc::new(record.clone())));
        }
        record
    }

    /// Merge `patch` over the record with `id` in `name`.
    ///
    /// A shallow field-by-field merge; `id` and `created_at` are
    /// preserved even when the patch tries to change them, and
    /// `updated_at` is refreshed. Returns `None` when no record
    /// matches — an expected outcome, not an error.
    pub fn update(&self, name: &str, id: &str, patch: Value) -> Option<Value> {
        let mut items = self.read_collection(name);
        let position = items.iter().position(|item| record_id(item) == Some(id))?;

        let mut merged = match items[position].take() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let created_at = merged.get("created_at").cloned();

        match patch {
            Value::Object(fields) => {
                for (field, value) in fields {
                    merged.insert(field, value);
                }
            }
            other => {
                warn!(collection = name, id, "non-object patch ignored: {other}");
            }
        }

        merged.insert("id".into(), json!(id));
        if let Some(created_at) = created_at {
            merged.insert("created_at".into(), created_at);
        }
        merged.insert("updated_at".into(), json!(iso_now()));

        let record = Value::Object(merged);
        items[position] = record.clone();

        if self.write_collection(name, items) {
            debug!(collection = name, id, "record updated");
            self.inner
                .bus
                .publish(name, &ChangeEvent::Upserted(Arc::new(record.clone())));
        }
        Some(record)
    }

    /// Remove the record with `id` from `name`. Returns whether a
    /// record was actually deleted; nothing is written when no record
    /// matched.
    pub fn remove(&self, name: &str, id: &str) -> bool {
        let mut items = self.read_collection(name);
        let before = items.len();
        items.retain(|item| record_id(item) != Some(id));
        if items.len() == before {
            return false;
        }

        if self.write_collection(name, items) {
            debug!(collection = name, id, "record removed");
            self.inner
                .bus
                .publish(name, &ChangeEvent::Removed { id: id.to_string() });
            true
        } else {
            false
        }
    }

    /// First record in `name` with an exact `id` match.
    pub fn find(&self, name: &str, id: &str) -> Option<Value> {
        self.read_collection(name)
            .into_iter()
            .find(|item| record_id(item) == Some(id))
    }

    /// Replace the whole snapshot for `name` without per-record
    /// stamping (bulk reseed). Subscribers receive a reload marker.
    pub fn replace_all(&self, name: &str, items: Vec<Value>) {
        let count = items.len();
        if self.write_collection(name, items) {
            debug!(collection = name, count, "collection replaced");
            self.inner.bus.publish(name, &ChangeEvent::Reloaded);
        }
    }

    // ── single-value storage (reserved keys) ─────────────────────────

    /// Read a single reserved value (e.g. the session) stored under
    /// `name`. Absent, unreadable, or corrupt values degrade to `None`.
    pub fn read_value<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = self.namespaced_key(name);
        let raw = match self.inner.medium.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %key, error = %err, "medium read failed, treating value as absent");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %key, error = %err, "corrupt value, treating as absent");
                None
            }
        }
    }

    /// Store a single reserved value under `name`. Best-effort: returns
    /// whether the write landed.
    pub fn write_value<T: Serialize>(&self, name: &str, value: &T) -> bool {
        let key = self.namespaced_key(name);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %key, error = %err, "value serialization failed, dropping write");
                return false;
            }
        };
        match self.inner.medium.set(&key, &raw) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %key, error = %err, "medium write failed, dropping write");
                false
            }
        }
    }

    /// Remove the reserved value under `name`. Idempotent.
    pub fn remove_value(&self, name: &str) {
        let key = self.namespaced_key(name);
        if let Err(err) = self.inner.medium.remove(&key) {
            warn!(key = %key, error = %err, "medium remove failed");
        }
    }

    // ── notification ─────────────────────────────────────────────────

    /// Register `callback` for changes to `name`. The callback runs on
    /// the mutating thread before the mutating call returns.
    pub fn subscribe(
        &self,
        name: &str,
        callback: impl Fn(&str, &ChangeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.bus.subscribe(name, callback)
    }

    /// Number of active subscribers for `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.inner.bus.subscriber_count(name)
    }

    // ── maintenance ──────────────────────────────────────────────────

    /// Remove every physical key under the current schema-version
    /// prefix — and only those. Used for full resets.
    pub fn clear_namespace(&self) {
        let prefix = self.key_namespace();
        let keys = match self.inner.medium.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "medium key enumeration failed, namespace not cleared");
                return;
            }
        };

        let mut removed = 0usize;
        for key in keys.iter().filter(|key| key.starts_with(&prefix)) {
            match self.inner.medium.remove(key) {
                Ok(()) => removed += 1,
                Err(err) => warn!(key = %key, error = %err, "medium remove failed"),
            }
        }
        info!(removed, "namespace cleared");
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`StoreContext`].
#[derive(Default)]
pub struct StoreContextBuilder {
    medium: Option<Arc<dyn Medium>>,
    version: Option<String>,
}

impl StoreContextBuilder {
    /// Use `medium` as the backing store.
    pub fn medium(mut self, medium: Arc<dyn Medium>) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Override the schema version segment of every physical key.
    pub fn schema_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Build the context.
    pub fn build(self) -> StoreContext {
        StoreContext {
            inner: Arc::new(ContextInner {
                medium: self.medium.unwrap_or_else(|| Arc::new(MemoryMedium::new())),
                version: self.version.unwrap_or_else(|| SCHEMA_VERSION.to_string()),
                bus: ChangeBus::default(),
            }),
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
