//! Typed collection handles.
//!
//! [`Collection<T>`] is the factory product every domain module works
//! with: a thin typed facade over the raw record layer in
//! [`crate::context`]. The typing is an intentionally unchecked
//! pass-through — records are stored as plain JSON and decoded on the
//! way out, so a record written under one type can be read under
//! another with the same shape. Stamping (`id`, `created_at`,
//! `updated_at`) is always applied by the store, never trusted from
//! caller input.
//!
//! A record that no longer matches `T` is skipped with a warning
//! rather than failing the whole read.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::context::StoreContext;

/// Typed CRUD/query handle for one named collection.
///
/// Produced by [`StoreContext::collection`]. Handles are independent in
/// typing but share the physical backing key per name: two handles with
/// the same name observe each other's writes.
pub struct Collection<T> {
    ctx: StoreContext,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(ctx: StoreContext, name: String) -> Self {
        Self {
            ctx,
            name,
            _marker: PhantomData,
        }
    }

    /// The logical collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, record: Value) -> Option<T> {
        match serde_json::from_value(record) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(collection = %self.name, error = %err, "skipping record that does not match the collection type");
                None
            }
        }
    }

    /// Every record in the collection, newest first.
    pub fn get_all(&self) -> Vec<T> {
        self.ctx
            .read_collection(&self.name)
            .into_iter()
            .filter_map(|record| self.decode(record))
            .collect()
    }

    /// The record with an exact `id` match.
    pub fn get_by_id(&self, id: &str) -> Option<T> {
        self.ctx
            .find(&self.name, id)
            .and_then(|record| self.decode(record))
    }

    /// First record whose `field` equals `value` (linear scan).
    pub fn get_one_by_field(&self, field: &str, value: impl Into<Value>) -> Option<T> {
        let value = value.into();
        self.ctx
            .read_collection(&self.name)
            .into_iter()
            .find(|record| record.get(field) == Some(&value))
            .and_then(|record| self.decode(record))
    }

    /// Number of records, including any that do not match `T`.
    pub fn count(&self) -> usize {
        self.ctx.read_collection(&self.name).len()
    }

    /// Store `record`, stamped by the store. Returns the stamped record
    /// as read back through `T`; `None` only when the stamped record
    /// cannot round-trip into `T`.
    pub fn create(&self, record: &T) -> Option<T> {
        let raw = match serde_json::to_value(record) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(collection = %self.name, error = %err, "record serialization failed, not stored");
                return None;
            }
        };
        let stamped = self.ctx.create(&self.name, raw);
        self.decode(stamped)
    }

    /// Shallow-merge `patch` over the record with `id`; `None` when no
    /// record matches.
    pub fn update(&self, id: &str, patch: Value) -> Option<T> {
        self.ctx
            .update(&self.name, id, patch)
            .and_then(|record| self.decode(record))
    }

    /// Delete the record with `id`; whether anything was deleted.
    pub fn delete(&self, id: &str) -> bool {
        self.ctx.remove(&self.name, id)
    }

    /// In-memory filter over the whole collection. No indexing.
    pub fn query(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.get_all()
            .into_iter()
            .filter(|record| predicate(record))
            .collect()
    }

    /// Replace the whole collection with `records`, bypassing per-record
    /// stamping. Used for reseeding and migration.
    pub fn set_all(&self, records: &[T]) {
        let mut raw = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::to_value(record) {
                Ok(value) => raw.push(value),
                Err(err) => {
                    warn!(collection = %self.name, error = %err, "record serialization failed, skipped in bulk replace");
                }
            }
        }
        self.ctx.replace_all(&self.name, raw);
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Siswa {
        #[serde(default)]
        id: String,
        nama: String,
        #[serde(default)]
        kelas: String,
        #[serde(default)]
        created_at: String,
        #[serde(default)]
        updated_at: String,
    }

    fn siswa(nama: &str) -> Siswa {
        Siswa {
            id: String::new(),
            nama: nama.to_string(),
            kelas: "XII".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn ctx() -> StoreContext {
        StoreContext::builder().build()
    }

    #[test]
    fn create_and_get_by_id() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");

        let created = collection.create(&siswa("Ahmad")).unwrap();
        assert!(!created.id.is_empty());
        assert!(!created.created_at.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        let fetched = collection.get_by_id(&created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn get_one_by_field_finds_the_first_match() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");
        collection.create(&siswa("Ahmad"));
        collection.create(&siswa("Budi"));

        let found = collection.get_one_by_field("nama", "Budi").unwrap();
        assert_eq!(found.nama, "Budi");
        assert!(collection.get_one_by_field("nama", "Citra").is_none());
    }

    #[test]
    fn update_patches_and_preserves_the_rest() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");
        let created = collection.create(&siswa("Ahmad")).unwrap();

        let updated = collection
            .update(&created.id, json!({"nama": "Ahmad Fauzi"}))
            .unwrap();
        assert_eq!(updated.nama, "Ahmad Fauzi");
        assert_eq!(updated.kelas, "XII");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn delete_twice_reports_true_then_false() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");
        let created = collection.create(&siswa("Ahmad")).unwrap();

        assert!(collection.delete(&created.id));
        assert!(!collection.delete(&created.id));
        assert!(collection.get_by_id(&created.id).is_none());
    }

    #[test]
    fn query_is_a_plain_linear_filter() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");
        collection.create(&siswa("Ahmad"));
        collection.create(&siswa("Budi"));
        collection.create(&siswa("Agus"));

        let starts_with_a = collection.query(|s| s.nama.starts_with('A'));
        assert_eq!(starts_with_a.len(), 2);
    }

    #[test]
    fn set_all_replaces_without_stamping() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");
        collection.create(&siswa("Ahmad"));

        let seed = vec![
            Siswa {
                id: "S-1".into(),
                nama: "Seed".into(),
                kelas: "X".into(),
                created_at: "2024-01-01T00:00:00.000Z".into(),
                updated_at: "2024-01-01T00:00:00.000Z".into(),
            },
        ];
        collection.set_all(&seed);

        let all = collection.get_all();
        assert_eq!(all.len(), 1);
        // Caller-supplied stamps survive a bulk replace untouched.
        assert_eq!(all[0].id, "S-1");
        assert_eq!(all[0].created_at, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn handles_with_the_same_name_share_the_backing_key() {
        let ctx = ctx();
        let writer: Collection<Siswa> = ctx.collection("siswa");
        let reader: Collection<Siswa> = ctx.collection("siswa");

        let created = writer.create(&siswa("Ahmad")).unwrap();
        assert_eq!(reader.count(), 1);
        assert_eq!(reader.get_by_id(&created.id).unwrap().nama, "Ahmad");
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let ctx = ctx();
        let collection: Collection<Siswa> = ctx.collection("siswa");
        collection.create(&siswa("Ahmad"));
        // A record missing the mandatory `nama` field.
        ctx.create("siswa", json!({"bukan": "siswa"}));

        assert_eq!(collection.count(), 2);
        let readable = collection.get_all();
        assert_eq!(readable.len(), 1);
        assert_eq!(readable[0].nama, "Ahmad");
    }
}
