//! In-memory storage backend.
//!
//! Records are kept as raw BSON documents in per-collection vectors behind an
//! async-aware read-write lock, preserving insertion order so that unsorted
//! reads come back in the order records were written. Every query scans the
//! whole collection; intended for tests and development, not large datasets.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Document as RawRecord, oid::ObjectId};
use futures::StreamExt;
use mea::rwlock::RwLock;

use docmap_core::backend::{FindSpec, RecordStream, ReplaceOutcome, StoreBackend};
use docmap_core::error::OdmResult;
use docmap_core::id::WIRE_ID;

use crate::matcher::matches;

type CollectionVec = Vec<RawRecord>;
type DatabaseMap = HashMap<String, CollectionVec>;
type StoreMap = HashMap<String, DatabaseMap>;

/// Thread-safe in-memory document store.
///
/// Cloneable; clones share the same underlying data through an `Arc`, so one
/// store can back every document type in a process.
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Total number of records in a collection, ignoring any filter.
    pub async fn collection_len(&self, db: &str, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(db)
            .and_then(|database| database.get(collection))
            .map_or(0, Vec::len)
    }
}

/// Ensures a record carries a wire id, assigning a fresh one when absent;
/// returns the id either way.
fn claim_id(record: &mut RawRecord) -> Bson {
    match record.get(WIRE_ID) {
        Some(id) => id.clone(),
        None => {
            let id = Bson::ObjectId(ObjectId::new());
            record.insert(WIRE_ID.to_string(), id.clone());
            id
        }
    }
}

/// Applies a wire projection to a record. Inclusion keeps the marked fields
/// plus the id; exclusion drops the marked fields.
fn project(record: &RawRecord, projection: Option<&RawRecord>) -> RawRecord {
    let Some(projection) = projection else {
        return record.clone();
    };

    let include = projection.values().any(|marker| {
        !matches!(
            marker,
            Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false)
        )
    });

    if include {
        record
            .iter()
            .filter(|(key, _)| key.as_str() == WIRE_ID || projection.contains_key(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    } else {
        record
            .iter()
            .filter(|(key, _)| !projection.contains_key(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        spec: FindSpec,
    ) -> OdmResult<RecordStream> {
        let store = self.store.read().await;
        let records: Vec<OdmResult<RawRecord>> = store
            .get(db)
            .and_then(|database| database.get(collection))
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches(record, &filter))
                    .skip(spec.skip.unwrap_or(0) as usize)
                    .take(spec.limit.map_or(usize::MAX, |limit| limit as usize))
                    .map(|record| Ok(project(record, spec.projection.as_ref())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(futures::stream::iter(records).boxed())
    }

    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        projection: Option<RawRecord>,
    ) -> OdmResult<Option<RawRecord>> {
        let store = self.store.read().await;
        Ok(store
            .get(db)
            .and_then(|database| database.get(collection))
            .and_then(|records| records.iter().find(|record| matches(record, &filter)))
            .map(|record| project(record, projection.as_ref())))
    }

    async fn count(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        skip: Option<u64>,
        limit: Option<u64>,
    ) -> OdmResult<u64> {
        let store = self.store.read().await;
        let matched = store
            .get(db)
            .and_then(|database| database.get(collection))
            .map_or(0, |records| {
                records.iter().filter(|record| matches(record, &filter)).count() as u64
            });

        let after_skip = matched.saturating_sub(skip.unwrap_or(0));
        Ok(limit.map_or(after_skip, |limit| after_skip.min(limit)))
    }

    async fn insert_one(
        &self,
        db: &str,
        collection: &str,
        mut record: RawRecord,
    ) -> OdmResult<Bson> {
        let id = claim_id(&mut record);

        let mut store = self.store.write().await;
        store
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .push(record);

        Ok(id)
    }

    async fn insert_many(
        &self,
        db: &str,
        collection: &str,
        records: Vec<RawRecord>,
    ) -> OdmResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let stored = store
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        let mut ids = Vec::with_capacity(records.len());
        for mut record in records {
            ids.push(claim_id(&mut record));
            stored.push(record);
        }

        Ok(ids)
    }

    async fn replace_one(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        mut record: RawRecord,
        upsert: bool,
    ) -> OdmResult<ReplaceOutcome> {
        let mut store = self.store.write().await;
        let stored = store
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if let Some(existing) = stored.iter_mut().find(|record| matches(record, &filter)) {
            // The replacement keeps the matched record's id
            if let Some(id) = existing.get(WIRE_ID) {
                record.insert(WIRE_ID.to_string(), id.clone());
            }
            *existing = record;
            return Ok(ReplaceOutcome {
                matched: 1,
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(ReplaceOutcome {
                matched: 0,
                upserted_id: None,
            });
        }

        // Upsert path: adopt an id the filter pins down, otherwise mint one
        if let Some(id) = filter.get(WIRE_ID) {
            record.insert(WIRE_ID.to_string(), id.clone());
        }
        let id = claim_id(&mut record);
        stored.push(record);

        Ok(ReplaceOutcome {
            matched: 0,
            upserted_id: Some(id),
        })
    }

    async fn delete_one(&self, db: &str, collection: &str, filter: RawRecord) -> OdmResult<u64> {
        let mut store = self.store.write().await;
        let Some(stored) = store
            .get_mut(db)
            .and_then(|database| database.get_mut(collection))
        else {
            return Ok(0);
        };

        match stored.iter().position(|record| matches(record, &filter)) {
            Some(index) => {
                stored.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, db: &str, collection: &str, filter: RawRecord) -> OdmResult<u64> {
        let mut store = self.store.write().await;
        let Some(stored) = store
            .get_mut(db)
            .and_then(|database| database.get_mut(collection))
        else {
            return Ok(0);
        };

        let before = stored.len();
        stored.retain(|record| !matches(record, &filter));
        Ok((before - stored.len()) as u64)
    }

    async fn drop_collection(&self, db: &str, collection: &str) -> OdmResult<()> {
        let mut store = self.store.write().await;
        if let Some(database) = store.get_mut(db) {
            database.remove(collection);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[tokio::test]
    async fn insert_assigns_and_returns_ids() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("testdb", "users", doc! { "name": "ann" })
            .await
            .unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));
        assert_eq!(store.collection_len("testdb", "users").await, 1);
    }

    #[tokio::test]
    async fn find_preserves_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5_i64 {
            store
                .insert_one("testdb", "items", doc! { "rank": i })
                .await
                .unwrap();
        }

        let mut stream = store
            .find("testdb", "items", doc! {}, FindSpec::default())
            .await
            .unwrap();

        let mut ranks = Vec::new();
        while let Some(record) = stream.next().await {
            ranks.push(record.unwrap().get_i64("rank").unwrap());
        }
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn find_applies_skip_and_limit() {
        let store = MemoryStore::new();
        for i in 0..10_i64 {
            store
                .insert_one("testdb", "items", doc! { "rank": i })
                .await
                .unwrap();
        }

        let mut stream = store
            .find(
                "testdb",
                "items",
                doc! {},
                FindSpec {
                    projection: None,
                    skip: Some(2),
                    limit: Some(3),
                },
            )
            .await
            .unwrap();

        let mut ranks = Vec::new();
        while let Some(record) = stream.next().await {
            ranks.push(record.unwrap().get_i64("rank").unwrap());
        }
        assert_eq!(ranks, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn inclusion_projection_keeps_the_id() {
        let store = MemoryStore::new();
        store
            .insert_one("testdb", "users", doc! { "name": "ann", "age": 30_i64 })
            .await
            .unwrap();

        let record = store
            .find_one(
                "testdb",
                "users",
                doc! {},
                Some(doc! { "name": 1_i32 }),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(record.contains_key("_id"));
        assert!(record.contains_key("name"));
        assert!(!record.contains_key("age"));
    }

    #[tokio::test]
    async fn exclusion_projection_drops_marked_fields() {
        let store = MemoryStore::new();
        store
            .insert_one("testdb", "users", doc! { "name": "ann", "age": 30_i64 })
            .await
            .unwrap();

        let record = store
            .find_one("testdb", "users", doc! {}, Some(doc! { "age": 0_i32 }))
            .await
            .unwrap()
            .unwrap();

        assert!(record.contains_key("_id"));
        assert!(record.contains_key("name"));
        assert!(!record.contains_key("age"));
    }

    #[tokio::test]
    async fn count_honors_skip_and_limit() {
        let store = MemoryStore::new();
        for i in 0..10_i64 {
            store
                .insert_one("testdb", "items", doc! { "rank": i })
                .await
                .unwrap();
        }

        let total = store
            .count("testdb", "items", doc! {}, None, None)
            .await
            .unwrap();
        assert_eq!(total, 10);

        let bounded = store
            .count("testdb", "items", doc! {}, Some(4), Some(3))
            .await
            .unwrap();
        assert_eq!(bounded, 3);

        let skipped_past_end = store
            .count("testdb", "items", doc! {}, Some(20), None)
            .await
            .unwrap();
        assert_eq!(skipped_past_end, 0);
    }

    #[tokio::test]
    async fn replace_keeps_the_matched_records_id() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("testdb", "users", doc! { "name": "ann" })
            .await
            .unwrap();

        let outcome = store
            .replace_one(
                "testdb",
                "users",
                doc! { "_id": id.clone() },
                doc! { "name": "anna" },
                true,
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched, 1);
        assert!(outcome.upserted_id.is_none());

        let record = store
            .find_one("testdb", "users", doc! { "_id": id }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.get_str("name").unwrap(), "anna");
        assert_eq!(store.collection_len("testdb", "users").await, 1);
    }

    #[tokio::test]
    async fn replace_upserts_under_the_filter_id() {
        let store = MemoryStore::new();
        let oid = ObjectId::new();

        let outcome = store
            .replace_one(
                "testdb",
                "users",
                doc! { "_id": oid },
                doc! { "name": "bob" },
                true,
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.upserted_id, Some(Bson::ObjectId(oid)));
        assert_eq!(store.collection_len("testdb", "users").await, 1);
    }

    #[tokio::test]
    async fn delete_counts_removed_records() {
        let store = MemoryStore::new();
        for name in ["ann", "bob", "ann"] {
            store
                .insert_one("testdb", "users", doc! { "name": name })
                .await
                .unwrap();
        }

        let removed = store
            .delete_one("testdb", "users", doc! { "name": "ann" })
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let removed = store
            .delete_many("testdb", "users", doc! {})
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let removed = store
            .delete_many("testdb", "users", doc! {})
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn databases_are_isolated() {
        let store = MemoryStore::new();
        store
            .insert_one("db_a", "users", doc! { "name": "ann" })
            .await
            .unwrap();

        let found = store
            .find_one("db_b", "users", doc! {}, None)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn drop_collection_is_idempotent() {
        let store = MemoryStore::new();
        store
            .insert_one("testdb", "users", doc! { "name": "ann" })
            .await
            .unwrap();

        store.drop_collection("testdb", "users").await.unwrap();
        assert_eq!(store.collection_len("testdb", "users").await, 0);
        store.drop_collection("testdb", "users").await.unwrap();
    }
}
