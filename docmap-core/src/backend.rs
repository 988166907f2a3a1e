//! Storage backend abstraction the mapping layer executes against.
//!
//! The [`StoreBackend`] trait is the seam between query intent (accumulated
//! by the query manager) and an actual document store. Implementations exist
//! for MongoDB and for an in-memory store; all of them are addressed by
//! `(database, collection)` pairs and speak raw [`bson::Document`] records,
//! leaving materialization to the core.
//!
//! Every method is async, non-blocking and retry-free: transport faults are
//! wrapped in [`OdmError::Backend`](crate::error::OdmError) with their
//! original message and surface immediately to the caller.

use async_trait::async_trait;
use bson::{Bson, Document as RawRecord};
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::error::OdmResult;

/// A lazy, forward-only stream of raw records pulled from a server-side
/// cursor. Not restartable; concurrent use from multiple tasks is
/// unsupported.
pub type RecordStream = BoxStream<'static, OdmResult<RawRecord>>;

/// Execution options accompanying a find request.
#[derive(Debug, Clone, Default)]
pub struct FindSpec {
    /// Wire-keyed projection document (`{field: 1}` inclusion or
    /// `{field: 0}` exclusion); `None` returns all fields.
    pub projection: Option<RawRecord>,
    /// Number of matching records to skip.
    pub skip: Option<u64>,
    /// Maximum number of records to return; `None` is unbounded.
    pub limit: Option<u64>,
}

/// Result of a replace-with-upsert operation.
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// Number of records the filter matched.
    pub matched: u64,
    /// Id assigned by the store when the replace inserted instead of
    /// matching.
    pub upserted_id: Option<Bson>,
}

/// Abstract interface over a document store.
///
/// Implementations must be thread-safe; the mapping layer shares one backend
/// behind an `Arc` across every document type bound to it.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Opens a raw cursor over records matching `filter`, with projection,
    /// skip and limit applied server-side.
    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        spec: FindSpec,
    ) -> OdmResult<RecordStream>;

    /// Returns the first record matching `filter`, or `None`.
    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        projection: Option<RawRecord>,
    ) -> OdmResult<Option<RawRecord>>;

    /// Counts records matching `filter`, honoring skip/limit as count
    /// parameters when set.
    async fn count(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        skip: Option<u64>,
        limit: Option<u64>,
    ) -> OdmResult<u64>;

    /// Inserts one record and returns the store-assigned id.
    async fn insert_one(
        &self,
        db: &str,
        collection: &str,
        record: RawRecord,
    ) -> OdmResult<Bson>;

    /// Inserts a batch of records and returns their assigned ids, in input
    /// order.
    async fn insert_many(
        &self,
        db: &str,
        collection: &str,
        records: Vec<RawRecord>,
    ) -> OdmResult<Vec<Bson>>;

    /// Replaces the single record matching `filter` with `record`, inserting
    /// it when `upsert` is set and nothing matched.
    async fn replace_one(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        record: RawRecord,
        upsert: bool,
    ) -> OdmResult<ReplaceOutcome>;

    /// Deletes the first record matching `filter`; returns the removal
    /// count (0 or 1).
    async fn delete_one(&self, db: &str, collection: &str, filter: RawRecord) -> OdmResult<u64>;

    /// Deletes every record matching `filter`; returns the removal count.
    async fn delete_many(&self, db: &str, collection: &str, filter: RawRecord) -> OdmResult<u64>;

    /// Drops a collection and all its records.
    async fn drop_collection(&self, db: &str, collection: &str) -> OdmResult<()>;

    /// Closes the backend, releasing connections. Called once on
    /// [`disconnect`](crate::config::disconnect).
    async fn close(&self) -> OdmResult<()> {
        Ok(())
    }
}
