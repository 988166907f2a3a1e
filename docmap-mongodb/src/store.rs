use async_trait::async_trait;
use bson::{Bson, Document as RawRecord};
use futures::StreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, CountOptions, FindOneOptions, FindOptions},
};
use tracing::debug;

use docmap_core::backend::{FindSpec, RecordStream, ReplaceOutcome, StoreBackend};
use docmap_core::error::{OdmError, OdmResult};

/// MongoDB-backed document store.
///
/// One store wraps one driver client; databases and collections are
/// addressed per call, so a single store serves every document type bound
/// to the cluster.
#[derive(Debug)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Wraps an already-connected driver client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a builder that connects from a connection string.
    pub fn builder(dsn: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(dsn)
    }

    fn get_collection(&self, db: &str, collection: &str) -> MongoCollection<RawRecord> {
        self.client.database(db).collection(collection)
    }
}

fn backend_error(error: mongodb::error::Error) -> OdmError {
    OdmError::Backend(error.to_string())
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        spec: FindSpec,
    ) -> OdmResult<RecordStream> {
        let options = FindOptions::builder()
            .projection(spec.projection)
            .skip(spec.skip)
            .limit(spec.limit.map(|limit| limit as i64))
            .build();

        let cursor = self
            .get_collection(db, collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?;

        Ok(cursor.map(|record| record.map_err(backend_error)).boxed())
    }

    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        projection: Option<RawRecord>,
    ) -> OdmResult<Option<RawRecord>> {
        let options = FindOneOptions::builder().projection(projection).build();

        self.get_collection(db, collection)
            .find_one(filter)
            .with_options(options)
            .await
            .map_err(backend_error)
    }

    async fn count(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        skip: Option<u64>,
        limit: Option<u64>,
    ) -> OdmResult<u64> {
        let options = CountOptions::builder().skip(skip).limit(limit).build();

        self.get_collection(db, collection)
            .count_documents(filter)
            .with_options(options)
            .await
            .map_err(backend_error)
    }

    async fn insert_one(
        &self,
        db: &str,
        collection: &str,
        record: RawRecord,
    ) -> OdmResult<Bson> {
        let result = self
            .get_collection(db, collection)
            .insert_one(record)
            .await
            .map_err(backend_error)?;

        Ok(result.inserted_id)
    }

    async fn insert_many(
        &self,
        db: &str,
        collection: &str,
        records: Vec<RawRecord>,
    ) -> OdmResult<Vec<Bson>> {
        let count = records.len();
        let result = self
            .get_collection(db, collection)
            .insert_many(records)
            .await
            .map_err(backend_error)?;

        // The driver reports assigned ids keyed by input index
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let id = result.inserted_ids.get(&index).cloned().ok_or_else(|| {
                OdmError::Backend(format!("no id reported for inserted record {index}"))
            })?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn replace_one(
        &self,
        db: &str,
        collection: &str,
        filter: RawRecord,
        record: RawRecord,
        upsert: bool,
    ) -> OdmResult<ReplaceOutcome> {
        let result = self
            .get_collection(db, collection)
            .replace_one(filter, record)
            .upsert(upsert)
            .await
            .map_err(backend_error)?;

        Ok(ReplaceOutcome {
            matched: result.matched_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(&self, db: &str, collection: &str, filter: RawRecord) -> OdmResult<u64> {
        let result = self
            .get_collection(db, collection)
            .delete_one(filter)
            .await
            .map_err(backend_error)?;

        Ok(result.deleted_count)
    }

    async fn delete_many(&self, db: &str, collection: &str, filter: RawRecord) -> OdmResult<u64> {
        let result = self
            .get_collection(db, collection)
            .delete_many(filter)
            .await
            .map_err(backend_error)?;

        Ok(result.deleted_count)
    }

    async fn drop_collection(&self, db: &str, collection: &str) -> OdmResult<()> {
        self.get_collection(db, collection)
            .drop()
            .await
            .map_err(backend_error)
    }

    async fn close(&self) -> OdmResult<()> {
        debug!("shutting down mongodb client");
        self.client.clone().shutdown().await;
        Ok(())
    }
}

/// Builder connecting a [`MongoStore`] from a connection string.
pub struct MongoStoreBuilder {
    dsn: String,
}

impl MongoStoreBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
        }
    }

    /// Parses the connection string and connects the driver client.
    pub async fn build(self) -> OdmResult<MongoStore> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| OdmError::ImproperlyConfigured(e.to_string()))?;
        let client =
            Client::with_options(options).map_err(|e| OdmError::ImproperlyConfigured(e.to_string()))?;

        debug!("mongodb client connected");
        Ok(MongoStore::new(client))
    }
}
