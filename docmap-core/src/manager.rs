//! Query managers: accumulation of query intent and its execution.
//!
//! [`QueryManager`] is the builder behind `.objects()`: it accumulates a
//! filter, a projection, and pagination bounds, then executes against the
//! bound collection through the configured backend. Every configuration
//! call clones — the receiver keeps its original state, so chains branching
//! from one manager never contaminate each other.
//!
//! Projection field names are validated against the schema at call time,
//! before any transport call; the two projection modes (inclusion and
//! exclusion) cannot be mixed within one manager, and the identifier can
//! never be excluded.
//!
//! [`CrudManager`] is the bulk helper bound alongside the default query
//! manager; any further manager capability implements [`Manager`].

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use bson::{Bson, Document as RawRecord, doc};
use tracing::debug;

use crate::backend::FindSpec;
use crate::cursor::DocumentCursor;
use crate::document::{Document, DocumentOps, target};
use crate::error::{OdmError, OdmResult};
use crate::id::{FIELD_ID, WIRE_ID};
use crate::materialize::materialize;

/// Capability interface for manager objects bound to a document type.
///
/// Implementing this makes a helper attachable to any document type via
/// [`Document::manager`].
pub trait Manager<D: Document>: Sized {
    /// Creates a manager bound to `D` in its zero state.
    fn bind() -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectionMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
struct Projection {
    mode: ProjectionMode,
    fields: BTreeSet<&'static str>,
}

/// The query builder bound to one document type.
///
/// An empty filter matches all documents; an absent projection returns all
/// fields; an absent limit is unbounded.
pub struct QueryManager<D: Document> {
    filter: RawRecord,
    projection: Option<Projection>,
    skip: Option<u64>,
    limit: Option<u64>,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> Manager<D> for QueryManager<D> {
    fn bind() -> Self {
        Self {
            filter: RawRecord::new(),
            projection: None,
            skip: None,
            limit: None,
            _marker: PhantomData,
        }
    }
}

impl<D: Document> fmt::Debug for QueryManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryManager")
            .field("filter", &self.filter)
            .field("projection", &self.projection)
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<D: Document> Clone for QueryManager<D> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            projection: self.projection.clone(),
            skip: self.skip,
            limit: self.limit,
            _marker: PhantomData,
        }
    }
}

impl<D: Document> Default for QueryManager<D> {
    fn default() -> Self {
        Self::bind()
    }
}

impl<D: Document> QueryManager<D> {
    /// Replaces the filter wholesale (not merged) and returns a new manager.
    ///
    /// The filter maps field names (or wire aliases) to equality or
    /// operator values, e.g. `doc! { "salary": 100.0 }` or
    /// `doc! { "age": { "$gt": 18 } }`.
    pub fn filter(&self, filter: RawRecord) -> Self {
        let mut cloned = self.clone();
        cloned.filter = filter;
        cloned
    }

    /// Restricts the query to the named fields (plus the identifier, which
    /// the store always returns).
    ///
    /// Fields are validated against the schema before any transport call;
    /// repeated calls extend the inclusion set. Fails when a field is
    /// undeclared or when an exclusion projection is already set.
    pub fn only(&self, fields: &[&str]) -> OdmResult<Self> {
        let mut cloned = self.clone();
        let projection = cloned.projection.get_or_insert(Projection {
            mode: ProjectionMode::Include,
            fields: BTreeSet::new(),
        });
        if projection.mode != ProjectionMode::Include {
            return Err(OdmError::InvalidProjection(
                "cannot mix inclusion and exclusion projections in one query".into(),
            ));
        }
        for field in fields {
            projection.fields.insert(declared_name::<D>(field)?);
        }
        Ok(cloned)
    }

    /// Excludes the named fields from query results.
    ///
    /// The identifier field can never be excluded; fields are validated
    /// against the schema before any transport call. Fails when an
    /// inclusion projection is already set.
    pub fn exclude(&self, fields: &[&str]) -> OdmResult<Self> {
        if fields.iter().any(|f| *f == FIELD_ID || *f == WIRE_ID) {
            return Err(OdmError::PrimaryKeyCantBeExcluded);
        }
        let mut cloned = self.clone();
        let projection = cloned.projection.get_or_insert(Projection {
            mode: ProjectionMode::Exclude,
            fields: BTreeSet::new(),
        });
        if projection.mode != ProjectionMode::Exclude {
            return Err(OdmError::InvalidProjection(
                "cannot mix inclusion and exclusion projections in one query".into(),
            ));
        }
        for field in fields {
            projection.fields.insert(declared_name::<D>(field)?);
        }
        Ok(cloned)
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(&self, count: u64) -> Self {
        let mut cloned = self.clone();
        cloned.limit = Some(count);
        cloned
    }

    /// Sets the number of matching documents to skip.
    pub fn skip(&self, skip: u64) -> Self {
        let mut cloned = self.clone();
        cloned.skip = Some(skip);
        cloned
    }

    /// Opens a raw cursor over all matches, with filter, projection, skip
    /// and limit applied.
    pub async fn raw_cursor(&self) -> OdmResult<DocumentCursor<D>> {
        let (db, collection, backend) = target::<D>()?;
        let stream = backend
            .find(
                &db,
                &collection,
                self.filter.clone(),
                FindSpec {
                    projection: self.projection_record(),
                    skip: self.skip,
                    limit: self.limit,
                },
            )
            .await?;
        Ok(DocumentCursor::new(stream))
    }

    /// Fetches and materializes all matches, in natural server order.
    pub async fn all(&self) -> OdmResult<Vec<D>> {
        self.raw_cursor().await?.collect(None).await
    }

    /// Fetches the first match only, or `None` when nothing matches.
    pub async fn first(&self) -> OdmResult<Option<D>> {
        let (db, collection, backend) = target::<D>()?;
        let record = backend
            .find_one(&db, &collection, self.filter.clone(), self.projection_record())
            .await?;
        match record {
            Some(record) => Ok(Some(materialize::<D>(&record)?)),
            None => Ok(None),
        }
    }

    /// Counts matches, applying skip and limit as count parameters when set.
    pub async fn count(&self) -> OdmResult<u64> {
        let (db, collection, backend) = target::<D>()?;
        backend
            .count(&db, &collection, self.filter.clone(), self.skip, self.limit)
            .await
    }

    /// Exact-match lookup by the given fields.
    ///
    /// An `id` key is accepted in either its 24-hex string or native form
    /// and converted to the reserved wire key. Fails with
    /// [`OdmError::DocumentDoesNotExist`] when nothing matches.
    pub async fn get(&self, mut lookup: RawRecord) -> OdmResult<D> {
        if let Some(id_value) = lookup.remove(FIELD_ID) {
            let oid = crate::id::decode(&id_value)?;
            lookup.insert(WIRE_ID.to_string(), Bson::ObjectId(oid));
        }

        let (db, collection, backend) = target::<D>()?;
        let record = backend
            .find_one(&db, &collection, lookup.clone(), self.projection_record())
            .await?
            .ok_or_else(|| {
                OdmError::DocumentDoesNotExist(format!("document with {lookup} doesn't exist"))
            })?;
        materialize::<D>(&record)
    }

    /// Deletes all documents matching the current filter; returns the
    /// number of deleted records.
    pub async fn delete(&self) -> OdmResult<u64> {
        let (db, collection, backend) = target::<D>()?;
        backend
            .delete_many(&db, &collection, self.filter.clone())
            .await
    }

    /// Snapshot of the accumulated state, logged at debug level.
    pub fn explain(&self) -> RawRecord {
        let info = doc! {
            "filter": self.filter.clone(),
            "skip": self.skip.map(|s| s as i64),
            "limit": self.limit.map(|l| l as i64),
            "projection": self.projection_record(),
        };
        debug!(document = D::type_name(), query = %info, "query state");
        info
    }

    /// Translates the projection into its wire form, field names rewritten
    /// to their aliases.
    fn projection_record(&self) -> Option<RawRecord> {
        let projection = self.projection.as_ref()?;
        let marker = match projection.mode {
            ProjectionMode::Include => 1_i32,
            ProjectionMode::Exclude => 0_i32,
        };

        let mut record = RawRecord::new();
        for name in &projection.fields {
            let alias = D::schema().alias_of(name).unwrap_or(name);
            record.insert(alias.to_string(), Bson::Int32(marker));
        }
        Some(record)
    }
}

/// Bulk CRUD helper bound to a document type alongside the default query
/// manager.
pub struct CrudManager<D: Document> {
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> Manager<D> for CrudManager<D> {
    fn bind() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<D: Document> CrudManager<D> {
    /// Inserts a batch of documents and returns them with their
    /// store-assigned identifiers adopted, in input order.
    pub async fn bulk_create(&self, documents: Vec<D>) -> OdmResult<Vec<D>> {
        let records = documents
            .iter()
            .map(|d| d.to_wire(&[]))
            .collect::<OdmResult<Vec<_>>>()?;

        let (db, collection, backend) = target::<D>()?;
        let inserted_ids = backend.insert_many(&db, &collection, records).await?;

        let mut created = documents;
        for (document, id_value) in created.iter_mut().zip(inserted_ids) {
            document.set_id(Some(crate::id::decode(&id_value)?));
        }
        Ok(created)
    }

    /// Deletes documents by id (24-hex string or native form); returns the
    /// number of deleted records.
    pub async fn bulk_delete(&self, ids: Vec<Bson>) -> OdmResult<u64> {
        let ids = ids
            .iter()
            .map(crate::id::decode)
            .collect::<OdmResult<Vec<_>>>()?;

        let (db, collection, backend) = target::<D>()?;
        backend
            .delete_many(&db, &collection, doc! { "_id": { "$in": ids } })
            .await
    }

    /// Drops the bound collection and everything in it.
    pub async fn drop_collection(&self) -> OdmResult<()> {
        let (db, collection, backend) = target::<D>()?;
        backend.drop_collection(&db, &collection).await
    }
}

/// Resolves a projection field name against the schema, yielding its
/// `'static` declared name or failing before any transport call.
fn declared_name<D: Document>(field: &str) -> OdmResult<&'static str> {
    D::schema()
        .field(field)
        .map(|spec| spec.name)
        .ok_or_else(|| OdmError::FieldNotFound(field.to_string(), D::type_name().to_string()))
}
