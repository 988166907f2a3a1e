//! Document trait, collection binding and document lifecycle operations.
//!
//! A document type is declared by implementing [`Document`]: a serde-capable
//! struct plus a `'static` [`Schema`](crate::schema::Schema) and a
//! [`Binding`] resolving which collection (and optionally which database) it
//! persists to. Declaration is an explicit step, typically a `Lazy` static
//! per type, registered once at startup via
//! [`registry::register`](crate::registry::register).
//!
//! # Example
//!
//! ```ignore
//! use docmap_core::prelude::*;
//! use bson::oid::ObjectId;
//! use once_cell::sync::Lazy;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Person {
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//!
//! static SCHEMA: Lazy<Schema> = Lazy::new(|| {
//!     Schema::builder("Person")
//!         .id()
//!         .field("name", FieldKind::String, "")
//!         .build()
//!         .expect("valid schema")
//! });
//!
//! static BINDING: Lazy<Binding> = Lazy::new(|| {
//!     Binding::for_type("Person").build().expect("valid binding")
//! });
//!
//! impl Document for Person {
//!     fn schema() -> &'static Schema { &SCHEMA }
//!     fn binding() -> &'static Binding { &BINDING }
//!     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: Option<ObjectId>) { self.id = id; }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Document as RawRecord, doc, oid::ObjectId, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::backend::StoreBackend;
use crate::config;
use crate::error::{OdmError, OdmResult};
use crate::id::FIELD_ID;
use crate::manager::{Manager, QueryManager};
use crate::materialize::materialize;
use crate::schema::Schema;

/// Core trait every mapped document type implements.
///
/// The identifier is optional until the document is first persisted; once
/// assigned it is stable across saves.
pub trait Document:
    Serialize + DeserializeOwned + Send + Sync + Clone + 'static
{
    /// The type's schema descriptor, computed once at declaration.
    fn schema() -> &'static Schema;

    /// The type's collection binding, computed once at declaration.
    fn binding() -> &'static Binding;

    /// The document's identifier, absent until first persisted.
    fn id(&self) -> Option<&ObjectId>;

    /// Replaces the document's identifier (used by save and bulk create).
    fn set_id(&mut self, id: Option<ObjectId>);

    /// Name of the document type, as carried by the schema.
    fn type_name() -> &'static str {
        Self::schema().type_name()
    }

    /// The default query manager bound to this type — the entry point for
    /// building queries.
    fn objects() -> QueryManager<Self> {
        QueryManager::bind()
    }

    /// Binds an arbitrary manager capability to this type.
    fn manager<M: Manager<Self>>() -> M {
        M::bind()
    }
}

/// Resolves the backend and addressing for a document type at call time.
pub(crate) fn target<D: Document>() -> OdmResult<(String, String, Arc<dyn StoreBackend>)> {
    let backend = config::backend()?;
    let binding = D::binding();
    Ok((binding.database()?, binding.collection().to_string(), backend))
}

/// Per-type binding to a storage collection.
///
/// The collection name defaults to the pluralized snake-case of the type
/// name (`ProductItem` -> `product_items`) and the database to the
/// process-wide configured one; both are overridable at declaration.
#[derive(Debug)]
pub struct Binding {
    collection: String,
    db_override: Option<String>,
}

impl Binding {
    /// Starts a binding declaration for the named type.
    pub fn for_type(type_name: &str) -> BindingBuilder {
        BindingBuilder {
            type_name: type_name.to_string(),
            collection: None,
            db_name: None,
        }
    }

    /// The bound collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The bound database name: the declared override, or the process-wide
    /// configured default.
    pub fn database(&self) -> OdmResult<String> {
        match &self.db_override {
            Some(name) => Ok(name.clone()),
            None => config::database_name(),
        }
    }
}

/// Builder for [`Binding`]; collection-name rules are enforced by
/// [`build`](BindingBuilder::build), at declaration time.
pub struct BindingBuilder {
    type_name: String,
    collection: Option<String>,
    db_name: Option<String>,
}

impl BindingBuilder {
    /// Overrides the derived collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Overrides the process-wide database name for this type.
    pub fn db_name(mut self, name: impl Into<String>) -> Self {
        self.db_name = Some(name.into());
        self
    }

    /// Validates and finalizes the binding.
    pub fn build(self) -> OdmResult<Binding> {
        let collection = self
            .collection
            .unwrap_or_else(|| default_collection_name(&self.type_name));
        validate_collection_name(&collection, &self.type_name)?;

        Ok(Binding {
            collection,
            db_override: self.db_name,
        })
    }
}

/// Derives the default collection name: pluralized snake-case of the type
/// name.
pub fn default_collection_name(type_name: &str) -> String {
    let snake = to_snake_case(type_name);
    if snake.ends_with('s') {
        snake
    } else {
        format!("{snake}s")
    }
}

/// Enforces the store's collection-name restrictions.
pub fn validate_collection_name(collection_name: &str, type_name: &str) -> OdmResult<()> {
    if collection_name.contains('$') {
        return Err(OdmError::InvalidCollectionName(format!(
            "invalid collection name for {type_name}: cannot contain '$'"
        )));
    }
    if collection_name.is_empty() {
        return Err(OdmError::InvalidCollectionName(format!(
            "invalid collection name for {type_name}: cannot be empty"
        )));
    }
    if collection_name.starts_with("system.") {
        return Err(OdmError::InvalidCollectionName(format!(
            "invalid collection name for {type_name}: cannot start with 'system.'"
        )));
    }
    Ok(())
}

fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_numeric());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || next_lower) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Lifecycle operations on a document instance, automatically implemented
/// for every [`Document`].
#[async_trait]
pub trait DocumentOps: Document {
    /// Serializes the document to its wire mapping, rewriting field names to
    /// their aliases, dropping caller-excluded fields, and popping the
    /// identifier out of the payload (callers key on it separately).
    fn to_wire(&self, excluded_fields: &[&str]) -> OdmResult<RawRecord> {
        let serialized = serialize_to_bson(self)?;
        let serialized = serialized.as_document().ok_or_else(|| {
            OdmError::Serialization(format!(
                "{} did not serialize to a document",
                Self::type_name()
            ))
        })?;

        let mut record = RawRecord::new();
        for spec in Self::schema().fields() {
            if spec.name == FIELD_ID || excluded_fields.contains(&spec.name) {
                continue;
            }
            if let Some(value) = serialized.get(spec.name) {
                record.insert(spec.alias.to_string(), value.clone());
            }
        }

        Ok(record)
    }

    /// Persists the document: an upsert-style replace keyed by the
    /// identifier when present, a fresh insert otherwise. The identifier
    /// assigned by the store is adopted either way.
    async fn save(&mut self, excluded_fields: &[&str]) -> OdmResult<()> {
        let payload = self.to_wire(excluded_fields)?;
        let (db, collection, backend) = target::<Self>()?;

        match self.id().copied() {
            Some(oid) => {
                debug!(collection = %collection, id = %oid, "replacing document");
                let outcome = backend
                    .replace_one(&db, &collection, doc! { "_id": oid }, payload, true)
                    .await?;
                if let Some(upserted) = outcome.upserted_id {
                    self.set_id(Some(crate::id::decode(&upserted)?));
                }
            }
            None => {
                debug!(collection = %collection, "inserting document");
                let inserted = backend.insert_one(&db, &collection, payload).await?;
                self.set_id(Some(crate::id::decode(&inserted)?));
            }
        }

        Ok(())
    }

    /// Overwrites all field values from the freshly fetched record,
    /// re-mapping the storage identifier key to the `id` field.
    async fn reload(&mut self) -> OdmResult<()> {
        let oid = *self.id().ok_or_else(|| {
            OdmError::DocumentDoesNotExist("document is not saved in the db".into())
        })?;
        let (db, collection, backend) = target::<Self>()?;

        let record = backend
            .find_one(&db, &collection, doc! { "_id": oid }, None)
            .await?
            .ok_or_else(|| {
                OdmError::DocumentDoesNotExist(format!(
                    "can't reload document with id {oid}, because it doesn't exist"
                ))
            })?;

        *self = materialize::<Self>(&record)?;
        Ok(())
    }

    /// Deletes the single record matching the document's identifier.
    async fn delete(&self) -> OdmResult<()> {
        let oid = *self.id().ok_or_else(|| {
            OdmError::DocumentDoesNotExist("document is not saved in the db".into())
        })?;
        let (db, collection, backend) = target::<Self>()?;

        let deleted = backend
            .delete_one(&db, &collection, doc! { "_id": oid })
            .await?;
        if deleted == 0 {
            return Err(OdmError::DocumentDoesNotExist(format!(
                "can't delete document with id {oid}, because it doesn't exist"
            )));
        }

        Ok(())
    }
}

impl<D: Document> DocumentOps for D {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_cases_type_names() {
        assert_eq!(to_snake_case("Person"), "person");
        assert_eq!(to_snake_case("ProductItem"), "product_item");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn derives_pluralized_collection_names() {
        assert_eq!(default_collection_name("Person"), "persons");
        assert_eq!(default_collection_name("ProductItem"), "product_items");
        assert_eq!(default_collection_name("Address"), "address");
    }

    #[test]
    fn binding_rejects_invalid_collection_names() {
        for bad in ["pe$rson", "", "system.users"] {
            let err = Binding::for_type("Person")
                .collection_name(bad)
                .build()
                .unwrap_err();
            assert!(matches!(err, OdmError::InvalidCollectionName(_)), "{bad}");
        }
    }

    #[test]
    fn binding_defaults_to_pluralized_snake_case() {
        let binding = Binding::for_type("ProductItem").build().unwrap();
        assert_eq!(binding.collection(), "product_items");
    }
}
