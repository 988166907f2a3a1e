//! An async object-document mapping layer over document stores.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Document traits** ([`document`]) - Declaring mapped document types, collection
//!   bindings and instance lifecycle operations (save, reload, delete)
//! - **Query managers** ([`manager`]) - Clone-per-call query builders bound to each
//!   document type, plus bulk CRUD helpers
//! - **Cursors** ([`cursor`]) - Lazy typed iteration over raw record streams
//! - **Materialization** ([`materialize`]) - Turning partial raw records into complete
//!   typed documents without validation round-trips
//! - **Schemas** ([`schema`]) - Per-type field descriptors driving materialization,
//!   projection validation and alias mapping
//! - **Identifier codec** ([`id`]) - The `id`/`_id` boundary between field names and
//!   wire names
//! - **Store backend abstraction** ([`backend`]) - The async seam implemented by each
//!   storage backend
//! - **Configuration** ([`config`]) - The process-wide backend and database cell
//! - **Registry** ([`registry`]) - Explicit startup registration of document types
//! - **Error handling** ([`error`]) - The unified error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmap_core::prelude::*;
//! use bson::{doc, oid::ObjectId};
//! use once_cell::sync::Lazy;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Person {
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//!     pub age: i64,
//! }
//!
//! static SCHEMA: Lazy<Schema> = Lazy::new(|| {
//!     Schema::builder("Person")
//!         .id()
//!         .field("name", FieldKind::String, "")
//!         .field("age", FieldKind::Int, 0_i64)
//!         .build()
//!         .expect("valid schema")
//! });
//!
//! static BINDING: Lazy<Binding> =
//!     Lazy::new(|| Binding::for_type("Person").build().expect("valid binding"));
//!
//! impl Document for Person {
//!     fn schema() -> &'static Schema { &SCHEMA }
//!     fn binding() -> &'static Binding { &BINDING }
//!     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: Option<ObjectId>) { self.id = id; }
//! }
//!
//! // after docmap_core::config::configure(backend, "mydb"):
//! let adults = Person::objects()
//!     .filter(doc! { "age": { "$gte": 18 } })
//!     .only(&["name"])?
//!     .all()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod backend;
pub mod config;
pub mod cursor;
pub mod document;
pub mod error;
pub mod id;
pub mod manager;
pub mod materialize;
pub mod registry;
pub mod schema;

/// Commonly used items, glob-importable from downstream crates.
pub mod prelude {
    pub use crate::cursor::DocumentCursor;
    pub use crate::document::{Binding, Document, DocumentOps};
    pub use crate::error::{OdmError, OdmResult};
    pub use crate::manager::{CrudManager, Manager, QueryManager};
    pub use crate::materialize::Materialized;
    pub use crate::schema::{FieldDefault, FieldKind, FieldSpec, Schema};
}
