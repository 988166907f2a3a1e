//! Main docmap crate providing an async object-document mapping layer.
//!
//! This crate is the primary entry point for users of the docmap framework.
//! It re-exports the core modules and provides convenient access to the
//! available storage backends.
//!
//! # Features
//!
//! - **Typed documents** - Declare your data structures with Serde, a schema
//!   and a collection binding; get save/reload/delete and a query manager
//! - **Clone-per-call queries** - Builders accumulate filters, projections
//!   and pagination without ever mutating the manager you chained from
//! - **Partial materialization** - Projected reads come back as complete
//!   typed values, absent fields filled from schema defaults
//! - **Multiple backends** - In-memory and MongoDB storage behind one
//!   extensible backend trait
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use docmap::{prelude::*, config, memory::MemoryStore, registry};
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
//! static PERSON_SCHEMA: Lazy<Schema> = Lazy::new(|| {
//!     Schema::builder("Person")
//!         .id()
//!         .field("name", FieldKind::String, "")
//!         .field("age", FieldKind::Int, 0_i64)
//!         .build()
//!         .expect("valid schema")
//! });
//!
//! static PERSON_BINDING: Lazy<Binding> =
//!     Lazy::new(|| Binding::for_type("Person").build().expect("valid binding"));
//!
//! impl Document for Person {
//!     fn schema() -> &'static Schema { &PERSON_SCHEMA }
//!     fn binding() -> &'static Binding { &PERSON_BINDING }
//!     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: Option<ObjectId>) { self.id = id; }
//! }
//!
//! #[tokio::main]
//! async fn main() -> OdmResult<()> {
//!     config::configure(Arc::new(MemoryStore::new()), "appdb")?;
//!     registry::register::<Person>()?;
//!
//!     let mut alice = Person { id: None, name: "Alice".into(), age: 34 };
//!     alice.save(&[]).await?;
//!
//!     let adults = Person::objects()
//!         .filter(doc! { "age": { "$gte": 18 } })
//!         .only(&["name"])?
//!         .all()
//!         .await?;
//!     println!("found {} adults", adults.len());
//!
//!     config::disconnect().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use docmap_core::{
    backend, config, cursor, document, error, id, manager, materialize, registry, schema,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmap_memory::MemoryStore;
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoStore, MongoStoreBuilder};
}
