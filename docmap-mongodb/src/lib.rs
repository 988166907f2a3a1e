//! MongoDB backend implementation for docmap.
//!
//! This crate provides a MongoDB-based implementation of the
//! [`StoreBackend`](docmap_core::backend::StoreBackend) trait, enabling
//! persistent document storage behind the mapping layer.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmap = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The store connects from a standard MongoDB connection string through the
//! builder pattern; databases and collections are addressed per call, so one
//! client serves every bound document type.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap_core::config;
//! use docmap_mongodb::MongoStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoStore::builder("mongodb://localhost:27017")
//!         .build()
//!         .await?;
//!     config::configure(Arc::new(store), "my_database")?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_mongodb;

pub mod store;

pub use store::{MongoStore, MongoStoreBuilder};
