//! In-memory storage backend for the docmap framework.
//!
//! Provides [`MemoryStore`], a [`StoreBackend`](docmap_core::backend::StoreBackend)
//! implementation that keeps all records in process memory behind async-aware
//! read-write locks. It honors the same filter dialect, projection semantics
//! and id assignment rules as the MongoDB backend, which makes it the natural
//! substrate for tests and local development.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap_core::config;
//! use docmap_memory::MemoryStore;
//!
//! config::configure(Arc::new(MemoryStore::new()), "testdb")?;
//! ```

mod matcher;
mod store;

pub use store::MemoryStore;
