//! Convenient re-exports of commonly used types from docmap.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```
//!
//! This provides access to:
//! - Document declaration traits and lifecycle operations
//! - Query managers and cursors
//! - Schema descriptors and field kinds
//! - The backend trait and error types

pub use docmap_core::{
    backend::{FindSpec, RecordStream, ReplaceOutcome, StoreBackend},
    cursor::DocumentCursor,
    document::{Binding, Document, DocumentOps},
    error::{OdmError, OdmResult},
    manager::{CrudManager, Manager, QueryManager},
    materialize::Materialized,
    schema::{FieldDefault, FieldKind, FieldSpec, Schema},
};
