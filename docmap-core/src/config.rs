//! Process-wide store configuration.
//!
//! [`configure`] must be called once, before any document type is used;
//! document types resolve their backend and default database name from this
//! cell at query time. The cell is read-only after configuration during
//! normal operation, so a task aborted mid-await cannot corrupt it;
//! [`disconnect`] is the explicit teardown for process shutdown.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::backend::StoreBackend;
use crate::error::{OdmError, OdmResult};

struct Context {
    backend: Arc<dyn StoreBackend>,
    db_name: String,
}

static CONTEXT: Lazy<RwLock<Option<Context>>> = Lazy::new(|| RwLock::new(None));

/// Configures the backend and default database name used by all document
/// types. Should be called as early as possible, before any document type
/// is declared or queried.
pub fn configure(backend: Arc<dyn StoreBackend>, db_name: impl Into<String>) -> OdmResult<()> {
    let db_name = db_name.into();
    if db_name.is_empty() {
        return Err(OdmError::ImproperlyConfigured(
            "need to supply a valid database name, an empty one was given".into(),
        ));
    }

    *CONTEXT.write() = Some(Context { backend, db_name });
    Ok(())
}

/// Returns the configured backend.
pub fn backend() -> OdmResult<Arc<dyn StoreBackend>> {
    CONTEXT
        .read()
        .as_ref()
        .map(|ctx| Arc::clone(&ctx.backend))
        .ok_or_else(|| {
            OdmError::ImproperlyConfigured(
                "should call configure with a backend before connecting to the database".into(),
            )
        })
}

/// Returns the configured default database name.
pub fn database_name() -> OdmResult<String> {
    CONTEXT
        .read()
        .as_ref()
        .map(|ctx| ctx.db_name.clone())
        .ok_or_else(|| {
            OdmError::ImproperlyConfigured(
                "should call configure before connecting to the database".into(),
            )
        })
}

/// Whether [`configure`] has been called.
pub fn is_configured() -> bool {
    CONTEXT.read().is_some()
}

/// Closes the configured backend and clears the configuration. Should be
/// called when the process tears down.
pub async fn disconnect() -> OdmResult<()> {
    let backend = { CONTEXT.write().take().map(|ctx| ctx.backend) };
    if let Some(backend) = backend {
        backend.close().await?;
    }
    Ok(())
}
