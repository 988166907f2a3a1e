//! Configuration lifecycle, isolated in its own test binary because it
//! exercises the unconfigured state of the process-wide cell.

use std::sync::Arc;

use bson::oid::ObjectId;
use docmap::config;
use docmap::memory::MemoryStore;
use docmap::prelude::*;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Note {
    id: Option<ObjectId>,
    body: String,
}

static NOTE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Note")
        .id()
        .field("body", FieldKind::String, "")
        .build()
        .unwrap()
});

static NOTE_BINDING: Lazy<Binding> = Lazy::new(|| Binding::for_type("Note").build().unwrap());

impl Document for Note {
    fn schema() -> &'static Schema {
        &NOTE_SCHEMA
    }

    fn binding() -> &'static Binding {
        &NOTE_BINDING
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }
}

// One test controls the whole lifecycle; ordering matters for the global
// cell, so the stages can't be separate parallel tests.
#[tokio::test]
async fn configure_then_disconnect_lifecycle() {
    assert!(!config::is_configured());

    let err = Note::objects().count().await.unwrap_err();
    assert!(matches!(err, OdmError::ImproperlyConfigured(_)));

    let mut unsaved = Note {
        id: None,
        body: "draft".into(),
    };
    let err = unsaved.save(&[]).await.unwrap_err();
    assert!(matches!(err, OdmError::ImproperlyConfigured(_)));

    let err = config::configure(Arc::new(MemoryStore::new()), "").unwrap_err();
    assert!(matches!(err, OdmError::ImproperlyConfigured(_)));
    assert!(!config::is_configured());

    config::configure(Arc::new(MemoryStore::new()), "testdb").unwrap();
    assert!(config::is_configured());

    unsaved.save(&[]).await.unwrap();
    assert_eq!(Note::objects().count().await.unwrap(), 1);

    config::disconnect().await.unwrap();
    assert!(!config::is_configured());

    let err = Note::objects().count().await.unwrap_err();
    assert!(matches!(err, OdmError::ImproperlyConfigured(_)));
}
