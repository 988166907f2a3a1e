//! Process-wide registry of declared document types.
//!
//! Registration is an explicit startup step: each document type is entered
//! once, keyed by its type name, so binding collisions surface at boot
//! instead of as silent cross-writes at query time.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::document::Document;
use crate::error::{OdmError, OdmResult};

/// Registration record kept per document type.
#[derive(Debug, Clone)]
pub struct Registration {
    type_name: &'static str,
    collection: String,
}

impl Registration {
    /// Name of the registered document type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Collection the type is bound to.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

static REGISTRY: Lazy<RwLock<BTreeMap<&'static str, Registration>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Registers a document type under its type name.
///
/// Fails with [`OdmError::AlreadyRegistered`] when the name is taken; the
/// existing registration is left untouched.
pub fn register<D: Document>() -> OdmResult<()> {
    let type_name = D::type_name();
    let mut registry = REGISTRY.write();
    if registry.contains_key(type_name) {
        return Err(OdmError::AlreadyRegistered(format!(
            "document type {type_name} is already registered"
        )));
    }
    registry.insert(
        type_name,
        Registration {
            type_name,
            collection: D::binding().collection().to_string(),
        },
    );
    Ok(())
}

/// Whether a type name is currently registered.
pub fn is_registered(type_name: &str) -> bool {
    REGISTRY.read().contains_key(type_name)
}

/// Looks up the registration record for a type name.
pub fn registration(type_name: &str) -> Option<Registration> {
    REGISTRY.read().get(type_name).cloned()
}

/// Names of all registered types, in lexical order.
pub fn registered_types() -> Vec<&'static str> {
    REGISTRY.read().keys().copied().collect()
}

/// Removes a single registration; returns whether it existed.
pub fn unregister(type_name: &str) -> bool {
    REGISTRY.write().remove(type_name).is_some()
}

/// Empties the registry. Intended for tests and full reconfiguration.
pub fn clear() {
    REGISTRY.write().clear();
}

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;
    use once_cell::sync::Lazy;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::document::Binding;
    use crate::schema::{FieldKind, Schema};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ticket {
        id: Option<ObjectId>,
        subject: String,
    }

    static SCHEMA: Lazy<Schema> = Lazy::new(|| {
        Schema::builder("Ticket")
            .id()
            .field("subject", FieldKind::String, "")
            .build()
            .unwrap()
    });

    static BINDING: Lazy<Binding> = Lazy::new(|| Binding::for_type("Ticket").build().unwrap());

    impl Document for Ticket {
        fn schema() -> &'static Schema {
            &SCHEMA
        }

        fn binding() -> &'static Binding {
            &BINDING
        }

        fn id(&self) -> Option<&ObjectId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: Option<ObjectId>) {
            self.id = id;
        }
    }

    // Single test since the registry is process-global state.
    #[test]
    fn registration_lifecycle() {
        clear();
        assert!(!is_registered("Ticket"));

        register::<Ticket>().unwrap();
        assert!(is_registered("Ticket"));
        assert_eq!(registered_types(), vec!["Ticket"]);

        let record = registration("Ticket").unwrap();
        assert_eq!(record.type_name(), "Ticket");
        assert_eq!(record.collection(), "tickets");

        let err = register::<Ticket>().unwrap_err();
        assert!(matches!(err, OdmError::AlreadyRegistered(_)));

        assert!(unregister("Ticket"));
        assert!(!unregister("Ticket"));
        assert!(!is_registered("Ticket"));
    }
}
