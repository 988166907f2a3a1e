//! Error types and result types for ODM operations.
//!
//! Every fallible operation in the crate returns [`OdmResult<T>`]. The error
//! kinds are distinguishable so callers can branch on not-found versus
//! misconfiguration versus invalid input.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the mapping layer.
///
/// Declaration-time problems (naming rules, duplicate registration) and
/// call-time problems (projection validation, id conversion) are surfaced
/// synchronously; everything touching the store surfaces asynchronously.
#[derive(Error, Debug)]
pub enum OdmError {
    /// The process-wide configuration was accessed before `configure`, or
    /// `configure` was called with unusable values.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),
    /// A value could not be converted to the declared field type, e.g. a
    /// malformed identifier string.
    #[error("Invalid field type: {0}")]
    InvalidFieldType(String),
    /// A declared collection name violates the store's naming rules.
    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),
    /// A declared field name violates the store's naming rules.
    #[error("Invalid field name: {0}")]
    InvalidFieldName(String),
    /// A projection referenced a field that is not declared on the document.
    #[error("Field {0} not found on document {1}")]
    FieldNotFound(String, String),
    /// An exclusion projection named the identifier field.
    #[error("Primary key \"_id\" can't be excluded")]
    PrimaryKeyCantBeExcluded,
    /// Inclusion and exclusion projections were mixed in one query.
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),
    /// The requested document does not exist in the collection.
    #[error("Document does not exist: {0}")]
    DocumentDoesNotExist(String),
    /// A document type was registered twice.
    #[error("{0} is already registered")]
    AlreadyRegistered(String),
    /// Serialization/deserialization error when converting between document
    /// representations (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A transport or server fault from the underlying store, propagated
    /// unmodified and never retried.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for ODM operations.
pub type OdmResult<T> = Result<T, OdmError>;

impl From<BsonError> for OdmError {
    fn from(err: BsonError) -> Self {
        OdmError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for OdmError {
    fn from(err: SerdeJsonError) -> Self {
        OdmError::Serialization(err.to_string())
    }
}
