//! Schema descriptors for document types.
//!
//! A [`Schema`] is the per-type field mapping the materializer and the query
//! manager validate against: an ordered list of field specs carrying the
//! declared kind, the default value (or none), the required flag and the
//! wire alias. It is computed once when a document type is declared and
//! read-only thereafter; the builder and every instance of the type share it.
//!
//! # Example
//!
//! ```ignore
//! use docmap_core::schema::{FieldKind, Schema};
//! use bson::Bson;
//!
//! let schema = Schema::builder("Person")
//!     .id()
//!     .field("name", FieldKind::String, Bson::from(""))
//!     .field("age", FieldKind::Int, Bson::from(0_i64))
//!     .optional("salary", FieldKind::Float)
//!     .build()?;
//! # Ok::<(), docmap_core::error::OdmError>(())
//! ```

use bson::Bson;

use crate::error::{OdmError, OdmResult};
use crate::id::{FIELD_ID, WIRE_ID};

/// Declared type of a document field.
///
/// The Rust type system enforces field types at assignment, so the kind is
/// only consulted for nested-document recursion and introspection.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// UTF-8 string.
    String,
    /// 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Millisecond-precision UTC datetime.
    DateTime,
    /// Native identifier.
    ObjectId,
    /// Array of arbitrary values.
    Array,
    /// A nested document materialized through its own schema.
    Document(&'static Schema),
    /// Anything; the value is passed through untouched.
    Any,
}

/// Default value policy for a field absent from a raw record.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// No default; resolves to null (optional fields).
    None,
    /// A fixed value, cloned per materialization.
    Value(Bson),
    /// A factory invoked per materialization, so mutable defaults such as
    /// empty collections are never shared between documents.
    Factory(fn() -> Bson),
}

impl FieldDefault {
    /// Produces the default value for one materialization.
    pub fn resolve(&self) -> Bson {
        match self {
            FieldDefault::None => Bson::Null,
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Factory(factory) => factory(),
        }
    }
}

/// Declaration of a single document field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name at the application layer.
    pub name: &'static str,
    /// Declared type.
    pub kind: FieldKind,
    /// Default used when the field is missing from a raw record.
    pub default: FieldDefault,
    /// Whether a null raw value is kept as-is instead of defaulted.
    pub required: bool,
    /// Key the field is carried under at the storage layer.
    pub alias: &'static str,
}

/// Immutable per-type field mapping, shared by all instances of the bound
/// document type and by its query manager.
#[derive(Debug)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Starts a builder for the named document type.
    pub fn builder(type_name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            type_name,
            fields: Vec::new(),
        }
    }

    /// Name of the document type this schema describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by its application-layer name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether a field with this name is declared.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Wire alias for a declared field name.
    pub fn alias_of(&self, name: &str) -> Option<&'static str> {
        self.field(name).map(|f| f.alias)
    }
}

/// Enforces the store's field-name restrictions at declaration time.
pub fn validate_field_name(name: &str) -> OdmResult<()> {
    if name.starts_with('$') {
        return Err(OdmError::InvalidFieldName(format!(
            "{name:?} cannot start with the dollar sign ($) character"
        )));
    }
    if name.contains('.') {
        return Err(OdmError::InvalidFieldName(format!(
            "{name:?} cannot contain the dot (.) character"
        )));
    }
    if name.is_empty() {
        return Err(OdmError::InvalidFieldName("name cannot be empty".into()));
    }
    Ok(())
}

/// Builder for [`Schema`]. Field names are validated and the single-`_id`
/// invariant is checked by [`build`](SchemaBuilder::build), so naming
/// problems surface when the type is declared, not when a query runs.
pub struct SchemaBuilder {
    type_name: &'static str,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Declares the identifier field: named `id`, aliased to the reserved
    /// wire key, optional until the document is first persisted.
    pub fn id(self) -> Self {
        self.push(FieldSpec {
            name: FIELD_ID,
            kind: FieldKind::ObjectId,
            default: FieldDefault::None,
            required: false,
            alias: WIRE_ID,
        })
    }

    /// Declares a required field with an explicit default.
    pub fn field(self, name: &'static str, kind: FieldKind, default: impl Into<Bson>) -> Self {
        self.push(FieldSpec {
            name,
            kind,
            default: FieldDefault::Value(default.into()),
            required: true,
            alias: name,
        })
    }

    /// Declares an optional field defaulting to null.
    pub fn optional(self, name: &'static str, kind: FieldKind) -> Self {
        self.push(FieldSpec {
            name,
            kind,
            default: FieldDefault::None,
            required: false,
            alias: name,
        })
    }

    /// Declares a field whose default is produced by a factory per call.
    pub fn factory(self, name: &'static str, kind: FieldKind, factory: fn() -> Bson) -> Self {
        self.push(FieldSpec {
            name,
            kind,
            default: FieldDefault::Factory(factory),
            required: false,
            alias: name,
        })
    }

    /// Declares a field spec verbatim, for full control over alias and
    /// required flag.
    pub fn spec(self, spec: FieldSpec) -> Self {
        self.push(spec)
    }

    fn push(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Validates and finalizes the schema.
    pub fn build(self) -> OdmResult<Schema> {
        let mut id_aliases = 0usize;
        for spec in &self.fields {
            validate_field_name(spec.name)?;
            if spec.alias != WIRE_ID {
                validate_field_name(spec.alias)?;
            } else {
                id_aliases += 1;
            }
        }
        if id_aliases > 1 {
            return Err(OdmError::InvalidFieldName(format!(
                "{}: more than one field binds to the reserved {WIRE_ID} key",
                self.type_name
            )));
        }
        Ok(Schema {
            type_name: self.type_name,
            fields: self.fields,
        })
    }
}
