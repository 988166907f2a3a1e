//! Reconstruction of typed documents from raw, possibly partial, stored
//! records.
//!
//! This is the non-validating fast path used when loading from storage: the
//! stored shape is trusted, wire aliases are rewritten to field names, and
//! any field a projection omitted is filled from its declared default
//! instead of being left absent. Nested document-kinded fields are
//! materialized recursively through their own schemas.

use std::collections::BTreeSet;

use bson::{Bson, Document as RawRecord, de::deserialize_from_bson};
use serde::de::DeserializeOwned;

use crate::document::Document;
use crate::error::OdmResult;
use crate::schema::{FieldKind, Schema};

/// A materialized document together with the wire keys that were actually
/// present in the raw record, for partial-state bookkeeping.
#[derive(Debug, Clone)]
pub struct Materialized<D> {
    /// The fully-populated document.
    pub document: D,
    /// Wire keys found in the raw record; everything else was defaulted.
    pub loaded: BTreeSet<String>,
}

/// Materializes a typed document from a raw record via its declared schema.
pub fn materialize<D: Document>(raw: &RawRecord) -> OdmResult<D> {
    materialize_with(D::schema(), raw)
}

/// Materializes a typed document and reports which wire keys were present.
pub fn materialize_traced<D: Document>(raw: &RawRecord) -> OdmResult<Materialized<D>> {
    materialize_traced_with(D::schema(), raw)
}

/// Schema-explicit variant of [`materialize`], usable for any deserializable
/// target.
pub fn materialize_with<T: DeserializeOwned>(schema: &Schema, raw: &RawRecord) -> OdmResult<T> {
    Ok(materialize_traced_with(schema, raw)?.document)
}

/// Schema-explicit variant of [`materialize_traced`].
pub fn materialize_traced_with<T: DeserializeOwned>(
    schema: &Schema,
    raw: &RawRecord,
) -> OdmResult<Materialized<T>> {
    let mut loaded = BTreeSet::new();
    let assembled = assemble(schema, raw, Some(&mut loaded));
    let document = deserialize_from_bson(Bson::Document(assembled))?;

    Ok(Materialized { document, loaded })
}

/// Walks the schema (never the raw record) and assembles a complete
/// field-name-keyed mapping, defaulting anything the record omitted.
fn assemble(
    schema: &Schema,
    raw: &RawRecord,
    mut loaded: Option<&mut BTreeSet<String>>,
) -> RawRecord {
    let mut fields = RawRecord::new();

    for spec in schema.fields() {
        let value = match raw.get(spec.alias) {
            Some(value) => {
                if let Some(loaded) = loaded.as_deref_mut() {
                    loaded.insert(spec.alias.to_string());
                }
                match (&spec.kind, value) {
                    (FieldKind::Document(nested), Bson::Document(sub)) => {
                        Bson::Document(assemble(nested, sub, None))
                    }
                    (_, Bson::Null) if !spec.required => spec.default.resolve(),
                    (_, value) => value.clone(),
                }
            }
            None => spec.default.resolve(),
        };
        fields.insert(spec.name.to_string(), value);
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use bson::{doc, oid::ObjectId};
    use once_cell::sync::Lazy;
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct Address {
        street: String,
        zip: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Person {
        id: Option<ObjectId>,
        name: String,
        age: i64,
        salary: Option<f64>,
        tags: Vec<String>,
        address: Option<Address>,
    }

    static ADDRESS_SCHEMA: Lazy<Schema> = Lazy::new(|| {
        Schema::builder("Address")
            .field("street", FieldKind::String, "")
            .optional("zip", FieldKind::String)
            .build()
            .unwrap()
    });

    static PERSON_SCHEMA: Lazy<Schema> = Lazy::new(|| {
        Schema::builder("Person")
            .id()
            .field("name", FieldKind::String, "")
            .field("age", FieldKind::Int, 0_i64)
            .optional("salary", FieldKind::Float)
            .factory("tags", FieldKind::Array, || Bson::Array(Vec::new()))
            .spec(crate::schema::FieldSpec {
                name: "address",
                kind: FieldKind::Document(&ADDRESS_SCHEMA),
                default: crate::schema::FieldDefault::None,
                required: false,
                alias: "address",
            })
            .build()
            .unwrap()
    });

    #[test]
    fn fills_missing_fields_with_defaults() {
        // A record shaped like an inclusion projection on name only.
        let raw = doc! { "_id": ObjectId::new(), "name": "ramzi" };
        let person: Person = materialize_with(&PERSON_SCHEMA, &raw).unwrap();

        assert_eq!(person.name, "ramzi");
        assert_eq!(person.age, 0);
        assert_eq!(person.salary, None);
        assert!(person.tags.is_empty());
        assert!(person.address.is_none());
    }

    #[test]
    fn maps_wire_id_to_field_name() {
        let oid = ObjectId::new();
        let raw = doc! { "_id": oid, "name": "a", "age": 3_i64 };
        let person: Person = materialize_with(&PERSON_SCHEMA, &raw).unwrap();
        assert_eq!(person.id, Some(oid));
    }

    #[test]
    fn null_optional_value_falls_back_to_default() {
        let raw = doc! { "name": "a", "age": 1_i64, "tags": Bson::Null };
        let person: Person = materialize_with(&PERSON_SCHEMA, &raw).unwrap();
        assert!(person.tags.is_empty());
    }

    #[test]
    fn recurses_into_nested_documents() {
        let raw = doc! {
            "name": "a",
            "age": 1_i64,
            // zip omitted; the nested schema must default it
            "address": { "street": "main st" },
        };
        let person: Person = materialize_with(&PERSON_SCHEMA, &raw).unwrap();
        assert_eq!(
            person.address,
            Some(Address {
                street: "main st".into(),
                zip: None,
            })
        );
    }

    #[test]
    fn traced_materialization_reports_present_keys() {
        let raw = doc! { "_id": ObjectId::new(), "name": "a" };
        let result: Materialized<Person> =
            materialize_traced_with(&PERSON_SCHEMA, &raw).unwrap();
        let loaded: Vec<_> = result.loaded.iter().cloned().collect();
        assert_eq!(loaded, vec!["_id".to_string(), "name".to_string()]);
    }

    #[test]
    fn ignores_undeclared_keys() {
        let raw = doc! { "name": "a", "age": 1_i64, "stray": true };
        let person: Person = materialize_with(&PERSON_SCHEMA, &raw).unwrap();
        assert_eq!(person.name, "a");
    }
}
