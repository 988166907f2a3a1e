//! Filter evaluation for in-memory record matching.
//!
//! Evaluates the operator-document filter dialect (`$eq`, `$gt`, `$in`, ...)
//! against raw records, with the same loose numeric comparison semantics the
//! wire protocol uses: integers and doubles compare by value, not by type.

use std::cmp::Ordering;
use std::collections::HashMap;

use bson::{Bson, Document as RawRecord, datetime::DateTime, oid::ObjectId};

/// Type-erased, comparable representation of BSON values.
///
/// Normalizes all numeric types to f64 so that `{"age": 30}` matches a
/// record holding `Int64(30)` or `Double(30.0)` alike.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(&'a ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => {
                Comparable::Array(arr.iter().map(Comparable::from).collect::<Vec<_>>())
            }
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            // Other types are not comparable
            _ => Comparable::Null,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Whether `record` satisfies `filter`. An empty filter matches everything.
pub(crate) fn matches(record: &RawRecord, filter: &RawRecord) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => match condition.as_array() {
            Some(clauses) => clauses
                .iter()
                .filter_map(Bson::as_document)
                .all(|clause| matches(record, clause)),
            None => false,
        },
        "$or" => match condition.as_array() {
            Some(clauses) => clauses
                .iter()
                .filter_map(Bson::as_document)
                .any(|clause| matches(record, clause)),
            None => false,
        },
        field => matches_field(record, field, condition),
    })
}

fn matches_field(record: &RawRecord, field: &str, condition: &Bson) -> bool {
    let field_value = record.get(field);

    if let Some(operators) = operator_document(condition) {
        return operators
            .iter()
            .all(|(op, operand)| apply_operator(field_value, op, operand));
    }

    // Plain value: implicit equality
    match field_value {
        Some(value) => Comparable::from(value) == Comparable::from(condition),
        None => false,
    }
}

/// Recognizes `{"$gt": 5, "$lt": 10}`-style operator documents; a document
/// whose keys don't all start with `$` is an exact-match value.
fn operator_document(condition: &Bson) -> Option<&RawRecord> {
    condition
        .as_document()
        .filter(|doc| !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')))
}

fn apply_operator(field_value: Option<&Bson>, op: &str, operand: &Bson) -> bool {
    if op == "$exists" {
        let should_exist = operand.as_bool().unwrap_or(false);
        return field_value.is_some() == should_exist;
    }

    let Some(value) = field_value else {
        // Absent fields satisfy only negative operators
        return matches!(op, "$ne" | "$nin");
    };
    let value = Comparable::from(value);

    match op {
        "$eq" => value == Comparable::from(operand),
        "$ne" => value != Comparable::from(operand),
        "$gt" | "$gte" | "$lt" | "$lte" => {
            match value.partial_cmp(&Comparable::from(operand)) {
                Some(ordering) => match op {
                    "$gt" => ordering == Ordering::Greater,
                    "$gte" => ordering != Ordering::Less,
                    "$lt" => ordering == Ordering::Less,
                    "$lte" => ordering != Ordering::Greater,
                    _ => unreachable!(),
                },
                None => false,
            }
        }
        "$in" => match operand.as_array() {
            Some(candidates) => candidates
                .iter()
                .any(|candidate| value == Comparable::from(candidate)),
            None => false,
        },
        "$nin" => match operand.as_array() {
            Some(candidates) => candidates
                .iter()
                .all(|candidate| value != Comparable::from(candidate)),
            None => true,
        },
        // Unknown operators never match
        _ => false,
    }
}
