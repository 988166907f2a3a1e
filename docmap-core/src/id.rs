//! Identifier codec for translating between the application and wire
//! representations of a document's primary id.
//!
//! At the application boundary an identifier is a 24-character hex string or
//! a native [`ObjectId`]; at the storage layer it always lives under the
//! reserved `_id` key. The codec validates the string form eagerly so a
//! malformed id fails at the point of conversion, not inside the store.

use bson::Bson;
use bson::oid::ObjectId;

use crate::error::{OdmError, OdmResult};

/// Reserved wire key the identifier is stored under.
pub const WIRE_ID: &str = "_id";
/// Field name the identifier is exposed under on documents.
pub const FIELD_ID: &str = "id";

/// Encodes raw identifier bytes as their 24-character lowercase hex form.
pub fn encode(bytes: [u8; 12]) -> String {
    ObjectId::from_bytes(bytes).to_hex()
}

/// Converts a value into a native identifier.
///
/// Accepts an [`ObjectId`] as-is or a 24-hex-character string; anything else
/// fails with [`OdmError::InvalidFieldType`].
pub fn decode(value: &Bson) -> OdmResult<ObjectId> {
    match value {
        Bson::ObjectId(oid) => Ok(*oid),
        Bson::String(s) => ObjectId::parse_str(s)
            .map_err(|_| OdmError::InvalidFieldType(format!("{s:?} is not a valid ObjectId"))),
        other => Err(OdmError::InvalidFieldType(format!(
            "{other} is not a valid ObjectId"
        ))),
    }
}

/// Non-throwing validity check for values about to be used as identifiers.
pub fn is_valid(value: &Bson) -> bool {
    decode(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_24_hex_chars() {
        let hex = encode([0xab; 12]);
        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hex, "ab".repeat(12));
    }

    #[test]
    fn decode_accepts_hex_string_and_native() {
        let oid = ObjectId::new();
        assert_eq!(decode(&Bson::String(oid.to_hex())).unwrap(), oid);
        assert_eq!(decode(&Bson::ObjectId(oid)).unwrap(), oid);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(matches!(
            decode(&Bson::String("not-hex".into())),
            Err(OdmError::InvalidFieldType(_))
        ));
        // Correct length but not hex
        assert!(decode(&Bson::String("z".repeat(24))).is_err());
        // Wrong length
        assert!(decode(&Bson::String("abcdef".into())).is_err());
        assert!(matches!(
            decode(&Bson::Int32(7)),
            Err(OdmError::InvalidFieldType(_))
        ));
    }

    #[test]
    fn is_valid_matches_decode() {
        let oid = ObjectId::new();
        assert!(is_valid(&Bson::ObjectId(oid)));
        assert!(is_valid(&Bson::String(oid.to_hex())));
        assert!(!is_valid(&Bson::Null));
        assert!(!is_valid(&Bson::String("short".into())));
    }
}
