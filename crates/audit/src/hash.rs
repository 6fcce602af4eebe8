//! Deterministic hashing for audit entries.
//!
//! `data_hash = SHA256(DOMAIN || str(canonical_payload) || str(entity_type)
//! || str(entity_id) || str(action) || u64_be(sequence))`, where `str(x)` is
//! a big-endian u32 length prefix followed by the UTF-8 bytes.

use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use stockpact_core::AggregateId;

use crate::entry::{AuditAction, EntityType};

/// Domain prefix so ledger digests never collide with other SHA-256 uses.
pub const DOMAIN_AUDIT_ENTRY: &[u8] = b"STOCKPACT_AUDIT_ENTRY_V1";

/// Compact JSON with object keys sorted lexicographically at every level.
pub fn canonicalize(value: &JsonValue) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&JsonValue::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn update_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u32).to_be_bytes());
    hasher.update(s.as_bytes());
}

/// Hex-encoded SHA-256 over the entry's hashed fields.
pub fn compute_data_hash(
    payload: &JsonValue,
    entity_type: EntityType,
    entity_id: AggregateId,
    action: AuditAction,
    sequence: u64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_AUDIT_ENTRY);
    update_str(&mut hasher, &canonicalize(payload));
    update_str(&mut hasher, entity_type.as_str());
    update_str(&mut hasher, &entity_id.to_string());
    update_str(&mut hasher, action.as_str());
    hasher.update(sequence.to_be_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_ignores_key_order() {
        let a = json!({"b": 1, "a": {"z": [1, 2], "y": null}});
        let b = json!({"a": {"y": null, "z": [1, 2]}, "b": 1});
        assert_eq!(canonicalize(&a), canonicalize(&b));
        assert_eq!(canonicalize(&a), r#"{"a":{"y":null,"z":[1,2]},"b":1}"#);
    }

    #[test]
    fn hash_depends_on_every_field() {
        let id = AggregateId::new();
        let payload = json!({"status": "draft"});
        let base = compute_data_hash(&payload, EntityType::Rfq, id, AuditAction::Create, 1);

        assert_eq!(base.len(), 64);
        assert_eq!(
            base,
            compute_data_hash(&payload, EntityType::Rfq, id, AuditAction::Create, 1)
        );
        assert_ne!(
            base,
            compute_data_hash(&payload, EntityType::Rfq, id, AuditAction::Create, 2)
        );
        assert_ne!(
            base,
            compute_data_hash(&payload, EntityType::Shipment, id, AuditAction::Create, 1)
        );
        assert_ne!(
            base,
            compute_data_hash(&payload, EntityType::Rfq, id, AuditAction::Update, 1)
        );
        assert_ne!(
            base,
            compute_data_hash(&json!({"status": "sent"}), EntityType::Rfq, id, AuditAction::Create, 1)
        );
    }
}
