// Boundary conversion between typed entities and raw store documents.
//
// Outbound: `id` becomes the store `key`. Inbound: `key` becomes `id` and, for
// entities with a typed expiry, a string `expires` is rehydrated into a date
// before the typed decode. Every other attribute passes through as stored.

use serde::Serialize;
use serde_json::Value;

use deta_auth_core::db::models::Document;
use deta_auth_core::db::store::{RawDocument, UpdatePatch, KEY_ATTRIBUTE};
use deta_auth_core::error::{AdapterResult, StoreError};
use deta_auth_core::utils::date::{format_iso_date, parse_iso_date};

/// Attribute the framework sees as the document identifier.
pub const ID_ATTRIBUTE: &str = "id";

/// Attribute rehydrated into a date on read.
pub const EXPIRES_ATTRIBUTE: &str = "expires";

fn to_object(value: &impl Serialize, what: &str) -> AdapterResult<RawDocument> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "{what} must serialize to an object, got {other}"
        ))),
    }
}

/// Turn an entity (or creation input) into a store document.
///
/// A non-empty `id` becomes the store key; without one the store assigns it.
/// A `key` among the extra attributes is dropped so only `id` selects the key.
pub fn to_raw(doc: &impl Serialize) -> AdapterResult<RawDocument> {
    let mut raw = to_object(doc, "document")?;
    raw.remove(KEY_ATTRIBUTE);
    match raw.remove(ID_ATTRIBUTE) {
        Some(Value::String(id)) if !id.is_empty() => {
            raw.insert(KEY_ATTRIBUTE.to_string(), Value::String(id));
        }
        Some(Value::Null) | Some(Value::String(_)) | None => {}
        Some(other) => {
            return Err(StoreError::Serialization(format!(
                "id must be a string, got {other}"
            )))
        }
    }
    Ok(raw)
}

/// Turn a patch into the attribute set sent with a partial update.
pub fn to_update(patch: &impl Serialize) -> AdapterResult<UpdatePatch> {
    let mut set = to_object(patch, "patch")?;
    set.remove(ID_ATTRIBUTE);
    set.remove(KEY_ATTRIBUTE);
    Ok(set)
}

/// Normalize a store document into entity `T`.
pub fn normalize<T: Document>(mut raw: RawDocument) -> AdapterResult<T> {
    if let Some(key) = raw.remove(KEY_ATTRIBUTE) {
        raw.insert(ID_ATTRIBUTE.to_string(), key);
    }

    let expires = match raw.get(EXPIRES_ATTRIBUTE) {
        Some(Value::String(value)) if T::HAS_EXPIRES => Some(parse_iso_date(value).ok_or_else(|| {
            StoreError::Serialization(format!(
                "{} has an unreadable {EXPIRES_ATTRIBUTE} value: {value:?}",
                T::KIND
            ))
        })?),
        _ => None,
    };
    if let Some(date) = expires {
        raw.insert(
            EXPIRES_ATTRIBUTE.to_string(),
            Value::String(format_iso_date(&date)),
        );
    }

    serde_json::from_value(Value::Object(raw))
        .map_err(|e| StoreError::Serialization(format!("malformed {} document: {e}", T::KIND)))
}

/// `normalize` lifted over absence.
pub fn normalize_opt<T: Document>(raw: Option<RawDocument>) -> AdapterResult<Option<T>> {
    raw.map(normalize).transpose()
}
