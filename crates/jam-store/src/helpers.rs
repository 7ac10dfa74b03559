//! Row-to-entity conversion helpers.
//!
//! Every repo converts `jam_gateway::Row` (column name → JSON value) into
//! typed entity structs and back. Negotiated inserts may come back with
//! columns the deployed schema dropped, so decoding merges the intended
//! payload underneath the stored representation first (stored values win).

use jam_gateway::Row;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Decode a row into an entity.
///
/// # Errors
///
/// Returns `StoreError::Decode` if the row does not match the entity shape.
pub(crate) fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| StoreError::Decode(format!("row decode: {e}")))
}

/// Encode an entity as an insert/patch payload.
///
/// # Errors
///
/// Returns `StoreError::Decode` if the entity does not serialize to an object.
pub(crate) fn encode_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!(
            "expected a JSON object payload, got {other}"
        ))),
        Err(e) => Err(StoreError::Decode(format!("row encode: {e}"))),
    }
}

/// Decode a stored row with the intended payload as a fallback layer.
///
/// Deployments whose schema dropped a column return rows missing it; the
/// intended value fills the gap so the typed entity still decodes.
pub(crate) fn decode_merged<T: DeserializeOwned>(
    intended: Row,
    stored: Row,
) -> Result<T, StoreError> {
    let mut merged = intended;
    merged.extend(stored);
    decode_row(merged)
}

/// Read a required string column.
///
/// # Errors
///
/// Returns `StoreError::Decode` if the column is missing or not a string.
pub(crate) fn get_string(row: &Row, key: &str) -> Result<String, StoreError> {
    row.get(key)
        .and_then(serde_json::Value::as_str)
        .map(String::from)
        .ok_or_else(|| StoreError::Decode(format!("missing string column '{key}'")))
}
