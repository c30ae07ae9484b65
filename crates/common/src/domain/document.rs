use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Normalized output of the payload transformer: one RFC 3339 UTC timestamp
/// plus a mapping from device identifier to its merged scalar fields.
///
/// Invariants: no field value is null and no field key starts with `_`.
/// Readings sharing an identifier within one message are merged field-wise,
/// with the later reading winning on key collisions.
///
/// Serializes as `{"time": "...", "data": {vid: {field: value}}}` — this
/// shape is the contract consumed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub time: String,
    pub data: BTreeMap<String, Map<String, Value>>,
}
