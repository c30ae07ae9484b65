use crate::error::{PayloadError, Result};
use chrono::{DateTime, SecondsFormat};
use common::domain::NormalizedDocument;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Identifier field of a reading; the key its cleaned fields are filed under.
const VID_KEY: &str = "_vid";

/// Transform one raw snapshot message into a normalized document.
///
/// The payload must decode to a JSON object with a numeric Unix-epoch
/// timestamp `t` and an array `r` of reading objects. Each reading
/// contributes its fields under its `_vid` identifier after cleaning:
/// keys starting with `_` and keys with null values are dropped, everything
/// else is kept. Readings without a usable identifier, or with nothing left
/// after cleaning, contribute nothing. Readings sharing an identifier are
/// merged field-wise, later readings winning on collision.
///
/// A message where every reading is skipped still yields a document with
/// empty `data` — only the errors above mean "no document".
pub fn transform_snapshot(payload: &[u8]) -> Result<NormalizedDocument> {
    let value: Value = serde_json::from_slice(payload)?;
    let root = value.as_object().ok_or(PayloadError::NotAnObject)?;

    let epoch = root
        .get("t")
        .and_then(Value::as_f64)
        .ok_or(PayloadError::MissingTimestamp)?;
    let readings = root
        .get("r")
        .and_then(Value::as_array)
        .ok_or(PayloadError::MissingReadings)?;

    let time = epoch_to_rfc3339(epoch)?;

    let mut data: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for (index, reading) in readings.iter().enumerate() {
        let fields = reading
            .as_object()
            .ok_or(PayloadError::InvalidReading(index))?;

        let vid = match fields.get(VID_KEY).and_then(Value::as_str) {
            Some(vid) if !vid.is_empty() => vid,
            _ => continue,
        };

        let cleaned: Map<String, Value> = fields
            .iter()
            .filter(|(key, value)| !key.starts_with('_') && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if cleaned.is_empty() {
            continue;
        }

        data.entry(vid.to_string()).or_default().extend(cleaned);
    }

    Ok(NormalizedDocument { time, data })
}

/// Render a Unix epoch (seconds, fractional allowed) as RFC 3339 in UTC
/// with a `+00:00` offset, e.g. `1692979330` → `2023-08-25T16:02:10+00:00`.
fn epoch_to_rfc3339(epoch: f64) -> Result<String> {
    let micros = (epoch * 1_000_000.0).round();
    if !micros.is_finite() || micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return Err(PayloadError::TimestampOutOfRange(epoch));
    }

    let timestamp = DateTime::from_timestamp_micros(micros as i64)
        .ok_or(PayloadError::TimestampOutOfRange(epoch))?;

    Ok(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}
