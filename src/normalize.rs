//! Column-wise coercion of raw store documents into canonical types.
//!
//! The record store hands back loosely typed JSON documents. Before any
//! filtering or arithmetic happens, the engine rewrites the declared columns
//! in place: decimals always become finite non-negative numbers (anything
//! unparsable is exactly 0), timestamps become a single naive-UTC canonical
//! form (anything unparsable is null). A batch never fails; a column absent
//! from a document is skipped silently.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};

/// One raw record as returned by the store.
pub type Document = Map<String, Value>;

/// Canonical on-document form of a normalized timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Decimal,
    Timestamp,
}

/// Rewrites the named columns of every document to their canonical form.
pub fn normalize_documents(docs: &mut [Document], fields: &[(&str, FieldKind)]) {
    for doc in docs.iter_mut() {
        for (column, kind) in fields {
            let Some(value) = doc.get_mut(*column) else {
                continue;
            };
            match kind {
                FieldKind::Decimal => {
                    *value = Value::from(coerce_decimal(value));
                }
                FieldKind::Timestamp => {
                    *value = match coerce_timestamp(value) {
                        Some(ts) => Value::String(ts.format(TIMESTAMP_FORMAT).to_string()),
                        None => Value::Null,
                    };
                }
            }
        }
    }
}

/// Parses a decimal field. Unparsable, missing, non-finite or negative values
/// all collapse to 0 so they never poison downstream arithmetic.
pub fn coerce_decimal(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Parses a timestamp field. Timezone-aware values are converted to UTC and
/// the offset dropped; naive values are taken as-is. Unparsable values yield
/// `None`.
pub fn coerce_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
                return Some(aware.with_timezone(&Utc).naive_utc());
            }
            NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN))
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

/// Reads back a decimal column after [`normalize_documents`] ran over it.
pub fn stored_decimal(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

/// Reads back a timestamp column after [`normalize_documents`] ran over it.
pub fn stored_timestamp(value: Option<&Value>) -> Option<NaiveDateTime> {
    value
        .and_then(Value::as_str)
        .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok())
}
