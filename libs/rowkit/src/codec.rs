//! Bidirectional mapping between driver rows and entities.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::driver::SqlRow;
use crate::entity::{Entity, EntityRegistry, Envelope, JsonMap};
use crate::value::DbValue;

/// Typed error for row decoding and entity encoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("no class registered for table '{0}'")]
    UnregisteredTable(String),

    #[error("class mismatch for table '{table}': expected '{expected}', got '{got}'")]
    ClassMismatch {
        table: String,
        expected: String,
        got: String,
    },

    #[error("column '{column}' holds an unstorable value: {reason}")]
    UnsupportedValue { column: String, reason: String },
}

/// Ordered column → rendered-literal map destined for insert/update text.
pub type ColumnValues = BTreeMap<String, String>;

/// Turn one raw driver row into a typed entity.
///
/// Raw values are converted to their JSON-safe form (timestamps become
/// RFC 3339 strings, everything else passes through) and the resulting
/// envelope is handed to the registry's deserializer. An unregistered table
/// is a typed error, never an empty result.
///
/// # Errors
/// Returns a [`CodecError`] for unregistered tables or registry rejection.
pub fn decode_row(
    registry: &dyn EntityRegistry,
    table: &str,
    row: &SqlRow,
) -> Result<Entity, CodecError> {
    let class = registry
        .class_for_table(table)
        .ok_or_else(|| CodecError::UnregisteredTable(table.to_owned()))?;
    let mut data = JsonMap::new();
    for (name, value) in row.iter() {
        data.insert(name.to_owned(), value.to_json());
    }
    registry.deserialize(table, Envelope { class, data })
}

/// Turn an entity into column → literal text for a write.
///
/// The `id` column is never encoded (it is server-generated on insert and
/// the update key otherwise), and null/absent columns are skipped so partial
/// updates omit unset optional columns rather than writing NULL.
///
/// # Errors
/// Returns a [`CodecError`] for values with no SQL literal form (nested
/// JSON, out-of-range integers, NUL bytes in strings).
pub fn encode_entity(entity: &Entity) -> Result<ColumnValues, CodecError> {
    let mut out = ColumnValues::new();
    for (column, value) in entity.columns() {
        if column == "id" || value.is_null() {
            continue;
        }
        out.insert(column.clone(), literal_from_json(column, value)?);
    }
    Ok(out)
}

fn literal_from_json(column: &str, value: &serde_json::Value) -> Result<String, CodecError> {
    use serde_json::Value;

    let unsupported = |reason: &str| CodecError::UnsupportedValue {
        column: column.to_owned(),
        reason: reason.to_owned(),
    };

    let db = match value {
        Value::Null => DbValue::Null,
        Value::Bool(b) => DbValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DbValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                DbValue::Float(f)
            } else {
                return Err(unsupported("integer out of i64 range"));
            }
        }
        Value::String(s) => {
            if s.contains('\0') {
                return Err(unsupported("NUL byte in string"));
            }
            DbValue::Text(s.clone())
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(unsupported("nested JSON values are not column values"));
        }
    };
    Ok(db.to_sql_literal())
}
