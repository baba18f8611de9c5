//! Catalog queries and their row parsing.
//!
//! The SQL targets the standard `information_schema` catalog of the default
//! application schema. Parsing fails closed: any row the layer cannot map
//! cleanly invalidates the whole descriptor.

use crate::driver::SqlRow;
use crate::schema::{Column, TableDescriptor, map_type};
use crate::value::DbValue;

pub(crate) fn tables_query() -> String {
    "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'".to_owned()
}

pub(crate) fn columns_query(table: &str) -> String {
    format!(
        "SELECT column_name, data_type, character_maximum_length \
         FROM information_schema.columns WHERE table_name = {} \
         ORDER BY ordinal_position",
        DbValue::from(table).to_sql_literal()
    )
}

/// Table names in catalog order. Rows with a non-text first column are
/// skipped rather than failing the whole listing.
pub(crate) fn parse_table_names(rows: &[SqlRow]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get("table_name").and_then(DbValue::as_text))
        .map(str::to_owned)
        .collect()
}

/// Build a validated descriptor from catalog column rows, or `None` when any
/// column type is unmappable or the `id` invariant does not hold.
pub(crate) fn parse_descriptor(table: &str, rows: &[SqlRow]) -> Option<TableDescriptor> {
    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row.get("column_name").and_then(DbValue::as_text)?;
        let data_type = row.get("data_type").and_then(DbValue::as_text)?;
        let max_length = match row.get("character_maximum_length") {
            Some(DbValue::Integer(n)) => Some(u32::try_from(*n).ok()?),
            Some(DbValue::Null) | None => None,
            Some(_) => return None,
        };
        let ty = map_type(data_type, max_length)?;
        columns.push(Column::new(name, ty));
    }
    TableDescriptor::new(table, columns)
}
