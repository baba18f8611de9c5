//! Catalog type mapping and validated table descriptors.

/// Semantic type of a table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Text { max_length: Option<u32> },
    Integer,
    Float,
    Boolean,
    Timestamp,
}

/// Map a catalog type name to a semantic column type.
///
/// Pure and total over the documented catalog names; anything unrecognized
/// yields `None` so that introspection can fail closed. `max_length` is only
/// meaningful for character types and is ignored for the rest.
#[must_use]
pub fn map_type(sql_type_name: &str, max_length: Option<u32>) -> Option<ColumnType> {
    match sql_type_name {
        "character varying" | "text" => Some(ColumnType::Text { max_length }),
        "integer" => Some(ColumnType::Integer),
        "boolean" => Some(ColumnType::Boolean),
        "double precision" => Some(ColumnType::Float),
        "timestamp without time zone" | "date" => Some(ColumnType::Timestamp),
        _ => None,
    }
}

/// One column of a table, identified by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> &ColumnType {
        &self.ty
    }
}

/// A validated table shape.
///
/// A descriptor can only be constructed through [`TableDescriptor::new`],
/// which enforces the invariants the rest of the layer relies on: column
/// names are unique within the table and exactly one column is named `id`
/// with Integer type. Invalid shapes yield `None` rather than a partial
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<Column>,
}

impl TableDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Option<Self> {
        let mut seen = std::collections::HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return None;
            }
        }
        let id_ok = columns
            .iter()
            .any(|c| c.name == "id" && c.ty == ColumnType::Integer);
        if !id_ok {
            return None;
        }
        Some(Self {
            name: name.into(),
            columns,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_documented_catalog_names() {
        assert_eq!(
            map_type("character varying", Some(80)),
            Some(ColumnType::Text {
                max_length: Some(80)
            })
        );
        assert_eq!(
            map_type("text", None),
            Some(ColumnType::Text { max_length: None })
        );
        assert_eq!(map_type("integer", None), Some(ColumnType::Integer));
        assert_eq!(map_type("boolean", None), Some(ColumnType::Boolean));
        assert_eq!(map_type("double precision", None), Some(ColumnType::Float));
        assert_eq!(
            map_type("timestamp without time zone", None),
            Some(ColumnType::Timestamp)
        );
        assert_eq!(map_type("date", None), Some(ColumnType::Timestamp));
    }

    #[test]
    fn unknown_catalog_names_map_to_none() {
        assert_eq!(map_type("jsonb", None), None);
        assert_eq!(map_type("bytea", None), None);
        assert_eq!(map_type("INTEGER", None), None); // catalog names are lowercase
        assert_eq!(map_type("", None), None);
    }

    #[test]
    fn descriptor_requires_exactly_one_integer_id() {
        let ok = TableDescriptor::new(
            "person",
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("name", ColumnType::Text { max_length: None }),
            ],
        );
        assert!(ok.is_some());

        let no_id = TableDescriptor::new(
            "person",
            vec![Column::new("name", ColumnType::Text { max_length: None })],
        );
        assert!(no_id.is_none());

        let text_id = TableDescriptor::new(
            "person",
            vec![Column::new("id", ColumnType::Text { max_length: None })],
        );
        assert!(text_id.is_none());
    }

    #[test]
    fn descriptor_rejects_duplicate_column_names() {
        let dup = TableDescriptor::new(
            "person",
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("name", ColumnType::Text { max_length: None }),
                Column::new("name", ColumnType::Integer),
            ],
        );
        assert!(dup.is_none());
    }
}
