//! The driver collaborator: an opaque transport that executes finalized SQL
//! text. The session never talks to the network itself; it goes through a
//! boxed [`Driver`] produced by a [`Connector`].

use async_trait::async_trait;
use thiserror::Error;

use crate::value::DbValue;

/// Typed error for the transport boundary.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to open connection: {0}")]
    Connect(String),

    #[error("statement failed: {0}")]
    Statement(String),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One returned row: ordered, name-keyed scalar values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: Vec<(String, DbValue)>,
}

impl SqlRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, DbValue)>) -> Self {
        Self { columns: pairs }
    }

    pub fn push(&mut self, name: impl Into<String>, value: DbValue) {
        self.columns.push((name.into(), value));
    }

    /// First value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DbValue> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The value of a single-column row, `None` if the row has any other shape.
    #[must_use]
    pub fn single(&self) -> Option<&DbValue> {
        match self.columns.as_slice() {
            [(_, value)] => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DbValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Live transport handle. One handle per session; the session serializes
/// statements on it, so implementations may assume no overlapping calls.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Run a mutating statement, returning the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, DriverError>;

    /// Run a returning statement.
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DriverError>;

    /// Run a batch of statements as one atomic unit: either all take effect
    /// or none do.
    async fn run_atomic(&self, statements: &[String]) -> Result<(), DriverError>;

    /// Close the handle. Further use of the driver is undefined.
    async fn close(&self);
}

/// Opens driver handles. Injected into the session at construction.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Driver>, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lookup_is_name_keyed_and_ordered() {
        let mut row = SqlRow::new();
        row.push("id", DbValue::Integer(1));
        row.push("name", DbValue::from("Ada"));

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&DbValue::Integer(1)));
        assert_eq!(row.get("missing"), None);
        let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn single_requires_exactly_one_column() {
        let one = SqlRow::from_pairs(vec![("count".to_owned(), DbValue::Integer(3))]);
        assert_eq!(one.single(), Some(&DbValue::Integer(3)));

        assert_eq!(SqlRow::new().single(), None);
        let two = SqlRow::from_pairs(vec![
            ("a".to_owned(), DbValue::Integer(1)),
            ("b".to_owned(), DbValue::Integer(2)),
        ]);
        assert_eq!(two.single(), None);
    }
}
