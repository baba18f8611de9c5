//! Pure assembly of SQL statement text from structured inputs.
//!
//! Nothing here executes anything; the session pairs the produced text with
//! a driver. Values always arrive pre-rendered through the literal encoder
//! (filters render themselves, writes come from the row codec), so the only
//! raw strings interpolated are identifiers, which are validated.

use std::fmt::Write as _;

use crate::codec::ColumnValues;
use crate::filter::{Filter, check_identifier};

/// Ordering for select statements. Ascending unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_owned(),
            descending: false,
        }
    }

    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_owned(),
            descending: true,
        }
    }
}

/// Everything a select takes beyond the table name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub filter: Option<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

fn where_clause(filter: Option<&Filter>) -> String {
    filter.map_or_else(|| "TRUE".to_owned(), Filter::to_sql)
}

/// `SELECT * FROM <table> WHERE <filter> [ORDER BY ...] [LIMIT n] [OFFSET n]`
#[must_use]
pub fn select(table: &str, options: &SelectOptions) -> String {
    check_identifier(table);
    let mut sql = format!(
        "SELECT * FROM {table} WHERE {}",
        where_clause(options.filter.as_ref())
    );
    if let Some(order) = &options.order {
        check_identifier(&order.column);
        let direction = if order.descending { "DESC" } else { "ASC" };
        let _ = write!(sql, " ORDER BY {} {direction}", order.column);
    }
    if let Some(limit) = options.limit {
        let _ = write!(sql, " LIMIT {limit}");
    }
    if let Some(offset) = options.offset {
        let _ = write!(sql, " OFFSET {offset}");
    }
    sql
}

/// `SELECT COUNT(*) FROM <table> WHERE <filter> [LIMIT n]`
#[must_use]
pub fn count(table: &str, filter: Option<&Filter>, limit: Option<u64>) -> String {
    check_identifier(table);
    let mut sql = format!("SELECT COUNT(*) FROM {table} WHERE {}", where_clause(filter));
    if let Some(limit) = limit {
        let _ = write!(sql, " LIMIT {limit}");
    }
    sql
}

/// Insert omitting the server-generated `id`, asking the generated key back.
#[must_use]
pub fn insert(table: &str, values: &ColumnValues) -> String {
    check_identifier(table);
    let mut columns = Vec::with_capacity(values.len());
    let mut literals = Vec::with_capacity(values.len());
    for (column, literal) in values {
        if column == "id" {
            continue;
        }
        check_identifier(column);
        columns.push(column.as_str());
        literals.push(literal.as_str());
    }
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES RETURNING id");
    }
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING id",
        columns.join(", "),
        literals.join(", ")
    )
}

/// Update every non-`id` column, keyed by `id`.
///
/// # Panics
/// Panics when `values` carries nothing to set (programming error).
#[must_use]
pub fn update(table: &str, id: i64, values: &ColumnValues) -> String {
    check_identifier(table);
    let assignments: Vec<String> = values
        .iter()
        .filter(|(column, _)| column.as_str() != "id")
        .map(|(column, literal)| {
            check_identifier(column);
            format!("{column} = {literal}")
        })
        .collect();
    assert!(
        !assignments.is_empty(),
        "update of table '{table}' with no column values"
    );
    format!(
        "UPDATE {table} SET {} WHERE id = {id}",
        assignments.join(", ")
    )
}

/// Delete by predicate. The filter is a mandatory reference: "delete all
/// rows" cannot be expressed by omission, only by an explicit tautology.
#[must_use]
pub fn delete_where(table: &str, filter: &Filter) -> String {
    check_identifier(table);
    format!("DELETE FROM {table} WHERE {}", filter.to_sql())
}

/// Delete one row by its primary key.
#[must_use]
pub fn delete_by_id(table: &str, id: i64) -> String {
    check_identifier(table);
    format!("DELETE FROM {table} WHERE id = {id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn select_defaults_to_the_tautology() {
        assert_eq!(
            select("person", &SelectOptions::new()),
            "SELECT * FROM person WHERE TRUE"
        );
    }

    #[test]
    fn select_with_all_clauses() {
        let options = SelectOptions::new()
            .with_filter(Filter::ge("age", 18))
            .with_order(Order::desc("age"))
            .with_limit(10)
            .with_offset(20);
        assert_eq!(
            select("person", &options),
            "SELECT * FROM person WHERE age >= 18 ORDER BY age DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn order_defaults_to_ascending() {
        let options = SelectOptions::new().with_order(Order::asc("name"));
        assert_eq!(
            select("person", &options),
            "SELECT * FROM person WHERE TRUE ORDER BY name ASC"
        );
    }

    #[test]
    fn count_wraps_the_filter() {
        assert_eq!(
            count("person", Some(&Filter::eq("age", 36)), Some(5)),
            "SELECT COUNT(*) FROM person WHERE age = 36 LIMIT 5"
        );
        assert_eq!(
            count("person", None, None),
            "SELECT COUNT(*) FROM person WHERE TRUE"
        );
    }

    #[test]
    fn insert_omits_id_and_requests_it_back() {
        let mut values = ColumnValues::new();
        values.insert("name".to_owned(), "'Ada'".to_owned());
        values.insert("age".to_owned(), "36".to_owned());
        values.insert("id".to_owned(), "99".to_owned());
        assert_eq!(
            insert("person", &values),
            "INSERT INTO person (age, name) VALUES (36, 'Ada') RETURNING id"
        );
    }

    #[test]
    fn insert_with_no_values_uses_defaults() {
        assert_eq!(
            insert("person", &ColumnValues::new()),
            "INSERT INTO person DEFAULT VALUES RETURNING id"
        );
    }

    #[test]
    fn update_sets_non_id_columns_keyed_by_id() {
        let mut values = ColumnValues::new();
        values.insert("age".to_owned(), "37".to_owned());
        values.insert("name".to_owned(), "'Ada'".to_owned());
        assert_eq!(
            update("person", 7, &values),
            "UPDATE person SET age = 37, name = 'Ada' WHERE id = 7"
        );
    }

    #[test]
    #[should_panic(expected = "no column values")]
    fn update_with_nothing_to_set_fails_fast() {
        let _ = update("person", 7, &ColumnValues::new());
    }

    #[test]
    fn delete_statements() {
        assert_eq!(
            delete_where("person", &Filter::eq("id", 5)),
            "DELETE FROM person WHERE id = 5"
        );
        assert_eq!(delete_by_id("person", 5), "DELETE FROM person WHERE id = 5");
    }

    #[test]
    #[should_panic(expected = "invalid SQL identifier")]
    fn hostile_table_names_fail_fast() {
        let _ = select("person; --", &SelectOptions::new());
    }
}
