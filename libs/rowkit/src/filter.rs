//! Structured predicate algebra rendered into `WHERE` clauses.
//!
//! Callers never hand the layer free-text SQL predicates. A [`Filter`] is a
//! small AST of comparisons and boolean combinators; rendering goes through
//! the single literal encoder in [`crate::value`], so the only strings that
//! reach statement text unescaped are validated identifiers.

use crate::value::DbValue;

/// Comparison operators usable in a [`Filter::Cmp`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
}

impl CmpOp {
    fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Like => "LIKE",
        }
    }
}

/// A boolean predicate over the columns of one table.
///
/// The absent filter defaults to the tautology everywhere it is optional;
/// an empty [`Filter::All`] renders `TRUE` and an empty [`Filter::Any`]
/// renders `FALSE`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Cmp {
        column: String,
        op: CmpOp,
        value: DbValue,
    },
    IsNull(String),
    IsNotNull(String),
    All(Vec<Filter>),
    Any(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// # Panics
    /// Panics if `column` is not a valid SQL identifier (programming error).
    pub fn cmp(column: &str, op: CmpOp, value: impl Into<DbValue>) -> Self {
        check_identifier(column);
        Filter::Cmp {
            column: column.to_owned(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: &str, value: impl Into<DbValue>) -> Self {
        Self::cmp(column, CmpOp::Eq, value)
    }

    pub fn ne(column: &str, value: impl Into<DbValue>) -> Self {
        Self::cmp(column, CmpOp::Ne, value)
    }

    pub fn gt(column: &str, value: impl Into<DbValue>) -> Self {
        Self::cmp(column, CmpOp::Gt, value)
    }

    pub fn ge(column: &str, value: impl Into<DbValue>) -> Self {
        Self::cmp(column, CmpOp::Ge, value)
    }

    pub fn lt(column: &str, value: impl Into<DbValue>) -> Self {
        Self::cmp(column, CmpOp::Lt, value)
    }

    pub fn le(column: &str, value: impl Into<DbValue>) -> Self {
        Self::cmp(column, CmpOp::Le, value)
    }

    pub fn like(column: &str, pattern: impl Into<String>) -> Self {
        Self::cmp(column, CmpOp::Like, DbValue::Text(pattern.into()))
    }

    #[must_use]
    pub fn is_null(column: &str) -> Self {
        check_identifier(column);
        Filter::IsNull(column.to_owned())
    }

    #[must_use]
    pub fn is_not_null(column: &str) -> Self {
        check_identifier(column);
        Filter::IsNotNull(column.to_owned())
    }

    #[must_use]
    pub fn all(children: Vec<Filter>) -> Self {
        Filter::All(children)
    }

    #[must_use]
    pub fn any(children: Vec<Filter>) -> Self {
        Filter::Any(children)
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All(mut children) => {
                children.push(other);
                Filter::All(children)
            }
            first => Filter::All(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Any(mut children) => {
                children.push(other);
                Filter::Any(children)
            }
            first => Filter::Any(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Render the predicate as SQL text.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Filter::Cmp { column, op, value } => {
                format!("{column} {} {}", op.as_sql(), value.to_sql_literal())
            }
            Filter::IsNull(column) => format!("{column} IS NULL"),
            Filter::IsNotNull(column) => format!("{column} IS NOT NULL"),
            Filter::All(children) => render_composite(children, "AND", "TRUE"),
            Filter::Any(children) => render_composite(children, "OR", "FALSE"),
            Filter::Not(inner) => format!("NOT ({})", inner.to_sql()),
        }
    }
}

fn render_composite(children: &[Filter], joiner: &str, empty: &str) -> String {
    match children {
        [] => empty.to_owned(),
        [single] => single.to_sql(),
        many => {
            let parts: Vec<String> = many.iter().map(Filter::to_sql).collect();
            format!("({})", parts.join(&format!(" {joiner} ")))
        }
    }
}

/// Validate a table or column identifier before it reaches statement text.
///
/// # Panics
/// Panics on anything outside `[A-Za-z_][A-Za-z0-9_]*` — identifiers come
/// from code, never from user input, so a bad one is a programming error.
pub(crate) fn check_identifier(name: &str) {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    assert!(head_ok && tail_ok, "invalid SQL identifier: {name:?}");
}
