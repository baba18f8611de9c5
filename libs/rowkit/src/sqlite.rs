//! sqlx-backed SQLite driver and connector.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Row as _, TypeInfo as _, ValueRef as _};

use crate::driver::{Connector, Driver, DriverError, SqlRow};
use crate::value::DbValue;

/// Opens SQLite handles for a session.
///
/// The pool is capped at one connection: the session owns a single handle
/// (overlapping statements are serialized above us) and `sqlite::memory:`
/// databases are per-connection, so a wider pool would fragment them.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    dsn: String,
}

impl SqliteConnector {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn open(&self) -> Result<Box<dyn Driver>, DriverError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&self.dsn)
            .await?;
        Ok(Box::new(SqliteDriver { pool }))
    }
}

pub struct SqliteDriver {
    pool: SqlitePool,
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn execute(&self, sql: &str) -> Result<u64, DriverError> {
        Ok(sqlx::query(sql).execute(&self.pool).await?.rows_affected())
    }

    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DriverError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(convert_row).collect()
    }

    async fn run_atomic(&self, statements: &[String]) -> Result<(), DriverError> {
        let mut tx = self.pool.begin().await?;
        for sql in statements {
            if let Err(err) = sqlx::query(sql).execute(&mut *tx).await {
                // Best-effort rollback; keep the original error.
                let _ = tx.rollback().await;
                return Err(err.into());
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn convert_row(row: &SqliteRow) -> Result<SqlRow, DriverError> {
    let mut out = SqlRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            DbValue::Null
        } else {
            let type_info = raw.type_info();
            match type_info.name() {
                "INTEGER" => DbValue::Integer(row.try_get(idx)?),
                "BOOLEAN" => DbValue::Boolean(row.try_get(idx)?),
                "REAL" | "NUMERIC" => DbValue::Float(row.try_get(idx)?),
                "TEXT" | "DATETIME" | "DATE" | "TIME" => DbValue::Text(row.try_get(idx)?),
                other => {
                    return Err(DriverError::Statement(format!(
                        "unsupported SQLite value type '{other}' in column '{}'",
                        column.name()
                    )));
                }
            }
        };
        out.push(column.name(), value);
    }
    Ok(out)
}
