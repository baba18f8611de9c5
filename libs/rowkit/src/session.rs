//! The connection/transaction manager.
//!
//! A [`DbSession`] owns at most one live driver handle, executes built
//! statements on it, batches transactional writes, and reports one telemetry
//! event per executed statement. Collaborators (connector, registry, sink)
//! are injected at construction.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::builder::{self, SelectOptions};
use crate::codec::{decode_row, encode_entity};
use crate::driver::{Connector, Driver, SqlRow};
use crate::entity::{Entity, EntityRegistry};
use crate::filter::Filter;
use crate::introspect;
use crate::schema::TableDescriptor;
use crate::telemetry::{QueryEvent, QuerySink};
use crate::value::DbValue;
use crate::{DbError, Result};

/// An ordered batch of pending statements, created empty by
/// [`DbSession::transaction`] and spent by [`DbSession::commit`].
///
/// Single use is enforced by move semantics: `commit` consumes the value.
#[derive(Debug, Default)]
pub struct Transaction {
    statements: Vec<String>,
}

impl Transaction {
    fn push(&mut self, statement: String) {
        self.statements.push(statement);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Connection state machine: `Disconnected -> Connected -> Disconnected`.
/// Every data operation requires `Connected` and fails with
/// [`DbError::NotConnected`] otherwise; there is no implicit reconnect and
/// no retry anywhere in this layer.
pub struct DbSession {
    connector: Arc<dyn Connector>,
    registry: Arc<dyn EntityRegistry>,
    sink: Arc<dyn QuerySink>,
    // Also serializes statements: one in-flight statement per handle.
    driver: tokio::sync::Mutex<Option<Box<dyn Driver>>>,
}

impl DbSession {
    #[must_use]
    pub fn new(
        connector: Arc<dyn Connector>,
        registry: Arc<dyn EntityRegistry>,
        sink: Arc<dyn QuerySink>,
    ) -> Self {
        Self {
            connector,
            registry,
            sink,
            driver: tokio::sync::Mutex::new(None),
        }
    }

    /// Open the underlying transport. Idempotent while already connected.
    ///
    /// # Errors
    /// Returns the connector's error when the transport cannot be opened.
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.driver.lock().await;
        if guard.is_none() {
            *guard = Some(self.connector.open().await?);
        }
        Ok(())
    }

    /// Close the handle unconditionally.
    pub async fn disconnect(&self) {
        let mut guard = self.driver.lock().await;
        if let Some(driver) = guard.take() {
            driver.close().await;
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.driver.lock().await.is_some()
    }

    // --- reads ---

    /// Select entities. Decode failures are typed errors, distinct from a
    /// legitimately empty result.
    ///
    /// # Errors
    /// Connection-state, driver and codec errors propagate.
    pub async fn find(&self, table: &str, options: &SelectOptions) -> Result<Vec<Entity>> {
        let rows = self.query_logged(builder::select(table, options)).await?;
        let mut entities = Vec::with_capacity(rows.len());
        for row in &rows {
            entities.push(decode_row(self.registry.as_ref(), table, row)?);
        }
        Ok(entities)
    }

    /// # Errors
    /// Connection-state, driver and codec errors propagate.
    pub async fn find_by_id(&self, table: &str, id: i64) -> Result<Option<Entity>> {
        let options = SelectOptions::new().with_filter(Filter::eq("id", id));
        Ok(self.find(table, &options).await?.into_iter().next())
    }

    /// [`DbSession::find`] with `LIMIT 1`.
    ///
    /// # Errors
    /// Connection-state, driver and codec errors propagate.
    pub async fn find_single(&self, table: &str, options: &SelectOptions) -> Result<Option<Entity>> {
        let options = options.clone().with_limit(1);
        Ok(self.find(table, &options).await?.into_iter().next())
    }

    /// # Errors
    /// A result shape other than exactly one row with one non-negative
    /// integer column is [`DbError::UnexpectedShape`]; driver errors
    /// propagate.
    pub async fn count(&self, table: &str, filter: Option<&Filter>, limit: Option<u64>) -> Result<u64> {
        let rows = self.query_logged(builder::count(table, filter, limit)).await?;
        let value = match rows.as_slice() {
            [row] => row.single().and_then(DbValue::as_integer),
            _ => None,
        };
        match value {
            Some(n) if n >= 0 => Ok(n.unsigned_abs()),
            _ => Err(DbError::UnexpectedShape {
                operation: "count",
                detail: "expected exactly one row with one integer column".to_owned(),
            }),
        }
    }

    // --- direct writes ---

    /// Insert `row`, returning a new entity carrying the server-assigned id.
    /// The caller's entity is left untouched.
    ///
    /// # Errors
    /// [`DbError::UnexpectedShape`] unless the driver returns exactly one
    /// row with one integer column; codec and driver errors propagate.
    pub async fn insert(&self, row: &Entity) -> Result<Entity> {
        let values = encode_entity(row)?;
        let rows = self.query_logged(builder::insert(row.table(), &values)).await?;
        let id = match rows.as_slice() {
            [returned] => returned.single().and_then(DbValue::as_integer),
            _ => None,
        }
        .ok_or_else(|| DbError::UnexpectedShape {
            operation: "insert",
            detail: "expected exactly one returned row with the generated id".to_owned(),
        })?;
        let mut inserted = row.clone();
        inserted.set("id", id);
        Ok(inserted)
    }

    /// Update every non-`id` column of `row`, keyed by its id. `Ok(true)`
    /// iff exactly one row was affected.
    ///
    /// # Errors
    /// [`DbError::MissingId`] when the row has no id; codec and driver
    /// errors propagate.
    pub async fn update(&self, row: &Entity) -> Result<bool> {
        let id = self.require_id(row)?;
        let values = encode_entity(row)?;
        let affected = self
            .execute_logged(builder::update(row.table(), id, &values))
            .await?;
        Ok(affected == 1)
    }

    /// Delete by predicate, returning the number of affected rows. The
    /// filter is mandatory by signature; deleting everything takes an
    /// explicit tautology.
    ///
    /// # Errors
    /// Connection-state and driver errors propagate.
    pub async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        self.execute_logged(builder::delete_where(table, filter)).await
    }

    /// Delete `row` by its own id. `Ok(true)` iff exactly one row was
    /// affected.
    ///
    /// # Errors
    /// [`DbError::MissingId`] when the row has no id; driver errors
    /// propagate.
    pub async fn delete_row(&self, row: &Entity) -> Result<bool> {
        let id = self.require_id(row)?;
        let affected = self
            .execute_logged(builder::delete_by_id(row.table(), id))
            .await?;
        Ok(affected == 1)
    }

    // --- transactional writes ---

    /// A fresh, empty transaction bound to this session.
    #[must_use]
    pub fn transaction(&self) -> Transaction {
        Transaction::default()
    }

    /// Append an insert to `tx` without executing it. The generated id is
    /// not available for enqueued inserts.
    ///
    /// # Errors
    /// Codec errors propagate; nothing is executed.
    pub fn enqueue_insert(&self, row: &Entity, tx: &mut Transaction) -> Result<()> {
        let values = encode_entity(row)?;
        tx.push(builder::insert(row.table(), &values));
        Ok(())
    }

    /// Append an update to `tx` without executing it.
    ///
    /// # Errors
    /// [`DbError::MissingId`] when the row has no id; codec errors propagate.
    pub fn enqueue_update(&self, row: &Entity, tx: &mut Transaction) -> Result<()> {
        let id = self.require_id(row)?;
        let values = encode_entity(row)?;
        tx.push(builder::update(row.table(), id, &values));
        Ok(())
    }

    /// Append a delete-by-predicate to `tx` without executing it.
    pub fn enqueue_delete(&self, table: &str, filter: &Filter, tx: &mut Transaction) {
        tx.push(builder::delete_where(table, filter));
    }

    /// Append a delete of `row` by its own id to `tx` without executing it.
    ///
    /// # Errors
    /// [`DbError::MissingId`] when the row has no id.
    pub fn enqueue_delete_row(&self, row: &Entity, tx: &mut Transaction) -> Result<()> {
        let id = self.require_id(row)?;
        tx.push(builder::delete_by_id(row.table(), id));
        Ok(())
    }

    /// Run all enqueued statements as one atomic unit and spend the
    /// transaction. One telemetry event is recorded for the whole batch.
    ///
    /// # Errors
    /// Connection-state errors and the underlying driver error propagate;
    /// on error none of the statements took effect.
    ///
    /// # Panics
    /// Panics on an empty transaction (programming error).
    pub async fn commit(&self, tx: Transaction) -> Result<()> {
        assert!(!tx.is_empty(), "commit of an empty transaction");
        self.atomic_logged(tx.statements).await
    }

    // --- introspection ---

    /// Table names in the default application schema, in catalog order.
    ///
    /// # Errors
    /// Connection-state and driver errors propagate.
    pub async fn list_table_names(&self) -> Result<Vec<String>> {
        let rows = self.query_logged(introspect::tables_query()).await?;
        Ok(introspect::parse_table_names(&rows))
    }

    /// A validated descriptor for `name`, or `Ok(None)` when the table is
    /// absent or fails the layer's invariants (unmappable column type,
    /// missing integer `id`). Schema validation never surfaces as an error.
    ///
    /// # Errors
    /// Connection-state and driver errors propagate.
    pub async fn describe_table(&self, name: &str) -> Result<Option<TableDescriptor>> {
        let rows = self.query_logged(introspect::columns_query(name)).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(introspect::parse_descriptor(name, &rows))
    }

    // --- internals ---

    fn require_id(&self, row: &Entity) -> Result<i64> {
        row.id().ok_or_else(|| DbError::MissingId {
            table: row.table().to_owned(),
        })
    }

    async fn query_logged(&self, sql: String) -> Result<Vec<SqlRow>> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref().ok_or(DbError::NotConnected)?;
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcome = driver.query(&sql).await;
        let duration = clock.elapsed();
        match outcome {
            Ok(rows) => {
                self.sink.record(QueryEvent::success(
                    sql,
                    started_at,
                    duration,
                    Some(rows.len() as u64),
                ));
                Ok(rows)
            }
            Err(err) => {
                self.sink
                    .record(QueryEvent::failed(sql, started_at, duration, err.to_string()));
                Err(err.into())
            }
        }
    }

    async fn execute_logged(&self, sql: String) -> Result<u64> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref().ok_or(DbError::NotConnected)?;
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcome = driver.execute(&sql).await;
        let duration = clock.elapsed();
        match outcome {
            Ok(affected) => {
                self.sink
                    .record(QueryEvent::success(sql, started_at, duration, Some(affected)));
                Ok(affected)
            }
            Err(err) => {
                self.sink
                    .record(QueryEvent::failed(sql, started_at, duration, err.to_string()));
                Err(err.into())
            }
        }
    }

    async fn atomic_logged(&self, statements: Vec<String>) -> Result<()> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref().ok_or(DbError::NotConnected)?;
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcome = driver.run_atomic(&statements).await;
        let duration = clock.elapsed();
        let batch = statements.join("; ");
        match outcome {
            Ok(()) => {
                self.sink
                    .record(QueryEvent::success(batch, started_at, duration, None));
                Ok(())
            }
            Err(err) => {
                self.sink
                    .record(QueryEvent::failed(batch, started_at, duration, err.to_string()));
                Err(err.into())
            }
        }
    }
}
