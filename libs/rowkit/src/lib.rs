//! Minimal relational access layer between application entities and a SQL
//! backend.
//!
//! The crate owns four things and nothing else:
//! - schema introspection producing validated table descriptors,
//! - assembly of SQL text from structured filter/order/limit primitives,
//! - bidirectional mapping between driver rows and class-tagged entities,
//! - a single-handle session with batched, atomic transactions.
//!
//! The transport is an injected [`Driver`] (a SQLite implementation backed
//! by sqlx ships behind the default `sqlite` feature), the entity classes
//! live in an injected [`EntityRegistry`], and per-statement telemetry goes
//! to an injected [`QuerySink`]. There is no pooling, no retry and no
//! caching here; those are caller concerns.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use rowkit::{DbSession, Entity, Filter, SqliteConnector, StaticRegistry, TracingSink};
//!
//! # async fn demo() -> rowkit::Result<()> {
//! let session = DbSession::new(
//!     Arc::new(SqliteConnector::new("sqlite::memory:")),
//!     Arc::new(StaticRegistry::new().register("person", "Person")),
//!     Arc::new(TracingSink),
//! );
//! session.connect().await?;
//!
//! let ada = Entity::new("person", "Person")
//!     .with("name", "Ada")
//!     .with("age", 36);
//! let ada = session.insert(&ada).await?;
//! let found = session.find_by_id("person", ada.id().unwrap()).await?;
//! assert!(found.is_some());
//!
//! let adults = session.count("person", Some(&Filter::ge("age", 18)), None).await?;
//! # let _ = adults;
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod builder;
pub mod codec;
pub mod driver;
pub mod entity;
pub mod filter;
pub mod schema;
pub mod session;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod telemetry;
pub mod value;

mod introspect;

pub use builder::{Order, SelectOptions};
pub use codec::{CodecError, ColumnValues, decode_row, encode_entity};
pub use driver::{Connector, Driver, DriverError, SqlRow};
pub use entity::{Entity, EntityRegistry, Envelope, StaticRegistry};
pub use filter::{CmpOp, Filter};
pub use schema::{Column, ColumnType, TableDescriptor, map_type};
pub use session::{DbSession, Transaction};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnector;
pub use telemetry::{QueryEvent, QuerySink, TracingSink};
pub use value::DbValue;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the session and helpers.
///
/// Schema-validation failures are deliberately not here: introspection
/// signals them by absence (`Ok(None)`), never by error.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("not connected")]
    NotConnected,

    #[error("row for table '{table}' has no id")]
    MissingId { table: String },

    #[error("unexpected result shape from {operation}: {detail}")]
    UnexpectedShape {
        operation: &'static str,
        detail: String,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
