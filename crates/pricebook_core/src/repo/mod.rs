//! Interval store contract and its implementations.
//!
//! # Responsibility
//! - Define the persistence contract consumed by the reconciliation engine.
//! - Provide a SQLite-backed store and an in-memory store for tests.
//!
//! # Invariants
//! - `list_all` and `find_colliding` order rows by `start_date ASC, id ASC`.
//! - `insert` always assigns a fresh identity.
//! - `atomically` applies every mutation issued by its closure, or none.

use crate::db::DbError;
use crate::model::interval::{IntervalId, IntervalValidationError, PricedInterval};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_store;
pub mod sqlite_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(IntervalId),
    /// `update` was called with a value that was never persisted.
    MissingIdentity,
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "interval not found: {id}"),
            Self::MissingIdentity => write!(f, "interval has no identity"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "interval store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted interval data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<IntervalValidationError> for StoreError {
    fn from(value: IntervalValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Persistence contract for priced intervals.
pub trait IntervalStore {
    /// Lists every stored interval, ascending by `start_date`.
    fn list_all(&self) -> StoreResult<Vec<PricedInterval>>;
    /// Loads one interval or fails with `NotFound`.
    fn get(&self, id: IntervalId) -> StoreResult<PricedInterval>;
    /// Returns the first stored interval (by `start_date`) outside
    /// `exclude_ids` that overlaps `candidate`, or sits one day away from it
    /// with an equal price.
    fn find_colliding(
        &self,
        candidate: &PricedInterval,
        exclude_ids: &[IntervalId],
    ) -> StoreResult<Option<PricedInterval>>;
    /// Persists a new row and returns its assigned identity.
    fn insert(&self, interval: &PricedInterval) -> StoreResult<IntervalId>;
    /// Overwrites dates and price of an existing row.
    fn update(&self, interval: &PricedInterval) -> StoreResult<()>;
    /// Removes one row; missing ids are a no-op.
    fn delete(&self, id: IntervalId) -> StoreResult<()>;
    fn delete_all(&self) -> StoreResult<()>;
    fn count(&self) -> StoreResult<usize>;
    /// Runs `op` as one all-or-nothing unit of work.
    ///
    /// When `op` fails, every mutation it issued is rolled back before the
    /// error is returned.
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>;
}
