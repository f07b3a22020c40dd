//! Core domain logic for Pricebook.
//! Keeps a set of priced date ranges free of overlaps and of mergeable
//! neighbours, reconciling every saved range against what is stored.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod request;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::interval::{IntervalId, IntervalValidationError, PricedInterval};
pub use repo::memory_store::MemoryIntervalStore;
pub use repo::sqlite_store::SqliteIntervalStore;
pub use repo::{IntervalStore, StoreError, StoreResult};
pub use request::{parse_id, IntervalInput, RequestError};
pub use service::interval_service::{IntervalService, Relation, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
