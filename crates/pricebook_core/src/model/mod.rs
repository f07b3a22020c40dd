//! Domain model for priced date ranges.
//!
//! # Responsibility
//! - Define the canonical value type handled by stores and services.
//!
//! # Invariants
//! - Every constructed value satisfies `start_date <= end_date` and
//!   `price >= 0`.

pub mod interval;
