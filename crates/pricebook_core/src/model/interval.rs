//! Priced interval domain model.
//!
//! # Responsibility
//! - Define the canonical `[start_date, end_date] @ price` record.
//! - Enforce entity-level invariants at construction and on every date change.
//! - Provide calendar relations (overlap, one-day adjacency) used by the
//!   reconciliation engine and the in-memory store.
//!
//! # Invariants
//! - `start_date <= end_date` (inclusive, whole-day granularity).
//! - `price >= 0`, kept in normalized decimal form.
//! - `id` is `None` until the store assigns one, then stable.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identity of a persisted interval.
pub type IntervalId = i64;

/// Validation failure for interval construction or date mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalValidationError {
    /// `start_date` is later than `end_date`.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// `price` is below zero.
    NegativePrice(Decimal),
    /// Day arithmetic left the representable calendar range.
    DateOutOfRange,
}

impl Display for IntervalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndBeforeStart { .. } => write!(f, "end before start"),
            Self::NegativePrice(_) => write!(f, "negative price"),
            Self::DateOutOfRange => write!(f, "date out of range"),
        }
    }
}

impl Error for IntervalValidationError {}

/// Closed calendar-day range carrying one price.
///
/// Fields are private so every date change goes through a re-validating
/// `with_*` method. The engine threads these values through each step
/// instead of mutating shared records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PricedIntervalWire")]
pub struct PricedInterval {
    id: Option<IntervalId>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

#[derive(Deserialize)]
struct PricedIntervalWire {
    #[serde(default)]
    id: Option<IntervalId>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

impl TryFrom<PricedIntervalWire> for PricedInterval {
    type Error = IntervalValidationError;

    fn try_from(wire: PricedIntervalWire) -> Result<Self, Self::Error> {
        let interval = Self::new(wire.start_date, wire.end_date, wire.price)?;
        Ok(match wire.id {
            Some(id) => interval.with_identity(id),
            None => interval,
        })
    }
}

impl PricedInterval {
    /// Creates an unpersisted interval.
    ///
    /// # Errors
    /// - `EndBeforeStart` when `start_date > end_date`.
    /// - `NegativePrice` when `price < 0`.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: Decimal,
    ) -> Result<Self, IntervalValidationError> {
        validate_range(start_date, end_date)?;
        if price < Decimal::ZERO {
            return Err(IntervalValidationError::NegativePrice(price));
        }

        Ok(Self {
            id: None,
            start_date,
            end_date,
            price: price.normalize(),
        })
    }

    /// Creates an interval that already carries a store identity.
    ///
    /// Used by store read paths and by callers editing a fetched row.
    pub fn with_id(
        id: IntervalId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: Decimal,
    ) -> Result<Self, IntervalValidationError> {
        Ok(Self::new(start_date, end_date, price)?.with_identity(id))
    }

    /// Creates an interval from two instants in any time zone.
    ///
    /// Both instants are moved to UTC and truncated to the calendar day
    /// before validation.
    pub fn from_datetimes<Tz: TimeZone>(
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
        price: Decimal,
    ) -> Result<Self, IntervalValidationError> {
        Self::new(to_reference_day(start), to_reference_day(end), price)
    }

    pub fn id(&self) -> Option<IntervalId> {
        self.id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Returns whether this value has been persisted.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns a copy bound to `id`.
    pub fn with_identity(mut self, id: IntervalId) -> Self {
        self.id = Some(id);
        self
    }

    /// Returns a copy with both dates replaced, re-validated.
    pub fn with_dates(
        mut self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, IntervalValidationError> {
        validate_range(start_date, end_date)?;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(self)
    }

    /// Returns a copy with `start_date` replaced, re-validated.
    pub fn with_start_date(self, start_date: NaiveDate) -> Result<Self, IntervalValidationError> {
        let end_date = self.end_date;
        self.with_dates(start_date, end_date)
    }

    /// Returns a copy with `end_date` replaced, re-validated.
    pub fn with_end_date(self, end_date: NaiveDate) -> Result<Self, IntervalValidationError> {
        let start_date = self.start_date;
        self.with_dates(start_date, end_date)
    }

    /// Returns whether both ranges share at least one day.
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.end_date < other.start_date || self.start_date > other.end_date)
    }

    /// Returns whether one range ends exactly the day before the other starts.
    pub fn is_adjacent_to(&self, other: &Self) -> bool {
        day_gap(self.end_date, other.start_date) == 1
            || day_gap(other.end_date, self.start_date) == 1
    }

    pub fn same_price(&self, other: &Self) -> bool {
        self.price == other.price
    }

    /// Returns whether `other` must be reconciled against this interval:
    /// it overlaps, or it is adjacent and mergeable (equal price).
    pub fn collides_with(&self, other: &Self) -> bool {
        self.overlaps(other) || (self.same_price(other) && self.is_adjacent_to(other))
    }

    /// Returns whether both values describe the same dates and price,
    /// ignoring identity.
    pub fn same_extent(&self, other: &Self) -> bool {
        self.start_date == other.start_date
            && self.end_date == other.end_date
            && self.price == other.price
    }

    /// Number of calendar days covered, inclusive.
    pub fn day_count(&self) -> i64 {
        day_gap(self.start_date, self.end_date) + 1
    }
}

impl Display for PricedInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]@{}", self.start_date, self.end_date, self.price)
    }
}

/// Day after `date`, or `DateOutOfRange` at the calendar maximum.
pub fn next_day(date: NaiveDate) -> Result<NaiveDate, IntervalValidationError> {
    date.succ_opt()
        .ok_or(IntervalValidationError::DateOutOfRange)
}

/// Day before `date`, or `DateOutOfRange` at the calendar minimum.
pub fn previous_day(date: NaiveDate) -> Result<NaiveDate, IntervalValidationError> {
    date.pred_opt()
        .ok_or(IntervalValidationError::DateOutOfRange)
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), IntervalValidationError> {
    if start > end {
        return Err(IntervalValidationError::EndBeforeStart { start, end });
    }
    Ok(())
}

fn day_gap(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

fn to_reference_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Utc).date_naive()
}
