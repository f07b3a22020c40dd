//! Raw request validation into domain intervals.
//!
//! # Responsibility
//! - Turn untrusted string parameters into a validated `PricedInterval`.
//! - Report malformed input with stable, user-facing messages.
//!
//! # Invariants
//! - Dates must be exactly `YYYY-MM-DD` and name a real calendar day.
//! - Prices are decimal numbers with an optional exponent (`1.5e3`); sign
//!   and range are checked by the entity constructor.

use crate::model::interval::{IntervalId, IntervalValidationError, PricedInterval};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("valid price regex")
});
static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid id regex"));

/// Request-layer validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A required parameter is absent.
    MissingParameters,
    BadStartDate(String),
    BadEndDate(String),
    BadPrice(String),
    BadId(String),
    /// Parameters parsed but the interval itself is invalid.
    Validation(IntervalValidationError),
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParameters => write!(f, "Invalid parameters"),
            Self::BadStartDate(_) => write!(f, "Start Date has a bad format"),
            Self::BadEndDate(_) => write!(f, "End Date has a bad format"),
            Self::BadPrice(_) => write!(f, "Price is not a float number"),
            Self::BadId(_) => write!(f, "Id is not a valid identifier"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntervalValidationError> for RequestError {
    fn from(value: IntervalValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Unvalidated interval parameters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IntervalInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

impl IntervalInput {
    /// Validates the parameters into an interval.
    ///
    /// A present `id` marks the result as an update of that identity.
    pub fn into_interval(self) -> Result<PricedInterval, RequestError> {
        let (Some(start), Some(end), Some(price)) = (self.start_date, self.end_date, self.price)
        else {
            return Err(RequestError::MissingParameters);
        };

        let start_date = parse_date(&start).ok_or(RequestError::BadStartDate(start))?;
        let end_date = parse_date(&end).ok_or(RequestError::BadEndDate(end))?;
        let price = parse_price(&price).ok_or(RequestError::BadPrice(price))?;
        let interval = PricedInterval::new(start_date, end_date, price)?;

        match self.id {
            Some(raw) => Ok(interval.with_identity(parse_id(&raw)?)),
            None => Ok(interval),
        }
    }
}

/// Parses a positive interval identity.
pub fn parse_id(raw: &str) -> Result<IntervalId, RequestError> {
    let trimmed = raw.trim();
    if !ID_RE.is_match(trimmed) {
        return Err(RequestError::BadId(raw.to_string()));
    }
    match trimmed.parse::<IntervalId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(RequestError::BadId(raw.to_string())),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !DATE_RE.is_match(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if !PRICE_RE.is_match(trimmed) {
        return None;
    }
    let unsigned = trimmed.trim_start_matches('+');
    if unsigned.contains(['e', 'E']) {
        return Decimal::from_scientific(unsigned).ok();
    }
    Decimal::from_str(unsigned).ok()
}
