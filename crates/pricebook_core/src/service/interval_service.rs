//! Interval reconciliation service.
//!
//! # Responsibility
//! - Provide list/get/save/delete entry points over an `IntervalStore`.
//! - Reconcile every saved interval against its stored neighbours so the
//!   stored set stays non-overlapping with no mergeable adjacency.
//!
//! # Invariants
//! - One `save` is one `store.atomically` unit; a failed save leaves the
//!   store untouched.
//! - Each loop step resolves exactly one colliding row by merging,
//!   trimming, splitting or deleting it.
//! - The loop is capped at `count + 2` steps; exceeding it means the store
//!   answered `find_colliding` inconsistently.

use crate::model::interval::{
    next_day, previous_day, IntervalId, IntervalValidationError, PricedInterval,
};
use crate::repo::{IntervalStore, StoreError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error surfaced by service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// A date change made during reconciliation broke entity invariants.
    Validation(IntervalValidationError),
    /// Referenced identity does not exist in the store.
    NotFound(IntervalId),
    /// Any other store failure.
    Persistence(StoreError),
    /// Reconciliation did not reach a fixed point within `limit` steps.
    ReconciliationDiverged { limit: usize },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "interval not found: {id}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::ReconciliationDiverged { limit } => {
                write!(f, "reconciliation exceeded {limit} steps")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::NotFound(_) | Self::ReconciliationDiverged { .. } => None,
        }
    }
}

impl From<IntervalValidationError> for ServiceError {
    fn from(value: IntervalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

/// How a candidate's range sits relative to one colliding stored row.
///
/// Variants are checked in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Candidate ends the day before the stored row starts.
    LeftAdjacent,
    /// Candidate starts the day after the stored row ends.
    RightAdjacent,
    /// Candidate covers the whole stored row.
    Encloses,
    /// Candidate covers the stored row's start but not its end.
    OverlapsStart,
    /// Candidate lies strictly inside the stored row.
    Inside,
    /// Candidate covers the stored row's end but not its start.
    OverlapsEnd,
}

impl Relation {
    /// Classifies a colliding pair. `stored` must collide with `candidate`.
    pub fn classify(candidate: &PricedInterval, stored: &PricedInterval) -> Self {
        if candidate.end_date() < stored.start_date() {
            Self::LeftAdjacent
        } else if candidate.start_date() > stored.end_date() {
            Self::RightAdjacent
        } else if candidate.start_date() <= stored.start_date() {
            if candidate.end_date() >= stored.end_date() {
                Self::Encloses
            } else {
                Self::OverlapsStart
            }
        } else if candidate.end_date() < stored.end_date() {
            Self::Inside
        } else {
            Self::OverlapsEnd
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::LeftAdjacent => "left_adjacent",
            Self::RightAdjacent => "right_adjacent",
            Self::Encloses => "encloses",
            Self::OverlapsStart => "overlaps_start",
            Self::Inside => "inside",
            Self::OverlapsEnd => "overlaps_end",
        }
    }
}

struct Reconciled {
    interval: PricedInterval,
    steps: usize,
    fixed_point: bool,
}

/// Use-case service for priced intervals.
pub struct IntervalService<S: IntervalStore> {
    store: S,
}

impl<S: IntervalStore> IntervalService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists all intervals ascending by start date.
    pub fn list_all(&self) -> ServiceResult<Vec<PricedInterval>> {
        Ok(self.store.list_all()?)
    }

    pub fn get(&self, id: IntervalId) -> ServiceResult<PricedInterval> {
        Ok(self.store.get(id)?)
    }

    /// Inserts or updates `candidate`, reconciling it against every stored
    /// interval it overlaps or can merge with.
    ///
    /// A candidate with an identity is an update: its own row is ignored
    /// while reconciling and overwritten at the end.
    ///
    /// Returns the interval as stored after reconciliation.
    ///
    /// # Errors
    /// - `NotFound` when updating an identity the store does not know.
    /// - `Validation` when a trimmed or extended date leaves the calendar.
    /// - `Persistence` for any store failure.
    /// - `ReconciliationDiverged` when the step cap is exceeded.
    ///
    /// On any error the store is rolled back to its state before the call.
    pub fn save(&self, candidate: PricedInterval) -> ServiceResult<PricedInterval> {
        let started_at = Instant::now();
        let mode = if candidate.is_persisted() {
            "update"
        } else {
            "insert"
        };
        let input = candidate.to_string();

        match self
            .store
            .atomically(|store| reconcile(store, candidate))
        {
            Ok(reconciled) => {
                info!(
                    "event=interval_save module=service status=ok mode={mode} id={} input={input} stored={} steps={} fixed_point={} duration_ms={}",
                    reconciled.interval.id().unwrap_or_default(),
                    reconciled.interval,
                    reconciled.steps,
                    reconciled.fixed_point,
                    started_at.elapsed().as_millis()
                );
                Ok(reconciled.interval)
            }
            Err(err) => {
                warn!(
                    "event=interval_save module=service status=error mode={mode} input={input} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Deletes one interval; unknown ids are a no-op.
    pub fn delete(&self, id: IntervalId) -> ServiceResult<()> {
        self.store.delete(id)?;
        info!("event=interval_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Deletes every interval.
    pub fn delete_all(&self) -> ServiceResult<()> {
        self.store.delete_all()?;
        info!("event=interval_delete_all module=service status=ok");
        Ok(())
    }
}

fn reconcile<S: IntervalStore>(
    store: &S,
    candidate: PricedInterval,
) -> ServiceResult<Reconciled> {
    let exclude_ids: Vec<IntervalId> = candidate.id().into_iter().collect();
    let limit = store.count()? + 2;

    let mut candidate = candidate;
    let mut steps = 0;
    let mut colliding = store.find_colliding(&candidate, &exclude_ids)?;

    while let Some(stored) = colliding {
        steps += 1;
        if steps > limit {
            return Err(ServiceError::ReconciliationDiverged { limit });
        }

        candidate = resolve(store, candidate, stored)?;
        colliding = store.find_colliding(&candidate, &exclude_ids)?;

        if let Some(duplicate) = colliding.as_ref() {
            if duplicate.same_extent(&candidate) {
                let interval = settle_duplicate(store, candidate, duplicate)?;
                return Ok(Reconciled {
                    interval,
                    steps,
                    fixed_point: true,
                });
            }
        }
    }

    let interval = match candidate.id() {
        Some(_) => {
            store.update(&candidate)?;
            candidate
        }
        None => {
            let id = store.insert(&candidate)?;
            candidate.with_identity(id)
        }
    };

    Ok(Reconciled {
        interval,
        steps,
        fixed_point: false,
    })
}

/// Applies the single transformation dictated by `Relation::classify` and
/// returns the (possibly widened) candidate.
fn resolve<S: IntervalStore>(
    store: &S,
    candidate: PricedInterval,
    stored: PricedInterval,
) -> ServiceResult<PricedInterval> {
    let stored_id = stored.id().ok_or(StoreError::MissingIdentity)?;
    let relation = Relation::classify(&candidate, &stored);
    let same_price = candidate.same_price(&stored);
    debug!(
        "event=interval_resolve module=service relation={} candidate={candidate} stored_id={stored_id} stored={stored} same_price={same_price}",
        relation.as_str()
    );

    let candidate = match relation {
        Relation::LeftAdjacent => {
            let merged = candidate.with_end_date(stored.end_date())?;
            store.delete(stored_id)?;
            merged
        }
        Relation::RightAdjacent => {
            let merged = candidate.with_start_date(stored.start_date())?;
            store.delete(stored_id)?;
            merged
        }
        Relation::Encloses => {
            store.delete(stored_id)?;
            candidate
        }
        Relation::OverlapsStart if same_price => {
            let merged = candidate.with_end_date(stored.end_date())?;
            store.delete(stored_id)?;
            merged
        }
        Relation::OverlapsStart => {
            let trimmed = stored.with_start_date(next_day(candidate.end_date())?)?;
            store.update(&trimmed)?;
            candidate
        }
        Relation::Inside if same_price => {
            let merged = candidate.with_dates(stored.start_date(), stored.end_date())?;
            store.delete(stored_id)?;
            merged
        }
        Relation::Inside => {
            let tail = PricedInterval::new(
                next_day(candidate.end_date())?,
                stored.end_date(),
                stored.price(),
            )?;
            let head = stored.with_end_date(previous_day(candidate.start_date())?)?;
            store.update(&head)?;
            store.insert(&tail)?;
            candidate
        }
        Relation::OverlapsEnd if same_price => {
            let merged = candidate.with_start_date(stored.start_date())?;
            store.delete(stored_id)?;
            merged
        }
        Relation::OverlapsEnd => {
            let trimmed = stored.with_end_date(previous_day(candidate.start_date())?)?;
            store.update(&trimmed)?;
            candidate
        }
    };

    Ok(candidate)
}

/// Ends reconciliation when the store already holds a row identical to the
/// candidate.
///
/// Inserts stop here and report the stored row without persisting.
///
/// Updates intentionally do not stop there: stopping would leave the
/// candidate's own row at its old dates next to an identical copy. The
/// duplicate row is dropped instead and the candidate's row is rewritten,
/// so the caller keeps its identity.
fn settle_duplicate<S: IntervalStore>(
    store: &S,
    candidate: PricedInterval,
    duplicate: &PricedInterval,
) -> ServiceResult<PricedInterval> {
    if candidate.id().is_none() {
        return Ok(duplicate.clone());
    }

    if let Some(duplicate_id) = duplicate.id() {
        store.delete(duplicate_id)?;
    }
    store.update(&candidate)?;
    Ok(candidate)
}
