//! In-memory implementation of the interval store.
//!
//! Rows live in a `Vec` kept sorted by `(start_date, id)`. Identities are
//! assigned as `max(id) + 1`. Intended for tests and throwaway sessions.

use super::{IntervalStore, StoreError, StoreResult};
use crate::model::interval::{IntervalId, PricedInterval};
use std::cell::RefCell;

#[derive(Debug, Default)]
pub struct MemoryIntervalStore {
    rows: RefCell<Vec<PricedInterval>>,
}

impl MemoryIntervalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `rows`.
    ///
    /// Rows without identity get one assigned; existing identities are kept
    /// as given.
    pub fn with_rows(rows: impl IntoIterator<Item = PricedInterval>) -> Self {
        let store = Self::new();
        {
            let mut stored = store.rows.borrow_mut();
            for row in rows {
                let row = match row.id() {
                    Some(_) => row,
                    None => {
                        let id = next_id(&stored);
                        row.with_identity(id)
                    }
                };
                stored.push(row);
            }
            sort_rows(&mut stored);
        }
        store
    }
}

impl IntervalStore for MemoryIntervalStore {
    fn list_all(&self) -> StoreResult<Vec<PricedInterval>> {
        Ok(self.rows.borrow().clone())
    }

    fn get(&self, id: IntervalId) -> StoreResult<PricedInterval> {
        self.rows
            .borrow()
            .iter()
            .find(|row| row.id() == Some(id))
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn find_colliding(
        &self,
        candidate: &PricedInterval,
        exclude_ids: &[IntervalId],
    ) -> StoreResult<Option<PricedInterval>> {
        Ok(self
            .rows
            .borrow()
            .iter()
            .filter(|row| row.id().map_or(true, |id| !exclude_ids.contains(&id)))
            .find(|row| candidate.collides_with(row))
            .cloned())
    }

    fn insert(&self, interval: &PricedInterval) -> StoreResult<IntervalId> {
        let mut rows = self.rows.borrow_mut();
        let id = next_id(&rows);
        rows.push(interval.clone().with_identity(id));
        sort_rows(&mut rows);
        Ok(id)
    }

    fn update(&self, interval: &PricedInterval) -> StoreResult<()> {
        let id = interval.id().ok_or(StoreError::MissingIdentity)?;
        let mut rows = self.rows.borrow_mut();
        let slot = rows
            .iter_mut()
            .find(|row| row.id() == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        *slot = interval.clone();
        sort_rows(&mut rows);
        Ok(())
    }

    fn delete(&self, id: IntervalId) -> StoreResult<()> {
        self.rows.borrow_mut().retain(|row| row.id() != Some(id));
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.rows.borrow_mut().clear();
        Ok(())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.rows.borrow().len())
    }

    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.rows.borrow().clone();
        let result = op(self);
        if result.is_err() {
            *self.rows.borrow_mut() = snapshot;
        }
        result
    }
}

fn next_id(rows: &[PricedInterval]) -> IntervalId {
    rows.iter().filter_map(PricedInterval::id).max().unwrap_or(0) + 1
}

fn sort_rows(rows: &mut [PricedInterval]) {
    rows.sort_by_key(|row| (row.start_date(), row.id()));
}
