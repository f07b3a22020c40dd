//! SQLite implementation of the interval store.
//!
//! # Responsibility
//! - Keep SQL details of the `price_intervals` table inside this module.
//! - Provide transactional grouping for one reconciliation.
//!
//! # Invariants
//! - Dates are stored as integer day numbers (`num_days_from_ce`), so SQL
//!   ordering and range checks match calendar order for any year.
//! - Prices are stored as normalized decimal text, so equal prices compare
//!   equal in SQL.
//! - Read paths reject invalid persisted rows instead of masking them.

use super::{IntervalStore, StoreError, StoreResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::interval::{IntervalId, PricedInterval};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::str::FromStr;

const INTERVAL_SELECT_SQL: &str = "SELECT
    id,
    start_day,
    end_day,
    price
FROM price_intervals";

/// SQLite-backed interval store.
pub struct SqliteIntervalStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIntervalStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl IntervalStore for SqliteIntervalStore<'_> {
    fn list_all(&self) -> StoreResult<Vec<PricedInterval>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INTERVAL_SELECT_SQL} ORDER BY start_day ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut intervals = Vec::new();
        while let Some(row) = rows.next()? {
            intervals.push(parse_interval_row(row)?);
        }
        Ok(intervals)
    }

    fn get(&self, id: IntervalId) -> StoreResult<PricedInterval> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INTERVAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_interval_row(row);
        }

        Err(StoreError::NotFound(id))
    }

    fn find_colliding(
        &self,
        candidate: &PricedInterval,
        exclude_ids: &[IntervalId],
    ) -> StoreResult<Option<PricedInterval>> {
        let mut sql = format!(
            "{INTERVAL_SELECT_SQL}
             WHERE (
                NOT (?1 < start_day OR ?2 > end_day)
                OR (price = ?3 AND (start_day = ?1 + 1 OR end_day = ?2 - 1))
             )"
        );
        let mut bind_values = vec![
            Value::Integer(day_to_db(candidate.end_date())),
            Value::Integer(day_to_db(candidate.start_date())),
            Value::Text(price_to_db(candidate.price())),
        ];

        if !exclude_ids.is_empty() {
            let first = bind_values.len() + 1;
            let placeholders = (first..first + exclude_ids.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND id NOT IN ({placeholders})"));
            bind_values.extend(exclude_ids.iter().map(|id| Value::Integer(*id)));
        }

        sql.push_str(" ORDER BY start_day ASC, id ASC LIMIT 1;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_interval_row(row)?));
        }

        Ok(None)
    }

    fn insert(&self, interval: &PricedInterval) -> StoreResult<IntervalId> {
        self.conn.execute(
            "INSERT INTO price_intervals (start_day, end_day, price)
             VALUES (?1, ?2, ?3);",
            params![
                day_to_db(interval.start_date()),
                day_to_db(interval.end_date()),
                price_to_db(interval.price()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("event=interval_insert module=repo status=ok id={id} interval={interval}");
        Ok(id)
    }

    fn update(&self, interval: &PricedInterval) -> StoreResult<()> {
        let id = interval.id().ok_or(StoreError::MissingIdentity)?;
        let changed = self.conn.execute(
            "UPDATE price_intervals
             SET
                start_day = ?1,
                end_day = ?2,
                price = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![
                day_to_db(interval.start_date()),
                day_to_db(interval.end_date()),
                price_to_db(interval.price()),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        debug!("event=interval_update module=repo status=ok id={id} interval={interval}");
        Ok(())
    }

    fn delete(&self, id: IntervalId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM price_intervals WHERE id = ?1;", [id])?;
        debug!("event=interval_delete module=repo status=ok id={id} changed={changed}");
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<()> {
        let changed = self.conn.execute("DELETE FROM price_intervals;", [])?;
        debug!("event=interval_delete_all module=repo status=ok changed={changed}");
        Ok(())
    }

    fn count(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM price_intervals;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("invalid row count `{count}`")))
    }

    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        // Nested calls join the transaction already open on this connection.
        if !self.conn.is_autocommit() {
            return op(self);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        match op(self) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=store_rollback module=repo status=error error={rollback_err}"
                    );
                }
                Err(err)
            }
        }
    }
}

fn parse_interval_row(row: &Row<'_>) -> StoreResult<PricedInterval> {
    let id: IntervalId = row.get("id")?;
    let start_day: i64 = row.get("start_day")?;
    let end_day: i64 = row.get("end_day")?;
    let price_text: String = row.get("price")?;

    let start_date = day_from_db(start_day, "price_intervals.start_day")?;
    let end_date = day_from_db(end_day, "price_intervals.end_day")?;
    let price = Decimal::from_str(&price_text).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid price `{price_text}` in price_intervals.price"
        ))
    })?;

    Ok(PricedInterval::with_id(id, start_date, end_date, price)?)
}

fn day_from_db(value: i64, column: &'static str) -> StoreResult<NaiveDate> {
    i32::try_from(value)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| StoreError::InvalidData(format!("invalid day `{value}` in {column}")))
}

fn day_to_db(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

fn price_to_db(price: Decimal) -> String {
    price.normalize().to_string()
}
