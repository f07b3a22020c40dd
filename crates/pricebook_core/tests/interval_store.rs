use chrono::{Datelike, NaiveDate};
use pricebook_core::db::open_db_in_memory;
use pricebook_core::{
    IntervalStore, MemoryIntervalStore, PricedInterval, SqliteIntervalStore, StoreError,
};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn iv(start: u32, end: u32, price: i64) -> PricedInterval {
    PricedInterval::new(
        NaiveDate::from_ymd_opt(2019, 1, start).unwrap(),
        NaiveDate::from_ymd_opt(2019, 1, end).unwrap(),
        Decimal::from(price),
    )
    .unwrap()
}

/// Runs the same contract checks against any store implementation.
fn check_crud_contract<S: IntervalStore>(store: &S) {
    let late = store.insert(&iv(20, 25, 30)).unwrap();
    let early = store.insert(&iv(1, 5, 10)).unwrap();
    assert_ne!(late, early);
    assert_eq!(store.count().unwrap(), 2);

    let listed = store.list_all().unwrap();
    assert_eq!(listed[0].id(), Some(early));
    assert_eq!(listed[1].id(), Some(late));

    let moved = store
        .get(late)
        .unwrap()
        .with_start_date(NaiveDate::from_ymd_opt(2019, 1, 22).unwrap())
        .unwrap();
    store.update(&moved).unwrap();
    assert_eq!(
        store.get(late).unwrap().start_date(),
        NaiveDate::from_ymd_opt(2019, 1, 22).unwrap()
    );

    assert!(matches!(store.get(999), Err(StoreError::NotFound(999))));
    assert!(matches!(
        store.update(&iv(1, 2, 3).with_identity(999)),
        Err(StoreError::NotFound(999))
    ));
    assert!(matches!(
        store.update(&iv(1, 2, 3)),
        Err(StoreError::MissingIdentity)
    ));

    store.delete(early).unwrap();
    store.delete(early).unwrap();
    assert_eq!(store.count().unwrap(), 1);

    store.delete_all().unwrap();
    assert!(store.list_all().unwrap().is_empty());
}

fn check_find_colliding_contract<S: IntervalStore>(store: &S) {
    let a = store.insert(&iv(1, 5, 10)).unwrap();
    let b = store.insert(&iv(10, 15, 20)).unwrap();
    let c = store.insert(&iv(17, 20, 20)).unwrap();

    // Overlap wins regardless of price.
    let hit = store.find_colliding(&iv(4, 6, 99), &[]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(a));

    // One-day gap only collides with an equal price.
    assert!(store.find_colliding(&iv(6, 8, 99), &[]).unwrap().is_none());
    let hit = store.find_colliding(&iv(6, 8, 10), &[]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(a));
    let hit = store.find_colliding(&iv(7, 9, 20), &[]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(b));

    // Two-day gap never collides.
    assert!(store.find_colliding(&iv(7, 8, 10), &[]).unwrap().is_none());

    // First by start date; excluded ids are skipped.
    let hit = store.find_colliding(&iv(1, 18, 0), &[]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(a));
    let hit = store.find_colliding(&iv(1, 18, 0), &[a]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(b));
    let hit = store.find_colliding(&iv(1, 18, 0), &[a, b]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(c));
    assert!(store
        .find_colliding(&iv(1, 18, 0), &[a, b, c])
        .unwrap()
        .is_none());
}

fn check_atomic_rollback<S: IntervalStore>(store: &S) {
    let kept = store.insert(&iv(1, 5, 10)).unwrap();

    let result: Result<(), StoreError> = store.atomically(|store| {
        store.delete(kept)?;
        store.insert(&iv(6, 9, 10))?;
        store.update(&iv(1, 1, 1).with_identity(12345))
    });
    assert!(matches!(result, Err(StoreError::NotFound(12345))));

    let rows = store.list_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id(), Some(kept));

    let committed: Result<(), StoreError> = store.atomically(|store| {
        store.insert(&iv(20, 21, 10))?;
        Ok(())
    });
    committed.unwrap();
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn sqlite_store_honors_crud_contract() {
    let conn = open_db_in_memory().unwrap();
    check_crud_contract(&SqliteIntervalStore::try_new(&conn).unwrap());
}

#[test]
fn memory_store_honors_crud_contract() {
    check_crud_contract(&MemoryIntervalStore::new());
}

#[test]
fn sqlite_store_finds_colliding_rows() {
    let conn = open_db_in_memory().unwrap();
    check_find_colliding_contract(&SqliteIntervalStore::try_new(&conn).unwrap());
}

#[test]
fn memory_store_finds_colliding_rows() {
    check_find_colliding_contract(&MemoryIntervalStore::new());
}

#[test]
fn sqlite_store_rolls_back_failed_unit_of_work() {
    let conn = open_db_in_memory().unwrap();
    check_atomic_rollback(&SqliteIntervalStore::try_new(&conn).unwrap());
}

#[test]
fn memory_store_rolls_back_failed_unit_of_work() {
    check_atomic_rollback(&MemoryIntervalStore::new());
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pricebook.sqlite3");

    let interval = PricedInterval::new(
        NaiveDate::from_ymd_opt(2019, 1, 20).unwrap(),
        NaiveDate::from_ymd_opt(2019, 1, 30).unwrap(),
        Decimal::new(2005, 1),
    )
    .unwrap();
    let id = {
        let conn = pricebook_core::db::open_db(&path).unwrap();
        let store = SqliteIntervalStore::try_new(&conn).unwrap();
        store.insert(&interval).unwrap()
    };

    let conn = pricebook_core::db::open_db(&path).unwrap();
    let store = SqliteIntervalStore::try_new(&conn).unwrap();
    let loaded = store.get(id).unwrap();
    assert_eq!(loaded.price(), Decimal::new(2005, 1));
    assert_eq!(loaded.end_date(), NaiveDate::from_ymd_opt(2019, 1, 30).unwrap());
}

#[test]
fn sqlite_store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteIntervalStore::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        StoreError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn sqlite_store_rejects_corrupt_rows() {
    let conn = open_db_in_memory().unwrap();
    let first = day_number(2019, 1, 1);
    conn.execute(
        "INSERT INTO price_intervals (start_day, end_day, price)
         VALUES (?1, ?2, 'not-a-number');",
        params![first, first + 1],
    )
    .unwrap();

    let store = SqliteIntervalStore::try_new(&conn).unwrap();
    let err = store.list_all().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)), "unexpected: {err}");
}

#[test]
fn sqlite_store_rejects_day_numbers_outside_calendar() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO price_intervals (start_day, end_day, price)
         VALUES (1, ?1, '10');",
        params![i64::MAX],
    )
    .unwrap();

    let store = SqliteIntervalStore::try_new(&conn).unwrap();
    let err = store.list_all().unwrap_err();
    assert!(
        err.to_string().contains("price_intervals.end_day"),
        "unexpected: {err}"
    );
}

#[test]
fn sqlite_schema_rejects_reversed_ranges() {
    let conn = open_db_in_memory().unwrap();
    let first = day_number(2019, 1, 1);
    let result = conn.execute(
        "INSERT INTO price_intervals (start_day, end_day, price)
         VALUES (?1, ?2, '10');",
        params![first + 4, first],
    );
    assert!(result.is_err());
}

fn day_number(y: i32, m: u32, d: u32) -> i64 {
    i64::from(NaiveDate::from_ymd_opt(y, m, d).unwrap().num_days_from_ce())
}

fn far(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Ranges crossing the year 9999/10000 boundary and before year 1 keep
/// calendar order.
fn check_years_beyond_four_digits<S: IntervalStore>(store: &S) {
    let span = |start, end| PricedInterval::new(start, end, Decimal::from(5)).unwrap();
    let late = store.insert(&span(far(10000, 1, 1), far(10000, 1, 5))).unwrap();
    let early = store.insert(&span(far(9999, 12, 1), far(9999, 12, 30))).unwrap();
    let ancient = store.insert(&span(far(-5, 3, 1), far(-5, 3, 2))).unwrap();

    let ids: Vec<_> = store.list_all().unwrap().iter().map(|row| row.id()).collect();
    assert_eq!(ids, vec![Some(ancient), Some(early), Some(late)]);

    let crossing =
        PricedInterval::new(far(9999, 12, 20), far(10000, 1, 3), Decimal::from(7)).unwrap();
    let hit = store.find_colliding(&crossing, &[]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(early));
    let hit = store.find_colliding(&crossing, &[early]).unwrap().unwrap();
    assert_eq!(hit.id(), Some(late));

    let loaded = store.get(late).unwrap();
    assert_eq!(loaded.start_date(), far(10000, 1, 1));
    assert_eq!(store.get(ancient).unwrap().end_date(), far(-5, 3, 2));
}

#[test]
fn sqlite_store_orders_years_beyond_four_digits() {
    let conn = open_db_in_memory().unwrap();
    check_years_beyond_four_digits(&SqliteIntervalStore::try_new(&conn).unwrap());
}

#[test]
fn memory_store_orders_years_beyond_four_digits() {
    check_years_beyond_four_digits(&MemoryIntervalStore::new());
}
