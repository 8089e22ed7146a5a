#![allow(dead_code)]

use asset_coverage::catalog::repo::{upsert_interval, upsert_source};
use asset_coverage::db::{connection, migrate};
use asset_coverage::models::observation::{MarketObservation, ObservationKey};
use asset_coverage::models::{Asset, IntervalRow};
use asset_coverage::registry::{AssetDraft, AssetIdentity, AssetRegistry};
use asset_coverage::repo::SqliteRepo;
use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use std::path::PathBuf;
use tempfile::TempDir;

pub const COINGECKO: i32 = 3;
pub const DAILY: i32 = 1;
pub const WEEKLY: i32 = 2;
pub const CRYPTO: i32 = 1;
pub const OHLC: i32 = 8;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    // open a connection with PRAGMAs applied
    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

/// In-memory store with migrations and foreign keys, for proptest cases.
pub fn memory_db() -> SqliteConnection {
    let mut conn = connection::connect_sqlite(":memory:").expect("connect");
    migrate::run_on(&mut conn).expect("migrations");
    conn
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn fk_check_empty(conn: &mut SqliteConnection) {
    #[derive(QueryableByName)]
    struct Row {
        #[diesel(sql_type = Text)]
        table: String,
    }
    let rows: Vec<Row> = diesel::sql_query("PRAGMA foreign_key_check;").load(conn).unwrap();
    let tables: Vec<_> = rows.into_iter().map(|r| r.table).collect();
    assert!(tables.is_empty(), "foreign key violations in {tables:?}");
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result(conn)
        .unwrap();
    c.n
}

/// Source 3 "coingecko", interval 1 = "1D" (1 day), interval 2 = "7D" (7 days).
pub fn seed_min_catalog(conn: &mut SqliteConnection) {
    upsert_source(conn, COINGECKO, "coingecko", "CoinGecko").unwrap();
    upsert_interval(
        conn,
        &IntervalRow {
            id: DAILY,
            code: "1D".into(),
            span_days: 1,
        },
    )
    .unwrap();
    upsert_interval(
        conn,
        &IntervalRow {
            id: WEEKLY,
            code: "7D".into(),
            span_days: 7,
        },
    )
    .unwrap();
}

pub fn create_ticker(conn: &mut SqliteConnection, ticker: &str) -> Asset {
    let draft = AssetDraft::new(AssetIdentity::ticker(ticker), CRYPTO).unwrap();
    SqliteRepo::new().create(conn, &draft, "test").unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily OHLC row: `end = start + 1`.
pub fn daily(asset_id: i32, start: NaiveDate, close: f64) -> MarketObservation {
    MarketObservation::builder(
        ObservationKey::new(asset_id, OHLC, start),
        start.succ_opt().unwrap(),
        COINGECKO,
        DAILY,
    )
    .ohlc(close - 1.0, close + 1.0, close - 2.0, close)
    .volume(1_000.0)
    .build()
    .unwrap()
}
