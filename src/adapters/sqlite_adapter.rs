//! SQLite price store.
//!
//! Bars live in `prices`, their indicator readings in `readings`, one row per
//! (bar, reading).

use crate::adapters::csv_adapter::parse_timestamp;
use crate::domain::error::BarchartError;
use crate::domain::price::PriceBar;
use crate::domain::reading::Reading;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::collections::HashMap;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> BarchartError {
    BarchartError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BarchartError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| BarchartError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4);
        let pool_size = u32::try_from(pool_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| BarchartError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: format!("pool_size must be a positive integer, got {}", pool_size),
            })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| BarchartError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, BarchartError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| BarchartError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, BarchartError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| BarchartError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), BarchartError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    symbol TEXT NOT NULL,
                    id INTEGER NOT NULL,
                    timestamp TEXT NOT NULL,
                    price REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    trend INTEGER NOT NULL,
                    PRIMARY KEY (symbol, id)
                );
                CREATE TABLE IF NOT EXISTS readings (
                    symbol TEXT NOT NULL,
                    price_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    value REAL NOT NULL,
                    PRIMARY KEY (symbol, price_id, name)
                );",
            )
            .map_err(query_err)
    }

    pub fn insert_bars(&self, symbol: &str, bars: &[PriceBar]) -> Result<(), BarchartError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO prices (symbol, id, timestamp, price, volume, trend)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    symbol,
                    bar.id as i64,
                    bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    bar.price,
                    bar.volume,
                    bar.trend
                ],
            )
            .map_err(query_err)?;

            for (reading, value) in &bar.readings {
                tx.execute(
                    "INSERT OR REPLACE INTO readings (symbol, price_id, name, value)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![symbol, bar.id as i64, reading.key(), value],
                )
                .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)
    }

    fn query_bars(
        &self,
        symbol: &str,
        from_id: u64,
        limit: i64,
    ) -> Result<Vec<PriceBar>, BarchartError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, price, volume, trend
                 FROM prices
                 WHERE symbol = ?1 AND id >= ?2
                 ORDER BY id ASC
                 LIMIT ?3",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![symbol, from_id as i64, limit], |row| {
                let id: i64 = row.get(0)?;
                let ts: String = row.get(1)?;
                let price: f64 = row.get(2)?;
                let volume: i64 = row.get(3)?;
                let trend: i32 = row.get(4)?;
                Ok((id as u64, ts, price, volume, trend))
            })
            .map_err(query_err)?;

        let mut bars = Vec::new();
        for row in rows {
            let (id, ts, price, volume, trend) = row.map_err(query_err)?;
            let mut bar = PriceBar::new(id, parse_timestamp(&ts)?, price);
            bar.volume = volume;
            bar.trend = trend;
            bars.push(bar);
        }

        if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
            let readings = self.query_readings(&conn, symbol, first.id, last.id)?;
            for bar in &mut bars {
                if let Some(values) = readings.get(&bar.id) {
                    bar.readings = values.clone();
                }
            }
        }

        Ok(bars)
    }

    fn query_readings(
        &self,
        conn: &rusqlite::Connection,
        symbol: &str,
        first_id: u64,
        last_id: u64,
    ) -> Result<HashMap<u64, HashMap<Reading, f64>>, BarchartError> {
        let mut stmt = conn
            .prepare(
                "SELECT price_id, name, value FROM readings
                 WHERE symbol = ?1 AND price_id >= ?2 AND price_id <= ?3",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![symbol, first_id as i64, last_id as i64], |row| {
                let id: i64 = row.get(0)?;
                let name: String = row.get(1)?;
                let value: f64 = row.get(2)?;
                Ok((id as u64, name, value))
            })
            .map_err(query_err)?;

        let mut readings: HashMap<u64, HashMap<Reading, f64>> = HashMap::new();
        for row in rows {
            let (id, name, value) = row.map_err(query_err)?;
            let reading: Reading = name.parse().map_err(|reason| BarchartError::Database {
                reason: format!("bad reading name in database: {}", reason),
            })?;
            readings.entry(id).or_default().insert(reading, value);
        }
        Ok(readings)
    }
}

impl PricePort for SqliteAdapter {
    fn fetch_prices_from_id(
        &self,
        symbol: &str,
        from_id: u64,
        count: usize,
    ) -> Result<Vec<PriceBar>, BarchartError> {
        self.query_bars(symbol, from_id, count as i64)
    }

    fn fetch_all_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BarchartError> {
        // LIMIT -1 is unbounded in SQLite
        self.query_bars(symbol, 0, -1)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BarchartError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")
            .map_err(query_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_err)?);
        }
        Ok(symbols)
    }
}
