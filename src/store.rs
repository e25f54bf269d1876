//! Per-site daily energy series backed by a single SQLite file.
//!
//! The table holds one row per calendar day. Writes are upserts keyed on
//! the date, so saving a day twice keeps only the latest value.

use crate::error::StorageError;
use crate::model::DailyRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS daily (id INTEGER PRIMARY KEY, date TEXT UNIQUE, value REAL);";

#[derive(Debug)]
pub struct DailySeriesStore {
    conn: Mutex<Connection>,
}

impl DailySeriesStore {
    /// Opens (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .and_then(|conn| conn.execute_batch(SCHEMA).map(|_| conn))
            .map_err(|e| StorageError::open(path.display().to_string(), e))?;
        tracing::info!("Initialized database at [{}]", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a throwaway store living only in memory.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Value saved for `date`, if any. A NULL value counts as absent.
    pub fn daily_value(&self, date: &str) -> Result<Option<f64>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT value FROM daily WHERE date = ?1")?;
        let value = stmt
            .query_row(params![date], |row| row.get::<_, Option<f64>>(0))
            .optional()?;
        Ok(value.flatten())
    }

    /// Inserts or replaces the value for `date`.
    pub fn save_daily_value(&self, date: &str, value: f64) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO daily (date, value) VALUES (?1, ?2)
             ON CONFLICT(date) DO UPDATE SET value = excluded.value",
        )?;
        stmt.execute(params![date, value])?;
        Ok(())
    }

    /// Sum of all values whose date starts with `prefix` (`YYYY` or `YYYY-MM`).
    pub fn sum_by_prefix(&self, prefix: &str) -> Result<f64, StorageError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached("SELECT COALESCE(SUM(value), 0) FROM daily WHERE date LIKE ?1")?;
        let total = stmt.query_row(params![format!("{prefix}%")], |row| row.get(0))?;
        Ok(total)
    }

    /// Day with the highest value. Equal maxima resolve to the earliest date.
    pub fn max_record(&self) -> Result<DailyRecord, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT date, value FROM daily WHERE value IS NOT NULL
             ORDER BY value DESC, date ASC LIMIT 1",
        )?;
        let record = stmt
            .query_row([], |row| {
                Ok(DailyRecord {
                    date: row.get(0)?,
                    value: row.get(1)?,
                })
            })
            .optional()?;
        record.ok_or(StorageError::NotFound)
    }

    /// Number of stored days.
    #[cfg(test)]
    pub fn record_count(&self) -> Result<usize, StorageError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM daily", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
