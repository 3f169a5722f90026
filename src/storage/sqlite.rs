//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::inventory::{InventoryRecord, SourceKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "source_name, source_kind, product_id, year, make, model, price, \
                              hours, location, badges, category, detail_url, image_url, duplicate";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: run_status(row.get(4)?)?,
    })
}

fn run_status(value: String) -> rusqlite::Result<RunStatus> {
    RunStatus::from_db_string(&value)
        .ok_or_else(|| conversion_error(4, format!("unknown run status '{}'", value)))
}

fn conversion_error(
    column: usize,
    error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, error.into())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryRecord> {
    let kind: String = row.get(1)?;
    let source = kind
        .parse::<SourceKind>()
        .map_err(|e| conversion_error(1, e))?;

    let badges: String = row.get(9)?;
    let badges: Vec<String> =
        serde_json::from_str(&badges).map_err(|e| conversion_error(9, e))?;

    Ok(InventoryRecord {
        source_name: row.get(0)?,
        source,
        product_id: row.get(2)?,
        year: row.get(3)?,
        make: row.get(4)?,
        model: row.get(5)?,
        price: row.get(6)?,
        hours: row.get(7)?,
        location: row.get(8)?,
        badges,
        category: row.get(10)?,
        detail_url: row.get(11)?,
        image_url: row.get(12)?,
        duplicate: row.get(13)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed)
    }

    fn latest_completed_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs
                 WHERE status = ?1 ORDER BY id DESC LIMIT 1",
                params![RunStatus::Completed.to_db_string()],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Records =====

    fn insert_records(
        &mut self,
        run_id: i64,
        records: &[InventoryRecord],
    ) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO records (run_id, {}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                RECORD_COLUMNS
            ))?;

            for record in records {
                let badges = serde_json::to_string(&record.badges)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;

                stmt.execute(params![
                    run_id,
                    record.source_name,
                    record.source.as_str(),
                    record.product_id,
                    record.year,
                    record.make,
                    record.model,
                    record.price,
                    record.hours,
                    record.location,
                    badges,
                    record.category,
                    record.detail_url,
                    record.image_url,
                    record.duplicate,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Stored {} records for run {}", records.len(), run_id);
        Ok(records.len())
    }

    fn load_records(&self, run_id: i64) -> StorageResult<Vec<InventoryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM records WHERE run_id = ?1 ORDER BY id",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![run_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
