//! SQLite-based production log and CSV export.
//!
//! Each record is one submission of left/right output in millilitres.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{DatabaseError, Result, ValidationError};

/// CSV column header.
pub const CSV_HEADER: [&str; 4] = ["submitted_at", "left_ml", "right_ml", "total_ml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub id: String,
    pub left_ml: f64,
    pub right_ml: f64,
    pub submitted_at: DateTime<Utc>,
}

impl ProductionRecord {
    pub fn total_ml(&self) -> f64 {
        self.left_ml + self.right_ml
    }
}

/// SQLite database for the production log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/zenpump/zenpump.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("zenpump.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id           TEXT PRIMARY KEY,
                left_ml      REAL NOT NULL DEFAULT 0,
                right_ml     REAL NOT NULL DEFAULT 0,
                submitted_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_submitted_at ON records(submitted_at);",
        )?;
        Ok(())
    }

    /// Add a record submitted now.
    ///
    /// Negative or non-finite sides are treated as zero. A record with nothing
    /// on either side is rejected.
    ///
    /// # Errors
    /// Returns a validation error for an empty record, or a database error if
    /// the insert fails.
    pub fn add_record(&self, left_ml: f64, right_ml: f64) -> Result<ProductionRecord> {
        self.add_record_at(left_ml, right_ml, Utc::now())
    }

    pub fn add_record_at(
        &self,
        left_ml: f64,
        right_ml: f64,
        submitted_at: DateTime<Utc>,
    ) -> Result<ProductionRecord> {
        let left_ml = sanitize_ml(left_ml);
        let right_ml = sanitize_ml(right_ml);
        if left_ml <= 0.0 && right_ml <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "left_ml/right_ml".into(),
                message: "at least one side must be greater than zero".into(),
            }
            .into());
        }

        let record = ProductionRecord {
            id: Uuid::new_v4().to_string(),
            left_ml,
            right_ml,
            submitted_at,
        };
        self.conn.execute(
            "INSERT INTO records (id, left_ml, right_ml, submitted_at) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.left_ml, record.right_ml, record.submitted_at.to_rfc3339()],
        )?;
        tracing::debug!(id = %record.id, total_ml = record.total_ml(), "record added");
        Ok(record)
    }

    /// All records, newest first.
    pub fn list_records(&self) -> Result<Vec<ProductionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, left_ml, right_ml, submitted_at
             FROM records
             ORDER BY submitted_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, left_ml, right_ml, submitted_at) = row?;
            let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp for {id}: {e}")))?;
            records.push(ProductionRecord {
                id,
                left_ml,
                right_ml,
                submitted_at,
            });
        }
        Ok(records)
    }

    /// Delete a record. Returns whether it existed.
    pub fn delete_record(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn sanitize_ml(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Render records as CSV: UTF-8 BOM, header row, every cell quoted.
/// Timestamps are written in local time, as `zenpump log list` shows them.
///
/// # Errors
/// Refuses an empty record list.
pub fn export_csv(records: &[ProductionRecord]) -> Result<String> {
    if records.is_empty() {
        return Err(ValidationError::EmptyCollection("production log".into()).into());
    }

    let header = CSV_HEADER.map(String::from).to_vec();
    let rows = records.iter().map(|r| {
        vec![
            r.submitted_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            r.left_ml.to_string(),
            r.right_ml.to_string(),
            r.total_ml().to_string(),
        ]
    });

    let body = std::iter::once(header)
        .chain(rows)
        .map(|row| row.iter().map(|cell| quote(cell)).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(format!("\u{feff}{body}"))
}

/// Write the CSV export of `records` to `path`. Returns the number of rows.
///
/// # Errors
/// Refuses an empty record list; returns an IO error if the file cannot be
/// written.
pub fn write_export(path: &Path, records: &[ProductionRecord]) -> Result<usize> {
    let csv = export_csv(records)?;
    std::fs::write(path, csv)?;
    tracing::info!(path = %path.display(), rows = records.len(), "records exported");
    Ok(records.len())
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// `milk-records-YYYY-MM-DD-HH-MM-SS.csv`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("milk-records-{}.csv", now.format("%Y-%m-%d-%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::TimeZone;

    #[test]
    fn add_and_list_newest_first() {
        let db = Database::open_memory().unwrap();
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        db.add_record_at(40.0, 35.5, t).unwrap();
        db.add_record_at(0.0, 20.0, t + chrono::Duration::hours(3)).unwrap();

        let records = db.list_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].right_ml, 20.0);
        assert_eq!(records[1].total_ml(), 75.5);
    }

    #[test]
    fn empty_record_rejected() {
        let db = Database::open_memory().unwrap();
        assert!(db.add_record(0.0, -3.0).is_err());
        assert!(db.add_record(f64::NAN, 0.0).is_err());
        assert!(db.list_records().unwrap().is_empty());
    }

    #[test]
    fn delete_reports_existence() {
        let db = Database::open_memory().unwrap();
        let rec = db.add_record(10.0, 0.0).unwrap();
        assert!(db.delete_record(&rec.id).unwrap());
        assert!(!db.delete_record(&rec.id).unwrap());
        assert!(db.list_records().unwrap().is_empty());
    }

    #[test]
    fn csv_quotes_every_cell() {
        let rec = ProductionRecord {
            id: "x".into(),
            left_ml: 12.5,
            right_ml: 30.0,
            submitted_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 5, 9).unwrap(),
        };
        let local = rec
            .submitted_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let csv = export_csv(&[rec]).unwrap();
        assert!(csv.starts_with('\u{feff}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(lines[0], "\"submitted_at\",\"left_ml\",\"right_ml\",\"total_ml\"");
        assert_eq!(lines[1], format!("\"{local}\",\"12.5\",\"30\",\"42.5\""));
    }

    #[test]
    fn csv_timestamps_are_local_time() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        let rec = ProductionRecord {
            id: "x".into(),
            left_ml: 1.0,
            right_ml: 0.0,
            submitted_at: at,
        };
        let csv = export_csv(&[rec]).unwrap();
        let expected = at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(csv.lines().nth(1).unwrap().starts_with(&format!("\"{expected}\"")));
    }

    #[test]
    fn write_export_writes_file_and_reports_io_errors() {
        let db = Database::open_memory().unwrap();
        db.add_record(10.0, 5.0).unwrap();
        let records = db.list_records().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(write_export(&path, &records).unwrap(), 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with('\u{feff}'));
        assert_eq!(written.lines().count(), 2);

        let missing = dir.path().join("no-such-dir").join("out.csv");
        assert!(matches!(write_export(&missing, &records), Err(CoreError::Io(_))));
    }

    #[test]
    fn quote_doubles_embedded_quotes() {
        assert_eq!(quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn empty_export_refused() {
        assert!(export_csv(&[]).is_err());
    }

    #[test]
    fn file_name_uses_dashes() {
        let t = Utc.with_ymd_and_hms(2026, 10, 19, 7, 3, 2).unwrap();
        assert_eq!(export_file_name(t), "milk-records-2026-10-19-07-03-02.csv");
    }
}
