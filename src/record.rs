//! Durable storage for student registration records.
//!
//! The store owns the uniqueness guarantee: `roll_no` is the primary key and
//! `student_id` carries a unique index, so a constraint violation on insert
//! is the authoritative duplicate signal even if two registrations race past
//! the pre-insert lookup.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record with roll_no '{roll_no}' already exists")]
    RollNoExists { roll_no: String },
    #[error("record with student_id '{student_id}' already exists")]
    StudentIdExists { student_id: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "Active",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(Status::Active),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentRecord {
    pub roll_no: String,
    pub student_id: String,
    pub name: String,
    pub year: String,
    pub profile_pic_ref: String,
    pub status: Status,
    pub registered_at: DateTime<Utc>,
}

pub trait RecordStore: Send + Sync {
    fn find_by_roll_no(&self, roll_no: &str) -> Result<Option<StudentRecord>, StoreError>;

    /// Insert a new record. Fails with [`StoreError::RollNoExists`] or
    /// [`StoreError::StudentIdExists`] naming the violated key.
    fn insert(&self, record: &StudentRecord) -> Result<(), StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS students (
    roll_no         TEXT PRIMARY KEY,
    student_id      TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    year            TEXT NOT NULL,
    profile_pic_ref TEXT NOT NULL,
    status          TEXT NOT NULL,
    registered_at   TEXT NOT NULL
);
";

/// SQLite-backed [`RecordStore`]. One connection behind a mutex; the
/// registration path is a single lookup plus a single insert.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn find_by_roll_no(&self, roll_no: &str) -> Result<Option<StudentRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT roll_no, student_id, name, year, profile_pic_ref, status, registered_at
             FROM students WHERE roll_no = ?1",
        )?;
        Ok(stmt.query_row(params![roll_no], row_to_record).optional()?)
    }

    fn insert(&self, record: &StudentRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let res = conn.execute(
            "INSERT INTO students
                 (roll_no, student_id, name, year, profile_pic_ref, status, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.roll_no,
                record.student_id,
                record.name,
                record.year,
                record.profile_pic_ref,
                record.status.as_str(),
                record.registered_at.to_rfc3339(),
            ],
        );
        match res {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // sqlite names the violated column, e.g.
                // "UNIQUE constraint failed: students.student_id"
                if msg
                    .as_deref()
                    .is_some_and(|m| m.contains("students.student_id"))
                {
                    Err(StoreError::StudentIdExists {
                        student_id: record.student_id.clone(),
                    })
                } else {
                    Err(StoreError::RollNoExists {
                        roll_no: record.roll_no.clone(),
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudentRecord> {
    let status: String = row.get(5)?;
    let status = Status::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown status: {status}").into(),
        )
    })?;

    let registered_at: String = row.get(6)?;
    let registered_at = DateTime::parse_from_rfc3339(&registered_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?
        .with_timezone(&Utc);

    Ok(StudentRecord {
        roll_no: row.get(0)?,
        student_id: row.get(1)?,
        name: row.get(2)?,
        year: row.get(3)?,
        profile_pic_ref: row.get(4)?,
        status,
        registered_at,
    })
}
