//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Subsystems call store methods — they never execute SQL directly.

use crate::{error::EngageResult, event::ActivityEvent};
use rusqlite::{params, Connection};

mod badge;
mod engagement;
mod score;

pub struct EngageStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl EngageStore {
    /// Open (or create) the engine database at `path`.
    pub fn open(path: &str) -> EngageResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngageResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> EngageResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngageResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_engagement.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_badges.sql"))?;
        Ok(())
    }

    // ── User profile ───────────────────────────────────────────

    pub fn upsert_user(&self, user_id: &str, display_name: Option<&str>) -> EngageResult<()> {
        self.conn.execute(
            "INSERT INTO user (user_id, display_name) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET
                 display_name = COALESCE(excluded.display_name, display_name)",
            params![user_id, display_name],
        )?;
        Ok(())
    }

    // ── Activity event log ─────────────────────────────────────

    pub fn append_event(&self, event: &ActivityEvent) -> EngageResult<()> {
        let metadata = event
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn.execute(
            "INSERT INTO user_event (id, user_id, event_type, created_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.user_id,
                event.kind.as_str(),
                event.created_at.timestamp(),
                metadata,
            ],
        )?;
        Ok(())
    }

    /// Per-kind event counts over the user's whole history.
    pub fn event_kind_counts(&self, user_id: &str) -> EngageResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_type, COUNT(*) FROM user_event
             WHERE user_id = ?1
             GROUP BY event_type",
        )?;
        let counts = stmt
            .query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Per-kind event counts restricted to `created_at >= since_ts`.
    pub fn event_kind_counts_since(
        &self,
        user_id: &str,
        since_ts: i64,
    ) -> EngageResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_type, COUNT(*) FROM user_event
             WHERE user_id = ?1 AND created_at >= ?2
             GROUP BY event_type",
        )?;
        let counts = stmt
            .query_map(params![user_id, since_ts], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Count of a single event kind for badge criteria.
    pub fn event_count_of_kind(&self, user_id: &str, kind: &str) -> EngageResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_event
             WHERE user_id = ?1 AND event_type = ?2",
            params![user_id, kind],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
