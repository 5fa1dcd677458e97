//! Store methods for digest engagement rows and the daily status rollup.

use super::EngageStore;
use crate::{
    content::CardType,
    engagement_subsystem::{DailyStatus, DigestEngagement, EngagementKind},
    error::EngageResult,
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

fn fmt_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn day_col(idx: usize, raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl EngageStore {
    pub fn insert_digest(&self, row: &DigestEngagement) -> EngageResult<()> {
        self.conn.execute(
            "INSERT INTO daily_digest_engagement
                 (id, user_id, card_id, card_type, engagement_type, duration, is_correct, day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.user_id,
                row.card_id,
                row.card_type.as_str(),
                row.kind.as_str(),
                row.duration,
                row.is_correct.map(|c| if c { 1i64 } else { 0i64 }),
                fmt_day(row.day),
            ],
        )?;
        Ok(())
    }

    /// Every digest row for one user and one logical day — the full input
    /// to the rollup.
    pub fn digest_rows_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> EngageResult<Vec<DigestEngagement>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, card_id, card_type, engagement_type, duration, is_correct, day
             FROM daily_digest_engagement
             WHERE user_id = ?1 AND day = ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id, fmt_day(day)], |row| {
                let card_type_raw: String = row.get(3)?;
                let kind_raw: String = row.get(4)?;
                let day_raw: String = row.get(7)?;
                Ok(DigestEngagement {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    card_id: row.get(2)?,
                    card_type: CardType::parse(&card_type_raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            format!("unknown card type '{card_type_raw}'").into(),
                        )
                    })?,
                    kind: EngagementKind::parse(&kind_raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Text,
                            format!("unknown engagement type '{kind_raw}'").into(),
                        )
                    })?,
                    duration: row.get(5)?,
                    is_correct: row.get::<_, Option<i64>>(6)?.map(|v| v != 0),
                    day: day_col(7, &day_raw)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Insert-or-replace keyed by (user, day).
    pub fn upsert_daily_status(&self, status: &DailyStatus) -> EngageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_engagement_status
                 (user_id, day, is_present, card_view_count, mcq_attempt_count,
                  mcq_correct_count, mcq_accuracy, total_engagement_duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                status.user_id,
                fmt_day(status.day),
                if status.is_present { 1i64 } else { 0i64 },
                status.card_view_count,
                status.mcq_attempt_count,
                status.mcq_correct_count,
                status.mcq_accuracy,
                status.total_engagement_duration,
            ],
        )?;
        Ok(())
    }

    pub fn daily_status_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> EngageResult<Option<DailyStatus>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, day, is_present, card_view_count, mcq_attempt_count,
                        mcq_correct_count, mcq_accuracy, total_engagement_duration
                 FROM daily_engagement_status
                 WHERE user_id = ?1 AND day = ?2",
                params![user_id, fmt_day(day)],
                Self::status_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Status rows in `[from, to]`, oldest first. Days with no activity have
    /// no row here; callers fill the gaps.
    pub fn daily_status_range(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngageResult<Vec<DailyStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, day, is_present, card_view_count, mcq_attempt_count,
                    mcq_correct_count, mcq_accuracy, total_engagement_duration
             FROM daily_engagement_status
             WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
             ORDER BY day ASC",
        )?;
        let rows = stmt
            .query_map(
                params![user_id, fmt_day(from), fmt_day(to)],
                Self::status_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Present-day count in `[from, to]` — the tier classifier's input.
    pub fn present_day_count(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngageResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_engagement_status
             WHERE user_id = ?1 AND is_present = 1 AND day >= ?2 AND day <= ?3",
            params![user_id, fmt_day(from), fmt_day(to)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Present days at or before `through`, newest first — the streak
    /// fold's input.
    pub fn present_days_desc(
        &self,
        user_id: &str,
        through: NaiveDate,
    ) -> EngageResult<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT day FROM daily_engagement_status
             WHERE user_id = ?1 AND is_present = 1 AND day <= ?2
             ORDER BY day DESC",
        )?;
        let days = stmt
            .query_map(params![user_id, fmt_day(through)], |row| {
                let raw: String = row.get(0)?;
                day_col(0, &raw)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }

    fn status_from_row(row: &rusqlite::Row<'_>) -> Result<DailyStatus, rusqlite::Error> {
        let day_raw: String = row.get(1)?;
        Ok(DailyStatus {
            user_id: row.get(0)?,
            day: day_col(1, &day_raw)?,
            is_present: row.get::<_, i64>(2)? != 0,
            card_view_count: row.get(3)?,
            mcq_attempt_count: row.get(4)?,
            mcq_correct_count: row.get(5)?,
            mcq_accuracy: row.get(6)?,
            total_engagement_duration: row.get(7)?,
        })
    }
}
