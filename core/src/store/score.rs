//! Store methods for the score cache and leaderboard.

use super::EngageStore;
use crate::{
    error::EngageResult,
    score_subsystem::{LeaderboardEntry, UserScore},
};
use rusqlite::{params, OptionalExtension};

impl EngageStore {
    /// Overwrite the cached total and stamp the recompute time. Weekly and
    /// monthly fields are preserved; they refresh through their own calls.
    pub fn upsert_total_score(
        &self,
        user_id: &str,
        total: i64,
        computed_at: i64,
    ) -> EngageResult<()> {
        self.conn.execute(
            "INSERT INTO user_score (user_id, total_score, weekly_score, monthly_score, computed_at)
             VALUES (?1, ?2, 0, 0, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 total_score = excluded.total_score,
                 computed_at = excluded.computed_at",
            params![user_id, total, computed_at],
        )?;
        Ok(())
    }

    pub fn update_weekly_score(&self, user_id: &str, score: i64) -> EngageResult<()> {
        self.conn.execute(
            "INSERT INTO user_score (user_id, total_score, weekly_score, monthly_score, computed_at)
             VALUES (?1, 0, ?2, 0, 0)
             ON CONFLICT(user_id) DO UPDATE SET
                 weekly_score = excluded.weekly_score",
            params![user_id, score],
        )?;
        Ok(())
    }

    pub fn update_monthly_score(&self, user_id: &str, score: i64) -> EngageResult<()> {
        self.conn.execute(
            "INSERT INTO user_score (user_id, total_score, weekly_score, monthly_score, computed_at)
             VALUES (?1, 0, 0, ?2, 0)
             ON CONFLICT(user_id) DO UPDATE SET
                 monthly_score = excluded.monthly_score",
            params![user_id, score],
        )?;
        Ok(())
    }

    pub fn get_user_score(&self, user_id: &str) -> EngageResult<Option<UserScore>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, total_score, weekly_score, monthly_score, computed_at
                 FROM user_score WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserScore {
                        user_id: row.get(0)?,
                        total_score: row.get(1)?,
                        weekly_score: row.get(2)?,
                        monthly_score: row.get(3)?,
                        computed_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Ranked read over the cached totals, joined with the public profile.
    pub fn leaderboard(&self, limit: u32) -> EngageResult<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.user_id, u.display_name, s.total_score
             FROM user_score s
             LEFT JOIN user u ON u.user_id = s.user_id
             ORDER BY s.total_score DESC, s.user_id ASC
             LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, display_name, total_score))| LeaderboardEntry {
                rank: i as i64 + 1,
                user_id,
                display_name,
                total_score,
            })
            .collect())
    }
}
