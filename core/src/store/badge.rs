//! Store methods for the badge catalog, grants, and tier cache.

use super::EngageStore;
use crate::{
    badge_subsystem::{Badge, BadgeCriteria, BadgeGrant, BadgeStatus},
    error::EngageResult,
};
use rusqlite::{params, OptionalExtension};

impl EngageStore {
    pub fn all_badges(&self) -> EngageResult<Vec<Badge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, tier, min_score, min_streak_days, event_kind, min_event_count
             FROM badge ORDER BY id ASC",
        )?;
        let badges = stmt
            .query_map([], Self::badge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(badges)
    }

    pub fn get_badge(&self, badge_id: &str) -> EngageResult<Option<Badge>> {
        let badge = self
            .conn
            .query_row(
                "SELECT id, name, tier, min_score, min_streak_days, event_kind, min_event_count
                 FROM badge WHERE id = ?1",
                params![badge_id],
                Self::badge_from_row,
            )
            .optional()?;
        Ok(badge)
    }

    /// Add a catalog badge beyond the seeded set.
    pub fn insert_badge(&self, badge: &Badge) -> EngageResult<()> {
        self.conn.execute(
            "INSERT INTO badge (id, name, tier, min_score, min_streak_days, event_kind, min_event_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                badge.id,
                badge.name,
                badge.tier,
                badge.criteria.min_score,
                badge.criteria.min_streak_days,
                badge.criteria.event_kind,
                badge.criteria.min_event_count,
            ],
        )?;
        Ok(())
    }

    pub fn has_badge(&self, user_id: &str, badge_id: &str) -> EngageResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM user_badge WHERE user_id = ?1 AND badge_id = ?2)",
            params![user_id, badge_id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Returns false when the unique (user, badge) constraint fires — a
    /// concurrent check granted it first.
    pub fn insert_badge_grant(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: i64,
    ) -> EngageResult<bool> {
        let result = self.conn.execute(
            "INSERT INTO user_badge (user_id, badge_id, earned_at) VALUES (?1, ?2, ?3)",
            params![user_id, badge_id, earned_at],
        );
        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn user_badges(&self, user_id: &str) -> EngageResult<Vec<BadgeGrant>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, badge_id, earned_at FROM user_badge
             WHERE user_id = ?1
             ORDER BY earned_at ASC, badge_id ASC",
        )?;
        let grants = stmt
            .query_map(params![user_id], |row| {
                Ok(BadgeGrant {
                    user_id: row.get(0)?,
                    badge_id: row.get(1)?,
                    earned_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(grants)
    }

    pub fn upsert_badge_status(&self, status: &BadgeStatus) -> EngageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO user_badge_status
                 (user_id, current_badge, days_active, last_calculated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                status.user_id,
                status.current_badge,
                status.days_active,
                status.last_calculated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_badge_status(&self, user_id: &str) -> EngageResult<Option<BadgeStatus>> {
        let status = self
            .conn
            .query_row(
                "SELECT user_id, current_badge, days_active, last_calculated_at
                 FROM user_badge_status WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(BadgeStatus {
                        user_id: row.get(0)?,
                        current_badge: row.get(1)?,
                        days_active: row.get(2)?,
                        last_calculated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(status)
    }

    fn badge_from_row(row: &rusqlite::Row<'_>) -> Result<Badge, rusqlite::Error> {
        Ok(Badge {
            id: row.get(0)?,
            name: row.get(1)?,
            tier: row.get(2)?,
            criteria: BadgeCriteria {
                min_score: row.get(3)?,
                min_streak_days: row.get(4)?,
                event_kind: row.get(5)?,
                min_event_count: row.get(6)?,
            },
        })
    }
}
