//! Badge subsystem — tier classification and the achievement rules engine.
//!
//! Two independent mechanisms:
//!   - Tier badge: count present days over the trailing window (default 180,
//!     inclusive of today) and map the count through the tier ladder,
//!     highest threshold first. The result is cached with a timestamp.
//!   - Achievement badges: each catalog row carries up to three criteria
//!     (score, streak, event count); ANY satisfied criterion makes the
//!     badge eligible. Grants are one-time and never revoked.

use crate::{
    config::{EngageConfig, TierThreshold},
    error::{EngageError, EngageResult},
    score_subsystem::ScoreSubsystem,
    store::EngageStore,
    types::{BadgeId, UserId},
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

/// A catalog badge. Criteria fields left `None` are absent.
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub tier: String,
    pub criteria: BadgeCriteria,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BadgeCriteria {
    pub min_score: Option<i64>,
    pub min_streak_days: Option<i64>,
    pub event_kind: Option<String>,
    pub min_event_count: Option<i64>,
}

/// A one-time grant record.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeGrant {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub earned_at: i64,
}

/// The cached tier classification, valid as of `last_calculated_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeStatus {
    pub user_id: UserId,
    pub current_badge: Option<String>,
    pub days_active: i64,
    pub last_calculated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionProgress {
    pub metric: String,
    pub current: i64,
    pub target: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeProgress {
    pub badge_id: BadgeId,
    pub name: String,
    pub earned: bool,
    /// Best progress across the badge's criteria, 0–100.
    pub percent: f64,
    pub criteria: Vec<CriterionProgress>,
}

pub struct BadgeSubsystem {
    window_days: i64,
    /// Ascending by `min_days`; scanned from the top.
    tiers: Vec<TierThreshold>,
}

impl BadgeSubsystem {
    pub fn new(config: &EngageConfig) -> Self {
        let mut tiers = config.tiers.clone();
        tiers.sort_by_key(|t| t.min_days);
        Self {
            window_days: config.badge_window_days,
            tiers,
        }
    }

    /// Recompute the tier classification over the trailing window and cache
    /// it. Full recount on every call.
    pub fn badge_status(
        &self,
        store: &EngageStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<BadgeStatus> {
        let today = now.date_naive();
        let from = today - Days::new(self.window_days.saturating_sub(1) as u64);
        let days_active = store.present_day_count(user_id, from, today)?;
        let status = BadgeStatus {
            user_id: user_id.to_string(),
            current_badge: self.tier_for(days_active),
            days_active,
            last_calculated_at: now.timestamp(),
        };
        store.upsert_badge_status(&status)?;
        log::debug!(
            "user={user_id} tier: {} present days -> {:?}",
            days_active,
            status.current_badge
        );
        Ok(status)
    }

    /// Highest threshold at or below `days_active` wins; below the lowest
    /// threshold there is no tier.
    fn tier_for(&self, days_active: i64) -> Option<String> {
        self.tiers
            .iter()
            .rev()
            .find(|t| days_active >= t.min_days)
            .map(|t| t.name.clone())
    }

    /// Evaluate every catalog badge and grant the eligible ones not yet
    /// held. Returns the newly granted badges. A unique-constraint race on
    /// insert means a concurrent check got there first — treated as already
    /// granted, not an error.
    pub fn check_eligibility(
        &self,
        store: &EngageStore,
        scores: &ScoreSubsystem,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<Vec<Badge>> {
        let mut granted = Vec::new();
        for badge in store.all_badges()? {
            if store.has_badge(user_id, &badge.id)? {
                continue;
            }
            if !self.is_eligible(store, scores, user_id, &badge, now)? {
                continue;
            }
            if store.insert_badge_grant(user_id, &badge.id, now.timestamp())? {
                log::info!("user={user_id} badge granted: {}", badge.id);
                granted.push(badge);
            } else {
                log::warn!(
                    "user={user_id} badge {} raced with a concurrent grant",
                    badge.id
                );
            }
        }
        Ok(granted)
    }

    /// OR semantics: any single satisfied criterion is enough.
    fn is_eligible(
        &self,
        store: &EngageStore,
        scores: &ScoreSubsystem,
        user_id: &str,
        badge: &Badge,
        now: DateTime<Utc>,
    ) -> EngageResult<bool> {
        let c = &badge.criteria;
        if let Some(min) = c.min_score {
            if scores.get_score(store, user_id, now)?.total_score >= min {
                return Ok(true);
            }
        }
        if let Some(min) = c.min_streak_days {
            if self.current_streak(store, user_id, now.date_naive())? >= min {
                return Ok(true);
            }
        }
        if let (Some(kind), Some(min)) = (&c.event_kind, c.min_event_count) {
            if store.event_count_of_kind(user_id, kind)? >= min {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Consecutive present days ending today — or ending yesterday when
    /// today has no present row yet. A day still in progress must not break
    /// a live streak.
    pub fn current_streak(
        &self,
        store: &EngageStore,
        user_id: &str,
        today: NaiveDate,
    ) -> EngageResult<i64> {
        let present = store.present_days_desc(user_id, today)?;
        let Some(&latest) = present.first() else {
            return Ok(0);
        };
        if latest != today && latest != today - Days::new(1) {
            return Ok(0);
        }

        let mut streak = 1i64;
        let mut prev = latest;
        for &day in &present[1..] {
            if day != prev - Days::new(1) {
                break;
            }
            streak += 1;
            prev = day;
        }
        Ok(streak)
    }

    /// Per-criterion progress toward one badge. Unknown badge ids are the
    /// caller's error, not ours to guess around.
    pub fn progress(
        &self,
        store: &EngageStore,
        scores: &ScoreSubsystem,
        user_id: &str,
        badge_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<BadgeProgress> {
        let badge = store.get_badge(badge_id)?.ok_or_else(|| EngageError::BadgeNotFound {
            id: badge_id.to_string(),
        })?;
        let earned = store.has_badge(user_id, &badge.id)?;

        let mut criteria = Vec::new();
        let c = &badge.criteria;
        if let Some(target) = c.min_score {
            criteria.push(CriterionProgress {
                metric: "score".to_string(),
                current: scores.get_score(store, user_id, now)?.total_score,
                target,
            });
        }
        if let Some(target) = c.min_streak_days {
            criteria.push(CriterionProgress {
                metric: "streak_days".to_string(),
                current: self.current_streak(store, user_id, now.date_naive())?,
                target,
            });
        }
        if let (Some(kind), Some(target)) = (&c.event_kind, c.min_event_count) {
            criteria.push(CriterionProgress {
                metric: kind.clone(),
                current: store.event_count_of_kind(user_id, kind)?,
                target,
            });
        }

        let percent = if earned {
            100.0
        } else {
            criteria
                .iter()
                .map(|p| {
                    if p.target <= 0 {
                        100.0
                    } else {
                        (p.current as f64 / p.target as f64 * 100.0).min(100.0)
                    }
                })
                .fold(0.0, f64::max)
        };

        Ok(BadgeProgress {
            badge_id: badge.id.clone(),
            name: badge.name.clone(),
            earned,
            percent: (percent * 100.0).round() / 100.0,
            criteria,
        })
    }
}
