//! Daily engagement recorder — digest rows in, presence rollup out.
//!
//! RULE: the per-day status row is never edited incrementally. Every write
//! appends one digest row, then re-reads ALL of the day's digest rows and
//! rebuilds the status from scratch. Duplicate, concurrent, and out-of-order
//! submissions for the same day therefore converge to the same rollup.

use crate::{
    config::{EngageConfig, PresenceConfig},
    content::{CardType, ContentProvider},
    error::{EngageError, EngageResult},
    store::EngageStore,
    types::UserId,
};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementKind {
    CardView,
    McqAttempt,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CardView => "card_view",
            Self::McqAttempt => "mcq_attempt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card_view" => Some(Self::CardView),
            "mcq_attempt" => Some(Self::McqAttempt),
            _ => None,
        }
    }
}

/// One discrete engagement action, persisted verbatim.
#[derive(Debug, Clone)]
pub struct DigestEngagement {
    pub id: String,
    pub user_id: UserId,
    pub card_id: String,
    pub card_type: CardType,
    pub kind: EngagementKind,
    pub duration: i64,
    pub is_correct: Option<bool>,
    pub day: NaiveDate,
}

/// An inbound engagement submission.
#[derive(Debug, Clone)]
pub struct TrackEngagement {
    pub user_id: UserId,
    pub card_id: String,
    pub kind: EngagementKind,
    /// Seconds spent, for view engagements.
    pub duration: Option<i64>,
    /// For quiz attempts: whether the answer was correct.
    pub is_complete: bool,
    /// Logical day; defaults to today (UTC) when absent.
    pub day: Option<NaiveDate>,
    /// Explicit category; inferred from the content providers when absent.
    pub card_type: Option<CardType>,
}

/// The materialized per-day rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatus {
    pub user_id: UserId,
    pub day: NaiveDate,
    pub is_present: bool,
    pub card_view_count: i64,
    pub mcq_attempt_count: i64,
    pub mcq_correct_count: i64,
    pub mcq_accuracy: f64,
    pub total_engagement_duration: i64,
}

pub struct EngagementSubsystem {
    presence: PresenceConfig,
    default_card_type: CardType,
}

impl EngagementSubsystem {
    pub fn new(config: &EngageConfig) -> Self {
        Self {
            presence: config.presence.clone(),
            default_card_type: config.default_card_type,
        }
    }

    /// Record one engagement and rebuild the day's status.
    pub fn track(
        &self,
        store: &EngageStore,
        providers: &[Box<dyn ContentProvider>],
        req: TrackEngagement,
        today: NaiveDate,
    ) -> EngageResult<DailyStatus> {
        // Validation before any write.
        if let Some(d) = req.duration {
            if d < 0 {
                return Err(EngageError::InvalidDuration { value: d });
            }
        }

        let day = req.day.unwrap_or(today);
        let card_type = match req.card_type {
            Some(t) => t,
            None => self.classify(providers, &req.card_id),
        };

        let row = DigestEngagement {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: req.user_id.clone(),
            card_id: req.card_id,
            card_type,
            kind: req.kind,
            duration: req.duration.unwrap_or(0),
            is_correct: (req.kind == EngagementKind::McqAttempt).then_some(req.is_complete),
            day,
        };
        store.insert_digest(&row)?;

        let rows = store.digest_rows_for_day(&req.user_id, day)?;
        let status = self.rollup(&req.user_id, day, &rows);
        store.upsert_daily_status(&status)?;

        log::debug!(
            "user={} day={day} rollup: views={} attempts={} accuracy={:.2} present={}",
            req.user_id,
            status.card_view_count,
            status.mcq_attempt_count,
            status.mcq_accuracy,
            status.is_present,
        );

        Ok(status)
    }

    /// Probe providers in registration order; first hit wins. A provider
    /// error is logged and treated as no-match — classification is
    /// best-effort, never authoritative.
    fn classify(&self, providers: &[Box<dyn ContentProvider>], card_id: &str) -> CardType {
        for provider in providers {
            match provider.resolve(card_id) {
                Ok(Some(card_type)) => return card_type,
                Ok(None) => {}
                Err(e) => {
                    log::warn!("content provider '{}' failed for card {card_id}: {e}", provider.name());
                }
            }
        }
        self.default_card_type
    }

    /// Rebuild a day's status from all of its digest rows.
    ///
    /// Presence rule: at least one qualifying view, OR at least one quiz
    /// attempt with accuracy at or above the threshold.
    fn rollup(&self, user_id: &str, day: NaiveDate, rows: &[DigestEngagement]) -> DailyStatus {
        let mut card_view_count = 0i64;
        let mut mcq_attempt_count = 0i64;
        let mut mcq_correct_count = 0i64;
        let mut total_engagement_duration = 0i64;

        for row in rows {
            match row.kind {
                EngagementKind::CardView => {
                    if row.duration >= self.presence.min_view_seconds {
                        card_view_count += 1;
                    }
                    total_engagement_duration += row.duration;
                }
                EngagementKind::McqAttempt => {
                    mcq_attempt_count += 1;
                    if row.is_correct == Some(true) {
                        mcq_correct_count += 1;
                    }
                }
            }
        }

        let mcq_accuracy = if mcq_attempt_count > 0 {
            round2(mcq_correct_count as f64 / mcq_attempt_count as f64 * 100.0)
        } else {
            0.0
        };
        let is_present = card_view_count >= 1
            || (mcq_attempt_count >= 1 && mcq_accuracy >= self.presence.min_quiz_accuracy);

        DailyStatus {
            user_id: user_id.to_string(),
            day,
            is_present,
            card_view_count,
            mcq_attempt_count,
            mcq_correct_count,
            mcq_accuracy,
            total_engagement_duration,
        }
    }
}

/// Two-decimal precision, the stored accuracy format.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
