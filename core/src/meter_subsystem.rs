//! Weekly meter — a dense 7-day rolling presence view.
//!
//! Reads the persisted daily statuses for `[today-6, today]` and fills any
//! missing day with a non-present zero placeholder. Missing data means the
//! user had no activity that day; it is never an error.

use crate::{error::EngageResult, store::EngageStore};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct MeterDay {
    pub day: NaiveDate,
    pub is_present: bool,
    /// Mirrors `is_present`; clients read either name.
    pub completed: bool,
    pub card_view_count: i64,
    pub mcq_attempt_count: i64,
    pub mcq_accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyMeter {
    pub days_completed: i64,
    /// Exactly 7 entries, oldest first.
    pub days: Vec<MeterDay>,
}

#[derive(Default)]
pub struct MeterSubsystem;

impl MeterSubsystem {
    pub fn new() -> Self {
        Self
    }

    pub fn weekly_meter(
        &self,
        store: &EngageStore,
        user_id: &str,
        today: NaiveDate,
    ) -> EngageResult<WeeklyMeter> {
        let from = today - Days::new(6);
        let rows = store.daily_status_range(user_id, from, today)?;
        let by_day: HashMap<NaiveDate, _> = rows.into_iter().map(|r| (r.day, r)).collect();

        let days: Vec<MeterDay> = (0..7)
            .map(|offset| {
                let day = from + Days::new(offset);
                match by_day.get(&day) {
                    Some(status) => MeterDay {
                        day,
                        is_present: status.is_present,
                        completed: status.is_present,
                        card_view_count: status.card_view_count,
                        mcq_attempt_count: status.mcq_attempt_count,
                        mcq_accuracy: status.mcq_accuracy,
                    },
                    None => MeterDay {
                        day,
                        is_present: false,
                        completed: false,
                        card_view_count: 0,
                        mcq_attempt_count: 0,
                        mcq_accuracy: 0.0,
                    },
                }
            })
            .collect();

        let days_completed = days.iter().filter(|d| d.is_present).count() as i64;
        Ok(WeeklyMeter {
            days_completed,
            days,
        })
    }
}
