//! Engine configuration — weights, presence thresholds, tier ladder, and
//! cache policy. Defaults encode the production constants; a deployment may
//! override any of them from a JSON file.

use crate::{content::CardType, error::EngageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngageConfig {
    /// Event kind -> point value. Kinds absent from the table score 0.
    pub weights: HashMap<String, i64>,
    pub presence: PresenceConfig,
    /// Tier ladder, ascending by `min_days`. Evaluated highest-first so a
    /// user clearing a higher bound gets the higher tier.
    pub tiers: Vec<TierThreshold>,
    /// Trailing window for the tier classification, in days, inclusive of
    /// today.
    pub badge_window_days: i64,
    /// Staleness bound for the cached total score. 0 means recompute on
    /// every read.
    pub score_cache_ttl_secs: i64,
    /// Category assigned when no content provider recognizes a card id.
    pub default_card_type: CardType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// A card view must last at least this many seconds to count.
    pub min_view_seconds: i64,
    /// Quiz-only days need at least this accuracy (percent) to count.
    pub min_quiz_accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThreshold {
    pub min_days: i64,
    pub name: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            min_view_seconds: 20,
            min_quiz_accuracy: 50.0,
        }
    }
}

impl Default for EngageConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            presence: PresenceConfig::default(),
            tiers: default_tiers(),
            badge_window_days: 180,
            score_cache_ttl_secs: 0,
            default_card_type: CardType::CurrentAffairs,
        }
    }
}

impl EngageConfig {
    /// Load from a JSON file. Absent keys fall back to the defaults.
    pub fn load(path: &Path) -> EngageResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }
}

fn default_weights() -> HashMap<String, i64> {
    HashMap::from([
        ("login".to_string(), 10),
        ("content_view".to_string(), 5),
        ("quiz_attempt".to_string(), 15),
        ("quiz_correct".to_string(), 25),
        ("social_post".to_string(), 30),
        ("connection".to_string(), 20),
    ])
}

fn default_tiers() -> Vec<TierThreshold> {
    [
        (30, "rookie"),
        (60, "explorer"),
        (90, "adventurer"),
        (120, "elite"),
        (150, "champion"),
        (180, "legend"),
    ]
    .into_iter()
    .map(|(min_days, name)| TierThreshold {
        min_days,
        name: name.to_string(),
    })
    .collect()
}
