//! The weighting table — event kind to point value.
//!
//! Pure lookup, no state. An unknown kind is worth 0 points: it is still
//! tracked in the event log but contributes nothing to any score, and the
//! lookup never errors.

use crate::{config::EngageConfig, event::EventKind};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: HashMap<String, i64>,
}

impl WeightTable {
    pub fn new(weights: HashMap<String, i64>) -> Self {
        Self { weights }
    }

    pub fn from_config(config: &EngageConfig) -> Self {
        Self::new(config.weights.clone())
    }

    /// Points for a raw event-type string. Unknown kinds score 0.
    pub fn weight(&self, kind: &str) -> i64 {
        self.weights.get(kind).copied().unwrap_or(0)
    }

    pub fn weight_of(&self, kind: &EventKind) -> i64 {
        self.weight(kind.as_str())
    }

    /// Fold per-kind counts (as returned by the store's GROUP BY) into a
    /// single weighted total.
    pub fn weighted_total(&self, counts: &[(String, i64)]) -> i64 {
        counts
            .iter()
            .map(|(kind, n)| self.weight(kind) * n)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_scores_zero() {
        let table = WeightTable::from_config(&EngageConfig::default());
        assert_eq!(table.weight("no_such_kind"), 0);
        assert_eq!(table.weight_of(&EventKind::Other("no_such_kind".into())), 0);
        assert_eq!(table.weight_of(&EventKind::Login), 10);
    }

    #[test]
    fn counts_fold_through_weights() {
        let table = WeightTable::from_config(&EngageConfig::default());
        let counts = vec![
            ("login".to_string(), 2),
            ("quiz_correct".to_string(), 1),
            ("no_such_kind".to_string(), 40),
        ];
        assert_eq!(table.weighted_total(&counts), 45);
    }
}
