//! The activity event log — the engine's raw input.
//!
//! RULE: events are append-only facts. Feature modules (auth login, quiz
//! submission, social actions) emit them through the engine's collaborator
//! hook; the scoring engine never updates or deletes a row. `created_at` is
//! authoritative — arrival order is not.

use crate::types::UserId;
use chrono::{DateTime, Utc};

/// The closed set of activity kinds the engine knows how to weight.
/// Kinds outside the set pass through as `Other` and score zero — an
/// upstream module shipping a new kind must never break ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Login,
    ContentView,
    QuizAttempt,
    QuizCorrect,
    SocialPost,
    Connection,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => "login",
            Self::ContentView => "content_view",
            Self::QuizAttempt => "quiz_attempt",
            Self::QuizCorrect => "quiz_correct",
            Self::SocialPost => "social_post",
            Self::Connection => "connection",
            Self::Other(s) => s,
        }
    }

    /// Total — every string maps to a kind.
    pub fn parse(s: &str) -> Self {
        match s {
            "login" => Self::Login,
            "content_view" => Self::ContentView,
            "quiz_attempt" => Self::QuizAttempt,
            "quiz_correct" => Self::QuizCorrect,
            "social_post" => Self::SocialPost,
            "connection" => Self::Connection,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An activity event as persisted to the log.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub id: String,
    pub user_id: UserId,
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
    /// Free-form payload from the emitting module, stored verbatim.
    pub metadata: Option<serde_json::Value>,
}

impl ActivityEvent {
    pub fn new(user_id: &str, kind: EventKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            created_at,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strings() {
        for s in ["login", "content_view", "quiz_attempt", "quiz_correct", "social_post", "connection"] {
            assert_eq!(EventKind::parse(s).as_str(), s);
        }
        assert_eq!(EventKind::parse("feed_like"), EventKind::Other("feed_like".into()));
        assert_eq!(EventKind::parse("feed_like").as_str(), "feed_like");
    }
}
