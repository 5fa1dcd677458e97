//! Card-id classification — which content store recognizes this id?
//!
//! An engagement submission may omit the card type. The engine then probes a
//! small ordered list of content providers; the first one that recognizes
//! the id wins, and the configured default applies when none do. The
//! classification is best-effort, never authoritative, and never an error.

use crate::error::EngageResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    CurrentAffairs,
    GeneralKnowledge,
    Mcq,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentAffairs => "current_affairs",
            Self::GeneralKnowledge => "general_knowledge",
            Self::Mcq => "mcq",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "current_affairs" => Some(Self::CurrentAffairs),
            "general_knowledge" => Some(Self::GeneralKnowledge),
            "mcq" => Some(Self::Mcq),
            _ => None,
        }
    }
}

/// A content store that can answer "is this card id one of mine?".
/// Providers are registered on the engine in priority order.
pub trait ContentProvider: Send {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "not mine" — the next provider is asked.
    fn resolve(&self, card_id: &str) -> EngageResult<Option<CardType>>;
}

/// A provider backed by a fixed id set. The production deployment wires
/// providers over the real post/MCQ stores; tests and the demo runner use
/// this one.
pub struct StaticContentProvider {
    name: &'static str,
    card_type: CardType,
    known: HashSet<String>,
}

impl StaticContentProvider {
    pub fn new<I, S>(name: &'static str, card_type: CardType, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name,
            card_type,
            known: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl ContentProvider for StaticContentProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn resolve(&self, card_id: &str) -> EngageResult<Option<CardType>> {
        Ok(self.known.contains(card_id).then_some(self.card_type))
    }
}
