//! Candidate and placed ("ghost") suggestions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interval::TimeInterval;

/// Unique identifier for a placed suggestion.
pub type SuggestionId = Uuid;

/// Longest length a suggestion can ask for or be given: one full day.
pub const MAX_SUGGESTION_MINUTES: i64 = 24 * 60;

/// Minutes to a `Duration`, clamped to `0..=MAX_SUGGESTION_MINUTES`.
fn bounded_minutes(minutes: i64) -> Duration {
    Duration::minutes(minutes.clamp(0, MAX_SUGGESTION_MINUTES))
}

/// How demanding an activity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyTag {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for EnergyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyTag::Low => write!(f, "low"),
            EnergyTag::Medium => write!(f, "medium"),
            EnergyTag::High => write!(f, "high"),
        }
    }
}

/// An untimed activity proposed by the suggestion generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSuggestion {
    pub title: String,
    /// Requested length in minutes.
    pub requested_minutes: i64,
    #[serde(default)]
    pub energy: EnergyTag,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub explanation: String,
    /// Generator confidence, 0.0 to 1.0.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_pillar: Option<String>,
}

impl CandidateSuggestion {
    pub fn new(title: impl Into<String>, requested_minutes: i64) -> Self {
        Self {
            title: title.into(),
            requested_minutes,
            energy: EnergyTag::default(),
            emoji: String::new(),
            explanation: String::new(),
            confidence: 0.0,
            related_goal: None,
            related_pillar: None,
        }
    }

    pub fn with_energy(mut self, energy: EnergyTag) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Requested length. Out-of-range requests from the generator are
    /// clamped to a day.
    pub fn requested_duration(&self) -> Duration {
        bounded_minutes(self.requested_minutes)
    }
}

/// A candidate that has been given a time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedSuggestion {
    pub id: SuggestionId,
    #[serde(flatten)]
    pub candidate: CandidateSuggestion,
    pub start: DateTime<Utc>,
    /// Placed length in minutes, possibly shorter than requested.
    pub duration_minutes: i64,
}

impl PlacedSuggestion {
    /// Place `candidate` at `start` with a freshly minted id.
    pub fn new(candidate: CandidateSuggestion, start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            start,
            duration_minutes: duration.num_minutes(),
        }
    }

    pub fn title(&self) -> &str {
        &self.candidate.title
    }

    pub fn duration(&self) -> Duration {
        bounded_minutes(self.duration_minutes)
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration()
    }

    /// `None` only for a hand-built placement with no length.
    pub fn interval(&self) -> Option<TimeInterval> {
        TimeInterval::new(self.start, self.end()).ok()
    }

    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end() && self.end() > other.start()
    }
}
