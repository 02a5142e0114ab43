use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::refresh::RefreshReason;
use crate::suggestion::SuggestionId;
use crate::timeline::DayContext;

/// Every observable change in the planner produces an Event.
/// The presentation layer subscribes and re-reads the snapshot it cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlannerEvent {
    /// A new ghost list replaced the previous one.
    PlacementsPublished {
        count: usize,
        reason: Option<RefreshReason>,
        forced: bool,
        at: DateTime<Utc>,
    },
    /// The user's selection changed, directly or by pruning.
    SelectionChanged {
        selected: Vec<SuggestionId>,
        at: DateTime<Utc>,
    },
    /// Ghosts were committed to the calendar.
    SuggestionsAccepted {
        ids: Vec<SuggestionId>,
        at: DateTime<Utc>,
    },
    /// A ghost was dismissed without committing.
    SuggestionDismissed {
        id: SuggestionId,
        at: DateTime<Utc>,
    },
    /// The planner moved to another day; all ghosts were cleared.
    DayChanged {
        day: DayContext,
        at: DateTime<Utc>,
    },
}
