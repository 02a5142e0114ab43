//! Selection state and accept/dismiss staging.
//!
//! The planner keeps the published ghosts and the ids the user picked. The
//! helpers here decide which ghosts an accept or dismiss touches; committing
//! them to the calendar is left to the planner.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::suggestion::{PlacedSuggestion, SuggestionId};

/// Ids of ghosts the user has marked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    ids: HashSet<SuggestionId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `id`. Ids not present in `placements` are ignored.
    /// Returns whether anything changed.
    pub fn toggle(&mut self, id: SuggestionId, placements: &[PlacedSuggestion]) -> bool {
        if !placements.iter().any(|p| p.id == id) {
            return false;
        }
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
        true
    }

    pub fn contains(&self, id: &SuggestionId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &SuggestionId> {
        self.ids.iter()
    }

    /// Drop ids that no longer belong to a published ghost.
    /// Returns whether anything was removed.
    pub fn retain_valid(&mut self, placements: &[PlacedSuggestion]) -> bool {
        let before = self.ids.len();
        let valid: HashSet<SuggestionId> = placements.iter().map(|p| p.id).collect();
        self.ids.retain(|id| valid.contains(id));
        self.ids.len() != before
    }
}

/// Which ghosts an accept operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptScope {
    All,
    /// Selected ghosts, or everything when nothing is selected.
    Selected,
}

/// Split `placements` into (accepted, kept).
pub fn partition_for_accept(
    placements: &[PlacedSuggestion],
    selection: &SelectionSet,
    scope: AcceptScope,
) -> (Vec<PlacedSuggestion>, Vec<PlacedSuggestion>) {
    let take_all = scope == AcceptScope::All || selection.is_empty();
    placements
        .iter()
        .cloned()
        .partition(|p| take_all || selection.contains(&p.id))
}

/// Remove one ghost by id. `None` when the id is unknown.
pub fn remove_by_id(
    placements: &[PlacedSuggestion],
    id: SuggestionId,
) -> Option<(PlacedSuggestion, Vec<PlacedSuggestion>)> {
    let index = placements.iter().position(|p| p.id == id)?;
    let mut rest = placements.to_vec();
    let removed = rest.remove(index);
    Some((removed, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::CandidateSuggestion;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn ghosts(n: usize) -> Vec<PlacedSuggestion> {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                PlacedSuggestion::new(
                    CandidateSuggestion::new(format!("g{i}"), 15),
                    base + Duration::hours(i as i64),
                    Duration::minutes(15),
                )
            })
            .collect()
    }

    #[test]
    fn toggle_flips_known_ids_only() {
        let list = ghosts(2);
        let mut sel = SelectionSet::new();

        assert!(sel.toggle(list[0].id, &list));
        assert!(sel.contains(&list[0].id));
        assert!(sel.toggle(list[0].id, &list));
        assert!(sel.is_empty());

        assert!(!sel.toggle(Uuid::new_v4(), &list));
        assert!(sel.is_empty());
    }

    #[test]
    fn retain_valid_prunes_stale_ids() {
        let list = ghosts(3);
        let mut sel = SelectionSet::new();
        sel.toggle(list[0].id, &list);
        sel.toggle(list[2].id, &list);

        assert!(sel.retain_valid(&list[..2]));
        assert_eq!(sel.len(), 1);
        assert!(!sel.retain_valid(&list[..2]));
    }

    #[test]
    fn accept_selected_takes_only_selection() {
        let list = ghosts(3);
        let mut sel = SelectionSet::new();
        sel.toggle(list[1].id, &list);

        let (accepted, kept) = partition_for_accept(&list, &sel, AcceptScope::Selected);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, list[1].id);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn accept_selected_with_empty_selection_takes_everything() {
        let list = ghosts(3);
        let (accepted, kept) = partition_for_accept(&list, &SelectionSet::new(), AcceptScope::Selected);
        assert_eq!(accepted.len(), 3);
        assert!(kept.is_empty());
    }

    #[test]
    fn remove_by_id_ignores_unknown() {
        let list = ghosts(2);
        assert!(remove_by_id(&list, Uuid::new_v4()).is_none());
        let (removed, rest) = remove_by_id(&list, list[1].id).unwrap();
        assert_eq!(removed.id, list[1].id);
        assert_eq!(rest.len(), 1);
    }
}
