//! User actions on published ghosts: select, accept, dismiss.

use std::sync::Arc;

use super::{GhostPlanner, RefreshReason};
use crate::events::PlannerEvent;
use crate::selection::{partition_for_accept, remove_by_id, AcceptScope};
use crate::suggestion::{PlacedSuggestion, SuggestionId};

impl GhostPlanner {
    /// Flip the selection of `id`. Unknown ids are ignored.
    pub fn toggle_selection(&self, id: SuggestionId) -> bool {
        let selected = {
            let mut st = self.shared.lock_state();
            let placements = Arc::clone(&st.placements);
            if !st.selection.toggle(id, &placements) {
                return false;
            }
            st.selection.ids().copied().collect()
        };
        self.shared.emit(PlannerEvent::SelectionChanged {
            selected,
            at: self.shared.clock.now(),
        });
        true
    }

    /// Commit every ghost to the calendar. Returns how many were committed.
    pub fn accept_all(&self) -> usize {
        self.accept(AcceptScope::All)
    }

    /// Commit the selected ghosts, or all of them when nothing is selected.
    pub fn accept_selected(&self) -> usize {
        self.accept(AcceptScope::Selected)
    }

    /// Remove one ghost without committing it. Its title is not suggested
    /// again for the rest of the day.
    pub fn dismiss(&self, id: SuggestionId) -> bool {
        let selected = {
            let mut st = self.shared.lock_state();
            let Some((removed, rest)) = remove_by_id(&st.placements, id) else {
                return false;
            };
            st.dismissed.insert(removed.title().to_lowercase());
            st.placements = Arc::from(rest);
            st.staging_generation += 1;
            let placements = Arc::clone(&st.placements);
            st.selection
                .retain_valid(&placements)
                .then(|| st.selection.ids().copied().collect::<Vec<_>>())
        };

        let at = self.shared.clock.now();
        tracing::info!(%id, "ghost suggestion dismissed");
        self.shared.emit(PlannerEvent::SuggestionDismissed { id, at });
        if let Some(selected) = selected {
            self.shared.emit(PlannerEvent::SelectionChanged { selected, at });
        }
        self.shared.request(RefreshReason::Rejected);
        true
    }

    fn accept(&self, scope: AcceptScope) -> usize {
        let accepted = {
            let mut st = self.shared.lock_state();
            let accepted = partition_for_accept(&st.placements, &st.selection, scope).0;
            if accepted.is_empty() {
                return 0;
            }
            // Passes that read the calendar before these commits must not publish.
            st.staging_generation += 1;
            accepted
        };

        let committed: Vec<SuggestionId> = accepted
            .iter()
            .filter_map(|ghost| self.commit_one(ghost))
            .collect();
        if committed.is_empty() {
            return 0;
        }

        let selected = {
            let mut st = self.shared.lock_state();
            let remaining: Vec<PlacedSuggestion> = st
                .placements
                .iter()
                .filter(|p| !committed.contains(&p.id))
                .cloned()
                .collect();
            st.placements = Arc::from(remaining);
            st.staging_generation += 1;
            let placements = Arc::clone(&st.placements);
            st.selection
                .retain_valid(&placements)
                .then(|| st.selection.ids().copied().collect::<Vec<_>>())
        };

        let at = self.shared.clock.now();
        tracing::info!(count = committed.len(), "ghost suggestions accepted");
        let count = committed.len();
        self.shared.emit(PlannerEvent::SuggestionsAccepted { ids: committed, at });
        if let Some(selected) = selected {
            self.shared.emit(PlannerEvent::SelectionChanged { selected, at });
        }
        self.shared.request(RefreshReason::Accepted);
        count
    }

    fn commit_one(&self, ghost: &PlacedSuggestion) -> Option<SuggestionId> {
        match self.shared.calendar.commit(ghost) {
            Ok(()) => Some(ghost.id),
            Err(e) => {
                tracing::warn!(error = %e, title = %ghost.title(), "commit failed; keeping ghost");
                None
            }
        }
    }
}
