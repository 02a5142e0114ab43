//! One refresh pass, and the loop that repeats it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{CancelToken, RefreshReason, Shared};
use crate::collaborators::DaySummary;
use crate::events::PlannerEvent;
use crate::fingerprint::{has_changed, reconcile};
use crate::suggestion::{CandidateSuggestion, PlacedSuggestion};
use crate::timeline::{free_minutes, DayContext};

/// What a single pass ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassOutcome {
    /// A new list replaced the old one.
    Published { count: usize },
    /// The new placements matched what was already shown.
    Unchanged,
    /// Cancelled before it could publish.
    Cancelled,
    /// The user accepted or dismissed ghosts while this pass ran, so its
    /// view of the calendar was stale. A follow-up pass is already pending.
    Superseded,
    /// Nothing to do: suggestions are off or the calendar could not be read.
    Skipped,
}

pub(super) async fn run_loop(shared: Arc<Shared>, mut token: CancelToken) {
    loop {
        let outcome = run_pass(&shared, &mut token, false).await;
        tracing::debug!(?outcome, "refresh pass finished");
        if token.is_cancelled() {
            break;
        }

        let interval = shared.lock_state().interval;
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
            _ = shared.wake.notified() => {}
        }
    }
    tracing::debug!("refresh loop exited");
}

pub(super) async fn run_pass(shared: &Shared, token: &mut CancelToken, forced: bool) -> PassOutcome {
    let _pass = tokio::select! {
        guard = shared.pass_lock.lock() => guard,
        _ = token.cancelled() => return PassOutcome::Cancelled,
    };
    if token.is_cancelled() {
        return PassOutcome::Cancelled;
    }

    let (day, generation, reason, current_titles, dismissed_titles) = {
        let mut st = shared.lock_state();
        if !st.enabled {
            return PassOutcome::Skipped;
        }
        let mut reason = st.pending.take();
        if forced && reason.is_none() {
            reason = Some(RefreshReason::Forced);
        }
        let titles: Vec<String> = st.placements.iter().map(|p| p.title().to_string()).collect();
        let dismissed: Vec<String> = st.dismissed.iter().cloned().collect();
        (st.day, st.staging_generation, reason, titles, dismissed)
    };

    let blocks = match shared.calendar.current_day_blocks(&day) {
        Ok(blocks) => blocks,
        Err(e) => {
            tracing::warn!(error = %e, "could not read calendar; skipping pass");
            restore_pending(shared, reason);
            return PassOutcome::Skipped;
        }
    };
    let quiet = shared.calendar.quiet_hour_windows(&day);

    let preview = shared.gaps.compute_gaps(&day, &blocks, &quiet, shared.clock.now());
    let summary = DaySummary {
        day,
        committed: blocks.clone(),
        free_minutes: free_minutes(&preview),
        current_titles,
        dismissed_titles,
    };

    let candidates = tokio::select! {
        _ = token.cancelled() => return PassOutcome::Cancelled,
        result = shared.generator.generate(&summary, reason) => match result {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, reason = ?reason, "suggestion generator failed; no suggestions this pass");
                Vec::new()
            }
        },
    };
    if token.is_cancelled() {
        return PassOutcome::Cancelled;
    }

    let candidates = without_dismissed(shared, candidates);
    let now = shared.clock.now();
    let gaps = shared.gaps.compute_gaps(&day, &blocks, &quiet, now);
    let placing_now = day.is_today(now).then_some(now);
    let placed = shared.placement.place(&candidates, &gaps, placing_now);
    tracing::debug!(
        candidates = candidates.len(),
        gaps = gaps.len(),
        placed = placed.len(),
        "placement computed"
    );

    publish(shared, token, day, generation, placed, reason, forced)
}

fn publish(
    shared: &Shared,
    token: &CancelToken,
    day: DayContext,
    generation: u64,
    placed: Vec<PlacedSuggestion>,
    reason: Option<RefreshReason>,
    forced: bool,
) -> PassOutcome {
    let (count, selection_pruned, selected) = {
        let mut st = shared.lock_state();
        if token.is_cancelled() || st.day != day || !st.enabled {
            return PassOutcome::Cancelled;
        }
        if st.staging_generation != generation {
            tracing::debug!(reason = ?reason, "ghosts changed during pass; dropping its result");
            if st.pending.is_none() {
                st.pending = reason.filter(|r| *r != RefreshReason::Forced);
            }
            drop(st);
            shared.wake.notify_one();
            return PassOutcome::Superseded;
        }

        let next = reconcile(&st.placements, placed);
        if !forced && !has_changed(&st.placements, &next) {
            return PassOutcome::Unchanged;
        }

        st.placements = Arc::from(next);
        let placements = Arc::clone(&st.placements);
        let pruned = st.selection.retain_valid(&placements);
        (
            placements.len(),
            pruned,
            st.selection.ids().copied().collect::<Vec<_>>(),
        )
    };

    let at = shared.clock.now();
    tracing::info!(count, forced, reason = ?reason, "published ghost suggestions");
    shared.emit(PlannerEvent::PlacementsPublished {
        count,
        reason,
        forced,
        at,
    });
    if selection_pruned {
        shared.emit(PlannerEvent::SelectionChanged { selected, at });
    }
    PassOutcome::Published { count }
}

fn without_dismissed(shared: &Shared, candidates: Vec<CandidateSuggestion>) -> Vec<CandidateSuggestion> {
    let st = shared.lock_state();
    if st.dismissed.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| !st.dismissed.contains(&c.title.to_lowercase()))
        .collect()
}

fn restore_pending(shared: &Shared, reason: Option<RefreshReason>) {
    let mut st = shared.lock_state();
    if st.pending.is_none() {
        st.pending = reason.filter(|r| *r != RefreshReason::Forced);
    }
}
