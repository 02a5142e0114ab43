//! The ghost planner: owns the published suggestions and keeps them fresh.
//!
//! A background loop repeatedly asks the generator for candidates, places
//! them into the day's free time and publishes the result when it differs
//! from what is on screen. Passes never overlap, and once a pass sees that it
//! was cancelled it publishes nothing.
//!
//! Cancellation is an epoch counter in a `watch` channel. Every pass records
//! the epoch it started under; stopping the loop, restarting it or switching
//! days bumps the epoch, and a pass whose epoch is stale stops at its next
//! checkpoint (waiting for the pass lock, awaiting the generator, sleeping,
//! and right before publishing).

mod pass;
mod staging;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

use crate::collaborators::{CalendarStore, Clock, SuggestionGenerator};
use crate::events::PlannerEvent;
use crate::placement::PlacementEngine;
use crate::selection::SelectionSet;
use crate::storage::Config;
use crate::suggestion::{PlacedSuggestion, SuggestionId};
use crate::timeline::{DayContext, GapCalculator};

pub use pass::PassOutcome;

const EVENT_CAPACITY: usize = 64;

/// Why a refresh pass was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    Periodic,
    Accepted,
    Rejected,
    PinChanged,
    FeedbackChanged,
    DayChanged,
    RecommendationsToggled,
    ManualEdit,
    Forced,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshReason::Periodic => "periodic",
            RefreshReason::Accepted => "accepted",
            RefreshReason::Rejected => "rejected",
            RefreshReason::PinChanged => "pin_changed",
            RefreshReason::FeedbackChanged => "feedback_changed",
            RefreshReason::DayChanged => "day_changed",
            RefreshReason::RecommendationsToggled => "recommendations_toggled",
            RefreshReason::ManualEdit => "manual_edit",
            RefreshReason::Forced => "forced",
        };
        f.write_str(name)
    }
}

/// Lifecycle of the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshState {
    Idle,
    Running,
    Cancelled,
}

struct PlannerState {
    day: DayContext,
    enabled: bool,
    interval: Duration,
    placements: Arc<[PlacedSuggestion]>,
    selection: SelectionSet,
    /// Lowercased titles dismissed today; never placed again until the day changes.
    dismissed: HashSet<String>,
    pending: Option<RefreshReason>,
    refresh_state: RefreshState,
    /// Bumped whenever the user accepts or dismisses; a pass that started
    /// under an older value must not publish.
    staging_generation: u64,
}

struct Shared {
    calendar: Arc<dyn CalendarStore>,
    generator: Arc<dyn SuggestionGenerator>,
    clock: Arc<dyn Clock>,
    gaps: GapCalculator,
    placement: PlacementEngine,
    state: Mutex<PlannerState>,
    pass_lock: tokio::sync::Mutex<()>,
    cancel: watch::Sender<u64>,
    wake: Notify,
    events: broadcast::Sender<PlannerEvent>,
}

/// Snapshot of the cancellation epoch a pass or loop runs under.
struct CancelToken {
    epoch: u64,
    rx: watch::Receiver<u64>,
}

impl CancelToken {
    fn is_cancelled(&self) -> bool {
        *self.rx.borrow() != self.epoch
    }

    /// Resolves once the epoch moves on.
    async fn cancelled(&mut self) {
        while !self.is_cancelled() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, PlannerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn token(&self) -> CancelToken {
        let rx = self.cancel.subscribe();
        let epoch = *rx.borrow();
        CancelToken { epoch, rx }
    }

    fn bump_epoch(&self) {
        self.cancel.send_modify(|epoch| *epoch += 1);
    }

    fn emit(&self, event: PlannerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn request(&self, reason: RefreshReason) {
        self.lock_state().pending = Some(reason);
        self.wake.notify_one();
    }
}

/// Owns the ghost list, the selection, and the refresh loop for one day.
pub struct GhostPlanner {
    shared: Arc<Shared>,
    refresh_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl GhostPlanner {
    /// Create a planner for `day`. The refresh loop is not started.
    pub fn new(
        config: &Config,
        calendar: Arc<dyn CalendarStore>,
        generator: Arc<dyn SuggestionGenerator>,
        clock: Arc<dyn Clock>,
        day: DayContext,
    ) -> Self {
        let (cancel, _) = watch::channel(0);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state = PlannerState {
            day,
            enabled: config.refresh.enabled,
            interval: config.refresh_interval(),
            placements: Arc::from(Vec::new()),
            selection: SelectionSet::new(),
            dismissed: HashSet::new(),
            pending: None,
            refresh_state: RefreshState::Idle,
            staging_generation: 0,
        };

        Self {
            shared: Arc::new(Shared {
                calendar,
                generator,
                clock,
                gaps: config.gap_calculator(),
                placement: config.placement_engine(),
                state: Mutex::new(state),
                pass_lock: tokio::sync::Mutex::new(()),
                cancel,
                wake: Notify::new(),
                events,
            }),
            refresh_task: tokio::sync::Mutex::new(None),
        }
    }

    /// Change notifications for the presentation layer.
    pub fn subscribe(&self) -> broadcast::Receiver<PlannerEvent> {
        self.shared.events.subscribe()
    }

    /// The currently published ghosts, sorted by start.
    pub fn current_placements(&self) -> Arc<[PlacedSuggestion]> {
        Arc::clone(&self.shared.lock_state().placements)
    }

    pub fn selected_ids(&self) -> Vec<SuggestionId> {
        self.shared.lock_state().selection.ids().copied().collect()
    }

    pub fn is_selected(&self, id: &SuggestionId) -> bool {
        self.shared.lock_state().selection.contains(id)
    }

    pub fn day(&self) -> DayContext {
        self.shared.lock_state().day
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.shared.lock_state().refresh_state
    }

    pub fn recommendations_enabled(&self) -> bool {
        self.shared.lock_state().enabled
    }

    pub fn pending_reason(&self) -> Option<RefreshReason> {
        self.shared.lock_state().pending
    }

    /// Change the sleep between loop passes; takes effect after the current sleep.
    pub fn set_refresh_interval(&self, interval: Duration) {
        self.shared.lock_state().interval = interval;
    }

    /// Record `reason` as pending and wake the loop early.
    ///
    /// Requests arriving while a pass runs collapse into one follow-up pass.
    pub fn request_refresh(&self, reason: RefreshReason) {
        self.shared.request(reason);
    }

    /// Start the loop, replacing any loop that is already running.
    pub async fn start_refresh_loop(&self) {
        let mut task = self.refresh_task.lock().await;
        if let Some(previous) = task.take() {
            self.shared.bump_epoch();
            Self::join(previous).await;
        }

        if !self.shared.lock_state().enabled {
            tracing::debug!("ghost suggestions disabled; refresh loop not started");
            return;
        }

        let token = self.shared.token();
        self.shared.lock_state().refresh_state = RefreshState::Running;
        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(pass::run_loop(shared, token)));
        tracing::info!(day = %self.day().date, "refresh loop started");
    }

    /// Stop the loop. Any pass in flight is abandoned without publishing.
    pub async fn stop_refresh_loop(&self) {
        let mut task = self.refresh_task.lock().await;
        self.shared.bump_epoch();
        if let Some(handle) = task.take() {
            Self::join(handle).await;
            self.shared.lock_state().refresh_state = RefreshState::Cancelled;
            tracing::info!("refresh loop stopped");
        }
    }

    /// Run one pass now and publish its result even if nothing changed.
    pub async fn force_refresh(&self) -> PassOutcome {
        let mut token = self.shared.token();
        pass::run_pass(&self.shared, &mut token, true).await
    }

    /// The calendar was edited outside the planner.
    pub async fn notify_calendar_edited(&self) -> PassOutcome {
        self.shared.lock_state().pending = Some(RefreshReason::ManualEdit);
        self.force_refresh().await
    }

    /// Switch to another day. All ghosts and the selection are dropped and a
    /// running loop is restarted for the new day.
    pub async fn set_day(&self, day: DayContext) {
        let was_running = self.refresh_task.lock().await.is_some();
        if was_running {
            self.stop_refresh_loop().await;
        } else {
            self.shared.bump_epoch();
        }

        {
            let mut st = self.shared.lock_state();
            st.day = day;
            st.placements = Arc::from(Vec::new());
            st.selection.clear();
            st.dismissed.clear();
            st.pending = Some(RefreshReason::DayChanged);
        }
        self.shared.emit(PlannerEvent::DayChanged { day, at: self.shared.clock.now() });

        if was_running {
            self.start_refresh_loop().await;
        }
    }

    /// Turn ghost suggestions on or off. Turning them off clears the list.
    pub async fn set_recommendations_enabled(&self, enabled: bool) {
        if enabled {
            {
                let mut st = self.shared.lock_state();
                if st.enabled {
                    return;
                }
                st.enabled = true;
                st.pending = Some(RefreshReason::RecommendationsToggled);
            }
            self.start_refresh_loop().await;
            return;
        }

        self.stop_refresh_loop().await;
        let had_ghosts = {
            let mut st = self.shared.lock_state();
            st.enabled = false;
            st.selection.clear();
            let had = !st.placements.is_empty();
            st.placements = Arc::from(Vec::new());
            had
        };
        if had_ghosts {
            self.shared.emit(PlannerEvent::PlacementsPublished {
                count: 0,
                reason: Some(RefreshReason::RecommendationsToggled),
                forced: true,
                at: self.shared.clock.now(),
            });
        }
    }

    async fn join(handle: JoinHandle<()>) {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "refresh loop ended abnormally");
        }
    }
}

impl Drop for GhostPlanner {
    fn drop(&mut self) {
        self.shared.bump_epoch();
    }
}
