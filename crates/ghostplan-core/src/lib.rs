//! # Ghostplan Core Library
//!
//! Fills the free time of a calendar day with "ghost" suggestions: tentative,
//! uncommitted activities the user can accept, select or dismiss. The CLI and
//! any presentation layer sit on top of this crate.
//!
//! ## Architecture
//!
//! - **Timeline**: day bounds, quiet hours and gap detection
//! - **Placement**: fits untimed candidates into gaps on a five minute grid
//! - **Refresh**: a cancellable background loop that regenerates and
//!   republishes ghosts, keeping ids stable across passes
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`GhostPlanner`]: owns the published ghosts and the refresh loop
//! - [`GapCalculator`]: free intervals of a day
//! - [`PlacementEngine`]: candidate to concrete slot
//! - [`CalendarStore`] / [`SuggestionGenerator`]: the services the planner talks to

pub mod collaborators;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod interval;
pub mod placement;
pub mod refresh;
pub mod selection;
pub mod storage;
pub mod suggestion;
pub mod timeline;

pub use collaborators::{
    CalendarStore, Clock, DaySummary, FixedClock, InMemoryCalendarStore, StaticGenerator,
    SuggestionGenerator, SystemClock,
};
pub use error::{CalendarError, ConfigError, CoreError, GeneratorError, ValidationError};
pub use events::PlannerEvent;
pub use fingerprint::Fingerprint;
pub use interval::TimeInterval;
pub use placement::PlacementEngine;
pub use refresh::{GhostPlanner, PassOutcome, RefreshReason, RefreshState};
pub use selection::{AcceptScope, SelectionSet};
pub use storage::Config;
pub use suggestion::{CandidateSuggestion, EnergyTag, PlacedSuggestion, SuggestionId};
pub use timeline::{DayContext, GapCalculator, QuietHoursPolicy, QuietWindow};
