use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{PhaseKind, TimerSettings};

/// Every state change of a timer engine produces an Event.
/// Hosts render them; the runtime broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: PhaseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: PhaseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: PhaseKind,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// The user picked a phase directly (e.g. a phase tab).
    PhaseSelected {
        from: PhaseKind,
        to: PhaseKind,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    SettingsReplaced {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        ended: PhaseKind,
        next: PhaseKind,
        completed_focus_count: u32,
        auto_started: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: PhaseKind,
        remaining_secs: u32,
        is_running: bool,
        completed_focus_count: u32,
        formatted_time: String,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
