//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use internal
//! threads - a driver (see [`TickDriver`]) or the caller is responsible for
//! calling `tick()` once per second while the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//! {Focus, ShortBreak, LongBreak} x {Running, Paused}
//!
//! Focus      --complete--> ShortBreak | LongBreak   (auto_start_breaks)
//! ShortBreak --complete--> Focus                    (auto_start_focus)
//! LongBreak  --complete--> Focus                    (auto_start_focus)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted) when a phase ends
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::driver::{ManualDriver, TickDriver};
use super::phase::PhaseKind;
use super::settings::{SettingsStore, TimerSettings};
use crate::events::Event;
use crate::notify::{NotificationSink, PhaseCompletion};

/// Read-only snapshot of the live countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: PhaseKind,
    /// Never exceeds the configured duration of `phase`.
    pub remaining_secs: u32,
    pub is_running: bool,
    /// Incremented only when a Focus phase completes.
    pub completed_focus_count: u32,
}

impl TimerState {
    fn initial(settings: &TimerSettings) -> Self {
        Self {
            phase: PhaseKind::Focus,
            remaining_secs: settings.duration_secs(PhaseKind::Focus),
            is_running: false,
            completed_focus_count: 0,
        }
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.remaining_secs)
    }
}

/// Render seconds as zero-padded `mm:ss`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Core timer engine.
///
/// Owns the countdown state, the active settings, the tick driver and the
/// registered completion sinks. One engine is one independent timeline.
pub struct TimerEngine {
    settings: SettingsStore,
    state: TimerState,
    driver: Box<dyn TickDriver>,
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl TimerEngine {
    /// Create a new engine driven manually by the caller.
    ///
    /// Starts paused in Focus with the full focus duration remaining.
    pub fn new(settings: TimerSettings) -> Self {
        Self::with_driver(settings, ManualDriver::new())
    }

    pub fn with_driver(settings: TimerSettings, driver: impl TickDriver + 'static) -> Self {
        let settings = SettingsStore::new(settings);
        let state = TimerState::initial(&settings.get());
        Self {
            settings,
            state,
            driver: Box::new(driver),
            sinks: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings.get()
    }

    pub fn phase(&self) -> PhaseKind {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn completed_focus_count(&self) -> u32 {
        self.state.completed_focus_count
    }

    pub fn driver_armed(&self) -> bool {
        self.driver.is_armed()
    }

    /// Full length of the current phase in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.settings.get().duration_secs(self.state.phase)
    }

    pub fn formatted_time(&self) -> String {
        self.state.formatted_time()
    }

    /// 0.0 .. 100.0 progress within the current phase.
    pub fn progress_percent(&self) -> f64 {
        let total = self.duration_secs();
        if total == 0 {
            return 0.0;
        }
        let pct = 100.0 * (1.0 - f64::from(self.state.remaining_secs) / f64::from(total));
        pct.clamp(0.0, 100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            is_running: self.state.is_running,
            completed_focus_count: self.state.completed_focus_count,
            formatted_time: self.formatted_time(),
            progress_pct: self.progress_percent(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Register a sink invoked once per completed phase.
    pub fn on_phase_complete(&mut self, sink: impl NotificationSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.set_running(true);
        tracing::debug!(phase = %self.state.phase, remaining = self.state.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.set_running(false);
        tracing::debug!(phase = %self.state.phase, remaining = self.state.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Start when paused, pause when running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.state.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Restart the current phase at its full duration, paused.
    pub fn reset(&mut self) -> Option<Event> {
        self.restart_phase();
        Some(Event::TimerReset {
            phase: self.state.phase,
            duration_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Switch to `phase` and restart it paused.
    pub fn select_phase(&mut self, phase: PhaseKind) -> Option<Event> {
        let from = self.state.phase;
        self.state.phase = phase;
        self.restart_phase();
        Some(Event::PhaseSelected {
            from,
            to: phase,
            duration_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Clamp and apply new settings, then restart the current phase.
    ///
    /// The completed focus count is preserved.
    pub fn replace_settings(&mut self, settings: TimerSettings) -> Option<Event> {
        let stored = self.settings.replace(settings);
        self.restart_phase();
        Some(Event::SettingsReplaced {
            settings: stored,
            at: Utc::now(),
        })
    }

    /// Call once per second. Returns `Some(Event::PhaseCompleted)` when a
    /// phase finishes. Ticks while paused are ignored.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        if self.state.remaining_secs > 1 {
            self.state.remaining_secs -= 1;
            return None;
        }
        Some(self.complete())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_running(&mut self, running: bool) {
        self.state.is_running = running;
        if running {
            self.driver.arm();
        } else {
            self.driver.disarm();
        }
    }

    fn restart_phase(&mut self) {
        self.set_running(false);
        self.state.remaining_secs = self.duration_secs();
    }

    fn complete(&mut self) -> Event {
        let settings = self.settings.get();
        let ended = self.state.phase;
        let next = match ended {
            PhaseKind::Focus => {
                self.state.completed_focus_count = self.state.completed_focus_count.saturating_add(1);
                if self.state.completed_focus_count % settings.long_break_interval == 0 {
                    PhaseKind::LongBreak
                } else {
                    PhaseKind::ShortBreak
                }
            }
            PhaseKind::ShortBreak | PhaseKind::LongBreak => PhaseKind::Focus,
        };
        let auto_started = settings.auto_starts_after(ended);

        self.state.phase = next;
        self.state.remaining_secs = settings.duration_secs(next);
        self.set_running(auto_started);

        let completion = PhaseCompletion {
            ended,
            next,
            completed_focus_count: self.state.completed_focus_count,
            auto_started,
        };
        self.notify_sinks(&completion);

        Event::PhaseCompleted {
            ended,
            next,
            completed_focus_count: completion.completed_focus_count,
            auto_started,
            at: Utc::now(),
        }
    }

    fn notify_sinks(&mut self, completion: &PhaseCompletion) {
        tracing::info!(ended = %completion.ended, next = %completion.next, "phase completed");
        for sink in &mut self.sinks {
            // A panicking sink must not unwind through a half-finished
            // transition; the state above is already committed.
            match panic::catch_unwind(AssertUnwindSafe(|| sink.notify(completion))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "notification sink failed"),
                Err(_) => tracing::warn!("notification sink panicked"),
            }
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("driver_armed", &self.driver.is_armed())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.driver.disarm();
    }
}
