//! User-configurable phase durations and auto-continuation rules.
//!
//! Settings come from bounded inputs (sliders, config files, CLI flags), so
//! out-of-range values are clamped to the nearest bound instead of rejected.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::phase::PhaseKind;

pub const FOCUS_MINUTES_RANGE: RangeInclusive<u32> = 5..=60;
pub const SHORT_BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=15;
pub const LONG_BREAK_MINUTES_RANGE: RangeInclusive<u32> = 5..=30;
/// Only the lower bound matters; a zero interval would divide by zero.
pub const LONG_BREAK_INTERVAL_RANGE: RangeInclusive<u32> = 1..=u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default = "default_true")]
    pub auto_start_focus: bool,
    /// Completed focus phases between long breaks.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            auto_start_breaks: true,
            auto_start_focus: true,
            long_break_interval: default_long_break_interval(),
        }
    }
}

impl TimerSettings {
    /// Copy of these settings with every numeric field clamped into range.
    pub fn clamped(&self) -> Self {
        Self {
            focus_minutes: clamp_field("focus_minutes", self.focus_minutes, &FOCUS_MINUTES_RANGE),
            short_break_minutes: clamp_field(
                "short_break_minutes",
                self.short_break_minutes,
                &SHORT_BREAK_MINUTES_RANGE,
            ),
            long_break_minutes: clamp_field(
                "long_break_minutes",
                self.long_break_minutes,
                &LONG_BREAK_MINUTES_RANGE,
            ),
            auto_start_breaks: self.auto_start_breaks,
            auto_start_focus: self.auto_start_focus,
            long_break_interval: clamp_field(
                "long_break_interval",
                self.long_break_interval,
                &LONG_BREAK_INTERVAL_RANGE,
            ),
        }
    }

    pub fn duration_minutes(&self, phase: PhaseKind) -> u32 {
        match phase {
            PhaseKind::Focus => self.focus_minutes,
            PhaseKind::ShortBreak => self.short_break_minutes,
            PhaseKind::LongBreak => self.long_break_minutes,
        }
    }

    /// Full length of `phase` in seconds.
    pub fn duration_secs(&self, phase: PhaseKind) -> u32 {
        self.duration_minutes(phase).saturating_mul(60)
    }

    /// Whether the phase following `ended` starts counting down on its own.
    pub fn auto_starts_after(&self, ended: PhaseKind) -> bool {
        match ended {
            PhaseKind::Focus => self.auto_start_breaks,
            PhaseKind::ShortBreak | PhaseKind::LongBreak => self.auto_start_focus,
        }
    }
}

fn clamp_field(name: &str, value: u32, range: &RangeInclusive<u32>) -> u32 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        tracing::debug!(field = name, value, clamped, "setting out of range, clamped");
    }
    clamped
}

/// Holds the active [`TimerSettings`].
///
/// Replacement is wholesale; there is no per-field mutation.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    current: TimerSettings,
}

impl SettingsStore {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            current: settings.clamped(),
        }
    }

    pub fn get(&self) -> TimerSettings {
        self.current
    }

    /// Clamp and store `settings`, returning the value actually stored.
    pub fn replace(&mut self, settings: TimerSettings) -> TimerSettings {
        self.current = settings.clamped();
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = TimerSettings::default();
        assert_eq!(s.focus_minutes, 25);
        assert_eq!(s.short_break_minutes, 5);
        assert_eq!(s.long_break_minutes, 15);
        assert_eq!(s.long_break_interval, 4);
        assert!(s.auto_start_breaks);
        assert!(s.auto_start_focus);
    }

    #[test]
    fn replace_clamps_to_nearest_bound() {
        let mut store = SettingsStore::default();
        let stored = store.replace(TimerSettings {
            focus_minutes: 90,
            short_break_minutes: 0,
            long_break_minutes: 2,
            long_break_interval: 0,
            ..TimerSettings::default()
        });
        assert_eq!(stored.focus_minutes, 60);
        assert_eq!(stored.short_break_minutes, 1);
        assert_eq!(stored.long_break_minutes, 5);
        assert_eq!(stored.long_break_interval, 1);
        assert_eq!(store.get(), stored);
    }

    #[test]
    fn long_break_interval_has_no_upper_bound() {
        let s = TimerSettings {
            long_break_interval: 16,
            ..TimerSettings::default()
        };
        assert_eq!(s.clamped().long_break_interval, 16);
        let huge = TimerSettings {
            long_break_interval: u32::MAX,
            ..TimerSettings::default()
        };
        assert_eq!(huge.clamped().long_break_interval, u32::MAX);
    }

    #[test]
    fn in_range_values_pass_through() {
        let s = TimerSettings {
            focus_minutes: 30,
            short_break_minutes: 10,
            long_break_minutes: 20,
            auto_start_breaks: false,
            auto_start_focus: false,
            long_break_interval: 3,
        };
        assert_eq!(s.clamped(), s);
    }

    #[test]
    fn duration_secs_per_phase() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(PhaseKind::Focus), 1500);
        assert_eq!(s.duration_secs(PhaseKind::ShortBreak), 300);
        assert_eq!(s.duration_secs(PhaseKind::LongBreak), 900);
    }

    #[test]
    fn auto_start_rules() {
        let s = TimerSettings {
            auto_start_breaks: false,
            ..TimerSettings::default()
        };
        assert!(!s.auto_starts_after(PhaseKind::Focus));
        assert!(s.auto_starts_after(PhaseKind::ShortBreak));
        assert!(s.auto_starts_after(PhaseKind::LongBreak));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let s: TimerSettings = toml::from_str("focus_minutes = 50").unwrap();
        assert_eq!(s.focus_minutes, 50);
        assert_eq!(s.short_break_minutes, 5);
        assert!(s.auto_start_focus);
    }
}
