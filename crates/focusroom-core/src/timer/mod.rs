mod driver;
mod engine;
mod phase;
mod settings;

pub use driver::{ManualDriver, TickDriver};
pub use engine::{format_clock, TimerEngine, TimerState};
pub use phase::PhaseKind;
pub use settings::{
    SettingsStore, TimerSettings, FOCUS_MINUTES_RANGE, LONG_BREAK_INTERVAL_RANGE,
    LONG_BREAK_MINUTES_RANGE, SHORT_BREAK_MINUTES_RANGE,
};
