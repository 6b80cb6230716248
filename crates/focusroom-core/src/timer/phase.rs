use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One timed interval of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl PhaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            PhaseKind::Focus => "Focus",
            PhaseKind::ShortBreak => "Short Break",
            PhaseKind::LongBreak => "Long Break",
        }
    }

    /// Short message shown while the phase is active.
    pub fn prompt(&self) -> &'static str {
        match self {
            PhaseKind::Focus => "Time to focus!",
            PhaseKind::ShortBreak | PhaseKind::LongBreak => "Time for a break!",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, PhaseKind::Focus)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PhaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" | "f" => Ok(PhaseKind::Focus),
            "short" | "short_break" | "short-break" | "sb" => Ok(PhaseKind::ShortBreak),
            "long" | "long_break" | "long-break" | "lb" => Ok(PhaseKind::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}
