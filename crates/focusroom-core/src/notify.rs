//! Phase-completion notification sinks.
//!
//! Sinks are best effort: the engine logs and swallows any error they
//! return, so a rejected sound or toast never disturbs the countdown.
//! A sink that panics is caught and logged the same way.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::timer::PhaseKind;

/// Payload handed to sinks on every completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCompletion {
    pub ended: PhaseKind,
    pub next: PhaseKind,
    pub completed_focus_count: u32,
    /// Whether `next` began counting down without user action.
    pub auto_started: bool,
}

/// Receives one call per completed phase, after the transition is applied.
///
/// Report failure by returning [`NotifyError`]; implementations should not
/// panic. The engine catches a panic and carries on, but the sink may be
/// left in whatever state it had reached.
pub trait NotificationSink: Send {
    fn notify(&mut self, completion: &PhaseCompletion) -> Result<(), NotifyError>;
}

impl<F> NotificationSink for F
where
    F: FnMut(&PhaseCompletion) -> Result<(), NotifyError> + Send,
{
    fn notify(&mut self, completion: &PhaseCompletion) -> Result<(), NotifyError> {
        self(completion)
    }
}

/// Rings the terminal bell and prints a one-line message.
pub struct TerminalBell<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalBell<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> NotificationSink for TerminalBell<W> {
    fn notify(&mut self, completion: &PhaseCompletion) -> Result<(), NotifyError> {
        writeln!(
            self.out,
            "\x07{} finished. {}",
            completion.ended,
            completion.next.prompt()
        )
        .and_then(|_| self.out.flush())
        .map_err(|e| NotifyError::Rejected(e.to_string()))
    }
}

/// Reports completions through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, completion: &PhaseCompletion) -> Result<(), NotifyError> {
        tracing::info!(
            ended = %completion.ended,
            next = %completion.next,
            completed = completion.completed_focus_count,
            auto_started = completion.auto_started,
            "phase complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion() -> PhaseCompletion {
        PhaseCompletion {
            ended: PhaseKind::Focus,
            next: PhaseKind::ShortBreak,
            completed_focus_count: 1,
            auto_started: true,
        }
    }

    #[test]
    fn terminal_bell_writes_bel_and_prompt() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.notify(&completion()).unwrap();
        let text = String::from_utf8(bell.into_inner()).unwrap();
        assert!(text.starts_with('\x07'));
        assert!(text.contains("Focus finished. Time for a break!"));
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |c: &PhaseCompletion| {
                seen.push(c.next);
                Ok::<(), NotifyError>(())
            };
            sink.notify(&completion()).unwrap();
        }
        assert_eq!(seen, vec![PhaseKind::ShortBreak]);
    }
}
