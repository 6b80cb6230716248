//! Async driver for a [`TimerEngine`].
//!
//! A runtime task owns exactly one engine. Host commands arrive over an mpsc
//! channel and ticks come from a `tokio::time::Interval`; both are handled
//! one at a time, each to completion, so the engine is never mutated
//! concurrently and needs no lock.
//!
//! The interval only exists while the engine's driver is armed. It is
//! dropped the moment the engine leaves Running, so a tick scheduled for an
//! old phase can never reach the new one.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::error::Result;
use crate::events::Event;
use crate::notify::NotificationSink;
use crate::timer::{ManualDriver, PhaseKind, TickDriver, TimerEngine, TimerSettings, TimerState};

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 256;
const TICK_PERIOD: Duration = Duration::from_secs(1);
/// `tokio::time::interval_at` panics on a zero period.
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// A state-changing request for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Start,
    Pause,
    Toggle,
    Reset,
    SelectPhase(PhaseKind),
    ReplaceSettings(TimerSettings),
}

enum Command {
    Apply(Action, oneshot::Sender<Option<Event>>),
    State(oneshot::Sender<TimerState>),
    Settings(oneshot::Sender<TimerSettings>),
    Snapshot(oneshot::Sender<Event>),
    Shutdown,
}

/// Builder and owner of a timer task.
pub struct TimerRuntime {
    engine: TimerEngine,
    driver: ManualDriver,
    period: Duration,
}

impl TimerRuntime {
    pub fn new(settings: TimerSettings) -> Self {
        let driver = ManualDriver::new();
        Self {
            engine: TimerEngine::with_driver(settings, driver.clone()),
            driver,
            period: TICK_PERIOD,
        }
    }

    /// Override the tick period (one second by default). Periods shorter
    /// than one millisecond are raised to one millisecond.
    pub fn with_period(mut self, period: Duration) -> Self {
        if period < MIN_TICK_PERIOD {
            tracing::debug!(?period, "tick period too short, using minimum");
        }
        self.period = period.max(MIN_TICK_PERIOD);
        self
    }

    pub fn on_phase_complete(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.engine.on_phase_complete(sink);
        self
    }

    /// Direct access before spawning, e.g. to pick the starting phase.
    pub fn engine_mut(&mut self) -> &mut TimerEngine {
        &mut self.engine
    }

    /// Spawn the task on the current tokio runtime.
    ///
    /// The task ends when `shutdown` is called or every handle is dropped;
    /// the engine is dropped with it, which disarms its driver.
    pub fn spawn(self) -> (TimerHandle, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = TimerHandle {
            commands,
            events: events.clone(),
        };
        let task = tokio::spawn(self.run(rx, events));
        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>, events: broadcast::Sender<Event>) {
        let mut ticker: Option<Interval> = None;
        loop {
            self.sync_ticker(&mut ticker);
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(Command::Apply(action, reply)) => {
                        let event = self.apply(action);
                        if let Some(ref e) = event {
                            let _ = events.send(e.clone());
                        }
                        let _ = reply.send(event);
                    }
                    Some(Command::State(reply)) => {
                        let _ = reply.send(self.engine.state());
                    }
                    Some(Command::Settings(reply)) => {
                        let _ = reply.send(self.engine.settings());
                    }
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.engine.snapshot());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = next_tick(&mut ticker) => {
                    if let Some(completed) = self.engine.tick() {
                        let _ = events.send(completed);
                    }
                    let _ = events.send(self.engine.snapshot());
                }
            }
        }
        tracing::debug!("timer runtime stopped");
    }

    fn apply(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::Start => self.engine.start(),
            Action::Pause => self.engine.pause(),
            Action::Toggle => self.engine.toggle(),
            Action::Reset => self.engine.reset(),
            Action::SelectPhase(phase) => self.engine.select_phase(phase),
            Action::ReplaceSettings(settings) => self.engine.replace_settings(settings),
        }
    }

    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        match (self.driver.is_armed(), ticker.is_some()) {
            (true, false) => {
                let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
            }
            (false, true) => *ticker = None,
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Cloneable handle for controlling a spawned timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    pub async fn apply(&self, action: Action) -> Result<Option<Event>> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Apply(action, tx)).await?;
        Ok(rx.await?)
    }

    pub async fn start(&self) -> Result<Option<Event>> {
        self.apply(Action::Start).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.apply(Action::Pause).await
    }

    pub async fn toggle(&self) -> Result<Option<Event>> {
        self.apply(Action::Toggle).await
    }

    pub async fn reset(&self) -> Result<Option<Event>> {
        self.apply(Action::Reset).await
    }

    pub async fn select_phase(&self, phase: PhaseKind) -> Result<Option<Event>> {
        self.apply(Action::SelectPhase(phase)).await
    }

    pub async fn replace_settings(&self, settings: TimerSettings) -> Result<Option<Event>> {
        self.apply(Action::ReplaceSettings(settings)).await
    }

    pub async fn state(&self) -> Result<TimerState> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::State(tx)).await?;
        Ok(rx.await?)
    }

    pub async fn settings(&self) -> Result<TimerSettings> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Settings(tx)).await?;
        Ok(rx.await?)
    }

    /// Current state with derived clock and progress values.
    pub async fn snapshot(&self) -> Result<Event> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Snapshot(tx)).await?;
        Ok(rx.await?)
    }

    /// Receive every event the engine produces from now on, including a
    /// `StateSnapshot` after each tick.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.commands.send(Command::Shutdown).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Apply(action, _) => f.debug_tuple("Apply").field(action).finish(),
            Command::State(_) => f.write_str("State"),
            Command::Settings(_) => f.write_str("Settings"),
            Command::Snapshot(_) => f.write_str("Snapshot"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, NotifyError};
    use crate::notify::PhaseCompletion;
    use std::sync::{Arc, Mutex};

    fn short_settings() -> TimerSettings {
        TimerSettings {
            focus_minutes: 5,
            short_break_minutes: 1,
            ..TimerSettings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_while_running() {
        let (handle, _task) = TimerRuntime::new(short_settings()).spawn();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.state().await.unwrap().remaining_secs, 300);

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handle.state().await.unwrap().remaining_secs, 290);

        handle.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = handle.state().await.unwrap();
        assert_eq!(state.remaining_secs, 290);
        assert!(!state.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn completes_phase_and_notifies() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let (handle, _task) = TimerRuntime::new(short_settings())
            .on_phase_complete(move |c: &PhaseCompletion| -> Result<(), NotifyError> {
                sink_seen.lock().unwrap().push(*c);
                Ok(())
            })
            .spawn();

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300_500)).await;

        let state = handle.state().await.unwrap();
        assert_eq!(state.phase, PhaseKind::ShortBreak);
        assert_eq!(state.remaining_secs, 60);
        assert!(state.is_running);
        assert_eq!(state.completed_focus_count, 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].ended, PhaseKind::Focus);
        assert_eq!(seen[0].next, PhaseKind::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_completion_event() {
        let mut runtime = TimerRuntime::new(short_settings());
        runtime.engine_mut().select_phase(PhaseKind::ShortBreak);
        let (handle, _task) = runtime.spawn();
        let mut events = handle.subscribe();

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(60_500)).await;

        let mut completed = None;
        while let Ok(event) = events.try_recv() {
            if let Event::PhaseCompleted { ended, next, .. } = event {
                completed = Some((ended, next));
            }
        }
        assert_eq!(completed, Some((PhaseKind::ShortBreak, PhaseKind::Focus)));
    }

    #[tokio::test(start_paused = true)]
    async fn replace_settings_restarts_phase() {
        let (handle, _task) = TimerRuntime::new(TimerSettings::default()).spawn();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        handle
            .replace_settings(TimerSettings {
                focus_minutes: 30,
                ..TimerSettings::default()
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = handle.state().await.unwrap();
        assert_eq!(state.remaining_secs, 1800);
        assert!(!state.is_running);
        assert_eq!(handle.settings().await.unwrap().focus_minutes, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_fail_after_shutdown() {
        let (handle, task) = TimerRuntime::new(TimerSettings::default()).spawn();
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(matches!(handle.start().await, Err(CoreError::RuntimeClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_noop() {
        let (handle, _task) = TimerRuntime::new(TimerSettings::default()).spawn();
        assert!(handle.start().await.unwrap().is_some());
        assert!(handle.start().await.unwrap().is_none());
        assert!(handle.toggle().await.unwrap().is_some());
        assert!(!handle.state().await.unwrap().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_period_scales_ticks() {
        let (handle, _task) = TimerRuntime::new(TimerSettings::default())
            .with_period(Duration::from_millis(100))
            .spawn();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        assert_eq!(handle.state().await.unwrap().remaining_secs, 1490);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_raised_to_minimum() {
        let (handle, task) = TimerRuntime::new(TimerSettings::default())
            .with_period(Duration::ZERO)
            .spawn();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_micros(10_500)).await;

        let state = handle.state().await.unwrap();
        assert!(state.is_running);
        assert_eq!(state.remaining_secs, 1490);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_sink_keeps_runtime_alive() {
        let mut runtime = TimerRuntime::new(short_settings())
            .on_phase_complete(|_: &PhaseCompletion| -> Result<(), NotifyError> {
                panic!("sink blew up")
            });
        runtime.engine_mut().select_phase(PhaseKind::ShortBreak);
        let (handle, task) = runtime.spawn();

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(60_500)).await;

        let state = handle.state().await.unwrap();
        assert_eq!(state.phase, PhaseKind::Focus);
        assert_eq!(state.remaining_secs, 300);
        assert!(state.is_running);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reports_clock() {
        let (handle, _task) = TimerRuntime::new(TimerSettings::default()).spawn();
        handle.select_phase(PhaseKind::LongBreak).await.unwrap();
        match handle.snapshot().await.unwrap() {
            Event::StateSnapshot { phase, formatted_time, .. } => {
                assert_eq!(phase, PhaseKind::LongBreak);
                assert_eq!(formatted_time, "15:00");
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
