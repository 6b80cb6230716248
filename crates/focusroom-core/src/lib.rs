//! # Focusroom Core Library
//!
//! This library provides the session timer behind Focusroom: a cyclical
//! countdown that moves between focus and break phases, counts completed
//! focus phases, and applies the user's auto-continuation rules. The CLI is
//! a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-driven state machine; the caller (or the async
//!   runtime) invokes `tick()` once per second while it is running
//! - **Runtime**: A tokio task that owns one engine and arms a 1-second
//!   interval only while the engine runs
//! - **Notifications**: Best-effort sinks invoked on each phase completion
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerRuntime`]: Async driver for an engine
//! - [`Config`]: Application configuration management
//! - [`NotificationSink`]: Trait for completion notifications

pub mod error;
pub mod events;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError};
pub use events::Event;
pub use notify::{LogSink, NotificationSink, PhaseCompletion, TerminalBell};
pub use runtime::{Action, TimerHandle, TimerRuntime};
pub use storage::Config;
pub use timer::{PhaseKind, SettingsStore, TickDriver, TimerEngine, TimerSettings, TimerState};
