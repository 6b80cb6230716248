use clap::Args;
use focusroom_core::{
    Action, Config, Event, LogSink, PhaseKind, TerminalBell, TimerRuntime, TimerSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "commands: s start/pause, start, p pause, r reset, f focus, sb short break, lb long break, q quit";

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Phase to begin with (focus, short, long)
    #[arg(long)]
    phase: Option<PhaseKind>,
    /// Focus length in minutes (5-60)
    #[arg(long)]
    focus: Option<u32>,
    /// Short break length in minutes (1-15)
    #[arg(long)]
    short_break: Option<u32>,
    /// Long break length in minutes (5-30)
    #[arg(long)]
    long_break: Option<u32>,
    /// Focus phases between long breaks
    #[arg(long)]
    interval: Option<u32>,
    /// Do not start breaks automatically
    #[arg(long)]
    no_auto_breaks: bool,
    /// Do not start focus phases automatically after a break
    #[arg(long)]
    no_auto_focus: bool,
    /// Wait for a start command instead of starting immediately
    #[arg(long)]
    paused: bool,
    /// Do not ring the terminal bell
    #[arg(long)]
    quiet: bool,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    /// Overlay command-line overrides on the configured settings.
    fn settings(&self, base: TimerSettings) -> TimerSettings {
        TimerSettings {
            focus_minutes: self.focus.unwrap_or(base.focus_minutes),
            short_break_minutes: self.short_break.unwrap_or(base.short_break_minutes),
            long_break_minutes: self.long_break.unwrap_or(base.long_break_minutes),
            auto_start_breaks: base.auto_start_breaks && !self.no_auto_breaks,
            auto_start_focus: base.auto_start_focus && !self.no_auto_focus,
            long_break_interval: self.interval.unwrap_or(base.long_break_interval),
        }
        .clamped()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Input {
    Apply(Action),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim().to_ascii_lowercase().as_str() {
        "s" | "toggle" => Input::Apply(Action::Toggle),
        "start" => Input::Apply(Action::Start),
        "p" | "pause" => Input::Apply(Action::Pause),
        "r" | "reset" => Input::Apply(Action::Reset),
        "q" | "quit" | "exit" => Input::Quit,
        other => Input::Apply(Action::SelectPhase(other.parse().ok()?)),
    };
    Some(input)
}

fn status_line(phase: PhaseKind, clock: &str, progress_pct: f64, completed: u32, running: bool) -> String {
    let marker = if running { ">" } else { "||" };
    format!(
        "{marker} {:<11} {clock}  {:>3.0}%  completed {completed}",
        phase.label(),
        progress_pct
    )
}

fn render(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::StateSnapshot {
            phase,
            is_running,
            completed_focus_count,
            formatted_time,
            progress_pct,
            ..
        } => println!(
            "{}",
            status_line(*phase, formatted_time, *progress_pct, *completed_focus_count, *is_running)
        ),
        Event::PhaseCompleted { ended, next, auto_started, .. } => {
            let suffix = if *auto_started { "" } else { " (press s to start)" };
            println!("{ended} complete. {}{suffix}", next.prompt());
        }
        Event::SettingsReplaced { settings, .. } => {
            println!("settings updated: {}", serde_json::to_string(settings)?);
        }
        Event::TimerStarted { .. }
        | Event::TimerPaused { .. }
        | Event::TimerReset { .. }
        | Event::PhaseSelected { .. } => {}
    }
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(session(args));
    // A pending stdin read would otherwise hold the runtime open.
    rt.shutdown_background();
    result
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = args.settings(config.timer_settings());

    let mut runtime = TimerRuntime::new(settings).on_phase_complete(LogSink);
    if config.notifications.enabled && config.notifications.bell && !args.quiet {
        runtime = runtime.on_phase_complete(TerminalBell::stderr());
    }
    if let Some(phase) = args.phase {
        runtime.engine_mut().select_phase(phase);
    }

    let (handle, task) = runtime.spawn();
    let mut events = handle.subscribe();
    if !args.paused {
        handle.start().await?;
    }

    if !args.json {
        eprintln!("{HELP}");
        render(&handle.snapshot().await?, false)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Some(Input::Quit) => break,
                    Some(Input::Apply(action)) => {
                        handle.apply(action).await?;
                        if !args.json {
                            render(&handle.snapshot().await?, false)?;
                        }
                    }
                    None => eprintln!("unknown command: {}. {HELP}", line.trim()),
                }
            }
            event = events.recv() => match event {
                Ok(event) => render(&event, args.json)?,
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "render fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown().await?;
    task.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_line_commands() {
        assert_eq!(parse_input("s"), Some(Input::Apply(Action::Toggle)));
        assert_eq!(parse_input("start"), Some(Input::Apply(Action::Start)));
        assert_eq!(parse_input("toggle"), Some(Input::Apply(Action::Toggle)));
        assert_eq!(parse_input(" P "), Some(Input::Apply(Action::Pause)));
        assert_eq!(parse_input("r"), Some(Input::Apply(Action::Reset)));
        assert_eq!(
            parse_input("lb"),
            Some(Input::Apply(Action::SelectPhase(PhaseKind::LongBreak)))
        );
        assert_eq!(
            parse_input("short"),
            Some(Input::Apply(Action::SelectPhase(PhaseKind::ShortBreak)))
        );
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input("dance"), None);
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let args = RunArgs {
            focus: Some(50),
            no_auto_breaks: true,
            ..RunArgs::default()
        };
        let settings = args.settings(TimerSettings::default());
        assert_eq!(settings.focus_minutes, 50);
        assert_eq!(settings.short_break_minutes, 5);
        assert!(!settings.auto_start_breaks);
        assert!(settings.auto_start_focus);
    }

    #[test]
    fn overrides_are_clamped() {
        let args = RunArgs {
            focus: Some(500),
            interval: Some(0),
            ..RunArgs::default()
        };
        let settings = args.settings(TimerSettings::default());
        assert_eq!(settings.focus_minutes, 60);
        assert_eq!(settings.long_break_interval, 1);
    }

    #[test]
    fn status_line_shows_clock_and_count() {
        let line = status_line(PhaseKind::Focus, "12:30", 50.0, 3, true);
        assert_eq!(line, "> Focus       12:30   50%  completed 3");
        let paused = status_line(PhaseKind::ShortBreak, "05:00", 0.0, 0, false);
        assert!(paused.starts_with("|| Short Break"));
    }
}
