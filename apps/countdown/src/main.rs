use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use countdown_scheduler::CountdownScheduler;
use shared::protocol::PuzzleEvent;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, parse_timestamp, OutputFormat, Settings};
use render::Renderer;

/// Counts down to a deadline as a Towers of Hanoi puzzle that is solved
/// exactly when the deadline arrives.
#[derive(Parser, Debug)]
#[command(name = "hanoi-countdown")]
struct Args {
    /// Config file; defaults to ./countdown.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Countdown start, RFC 3339.
    #[arg(long)]
    start: Option<String>,
    /// Countdown deadline, RFC 3339.
    #[arg(long)]
    end: Option<String>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// tracing filter directive, e.g. `debug` or `countdown_scheduler=debug`.
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(v) = &self.start {
            settings.start = parse_timestamp(v).context("--start")?;
        }
        if let Some(v) = &self.end {
            settings.end = parse_timestamp(v).context("--end")?;
        }
        if let Some(v) = self.format {
            settings.format = v;
        }
        if let Some(v) = &self.log {
            settings.log_filter = v.clone();
        }
        Ok(())
    }
}

/// Lines accepted on stdin while the countdown runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Reset {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Cancel,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "reset" => {
            let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(anyhow!("usage: reset <start> <end>"));
            };
            Command::Reset {
                start: parse_timestamp(start)?,
                end: parse_timestamp(end)?,
            }
        }
        "cancel" => Command::Cancel,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings)?;

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let scheduler = CountdownScheduler::with_system_clock();
    let mut events = scheduler.subscribe_events();
    scheduler
        .reset(settings.start, settings.end)
        .await
        .context("failed to start countdown")?;
    info!(start = %settings.start, end = %settings.end, "countdown started");

    run(&scheduler, &mut events, Renderer::new(settings.format)).await
}

async fn run(
    scheduler: &Arc<CountdownScheduler>,
    events: &mut tokio::sync::broadcast::Receiver<PuzzleEvent>,
    mut renderer: Renderer,
) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stdout = io::stdout().lock();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    debug!(event = event.name(), "rendering");
                    if let Some(output) = renderer.render(&event)? {
                        writeln!(stdout, "{output}")?;
                        stdout.flush()?;
                    }
                    if event == PuzzleEvent::Completed {
                        return Ok(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind; redrawing current board");
                    if let Some(snapshot) = scheduler.snapshot().await {
                        let redraw = PuzzleEvent::BoardInitialized(snapshot);
                        if let Some(output) = renderer.render(&redraw)? {
                            writeln!(stdout, "{output}")?;
                            stdout.flush()?;
                        }
                    }
                }
                Err(RecvError::Closed) => return Ok(()),
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Ok(Some(Command::Reset { start, end })) => {
                        if let Err(err) = scheduler.reset(start, end).await {
                            warn!(%err, code = ?err.code(), "reset rejected");
                        }
                    }
                    Ok(Some(Command::Cancel)) => scheduler.cancel().await,
                    Ok(Some(Command::Quit)) => {
                        scheduler.cancel().await;
                        return Ok(());
                    }
                    Ok(None) => {}
                    Err(err) => warn!(%err, "ignoring input"),
                },
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!(%err, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                scheduler.cancel().await;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
