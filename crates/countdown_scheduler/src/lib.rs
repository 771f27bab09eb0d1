//! Drives a countdown run on a self-rescheduling tokio timer and broadcasts
//! the resulting board events to rendering collaborators.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::{domain::BoardSnapshot, error::HanoiError, protocol::PuzzleEvent};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

mod clock;
mod run;

pub use clock::{Clock, SystemClock};
pub use run::{CountdownRun, TickOutcome};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub struct CountdownScheduler {
    clock: Arc<dyn Clock>,
    inner: Mutex<SchedulerState>,
    events: broadcast::Sender<PuzzleEvent>,
}

#[derive(Default)]
struct SchedulerState {
    run: Option<CountdownRun>,
    /// Bumped on every reset and cancel; a timer task only acts while its
    /// generation is current.
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl SchedulerState {
    fn disarm(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl CountdownScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            clock,
            inner: Mutex::new(SchedulerState::default()),
            events,
        })
    }

    pub fn with_system_clock() -> Arc<Self> {
        Self::new(Arc::new(SystemClock))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PuzzleEvent> {
        self.events.subscribe()
    }

    /// Starts a new run for `start..end`, replacing and disarming any current
    /// one. An invalid span is rejected before the current run is touched.
    pub async fn reset(
        self: &Arc<Self>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BoardSnapshot, HanoiError> {
        let now = self.clock.now();
        let run = CountdownRun::start(start, end, now)?;
        let first_delay = if run.span().is_finished_at(now) {
            Duration::ZERO
        } else {
            run.next_delay(now).as_duration()
        };
        let snapshot = run.snapshot();

        let mut state = self.inner.lock().await;
        state.disarm();
        info!(
            disk_count = run.config().disk_count,
            total_moves = run.config().total_moves,
            move_index = %run.move_index(),
            first_delay_ms = first_delay.as_millis() as u64,
            "countdown reset"
        );
        state.run = Some(run);
        let _ = self
            .events
            .send(PuzzleEvent::BoardInitialized(snapshot.clone()));
        state.timer = Some(self.arm(state.generation, first_delay));

        Ok(snapshot)
    }

    /// Disarms the pending tick and keeps the board as it is.
    pub async fn cancel(&self) {
        let mut state = self.inner.lock().await;
        if state.timer.is_some() {
            debug!("countdown timer cancelled");
        }
        state.disarm();
    }

    pub async fn snapshot(&self) -> Option<BoardSnapshot> {
        let state = self.inner.lock().await;
        state.run.as_ref().map(CountdownRun::snapshot)
    }

    pub async fn is_armed(&self) -> bool {
        let state = self.inner.lock().await;
        state
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn arm(self: &Arc<Self>, generation: u64, first_delay: Duration) -> JoinHandle<()> {
        let scheduler = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::time::sleep(delay).await;
                match Self::tick(&scheduler, generation).await {
                    Some(next) => delay = next,
                    None => break,
                }
            }
        })
    }

    /// Applies one move and returns the delay before the next one, or `None`
    /// when the timer should stop.
    async fn tick(scheduler: &Weak<Self>, generation: u64) -> Option<Duration> {
        let scheduler = scheduler.upgrade()?;
        let mut state = scheduler.inner.lock().await;
        if state.generation != generation {
            return None;
        }
        let now = scheduler.clock.now();
        let run = state.run.as_mut()?;

        match run.tick(now) {
            Ok(TickOutcome::Moved {
                mv,
                disk,
                next_delay,
            }) => {
                debug!(
                    move_index = %mv.index,
                    from = %mv.from,
                    to = %mv.to,
                    %disk,
                    next_delay_ms = next_delay.millis,
                    "move applied"
                );
                if next_delay.floored {
                    warn!(
                        move_index = %mv.index,
                        "no time left for the remaining moves; using one second floor"
                    );
                }
                let _ = scheduler.events.send(PuzzleEvent::MoveApplied {
                    from: mv.from,
                    to: mv.to,
                    disk,
                    move_index: mv.index,
                });
                Some(next_delay.as_duration())
            }
            Ok(TickOutcome::Completed) => {
                info!(move_index = %run.move_index(), "countdown completed");
                let _ = scheduler.events.send(PuzzleEvent::Completed);
                None
            }
            Err(err) => {
                error!(%err, fatal = err.is_fatal(), "countdown halted; reset required");
                None
            }
        }
    }
}

impl Drop for CountdownScheduler {
    fn drop(&mut self) {
        self.inner.get_mut().disarm();
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
