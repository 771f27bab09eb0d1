use super::*;
use chrono::{Duration as SpanDuration, TimeZone};
use shared::domain::{DiskId, MoveIndex, PegIndex};
use tokio::time::{timeout, Instant};

/// Wall clock that advances with tokio's (paused) test clock.
struct PausedClock {
    base: DateTime<Utc>,
    origin: Instant,
}

impl PausedClock {
    fn starting_at(base: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            base,
            origin: Instant::now(),
        })
    }
}

impl Clock for PausedClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + SpanDuration::from_std(self.origin.elapsed()).expect("elapsed in range")
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_577_836_800 + secs, 0)
        .single()
        .expect("valid timestamp")
}

async fn next_event(events: &mut broadcast::Receiver<PuzzleEvent>) -> PuzzleEvent {
    timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("event before timeout")
        .expect("channel open")
}

async fn assert_quiet(events: &mut broadcast::Receiver<PuzzleEvent>, window: Duration) {
    if let Ok(event) = timeout(window, events.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn reset_initializes_board_and_schedules_first_move() {
    let scheduler = CountdownScheduler::new(PausedClock::starting_at(at(0)));
    let mut events = scheduler.subscribe_events();

    let snapshot = scheduler.reset(at(0), at(1200)).await.expect("reset");
    assert_eq!(snapshot.config.disk_count, 11);
    assert_eq!(snapshot.config.total_moves, 2047);
    assert_eq!(snapshot.move_index, MoveIndex(0));
    assert_eq!(snapshot.pegs[0].len(), 11);
    assert!(scheduler.is_armed().await);

    assert_eq!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(snapshot)
    );

    let armed_at = Instant::now();
    assert_eq!(
        next_event(&mut events).await,
        PuzzleEvent::MoveApplied {
            from: PegIndex(0),
            to: PegIndex(2),
            disk: DiskId(1),
            move_index: MoveIndex(1),
        }
    );
    let waited = armed_at.elapsed();
    assert!(waited >= Duration::from_millis(586), "waited {waited:?}");
    assert!(waited < Duration::from_millis(600), "waited {waited:?}");

    match next_event(&mut events).await {
        PuzzleEvent::MoveApplied { move_index, .. } => assert_eq!(move_index, MoveIndex(2)),
        other => panic!("expected second move, got {other:?}"),
    }
    let board = scheduler.snapshot().await.expect("board");
    assert_eq!(board.move_index, MoveIndex(2));
}

#[tokio::test(start_paused = true)]
async fn reset_at_deadline_completes_immediately() {
    let scheduler = CountdownScheduler::new(PausedClock::starting_at(at(1200)));
    let mut events = scheduler.subscribe_events();

    let snapshot = scheduler.reset(at(0), at(1200)).await.expect("reset");
    assert!(snapshot.is_solved());
    assert_eq!(snapshot.pegs[2].len(), 11);
    assert!(snapshot.pegs[0].is_empty() && snapshot.pegs[1].is_empty());

    assert!(matches!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(_)
    ));
    let before = Instant::now();
    assert_eq!(next_event(&mut events).await, PuzzleEvent::Completed);
    assert!(before.elapsed() < Duration::from_millis(5));

    assert_quiet(&mut events, Duration::from_secs(10)).await;
    assert!(!scheduler.is_armed().await);
}

#[tokio::test(start_paused = true)]
async fn mid_run_reset_cancels_the_stale_timer() {
    let now = at(0);
    let scheduler = CountdownScheduler::new(PausedClock::starting_at(now));
    let mut events = scheduler.subscribe_events();

    // Three disks, six moves already made, last move due in 500ms.
    let first = scheduler
        .reset(
            now - SpanDuration::milliseconds(2500),
            now + SpanDuration::milliseconds(500),
        )
        .await
        .expect("first reset");
    assert_eq!(first.config.disk_count, 3);
    assert_eq!(first.move_index, MoveIndex(6));

    let second = scheduler.reset(now, at(1200)).await.expect("second reset");
    assert_eq!(second.config.disk_count, 11);

    assert_eq!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(first)
    );
    assert_eq!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(second)
    );

    for expected in 1..=3 {
        match next_event(&mut events).await {
            PuzzleEvent::MoveApplied { move_index, .. } => {
                assert_eq!(move_index, MoveIndex(expected));
            }
            other => panic!("stale or unexpected event {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn invalid_reset_leaves_current_run_running() {
    let scheduler = CountdownScheduler::new(PausedClock::starting_at(at(0)));
    let mut events = scheduler.subscribe_events();
    scheduler.reset(at(0), at(1200)).await.expect("reset");

    let err = scheduler
        .reset(at(1200), at(0))
        .await
        .expect_err("end before start");
    assert!(matches!(err, HanoiError::InvalidConfiguration { .. }));

    assert!(matches!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(_)
    ));
    assert!(matches!(
        next_event(&mut events).await,
        PuzzleEvent::MoveApplied { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_further_moves() {
    let scheduler = CountdownScheduler::new(PausedClock::starting_at(at(0)));
    let mut events = scheduler.subscribe_events();
    scheduler.reset(at(0), at(1200)).await.expect("reset");
    assert!(matches!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(_)
    ));

    scheduler.cancel().await;
    assert!(!scheduler.is_armed().await);
    assert_quiet(&mut events, Duration::from_secs(10)).await;

    let board = scheduler.snapshot().await.expect("board kept");
    assert_eq!(board.move_index, MoveIndex(0));
}

#[tokio::test(start_paused = true)]
async fn short_countdown_runs_to_completion() {
    let scheduler = CountdownScheduler::new(PausedClock::starting_at(at(0)));
    let mut events = scheduler.subscribe_events();
    scheduler.reset(at(0), at(7)).await.expect("reset");
    assert!(matches!(
        next_event(&mut events).await,
        PuzzleEvent::BoardInitialized(_)
    ));

    let started = Instant::now();
    let mut moves = 0;
    loop {
        match next_event(&mut events).await {
            PuzzleEvent::MoveApplied { .. } => moves += 1,
            PuzzleEvent::Completed => break,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(moves, 7);
    // The last move lands on the deadline; completion follows after the floor delay.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(8), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(8050), "elapsed {elapsed:?}");

    let board = scheduler.snapshot().await.expect("board");
    assert!(board.is_solved());
}
