use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use velo::corpus::Corpus;
use velo::history::DEFAULT_HISTORY_LIMIT;
use velo::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use velo::store::MemoryStore;
use velo::{SessionConfig, SessionEvent, SessionStatus, TimerMode, TypingEngine};

fn engine(passage: &str, config: SessionConfig) -> TypingEngine<MemoryStore> {
    let corpus = Corpus::from_passages([(config.category, config.difficulty, passage)]);
    TypingEngine::with_rng(
        corpus,
        MemoryStore::new(),
        config,
        DEFAULT_HISTORY_LIMIT,
        StdRng::seed_from_u64(3),
    )
}

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Drives the engine through the runner without a terminal
#[test]
fn headless_typing_flow_completes() {
    let mut engine = engine("hi", SessionConfig::default());

    let (tx, rx) = mpsc::channel();
    let ticker = FixedTicker::new(Duration::from_millis(5), Duration::from_millis(50));
    let mut runner = Runner::new(TestEventSource::new(rx), ticker);
    tx.send(key('h')).unwrap();
    tx.send(key('i')).unwrap();

    for _ in 0..100u32 {
        match runner.step() {
            AppEvent::Tick if engine.session().has_started() => engine.tick(),
            AppEvent::Key(KeyEvent {
                code: KeyCode::Char(c),
                ..
            }) => engine.type_char(c),
            _ => {}
        }
        if engine.status() == SessionStatus::Completed {
            break;
        }
    }

    assert_eq!(engine.status(), SessionStatus::Completed);
    let finished = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Finished { .. }))
        .count();
    assert_eq!(finished, 1);
}

#[test]
fn headless_timed_session_finishes_by_ticks() {
    let config = SessionConfig {
        mode: TimerMode::Timed,
        duration_secs: 15,
        ..SessionConfig::default()
    };
    let mut engine = engine("nobody types this whole thing", config);
    engine.type_char('n');

    let (_tx, rx) = mpsc::channel();
    let ticker = FixedTicker::new(Duration::from_millis(2), Duration::from_secs(60));
    let mut runner = Runner::new(TestEventSource::new(rx), ticker);

    let started = Instant::now();
    while engine.status() != SessionStatus::Completed && started.elapsed() < Duration::from_secs(5) {
        if let AppEvent::Tick = runner.step() {
            engine.tick();
        }
    }

    assert_eq!(engine.status(), SessionStatus::Completed);
    assert_eq!(engine.session().timer(), 0);
    assert_eq!(engine.session().samples().len(), 15);
}

#[test]
fn restarting_resets_the_tick_schedule() {
    let mut engine = engine("abc", SessionConfig::default());
    let (_tx, rx) = mpsc::channel();
    let ticker = FixedTicker::new(Duration::from_millis(40), Duration::from_millis(1));
    let mut runner = Runner::new(TestEventSource::new(rx), ticker);

    engine.type_char('a');
    std::thread::sleep(Duration::from_millis(50));
    engine.restart();
    runner.reset_ticks();

    // the tick that was due for the old session never arrives
    assert!(matches!(runner.step(), AppEvent::Frame));
    assert_eq!(engine.session().timer(), 60);
    assert_eq!(engine.status(), SessionStatus::Idle);
}

#[test]
fn first_tick_lands_a_full_interval_after_the_first_keystroke() {
    let mut engine = engine("hello there", SessionConfig::default());
    let (_tx, rx) = mpsc::channel();
    let interval = Duration::from_millis(200);
    let ticker = FixedTicker::new(interval, Duration::from_secs(60));
    let mut runner = Runner::new(TestEventSource::new(rx), ticker);

    // idle for most of an interval before typing
    std::thread::sleep(Duration::from_millis(190));
    engine.type_char('h');
    assert_eq!(engine.status(), SessionStatus::Running);
    runner.reset_ticks();
    let typed_at = Instant::now();

    assert!(matches!(runner.step(), AppEvent::Tick));
    assert!(typed_at.elapsed() >= Duration::from_millis(150));
    engine.tick();
    assert_eq!(engine.session().timer(), 59);
}
