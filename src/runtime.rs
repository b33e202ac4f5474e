use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// One second of session time has passed
    Tick,
    /// Redraw opportunity for animations
    Frame,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm on a reader thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                // Windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event read failed");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed event source for headless tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Cadence of session ticks and animation frames
pub trait Ticker: Send + Sync + 'static {
    fn tick_interval(&self) -> Duration;
    fn frame_interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    tick: Duration,
    frame: Duration,
}

impl FixedTicker {
    pub fn new(tick: Duration, frame: Duration) -> Self {
        Self { tick, frame }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_millis(100))
    }
}

impl Ticker for FixedTicker {
    fn tick_interval(&self) -> Duration {
        self.tick
    }

    fn frame_interval(&self) -> Duration {
        self.frame
    }
}

/// Multiplexes input events with the tick and frame deadlines
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
    next_frame: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let now = Instant::now();
        Self {
            next_tick: now + ticker.tick_interval(),
            next_frame: now + ticker.frame_interval(),
            event_source,
            ticker,
        }
    }

    /// Drop the pending tick and start a full interval from now. Called
    /// whenever a new session replaces the old one so a tick scheduled for
    /// the previous session never lands on the new one.
    pub fn reset_ticks(&mut self) {
        self.next_tick = Instant::now() + self.ticker.tick_interval();
    }

    /// Block until the next input event or deadline, whichever comes first
    pub fn step(&mut self) -> AppEvent {
        let now = Instant::now();
        if let Some(due) = self.due(now) {
            return due;
        }

        let deadline = self.next_tick.min(self.next_frame);
        match self.event_source.recv_timeout(deadline - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.due(Instant::now()).unwrap_or(AppEvent::Frame),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                self.due(Instant::now()).unwrap_or(AppEvent::Frame)
            }
        }
    }

    /// Ticks win over frames; a missed deadline is rescheduled from `now`
    /// rather than replayed.
    fn due(&mut self, now: Instant) -> Option<AppEvent> {
        if now >= self.next_tick {
            self.next_tick += self.ticker.tick_interval();
            if self.next_tick <= now {
                self.next_tick = now + self.ticker.tick_interval();
            }
            return Some(AppEvent::Tick);
        }
        if now >= self.next_frame {
            self.next_frame = now + self.ticker.frame_interval();
            return Some(AppEvent::Frame);
        }
        None
    }
}
