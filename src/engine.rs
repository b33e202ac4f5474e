//! The typing-session engine.
//!
//! [`TypingEngine`] owns the active [`Session`], the passage corpus and the
//! injected score store. Front ends feed it input values and one-second
//! ticks, then drain [`SessionEvent`]s for everything presentation-related
//! (focus, per-keystroke feedback, completion banners).

use crate::corpus::Corpus;
use crate::history::{ModeDescriptor, Scoreboard, SessionOutcome, SessionRecord};
use crate::session::{Outcome, Session, SessionConfig, SessionStatus};
use crate::stats::Stats;
use crate::store::KeyValueStore;
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new session is ready; the input surface should take focus
    FocusRequested,
    /// One appended character was graded
    Keystroke(Outcome),
    Finished {
        record: SessionRecord,
        outcome: SessionOutcome,
    },
}

pub struct TypingEngine<S: KeyValueStore> {
    corpus: Corpus,
    store: S,
    scoreboard: Scoreboard,
    rng: StdRng,
    session: Session,
    events: Vec<SessionEvent>,
}

impl<S: KeyValueStore> TypingEngine<S> {
    pub fn new(corpus: Corpus, store: S, config: SessionConfig, history_limit: usize) -> Self {
        Self::with_rng(corpus, store, config, history_limit, StdRng::from_entropy())
    }

    /// Like [`TypingEngine::new`] with a caller-provided rng, for reproducible passage picks
    pub fn with_rng(
        corpus: Corpus,
        store: S,
        config: SessionConfig,
        history_limit: usize,
        rng: StdRng,
    ) -> Self {
        let scoreboard = Scoreboard::load(&store, history_limit);
        tracing::debug!(
            best_wpm = ?scoreboard.best_wpm(),
            history = scoreboard.history().len(),
            "scores loaded"
        );

        let mut engine = Self {
            corpus,
            store,
            scoreboard,
            rng,
            session: Session::new(config, ""),
            events: Vec::new(),
        };
        engine.initialize(config);
        engine
    }

    /// Replace the current session with a fresh one. Any in-progress input
    /// is discarded.
    pub fn initialize(&mut self, config: SessionConfig) {
        let config = config.sanitized();
        let passage = self
            .corpus
            .choose(config.category, config.difficulty, &mut self.rng);

        tracing::info!(
            difficulty = %config.difficulty,
            category = %config.category,
            mode = %config.mode,
            duration = config.duration_secs,
            chars = passage.chars().count(),
            "session initialized"
        );

        self.session = Session::new(config, &passage);
        self.events.clear();
        self.events.push(SessionEvent::FocusRequested);
    }

    /// New passage, same settings
    pub fn restart(&mut self) {
        self.initialize(*self.session.config());
    }

    /// Start a session on a specific passage, bypassing the corpus
    pub fn initialize_with_passage(&mut self, config: SessionConfig, passage: &str) {
        self.session = Session::new(config, passage);
        self.events.clear();
        self.events.push(SessionEvent::FocusRequested);
    }

    pub fn apply_keystroke(&mut self, value: &str) {
        let Some(effect) = self.session.apply_input(value.chars().collect()) else {
            return;
        };

        self.events
            .extend(effect.outcomes.into_iter().map(SessionEvent::Keystroke));

        if effect.completed {
            self.finalize_result();
        }
    }

    pub fn type_char(&mut self, c: char) {
        let mut value = self.session.input_text();
        value.push(c);
        self.apply_keystroke(&value);
    }

    pub fn backspace(&mut self) {
        let input = self.session.input();
        if input.is_empty() {
            return;
        }
        let value: String = input[..input.len() - 1].iter().collect();
        self.apply_keystroke(&value);
    }

    /// Advance the session clock by one second. The scheduler is expected to
    /// call this only while the session runs; ticks after completion are
    /// ignored.
    pub fn tick(&mut self) {
        if self.session.advance_clock() {
            self.finalize_result();
        }
    }

    pub fn stats(&self) -> Stats {
        self.session.stats()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.scoreboard.set_limit(limit);
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn finalize_result(&mut self) {
        let stats = self.session.stats();
        let record = SessionRecord {
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            mistakes: self.session.mistakes(),
            best_streak: self.session.best_streak(),
            seconds_elapsed: stats.seconds_elapsed,
            timestamp: Local::now(),
            mode: ModeDescriptor::from(self.session.config()),
        };

        let outcome = self.scoreboard.record(&mut self.store, record.clone());
        tracing::info!(
            wpm = record.wpm,
            accuracy = record.accuracy,
            mistakes = record.mistakes,
            ?outcome,
            "session completed"
        );

        self.events.push(SessionEvent::Finished { record, outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Category, Difficulty};
    use crate::history::{BEST_WPM_KEY, DEFAULT_HISTORY_LIMIT};
    use crate::session::TimerMode;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn engine_for(passage: &str, config: SessionConfig) -> TypingEngine<MemoryStore> {
        let corpus = Corpus::from_passages([(config.category, config.difficulty, passage)]);
        TypingEngine::with_rng(
            corpus,
            MemoryStore::new(),
            config,
            DEFAULT_HISTORY_LIMIT,
            StdRng::seed_from_u64(0),
        )
    }

    fn finished(events: &[SessionEvent]) -> Vec<(u32, SessionOutcome)> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Finished { record, outcome } => Some((record.wpm, *outcome)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn initialize_requests_focus() {
        let mut engine = engine_for("hello", SessionConfig::default());
        assert_eq!(engine.drain_events(), vec![SessionEvent::FocusRequested]);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn initialize_picks_from_matching_slice() {
        let config = SessionConfig {
            category: Category::Code,
            difficulty: Difficulty::Hard,
            ..SessionConfig::default()
        };
        let engine = engine_for("fn main() {}", config);
        assert_eq!(engine.session().passage_text(), "fn main() {}");
    }

    #[test]
    fn keystrokes_emit_correctness() {
        let mut engine = engine_for("hey", SessionConfig::default());
        engine.drain_events();

        engine.type_char('h');
        engine.type_char('x');
        assert_eq!(
            engine.drain_events(),
            vec![
                SessionEvent::Keystroke(Outcome::Correct),
                SessionEvent::Keystroke(Outcome::Incorrect)
            ]
        );
    }

    #[test]
    fn backspace_removes_last_char_without_scoring() {
        let mut engine = engine_for("hey", SessionConfig::default());
        engine.type_char('x');
        engine.backspace();

        assert!(engine.session().input().is_empty());
        assert_eq!(engine.session().mistakes(), 1);
        assert_eq!(engine.status(), SessionStatus::Running);
    }

    #[test]
    fn backspace_on_idle_session_does_not_start_it() {
        let mut engine = engine_for("hey", SessionConfig::default());
        engine.backspace();
        assert_eq!(engine.status(), SessionStatus::Idle);
    }

    #[test]
    fn completion_finalizes_once_and_ignores_further_input() {
        let mut engine = engine_for("hi", SessionConfig::default());
        engine.type_char('h');
        engine.tick();
        engine.type_char('i');
        engine.type_char('!');
        engine.tick();

        let events = engine.drain_events();
        assert_eq!(finished(&events).len(), 1);
        assert_eq!(engine.session().input_text(), "hi");
        assert_eq!(engine.status(), SessionStatus::Completed);
    }

    #[test]
    fn first_result_is_persisted_as_best() {
        let mut engine = engine_for("hi", SessionConfig::default());
        engine.type_char('h');
        engine.tick();
        engine.type_char('i');

        // (2 / 5) / (1 / 60) = 24
        assert_eq!(finished(&engine.drain_events()), vec![(24, SessionOutcome::Baseline)]);
        assert_eq!(engine.store().get(BEST_WPM_KEY).unwrap().as_deref(), Some("24"));
        assert_eq!(engine.scoreboard().history().len(), 1);
    }

    #[test]
    fn restart_draws_new_session_with_same_config() {
        let config = SessionConfig {
            mode: TimerMode::Passage,
            ..SessionConfig::default()
        };
        let mut engine = engine_for("abc", config);
        engine.type_char('a');
        engine.tick();
        engine.restart();

        assert_eq!(engine.status(), SessionStatus::Idle);
        assert_eq!(engine.session().timer(), 0);
        assert!(engine.session().input().is_empty());
        assert_eq!(engine.session().config(), &config);
        assert_matches!(engine.drain_events().as_slice(), [SessionEvent::FocusRequested]);
    }

    #[test]
    fn reset_discards_pending_events() {
        let mut engine = engine_for("abc", SessionConfig::default());
        engine.type_char('a');
        engine.initialize(SessionConfig::default());
        assert_eq!(engine.drain_events(), vec![SessionEvent::FocusRequested]);
    }

    #[test]
    fn custom_passage_session() {
        let mut engine = engine_for("abc", SessionConfig::default());
        engine.initialize_with_passage(SessionConfig::default(), "xyz");
        assert_eq!(engine.session().passage_text(), "xyz");
    }
}
