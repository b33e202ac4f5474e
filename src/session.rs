use crate::corpus::{Category, Difficulty};
use crate::stats::{self, Stats, WpmSample};
use crate::typing_policy::{classify, grade_appended, InputChange};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Untimed sessions are force-completed after this many seconds.
pub const PASSAGE_CEILING_SECS: u32 = 300;
pub const DEFAULT_DURATION_SECS: u32 = 60;
/// Countdown lengths offered by the front end
pub const DURATION_CHOICES: [u32; 3] = [15, 30, 60];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimerMode {
    /// Counts down from the configured duration
    #[default]
    Timed,
    /// Counts up until the passage is exhausted
    Passage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub category: Category,
    pub mode: TimerMode,
    pub duration_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            category: Category::default(),
            mode: TimerMode::default(),
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl SessionConfig {
    /// A zero-length countdown would complete before the first keystroke.
    pub fn sanitized(mut self) -> Self {
        if self.duration_secs == 0 {
            self.duration_secs = DEFAULT_DURATION_SECS;
        }
        self
    }

    pub fn is_timed(&self) -> bool {
        self.mode == TimerMode::Timed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
}

/// Correctness of a single appended keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Render state of one passage position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Correct,
    Incorrect,
    Pending,
}

/// What a single accepted input change did to the session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputEffect {
    pub outcomes: Vec<Outcome>,
    pub completed: bool,
}

/// State of one typing attempt. Replaced wholesale on every reset.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    passage: Vec<char>,
    input: Vec<char>,
    timer: u32,
    mistakes: u32,
    streak: u32,
    best_streak: u32,
    started: bool,
    completed: bool,
    samples: Vec<WpmSample>,
}

impl Session {
    pub fn new(config: SessionConfig, passage: &str) -> Self {
        let config = config.sanitized();
        Self {
            timer: if config.is_timed() {
                config.duration_secs
            } else {
                0
            },
            config,
            passage: passage.chars().collect(),
            input: Vec::new(),
            mistakes: 0,
            streak: 0,
            best_streak: 0,
            started: false,
            completed: false,
            samples: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn passage(&self) -> &[char] {
        &self.passage
    }

    pub fn passage_text(&self) -> String {
        self.passage.iter().collect()
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    /// Seconds remaining when timed, seconds elapsed otherwise
    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn samples(&self) -> &[WpmSample] {
        &self.samples
    }

    pub fn status(&self) -> SessionStatus {
        if self.completed {
            SessionStatus::Completed
        } else if self.started {
            SessionStatus::Running
        } else {
            SessionStatus::Idle
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn seconds_elapsed(&self) -> u32 {
        if self.config.is_timed() {
            self.config.duration_secs.saturating_sub(self.timer)
        } else {
            self.timer
        }
    }

    pub fn stats(&self) -> Stats {
        Stats::compute(self.input.len(), self.mistakes, self.seconds_elapsed())
    }

    pub fn cursor(&self) -> usize {
        self.input.len()
    }

    pub fn char_states(&self) -> Vec<CharState> {
        self.passage
            .iter()
            .enumerate()
            .map(|(idx, expected)| match self.input.get(idx) {
                Some(typed) if typed == expected => CharState::Correct,
                Some(_) => CharState::Incorrect,
                None => CharState::Pending,
            })
            .collect()
    }

    /// Apply a whole new input value. `None` means nothing changed: the
    /// session is over or the value does not fit the passage.
    pub fn apply_input(&mut self, next: Vec<char>) -> Option<InputEffect> {
        if self.completed {
            return None;
        }

        let outcomes = match classify(&self.input, &next, self.passage.len()) {
            InputChange::Rejected | InputChange::Unchanged => return None,
            InputChange::Appended { from } => grade_appended(&self.passage, &next, from),
            InputChange::Deleted | InputChange::Replaced => Vec::new(),
        };

        for outcome in &outcomes {
            match outcome {
                Outcome::Correct => {
                    self.streak += 1;
                    self.best_streak = self.best_streak.max(self.streak);
                }
                Outcome::Incorrect => {
                    self.mistakes += 1;
                    self.streak = 0;
                }
            }
        }

        self.input = next;
        self.started = true;

        let completed = self.input.len() == self.passage.len();
        if completed {
            self.complete();
        }

        Some(InputEffect {
            outcomes,
            completed,
        })
    }

    /// Advance the clock by one second. Returns true when this tick ended
    /// the session.
    pub fn advance_clock(&mut self) -> bool {
        if self.completed {
            return false;
        }

        let limit_reached = if self.config.is_timed() {
            self.timer = self.timer.saturating_sub(1);
            self.timer == 0
        } else {
            self.timer += 1;
            self.timer >= PASSAGE_CEILING_SECS
        };

        let elapsed = self.seconds_elapsed();
        self.samples.push(WpmSample::new(
            elapsed as f64,
            stats::words_per_minute(self.input.len(), elapsed) as f64,
        ));

        if limit_reached {
            self.complete();
        }
        limit_reached
    }

    fn complete(&mut self) {
        self.started = false;
        self.completed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn timed(secs: u32) -> SessionConfig {
        SessionConfig {
            mode: TimerMode::Timed,
            duration_secs: secs,
            ..SessionConfig::default()
        }
    }

    fn untimed() -> SessionConfig {
        SessionConfig {
            mode: TimerMode::Passage,
            ..SessionConfig::default()
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::new(timed(30), "hello");

        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.timer(), 30);
        assert_eq!(session.mistakes(), 0);
        assert_eq!(session.streak(), 0);
        assert!(session.input().is_empty());
        assert!(!session.has_started());
    }

    #[test]
    fn untimed_session_starts_at_zero() {
        let session = Session::new(untimed(), "hello");
        assert_eq!(session.timer(), 0);
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let session = Session::new(timed(0), "hello");
        assert_eq!(session.timer(), DEFAULT_DURATION_SECS);
    }

    #[test]
    fn first_keystroke_starts_session() {
        let mut session = Session::new(timed(30), "hello");
        let effect = session.apply_input(chars("h")).unwrap();

        assert_eq!(effect.outcomes, vec![Outcome::Correct]);
        assert!(!effect.completed);
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.streak(), 1);
    }

    #[test]
    fn mismatch_counts_mistake_and_resets_streak() {
        let mut session = Session::new(timed(30), "hello");
        session.apply_input(chars("h")).unwrap();
        session.apply_input(chars("he")).unwrap();
        session.apply_input(chars("hex")).unwrap();

        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.best_streak(), 2);
    }

    #[test]
    fn deletions_do_not_touch_counters() {
        let mut session = Session::new(timed(30), "hello");
        session.apply_input(chars("hx")).unwrap();
        assert_eq!(session.mistakes(), 1);

        let effect = session.apply_input(chars("h")).unwrap();
        assert!(effect.outcomes.is_empty());
        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.input_text(), "h");
    }

    #[test]
    fn retyping_a_fixed_position_is_graded_again() {
        let mut session = Session::new(timed(30), "hello");
        session.apply_input(chars("hx")).unwrap();
        session.apply_input(chars("h")).unwrap();
        session.apply_input(chars("he")).unwrap();

        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.streak(), 1);
    }

    #[test]
    fn replacement_updates_input_only() {
        let mut session = Session::new(timed(30), "hello");
        session.apply_input(chars("he")).unwrap();
        session.apply_input(chars("hx")).unwrap();

        assert_eq!(session.input_text(), "hx");
        assert_eq!(session.mistakes(), 0);
        assert_eq!(session.streak(), 2);
    }

    #[test]
    fn overlong_value_is_rejected_without_state_change() {
        let mut session = Session::new(timed(30), "cat");
        assert_matches!(session.apply_input(chars("cats")), None);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.input().is_empty());
    }

    #[test]
    fn multi_char_paste_grades_each_character() {
        let mut session = Session::new(timed(30), "hello");
        let effect = session.apply_input(chars("hxl")).unwrap();

        assert_eq!(
            effect.outcomes,
            vec![Outcome::Correct, Outcome::Incorrect, Outcome::Correct]
        );
        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.streak(), 1);
    }

    #[test]
    fn filling_the_passage_completes() {
        let mut session = Session::new(timed(30), "hi");
        session.apply_input(chars("h")).unwrap();
        let effect = session.apply_input(chars("hi")).unwrap();

        assert!(effect.completed);
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(!session.has_started());
    }

    #[test]
    fn completed_session_ignores_input() {
        let mut session = Session::new(timed(30), "hi");
        session.apply_input(chars("hi")).unwrap();

        assert_matches!(session.apply_input(chars("h")), None);
        assert_eq!(session.input_text(), "hi");
    }

    #[test]
    fn timed_clock_counts_down_to_completion() {
        let mut session = Session::new(timed(3), "hello");
        assert!(!session.advance_clock());
        assert!(!session.advance_clock());
        assert!(session.advance_clock());

        assert_eq!(session.timer(), 0);
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(!session.advance_clock());
        assert_eq!(session.samples().len(), 3);
    }

    #[test]
    fn untimed_clock_stops_at_ceiling() {
        let mut session = Session::new(untimed(), "hello");
        session.apply_input(chars("h")).unwrap();
        for _ in 0..PASSAGE_CEILING_SECS - 1 {
            assert!(!session.advance_clock());
        }
        assert!(session.advance_clock());
        assert_eq!(session.timer(), PASSAGE_CEILING_SECS);
        assert!(session.is_completed());
    }

    #[test]
    fn seconds_elapsed_depends_on_mode() {
        let mut countdown = Session::new(timed(15), "hello");
        let mut stopwatch = Session::new(untimed(), "hello");
        for _ in 0..4 {
            countdown.advance_clock();
            stopwatch.advance_clock();
        }
        assert_eq!(countdown.timer(), 11);
        assert_eq!(countdown.seconds_elapsed(), 4);
        assert_eq!(stopwatch.seconds_elapsed(), 4);
    }

    #[test]
    fn char_states_follow_input() {
        let mut session = Session::new(timed(30), "cat");
        session.apply_input(chars("cx")).unwrap();

        assert_eq!(
            session.char_states(),
            vec![CharState::Correct, CharState::Incorrect, CharState::Pending]
        );
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn stats_are_idempotent() {
        let mut session = Session::new(untimed(), "hello world");
        session.apply_input(chars("hel")).unwrap();
        session.advance_clock();

        let first = session.stats();
        assert_eq!(first, session.stats());
        assert_eq!(first, session.stats());
    }

    #[test]
    fn stats_before_any_time_passes() {
        let mut session = Session::new(timed(60), "hello");
        assert_eq!(session.stats().accuracy, 100);
        session.apply_input(chars("hel")).unwrap();
        assert_eq!(session.stats().wpm, 0);
    }
}
