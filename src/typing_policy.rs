//! Classifies a proposed input value against the current one.
//!
//! The front end hands the engine whole input values (the way a text field
//! reports changes), so the engine has to work out what actually happened.

use crate::session::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputChange {
    /// Longer than the passage; dropped without touching state
    Rejected,
    Unchanged,
    /// Grew; characters from `from` onward are new
    Appended { from: usize },
    Deleted,
    /// Same length, different content (e.g. IME recomposition)
    Replaced,
}

pub fn classify(previous: &[char], next: &[char], passage_len: usize) -> InputChange {
    if next.len() > passage_len {
        InputChange::Rejected
    } else if next.len() > previous.len() {
        InputChange::Appended {
            from: previous.len(),
        }
    } else if next.len() < previous.len() {
        InputChange::Deleted
    } else if next == previous {
        InputChange::Unchanged
    } else {
        InputChange::Replaced
    }
}

/// Grade each newly appended character against the passage at the same index.
pub fn grade_appended(passage: &[char], next: &[char], from: usize) -> Vec<Outcome> {
    next.iter()
        .enumerate()
        .skip(from)
        .map(|(idx, typed)| match passage.get(idx) {
            Some(expected) if expected == typed => Outcome::Correct,
            _ => Outcome::Incorrect,
        })
        .collect()
}
