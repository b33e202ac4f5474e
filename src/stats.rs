//! Pure derivations over session counters.
//!
//! Everything in here is a function of `(characters typed, mistakes,
//! seconds elapsed)`, so the numbers shown live and the numbers saved with a
//! result can never disagree.

/// Standard word length used by every typing test.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub wpm: u32,
    /// 0..=100
    pub accuracy: u32,
    pub seconds_elapsed: u32,
}

impl Stats {
    pub fn compute(typed: usize, mistakes: u32, seconds_elapsed: u32) -> Self {
        Self {
            wpm: words_per_minute(typed, seconds_elapsed),
            accuracy: accuracy(typed, mistakes),
            seconds_elapsed,
        }
    }
}

pub fn words_per_minute(typed: usize, seconds_elapsed: u32) -> u32 {
    let minutes = seconds_elapsed as f64 / 60.0;
    if minutes <= 0.0 {
        return 0;
    }
    ((typed as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Mistakes are cumulative, so after deletions they can outnumber the
/// characters currently typed; the result is clamped at zero.
pub fn accuracy(typed: usize, mistakes: u32) -> u32 {
    if typed == 0 {
        return 100;
    }
    let typed = typed as f64;
    let pct = ((typed - mistakes as f64) / typed * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// One point of the live WPM curve, taken once per elapsed second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t, p.wpm)
    }
}

/// Population standard deviation of the sampled WPM; lower is steadier.
pub fn consistency(samples: &[WpmSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let count = samples.len() as f64;
    let mean = samples.iter().map(|s| s.wpm).sum::<f64>() / count;
    let variance = samples
        .iter()
        .map(|s| {
            let diff = mean - s.wpm;
            diff * diff
        })
        .sum::<f64>()
        / count;

    Some(variance.sqrt())
}
