use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// Used when every slice of the corpus comes up empty.
pub const FALLBACK_PASSAGE: &str = "The quick brown fox jumps over the lazy dog.";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    #[default]
    Quotes,
    Code,
    Lyrics,
}

impl Category {
    pub fn next(self) -> Self {
        match self {
            Category::Quotes => Category::Code,
            Category::Code => Category::Lyrics,
            Category::Lyrics => Category::Quotes,
        }
    }
}

#[derive(Deserialize, Debug)]
struct PassageFile {
    category: Category,
    #[serde(default)]
    easy: Vec<String>,
    #[serde(default)]
    medium: Vec<String>,
    #[serde(default)]
    hard: Vec<String>,
}

/// Read-only passage collection keyed by `(category, difficulty)`
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    slices: HashMap<(Category, Difficulty), Vec<String>>,
}

impl Corpus {
    /// Load the passages compiled into the binary. Files that fail to parse
    /// are skipped so a bad file only empties its own category.
    pub fn embedded() -> Self {
        let mut corpus = Corpus::default();

        for file in PASSAGE_DIR.files() {
            let name = file.path().display().to_string();
            let Some(contents) = file.contents_utf8() else {
                tracing::warn!(file = %name, "passage file is not valid utf-8");
                continue;
            };

            match serde_json::from_str::<PassageFile>(contents) {
                Ok(parsed) => corpus.insert_file(parsed),
                Err(e) => tracing::warn!(file = %name, error = %e, "skipping passage file"),
            }
        }

        corpus
    }

    /// Build a corpus from explicit passages, mostly for tests and custom prompts
    pub fn from_passages<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = (Category, Difficulty, S)>,
        S: Into<String>,
    {
        let mut corpus = Corpus::default();
        for (category, difficulty, passage) in passages {
            corpus
                .slices
                .entry((category, difficulty))
                .or_default()
                .push(passage.into());
        }
        corpus
    }

    fn insert_file(&mut self, file: PassageFile) {
        for (difficulty, passages) in [
            (Difficulty::Easy, file.easy),
            (Difficulty::Medium, file.medium),
            (Difficulty::Hard, file.hard),
        ] {
            let passages: Vec<String> = passages
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            self.slices
                .entry((file.category, difficulty))
                .or_default()
                .extend(passages);
        }
    }

    pub fn passages(&self, category: Category, difficulty: Difficulty) -> &[String] {
        self.slices
            .get(&(category, difficulty))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.slices.values().all(Vec::is_empty)
    }

    /// Pick a passage uniformly at random. An empty slice falls back to the
    /// default category at the same difficulty, then to a built-in sentence.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        category: Category,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> String {
        if let Some(passage) = self.passages(category, difficulty).choose(rng) {
            return passage.clone();
        }

        let fallback = Category::default();
        tracing::debug!(%category, %difficulty, %fallback, "empty passage slice, falling back");
        self.passages(fallback, difficulty)
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_PASSAGE.to_string())
    }
}
