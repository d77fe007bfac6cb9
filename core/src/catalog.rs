use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PuzzleError, PuzzleResult};

/// Entry of the build-time fallback catalog generated from `puzzles/catalog.toml`.
#[derive(Clone, Copy, Debug)]
pub struct FallbackPuzzle {
    pub name: &'static str,
    pub desc: Option<&'static str>,
    pub pieces: Option<u32>,
    pub level: Option<&'static str>,
    pub tags: Option<&'static str>,
    pub img: Option<&'static str>,
}

include!(concat!(env!("OUT_DIR"), "/puzzle_catalog.rs"));

pub const DEFAULT_TITLE: &str = "Untitled Puzzle";
pub const DEFAULT_DESCRIPTION: &str = "A fun puzzle to solve";
pub const DEFAULT_PIECES: u32 = 9;

pub const VEHICLE_EMOJI: &[&str] = &[
    "🚗", "🚕", "🚙", "🚐", "🏎️", "🚓", "🚑", "🚒", "🚚", "🚛", "🚜", "🏁", "🛻", "🚘", "🚖",
];

pub const NO_CACHE_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Case-insensitive; anything unrecognized is `Easy`.
    pub fn normalize(level: Option<&str>) -> Self {
        match level.map(|level| level.trim().to_ascii_lowercase()).as_deref() {
            Some("medium") => Difficulty::Medium,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One element of the remote catalog array. Every field may be missing or
/// hold the wrong type; either way it reads as `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPuzzle {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub pieces: Option<u32>,
    pub level: Option<String>,
    pub tags: Option<String>,
    pub img: Option<String>,
}

fn text_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key)?.as_str().map(str::to_string)
}

/// Whole non-negative numbers, also when sent as a numeric string.
fn count_field(entry: &Value, key: &str) -> Option<u32> {
    let count = match entry.get(key)? {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && *value >= 0.0)
                .map(|value| value as u64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;
    u32::try_from(count).ok()
}

impl RawPuzzle {
    /// Reads one catalog entry. Non-object entries yield all defaults.
    pub fn from_value(entry: &Value) -> Self {
        Self {
            name: text_field(entry, "name"),
            desc: text_field(entry, "desc"),
            pieces: count_field(entry, "pieces"),
            level: text_field(entry, "level"),
            tags: text_field(entry, "tags"),
            img: text_field(entry, "img"),
        }
    }
}

impl From<&FallbackPuzzle> for RawPuzzle {
    fn from(entry: &FallbackPuzzle) -> Self {
        Self {
            name: Some(entry.name.to_string()),
            desc: entry.desc.map(str::to_string),
            pieces: entry.pieces,
            level: entry.level.map(str::to_string),
            tags: entry.tags.map(str::to_string),
            img: entry.img.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub pieces: u32,
    pub emoji: &'static str,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|tags| {
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub fn emoji_for_index(index: usize) -> &'static str {
    VEHICLE_EMOJI[index % VEHICLE_EMOJI.len()]
}

impl PuzzleSummary {
    pub fn from_raw(index: usize, raw: RawPuzzle) -> Self {
        let difficulty = Difficulty::normalize(raw.level.as_deref());
        let tags = split_tags(raw.tags.as_deref());
        Self {
            id: format!("puzzle-{}", index + 1),
            title: non_empty(raw.name).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: non_empty(raw.desc).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            difficulty,
            pieces: raw.pieces.filter(|pieces| *pieces > 0).unwrap_or(DEFAULT_PIECES),
            emoji: emoji_for_index(index),
            image_url: non_empty(raw.img),
            tags,
        }
    }
}

pub fn summarize(raw: Vec<RawPuzzle>) -> Vec<PuzzleSummary> {
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| PuzzleSummary::from_raw(index, raw))
        .collect()
}

/// Parses the remote catalog body. Only a body that is not a JSON array is
/// an error; bad fields inside an entry fall back to their defaults.
pub fn parse_catalog(body: &str) -> PuzzleResult<Vec<PuzzleSummary>> {
    let entries: Vec<Value> =
        serde_json::from_str(body).map_err(|err| PuzzleError::Catalog(err.to_string()))?;
    Ok(summarize(entries.iter().map(RawPuzzle::from_value).collect()))
}

pub fn fallback_catalog() -> Vec<PuzzleSummary> {
    summarize(FALLBACK_CATALOG.iter().map(RawPuzzle::from).collect())
}

/// `url` with a `t=<timestamp>` query parameter appended.
pub fn cache_busting_url(url: &str, timestamp_ms: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={timestamp_ms}")
}

/// Session-wide memo of the last loaded catalog.
#[derive(Clone, Debug, Default)]
pub struct CatalogCache {
    puzzles: Option<Vec<PuzzleSummary>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&[PuzzleSummary]> {
        self.puzzles.as_deref()
    }

    pub fn store(&mut self, puzzles: Vec<PuzzleSummary>) -> &[PuzzleSummary] {
        self.puzzles.insert(puzzles)
    }

    pub fn clear(&mut self) {
        self.puzzles = None;
    }

    pub fn puzzle_by_id(&self, id: &str) -> Option<&PuzzleSummary> {
        self.puzzles
            .as_ref()?
            .iter()
            .find(|puzzle| puzzle.id == id.trim())
    }
}
