//! Completion statistics kept in a string key-value store.
//!
//! Two entries: an aggregate blob under `puzzle_stats` and an append-only
//! completion log (newest first) under `puzzle_completions`. Both are
//! camelCase JSON so existing browser data keeps loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::timer::format_clock;

pub const STATS_KEY: &str = "puzzle_stats";
pub const COMPLETIONS_KEY: &str = "puzzle_completions";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> PuzzleResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PuzzleResult<()>;
    fn remove(&mut self, key: &str) -> PuzzleResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    reject_writes: bool,
    rejected_keys: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes fail, like a full or disabled `localStorage`.
    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    /// A store that refuses writes to `key` only, like a quota hit halfway
    /// through a save.
    pub fn rejecting_writes_to(mut self, key: &str) -> Self {
        self.rejected_keys.push(key.to_string());
        self
    }

    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PuzzleResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PuzzleResult<()> {
        if self.reject_writes || self.rejected_keys.iter().any(|rejected| rejected == key) {
            return Err(PuzzleError::Storage(format!("write to {key} rejected")));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PuzzleResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PuzzleStats {
    pub total_completed: u32,
    pub total_attempts: u32,
    pub best_time: Option<String>,
    pub best_time_seconds: Option<u64>,
    pub average_time: Option<String>,
    pub completed_puzzles: Vec<String>,
    pub puzzle_times: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub puzzle_id: String,
    pub completion_time: String,
    #[serde(alias = "timeInSeconds")]
    pub elapsed_seconds: u64,
    pub timestamp: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Achievement {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

const FIRST_PUZZLE: Achievement = Achievement {
    title: "First Puzzle!",
    description: "Completed your first puzzle",
    icon: "🎯",
};
const ENTHUSIAST: Achievement = Achievement {
    title: "Puzzle Enthusiast",
    description: "Completed 5 puzzles",
    icon: "🏆",
};
const MASTER: Achievement = Achievement {
    title: "Puzzle Master",
    description: "Completed 10 puzzles",
    icon: "👑",
};
const SPEED_DEMON: Achievement = Achievement {
    title: "Speed Demon",
    description: "Completed a puzzle in under 1 minute",
    icon: "⚡",
};

pub fn achievements(stats: &PuzzleStats) -> Vec<Achievement> {
    let mut unlocked = Vec::new();
    if stats.total_completed >= 1 {
        unlocked.push(FIRST_PUZZLE);
    }
    if stats.total_completed >= 5 {
        unlocked.push(ENTHUSIAST);
    }
    if stats.total_completed >= 10 {
        unlocked.push(MASTER);
    }
    if stats.best_time_seconds.is_some_and(|best| best < 60) {
        unlocked.push(SPEED_DEMON);
    }
    unlocked
}

pub struct StatsStore<K> {
    store: K,
}

impl<K: KeyValueStore> StatsStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn into_inner(self) -> K {
        self.store
    }

    pub fn try_stats(&self) -> PuzzleResult<PuzzleStats> {
        match self.store.get(STATS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(PuzzleStats::default()),
        }
    }

    /// Stored stats, or defaults when they cannot be read.
    pub fn stats(&self) -> PuzzleStats {
        self.try_stats().unwrap_or_default()
    }

    pub fn try_list_completions(&self) -> PuzzleResult<Vec<CompletionRecord>> {
        match self.store.get(COMPLETIONS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Most recent first.
    pub fn list_completions(&self) -> Vec<CompletionRecord> {
        self.try_list_completions().unwrap_or_default()
    }

    /// Records one completion. Unreadable stored data counts as empty and is
    /// overwritten. Only writes can fail; when the log cannot be written the
    /// stats blob is put back so both entries still agree.
    pub fn try_record_completion(
        &mut self,
        puzzle_id: &str,
        formatted: &str,
        elapsed_seconds: u64,
        timestamp_ms: u64,
    ) -> PuzzleResult<PuzzleStats> {
        let mut stats = self.stats();
        let mut completions = self.list_completions();

        let first_time = !stats.completed_puzzles.iter().any(|id| id == puzzle_id);
        if first_time {
            stats.total_completed += 1;
            stats.completed_puzzles.push(puzzle_id.to_string());
        }
        stats.total_attempts += 1;
        stats
            .puzzle_times
            .insert(puzzle_id.to_string(), formatted.to_string());

        if stats
            .best_time_seconds
            .is_none_or(|best| elapsed_seconds < best)
        {
            stats.best_time = Some(formatted.to_string());
            stats.best_time_seconds = Some(elapsed_seconds);
        }

        completions.insert(
            0,
            CompletionRecord {
                puzzle_id: puzzle_id.to_string(),
                completion_time: formatted.to_string(),
                elapsed_seconds,
                timestamp: timestamp_ms,
            },
        );
        let total: u64 = completions.iter().map(|record| record.elapsed_seconds).sum();
        stats.average_time = Some(format_clock(total / completions.len() as u64));

        let stats_json = serde_json::to_string(&stats)?;
        let completions_json = serde_json::to_string(&completions)?;
        let previous = self.store.get(STATS_KEY).ok().flatten();
        self.store.set(STATS_KEY, &stats_json)?;
        if let Err(err) = self.store.set(COMPLETIONS_KEY, &completions_json) {
            let _ = match previous {
                Some(raw) => self.store.set(STATS_KEY, &raw),
                None => self.store.remove(STATS_KEY),
            };
            return Err(err);
        }
        Ok(stats)
    }

    /// Records one completion. When it cannot be saved, the stats as they
    /// are still stored are returned.
    pub fn record_completion(
        &mut self,
        puzzle_id: &str,
        formatted: &str,
        elapsed_seconds: u64,
        timestamp_ms: u64,
    ) -> PuzzleStats {
        match self.try_record_completion(puzzle_id, formatted, elapsed_seconds, timestamp_ms) {
            Ok(stats) => stats,
            Err(_) => self.stats(),
        }
    }

    pub fn reset_all(&mut self) -> PuzzleResult<()> {
        self.store.remove(STATS_KEY)?;
        self.store.remove(COMPLETIONS_KEY)
    }

    pub fn puzzle_completion_count(&self, puzzle_id: &str) -> usize {
        self.list_completions()
            .iter()
            .filter(|record| record.puzzle_id == puzzle_id)
            .count()
    }

    pub fn puzzle_best_time(&self, puzzle_id: &str) -> Option<String> {
        self.list_completions()
            .into_iter()
            .filter(|record| record.puzzle_id == puzzle_id)
            .min_by_key(|record| record.elapsed_seconds)
            .map(|record| record.completion_time)
    }
}
