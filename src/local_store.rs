use web_sys::Storage;

use puzzlebox_core::stats::{achievements, KeyValueStore, StatsStore};
use puzzlebox_core::{CompletionSummary, PuzzleError, PuzzleResult, PuzzleStats};

/// `window.localStorage`, looked up on every call so a storage that becomes
/// unavailable mid-session surfaces as an error instead of a panic.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LocalStorageStore;

fn storage() -> PuzzleResult<Storage> {
    web_sys::window()
        .ok_or_else(|| PuzzleError::Storage("no window".to_string()))?
        .local_storage()
        .ok()
        .flatten()
        .ok_or_else(|| PuzzleError::Storage("localStorage unavailable".to_string()))
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> PuzzleResult<Option<String>> {
        storage()?
            .get_item(key)
            .map_err(|_| PuzzleError::Storage(format!("read {key} failed")))
    }

    fn set(&mut self, key: &str, value: &str) -> PuzzleResult<()> {
        storage()?
            .set_item(key, value)
            .map_err(|_| PuzzleError::Storage(format!("write {key} failed")))
    }

    fn remove(&mut self, key: &str) -> PuzzleResult<()> {
        storage()?
            .remove_item(key)
            .map_err(|_| PuzzleError::Storage(format!("remove {key} failed")))
    }
}

pub(crate) fn stats_store() -> StatsStore<LocalStorageStore> {
    StatsStore::new(LocalStorageStore)
}

/// Persists a finished run. Storage failures are logged and the previous
/// stats are returned.
pub(crate) fn record_completion(puzzle_id: &str, summary: &CompletionSummary) -> PuzzleStats {
    let mut store = stats_store();
    let timestamp = js_sys::Date::now() as u64;
    match store.try_record_completion(
        puzzle_id,
        &summary.formatted,
        summary.elapsed_seconds,
        timestamp,
    ) {
        Ok(stats) => {
            gloo::console::log!(
                "stats: recorded",
                puzzle_id,
                summary.formatted.as_str(),
                stats.total_completed,
                stats.total_attempts
            );
            for achievement in achievements(&stats) {
                gloo::console::debug!("stats: achievement", achievement.icon, achievement.title);
            }
            stats
        }
        Err(err) => {
            gloo::console::warn!("stats: record failed", err.to_string());
            store.stats()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzlebox_core::stats::{COMPLETIONS_KEY, STATS_KEY};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn completion_round_trips_through_local_storage() {
        let mut store = stats_store();
        store.reset_all().expect("reset");
        let summary = CompletionSummary {
            elapsed_seconds: 42,
            formatted: "00:42".to_string(),
            message: "Great job!",
            pieces: 4,
            pulse_applied: true,
        };
        let stats = record_completion("puzzle-7", &summary);
        assert_eq!(stats.total_completed, 1);
        assert_eq!(stats.best_time.as_deref(), Some("00:42"));

        let raw = LocalStorageStore.get(STATS_KEY).expect("read").expect("present");
        assert!(raw.contains("\"totalCompleted\":1"));
        assert!(LocalStorageStore.get(COMPLETIONS_KEY).expect("read").is_some());
        store.reset_all().expect("reset");
    }
}
