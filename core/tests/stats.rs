use puzzlebox_core::stats::{achievements, COMPLETIONS_KEY, STATS_KEY};
use puzzlebox_core::{KeyValueStore, MemoryStore, PuzzleStats, StatsStore};

#[test]
fn recompleting_a_puzzle_counts_attempts_not_completions() {
    let mut stats = StatsStore::new(MemoryStore::new());
    stats.record_completion("puzzle-1", "00:30", 30, 1_000);
    let updated = stats.record_completion("puzzle-1", "00:20", 20, 2_000);

    assert_eq!(updated.best_time_seconds, Some(20));
    assert_eq!(updated.best_time.as_deref(), Some("00:20"));
    assert_eq!(updated.total_completed, 1);
    assert_eq!(updated.total_attempts, 2);
    assert_eq!(updated.average_time.as_deref(), Some("00:25"));
    assert_eq!(updated.completed_puzzles, vec!["puzzle-1".to_string()]);
    assert_eq!(
        updated.puzzle_times.get("puzzle-1").map(String::as_str),
        Some("00:20")
    );
    assert_eq!(stats.stats(), updated);
}

#[test]
fn best_time_is_a_running_minimum() {
    let mut stats = StatsStore::new(MemoryStore::new());
    stats.record_completion("puzzle-1", "00:40", 40, 1);
    stats.record_completion("puzzle-2", "01:10", 70, 2);
    let updated = stats.record_completion("puzzle-3", "00:00", 0, 3);
    assert_eq!(updated.best_time_seconds, Some(0));
    let updated = stats.record_completion("puzzle-1", "00:05", 5, 4);
    assert_eq!(updated.best_time_seconds, Some(0));
    assert_eq!(updated.total_completed, 3);
    // (40 + 70 + 0 + 5) / 4 = 28.75
    assert_eq!(updated.average_time.as_deref(), Some("00:28"));
}

#[test]
fn completions_are_listed_newest_first() {
    let mut stats = StatsStore::new(MemoryStore::new());
    stats.record_completion("puzzle-1", "00:30", 30, 100);
    stats.record_completion("puzzle-2", "00:45", 45, 200);
    stats.record_completion("puzzle-1", "00:25", 25, 300);

    let log = stats.list_completions();
    let stamps: Vec<u64> = log.iter().map(|record| record.timestamp).collect();
    assert_eq!(stamps, vec![300, 200, 100]);
    assert_eq!(stats.puzzle_completion_count("puzzle-1"), 2);
    assert_eq!(stats.puzzle_best_time("puzzle-1").as_deref(), Some("00:25"));
    assert_eq!(stats.puzzle_best_time("puzzle-9"), None);
}

#[test]
fn legacy_field_name_still_loads() {
    let mut store = MemoryStore::new();
    store.insert_raw(
        COMPLETIONS_KEY,
        r#"[{"puzzleId":"puzzle-2","completionTime":"01:05","timeInSeconds":65,"timestamp":1700000000000}]"#,
    );
    let stats = StatsStore::new(store);
    let log = stats.list_completions();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].elapsed_seconds, 65);
    assert_eq!(log[0].puzzle_id, "puzzle-2");
}

#[test]
fn unreadable_data_falls_back_to_defaults() {
    let mut store = MemoryStore::new();
    store.insert_raw(STATS_KEY, "{not json");
    store.insert_raw(COMPLETIONS_KEY, "42");
    let stats = StatsStore::new(store);
    assert!(stats.try_stats().is_err());
    assert_eq!(stats.stats(), PuzzleStats::default());
    assert!(stats.list_completions().is_empty());
}

#[test]
fn failed_write_returns_previous_stats() {
    let mut store = MemoryStore::new();
    store.insert_raw(
        STATS_KEY,
        r#"{"totalCompleted":2,"totalAttempts":3,"bestTime":"00:50","bestTimeSeconds":50,"averageTime":"01:00","completedPuzzles":["puzzle-1","puzzle-2"],"puzzleTimes":{}}"#,
    );
    let mut stats = StatsStore::new(store.rejecting_writes());
    let returned = stats.record_completion("puzzle-3", "00:10", 10, 5);
    assert_eq!(returned.total_completed, 2);
    assert_eq!(returned.best_time_seconds, Some(50));
    assert!(stats
        .try_record_completion("puzzle-3", "00:10", 10, 5)
        .is_err());
}

#[test]
fn corrupt_log_is_replaced_on_next_completion() {
    let mut store = MemoryStore::new();
    store.insert_raw(COMPLETIONS_KEY, "{garbage");
    let mut stats = StatsStore::new(store);
    stats.record_completion("puzzle-1", "00:30", 30, 1);
    let updated = stats.record_completion("puzzle-1", "00:20", 20, 2);

    assert_eq!(updated.total_attempts, 2);
    assert_eq!(updated.best_time_seconds, Some(20));
    assert_eq!(stats.list_completions().len(), 2);
    assert!(stats.try_list_completions().is_ok());
}

#[test]
fn corrupt_stats_blob_is_replaced_on_next_completion() {
    let mut store = MemoryStore::new();
    store.insert_raw(STATS_KEY, "[1, 2");
    let mut stats = StatsStore::new(store);
    let updated = stats.record_completion("puzzle-2", "00:45", 45, 1);

    assert_eq!(updated.total_attempts, 1);
    assert_eq!(updated.total_completed, 1);
    assert_eq!(stats.try_stats().expect("rewritten blob"), updated);
    assert_eq!(stats.list_completions().len(), 1);
}

#[test]
fn failed_log_write_leaves_stats_untouched() {
    let mut store = MemoryStore::new();
    store.insert_raw(
        STATS_KEY,
        r#"{"totalCompleted":1,"totalAttempts":1,"bestTime":"00:50","bestTimeSeconds":50,"averageTime":"00:50","completedPuzzles":["puzzle-1"],"puzzleTimes":{"puzzle-1":"00:50"}}"#,
    );
    let before = StatsStore::new(store.clone()).stats();
    let mut stats = StatsStore::new(store.rejecting_writes_to(COMPLETIONS_KEY));

    let returned = stats.record_completion("puzzle-2", "00:10", 10, 5);
    assert_eq!(returned, before);
    assert_eq!(stats.stats(), before);
    assert!(stats.list_completions().is_empty());
}

#[test]
fn failed_log_write_on_fresh_store_saves_nothing() {
    let mut stats = StatsStore::new(MemoryStore::new().rejecting_writes_to(COMPLETIONS_KEY));
    assert!(stats.try_record_completion("puzzle-1", "00:10", 10, 5).is_err());
    assert!(stats.store().get(STATS_KEY).expect("read").is_none());
    assert_eq!(stats.stats(), PuzzleStats::default());
}

#[test]
fn reset_clears_both_entries() {
    let mut stats = StatsStore::new(MemoryStore::new());
    stats.record_completion("puzzle-1", "00:30", 30, 1);
    stats.reset_all().expect("memory store removes");
    assert_eq!(stats.stats(), PuzzleStats::default());
    assert!(stats.store().get(COMPLETIONS_KEY).expect("read").is_none());
}

#[test]
fn achievements_unlock_by_threshold() {
    let mut summary = PuzzleStats {
        total_completed: 5,
        best_time_seconds: Some(75),
        ..PuzzleStats::default()
    };
    let titles: Vec<&str> = achievements(&summary).iter().map(|a| a.title).collect();
    assert_eq!(titles, vec!["First Puzzle!", "Puzzle Enthusiast"]);

    summary.total_completed = 10;
    summary.best_time_seconds = Some(59);
    let titles: Vec<&str> = achievements(&summary).iter().map(|a| a.title).collect();
    assert_eq!(
        titles,
        vec!["First Puzzle!", "Puzzle Enthusiast", "Puzzle Master", "Speed Demon"]
    );
    assert!(achievements(&PuzzleStats::default()).is_empty());
}
