use puzzlebox_core::catalog::{
    cache_busting_url, fallback_catalog, parse_catalog, split_tags, CATALOG_URL,
    FALLBACK_CATALOG, VEHICLE_EMOJI,
};
use puzzlebox_core::{CatalogCache, Difficulty, PuzzleError};

#[test]
fn remote_entries_are_normalized() {
    let body = r#"[
        {"name": "Race Day", "desc": "Zoom!", "pieces": 6, "level": "HARD", "tags": "cars, fast,,", "img": "https://example.com/race.svg"},
        {"level": "expert"},
        {"name": "", "pieces": 0, "level": "Medium"}
    ]"#;
    let puzzles = parse_catalog(body).expect("valid catalog");
    assert_eq!(puzzles.len(), 3);

    let race = &puzzles[0];
    assert_eq!(race.id, "puzzle-1");
    assert_eq!(race.title, "Race Day");
    assert_eq!(race.difficulty, Difficulty::Hard);
    assert_eq!(race.pieces, 6);
    assert_eq!(race.tags, vec!["cars".to_string(), "fast".to_string()]);
    assert_eq!(race.image_url.as_deref(), Some("https://example.com/race.svg"));
    assert_eq!(race.emoji, VEHICLE_EMOJI[0]);

    let bare = &puzzles[1];
    assert_eq!(bare.id, "puzzle-2");
    assert_eq!(bare.title, "Untitled Puzzle");
    assert_eq!(bare.description, "A fun puzzle to solve");
    assert_eq!(bare.difficulty, Difficulty::Easy);
    assert_eq!(bare.pieces, 9);
    assert!(bare.tags.is_empty());
    assert_eq!(bare.image_url, None);

    assert_eq!(puzzles[2].title, "Untitled Puzzle");
    assert_eq!(puzzles[2].pieces, 9);
    assert_eq!(puzzles[2].difficulty, Difficulty::Medium);
}

#[test]
fn mistyped_fields_fall_back_per_entry() {
    let body = r#"[
        {"name": "A", "pieces": 4},
        {"name": "B", "pieces": "6", "level": 3, "tags": ["x"]},
        {"name": 7, "desc": null, "pieces": -2, "img": false},
        {"pieces": 12.0},
        "not an object",
        null
    ]"#;
    let puzzles = parse_catalog(body).expect("array body parses");
    assert_eq!(puzzles.len(), 6);

    assert_eq!(puzzles[0].pieces, 4);
    assert_eq!(puzzles[1].title, "B");
    assert_eq!(puzzles[1].pieces, 6);
    assert_eq!(puzzles[1].difficulty, Difficulty::Easy);
    assert!(puzzles[1].tags.is_empty());

    assert_eq!(puzzles[2].title, "Untitled Puzzle");
    assert_eq!(puzzles[2].description, "A fun puzzle to solve");
    assert_eq!(puzzles[2].pieces, 9);
    assert_eq!(puzzles[2].image_url, None);

    assert_eq!(puzzles[3].pieces, 12);
    for (index, puzzle) in puzzles.iter().enumerate().skip(4) {
        assert_eq!(puzzle.id, format!("puzzle-{}", index + 1));
        assert_eq!(puzzle.title, "Untitled Puzzle");
        assert_eq!(puzzle.pieces, 9);
    }
}

#[test]
fn emoji_cycles_through_vehicles() {
    let body = format!("[{}]", vec!["{}"; VEHICLE_EMOJI.len() + 2].join(","));
    let puzzles = parse_catalog(&body).expect("valid catalog");
    assert_eq!(puzzles[VEHICLE_EMOJI.len()].emoji, VEHICLE_EMOJI[0]);
    assert_eq!(puzzles[VEHICLE_EMOJI.len() + 1].emoji, VEHICLE_EMOJI[1]);
}

#[test]
fn malformed_body_is_a_catalog_error() {
    assert!(matches!(
        parse_catalog("{\"name\": \"not an array\"}"),
        Err(PuzzleError::Catalog(_))
    ));
}

#[test]
fn fallback_catalog_matches_build_time_entries() {
    let puzzles = fallback_catalog();
    assert_eq!(puzzles.len(), FALLBACK_CATALOG.len());
    assert!(!puzzles.is_empty());
    for (puzzle, entry) in puzzles.iter().zip(FALLBACK_CATALOG) {
        assert_eq!(puzzle.title, entry.name);
        assert_eq!(puzzle.difficulty, Difficulty::normalize(entry.level));
    }
    assert!(CATALOG_URL.is_empty() || CATALOG_URL.starts_with("http"));
}

#[test]
fn cache_lookup_by_id() {
    let mut cache = CatalogCache::new();
    assert!(cache.get().is_none());
    assert!(cache.puzzle_by_id("puzzle-1").is_none());
    cache.store(fallback_catalog());
    assert_eq!(
        cache.puzzle_by_id(" puzzle-1 ").map(|puzzle| puzzle.id.as_str()),
        Some("puzzle-1")
    );
    cache.clear();
    assert!(cache.get().is_none());
}

#[test]
fn helpers() {
    assert_eq!(cache_busting_url("https://host/cars.js", 17), "https://host/cars.js?t=17");
    assert_eq!(cache_busting_url("https://host/c.js?v=2", 17), "https://host/c.js?v=2&t=17");
    assert_eq!(split_tags(Some(" a , b ,")), vec!["a".to_string(), "b".to_string()]);
    assert!(split_tags(None).is_empty());
    assert_eq!(Difficulty::normalize(Some(" medium ")), Difficulty::Medium);
    assert_eq!(Difficulty::Hard.to_string(), "Hard");
}
