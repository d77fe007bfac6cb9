use serde::Deserialize;
use web_sys::UrlSearchParams;

use puzzlebox_core::{EngineConfig, PuzzleSummary};

pub(crate) const PUZZLE_PARAM: &str = "puzzle";
pub(crate) const SETTINGS_ELEMENT_ID: &str = "puzzlebox-settings";

/// Page-level overrides embedded as JSON in
/// `<script type="application/json" id="puzzlebox-settings">`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct PageSettings {
    pub(crate) engine: EngineConfig,
    pub(crate) initial_zoom: f32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            initial_zoom: 1.0,
        }
    }
}

pub(crate) fn load_page_settings() -> PageSettings {
    let raw = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(SETTINGS_ELEMENT_ID))
        .and_then(|element| element.text_content());
    match raw {
        Some(raw) => parse_page_settings(&raw),
        None => PageSettings::default(),
    }
}

fn parse_page_settings(raw: &str) -> PageSettings {
    if raw.trim().is_empty() {
        return PageSettings::default();
    }
    match serde_json::from_str::<PageSettings>(raw) {
        Ok(settings) => PageSettings {
            engine: settings.engine.validated(),
            ..settings
        },
        Err(err) => {
            gloo::console::warn!("settings: ignoring malformed page settings", err.to_string());
            PageSettings::default()
        }
    }
}

/// Puzzle id from `?puzzle=<id>`, if the page was opened with one.
pub(crate) fn requested_puzzle_id() -> Option<String> {
    let window = web_sys::window()?;
    let search = window.location().search().ok()?;
    puzzle_id_from_search(&search)
}

fn puzzle_id_from_search(search: &str) -> Option<String> {
    let params = UrlSearchParams::new_with_str(search).ok()?;
    params
        .get(PUZZLE_PARAM)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The requested puzzle, or the first one when the id is missing or unknown.
pub(crate) fn select_puzzle<'a>(
    puzzles: &'a [PuzzleSummary],
    requested: Option<&str>,
) -> Option<&'a PuzzleSummary> {
    requested
        .and_then(|id| puzzles.iter().find(|puzzle| puzzle.id == id))
        .or_else(|| puzzles.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzlebox_core::catalog::fallback_catalog;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn reads_puzzle_param() {
        assert_eq!(
            puzzle_id_from_search("?puzzle=puzzle-2&lang=en").as_deref(),
            Some("puzzle-2")
        );
        assert_eq!(puzzle_id_from_search("?puzzle="), None);
        assert_eq!(puzzle_id_from_search(""), None);
    }

    #[wasm_bindgen_test]
    fn page_settings_override_engine_defaults() {
        let settings = parse_page_settings(r#"{"engine": {"snap_threshold": 35}, "initialZoom": 1.5}"#);
        assert_eq!(settings.engine.snap_threshold, 35.0);
        assert_eq!(settings.engine.spring_back_ms, EngineConfig::default().spring_back_ms);
        assert_eq!(settings.initial_zoom, 1.5);

        let settings = parse_page_settings(r#"{"engine": {"snap_threshold": -4}}"#);
        assert_eq!(settings.engine.snap_threshold, EngineConfig::default().snap_threshold);
        assert_eq!(parse_page_settings("not json"), PageSettings::default());
        assert_eq!(parse_page_settings("  "), PageSettings::default());
    }

    #[wasm_bindgen_test]
    fn unknown_ids_fall_back_to_first_puzzle() {
        let puzzles = fallback_catalog();
        let second = puzzles.get(1).map(|puzzle| puzzle.id.clone());
        assert_eq!(
            select_puzzle(&puzzles, second.as_deref()).map(|puzzle| &puzzle.id),
            second.as_ref()
        );
        assert_eq!(
            select_puzzle(&puzzles, Some("nope")).map(|puzzle| puzzle.id.as_str()),
            Some("puzzle-1")
        );
        assert!(select_puzzle(&[], None).is_none());
    }
}
