use std::cell::RefCell;

use gloo::net::http::Request;

use puzzlebox_core::catalog::{
    cache_busting_url, fallback_catalog, parse_catalog, CATALOG_URL, NO_CACHE_HEADERS,
};
use puzzlebox_core::{CatalogCache, PuzzleError, PuzzleResult, PuzzleSummary};

thread_local! {
    static CATALOG_CACHE: RefCell<CatalogCache> = RefCell::new(CatalogCache::new());
}

async fn fetch_text(url: &str) -> PuzzleResult<String> {
    let mut request = Request::get(url);
    for (name, value) in NO_CACHE_HEADERS {
        request = request.header(name, value);
    }
    let response = request
        .send()
        .await
        .map_err(|err| PuzzleError::Document(format!("request {url}: {err}")))?;
    if !response.ok() {
        return Err(PuzzleError::Document(format!(
            "request {url}: status {}",
            response.status()
        )));
    }
    response
        .text()
        .await
        .map_err(|err| PuzzleError::Document(format!("read {url}: {err}")))
}

async fn fetch_remote_catalog() -> PuzzleResult<Vec<PuzzleSummary>> {
    if CATALOG_URL.is_empty() {
        return Err(PuzzleError::Catalog("no catalog url configured".to_string()));
    }
    let url = cache_busting_url(CATALOG_URL, js_sys::Date::now() as u64);
    let body = fetch_text(&url)
        .await
        .map_err(|err| PuzzleError::Catalog(err.to_string()))?;
    parse_catalog(&body)
}

/// Puzzle list for the session. The remote catalog is fetched once and
/// cached; any failure falls back to the list bundled at build time.
pub(crate) async fn load_catalog(force_refresh: bool) -> Vec<PuzzleSummary> {
    if force_refresh {
        CATALOG_CACHE.with(|cache| cache.borrow_mut().clear());
    }
    if let Some(cached) = CATALOG_CACHE.with(|cache| cache.borrow().get().map(<[_]>::to_vec)) {
        return cached;
    }
    let puzzles = match fetch_remote_catalog().await {
        Ok(puzzles) if !puzzles.is_empty() => puzzles,
        Ok(_) => {
            gloo::console::warn!("catalog: remote list is empty, using bundled puzzles");
            fallback_catalog()
        }
        Err(err) => {
            gloo::console::warn!("catalog: falling back to bundled puzzles", err.to_string());
            fallback_catalog()
        }
    };
    CATALOG_CACHE.with(|cache| cache.borrow_mut().store(puzzles).to_vec())
}

/// Downloads puzzle markup. Relative paths resolve against the page.
pub(crate) async fn fetch_document(url: &str) -> PuzzleResult<String> {
    fetch_text(url).await
}
