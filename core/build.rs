use std::collections::HashSet;
use std::env;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const KNOWN_LEVELS: &[&str] = &["easy", "medium", "hard"];

#[derive(Deserialize)]
struct CatalogFile {
    catalog_url: Option<String>,
    puzzles: Vec<PuzzleEntry>,
}

#[derive(Deserialize)]
struct PuzzleEntry {
    name: String,
    desc: Option<String>,
    pieces: Option<u32>,
    level: Option<String>,
    tags: Option<String>,
    img: Option<String>,
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    let env_path = workspace_root.join(".env");
    let env_local_path = workspace_root.join(".env.local");

    let _ = dotenvy::from_filename(&env_local_path);
    let _ = dotenvy::from_filename(&env_path);

    println!("cargo:rerun-if-env-changed=PUZZLE_CATALOG_PATH");
    println!("cargo:rerun-if-env-changed=PUZZLE_CATALOG_URL");
    println!("cargo:rerun-if-changed={}", env_path.display());
    println!("cargo:rerun-if-changed={}", env_local_path.display());

    let catalog_path = resolve_catalog_path(workspace_root);
    println!("cargo:rerun-if-changed={}", catalog_path.display());

    let contents = fs::read_to_string(&catalog_path).unwrap_or_else(|err| {
        panic!(
            "failed to read puzzle catalog at {}: {err}",
            catalog_path.display()
        )
    });

    let catalog: CatalogFile = toml::from_str(&contents).unwrap_or_else(|err| {
        panic!(
            "failed to parse puzzle catalog at {}: {err}",
            catalog_path.display()
        )
    });

    if catalog.puzzles.is_empty() {
        panic!("puzzle catalog {} has no entries", catalog_path.display());
    }

    validate_entries(&catalog.puzzles, &catalog_path);

    let catalog_url = env::var("PUZZLE_CATALOG_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or(catalog.catalog_url)
        .unwrap_or_default();
    if !catalog_url.is_empty()
        && !catalog_url.starts_with("http://")
        && !catalog_url.starts_with("https://")
    {
        panic!(
            "catalog_url '{}' must be an http(s) URL in {}",
            catalog_url,
            catalog_path.display()
        );
    }

    let mut output = String::new();
    writeln!(
        &mut output,
        "pub const CATALOG_URL: &str = {};",
        rust_string(catalog_url.trim())
    )
    .unwrap();
    writeln!(&mut output).unwrap();
    writeln!(&mut output, "pub const FALLBACK_CATALOG: &[FallbackPuzzle] = &[").unwrap();

    for entry in &catalog.puzzles {
        writeln!(&mut output, "    FallbackPuzzle {{").unwrap();
        writeln!(&mut output, "        name: {},", rust_string(&entry.name)).unwrap();
        writeln!(&mut output, "        desc: {},", rust_option(entry.desc.as_deref())).unwrap();
        writeln!(
            &mut output,
            "        pieces: {},",
            entry
                .pieces
                .map(|pieces| format!("Some({pieces})"))
                .unwrap_or_else(|| "None".to_string())
        )
        .unwrap();
        writeln!(&mut output, "        level: {},", rust_option(entry.level.as_deref())).unwrap();
        writeln!(&mut output, "        tags: {},", rust_option(entry.tags.as_deref())).unwrap();
        writeln!(&mut output, "        img: {},", rust_option(entry.img.as_deref())).unwrap();
        writeln!(&mut output, "    }},").unwrap();
    }

    writeln!(&mut output, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_path = out_dir.join("puzzle_catalog.rs");
    fs::write(&out_path, output).unwrap_or_else(|err| {
        panic!("failed to write {}: {err}", out_path.display())
    });
}

fn resolve_catalog_path(workspace_root: &Path) -> PathBuf {
    let env_value = env::var("PUZZLE_CATALOG_PATH").ok();
    let raw_path = match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => workspace_root.join("puzzles/catalog.toml"),
    };
    if raw_path.is_relative() {
        workspace_root.join(raw_path)
    } else {
        raw_path
    }
}

fn rust_string(value: &str) -> String {
    format!("{:?}", value)
}

fn rust_option(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("Some({})", rust_string(value)),
        None => "None".to_string(),
    }
}

fn validate_entries(entries: &[PuzzleEntry], catalog_path: &Path) {
    let mut names = HashSet::new();

    for entry in entries {
        if entry.name.trim().is_empty() {
            panic!("puzzle name cannot be empty in {}", catalog_path.display());
        }
        if entry.pieces == Some(0) {
            panic!(
                "puzzle '{}' must have at least one piece in {}",
                entry.name,
                catalog_path.display()
            );
        }
        if let Some(level) = entry.level.as_deref() {
            if !KNOWN_LEVELS.contains(&level.trim().to_ascii_lowercase().as_str()) {
                panic!(
                    "puzzle '{}' has unknown level '{}' in {}",
                    entry.name,
                    level,
                    catalog_path.display()
                );
            }
        }
        if let Some(img) = entry.img.as_deref() {
            if img.starts_with("data:") {
                panic!(
                    "puzzle '{}' img cannot be a data URL in {}",
                    entry.name,
                    catalog_path.display()
                );
            }
        }
        if !names.insert(entry.name.clone()) {
            panic!(
                "duplicate puzzle name '{}' in {}",
                entry.name,
                catalog_path.display()
            );
        }
    }
}
