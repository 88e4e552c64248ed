//! Expands scan arguments into a list of image files.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::log;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// True for `.jpg`, `.jpeg` and `.png` in any case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn lowercase_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn lowercase_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Image files directly inside `dir`.
///
/// Files sharing a lower-cased stem (`placa1.jpg` / `PLACA1.png`) are
/// scanned once; the first in name order wins. The result is sorted by
/// lower-cased file name.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();

    // Deterministic "first found" regardless of read_dir order
    files.sort();

    let mut seen = HashSet::new();
    let mut unique: Vec<PathBuf> = Vec::with_capacity(files.len());
    for path in files {
        if seen.insert(lowercase_stem(&path)) {
            unique.push(path);
        } else {
            log(&format!("Skipping duplicate image: {}", path.display()));
        }
    }

    unique.sort_by_key(|path| lowercase_name(path));
    Ok(unique)
}

/// Expands directories and keeps explicit files, in argument order.
///
/// Explicit paths are kept even if they do not exist; they surface later
/// as unreadable images.
pub fn collect_inputs(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for arg in args {
        if arg.is_dir() {
            let found = discover_images(arg)?;
            log(&format!("Found {} image(s) in {}", found.len(), arg.display()));
            inputs.extend(found);
        } else {
            inputs.push(arg.clone());
        }
    }
    Ok(inputs)
}
