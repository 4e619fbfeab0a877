//! Conventional project file discovery (license, readme, API spec).

use std::fs;
use std::path::{Path, PathBuf};

pub const LICENSE_FILES: &[&str] = &["LICENSE", "LICENSE.md", "license", "license.md"];
pub const SWAGGER_FILES: &[&str] = &[
    "swagger.yaml",
    "swagger.yml",
    "swagger.json",
    "openapi.json",
    "openapi.yaml",
    "openapi.yml",
];
pub const README_FILES: &[&str] = &["README", "README.md", "readme", "readme.md"];

/// First existing candidate under `dir`.
pub fn find_existing(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Lines of the first existing candidate; empty when none is present or
/// the file cannot be read.
pub fn gather_lines(dir: &Path, candidates: &[&str]) -> Vec<String> {
    let Some(path) = find_existing(dir, candidates) else {
        return Vec::new();
    };
    match fs::read_to_string(&path) {
        Ok(text) => text.split('\n').map(str::to_string).collect(),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "conventional file not read");
            Vec::new()
        }
    }
}
