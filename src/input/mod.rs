use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod frame;
pub mod manifest;
pub mod mask;
pub mod metaimage;

use crate::config::OUTPUT_FILE_NAME;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "mha"];
pub const VOLUME_EXTENSIONS: &[&str] = &["tiff", "tif", "mha"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            extensions.iter().any(|e| *e == lower)
        })
        .unwrap_or(false)
}

/// Regular files directly under `dir` whose extension is in `extensions`, sorted by path.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, InputError> {
    if !dir.is_dir() {
        return Err(InputError::MissingInput(format!(
            "directory not found: {}",
            dir.display()
        )));
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Case identifier of an image file: its stem, or for the container layout
/// `<name>/output.mha` the stem of `<name>`.
pub fn case_id(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name == OUTPUT_FILE_NAME {
        let parent = path.parent()?.file_name()?.to_str()?;
        return Some(strip_image_extension(parent).to_string());
    }
    Some(strip_image_extension(file_name).to_string())
}

fn strip_image_extension(name: &str) -> &str {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        let lower = ext.to_ascii_lowercase();
        if !stem.is_empty() && IMAGE_EXTENSIONS.iter().any(|e| *e == lower) {
            return stem;
        }
    }
    name
}

pub fn index_by_case(dir: &Path) -> Result<BTreeMap<String, PathBuf>, InputError> {
    let mut map = BTreeMap::new();
    for path in list_files(dir, IMAGE_EXTENSIONS)? {
        let Some(id) = case_id(&path) else {
            continue;
        };
        if map.contains_key(&id) {
            tracing::warn!(
                "duplicate case id {} in {}; keeping first ({})",
                id,
                dir.display(),
                path.display()
            );
            continue;
        }
        map.insert(id, path);
    }
    Ok(map)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
