use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{EvalPaths, OUTPUT_FILE_NAME};
use crate::input::{IMAGE_EXTENSIONS, InputError, case_id, index_by_case, list_files};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub id: String,
    pub prediction: PathBuf,
    pub hazy: Option<PathBuf>,
    pub mask: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub cases: Vec<Case>,
    pub prediction_files: Vec<PathBuf>,
}

/// Prediction images of a directory: plain image files plus the container
/// layout `<name>/output.mha`. Sorted by path.
pub fn collect_prediction_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let mut out = list_files(dir, IMAGE_EXTENSIONS)?;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let candidate = path.join(OUTPUT_FILE_NAME);
            if candidate.is_file() {
                out.push(candidate);
            }
        }
    }
    out.sort();
    Ok(out)
}

pub fn run_stage1(paths: &EvalPaths) -> Result<Stage1Output, InputError> {
    let prediction_files = collect_prediction_files(&paths.predictions)?;
    let hazy = index_by_case(&paths.hazy)?;
    let masks = index_by_case(&paths.masks)?;

    let mut by_id: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in &prediction_files {
        let Some(id) = case_id(path) else {
            continue;
        };
        if by_id.contains_key(&id) {
            tracing::warn!(
                "duplicate prediction for case {}; keeping first ({})",
                id,
                path.display()
            );
            continue;
        }
        by_id.insert(id, path.clone());
    }

    let mut cases = Vec::with_capacity(by_id.len());
    for (id, prediction) in by_id {
        let hazy_path = hazy.get(&id).cloned();
        let mask_path = masks.get(&id).cloned();
        if hazy_path.is_none() {
            tracing::warn!("case {}: no hazy input found; KS will be absent", id);
        }
        if mask_path.is_none() {
            tracing::warn!("case {}: no mask found; region metrics will be absent", id);
        }
        cases.push(Case {
            id,
            prediction,
            hazy: hazy_path,
            mask: mask_path,
        });
    }

    tracing::info!(
        "discovered {} cases ({} prediction files) in {}",
        cases.len(),
        prediction_files.len(),
        paths.predictions.display()
    );

    Ok(Stage1Output {
        cases,
        prediction_files,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_cases.rs"]
mod tests;
