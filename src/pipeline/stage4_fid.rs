use std::path::{Path, PathBuf};

use crate::config::CLEAN_SUBDIR;
use crate::input::list_files;
use crate::metrics::frechet::{FidBackend, FidError, FidParams};
use crate::pipeline::stage1_cases::collect_prediction_files;

pub fn clean_reference_images(ground_truth_dir: &Path) -> Result<Vec<PathBuf>, FidError> {
    Ok(list_files(&ground_truth_dir.join(CLEAN_SUBDIR), &["png"])?)
}

/// FID between `<ground_truth>/clean/*.png` and every prediction image of the
/// given directories.
pub fn calculate_fid_score(
    prediction_dirs: &[PathBuf],
    ground_truth_dir: &Path,
    backend: &dyn FidBackend,
    params: &FidParams,
) -> Result<f64, FidError> {
    if prediction_dirs.is_empty() {
        return Err(FidError::NoPredictionDirs);
    }
    let mut candidates = Vec::new();
    for dir in prediction_dirs {
        candidates.extend(collect_prediction_files(dir)?);
    }
    let reference = clean_reference_images(ground_truth_dir)?;
    run_stage4(backend, &reference, &candidates, params)
}

pub fn run_stage4(
    backend: &dyn FidBackend,
    reference: &[PathBuf],
    candidates: &[PathBuf],
    params: &FidParams,
) -> Result<f64, FidError> {
    tracing::info!(
        "computing FID: {} reference vs {} candidate images (batch {}, workers {}, device {}, dims {})",
        reference.len(),
        candidates.len(),
        params.batch_size,
        params.workers,
        params.device.as_str(),
        params.dims
    );
    let fid = backend.compute_fid([reference, candidates], params)?;
    tracing::info!("FID = {:.6}", fid);
    Ok(fid)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_fid.rs"]
mod tests;
