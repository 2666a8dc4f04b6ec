use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::config::{Device, OUTPUT_FILE_NAME};
use crate::input::case_id;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_WORKERS: usize = 0;
pub const DEFAULT_DIMS: usize = 2048;

#[derive(Debug, Error)]
pub enum FidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Input(#[from] crate::input::InputError),
    #[error("no features for {0}")]
    MissingFeatures(String),
    #[error("feature vector for {path} has {found} entries, expected {expected}")]
    DimensionMismatch {
        path: String,
        found: usize,
        expected: usize,
    },
    #[error("{set} set has {found} images; at least 2 are required")]
    TooFewImages { set: &'static str, found: usize },
    #[error("no prediction directories given")]
    NoPredictionDirs,
    #[error("feature extractor failed: {0}")]
    Extractor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FidParams {
    pub batch_size: usize,
    pub workers: usize,
    pub device: Device,
    pub dims: usize,
}

impl Default for FidParams {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            device: Device::Cpu,
            dims: DEFAULT_DIMS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub workers: usize,
    pub device: Device,
    pub dims: usize,
}

/// Distance between the feature distributions of two image sets.
pub trait FidBackend {
    fn compute_fid(&self, path_lists: [&[PathBuf]; 2], params: &FidParams) -> Result<f64, FidError>;
}

/// Image -> feature vector network, e.g. an Inception pool layer.
pub trait FeatureExtractor {
    fn extract(&self, batch: &[PathBuf], opts: &ExtractOptions) -> Result<Vec<Vec<f64>>, FidError>;
}

/// Fréchet distance between Gaussians fitted to extracted features.
#[derive(Debug, Clone)]
pub struct FrechetFid<E> {
    extractor: E,
}

impl<E: FeatureExtractor> FrechetFid<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    fn activations(&self, paths: &[PathBuf], params: &FidParams) -> Result<DMatrix<f64>, FidError> {
        let opts = ExtractOptions {
            workers: params.workers,
            device: params.device,
            dims: params.dims,
        };
        let mut rows = Vec::with_capacity(paths.len() * params.dims);
        for batch in paths.chunks(params.batch_size.max(1)) {
            let features = self.extractor.extract(batch, &opts)?;
            if features.len() != batch.len() {
                return Err(FidError::Extractor(format!(
                    "extractor returned {} vectors for a batch of {}",
                    features.len(),
                    batch.len()
                )));
            }
            for (path, feat) in batch.iter().zip(features) {
                if feat.len() != params.dims {
                    return Err(FidError::DimensionMismatch {
                        path: path.display().to_string(),
                        found: feat.len(),
                        expected: params.dims,
                    });
                }
                rows.extend(feat);
            }
        }
        Ok(DMatrix::from_row_slice(paths.len(), params.dims, &rows))
    }
}

impl<E: FeatureExtractor> FidBackend for FrechetFid<E> {
    fn compute_fid(&self, path_lists: [&[PathBuf]; 2], params: &FidParams) -> Result<f64, FidError> {
        for (set, paths) in ["reference", "candidate"].into_iter().zip(path_lists) {
            if paths.len() < 2 {
                return Err(FidError::TooFewImages {
                    set,
                    found: paths.len(),
                });
            }
        }
        let act1 = self.activations(path_lists[0], params)?;
        let act2 = self.activations(path_lists[1], params)?;
        let (mu1, sigma1) = gaussian_statistics(&act1);
        let (mu2, sigma2) = gaussian_statistics(&act2);
        tracing::debug!(
            "FID statistics: {} reference x {} candidate activations, dims {}",
            act1.nrows(),
            act2.nrows(),
            params.dims
        );
        Ok(frechet_distance(&mu1, &sigma1, &mu2, &sigma2))
    }
}

/// Column means and unbiased covariance of a (samples x features) matrix.
pub fn gaussian_statistics(act: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let n = act.nrows();
    let mu = DVector::from_iterator(act.ncols(), act.column_iter().map(|c| c.mean()));
    let centered = DMatrix::from_fn(n, act.ncols(), |r, c| act[(r, c)] - mu[c]);
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let sigma = centered.transpose() * &centered / denom;
    (mu, sigma)
}

/// `|mu1 - mu2|^2 + tr(s1) + tr(s2) - 2 tr(sqrt(s1 s2))`.
pub fn frechet_distance(
    mu1: &DVector<f64>,
    sigma1: &DMatrix<f64>,
    mu2: &DVector<f64>,
    sigma2: &DMatrix<f64>,
) -> f64 {
    let diff = mu1 - mu2;
    let sqrt1 = symmetric_sqrt(sigma1);
    let inner = &sqrt1 * sigma2 * &sqrt1;
    let inner = (&inner + inner.transpose()) * 0.5;
    let tr_covmean: f64 = inner
        .symmetric_eigen()
        .eigenvalues
        .iter()
        .map(|&ev| ev.max(0.0).sqrt())
        .sum();
    diff.dot(&diff) + sigma1.trace() + sigma2.trace() - 2.0 * tr_covmean
}

fn symmetric_sqrt(m: &DMatrix<f64>) -> DMatrix<f64> {
    let sym = (m + m.transpose()) * 0.5;
    let eig = sym.symmetric_eigen();
    let roots = eig.eigenvalues.map(|ev| ev.max(0.0).sqrt());
    &eig.eigenvectors * DMatrix::from_diagonal(&roots) * eig.eigenvectors.transpose()
}

/// Features computed offline, stored as a JSON object keyed by image path
/// (as passed to the evaluator) or by bare file name.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedFeatures {
    features: HashMap<String, Vec<f64>>,
}

impl PrecomputedFeatures {
    pub fn load(path: &Path) -> Result<Self, FidError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, FidError> {
        let features: HashMap<String, Vec<f64>> = serde_json::from_str(text)?;
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Full path first, then the bare name. Container outputs
    /// `<name>/output.mha` are keyed by `<name>` or its case id, never by
    /// the shared file name.
    fn lookup(&self, path: &Path) -> Option<&Vec<f64>> {
        if let Some(v) = self.features.get(&path.display().to_string()) {
            return Some(v);
        }
        let name = path.file_name()?.to_str()?;
        if name != OUTPUT_FILE_NAME {
            return self.features.get(name);
        }
        let parent = path.parent()?.file_name()?.to_str()?;
        self.features
            .get(parent)
            .or_else(|| case_id(path).and_then(|id| self.features.get(&id)))
    }
}

impl FeatureExtractor for PrecomputedFeatures {
    fn extract(&self, batch: &[PathBuf], _opts: &ExtractOptions) -> Result<Vec<Vec<f64>>, FidError> {
        batch
            .iter()
            .map(|p| {
                self.lookup(p)
                    .cloned()
                    .ok_or_else(|| FidError::MissingFeatures(p.display().to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/frechet.rs"]
mod tests;
