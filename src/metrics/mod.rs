use thiserror::Error;

pub mod contrast;
pub mod frechet;
pub mod kolmogorov;
pub mod ks;
pub mod roi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("{0} region is empty")]
    EmptyRegion(&'static str),
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (ddof = 0).
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

pub(crate) fn require_non_empty(values: &[f64], name: &'static str) -> Result<(), MetricError> {
    if values.is_empty() {
        return Err(MetricError::EmptyRegion(name));
    }
    Ok(())
}
