use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::aggregates::AggregateMetrics;
use crate::model::case::CaseMetrics;
use crate::model::final_score::FinalScore;

pub mod json;
pub mod text;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contents of `metrics.json`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub case: BTreeMap<String, CaseMetrics>,
    pub aggregates: AggregateMetrics,
    pub final_score: f64,
}

#[derive(Debug, Clone)]
pub struct SummaryData {
    pub tool_name: String,
    pub tool_version: String,
    pub n_cases: usize,
    pub n_cases_with_mask: usize,
    pub n_cases_with_hazy: usize,
    pub fid_source: String,
    pub aggregates: AggregateMetrics,
    pub final_score: FinalScore,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

/// `NA` for absent values; NaN and infinities print as-is.
pub fn format_metric(v: Option<f64>) -> String {
    match v {
        Some(x) => format_f64_6(x),
        None => "NA".to_string(),
    }
}
