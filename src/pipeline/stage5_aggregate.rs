use std::collections::BTreeMap;

use crate::model::aggregates::{AggregateMetrics, mean_present};
use crate::model::case::CaseMetrics;
use crate::model::final_score::{FinalScore, compute_final_score};

#[derive(Debug, Clone)]
pub struct Stage5Inputs<'a> {
    pub cases: &'a BTreeMap<String, CaseMetrics>,
    pub fid: Option<f64>,
    pub dice_mean: Option<f64>,
    pub asd_mean: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Stage5Output {
    pub aggregates: AggregateMetrics,
    pub final_score: FinalScore,
}

/// KS^A is the mean foreground statistic, KS^B the mean background statistic.
pub fn run_stage5(inputs: &Stage5Inputs<'_>) -> Stage5Output {
    let cases = inputs.cases.values();
    let aggregates = AggregateMetrics {
        fid: inputs.fid,
        cnr_mean: mean_present(cases.clone().map(|c| c.cnr)),
        gcnr_mean: mean_present(cases.clone().map(|c| c.gcnr)),
        ks_a_mean: mean_present(cases.clone().map(|c| c.ks_a_statistic)),
        ks_b_mean: mean_present(cases.map(|c| c.ks_b_statistic)),
        dice_mean: inputs.dice_mean,
        asd_mean: inputs.asd_mean,
    };
    let final_score = compute_final_score(&aggregates);
    tracing::info!(
        "final score {:.4} (group1 {:.4}, group2 {:.4}, group3 {:.4})",
        final_score.value,
        final_score.group1,
        final_score.group2,
        final_score.group3
    );
    Stage5Output {
        aggregates,
        final_score,
    }
}
