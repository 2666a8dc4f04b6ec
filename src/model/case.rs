use serde::Serialize;

use crate::metrics::ks::KsPair;

/// Per-case metric values; `None` where the metric could not be computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CaseMetrics {
    pub cnr: Option<f64>,
    pub gcnr: Option<f64>,
    pub ks_a_statistic: Option<f64>,
    pub ks_a_p_value: Option<f64>,
    pub ks_b_statistic: Option<f64>,
    pub ks_b_p_value: Option<f64>,
}

impl CaseMetrics {
    pub fn with_ks(mut self, ks: &KsPair) -> Self {
        self.ks_a_statistic = ks.region_a.statistic;
        self.ks_a_p_value = ks.region_a.p_value;
        self.ks_b_statistic = ks.region_b.statistic;
        self.ks_b_p_value = ks.region_b.p_value;
        self
    }
}
