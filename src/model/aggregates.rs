use serde::Serialize;

pub const KEY_FID: &str = "fid";
pub const KEY_CNR_MEAN: &str = "cnr_mean";
pub const KEY_GCNR_MEAN: &str = "gcnr_mean";
pub const KEY_KS_A_MEAN: &str = "ks_a_mean";
pub const KEY_KS_B_MEAN: &str = "ks_b_mean";
pub const KEY_DICE_MEAN: &str = "dice_mean";
pub const KEY_ASD_MEAN: &str = "asd_mean";

pub const AGGREGATE_KEYS: [&str; 7] = [
    KEY_FID,
    KEY_CNR_MEAN,
    KEY_GCNR_MEAN,
    KEY_KS_A_MEAN,
    KEY_KS_B_MEAN,
    KEY_DICE_MEAN,
    KEY_ASD_MEAN,
];

/// Summary values feeding the final score. `None` means not computed.
/// Field names are the published JSON keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub fid: Option<f64>,
    pub cnr_mean: Option<f64>,
    pub gcnr_mean: Option<f64>,
    pub ks_a_mean: Option<f64>,
    pub ks_b_mean: Option<f64>,
    pub dice_mean: Option<f64>,
    pub asd_mean: Option<f64>,
}

impl AggregateMetrics {
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            KEY_FID => self.fid,
            KEY_CNR_MEAN => self.cnr_mean,
            KEY_GCNR_MEAN => self.gcnr_mean,
            KEY_KS_A_MEAN => self.ks_a_mean,
            KEY_KS_B_MEAN => self.ks_b_mean,
            KEY_DICE_MEAN => self.dice_mean,
            KEY_ASD_MEAN => self.asd_mean,
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: Option<f64>) -> bool {
        let slot = match key {
            KEY_FID => &mut self.fid,
            KEY_CNR_MEAN => &mut self.cnr_mean,
            KEY_GCNR_MEAN => &mut self.gcnr_mean,
            KEY_KS_A_MEAN => &mut self.ks_a_mean,
            KEY_KS_B_MEAN => &mut self.ks_b_mean,
            KEY_DICE_MEAN => &mut self.dice_mean,
            KEY_ASD_MEAN => &mut self.asd_mean,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Mean of the present values; `None` if there are none. NaN propagates.
pub fn mean_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut sum = 0f64;
    let mut count = 0usize;
    for v in values.into_iter().flatten() {
        sum += v;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}
