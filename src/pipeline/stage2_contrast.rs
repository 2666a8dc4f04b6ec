use crate::input::frame::Frame;
use crate::input::mask::Mask;
use crate::metrics::contrast::{cnr, gcnr};
use crate::metrics::roi::{RegionError, extract_regions};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContrastOutcome {
    pub cnr: Option<f64>,
    pub gcnr: Option<f64>,
}

/// CNR and gCNR of the dehazed image between the mask's foreground and
/// background. Both are absent when either region is empty.
pub fn run_stage2(case_id: &str, dehazed: &Frame, mask: &Mask) -> Result<ContrastOutcome, RegionError> {
    let regions = extract_regions(dehazed, mask)?;
    if !regions.both_non_empty() {
        tracing::warn!(
            "case {}: empty region (foreground {} px, background {} px); skipping CNR/gCNR",
            case_id,
            regions.foreground.len(),
            regions.background.len()
        );
        return Ok(ContrastOutcome::default());
    }
    let out = ContrastOutcome {
        cnr: cnr(&regions.foreground, &regions.background).ok(),
        gcnr: gcnr(&regions.foreground, &regions.background).ok(),
    };
    tracing::debug!("case {}: cnr={:?} gcnr={:?}", case_id, out.cnr, out.gcnr);
    Ok(out)
}
