use thiserror::Error;

use crate::input::InputError;
use crate::input::frame::load_frame;
use crate::input::mask::{census, load_mask};
use crate::metrics::frechet::FidError;
use crate::metrics::roi::RegionError;
use crate::model::case::CaseMetrics;
use crate::pipeline::stage1_cases::Case;
use crate::pipeline::stage2_contrast::run_stage2;
use crate::pipeline::stage3_ks::run_stage3;
use crate::report::ReportError;

pub mod stage1_cases;
pub mod stage2_contrast;
pub mod stage3_ks;
pub mod stage4_fid;
pub mod stage5_aggregate;
pub mod stage6_report;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("case {case}: {source}")]
    Region {
        case: String,
        #[source]
        source: RegionError,
    },
    #[error("FID: {0}")]
    Fid(#[from] FidError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Loads one case and runs the contrast and KS stages on it. A case without
/// a mask has every metric absent.
pub fn evaluate_case(case: &Case) -> Result<CaseMetrics, PipelineError> {
    let Some(mask_path) = &case.mask else {
        return Ok(CaseMetrics::default());
    };
    let mask = load_mask(mask_path)?;
    let counts = census(&mask);
    if counts.other > 0 {
        tracing::warn!(
            "case {}: {} mask pixels outside {{0, 128, 255}} are ignored",
            case.id,
            counts.other
        );
    }

    let dehazed = load_frame(&case.prediction)?;
    let hazy = match &case.hazy {
        Some(path) => Some(load_frame(path)?),
        None => None,
    };

    let region_err = |source| PipelineError::Region {
        case: case.id.clone(),
        source,
    };
    let contrast = run_stage2(&case.id, &dehazed, &mask).map_err(region_err)?;
    let ks = run_stage3(&case.id, hazy.as_ref(), &dehazed, &mask).map_err(region_err)?;

    Ok(CaseMetrics {
        cnr: contrast.cnr,
        gcnr: contrast.gcnr,
        ..Default::default()
    }
    .with_ks(&ks))
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/evaluate_case.rs"]
mod tests;
