use crate::input::frame::Frame;
use crate::input::mask::Mask;
use crate::metrics::ks::{KsPair, ks_region_pair};
use crate::metrics::roi::RegionError;

/// Hazy vs dehazed KS test per region. A missing hazy image leaves both
/// regions absent.
pub fn run_stage3(
    case_id: &str,
    hazy: Option<&Frame>,
    dehazed: &Frame,
    mask: &Mask,
) -> Result<KsPair, RegionError> {
    let Some(hazy) = hazy else {
        return Ok(KsPair::default());
    };
    let pair = ks_region_pair(hazy, dehazed, mask)?;
    if pair.region_a.is_absent() {
        tracing::debug!("case {}: region A empty; KS absent", case_id);
    }
    if pair.region_b.is_absent() {
        tracing::debug!("case {}: region B empty; KS absent", case_id);
    }
    Ok(pair)
}
