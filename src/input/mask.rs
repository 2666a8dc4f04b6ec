use std::path::Path;

use ndarray::Array2;

use crate::input::InputError;
use crate::input::frame::{channel, load_frame};

pub type Mask = Array2<u8>;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 128;
pub const IGNORED: u8 = 0;

/// Reads a mask as 8-bit grayscale. Color files are converted to luma.
pub fn load_mask(path: &Path) -> Result<Mask, InputError> {
    let is_mha = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mha"));
    if is_mha {
        let frame = load_frame(path)?;
        return Ok(channel(&frame, 0).mapv(|v| v.round().clamp(0.0, 255.0) as u8));
    }
    let gray = image::open(path)?.to_luma8();
    let (w, h) = gray.dimensions();
    Array2::from_shape_vec((h as usize, w as usize), gray.into_raw())
        .map_err(|e| InputError::InvalidInput(format!("bad mask shape: {e}")))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskCensus {
    pub foreground: usize,
    pub background: usize,
    pub ignored: usize,
    pub other: usize,
}

pub fn census(mask: &Mask) -> MaskCensus {
    let mut out = MaskCensus::default();
    for &v in mask.iter() {
        match v {
            FOREGROUND => out.foreground += 1,
            BACKGROUND => out.background += 1,
            IGNORED => out.ignored += 1,
            _ => out.other += 1,
        }
    }
    out
}
