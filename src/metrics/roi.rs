use thiserror::Error;

use crate::input::frame::Frame;
use crate::input::mask::{BACKGROUND, FOREGROUND, Mask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mask shape {mask_h}x{mask_w} does not match image shape {image_h}x{image_w}")]
pub struct RegionError {
    pub mask_h: usize,
    pub mask_w: usize,
    pub image_h: usize,
    pub image_w: usize,
}

/// Pixel values selected by a ternary mask. Every channel of a selected pixel
/// is kept, in row-major order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Regions {
    pub foreground: Vec<f64>,
    pub background: Vec<f64>,
}

impl Regions {
    pub fn both_non_empty(&self) -> bool {
        !self.foreground.is_empty() && !self.background.is_empty()
    }
}

pub fn check_shape(image: &Frame, mask: &Mask) -> Result<(), RegionError> {
    let (image_h, image_w, _) = image.dim();
    let (mask_h, mask_w) = mask.dim();
    if (image_h, image_w) != (mask_h, mask_w) {
        return Err(RegionError {
            mask_h,
            mask_w,
            image_h,
            image_w,
        });
    }
    Ok(())
}

pub fn extract_regions(image: &Frame, mask: &Mask) -> Result<Regions, RegionError> {
    check_shape(image, mask)?;
    let channels = image.dim().2;
    let mut out = Regions::default();
    for ((y, x), &m) in mask.indexed_iter() {
        let target = match m {
            FOREGROUND => &mut out.foreground,
            BACKGROUND => &mut out.background,
            _ => continue,
        };
        for c in 0..channels {
            target.push(image[[y, x, c]] as f64);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/roi.rs"]
mod tests;
