use std::path::Path;

use image::DynamicImage;
use ndarray::{Array3, s};

use crate::input::InputError;
use crate::input::metaimage::{ElementType, MetaImage, read_metaimage, write_metaimage};

/// Height x width x channel intensity array.
pub type Frame = Array3<f32>;

pub fn load_frame(path: &Path) -> Result<Frame, InputError> {
    let is_mha = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mha"));
    if is_mha {
        let meta = read_metaimage(path)?;
        return metaimage_to_frame(meta);
    }
    let img = image::open(path)?;
    dynamic_to_frame(img)
}

/// Keeps raw intensity values; alpha channels are dropped.
pub fn dynamic_to_frame(img: DynamicImage) -> Result<Frame, InputError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    match img {
        DynamicImage::ImageLuma8(buf) => from_raw(h, w, 1, widen(buf.into_raw())),
        DynamicImage::ImageLuma16(buf) => from_raw(h, w, 1, widen(buf.into_raw())),
        DynamicImage::ImageLumaA8(buf) => from_raw(h, w, 1, strip_alpha(widen(buf.into_raw()), 2)),
        DynamicImage::ImageLumaA16(buf) => {
            from_raw(h, w, 1, strip_alpha(widen(buf.into_raw()), 2))
        }
        DynamicImage::ImageRgb8(buf) => from_raw(h, w, 3, widen(buf.into_raw())),
        DynamicImage::ImageRgb16(buf) => from_raw(h, w, 3, widen(buf.into_raw())),
        DynamicImage::ImageRgb32F(buf) => from_raw(h, w, 3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => from_raw(h, w, 3, strip_alpha(widen(buf.into_raw()), 4)),
        DynamicImage::ImageRgba16(buf) => {
            from_raw(h, w, 3, strip_alpha(widen(buf.into_raw()), 4))
        }
        DynamicImage::ImageRgba32F(buf) => from_raw(h, w, 3, strip_alpha(buf.into_raw(), 4)),
        other => from_raw(h, w, 3, other.to_rgb32f().into_raw()),
    }
}

fn widen<T: Into<f32>>(values: Vec<T>) -> Vec<f32> {
    values.into_iter().map(Into::into).collect()
}

fn strip_alpha(values: Vec<f32>, stride: usize) -> Vec<f32> {
    values
        .chunks_exact(stride)
        .flat_map(|p| p[..stride - 1].iter().copied())
        .collect()
}

fn from_raw(h: usize, w: usize, c: usize, data: Vec<f32>) -> Result<Frame, InputError> {
    Array3::from_shape_vec((h, w, c), data)
        .map_err(|e| InputError::InvalidInput(format!("decoded image does not fit {h}x{w}x{c}: {e}")))
}

/// 3D volumes collapse to their middle slice along the first axis; 2D images
/// gain a channel axis of length `channels`.
pub fn metaimage_to_frame(meta: MetaImage) -> Result<Frame, InputError> {
    let c = meta.channels.max(1);
    match meta.dims.as_slice() {
        &[h, w] => Array3::from_shape_vec((h, w, c), meta.data)
            .map_err(|e| InputError::InvalidInput(format!("bad 2D MetaImage shape: {e}"))),
        &[d, h, w] => {
            if d == 0 {
                return Err(InputError::InvalidInput("empty volume".to_string()));
            }
            let plane = h.checked_mul(w).and_then(|n| n.checked_mul(c));
            let total = plane.and_then(|p| p.checked_mul(d));
            let (Some(plane), Some(total)) = (plane, total) else {
                return Err(InputError::InvalidInput(format!(
                    "volume shape {d}x{h}x{w}x{c} overflows"
                )));
            };
            if meta.data.len() != total {
                return Err(InputError::InvalidInput(format!(
                    "volume has {} elements, expected {}",
                    meta.data.len(),
                    total
                )));
            }
            let mid = d / 2;
            let slice = meta.data[mid * plane..(mid + 1) * plane].to_vec();
            Array3::from_shape_vec((h, w, c), slice)
                .map_err(|e| InputError::InvalidInput(format!("bad 3D MetaImage shape: {e}")))
        }
        dims => Err(InputError::InvalidInput(format!(
            "unsupported MetaImage dimensionality {}",
            dims.len()
        ))),
    }
}

pub fn frame_to_metaimage(frame: &Frame) -> MetaImage {
    let (h, w, c) = frame.dim();
    let data: Vec<f32> = frame.iter().copied().collect();
    MetaImage {
        dims: vec![h, w],
        channels: c,
        element_type: ElementType::narrowest_for(&data),
        data,
    }
}

pub fn write_frame_mha(path: &Path, frame: &Frame, compress: bool) -> Result<(), InputError> {
    write_metaimage(path, &frame_to_metaimage(frame), compress)
}

pub fn channel(frame: &Frame, idx: usize) -> ndarray::Array2<f32> {
    frame.slice(s![.., .., idx]).to_owned()
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/frame.rs"]
mod tests;
