use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{GrayImage, ImageBuffer, Luma, Rgba};

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("dehaze_eval_frame_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_volume_takes_middle_slice() {
    // 3 slices of 2x2, slice k filled with k.
    let mut data = Vec::new();
    for k in 0..3 {
        data.extend(std::iter::repeat(k as f32).take(4));
    }
    let meta = MetaImage {
        dims: vec![3, 2, 2],
        channels: 1,
        element_type: ElementType::UChar,
        data,
    };
    let frame = metaimage_to_frame(meta).unwrap();
    assert_eq!(frame.dim(), (2, 2, 1));
    assert!(frame.iter().all(|&v| v == 1.0));
}

#[test]
fn test_even_depth_uses_upper_middle() {
    let mut data = Vec::new();
    for k in 0..4 {
        data.push(k as f32);
    }
    let meta = MetaImage {
        dims: vec![4, 1, 1],
        channels: 1,
        element_type: ElementType::UChar,
        data,
    };
    let frame = metaimage_to_frame(meta).unwrap();
    assert_eq!(frame[[0, 0, 0]], 2.0);
}

#[test]
fn test_2d_gains_channel_axis() {
    let meta = MetaImage {
        dims: vec![2, 3],
        channels: 1,
        element_type: ElementType::UChar,
        data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    };
    let frame = metaimage_to_frame(meta).unwrap();
    assert_eq!(frame.dim(), (2, 3, 1));
    assert_eq!(frame[[1, 0, 0]], 4.0);
}

#[test]
fn test_png_keeps_raw_values() {
    let dir = make_temp_dir();
    let path = dir.join("g.png");
    let mut img = GrayImage::new(3, 2);
    img.put_pixel(2, 1, Luma([200]));
    img.save(&path).unwrap();

    let frame = load_frame(&path).unwrap();
    assert_eq!(frame.dim(), (2, 3, 1));
    assert_eq!(frame[[1, 2, 0]], 200.0);
    assert_eq!(frame[[0, 0, 0]], 0.0);
}

#[test]
fn test_mha_roundtrip_through_files() {
    let dir = make_temp_dir();
    let path = dir.join("f.mha");
    let frame = Frame::from_shape_vec((2, 2, 1), vec![0.0, 64.0, 128.0, 255.0]).unwrap();
    write_frame_mha(&path, &frame, true).unwrap();
    let back = load_frame(&path).unwrap();
    assert_eq!(back, frame);
}

#[test]
fn test_rgba16_keeps_raw_values_and_drops_alpha() {
    let mut img: ImageBuffer<Rgba<u16>, Vec<u16>> = ImageBuffer::new(2, 1);
    img.put_pixel(1, 0, Rgba([1000, 2000, 65535, 7]));
    let frame = dynamic_to_frame(DynamicImage::ImageRgba16(img)).unwrap();
    assert_eq!(frame.dim(), (1, 2, 3));
    assert_eq!(frame[[0, 1, 0]], 1000.0);
    assert_eq!(frame[[0, 1, 2]], 65535.0);
}

#[test]
fn test_volume_shape_overflow_is_invalid_input() {
    let meta = MetaImage {
        dims: vec![usize::MAX, 2, 2],
        channels: 1,
        element_type: ElementType::UChar,
        data: vec![0.0; 4],
    };
    assert!(matches!(
        metaimage_to_frame(meta),
        Err(InputError::InvalidInput(_))
    ));
}

#[test]
fn test_volume_with_wrong_length_is_rejected() {
    let meta = MetaImage {
        dims: vec![3, 2, 2],
        channels: 1,
        element_type: ElementType::UChar,
        data: vec![0.0; 11],
    };
    assert!(metaimage_to_frame(meta).is_err());
}
