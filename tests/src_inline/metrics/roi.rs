use ndarray::{Array2, Array3};

use super::*;

#[test]
fn test_extracts_foreground_and_background() {
    let image = Array3::from_shape_vec((2, 3, 1), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let mask = Array2::from_shape_vec((2, 3), vec![255, 128, 0, 128, 255, 255]).unwrap();
    let r = extract_regions(&image, &mask).unwrap();
    assert_eq!(r.foreground, vec![1.0, 5.0, 6.0]);
    assert_eq!(r.background, vec![2.0, 4.0]);
}

#[test]
fn test_inadmissible_mask_values_select_nothing() {
    let image = Array3::from_elem((2, 2, 1), 9.0f32);
    let mask = Array2::from_shape_vec((2, 2), vec![1, 127, 129, 254]).unwrap();
    let r = extract_regions(&image, &mask).unwrap();
    assert!(r.foreground.is_empty());
    assert!(r.background.is_empty());
    assert!(!r.both_non_empty());
}

#[test]
fn test_multichannel_pixels_keep_every_channel() {
    let image =
        Array3::from_shape_vec((1, 2, 2), vec![10.0, 11.0, 20.0, 21.0]).unwrap();
    let mask = Array2::from_shape_vec((1, 2), vec![128, 255]).unwrap();
    let r = extract_regions(&image, &mask).unwrap();
    assert_eq!(r.foreground, vec![20.0, 21.0]);
    assert_eq!(r.background, vec![10.0, 11.0]);
}

#[test]
fn test_shape_mismatch() {
    let image = Array3::from_elem((2, 2, 1), 0.0f32);
    let mask = Array2::from_elem((2, 3), 255u8);
    let err = extract_regions(&image, &mask).unwrap_err();
    assert_eq!(
        err,
        RegionError {
            mask_h: 2,
            mask_w: 3,
            image_h: 2,
            image_w: 2
        }
    );
}
