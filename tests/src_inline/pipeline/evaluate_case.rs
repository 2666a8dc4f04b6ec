use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::GrayImage;
use ndarray::Array3;

use super::*;
use crate::input::frame::write_frame_mha;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("dehaze_eval_case_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn save_gray(path: &Path, w: u32, h: u32, pixels: Vec<u8>) {
    GrayImage::from_raw(w, h, pixels).unwrap().save(path).unwrap();
}

// 4x2: top row foreground, bottom row background.
const MASK: [u8; 8] = [255, 255, 255, 255, 128, 128, 128, 128];
const DEHAZED: [u8; 8] = [200, 210, 200, 210, 50, 60, 50, 60];

#[test]
fn test_full_case() {
    let dir = make_temp_dir();
    let prediction = dir.join("c1.png");
    let mask = dir.join("c1_mask.png");
    let hazy = dir.join("c1.mha");
    save_gray(&prediction, 4, 2, DEHAZED.to_vec());
    save_gray(&mask, 4, 2, MASK.to_vec());
    let hazy_frame =
        Array3::from_shape_vec((2, 4, 1), DEHAZED.iter().map(|&v| v as f32).collect()).unwrap();
    write_frame_mha(&hazy, &hazy_frame, true).unwrap();

    let metrics = evaluate_case(&Case {
        id: "c1".to_string(),
        prediction,
        hazy: Some(hazy),
        mask: Some(mask),
    })
    .unwrap();

    // means 205 and 55, population variances 25 each
    let cnr = metrics.cnr.unwrap();
    assert!((cnr - 150.0 / 50.0f64.sqrt()).abs() < 1e-9, "cnr = {cnr}");
    assert_eq!(metrics.gcnr, Some(1.0));
    assert_eq!(metrics.ks_a_statistic, Some(0.0));
    assert_eq!(metrics.ks_a_p_value, Some(1.0));
    assert_eq!(metrics.ks_b_statistic, Some(0.0));
    assert_eq!(metrics.ks_b_p_value, Some(1.0));
}

#[test]
fn test_case_without_mask_is_all_absent() {
    let dir = make_temp_dir();
    let metrics = evaluate_case(&Case {
        id: "c2".to_string(),
        prediction: dir.join("does_not_exist.png"),
        hazy: None,
        mask: None,
    })
    .unwrap();
    assert_eq!(metrics, CaseMetrics::default());
}

#[test]
fn test_missing_hazy_keeps_contrast() {
    let dir = make_temp_dir();
    let prediction = dir.join("c3.png");
    let mask = dir.join("c3_mask.png");
    save_gray(&prediction, 4, 2, DEHAZED.to_vec());
    save_gray(&mask, 4, 2, MASK.to_vec());
    let metrics = evaluate_case(&Case {
        id: "c3".to_string(),
        prediction,
        hazy: None,
        mask: Some(mask),
    })
    .unwrap();
    assert!(metrics.cnr.is_some());
    assert_eq!(metrics.ks_a_statistic, None);
    assert_eq!(metrics.ks_b_p_value, None);
}

#[test]
fn test_mask_shape_mismatch_names_case() {
    let dir = make_temp_dir();
    let prediction = dir.join("c4.png");
    let mask = dir.join("c4_mask.png");
    save_gray(&prediction, 4, 2, DEHAZED.to_vec());
    save_gray(&mask, 2, 2, vec![255, 255, 128, 128]);
    let err = evaluate_case(&Case {
        id: "c4".to_string(),
        prediction,
        hazy: None,
        mask: Some(mask),
    })
    .unwrap_err();
    match err {
        PipelineError::Region { case, .. } => assert_eq!(case, "c4"),
        other => panic!("unexpected error: {other}"),
    }
}
