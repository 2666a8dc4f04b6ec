use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("dehaze_eval_stage1_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"x").unwrap();
}

fn layout() -> EvalPaths {
    let root = make_temp_dir();
    let paths = EvalPaths {
        predictions: root.join("pred"),
        hazy: root.join("hazy"),
        masks: root.join("masks"),
        ground_truth: root.join("gt"),
        out_dir: root.join("out"),
    };
    fs::create_dir_all(&paths.predictions).unwrap();
    fs::create_dir_all(&paths.hazy).unwrap();
    fs::create_dir_all(&paths.masks).unwrap();
    paths
}

#[test]
fn test_container_and_plain_predictions_are_paired() {
    let paths = layout();
    touch(&paths.predictions.join("case_01.tiff").join("output.mha"));
    touch(&paths.predictions.join("case_02.png"));
    touch(&paths.hazy.join("case_01.tiff"));
    touch(&paths.hazy.join("case_02.mha"));
    touch(&paths.masks.join("case_01.png"));

    let out = run_stage1(&paths).unwrap();
    assert_eq!(out.prediction_files.len(), 2);
    assert_eq!(out.cases.len(), 2);

    let c1 = &out.cases[0];
    assert_eq!(c1.id, "case_01");
    assert_eq!(
        c1.prediction,
        paths.predictions.join("case_01.tiff").join("output.mha")
    );
    assert_eq!(c1.hazy.as_deref(), Some(paths.hazy.join("case_01.tiff").as_path()));
    assert_eq!(c1.mask.as_deref(), Some(paths.masks.join("case_01.png").as_path()));

    let c2 = &out.cases[1];
    assert_eq!(c2.id, "case_02");
    assert_eq!(c2.hazy.as_deref(), Some(paths.hazy.join("case_02.mha").as_path()));
    assert_eq!(c2.mask, None);
}

#[test]
fn test_directories_without_output_are_ignored() {
    let paths = layout();
    fs::create_dir_all(paths.predictions.join("empty.tiff")).unwrap();
    touch(&paths.predictions.join("notes.txt"));
    let out = run_stage1(&paths).unwrap();
    assert!(out.cases.is_empty());
    assert!(out.prediction_files.is_empty());
}

#[test]
fn test_missing_masks_dir_is_error() {
    let paths = layout();
    fs::remove_dir_all(&paths.masks).unwrap();
    assert!(matches!(run_stage1(&paths), Err(InputError::MissingInput(_))));
}
