use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{IMAGE_EXTENSIONS, InputError, case_id, has_extension, index_by_case, list_files};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("dehaze_eval_input_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn touch(path: &Path) {
    fs::write(path, b"x").unwrap();
}

#[test]
fn test_has_extension_is_case_insensitive() {
    assert!(has_extension(Path::new("a/b.PNG"), IMAGE_EXTENSIONS));
    assert!(has_extension(Path::new("a/b.tif"), IMAGE_EXTENSIONS));
    assert!(!has_extension(Path::new("a/b.jpg"), IMAGE_EXTENSIONS));
    assert!(!has_extension(Path::new("a/b"), IMAGE_EXTENSIONS));
}

#[test]
fn test_case_id_plain_and_container_layout() {
    assert_eq!(case_id(Path::new("/x/case_01.png")).as_deref(), Some("case_01"));
    assert_eq!(
        case_id(Path::new("/out/case_02.tiff/output.mha")).as_deref(),
        Some("case_02")
    );
    assert_eq!(case_id(Path::new("/x/case.v2.mha")).as_deref(), Some("case.v2"));
}

#[test]
fn test_list_files_filters_and_sorts() {
    let dir = make_temp_dir();
    touch(&dir.join("b.png"));
    touch(&dir.join("a.tiff"));
    touch(&dir.join("notes.txt"));
    fs::create_dir_all(dir.join("sub.png")).unwrap();

    let files = list_files(&dir, IMAGE_EXTENSIONS).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.tiff", "b.png"]);
}

#[test]
fn test_list_files_missing_dir() {
    let dir = make_temp_dir().join("does_not_exist");
    match list_files(&dir, IMAGE_EXTENSIONS) {
        Err(InputError::MissingInput(msg)) => assert!(msg.contains("does_not_exist")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_index_by_case_keeps_first_duplicate() {
    let dir = make_temp_dir();
    touch(&dir.join("case_01.mha"));
    touch(&dir.join("case_01.png"));
    touch(&dir.join("case_02.png"));
    let index = index_by_case(&dir).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index["case_01"], dir.join("case_01.mha"));
    assert_eq!(index["case_02"], dir.join("case_02.png"));
}
