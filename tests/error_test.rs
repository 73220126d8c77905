//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

mod common;

use common::{write_fits, Frame};
use photometry_common::{CalibrationKind, Error};
use photometry_rust::error::PhotometryError;
use photometry_rust::scanner;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(PhotometryError::FolderNotFound(_))));
}

/// FITSのないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_frames() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("index.csv"), "MJD\n").unwrap();

    let result = scanner::scan_folder(dir.path());
    assert!(result.unwrap().is_empty());
}

/// 拡張子の大文字小文字は区別しない
#[test]
fn test_scan_folder_extension_case() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fits(dir.path(), "B.FITS", &Frame::light(2459000.5));
    write_fits(dir.path(), "a.fit", &Frame::light(2459000.5));

    let files = scanner::scan_folder(dir.path()).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["B.FITS", "a.fit"]);
}

/// 必須キーが無いヘッダ
#[test]
fn test_missing_exposure_key() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_fits(dir.path(), "no_exposure.fits", &Frame::light(2459000.5).without_exposure());

    let err = scanner::extract_metadata(&path).unwrap_err();
    assert!(err.is_frame_level());
    match err {
        PhotometryError::MetadataMissing { key, .. } => assert_eq!(key, "EXPOSURE"),
        other => panic!("unexpected error: {:?}", other),
    }
}

/// フレーム単位でスキップするエラーの分類
#[test]
fn test_frame_level_errors() {
    let frame_level = vec![
        PhotometryError::MetadataMissing { path: "a.fits".into(), key: "JD".into() },
        PhotometryError::PhotometryFailure { path: "a.fits".into(), reason: "no stars".into() },
        PhotometryError::PhotometryTimeout { path: "a.fits".into(), seconds: 600 },
        PhotometryError::Common(Error::NoCalibrationFound {
            kind: CalibrationKind::Flat,
            reason: "filter".into(),
        }),
    ];
    for err in &frame_level {
        assert!(err.is_frame_level(), "{:?}", err);
    }

    let fatal = vec![
        PhotometryError::FolderNotFound("star".into()),
        PhotometryError::IndexCorrupt { path: "index.csv".into(), reason: "bad".into() },
        PhotometryError::TargetList("list.csv".into()),
    ];
    for err in &fatal {
        assert!(!err.is_frame_level(), "{:?}", err);
    }
}

/// PhotometryErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        PhotometryError::Config("テスト設定エラー".to_string()),
        PhotometryError::FileNotFound("test.fits".to_string()),
        PhotometryError::IndexMissing("star/index.csv".to_string()),
        PhotometryError::Plot("描画エラー".to_string()),
        PhotometryError::Common(Error::PathNotIndexed("x.fits".to_string())),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }

    let timeout = PhotometryError::PhotometryTimeout { path: "a.fits".into(), seconds: 600 };
    assert!(format!("{}", timeout).contains("600"));
}
