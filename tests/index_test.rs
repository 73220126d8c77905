//! 索引テスト
//!
//! 作成・増分更新・RANの保持・保存の原子性を検証

mod common;

use common::{write_fits, Frame};
use photometry_common::{is_ran, mark_ran, ImageType};
use photometry_rust::index::{self, BuildMode};
use tempfile::tempdir;

/// 新規作成でヘッダ内容が索引に入る
#[test]
fn test_build_clean_reads_headers() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fits(dir.path(), "a.fits", &Frame::light(2459000.75));
    write_fits(dir.path(), "b.fts", &Frame::dark(2459001.5, 60.0));
    std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

    let frames = index::build(dir.path(), BuildMode::Clean).expect("索引作成失敗");
    assert_eq!(frames.len(), 2);

    let rows = frames.records();
    assert_eq!(rows[0].path, "a.fits");
    assert_eq!(rows[0].modified_julian_date, 59000.25);
    assert_eq!(rows[0].image_type, ImageType::Light);
    assert_eq!(rows[0].filter, "V");
    assert!(rows[0].has_world_coordinate_system);
    assert_eq!(rows[1].image_type, ImageType::DarkFrame);
    assert_eq!(rows[1].exposure_seconds, 60.0);
    assert_eq!(rows[1].filter, "None");
    assert!(rows.iter().all(|r| !r.ran));
}

/// 変化が無ければ増分更新しても同じ内容
#[test]
fn test_incremental_is_idempotent() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fits(dir.path(), "a.fits", &Frame::light(2459000.5));
    write_fits(dir.path(), "b.fits", &Frame::light(2459001.5));

    index::build(dir.path(), BuildMode::Clean).unwrap();
    let first = std::fs::read_to_string(index::index_path(dir.path())).unwrap();

    index::build(dir.path(), BuildMode::Incremental).unwrap();
    let second = std::fs::read_to_string(index::index_path(dir.path())).unwrap();

    assert_eq!(first, second);
}

/// 増分更新は新しいファイルだけ追加し、RANを保持する
#[test]
fn test_incremental_keeps_ran_and_appends() {
    let dir = tempdir().expect("Failed to create temp dir");
    let a = write_fits(dir.path(), "a.fits", &Frame::light(2459000.5));

    let frames = index::build(dir.path(), BuildMode::Clean).unwrap();
    let frames = mark_ran(frames, &a).unwrap();
    index::save(&frames).unwrap();

    let c = write_fits(dir.path(), "c.fits", &Frame::light(2459002.5));
    let frames = index::build(dir.path(), BuildMode::Incremental).unwrap();

    assert_eq!(frames.len(), 2);
    assert!(is_ran(&frames, &a).unwrap());
    assert!(!is_ran(&frames, &c).unwrap());
    assert_eq!(frames.records()[1].path, "c.fits");
}

/// clean は RAN をすべてリセットする
#[test]
fn test_clean_resets_ran() {
    let dir = tempdir().expect("Failed to create temp dir");
    let a = write_fits(dir.path(), "a.fits", &Frame::light(2459000.5));

    let frames = mark_ran(index::build(dir.path(), BuildMode::Clean).unwrap(), &a).unwrap();
    index::save(&frames).unwrap();

    let rebuilt = index::build(dir.path(), BuildMode::Clean).unwrap();
    assert!(!is_ran(&rebuilt, &a).unwrap());
}

/// 読めないファイルは除外して続行
#[test]
fn test_build_skips_unreadable_frames() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fits(dir.path(), "good.fits", &Frame::light(2459000.5));
    std::fs::write(dir.path().join("broken.fits"), b"this is not a FITS file").unwrap();

    let frames = index::build(dir.path(), BuildMode::Clean).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames.records()[0].path, "good.fits");
}

/// 保存後に一時ファイルが残らない
#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fits(dir.path(), "a.fits", &Frame::light(2459000.5));
    index::build(dir.path(), BuildMode::Clean).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{:?}", names);
    assert!(names.contains(&"index.csv".to_string()));
}

/// 同じファイルを別の書き方で照会しても同じ行になる
#[test]
fn test_path_spellings_hit_same_row() {
    let dir = tempdir().expect("Failed to create temp dir");
    let sub = dir.path().join("star");
    let a = write_fits(&sub, "a.fits", &Frame::light(2459000.5));

    let frames = mark_ran(index::build(&sub, BuildMode::Clean).unwrap(), &a).unwrap();

    let dotted = sub.join("..").join("star").join(".").join("a.fits");
    assert!(is_ran(&frames, &dotted).unwrap());
    assert!(is_ran(&frames, &a.canonicalize().unwrap()).unwrap());
}

/// 旧形式（行番号列・True/False）の索引を読み、増分更新できる
#[test]
fn test_legacy_index_is_loaded() {
    let dir = tempdir().expect("Failed to create temp dir");
    let a = write_fits(dir.path(), "a.fits", &Frame::light(2459000.5));
    std::fs::write(
        index::index_path(dir.path()),
        format!(
            ",MJD,IMAGETYP,EXPOSURE,FILEPATH,WCS,FILTER,RAN\n0,59000.0,Light Frame,30.0,{},True,V,True\n",
            a.display()
        ),
    )
    .unwrap();

    let frames = index::ensure(dir.path()).unwrap();
    assert_eq!(frames.len(), 1);
    assert!(is_ran(&frames, &a).unwrap());
}

/// 壊れた索引は作り直さずエラー
#[test]
fn test_corrupt_index_is_not_rebuilt() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fits(dir.path(), "a.fits", &Frame::light(2459000.5));
    std::fs::write(
        index::index_path(dir.path()),
        "MJD,IMAGETYP,EXPOSURE,FILEPATH,WCS,FILTER,RAN\nxx,Light,1,a.fits,True,V,False\n",
    )
    .unwrap();

    assert!(index::ensure(dir.path()).is_err());
}
