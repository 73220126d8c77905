//! テスト用のFITSフィクスチャ（ヘッダのみ）

#![allow(dead_code)]

use std::path::{Path, PathBuf};

const CARD_SIZE: usize = 80;
const BLOCK_SIZE: usize = 2880;

/// フィクスチャのヘッダ内容
#[derive(Debug, Clone)]
pub struct Frame {
    pub image_type: &'static str,
    pub julian_date: f64,
    pub exposure: Option<f64>,
    pub filter: Option<&'static str>,
    pub wcs: bool,
    pub object: Option<&'static str>,
}

impl Frame {
    pub fn light(julian_date: f64) -> Self {
        Self {
            image_type: "Light Frame",
            julian_date,
            exposure: Some(30.0),
            filter: Some("V"),
            wcs: true,
            object: None,
        }
    }

    pub fn dark(julian_date: f64, exposure: f64) -> Self {
        Self {
            image_type: "Dark Frame",
            julian_date,
            exposure: Some(exposure),
            filter: None,
            wcs: false,
            object: None,
        }
    }

    pub fn flat(julian_date: f64, filter: &'static str) -> Self {
        Self {
            image_type: "Flat Field",
            julian_date,
            exposure: Some(1.0),
            filter: Some(filter),
            wcs: false,
            object: None,
        }
    }

    pub fn without_wcs(mut self) -> Self {
        self.wcs = false;
        self
    }

    pub fn without_exposure(mut self) -> Self {
        self.exposure = None;
        self
    }

    pub fn with_object(mut self, object: &'static str) -> Self {
        self.object = Some(object);
        self
    }
}

fn card(text: &str) -> String {
    format!("{:<width$}", text, width = CARD_SIZE)
}

/// ヘッダのみのFITSファイルを書く
pub fn write_fits(dir: &Path, name: &str, frame: &Frame) -> PathBuf {
    let mut cards = vec![
        card("SIMPLE  =                    T / conforms to FITS standard"),
        card("BITPIX  =                   16"),
        card("NAXIS   =                    0"),
        card(&format!("JD      = {:>20}", frame.julian_date)),
        card(&format!("IMAGETYP= '{}'", frame.image_type)),
    ];
    if let Some(exposure) = frame.exposure {
        cards.push(card(&format!("EXPOSURE= {:>20}", exposure)));
    }
    if let Some(filter) = frame.filter {
        cards.push(card(&format!("FILTER  = '{}'", filter)));
    }
    if let Some(object) = frame.object {
        cards.push(card(&format!("OBJECT  = '{}'", object)));
    }
    if frame.wcs {
        cards.push(card("CD1_1   =         -0.000123456"));
    }
    cards.push(card("END"));

    let mut bytes = cards.concat().into_bytes();
    let padded = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    bytes.resize(padded, b' ');

    std::fs::create_dir_all(dir).expect("Failed to create fixture dir");
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}

/// `darks/` と `flats/` を持つ校正ディレクトリ
pub fn write_calibrations(root: &Path) -> PathBuf {
    let calibrations = root.join("calibrations");
    write_fits(&calibrations.join("darks"), "dark_30s.fits", &Frame::dark(2459000.5, 30.0));
    write_fits(&calibrations.join("flats"), "flat_v.fits", &Frame::flat(2459000.5, "V"));
    calibrations
}
