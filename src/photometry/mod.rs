//! 測光エンジン連携
//!
//! 測光計算・位置天文解析は外部エンジンが担当する。
//! ここでは呼び出し口（trait）と入出力の型、参照星ファイルの保存だけを持つ。

mod command;

pub use command::CommandPhotometryEngine;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// エンジンへ渡す設定（プロセス全体の状態にはしない）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    pub use_bias: bool,
    pub console_print: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub astrometry_api_key: Option<String>,
    pub astrometry_timeout_seconds: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            use_bias: false,
            console_print: false,
            astrometry_api_key: None,
            astrometry_timeout_seconds: 100,
        }
    }
}

/// 1フレーム分の測光要求
#[derive(Debug, Clone)]
pub struct PhotometryRequest {
    pub ra: f64,
    pub dec: f64,
    pub science: PathBuf,
    pub dark: PathBuf,
    /// バイアスは使わないため常に空
    pub bias: PathBuf,
    pub flat: PathBuf,
}

impl PhotometryRequest {
    pub fn new(ra: f64, dec: f64, science: &Path, dark: &Path, flat: &Path) -> Self {
        Self {
            ra,
            dec,
            science: science.to_path_buf(),
            dark: dark.to_path_buf(),
            bias: PathBuf::new(),
            flat: flat.to_path_buf(),
        }
    }
}

/// 参照星（エンジン出力の1行）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceStar {
    pub ra: f64,
    pub dec: f64,
    pub magnitude: f64,
    pub error: f64,
}

/// エンジン出力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotometryOutput {
    pub magnitude: f64,
    pub error: f64,
    #[serde(default)]
    pub reference_stars: Vec<ReferenceStar>,
}

/// 測光エンジン
///
/// 参照星が解決できない等の失敗は `PhotometryFailure` で返す。
#[allow(async_fn_in_trait)]
pub trait PhotometryEngine {
    async fn run(&self, request: &PhotometryRequest) -> Result<PhotometryOutput>;
}

/// 参照星を `<dir>/<round(JD)>.csv` に保存
pub fn write_reference_stars(
    directory: &Path,
    julian_date: f64,
    stars: &[ReferenceStar],
) -> Result<PathBuf> {
    std::fs::create_dir_all(directory)?;
    let path = directory.join(format!("{}.csv", julian_date.round() as i64));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["RA", "Dec", "Magnitude", "Error"])?;
    for star in stars {
        writer.write_record([
            star.ra.to_string(),
            star.dec.to_string(),
            star.magnitude.to_string(),
            star.error.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}
