//! フレーム索引の型定義
//!
//! CLIとテストで共有される型:
//! - FrameRecord: 索引ファイル(index.csv)の1行
//! - FrameMetadata: FITSヘッダから抽出したサイエンスフレームの情報
//! - ResultRecord: 測光結果テーブルの1行

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// JD → MJD の変換オフセット
pub const MJD_OFFSET: f64 = 2_400_000.5;

/// ユリウス日を修正ユリウス日に変換
pub fn jd_to_mjd(julian_date: f64) -> f64 {
    julian_date - MJD_OFFSET
}

/// フレームの種別（IMAGETYP）
///
/// 未知の値は `Other` にそのまま保持し、書き戻し時も元の文字列を使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageType {
    Light,
    DarkFrame,
    FlatField,
    Other(String),
}

impl ImageType {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "light" | "light frame" => ImageType::Light,
            "dark" | "dark frame" => ImageType::DarkFrame,
            "flat" | "flat field" | "flat frame" => ImageType::FlatField,
            _ => ImageType::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageType::Light => "Light",
            ImageType::DarkFrame => "Dark Frame",
            ImageType::FlatField => "Flat Field",
            ImageType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ImageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ImageType::parse(&raw))
    }
}

/// 索引ファイルの1行
///
/// 列順は `MJD, IMAGETYP, EXPOSURE, FILEPATH, WCS, FILTER, RAN` で固定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(rename = "MJD")]
    pub modified_julian_date: f64,

    #[serde(rename = "IMAGETYP")]
    pub image_type: ImageType,

    #[serde(rename = "EXPOSURE")]
    pub exposure_seconds: f64,

    /// 索引ディレクトリからの相対パス（旧形式の絶対パスも可）
    #[serde(rename = "FILEPATH")]
    pub path: String,

    #[serde(rename = "WCS", with = "python_bool")]
    pub has_world_coordinate_system: bool,

    #[serde(rename = "FILTER")]
    pub filter: String,

    #[serde(rename = "RAN", with = "python_bool", default)]
    pub ran: bool,
}

impl FrameRecord {
    /// メタデータから新規行を作成（ran = false）
    pub fn from_metadata(path: impl Into<String>, meta: &FrameMetadata) -> Self {
        Self {
            modified_julian_date: meta.modified_julian_date,
            image_type: meta.image_type.clone(),
            exposure_seconds: meta.exposure_seconds,
            path: path.into(),
            has_world_coordinate_system: meta.has_world_coordinate_system,
            filter: meta.filter.clone(),
            ran: false,
        }
    }
}

/// FITSヘッダから抽出したフレーム情報
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetadata {
    pub julian_date: f64,
    pub modified_julian_date: f64,
    pub image_type: ImageType,
    pub exposure_seconds: f64,
    /// FILTERが無い場合は "None"
    pub filter: String,
    pub has_world_coordinate_system: bool,
    /// OBJECT（出力ファイル名の既定値に使う）
    pub object: Option<String>,
}

/// FILTERキーが無いときの値
pub const NO_FILTER: &str = "None";

/// 測光結果テーブルの1行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "MJD")]
    pub modified_julian_date: f64,

    #[serde(rename = "Magnitude")]
    pub magnitude: f64,

    #[serde(rename = "Error")]
    pub error_magnitude: f64,
}

/// 監視対象の天体（ターゲットリストの1行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry {
    #[serde(rename = "Source_name")]
    pub name: String,

    #[serde(rename = "RA")]
    pub ra: f64,

    #[serde(rename = "Dec")]
    pub dec: f64,
}

/// 既存の索引ファイルは `True`/`False` で真偽値を書いているため、その形式で読み書きする
mod python_bool {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "True" | "true" | "TRUE" | "1" | "T" => Ok(true),
            "False" | "false" | "FALSE" | "0" | "F" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean: {}", other))),
        }
    }
}
