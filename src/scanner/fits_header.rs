//! FITSヘッダ読み込み
//!
//! プライマリHDUのキーだけを fitsio で読む。画素データは読まない。

use crate::error::{PhotometryError, Result};
use fitsio::hdu::FitsHdu;
use fitsio::FitsFile;
use photometry_common::{jd_to_mjd, FrameMetadata, ImageType, NO_FILTER};
use std::path::Path;

/// WCSの存在判定に使うキー（CD行列）
pub const WCS_KEY: &str = "CD1_1";

/// 露光時間のキー（先に見つかった方）
const EXPOSURE_KEYS: &[&str] = &["EXPOSURE", "EXPTIME"];

/// ヘッダのキー参照
pub trait HeaderKeys {
    fn number(&mut self, key: &str) -> Option<f64>;
    fn text(&mut self, key: &str) -> Option<String>;

    /// 文字列値、数値で書かれていればその文字列表現
    fn text_or_number(&mut self, key: &str) -> Option<String> {
        self.text(key)
            .or_else(|| self.number(key).map(|v| v.to_string()))
            .filter(|s| !s.is_empty())
    }
}

/// 開いたFITSファイルのプライマリHDU
pub struct PrimaryHeader {
    fptr: FitsFile,
    hdu: FitsHdu,
}

impl PrimaryHeader {
    /// 開けない・FITSでない・消えたファイルは `FitsHeader`（フレーム単位のエラー）
    pub fn open(path: &Path) -> Result<Self> {
        let header_error = |e: fitsio::errors::Error| PhotometryError::FitsHeader {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let mut fptr = FitsFile::open(path).map_err(header_error)?;
        let hdu = fptr.primary_hdu().map_err(header_error)?;
        Ok(Self { fptr, hdu })
    }
}

impl HeaderKeys for PrimaryHeader {
    fn number(&mut self, key: &str) -> Option<f64> {
        self.hdu.read_key::<f64>(&mut self.fptr, key).ok()
    }

    fn text(&mut self, key: &str) -> Option<String> {
        self.hdu
            .read_key::<String>(&mut self.fptr, key)
            .ok()
            .map(|s| s.trim().to_string())
    }
}

/// 索引と照合に必要なメタデータを抽出
///
/// JD / EXPOSURE / IMAGETYP が無ければ `MetadataMissing`。FILTERが無ければ "None"。
pub fn extract_metadata(path: &Path) -> Result<FrameMetadata> {
    let mut header = PrimaryHeader::open(path)?;
    metadata_from_header(path, &mut header)
}

pub fn metadata_from_header(path: &Path, header: &mut impl HeaderKeys) -> Result<FrameMetadata> {
    let missing = |key: &str| PhotometryError::MetadataMissing {
        path: path.display().to_string(),
        key: key.to_string(),
    };

    let julian_date = header.number("JD").ok_or_else(|| missing("JD"))?;
    let exposure_seconds = EXPOSURE_KEYS
        .iter()
        .find_map(|key| header.number(key))
        .ok_or_else(|| missing("EXPOSURE"))?;
    let image_type = header
        .text_or_number("IMAGETYP")
        .map(|raw| ImageType::parse(&raw))
        .ok_or_else(|| missing("IMAGETYP"))?;
    let filter = header
        .text_or_number("FILTER")
        .unwrap_or_else(|| NO_FILTER.to_string());
    let object = header.text("OBJECT").filter(|s| !s.is_empty());

    Ok(FrameMetadata {
        julian_date,
        modified_julian_date: jd_to_mjd(julian_date),
        image_type,
        exposure_seconds,
        filter,
        has_world_coordinate_system: header.number(WCS_KEY).is_some(),
        object,
    })
}
