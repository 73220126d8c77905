//! ターゲットリスト（`Source_name, RA, Dec`）

use crate::error::{PhotometryError, Result};
use photometry_common::TargetEntry;
use std::path::{Path, PathBuf};

/// 測光対象（天体名・座標・FITSディレクトリ）
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    pub directory: PathBuf,
}

impl Target {
    /// ディレクトリ単体で処理する場合（名前はディレクトリ名）
    pub fn from_directory(directory: &Path, ra: f64, dec: f64, name: Option<String>) -> Self {
        let name = name.unwrap_or_else(|| {
            directory
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "output".to_string())
        });
        Self {
            name,
            ra,
            dec,
            directory: directory.to_path_buf(),
        }
    }
}

/// ターゲットリストを読み込む。ディレクトリは `<star_dir>/<Source_name>`
pub fn load_targets(list_path: &Path, star_dir: &Path) -> Result<Vec<Target>> {
    let target_error = |reason: String| {
        PhotometryError::TargetList(format!("{}: {}", list_path.display(), reason))
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(list_path)
        .map_err(|e| target_error(e.to_string()))?;

    let mut targets = Vec::new();
    for entry in reader.deserialize::<TargetEntry>() {
        let entry = entry.map_err(|e| target_error(e.to_string()))?;
        targets.push(Target {
            directory: star_dir.join(&entry.name),
            name: entry.name,
            ra: entry.ra,
            dec: entry.dec,
        });
    }

    Ok(targets)
}
