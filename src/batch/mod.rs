//! 一括測光
//!
//! ## 処理フロー（ターゲットごと）
//! 1. 索引の用意（無ければ clean、あれば incremental で新規ファイルを追加）
//! 2. 候補の選択（RAN=False、WCS必須モードではWCSありのみ）
//! 3. 候補ごとに校正フレーム解決 → 測光 → RAN更新・索引保存 → 結果追記
//! 4. 光度曲線の再生成
//!
//! フレーム単位の失敗はログを出してスキップし、残りの処理は続ける。
//! 索引の更新と結果の追記は1ターゲットにつき逐次（単一の書き手）。

pub mod targets;

pub use targets::{load_targets, Target};

use crate::calibration::CalibrationLibrary;
use crate::config::Config;
use crate::error::{PhotometryError, Result};
use crate::index;
use crate::photometry::{write_reference_stars, PhotometryEngine, PhotometryRequest};
use crate::plot;
use crate::results;
use crate::scanner::extract_metadata;
use indicatif::{ProgressBar, ProgressStyle};
use photometry_common::{mark_ran, FrameIndex, ResultRecord};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// 一括処理のオプション
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// WCSを持つフレームだけ処理する
    pub require_wcs: bool,
    /// RAN=True のフレームも再処理する
    pub run_all: bool,
    /// 進捗バーを表示
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            require_wcs: true,
            run_all: false,
            show_progress: false,
        }
    }
}

/// ターゲット1件の処理結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetReport {
    pub name: String,
    /// 索引の行数
    pub indexed: usize,
    /// 処理候補数
    pub candidates: usize,
    /// WCSが無いため見送った数
    pub deferred_no_wcs: usize,
    /// 処理済みのためスキップした数
    pub already_ran: usize,
    /// 測光エンジンを呼んだ数
    pub attempted: usize,
    pub succeeded: usize,
    /// 校正フレーム・メタデータ不足でスキップした数
    pub skipped_calibration: usize,
    /// エンジン失敗・タイムアウトの数
    pub failed: usize,
    pub plotted: bool,
}

/// 1ファイル測光のオプション
#[derive(Debug, Clone, Default)]
pub struct SingleRunOptions {
    /// 指定時は照合せずに使う
    pub dark: Option<PathBuf>,
    pub flat: Option<PathBuf>,
    /// 結果テーブルへ保存し、索引を更新する
    pub save: bool,
    /// 既定は `<output_dir>/<OBJECT>.csv`
    pub output_file: Option<PathBuf>,
}

pub struct BatchDriver<E> {
    engine: E,
    calibrations: CalibrationLibrary,
    output_dir: PathBuf,
    reference_star_dir: PathBuf,
    timeout: Duration,
}

impl<E: PhotometryEngine> BatchDriver<E> {
    pub fn new(
        engine: E,
        calibrations: CalibrationLibrary,
        output_dir: PathBuf,
        reference_star_dir: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            calibrations,
            output_dir,
            reference_star_dir,
            timeout,
        }
    }

    pub fn from_config(engine: E, config: &Config) -> Self {
        Self::new(
            engine,
            CalibrationLibrary::new(&config.calibration_path),
            config.output_dir.clone(),
            config.reference_star_dir.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// ターゲットの結果テーブル
    pub fn output_table_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", name))
    }

    /// ターゲットの光度曲線
    pub fn plot_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.png", name))
    }

    /// 索引のコピー先
    pub fn index_copy_path(&self, name: &str) -> PathBuf {
        self.output_dir.join("indexes").join(format!("{}_index.csv", name))
    }

    /// ターゲット1件を処理
    ///
    /// ディレクトリが読めない・出力が書けない場合はエラー（このターゲットのみ中断）。
    pub async fn process_target(&self, target: &Target, options: &BatchOptions) -> Result<TargetReport> {
        let mut report = TargetReport {
            name: target.name.clone(),
            ..Default::default()
        };

        // 1. 索引
        let mut index = index::ensure(&target.directory)?;
        report.indexed = index.len();

        // 2. 候補
        let candidates = select_candidates(&index, options, &mut report);
        info!(
            "{}: 候補 {}件 (索引 {}件, 処理済み {}件, WCS待ち {}件)",
            target.name,
            candidates.len(),
            report.indexed,
            report.already_ran,
            report.deferred_no_wcs
        );

        // 3. 測光
        let output_table = self.output_table_path(&target.name);
        let progress = progress_bar(candidates.len(), options.show_progress);

        for science in &candidates {
            progress.set_message(display_name(science));

            match self.photometer(target.ra, target.dec, science, None, None).await {
                Ok(record) => {
                    report.attempted += 1;
                    // RANを保存してから結果を追記する
                    index = self.record_ran(index, science)?;
                    results::append(&output_table, &record)?;
                    report.succeeded += 1;
                    info!(
                        "✔ {}: {:.3} ± {:.3}",
                        display_name(science),
                        record.magnitude,
                        record.error_magnitude
                    );
                }
                Err(e) => {
                    if !e.is_frame_level() {
                        progress.abandon();
                        return Err(e);
                    }
                    self.count_skip(&e, &mut report);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        // 4. 光度曲線・索引コピー
        self.finalize(target, &index, &output_table, &mut report);

        Ok(report)
    }

    /// ターゲットリストを順に処理。1件の失敗で他のターゲットは止めない
    pub async fn process_targets(
        &self,
        targets: &[Target],
        options: &BatchOptions,
    ) -> Vec<(String, Result<TargetReport>)> {
        let mut outcomes = Vec::new();

        for target in targets {
            if !target.directory.is_dir() {
                error!(
                    "{} が存在しません。{} の観測をスキップします",
                    target.directory.display(),
                    target.name
                );
                outcomes.push((
                    target.name.clone(),
                    Err(PhotometryError::FolderNotFound(target.directory.display().to_string())),
                ));
                continue;
            }

            info!("{}: 新しいデータの測光を開始します", target.name);
            let outcome = self.process_target(target, options).await;
            if let Err(e) = &outcome {
                error!("{}: 処理を中断しました: {}", target.name, e);
            }
            outcomes.push((target.name.clone(), outcome));
        }

        outcomes
    }

    /// 1ファイルを測光する
    ///
    /// `save` のときは結果テーブルへ追記し、索引のRANを更新する。
    pub async fn run_single(
        &self,
        ra: f64,
        dec: f64,
        science: &Path,
        options: &SingleRunOptions,
    ) -> Result<ResultRecord> {
        let directory = science
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // 索引作成後に追加されたファイルもここで索引に入れる
        let frames = index::ensure(directory)?;

        let record = self
            .photometer(ra, dec, science, options.dark.as_deref(), options.flat.as_deref())
            .await?;

        if options.save {
            let output_table = match &options.output_file {
                Some(path) => path.clone(),
                None => self.default_output_table(science),
            };
            self.record_ran(frames, science)?;
            results::append(&output_table, &record)?;
            info!("結果を保存しました: {}", output_table.display());
        }

        Ok(record)
    }

    /// OBJECTから出力テーブル名を決める（無ければ output.csv）
    fn default_output_table(&self, science: &Path) -> PathBuf {
        match extract_metadata(science).map(|m| m.object) {
            Ok(Some(object)) => self.output_table_path(&object),
            _ => {
                info!("OBJECTキーがありません。output.csv を使用します");
                self.output_dir.join("output.csv")
            }
        }
    }

    /// 校正フレーム解決 → 測光 → 参照星保存
    async fn photometer(
        &self,
        ra: f64,
        dec: f64,
        science: &Path,
        dark: Option<&Path>,
        flat: Option<&Path>,
    ) -> Result<ResultRecord> {
        let meta = extract_metadata(science)?;

        let dark = match dark {
            Some(path) => path.to_path_buf(),
            None => self.calibrations.find_dark(&meta)?,
        };
        info!("最も近いダーク: {}", dark.display());
        let flat = match flat {
            Some(path) => path.to_path_buf(),
            None => self.calibrations.find_flat(&meta)?,
        };
        info!("最も近いフラット: {}", flat.display());

        if !meta.has_world_coordinate_system {
            info!(
                "{} はWCSが無いため位置天文解析を行います（数分かかる場合があります）",
                science.display()
            );
        }

        let request = PhotometryRequest::new(ra, dec, science, &dark, &flat);
        let output = match tokio::time::timeout(self.timeout, self.engine.run(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(PhotometryError::PhotometryTimeout {
                    path: science.display().to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        write_reference_stars(&self.reference_star_dir, meta.julian_date, &output.reference_stars)?;

        Ok(ResultRecord {
            modified_julian_date: meta.modified_julian_date,
            magnitude: output.magnitude,
            error_magnitude: output.error,
        })
    }

    /// RAN=True にして即保存。索引に無い場合はエラーログのみ
    fn record_ran(&self, index: FrameIndex, science: &Path) -> Result<FrameIndex> {
        match mark_ran(index.clone(), science) {
            Ok(updated) => {
                index::save(&updated)?;
                Ok(updated)
            }
            Err(e) => {
                error!("{}", e);
                Ok(index)
            }
        }
    }

    fn count_skip(&self, error: &PhotometryError, report: &mut TargetReport) {
        match error {
            PhotometryError::PhotometryFailure { .. } | PhotometryError::PhotometryTimeout { .. } => {
                report.attempted += 1;
                report.failed += 1;
                warn!("測光失敗のためスキップ: {}", error);
            }
            PhotometryError::Common(photometry_common::Error::PathNotIndexed(_)) => {
                error!("{}", error);
            }
            _ => {
                report.skipped_calibration += 1;
                warn!("スキップ: {}", error);
            }
        }
    }

    fn finalize(&self, target: &Target, index: &FrameIndex, output_table: &Path, report: &mut TargetReport) {
        info!("{}: 測光を更新しました。光度曲線を生成します", target.name);

        if output_table.exists() {
            match plot::plot_lightcurve(output_table, &self.plot_path(&target.name), &target.name) {
                Ok(points) => {
                    report.plotted = true;
                    info!("光度曲線: {} ({}点)", self.plot_path(&target.name).display(), points);
                }
                Err(e) => error!("{}: 光度曲線の生成に失敗: {}", target.name, e),
            }
        } else {
            info!("{}: 結果テーブルが無いため光度曲線は生成しません", target.name);
        }

        let copy_path = self.index_copy_path(&target.name);
        let copied = copy_path
            .parent()
            .map(std::fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| std::fs::copy(index.file_path(), &copy_path));
        if let Err(e) = copied {
            error!("{}: 索引のコピーに失敗: {}", target.name, e);
        }
    }
}

/// 処理候補（索引順）
///
/// RAN=False（`run_all` なら全行）かつ、WCS必須ならWCSありの行。
pub fn select_candidates(
    index: &FrameIndex,
    options: &BatchOptions,
    report: &mut TargetReport,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for record in index.records() {
        if options.require_wcs && !record.has_world_coordinate_system {
            report.deferred_no_wcs += 1;
            continue;
        }
        if record.ran && !options.run_all {
            report.already_ran += 1;
            continue;
        }
        candidates.push(index.absolute_path(record));
    }
    report.candidates = candidates.len();
    candidates
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
