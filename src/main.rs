use anyhow::Context;
use clap::Parser;
use photometry_rust::batch::{self, BatchDriver, BatchOptions, SingleRunOptions, Target, TargetReport};
use photometry_rust::{cli, config, index, logging, photometry, plot};
use cli::{Cli, Commands};
use config::Config;
use photometry_common::FrameIndex;
use std::future::Future;
use std::io::IsTerminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Index { directory, clean, show } => {
            println!("🔭 photometry - 索引作成\n");

            let mode = if clean { index::BuildMode::Clean } else { index::BuildMode::Incremental };
            let frames = index::build(&directory, mode)?;
            println!("✔ {}件のフレームを索引化: {}", frames.len(), frames.file_path().display());

            if show {
                print_index_summary(&frames);
            }
        }

        Commands::Run { ra, dec, file, dark, flat, save, output_file } => {
            println!("🔭 photometry - 測光\n");

            if !file.is_file() {
                anyhow::bail!(photometry_rust::error::PhotometryError::FileNotFound(
                    file.display().to_string()
                ));
            }

            let driver = build_driver(&config);
            let options = SingleRunOptions { dark, flat, save, output_file };
            let record = until_cancelled(driver.run_single(ra, dec, &file, &options)).await??;

            println!("✔ MJD {:.5}: {:.3} ± {:.3}", record.modified_julian_date, record.magnitude, record.error_magnitude);
            println!("\n✅ 測光完了");
        }

        Commands::Bulk { ra, dec, directory, ignore_wcs, run_all, name } => {
            println!("🚀 photometry - 一括測光\n");

            let driver = build_driver(&config);
            let target = Target::from_directory(&directory, ra, dec, name);
            let options = batch_options(ignore_wcs, run_all);

            let report = until_cancelled(driver.process_target(&target, &options))
                .await?
                .with_context(|| format!("{} の処理に失敗しました", directory.display()))?;
            print_report(&report);

            println!("\n✅ 完了");
        }

        Commands::Targets { list, star_dir, ignore_wcs, run_all } => {
            println!("🚀 photometry - ターゲット一括測光\n");

            let star_dir = star_dir.unwrap_or_else(|| config.star_dir.clone());
            let targets = batch::load_targets(&list, &star_dir)?;
            println!("✔ {}件のターゲットを読み込み\n", targets.len());

            let driver = build_driver(&config);
            let options = batch_options(ignore_wcs, run_all);
            let outcomes = until_cancelled(driver.process_targets(&targets, &options)).await?;

            for (name, outcome) in &outcomes {
                match outcome {
                    Ok(report) => print_report(report),
                    Err(e) => println!("✘ {}: {}", name, e),
                }
            }

            println!("\n✅ 完了");
        }

        Commands::Plot { input, output, title } => {
            let input = input.unwrap_or_else(|| config.output_dir.join("output.csv"));
            let output = output.unwrap_or_else(|| plot::default_output_path(&input));
            let title = title.unwrap_or_else(|| plot::default_title(&input));

            let points = plot::plot_lightcurve(&input, &output, &title)?;
            println!("✔ 光度曲線を保存: {} ({}点)", output.display(), points);
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  校正フレーム: {}", config.calibration_path.display());
                println!("  出力先: {}", config.output_dir.display());
                println!("  参照星: {}", config.reference_star_dir.display());
                println!("  天体ディレクトリ: {}", config.star_dir.display());
                println!("  測光エンジン: {} {}", config.engine_program, config.engine_args.join(" "));
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  APIキー: {}", if config.astrometry_api_key().is_some() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

fn build_driver(config: &Config) -> BatchDriver<photometry::CommandPhotometryEngine> {
    let engine = photometry::CommandPhotometryEngine::new(
        config.engine_program.clone(),
        config.engine_args.clone(),
        config.engine_settings(),
    );
    BatchDriver::from_config(engine, config)
}

fn batch_options(ignore_wcs: bool, run_all: bool) -> BatchOptions {
    BatchOptions {
        require_wcs: !ignore_wcs,
        run_all,
        show_progress: std::io::stderr().is_terminal(),
    }
}

/// Ctrl-C で中断（実行中のエンジンはドロップ時に停止する）
async fn until_cancelled<T>(work: impl Future<Output = T>) -> anyhow::Result<T> {
    tokio::select! {
        result = work => Ok(result),
        _ = tokio::signal::ctrl_c() => anyhow::bail!("中断されました"),
    }
}

fn print_report(report: &TargetReport) {
    println!("{}:", report.name);
    println!("  索引: {}件 (処理済み {}件, WCS待ち {}件)", report.indexed, report.already_ran, report.deferred_no_wcs);
    println!("  候補: {}件", report.candidates);
    println!("  成功: {}件 / 測光 {}件", report.succeeded, report.attempted);
    println!("  失敗: {}件, 校正フレーム等でスキップ: {}件", report.failed, report.skipped_calibration);
    if report.plotted {
        println!("  ✔ 光度曲線を更新");
    }
}

fn print_index_summary(frames: &FrameIndex) {
    println!("索引情報:");
    println!("  パス: {}", frames.file_path().display());
    println!("  件数: {}", frames.len());
    println!("  処理済み: {}", frames.ran_count());
    println!("  WCSあり: {}", frames.wcs_count());

    let dates = frames.records().iter().map(|r| r.modified_julian_date);
    let first = dates.clone().fold(f64::INFINITY, f64::min);
    let last = dates.fold(f64::NEG_INFINITY, f64::max);
    if first.is_finite() && last.is_finite() {
        println!("  観測期間: {} 〜 {}", plot::mjd_to_date(first), plot::mjd_to_date(last));
    }
}
