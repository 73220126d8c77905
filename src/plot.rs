//! 光度曲線のPNG出力
//!
//! 誤差が 0.1 等を超える点は除外。等級軸は反転（明るいほど上）。
//! 最新の観測点を赤、それ以外を青で描く。
//! 上端に暦日の補助軸、下端にMJD、左にMagnitude、最上部にタイトル。

use crate::error::{PhotometryError, Result};
use crate::results;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use photometry_common::{ResultRecord, MJD_OFFSET};
use std::path::{Path, PathBuf};

/// 描画対象とする誤差の上限（等）
pub const MAX_PLOTTED_ERROR: f64 = 0.1;

const WIDTH: u32 = 2500;
const HEIGHT: u32 = 500;
const LEFT: i32 = 120;
const RIGHT: i32 = WIDTH as i32 - 40;
const TOP: i32 = 100;
const BOTTOM: i32 = HEIGHT as i32 - 70;
const POINT_RADIUS: i32 = 4;
const TICKS: i32 = 8;

const GLYPH: i32 = 8;
const TITLE_SCALE: i32 = 3;
const LABEL_SCALE: i32 = 2;
const TITLE_Y: i32 = 10;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const POINT: Rgb<u8> = Rgb([31, 119, 180]);
const LATEST: Rgb<u8> = Rgb([214, 39, 40]);

/// 既定の出力先（入力と同名の .png）
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("png")
}

/// 既定のタイトル（入力ファイル名から拡張子を除いたもの）
pub fn default_title(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// MJD → 暦日（UTC）
pub fn mjd_to_date(mjd: f64) -> String {
    // MJD 40587 = 1970-01-01
    let unix_seconds = ((mjd - 40587.0) * 86400.0).round() as i64;
    match chrono::DateTime::from_timestamp(unix_seconds, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => format!("JD {:.1}", mjd + MJD_OFFSET),
    }
}

/// 結果テーブルを読み込んで描画
pub fn plot_lightcurve(input: &Path, output: &Path, title: &str) -> Result<usize> {
    let rows = results::load(input)?;
    render_lightcurve(&rows, output, title)
}

/// 描画した点の数を返す
pub fn render_lightcurve(rows: &[ResultRecord], output: &Path, title: &str) -> Result<usize> {
    let points: Vec<&ResultRecord> = rows
        .iter()
        .filter(|r| r.error_magnitude.abs() <= MAX_PLOTTED_ERROR)
        .filter(|r| r.modified_julian_date.is_finite() && r.magnitude.is_finite())
        .collect();

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    let frame = Frame::new(&points);
    draw_axes(&mut img, &frame);
    draw_labels(&mut img, title);

    let latest = points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.modified_julian_date.total_cmp(&b.modified_julian_date))
        .map(|(i, _)| i);

    for (i, point) in points.iter().enumerate() {
        let color = if Some(i) == latest { LATEST } else { POINT };
        let x = frame.x(point.modified_julian_date);
        let y = frame.y(point.magnitude);
        let upper = frame.y(point.magnitude - point.error_magnitude.abs());
        let lower = frame.y(point.magnitude + point.error_magnitude.abs());

        line(&mut img, (x, upper), (x, lower), color);
        line(&mut img, (x - POINT_RADIUS, upper), (x + POINT_RADIUS, upper), color);
        line(&mut img, (x - POINT_RADIUS, lower), (x + POINT_RADIUS, lower), color);
        draw_filled_circle_mut(&mut img, (x, y), POINT_RADIUS, color);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    img.save(output)
        .map_err(|e| PhotometryError::Plot(format!("{}: {}", output.display(), e)))?;

    Ok(points.len())
}

/// データ座標 → 画素座標
struct Frame {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Frame {
    fn new(points: &[&ResultRecord]) -> Self {
        let mut frame = Frame {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            let err = p.error_magnitude.abs();
            frame.min_x = frame.min_x.min(p.modified_julian_date);
            frame.max_x = frame.max_x.max(p.modified_julian_date);
            frame.min_y = frame.min_y.min(p.magnitude - err);
            frame.max_y = frame.max_y.max(p.magnitude + err);
        }
        if points.is_empty() {
            frame = Frame { min_x: 0.0, max_x: 1.0, min_y: 0.0, max_y: 1.0 };
        }
        // 1点だけ・同値だけの場合に幅0にしない
        if frame.max_x - frame.min_x < f64::EPSILON {
            frame.min_x -= 0.5;
            frame.max_x += 0.5;
        }
        if frame.max_y - frame.min_y < f64::EPSILON {
            frame.min_y -= 0.05;
            frame.max_y += 0.05;
        }
        let pad_x = (frame.max_x - frame.min_x) * 0.02;
        let pad_y = (frame.max_y - frame.min_y) * 0.05;
        frame.min_x -= pad_x;
        frame.max_x += pad_x;
        frame.min_y -= pad_y;
        frame.max_y += pad_y;
        frame
    }

    fn x(&self, mjd: f64) -> i32 {
        let span = (RIGHT - LEFT) as f64;
        LEFT + ((mjd - self.min_x) / (self.max_x - self.min_x) * span).round() as i32
    }

    /// 等級は小さいほど明るいので上に描く
    fn y(&self, magnitude: f64) -> i32 {
        let span = (BOTTOM - TOP) as f64;
        TOP + ((magnitude - self.min_y) / (self.max_y - self.min_y) * span).round() as i32
    }

    fn mjd_at(&self, tick: i32) -> f64 {
        self.min_x + (self.max_x - self.min_x) * tick as f64 / TICKS as f64
    }

    fn magnitude_at(&self, tick: i32) -> f64 {
        self.min_y + (self.max_y - self.min_y) * tick as f64 / TICKS as f64
    }
}

fn draw_axes(img: &mut RgbImage, frame: &Frame) {
    for tick in 0..=TICKS {
        let x = LEFT + (RIGHT - LEFT) * tick / TICKS;
        let y = TOP + (BOTTOM - TOP) * tick / TICKS;
        if tick > 0 && tick < TICKS {
            line(img, (x, TOP), (x, BOTTOM), GRID);
            line(img, (LEFT, y), (RIGHT, y), GRID);
        }

        // MJD（下）と暦日（上）
        let mjd = frame.mjd_at(tick);
        line(img, (x, BOTTOM), (x, BOTTOM + 6), AXIS);
        line(img, (x, TOP - 6), (x, TOP), AXIS);
        draw_text_centered(img, x, BOTTOM + 12, &format!("{:.1}", mjd), LABEL_SCALE, AXIS);
        draw_text_centered(img, x, TOP - 12 - GLYPH * LABEL_SCALE, &mjd_to_date(mjd), LABEL_SCALE, AXIS);

        // 等級（左）
        let label = format!("{:.2}", frame.magnitude_at(tick));
        let width = text_width(&label, LABEL_SCALE);
        line(img, (LEFT - 6, y), (LEFT, y), AXIS);
        draw_text(img, LEFT - 10 - width, y - GLYPH * LABEL_SCALE / 2, &label, LABEL_SCALE, AXIS);
    }

    line(img, (LEFT, TOP), (RIGHT, TOP), AXIS);
    line(img, (LEFT, BOTTOM), (RIGHT, BOTTOM), AXIS);
    line(img, (LEFT, TOP), (LEFT, BOTTOM), AXIS);
    line(img, (RIGHT, TOP), (RIGHT, BOTTOM), AXIS);
}

fn draw_labels(img: &mut RgbImage, title: &str) {
    draw_text_centered(img, (LEFT + RIGHT) / 2, TITLE_Y, title, TITLE_SCALE, AXIS);
    draw_text_centered(
        img,
        (LEFT + RIGHT) / 2,
        BOTTOM + 20 + GLYPH * LABEL_SCALE,
        "MJD",
        LABEL_SCALE,
        AXIS,
    );

    // 縦書き
    let label = "Magnitude";
    let height = label.chars().count() as i32 * GLYPH * LABEL_SCALE;
    let mut y = (TOP + BOTTOM - height) / 2;
    for ch in label.chars() {
        draw_glyph(img, 8, y, ch, LABEL_SCALE, AXIS);
        y += GLYPH * LABEL_SCALE;
    }
}

fn line(img: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    draw_line_segment_mut(
        img,
        (from.0 as f32, from.1 as f32),
        (to.0 as f32, to.1 as f32),
        color,
    );
}

fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * GLYPH * scale
}

fn draw_text_centered(img: &mut RgbImage, center_x: i32, y: i32, text: &str, scale: i32, color: Rgb<u8>) {
    draw_text(img, center_x - text_width(text, scale) / 2, y, text, scale, color);
}

fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, scale: i32, color: Rgb<u8>) {
    for (i, ch) in text.chars().enumerate() {
        draw_glyph(img, x + i as i32 * GLYPH * scale, y, ch, scale, color);
    }
}

/// 8x8ビットマップ文字（対応外の文字は '?'）
fn draw_glyph(img: &mut RgbImage, x: i32, y: i32, ch: char, scale: i32, color: Rgb<u8>) {
    let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
    let Some(glyph) = glyph else {
        return;
    };
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH {
            if bits & (1 << col) != 0 {
                let rect = Rect::at(x + col * scale, y + row as i32 * scale)
                    .of_size(scale as u32, scale as u32);
                draw_filled_rect_mut(img, rect, color);
            }
        }
    }
}
