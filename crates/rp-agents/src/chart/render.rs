//! Rasterize a `ChartSpec` to PNG.
//!
//! Title, axis labels and category names travel with the image as
//! `ChartImage` metadata. The raster carries a tick per data point on the
//! x axis so the categories can be matched left to right.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use rp_core::{ChartImage, StageError};

use super::spec::{ChartKind, ChartSpec};
use crate::config::ChartConfig;

const MIN_SIDE: u32 = 100;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const SERIES: Rgb<u8> = Rgb([31, 119, 180]);

const GRID_LINES: u32 = 5;

/// Pixel rectangle the data is drawn into.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl PlotArea {
    fn for_canvas(width: u32, height: u32) -> Self {
        let (w, h) = (i64::from(width), i64::from(height));
        Self {
            left: w / 12,
            top: h / 12,
            right: w - w / 24,
            bottom: h - h / 10,
        }
    }

    fn width(&self) -> i64 {
        self.right - self.left
    }

    fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Value range along one axis, never zero-width.
#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).abs() < f64::EPSILON {
            Self {
                min: min - 1.0,
                max: max + 1.0,
            }
        } else {
            Self { min, max }
        }
    }

    fn including(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    fn padded(self, fraction: f64) -> Self {
        let pad = (self.max - self.min) * fraction;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

struct Canvas {
    image: RgbImage,
    area: PlotArea,
    x_range: Range,
    y_range: Range,
}

impl Canvas {
    fn px(&self, x: f64) -> i64 {
        self.area.left + (self.x_range.fraction(x) * self.area.width() as f64).round() as i64
    }

    fn py(&self, y: f64) -> i64 {
        self.area.bottom - (self.y_range.fraction(y) * self.area.height() as f64).round() as i64
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < i64::from(self.image.width()) && y < i64::from(self.image.height())
        {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Bresenham line, `thickness` pixels wide.
    fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), thickness: i64, color: Rgb<u8>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        let half = thickness / 2;

        loop {
            for ox in -half..=half {
                for oy in -half..=half {
                    self.put(x + ox, y + oy, color);
                }
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for x in x0.min(x1)..=x0.max(x1) {
            for y in y0.min(y1)..=y0.max(y1) {
                self.put(x, y, color);
            }
        }
    }

    fn disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn grid(&mut self) {
        let PlotArea {
            left,
            top,
            right,
            bottom,
        } = self.area;
        for i in 1..=GRID_LINES {
            let y = bottom - (bottom - top) * i64::from(i) / i64::from(GRID_LINES);
            self.line((left, y), (right, y), 1, GRID);
        }
    }

    fn ticks(&mut self, xs: &[i64]) {
        let bottom = self.area.bottom;
        let length = (self.area.height() / 40).max(4);
        for &x in xs {
            self.line((x, bottom), (x, bottom + length), 2, AXIS);
        }
    }

    fn axes(&mut self) {
        let PlotArea {
            left,
            top,
            right,
            bottom,
        } = self.area;
        self.line((left, top), (left, bottom), 2, AXIS);
        self.line((left, bottom), (right, bottom), 2, AXIS);
        if self.y_range.min < 0.0 && self.y_range.max > 0.0 {
            let zero = self.py(0.0);
            self.line((left, zero), (right, zero), 1, AXIS);
        }
    }
}

/// Render `spec` at the configured size.
pub fn render_chart(spec: &ChartSpec, config: &ChartConfig) -> Result<ChartImage, StageError> {
    if config.width < MIN_SIDE || config.height < MIN_SIDE {
        return Err(StageError::validation(format!(
            "Chart canvas {}x{} is smaller than {}x{}",
            config.width, config.height, MIN_SIDE, MIN_SIDE
        )));
    }
    if spec.x.is_empty() || spec.x.len() != spec.y.len() {
        return Err(StageError::validation("Chart series is empty or uneven"));
    }

    let (x_range, y_range) = match spec.kind {
        ChartKind::Bar => (
            Range::of(&spec.x).padded(0.5 / spec.x.len() as f64 + 0.05),
            Range::of(&spec.y).including(0.0).padded(0.05),
        ),
        ChartKind::Line | ChartKind::Scatter => {
            (Range::of(&spec.x).padded(0.05), Range::of(&spec.y).padded(0.05))
        }
    };

    let mut canvas = Canvas {
        image: RgbImage::from_pixel(config.width, config.height, BACKGROUND),
        area: PlotArea::for_canvas(config.width, config.height),
        x_range,
        y_range,
    };
    canvas.grid();

    let points: Vec<(i64, i64)> = spec
        .x
        .iter()
        .zip(&spec.y)
        .map(|(&x, &y)| (canvas.px(x), canvas.py(y)))
        .collect();
    let stroke = (i64::from(config.width.min(config.height)) / 300).max(2);

    match spec.kind {
        ChartKind::Line => {
            for pair in points.windows(2) {
                canvas.line(pair[0], pair[1], stroke, SERIES);
            }
            for &(x, y) in &points {
                canvas.disc(x, y, stroke + 1, SERIES);
            }
        }
        ChartKind::Bar => {
            let slot = canvas.area.width() as f64 / (spec.x.len() as f64 + 1.0);
            let half_bar = ((slot * 0.35) as i64).max(1);
            let baseline = canvas.py(0.0);
            for &(x, y) in &points {
                canvas.rect(x - half_bar, baseline, x + half_bar, y, SERIES);
            }
        }
        ChartKind::Scatter => {
            for &(x, y) in &points {
                canvas.disc(x, y, stroke * 2, SERIES);
            }
        }
    }
    canvas.axes();
    let tick_xs: Vec<i64> = points.iter().map(|&(x, _)| x).collect();
    canvas.ticks(&tick_xs);

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(canvas.image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| StageError::validation(format!("PNG encoding failed: {}", e)))?;

    Ok(ChartImage {
        title: spec.title.clone(),
        x_label: spec.x_label.clone(),
        y_label: spec.y_label.clone(),
        width: config.width,
        height: config.height,
        categories: spec.categories.clone(),
        png,
    })
}
