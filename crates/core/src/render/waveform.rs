//! Rasterizes the sample history as a filled area under a stroked line.

use tiny_skia::{
    FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, Path, PathBuilder, Pixmap,
    Point, SpreadMode, Stroke, Transform,
};

use crate::chart::{argb, ChartConfig};

/// Maps sample index and value to canvas coordinates.
///
/// Points are spaced by the chart's fixed capacity, not by the number of
/// samples held, so a partially filled history occupies the left part of
/// the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WaveformGeometry {
    step_x: f32,
    y_max: f64,
    height: f64,
}

impl WaveformGeometry {
    pub(crate) fn new(
        samples: &[f64],
        capacity: usize,
        width: u32,
        height: u32,
        config: &ChartConfig,
    ) -> Self {
        let intervals = capacity.max(2) - 1;
        Self {
            step_x: width as f32 / intervals as f32,
            y_max: y_max(samples, config.min_scale, config.headroom),
            height: height as f64,
        }
    }

    pub(crate) fn point(&self, index: usize, value: f64) -> (f32, f32) {
        let x = index as f32 * self.step_x;
        let y = self.height - (value / self.y_max) * self.height;
        (x, y as f32)
    }
}

/// Top of the vertical scale: the largest sample (at least `min_scale`)
/// times `headroom`.
pub(crate) fn y_max(samples: &[f64], min_scale: f64, headroom: f64) -> f64 {
    samples.iter().copied().fold(min_scale, f64::max) * headroom
}

/// Clears `pixmap` and draws the waveform when at least two samples exist.
///
/// Returns whether a waveform was drawn.
pub(crate) fn paint(
    pixmap: &mut Pixmap,
    samples: &[f64],
    capacity: usize,
    config: &ChartConfig,
) -> bool {
    pixmap.fill(argb(config.background));
    if samples.len() < 2 {
        return false;
    }

    let (width, height) = (pixmap.width(), pixmap.height());
    let geometry = WaveformGeometry::new(samples, capacity, width, height, config);
    let points: Vec<(f32, f32)> = samples
        .iter()
        .enumerate()
        .map(|(i, v)| geometry.point(i, *v))
        .collect();

    let mut drew = false;
    if let Some(area) = area_path(&points, height as f32) {
        let shader = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(0.0, height as f32),
            vec![
                GradientStop::new(0.0, argb(config.fill_top)),
                GradientStop::new(1.0, argb(config.fill_bottom)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );
        match shader {
            Some(shader) => {
                let paint = Paint {
                    shader,
                    anti_alias: true,
                    ..Default::default()
                };
                pixmap.fill_path(&area, &paint, FillRule::Winding, Transform::identity(), None);
                drew = true;
            }
            None => tracing::debug!(height, "Degenerate fill gradient, skipping area"),
        }
    }

    if let Some(line) = line_path(&points) {
        let mut paint = Paint::default();
        paint.set_color(argb(config.stroke_color));
        paint.anti_alias = true;
        let stroke = Stroke {
            width: config.stroke_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&line, &paint, &stroke, Transform::identity(), None);
        drew = true;
    }
    drew
}

/// Closed polygon: bottom-left, every point, straight down under the last
/// point, back to bottom-left.
fn area_path(points: &[(f32, f32)], height: f32) -> Option<Path> {
    let (last_x, _) = *points.last()?;
    let mut pb = PathBuilder::new();
    pb.move_to(0.0, height);
    for (x, y) in points {
        pb.line_to(*x, *y);
    }
    pb.line_to(last_x, height);
    pb.line_to(0.0, height);
    pb.close();
    pb.finish()
}

fn line_path(points: &[(f32, f32)]) -> Option<Path> {
    let ((first_x, first_y), rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(*first_x, *first_y);
    for (x, y) in rest {
        pb.line_to(*x, *y);
    }
    pb.finish()
}
