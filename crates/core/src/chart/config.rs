use serde::{Deserialize, Serialize};
use tiny_skia::Color;

use super::DEFAULT_HISTORY_CAPACITY;

/// Appearance and history length of the throughput chart.
///
/// Colours are `0xAARRGGBB`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Samples kept on screen; also fixes the horizontal spacing.
    pub history_capacity: usize,
    /// Lower bound of the vertical scale, in kbit/s.
    pub min_scale: f64,
    /// Multiplier applied above the largest sample.
    pub headroom: f64,
    pub background: u32,
    pub fill_top: u32,
    pub fill_bottom: u32,
    pub stroke_color: u32,
    pub stroke_width: f32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_scale: 100.0,
            headroom: 1.2,
            background: 0xFFFF_FFFF,
            fill_top: 0x6600_7DFF,
            fill_bottom: 0x0000_7DFF,
            stroke_color: 0xFF00_7DFF,
            stroke_width: 4.0,
        }
    }
}

/// Converts an `0xAARRGGBB` value to a tiny-skia colour.
pub(crate) fn argb(value: u32) -> Color {
    let [a, r, g, b] = value.to_be_bytes();
    Color::from_rgba8(r, g, b, a)
}
