/// Windowed, time-debounced throughput statistics.
pub mod analyzer;

/// Bounded sample history shown on the chart, and its appearance.
pub mod chart;

/// Configuration file, command line overrides and logger installation.
pub mod config;

pub mod errors;

/// Surface create/resize/destroy handling.
pub mod lifecycle;

/// Per-component facade used by the host.
pub mod monitor;

/// Rasterization of the chart into compositor buffers.
pub mod render;

/// Tracing and logging infrastructure.
#[cfg_attr(test, allow(dead_code))]
pub mod tracing;

pub mod util;

pub use analyzer::{AnalyzerConfig, StatisticsSnapshot, ThroughputEvent, TrafficAnalyzer};
pub use chart::{ChartConfig, ChartSampleBuffer};
pub use config::{Config, ConfigArgs};
pub use errors::{ConfigError, InputError, SurfaceError};
pub use lifecycle::{SurfaceController, SurfacePhase, SurfaceState};
pub use monitor::TrafficMonitor;
pub use render::{FrameOutcome, FrameRenderer, MemorySurface, Surface};
