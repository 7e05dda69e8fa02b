//! Chart data shared between the sample producer and the frame renderer.

mod config;
mod sample_buffer;

pub use config::ChartConfig;
pub(crate) use config::argb;
pub use sample_buffer::{ChartSampleBuffer, DEFAULT_HISTORY_CAPACITY};
