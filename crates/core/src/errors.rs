use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a [`Surface`](crate::render::Surface) implementation.
///
/// None of these are fatal: the renderer logs them and drops the frame.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("request buffer failed: {0}")]
    RequestBuffer(String),

    #[error("mapping buffer memory failed: {0}")]
    Map(String),

    #[error("flushing buffer to the compositor failed: {0}")]
    Flush(String),

    #[error("surface configuration rejected: {0}")]
    Configure(String),

    #[error(
        "buffer is {width}x{height} but the frame was laid out for {expected_width}x{expected_height}"
    )]
    GeometryMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("buffer too small, size: {size}, required: {required}")]
    BufferTooSmall { size: usize, required: usize },
}

/// Host-supplied values rejected at the ingestion boundary.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("byte count must not be negative, got {0}")]
    Negative(f64),

    #[error("value must be a finite number, got {0}")]
    NotFinite(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration file {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
