//! Host-facing entry point tying the analyzer, the chart and the surface
//! together for one chart component.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::analyzer::{StatisticsSnapshot, TrafficAnalyzer};
use crate::chart::ChartSampleBuffer;
use crate::config::Config;
use crate::errors::InputError;
use crate::lifecycle::{SurfaceController, SurfacePhase};
use crate::render::{FrameOutcome, FrameRenderer, Surface};
use crate::util::{InstantTimeSrc, TimeSource};

/// One chart component: a statistics session, its sample history and the
/// surface it is drawn on.
///
/// Every method takes `&self`, so a monitor can be shared across the threads
/// that report traffic and the one delivering surface callbacks.
pub struct TrafficMonitor<S: Surface, T: TimeSource = InstantTimeSrc> {
    id: String,
    analyzer: Mutex<TrafficAnalyzer<T>>,
    samples: Arc<ChartSampleBuffer>,
    controller: SurfaceController<S>,
}

impl<S: Surface> TrafficMonitor<S, InstantTimeSrc> {
    pub fn new(id: impl Into<String>, config: &Config) -> Self {
        Self::with_time_source(id, config, InstantTimeSrc::new())
    }
}

impl<S: Surface, T: TimeSource> TrafficMonitor<S, T> {
    pub fn with_time_source(id: impl Into<String>, config: &Config, time_source: T) -> Self {
        let samples = Arc::new(ChartSampleBuffer::new(config.chart.history_capacity));
        let renderer = FrameRenderer::new(config.chart.clone());
        Self {
            id: id.into(),
            analyzer: Mutex::new(TrafficAnalyzer::with_time_source(
                config.analyzer.clone(),
                time_source,
            )),
            controller: SurfaceController::new(renderer, Arc::clone(&samples)),
            samples,
        }
    }

    /// Component identifier, attached to every log line of this monitor.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn samples(&self) -> &ChartSampleBuffer {
        &self.samples
    }

    pub fn controller(&self) -> &SurfaceController<S> {
        &self.controller
    }

    /// Records `byte_count` bytes observed now.
    ///
    /// Fractional counts are truncated toward zero. Negative or non-finite
    /// values are rejected and leave the statistics untouched.
    #[tracing::instrument(level = "trace", skip(self), fields(monitor = %self.id))]
    pub fn record_event(&self, byte_count: f64) -> Result<StatisticsSnapshot, InputError> {
        let bytes = validate_byte_count(byte_count)?;
        Ok(self.analyzer.lock().process(bytes))
    }

    /// Records a received payload. Only its length matters.
    pub fn record_payload(&self, payload: &[u8]) -> StatisticsSnapshot {
        self.analyzer.lock().process(payload.len() as u64)
    }

    /// Starts a fresh statistics session. The chart history is kept.
    #[tracing::instrument(level = "debug", skip_all, fields(monitor = %self.id))]
    pub fn reset_session(&self) {
        self.analyzer.lock().reset();
    }

    /// Appends a throughput sample and redraws if no frame is in flight.
    pub fn push_sample(&self, kbps: f64) -> Result<FrameOutcome, InputError> {
        if !kbps.is_finite() {
            return Err(InputError::NotFinite(kbps));
        }
        self.samples.push(kbps);
        Ok(self.controller.render())
    }

    pub fn clear_samples(&self) {
        self.samples.clear();
    }

    #[tracing::instrument(level = "debug", skip(self, surface), fields(monitor = %self.id))]
    pub fn on_surface_created(&self, surface: Arc<S>, width: u32, height: u32) {
        self.controller.on_surface_created(surface, width, height);
    }

    #[tracing::instrument(level = "debug", skip(self, surface), fields(monitor = %self.id))]
    pub fn on_surface_resized(&self, surface: Arc<S>, width: u32, height: u32) -> FrameOutcome {
        self.controller.on_surface_resized(surface, width, height)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(monitor = %self.id))]
    pub fn on_surface_destroyed(&self, surface: &Arc<S>) {
        self.controller.on_surface_destroyed(surface);
    }

    pub fn on_touch_event(&self, surface: &Arc<S>) {
        self.controller.on_touch_event(surface);
    }

    pub fn surface_phase(&self) -> SurfacePhase {
        self.controller.phase()
    }
}

fn validate_byte_count(value: f64) -> Result<u64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite(value));
    }
    if value < 0.0 {
        return Err(InputError::Negative(value));
    }
    // Saturates above u64::MAX.
    Ok(value.trunc() as u64)
}
