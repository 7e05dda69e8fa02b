use tiny_skia::Pixmap;

use crate::chart::{ChartConfig, ChartSampleBuffer};
use crate::errors::SurfaceError;
use crate::lifecycle::SurfaceState;

use super::blit::copy_rows;
use super::frame::AcquiredFrame;
use super::gate::RenderGate;
use super::surface::{Surface, BYTES_PER_PIXEL};
use super::waveform;

/// What a call to [`FrameRenderer::draw_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was submitted. `waveform` is false when fewer than two
    /// samples were available and only the background was drawn.
    Presented { waveform: bool },
    /// Another frame was in flight; nothing was done.
    Busy,
    /// Another frame was in flight; its holder renders once more with the
    /// latest target before releasing the gate.
    Deferred,
    /// No surface, or a zero-sized one.
    NoSurface,
    /// Acquiring, mapping, copying or flushing failed. The error was logged
    /// and the buffer, if any, returned to the compositor.
    Failed,
}

/// Draws the sample history into a surface, one frame at a time.
#[derive(Debug)]
pub struct FrameRenderer {
    config: ChartConfig,
    gate: RenderGate,
}

impl FrameRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            gate: RenderGate::new(),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn gate(&self) -> &RenderGate {
        &self.gate
    }

    /// Renders the current contents of `samples` into `target`.
    ///
    /// Never blocks on another render: if one is in flight this returns
    /// [`FrameOutcome::Busy`] immediately. The only blocking point is the
    /// surface's buffer request.
    pub fn draw_frame<S: Surface>(
        &self,
        target: &SurfaceState<S>,
        samples: &ChartSampleBuffer,
    ) -> FrameOutcome {
        self.draw_current(|| target.clone(), samples)
    }

    /// Like [`FrameRenderer::draw_frame`], but reads the target through
    /// `current` at the start of every pass.
    ///
    /// The permit holder keeps rendering while redraws are requested through
    /// the gate, so a pass requested mid-frame sees the target as it is when
    /// that pass starts. The outcome of the last pass is returned.
    pub fn draw_current<S, F>(&self, mut current: F, samples: &ChartSampleBuffer) -> FrameOutcome
    where
        S: Surface,
        F: FnMut() -> SurfaceState<S>,
    {
        let Some(mut permit) = self.gate.try_acquire() else {
            tracing::trace!("Frame in flight, dropping render request");
            return FrameOutcome::Busy;
        };
        loop {
            let outcome = self.draw_pass(&current(), samples);
            match permit.finish() {
                None => return outcome,
                Some(next) => {
                    tracing::debug!(?outcome, "Redraw requested during frame, rendering again");
                    permit = next;
                }
            }
        }
    }

    /// Like [`FrameRenderer::draw_current`], but when a frame is in flight
    /// asks its holder for one more pass instead of dropping the request.
    pub fn draw_or_defer<S, F>(&self, mut current: F, samples: &ChartSampleBuffer) -> FrameOutcome
    where
        S: Surface,
        F: FnMut() -> SurfaceState<S>,
    {
        loop {
            match self.draw_current(&mut current, samples) {
                FrameOutcome::Busy => {
                    if self.gate.request_redraw() {
                        tracing::debug!("Frame in flight, redraw handed to its holder");
                        return FrameOutcome::Deferred;
                    }
                    // The holder released the gate in between.
                }
                outcome => return outcome,
            }
        }
    }

    fn draw_pass<S: Surface>(
        &self,
        target: &SurfaceState<S>,
        samples: &ChartSampleBuffer,
    ) -> FrameOutcome {
        let Some(surface) = target.surface().filter(|_| target.has_area()) else {
            tracing::trace!(
                width = target.width,
                height = target.height,
                "No renderable surface"
            );
            return FrameOutcome::NoSurface;
        };

        match self.render(surface.as_ref(), target.width, target.height, samples) {
            Ok(waveform) => {
                tracing::trace!(waveform, "Frame presented");
                FrameOutcome::Presented { waveform }
            }
            Err(error) => {
                tracing::error!(%error, "Frame dropped");
                FrameOutcome::Failed
            }
        }
    }

    fn render<S: Surface>(
        &self,
        surface: &S,
        width: u32,
        height: u32,
        samples: &ChartSampleBuffer,
    ) -> Result<bool, SurfaceError> {
        let mut frame = AcquiredFrame::acquire(surface)?;
        // The surface may have been reconfigured after this frame read its
        // target.
        if let Some((buffer_width, buffer_height)) = frame.size() {
            if (buffer_width, buffer_height) != (width, height) {
                return Err(SurfaceError::GeometryMismatch {
                    width: buffer_width,
                    height: buffer_height,
                    expected_width: width,
                    expected_height: height,
                });
            }
        }

        let waveform = {
            let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
                SurfaceError::Configure(format!("cannot allocate {width}x{height} canvas"))
            })?;
            let history = samples.snapshot();
            let waveform = waveform::paint(&mut pixmap, &history, samples.capacity(), &self.config);

            let (pixels, stride) = frame
                .pixels_mut()
                .ok_or_else(|| SurfaceError::Map("buffer memory is not mapped".into()))?;
            let row_bytes = width as usize * BYTES_PER_PIXEL;
            copy_rows(
                pixmap.data(),
                row_bytes,
                pixels,
                stride,
                row_bytes,
                height as usize,
            )?;
            waveform
        };

        frame.submit()?;
        Ok(waveform)
    }
}
