//! Host surface lifecycle.
//!
//! The host calls these hooks from its UI thread while samples may be pushed
//! and rendered from any thread. The controller keeps the surface handle and
//! the canvas size behind one lock, and every render pass works on a copy
//! taken when the pass starts. A resize that lands while a frame is in
//! flight hands its render to that frame's thread, which draws once more at
//! the new size before releasing the gate.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::chart::ChartSampleBuffer;
use crate::render::{FrameOutcome, FrameRenderer, Surface, SurfaceConfig};

/// Render target as seen by one frame.
pub struct SurfaceState<S> {
    surface: Option<Arc<S>>,
    pub width: u32,
    pub height: u32,
}

impl<S> SurfaceState<S> {
    pub fn new(surface: Arc<S>, width: u32, height: u32) -> Self {
        Self {
            surface: Some(surface),
            width,
            height,
        }
    }

    pub fn surface(&self) -> Option<&Arc<S>> {
        self.surface.as_ref()
    }

    /// Whether both dimensions are non-zero.
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl<S> Default for SurfaceState<S> {
    fn default() -> Self {
        Self {
            surface: None,
            width: 0,
            height: 0,
        }
    }
}

impl<S> Clone for SurfaceState<S> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<S> fmt::Debug for SurfaceState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceState")
            .field("attached", &self.surface.is_some())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    Uninitialized,
    Created,
    Resized,
    Destroyed,
}

struct Attachment<S> {
    state: SurfaceState<S>,
    phase: SurfacePhase,
}

/// Owns the render target and draws the chart into it.
pub struct SurfaceController<S: Surface> {
    attachment: RwLock<Attachment<S>>,
    renderer: FrameRenderer,
    samples: Arc<ChartSampleBuffer>,
}

impl<S: Surface> SurfaceController<S> {
    pub fn new(renderer: FrameRenderer, samples: Arc<ChartSampleBuffer>) -> Self {
        Self {
            attachment: RwLock::new(Attachment {
                state: SurfaceState::default(),
                phase: SurfacePhase::Uninitialized,
            }),
            renderer,
            samples,
        }
    }

    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    pub fn phase(&self) -> SurfacePhase {
        self.attachment.read().phase
    }

    /// A consistent copy of the current target.
    pub fn state(&self) -> SurfaceState<S> {
        self.attachment.read().state.clone()
    }

    /// Attaches a new surface and configures its buffers.
    ///
    /// Configuration errors are logged; the surface stays attached and later
    /// frames report their own failures.
    pub fn on_surface_created(&self, surface: Arc<S>, width: u32, height: u32) {
        tracing::info!(width, height, "Surface created");
        self.configure(&surface, width, height);
        let mut attachment = self.attachment.write();
        attachment.state = SurfaceState::new(surface, width, height);
        attachment.phase = SurfacePhase::Created;
    }

    /// Records the new size and renders once at that size.
    ///
    /// If a frame is in flight the render is deferred to it and
    /// [`FrameOutcome::Deferred`] is returned.
    pub fn on_surface_resized(&self, surface: Arc<S>, width: u32, height: u32) -> FrameOutcome {
        tracing::info!(width, height, "Surface resized");
        self.configure(&surface, width, height);
        {
            let mut attachment = self.attachment.write();
            attachment.state = SurfaceState::new(surface, width, height);
            attachment.phase = SurfacePhase::Resized;
        }
        self.renderer.draw_or_defer(|| self.state(), &self.samples)
    }

    /// Detaches the surface. Later renders are no-ops until a new one is
    /// created.
    pub fn on_surface_destroyed(&self, surface: &Arc<S>) {
        let mut attachment = self.attachment.write();
        let current = attachment
            .state
            .surface()
            .is_some_and(|attached| Arc::ptr_eq(attached, surface));
        if !current {
            tracing::warn!("Destroyed surface was not the attached one, detaching anyway");
        }
        attachment.state.surface = None;
        attachment.phase = SurfacePhase::Destroyed;
        tracing::info!("Surface destroyed");
    }

    /// Touch input is not used by the chart.
    pub fn on_touch_event(&self, _surface: &Arc<S>) {
        tracing::trace!("Touch event ignored");
    }

    /// Draws the current sample history, unless a frame is already in flight.
    pub fn render(&self) -> FrameOutcome {
        self.renderer.draw_current(|| self.state(), &self.samples)
    }

    fn configure(&self, surface: &S, width: u32, height: u32) {
        if let Err(error) = surface.configure(SurfaceConfig::cpu_rgba(width, height)) {
            tracing::error!(%error, width, height, "Surface configuration failed");
        }
    }
}
