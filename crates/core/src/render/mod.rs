//! Frame rendering into compositor-owned pixel buffers.
//!
//! One frame goes through:
//! 1. [`RenderGate`] admission (at most one frame in flight, no queue; a
//!    resize may ask the holder for one more pass)
//! 2. buffer request and, if needed, explicit mapping; a buffer whose size
//!    differs from the frame's target is aborted
//! 3. rasterization into an off-screen `tiny_skia::Pixmap`
//! 4. row copy honoring the buffer stride
//! 5. unmap and flush
//!
//! Any failure between 2 and 5 aborts the buffer. Failed frames are not
//! retried; the next sample push, or a pending redraw, renders again.

mod blit;
mod frame;
mod gate;
mod memory;
mod renderer;
mod surface;
mod waveform;

pub use gate::{GateState, RenderGate, RenderPermit};
pub use memory::{
    MemoryBuffer, MemorySurface, MemorySurfaceStats, PresentedFrame, PADDING_SENTINEL,
};
pub use renderer::{FrameOutcome, FrameRenderer};
pub use surface::{
    BufferUsage, PixelFormat, Surface, SurfaceBuffer, SurfaceConfig, BYTES_PER_PIXEL,
};
