//! Compositor capability consumed by the renderer.
//!
//! A [`Surface`] hands out writable buffers, and the renderer fills and
//! returns them. Buffers either come back already mapped into CPU memory or
//! must be mapped explicitly; the renderer tracks which case applies and
//! unmaps only what it mapped itself.

use crate::errors::SurfaceError;

/// Bytes per RGBA8888 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel layout requested from the compositor. The renderer always writes
/// premultiplied RGBA, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8888,
}

/// How buffer memory will be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage {
    pub cpu_read: bool,
    pub cpu_write: bool,
}

impl BufferUsage {
    pub const CPU_READ_WRITE: Self = Self {
        cpu_read: true,
        cpu_write: true,
    };
}

/// Buffer properties applied when a surface is created or resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub usage: BufferUsage,
    pub format: PixelFormat,
}

impl SurfaceConfig {
    /// CPU read/write RGBA8888 buffers of the given geometry.
    pub fn cpu_rgba(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            usage: BufferUsage::CPU_READ_WRITE,
            format: PixelFormat::Rgba8888,
        }
    }
}

/// A writable buffer handed out by [`Surface::request_buffer`].
pub trait SurfaceBuffer {
    /// Geometry the buffer was allocated with, in pixels.
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Bytes between the start of two consecutive rows. May exceed
    /// `width * 4` when the compositor pads rows.
    fn stride(&self) -> usize;

    /// Whether the buffer memory is currently visible to the CPU.
    fn is_mapped(&self) -> bool;

    /// The mapped pixel memory, `None` while unmapped.
    fn pixels_mut(&mut self) -> Option<&mut [u8]>;
}

/// A display surface the renderer can draw into.
///
/// Implementations are shared between the host's lifecycle callbacks and
/// whichever thread happens to render, hence `Send + Sync`.
pub trait Surface: Send + Sync {
    type Buffer: SurfaceBuffer;

    fn configure(&self, config: SurfaceConfig) -> Result<(), SurfaceError>;

    /// Dequeues a free buffer.
    ///
    /// This may block until the compositor releases one, and implementations
    /// must wait on any release fence before returning.
    fn request_buffer(&self) -> Result<Self::Buffer, SurfaceError>;

    /// Maps a buffer that was not already CPU-visible.
    fn map_buffer(&self, buffer: &mut Self::Buffer) -> Result<(), SurfaceError>;

    fn unmap_buffer(&self, buffer: &mut Self::Buffer);

    /// Submits a filled buffer for composition.
    fn flush_buffer(&self, buffer: Self::Buffer) -> Result<(), SurfaceError>;

    /// Returns a buffer to the compositor without presenting it.
    fn abort_buffer(&self, buffer: Self::Buffer);
}
