//! In-memory compositor.
//!
//! Used by the demo binary and by tests. Rows can be padded to exercise the
//! stride handling, buffers can come back pre-mapped or unmapped, and the
//! next request, map or flush can be made to fail.

use std::time::Duration;

use parking_lot::Mutex;

use crate::errors::SurfaceError;

use super::surface::{Surface, SurfaceBuffer, SurfaceConfig, BYTES_PER_PIXEL};

/// Byte written into fresh buffers, padding included.
pub const PADDING_SENTINEL: u8 = 0xAB;

/// Counters of every compositor call, for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySurfaceStats {
    pub configures: usize,
    pub requests: usize,
    pub maps: usize,
    pub unmaps: usize,
    pub submissions: usize,
    pub aborts: usize,
    /// Set if any buffer this surface mapped was flushed before being unmapped.
    pub flushed_while_mapped: bool,
}

/// The last buffer flushed to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedFrame {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub data: Vec<u8>,
}

impl PresentedFrame {
    /// Image bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Padding bytes following row `y`.
    pub fn padding(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride + self.width as usize * BYTES_PER_PIXEL;
        let end = ((y as usize + 1) * self.stride).min(self.data.len());
        &self.data[start..end]
    }

    /// Premultiplied RGBA of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = x as usize * BYTES_PER_PIXEL;
        let row = self.row(y);
        [
            row[offset],
            row[offset + 1],
            row[offset + 2],
            row[offset + 3],
        ]
    }

    /// Rows copied without padding, as expected by image encoders.
    pub fn packed(&self) -> Vec<u8> {
        (0..self.height).flat_map(|y| self.row(y).to_vec()).collect()
    }
}

pub struct MemoryBuffer {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    mapped: bool,
    mapped_by_surface: bool,
}

impl SurfaceBuffer for MemoryBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn is_mapped(&self) -> bool {
        self.mapped
    }

    fn pixels_mut(&mut self) -> Option<&mut [u8]> {
        self.mapped.then_some(self.data.as_mut_slice())
    }
}

#[derive(Default)]
struct Inner {
    config: Option<SurfaceConfig>,
    front: Option<PresentedFrame>,
    stats: MemorySurfaceStats,
    fail_next_request: bool,
    fail_next_map: bool,
    fail_next_flush: bool,
}

/// A [`Surface`] backed by heap buffers.
#[derive(Default)]
pub struct MemorySurface {
    inner: Mutex<Inner>,
    row_padding: usize,
    premapped: bool,
    request_delay: Option<Duration>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pads every row with `bytes` extra bytes.
    pub fn with_row_padding(mut self, bytes: usize) -> Self {
        self.row_padding = bytes;
        self
    }

    /// Hands out buffers that are already CPU-mapped.
    pub fn premapped(mut self) -> Self {
        self.premapped = true;
        self
    }

    /// Makes every buffer request block for `delay`, like waiting on vsync.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    pub fn fail_next_request(&self) {
        self.inner.lock().fail_next_request = true;
    }

    pub fn fail_next_map(&self) {
        self.inner.lock().fail_next_map = true;
    }

    /// Makes the next flush consume the buffer without presenting it.
    pub fn fail_next_flush(&self) {
        self.inner.lock().fail_next_flush = true;
    }

    pub fn stats(&self) -> MemorySurfaceStats {
        self.inner.lock().stats
    }

    pub fn config(&self) -> Option<SurfaceConfig> {
        self.inner.lock().config
    }

    /// The most recently flushed frame.
    pub fn front_buffer(&self) -> Option<PresentedFrame> {
        self.inner.lock().front.clone()
    }
}

impl Surface for MemorySurface {
    type Buffer = MemoryBuffer;

    fn configure(&self, config: SurfaceConfig) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock();
        inner.stats.configures += 1;
        inner.config = Some(config);
        Ok(())
    }

    fn request_buffer(&self) -> Result<MemoryBuffer, SurfaceError> {
        if let Some(delay) = self.request_delay {
            std::thread::sleep(delay);
        }
        let mut inner = self.inner.lock();
        inner.stats.requests += 1;
        if std::mem::take(&mut inner.fail_next_request) {
            return Err(SurfaceError::RequestBuffer("no free buffer".into()));
        }
        let config = inner
            .config
            .ok_or_else(|| SurfaceError::RequestBuffer("surface not configured".into()))?;

        let stride = config.width as usize * BYTES_PER_PIXEL + self.row_padding;
        Ok(MemoryBuffer {
            width: config.width,
            height: config.height,
            stride,
            data: vec![PADDING_SENTINEL; stride * config.height as usize],
            mapped: self.premapped,
            mapped_by_surface: false,
        })
    }

    fn map_buffer(&self, buffer: &mut MemoryBuffer) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock();
        if std::mem::take(&mut inner.fail_next_map) {
            return Err(SurfaceError::Map("mapping refused".into()));
        }
        inner.stats.maps += 1;
        buffer.mapped = true;
        buffer.mapped_by_surface = true;
        Ok(())
    }

    fn unmap_buffer(&self, buffer: &mut MemoryBuffer) {
        self.inner.lock().stats.unmaps += 1;
        buffer.mapped = false;
        buffer.mapped_by_surface = false;
    }

    fn flush_buffer(&self, buffer: MemoryBuffer) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock();
        if std::mem::take(&mut inner.fail_next_flush) {
            return Err(SurfaceError::Flush("compositor rejected the buffer".into()));
        }
        inner.stats.submissions += 1;
        if buffer.mapped_by_surface {
            inner.stats.flushed_while_mapped = true;
        }
        inner.front = Some(PresentedFrame {
            width: buffer.width,
            height: buffer.height,
            stride: buffer.stride,
            data: buffer.data,
        });
        Ok(())
    }

    fn abort_buffer(&self, _buffer: MemoryBuffer) {
        self.inner.lock().stats.aborts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_surface_refuses_buffers() {
        let surface = MemorySurface::new();
        assert!(matches!(
            surface.request_buffer(),
            Err(SurfaceError::RequestBuffer(_))
        ));
    }

    #[test]
    fn test_padded_buffers_use_wider_stride() {
        let surface = MemorySurface::new().with_row_padding(12);
        surface.configure(SurfaceConfig::cpu_rgba(3, 2)).unwrap();
        let mut buffer = surface.request_buffer().unwrap();
        assert_eq!(buffer.stride(), 24);
        assert!(buffer.pixels_mut().is_none(), "fresh buffers start unmapped");
        surface.map_buffer(&mut buffer).unwrap();
        assert_eq!(buffer.pixels_mut().map(|p| p.len()), Some(48));
    }

    #[test]
    fn test_failure_injection_is_one_shot() {
        let surface = MemorySurface::new();
        surface.configure(SurfaceConfig::cpu_rgba(1, 1)).unwrap();
        surface.fail_next_request();
        assert!(surface.request_buffer().is_err());
        assert!(surface.request_buffer().is_ok());
        assert_eq!(surface.stats().requests, 2);
    }
}
