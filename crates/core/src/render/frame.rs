//! Scoped ownership of a compositor buffer for the duration of one frame.

use crate::errors::SurfaceError;

use super::surface::{Surface, SurfaceBuffer};

/// A buffer dequeued from a [`Surface`], mapped for CPU writes.
///
/// Dropping the frame without calling [`AcquiredFrame::submit`] unmaps the
/// buffer (if this frame mapped it) and aborts it, so every early return in
/// the renderer releases the buffer.
pub(crate) struct AcquiredFrame<'s, S: Surface> {
    surface: &'s S,
    buffer: Option<S::Buffer>,
    mapped_here: bool,
}

impl<'s, S: Surface> AcquiredFrame<'s, S> {
    /// Requests a buffer and makes sure its memory is mapped.
    pub(crate) fn acquire(surface: &'s S) -> Result<Self, SurfaceError> {
        let buffer = surface.request_buffer()?;
        let mut frame = Self {
            surface,
            buffer: Some(buffer),
            mapped_here: false,
        };
        if let Some(buffer) = frame.buffer.as_mut() {
            if !buffer.is_mapped() {
                // On failure `frame` is dropped here and the buffer aborted.
                surface.map_buffer(buffer)?;
                frame.mapped_here = true;
            }
        }
        Ok(frame)
    }

    /// Width and height of the dequeued buffer.
    pub(crate) fn size(&self) -> Option<(u32, u32)> {
        self.buffer
            .as_ref()
            .map(|buffer| (buffer.width(), buffer.height()))
    }

    /// Mapped pixel memory together with the buffer stride.
    pub(crate) fn pixels_mut(&mut self) -> Option<(&mut [u8], usize)> {
        let buffer = self.buffer.as_mut()?;
        let stride = buffer.stride();
        buffer.pixels_mut().map(|pixels| (pixels, stride))
    }

    fn unmap(&mut self) {
        if !self.mapped_here {
            return;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            self.surface.unmap_buffer(buffer);
        }
        self.mapped_here = false;
    }

    /// Unmaps the buffer and hands it to the compositor.
    pub(crate) fn submit(mut self) -> Result<(), SurfaceError> {
        self.unmap();
        match self.buffer.take() {
            Some(buffer) => self.surface.flush_buffer(buffer),
            None => Ok(()),
        }
    }
}

impl<S: Surface> Drop for AcquiredFrame<'_, S> {
    fn drop(&mut self) {
        self.unmap();
        if let Some(buffer) = self.buffer.take() {
            tracing::debug!("Aborting unsubmitted surface buffer");
            self.surface.abort_buffer(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::memory::MemorySurface;
    use crate::render::surface::SurfaceConfig;

    fn configured(surface: MemorySurface) -> MemorySurface {
        surface
            .configure(SurfaceConfig::cpu_rgba(4, 2))
            .expect("memory surface accepts any geometry");
        surface
    }

    #[test]
    fn test_dropped_frame_is_unmapped_and_aborted() {
        let surface = configured(MemorySurface::new());
        {
            let mut frame = AcquiredFrame::acquire(&surface).unwrap();
            assert_eq!(frame.size(), Some((4, 2)));
            assert!(frame.pixels_mut().is_some());
        }
        let stats = surface.stats();
        assert_eq!(stats.maps, 1);
        assert_eq!(stats.unmaps, 1);
        assert_eq!(stats.aborts, 1);
        assert_eq!(stats.submissions, 0);
    }

    #[test]
    fn test_submitted_frame_is_unmapped_before_flush() {
        let surface = configured(MemorySurface::new());
        let frame = AcquiredFrame::acquire(&surface).unwrap();
        frame.submit().unwrap();
        let stats = surface.stats();
        assert_eq!(stats.unmaps, 1);
        assert_eq!(stats.submissions, 1);
        assert_eq!(stats.aborts, 0);
        assert!(!stats.flushed_while_mapped);
    }

    #[test]
    fn test_premapped_buffer_is_left_mapped() {
        let surface = configured(MemorySurface::new().premapped());
        let frame = AcquiredFrame::acquire(&surface).unwrap();
        frame.submit().unwrap();
        let stats = surface.stats();
        assert_eq!(stats.maps, 0);
        assert_eq!(stats.unmaps, 0);
        assert_eq!(stats.submissions, 1);
    }

    #[test]
    fn test_map_failure_aborts_buffer() {
        let surface = configured(MemorySurface::new());
        surface.fail_next_map();
        let result = AcquiredFrame::acquire(&surface);
        assert!(matches!(result, Err(SurfaceError::Map(_))));
        let stats = surface.stats();
        assert_eq!(stats.aborts, 1);
        assert_eq!(stats.unmaps, 0);
    }
}
