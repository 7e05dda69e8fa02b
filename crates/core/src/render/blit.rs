//! Copying rasterized rows into compositor memory.

use crate::errors::SurfaceError;

/// Copies `rows` rows of `row_bytes` bytes from `src` into `dst`.
///
/// When both strides match the whole image is one contiguous copy. Otherwise
/// each row is copied on its own, so destination padding bytes are never
/// written.
pub(crate) fn copy_rows(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    row_bytes: usize,
    rows: usize,
) -> Result<(), SurfaceError> {
    if rows == 0 || row_bytes == 0 {
        return Ok(());
    }
    let required = required_len(dst_stride, row_bytes, rows);
    if dst_stride < row_bytes || dst.len() < required {
        return Err(SurfaceError::BufferTooSmall {
            size: dst.len(),
            required: required.max(row_bytes * rows),
        });
    }
    debug_assert!(src.len() >= required_len(src_stride, row_bytes, rows));

    if src_stride == dst_stride && src_stride == row_bytes {
        let len = row_bytes * rows;
        dst[..len].copy_from_slice(&src[..len]);
        return Ok(());
    }

    for (src_row, dst_row) in src
        .chunks(src_stride)
        .zip(dst.chunks_mut(dst_stride))
        .take(rows)
    {
        dst_row[..row_bytes].copy_from_slice(&src_row[..row_bytes]);
    }
    Ok(())
}

/// Smallest buffer holding `rows` rows: the last row needs no padding.
fn required_len(stride: usize, row_bytes: usize, rows: usize) -> usize {
    stride * (rows - 1) + row_bytes
}
