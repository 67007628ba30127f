//! Frame decoding and in-place transforms.

use nokhwa::pixel_format::RgbFormat;
use std::time::Instant;

use super::types::Frame;

/// Decode a nokhwa buffer (MJPEG, YUYV, NV12, ...) into a packed RGB frame.
///
/// Returns `None` when the buffer cannot be decoded; the caller skips it.
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        timestamp: Instant::now(),
    })
}

/// Flip a frame left-right so the preview behaves like a mirror.
pub fn mirror_horizontal(frame: &mut Frame) {
    let bpp = Frame::BYTES_PER_PIXEL;
    let stride = frame.width as usize * bpp;
    if stride == 0 {
        return;
    }

    for row in frame.data.chunks_exact_mut(stride) {
        let mut left = 0;
        let mut right = stride - bpp;
        while left < right {
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
            left += bpp;
            right -= bpp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_mirror_swaps_pixels() {
        let mut f = frame(vec![1, 2, 3, 4, 5, 6], 2, 1);
        mirror_horizontal(&mut f);
        assert_eq!(f.data, vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_mirror_rows_independent() {
        let mut f = frame(
            vec![
                1, 1, 1, 2, 2, 2, 3, 3, 3, //
                4, 4, 4, 5, 5, 5, 6, 6, 6,
            ],
            3,
            2,
        );
        mirror_horizontal(&mut f);
        assert_eq!(
            f.data,
            vec![
                3, 3, 3, 2, 2, 2, 1, 1, 1, //
                6, 6, 6, 5, 5, 5, 4, 4, 4,
            ]
        );
    }

    #[test]
    fn test_mirror_single_pixel_and_empty() {
        let mut one = frame(vec![9, 8, 7], 1, 1);
        mirror_horizontal(&mut one);
        assert_eq!(one.data, vec![9, 8, 7]);

        let mut empty = frame(Vec::new(), 0, 0);
        mirror_horizontal(&mut empty);
        assert!(empty.data.is_empty());
    }
}
