//! Pixel and rate conversion helpers shared by the decoder.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use image::{DynamicImage, RgbImage};

use crate::error::ContactSheetError;

/// Copy an RGB24 FFmpeg frame into an [`image`] buffer.
///
/// The frame must already have been scaled to `width x height` in
/// `Pixel::RGB24`, which is the display channel ordering the composer
/// expects.
pub(crate) fn rgb_frame_to_image(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ContactSheetError> {
    let buffer = pack_rows(
        video_frame.data(0),
        video_frame.stride(0),
        (width as usize) * 3,
        height as usize,
    );
    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ContactSheetError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}

/// Strip per-row padding from a plane of `height` rows laid out `stride`
/// bytes apart, keeping `row_bytes` bytes of each row.
pub(crate) fn pack_rows(data: &[u8], stride: usize, row_bytes: usize, height: usize) -> Vec<u8> {
    if stride == row_bytes {
        return data[..row_bytes * height].to_vec();
    }
    let mut buffer = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Convert an FFmpeg rate to frames per second, `None` when it is unset.
pub(crate) fn rate_to_frames_per_second(rate: Rational) -> Option<f64> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return None;
    }
    Some(rate.numerator() as f64 / rate.denominator() as f64)
}

/// Largest `(width, height)` that fits inside `max_width x max_height` while
/// keeping the `width:height` aspect ratio. Never returns a zero dimension.
pub(crate) fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_width.max(1), max_height.max(1));
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let fitted_width = ((width as f64) * scale).round() as u32;
    let fitted_height = ((height as f64) * scale).round() as u32;
    (
        fitted_width.clamp(1, max_width.max(1)),
        fitted_height.clamp(1, max_height.max(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        assert_eq!(fit_within(1920, 1080, 640, 640), (640, 360));
        assert_eq!(fit_within(1080, 1920, 640, 640), (360, 640));
        assert_eq!(fit_within(100, 100, 50, 20), (20, 20));
    }

    #[test]
    fn fit_within_upscales_small_sources() {
        assert_eq!(fit_within(160, 90, 320, 320), (320, 180));
    }

    #[test]
    fn fit_within_never_returns_zero() {
        assert_eq!(fit_within(0, 0, 10, 10), (10, 10));
        assert_eq!(fit_within(10_000, 1, 10, 10), (10, 1));
    }

    #[test]
    fn pack_rows_without_padding_is_a_plain_copy() {
        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(pack_rows(&data, 3, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn pack_rows_drops_stride_padding() {
        // Two rows of three bytes, each padded to a stride of five.
        let data = [1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        assert_eq!(pack_rows(&data, 5, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn rate_to_frames_per_second_handles_unset_rates() {
        assert_eq!(rate_to_frames_per_second(Rational::new(30, 1)), Some(30.0));
        assert_eq!(
            rate_to_frames_per_second(Rational::new(30000, 1001)),
            Some(30000.0 / 1001.0)
        );
        assert_eq!(rate_to_frames_per_second(Rational::new(0, 0)), None);
        assert_eq!(rate_to_frames_per_second(Rational::new(25, 0)), None);
    }
}
