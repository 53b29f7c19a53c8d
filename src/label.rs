//! Timestamp labels.
//!
//! Labels are laid out and rasterized with `fontdue` from DejaVu Sans Mono,
//! which is embedded in the binary, and the glyph coverage is alpha-blended
//! onto the canvas.

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::{Rgb, RgbImage};

use crate::error::ContactSheetError;

const LABEL_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");

/// Format seconds as `MM:SS.ss`.
///
/// Minutes are `floor(seconds / 60)`, zero-padded to two digits (and allowed
/// to grow past 99); the remainder is zero-padded to two integer digits and
/// two decimals. Negative or non-finite input formats as `00:00.00`.
///
/// ```
/// assert_eq!(contact_sheet::format_timestamp(754.0 / 30.0), "00:25.13");
/// assert_eq!(contact_sheet::format_timestamp(125.5), "02:05.50");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).floor() as u64;
    let remainder = seconds % 60.0;
    format!("{minutes:02}:{remainder:05.2}")
}

/// Draws single-line labels at a fixed pixel size.
pub(crate) struct LabelPainter {
    font: Font,
    pixel_size: f32,
}

impl LabelPainter {
    /// Load the embedded font for text `pixel_size` pixels per em.
    pub(crate) fn new(pixel_size: f32) -> Result<Self, ContactSheetError> {
        let font = Font::from_bytes(LABEL_FONT, FontSettings::default())
            .map_err(|reason| ContactSheetError::LabelFont(reason.to_string()))?;
        Ok(Self {
            font,
            pixel_size: pixel_size.max(1.0),
        })
    }

    pub(crate) fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    fn layout(&self, text: &str, x: f32, y: f32) -> Layout {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y,
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(text, self.pixel_size, 0));
        layout
    }

    /// Advance width and line height of `text`, in pixels.
    pub(crate) fn measure(&self, text: &str) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }
        let width: f32 = text
            .chars()
            .map(|character| self.font.metrics(character, self.pixel_size).advance_width)
            .sum();
        let height = self.layout(text, 0.0, 0.0).height();
        (width.ceil() as u32, height.ceil() as u32)
    }

    /// Draw `text` with the top-left of its line box at `(x, y)`, clipping at
    /// the canvas edges.
    pub(crate) fn draw(&self, canvas: &mut RgbImage, text: &str, x: i64, y: i64, color: Rgb<u8>) {
        let layout = self.layout(text, x as f32, y as f32);
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, coverage) = self.font.rasterize_config(glyph.key);
            blend_coverage(
                canvas,
                glyph.x.round() as i64,
                glyph.y.round() as i64,
                glyph.width,
                &coverage,
                color,
            );
        }
    }
}

/// Blend a row-major coverage mask `width` pixels wide onto `canvas`.
fn blend_coverage(
    canvas: &mut RgbImage,
    x: i64,
    y: i64,
    width: usize,
    coverage: &[u8],
    color: Rgb<u8>,
) {
    let (canvas_width, canvas_height) = (canvas.width() as i64, canvas.height() as i64);
    for (offset, &mask) in coverage.iter().enumerate() {
        if mask == 0 {
            continue;
        }
        let pixel_x = x + (offset % width) as i64;
        let pixel_y = y + (offset / width) as i64;
        if pixel_x < 0 || pixel_y < 0 || pixel_x >= canvas_width || pixel_y >= canvas_height {
            continue;
        }

        let alpha = u16::from(mask);
        let inverse = 255 - alpha;
        let pixel = canvas.get_pixel_mut(pixel_x as u32, pixel_y as u32);
        for channel in 0..3 {
            let source = u16::from(color.0[channel]);
            let destination = u16::from(pixel.0[channel]);
            pixel.0[channel] = ((source * alpha + destination * inverse + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn inked(canvas: &RgbImage) -> Vec<(u32, u32)> {
        canvas
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "00:00.00");
        assert_eq!(format_timestamp(2.5), "00:02.50");
        assert_eq!(format_timestamp(754.0 / 30.0), "00:25.13");
        assert_eq!(format_timestamp(61.25), "01:01.25");
        assert_eq!(format_timestamp(6000.0), "100:00.00");
    }

    #[test]
    fn clamps_invalid_input() {
        assert_eq!(format_timestamp(-3.0), "00:00.00");
        assert_eq!(format_timestamp(f64::NAN), "00:00.00");
    }

    #[test]
    fn embedded_font_covers_timestamp_characters() {
        let painter = LabelPainter::new(24.0).unwrap();
        for character in "0123456789:.".chars() {
            assert_ne!(
                painter.font.lookup_glyph_index(character),
                0,
                "missing glyph for {character:?}"
            );
        }
    }

    #[test]
    fn monospaced_labels_measure_evenly() {
        let painter = LabelPainter::new(20.0).unwrap();
        assert_eq!(painter.measure(""), (0, 0));

        let (single, height) = painter.measure("0");
        let (label, label_height) = painter.measure("00:00.00");
        assert!(single > 0 && height >= 20);
        assert_eq!(label_height, height);
        // Per-glyph rounding only ever loses under a pixel per character.
        assert!(label <= single * 8 && label + 8 >= single * 8);
    }

    #[test]
    fn draws_antialiased_ink_inside_text_box() {
        let painter = LabelPainter::new(24.0).unwrap();
        let (width, height) = painter.measure("12:34.56");
        let mut canvas = RgbImage::from_pixel(width + 20, height + 20, WHITE);
        painter.draw(&mut canvas, "12:34.56", 10, 10, BLACK);

        let ink = inked(&canvas);
        assert!(!ink.is_empty());
        for (x, y) in ink {
            assert!(
                (9..11 + width).contains(&x) && (9..11 + height).contains(&y),
                "ink at {x},{y}"
            );
        }
        assert!(
            canvas
                .pixels()
                .any(|pixel| pixel.0[0] > 0 && pixel.0[0] < 255),
            "expected partially covered edge pixels"
        );
    }

    #[test]
    fn clips_at_canvas_edges() {
        let painter = LabelPainter::new(30.0).unwrap();
        let mut canvas = RgbImage::from_pixel(8, 8, WHITE);
        painter.draw(&mut canvas, "8888", -40, -40, BLACK);
        painter.draw(&mut canvas, "8", 2, -10, BLACK);
        assert_eq!(canvas.dimensions(), (8, 8));
    }
}
