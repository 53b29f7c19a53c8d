//! Contact sheet composition.
//!
//! [`Composer`] lays sampled frames out row-major on a fixed-size canvas,
//! optionally labels each filled cell with its timestamp, and leaves the
//! remaining cells blank. It never decodes anything itself.
//!
//! # Example
//!
//! ```
//! use contact_sheet::{Composer, GridLayout, SheetOptions};
//!
//! let options = SheetOptions::new(2, 3).with_layout(GridLayout::default().with_dpi(20));
//! let sheet = Composer::new(&options).compose(Vec::new())?;
//! assert_eq!(sheet.blank_cells, 6);
//! assert_eq!(sheet.image.dimensions(), (600, 400));
//! # Ok::<(), contact_sheet::ContactSheetError>(())
//! ```

use std::{fs::File, io::BufWriter, path::Path};

use image::{GenericImage, ImageFormat, RgbImage, imageops::FilterType};

use crate::configuration::{GridLayout, SheetOptions};
use crate::conversion::fit_within;
use crate::error::ContactSheetError;
use crate::label::LabelPainter;
use crate::sampler::SampledFrame;

/// Pixel rectangle of one grid cell on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Sampled frames assigned to grid cells.
///
/// `cells` always holds `rows * columns` entries, filled row-major in
/// sampling order; trailing cells are `None`.
#[derive(Debug, Clone)]
pub struct ThumbnailGrid {
    columns: u32,
    cells: Vec<Option<SampledFrame>>,
}

impl ThumbnailGrid {
    /// Assign `frames` to a `rows x columns` grid. Frames that do not fit
    /// are dropped.
    pub fn new(rows: u32, columns: u32, frames: Vec<SampledFrame>) -> Self {
        let capacity = rows as usize * columns as usize;
        if frames.len() > capacity {
            log::debug!(
                "Dropping {} frames that do not fit a {rows}x{columns} grid",
                frames.len() - capacity
            );
        }
        let mut cells: Vec<Option<SampledFrame>> =
            frames.into_iter().take(capacity).map(Some).collect();
        cells.resize_with(capacity, || None);
        Self { columns, cells }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[Option<SampledFrame>] {
        &self.cells
    }

    /// Number of cells holding a frame.
    pub fn filled_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Number of empty cells.
    pub fn blank_cells(&self) -> usize {
        self.cells.len() - self.filled_cells()
    }

    /// Consume the grid, yielding `(row, column, cell)` in row-major order.
    pub fn into_cells(self) -> impl Iterator<Item = (u32, u32, Option<SampledFrame>)> {
        let columns = self.columns;
        self.cells.into_iter().enumerate().map(move |(index, cell)| {
            let index = index as u32;
            (index / columns, index % columns, cell)
        })
    }
}

/// The composed raster, ready to be written once.
#[derive(Debug, Clone)]
pub struct OutputImage {
    /// Composed pixels.
    pub image: RgbImage,
    /// Resolution the canvas was laid out at.
    pub dpi: u32,
    /// Cells that received a frame.
    pub filled_cells: usize,
    /// Cells left blank.
    pub blank_cells: usize,
}

impl OutputImage {
    /// Write the sheet to `path` as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`ContactSheetError::IoError`] if the file cannot be created
    /// and [`ContactSheetError::ImageError`] if encoding fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ContactSheetError> {
        let path = path.as_ref();
        log::debug!(
            "Saving {}x{} sheet to {}",
            self.image.width(),
            self.image.height(),
            path.display()
        );
        let mut writer = BufWriter::new(File::create(path)?);
        self.image.write_to(&mut writer, ImageFormat::Png)?;
        Ok(())
    }
}

/// Lays sampled frames out into a contact sheet.
#[derive(Debug, Clone)]
pub struct Composer {
    rows: u32,
    columns: u32,
    show_time: bool,
    layout: GridLayout,
}

impl Composer {
    /// Create a composer for the grid, labels and layout in `options`.
    pub fn new(options: &SheetOptions) -> Self {
        Self {
            rows: options.rows,
            columns: options.columns,
            show_time: options.show_time,
            layout: options.layout.clone(),
        }
    }

    /// Pixel rectangles of every cell, row-major.
    pub fn cell_rects(&self) -> Vec<CellRect> {
        let (canvas_width, canvas_height) = self.layout.canvas_size();
        let (canvas_width, canvas_height) = (canvas_width as f64, canvas_height as f64);
        let layout = &self.layout;
        let columns = self.columns.max(1) as f64;
        let rows = self.rows.max(1) as f64;

        let area_width = canvas_width * (layout.right - layout.left);
        let area_height = canvas_height * (layout.top - layout.bottom);
        let cell_width = area_width / (columns + layout.horizontal_spacing * (columns - 1.0));
        let cell_height = area_height / (rows + layout.vertical_spacing * (rows - 1.0));
        let origin_x = canvas_width * layout.left;
        let origin_y = canvas_height * (1.0 - layout.top);

        let mut rects = Vec::with_capacity(self.rows as usize * self.columns as usize);
        for row in 0..self.rows {
            for column in 0..self.columns {
                let x = origin_x + column as f64 * cell_width * (1.0 + layout.horizontal_spacing);
                let y = origin_y + row as f64 * cell_height * (1.0 + layout.vertical_spacing);
                rects.push(CellRect {
                    x: x.round() as u32,
                    y: y.round() as u32,
                    width: (cell_width.floor() as u32).max(1),
                    height: (cell_height.floor() as u32).max(1),
                });
            }
        }
        rects
    }

    /// Largest cell size, used to have the decoder scale frames down early.
    pub fn cell_size(&self) -> (u32, u32) {
        self.cell_rects()
            .first()
            .map(|rect| (rect.width, rect.height))
            .unwrap_or((1, 1))
    }

    /// Compose `frames` into a single image.
    ///
    /// Frames fill cells row-major in the order given; each is converted to
    /// RGB, scaled to fit its cell with the aspect ratio kept, and centred.
    /// With labels enabled, each filled cell gets its `MM:SS.ss` timestamp
    /// centred above it. Unused cells stay background-coloured.
    ///
    /// # Errors
    ///
    /// Returns [`ContactSheetError::InvalidGrid`] for a zero-sized grid.
    pub fn compose(&self, frames: Vec<SampledFrame>) -> Result<OutputImage, ContactSheetError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ContactSheetError::InvalidGrid {
                rows: self.rows,
                columns: self.columns,
            });
        }

        let (canvas_width, canvas_height) = self.layout.canvas_size();
        let mut canvas = RgbImage::from_pixel(canvas_width, canvas_height, self.layout.background);
        let rects = self.cell_rects();
        let painter = if self.show_time {
            Some(LabelPainter::new(self.layout.label_pixels() as f32)?)
        } else {
            None
        };

        let grid = ThumbnailGrid::new(self.rows, self.columns, frames);
        let (filled_cells, blank_cells) = (grid.filled_cells(), grid.blank_cells());
        log::debug!(
            "Composing {}x{} sheet: {filled_cells} filled, {blank_cells} blank",
            self.rows,
            self.columns
        );

        for ((_, _, cell), rect) in grid.into_cells().zip(rects) {
            let Some(frame) = cell else {
                continue;
            };
            self.place_frame(&mut canvas, &frame, rect)?;
            if let Some(painter) = &painter {
                self.place_label(&mut canvas, painter, &frame.label(), rect);
            }
        }

        Ok(OutputImage {
            image: canvas,
            dpi: self.layout.dpi,
            filled_cells,
            blank_cells,
        })
    }

    fn place_frame(
        &self,
        canvas: &mut RgbImage,
        frame: &SampledFrame,
        rect: CellRect,
    ) -> Result<(), ContactSheetError> {
        let rgb = frame.image.to_rgb8();
        let (width, height) = fit_within(rgb.width(), rgb.height(), rect.width, rect.height);
        let thumbnail = if (width, height) == rgb.dimensions() {
            rgb
        } else {
            image::imageops::resize(&rgb, width, height, FilterType::Triangle)
        };

        let x = rect.x + (rect.width - width) / 2;
        let y = rect.y + (rect.height - height) / 2;
        canvas.copy_from(&thumbnail, x, y)?;
        Ok(())
    }

    fn place_label(
        &self,
        canvas: &mut RgbImage,
        painter: &LabelPainter,
        text: &str,
        rect: CellRect,
    ) {
        let (text_width, text_height) = painter.measure(text);
        // Half an em of padding above the cell.
        let gap = (painter.pixel_size() / 2.0).round() as i64;
        let x = rect.x as i64 + (rect.width as i64 - text_width as i64) / 2;
        let y = rect.y as i64 - gap - text_height as i64;
        painter.draw(canvas, text, x, y, self.layout.label_color);
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgb};

    use super::*;

    fn solid_frame(index: u64, color: [u8; 3]) -> SampledFrame {
        SampledFrame {
            index,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 9, Rgb(color))),
            timestamp_seconds: index as f64 / 10.0,
        }
    }

    fn small_options(rows: u32, columns: u32) -> SheetOptions {
        SheetOptions::new(rows, columns).with_layout(GridLayout::default().with_dpi(10))
    }

    #[test]
    fn grid_fills_row_major_and_pads_with_blanks() {
        let frames = (0..3).map(|i| solid_frame(i * 10, [0, 0, 0])).collect();
        let grid = ThumbnailGrid::new(2, 2, frames);

        assert_eq!(grid.cells().len(), 4);
        assert_eq!(grid.filled_cells(), 3);
        assert_eq!(grid.blank_cells(), 1);

        let positions: Vec<(u32, u32, Option<u64>)> = grid
            .into_cells()
            .map(|(row, column, cell)| (row, column, cell.map(|frame| frame.index)))
            .collect();
        assert_eq!(
            positions,
            vec![
                (0, 0, Some(0)),
                (0, 1, Some(10)),
                (1, 0, Some(20)),
                (1, 1, None)
            ]
        );
    }

    #[test]
    fn grid_drops_overflowing_frames() {
        let frames = (0..5).map(|i| solid_frame(i, [0, 0, 0])).collect();
        let grid = ThumbnailGrid::new(1, 2, frames);
        assert_eq!(grid.filled_cells(), 2);
        assert_eq!(grid.blank_cells(), 0);
    }

    #[test]
    fn cells_stay_inside_canvas_and_do_not_overlap() {
        let composer = Composer::new(&small_options(3, 4));
        let (canvas_width, canvas_height) = GridLayout::default().with_dpi(10).canvas_size();
        let rects = composer.cell_rects();
        assert_eq!(rects.len(), 12);

        for rect in &rects {
            assert!(rect.x + rect.width <= canvas_width);
            assert!(rect.y + rect.height <= canvas_height);
        }
        for row in rects.chunks(4) {
            for pair in row.windows(2) {
                assert!(pair[0].x + pair[0].width < pair[1].x);
                assert_eq!(pair[0].y, pair[1].y);
            }
        }
        assert!(rects[0].y + rects[0].height < rects[4].y);
    }

    #[test]
    fn compose_places_frames_in_cells() {
        let options = small_options(1, 2);
        let composer = Composer::new(&options);
        let rects = composer.cell_rects();
        let sheet = composer
            .compose(vec![solid_frame(0, [255, 0, 0])])
            .unwrap();

        assert_eq!((sheet.filled_cells, sheet.blank_cells), (1, 1));

        let first = rects[0];
        let centre = sheet
            .image
            .get_pixel(first.x + first.width / 2, first.y + first.height / 2);
        assert_eq!(*centre, Rgb([255, 0, 0]));

        let second = rects[1];
        let blank = sheet
            .image
            .get_pixel(second.x + second.width / 2, second.y + second.height / 2);
        assert_eq!(*blank, Rgb([255, 255, 255]));
    }

    #[test]
    fn labels_only_when_enabled() {
        let frames = || vec![solid_frame(25, [200, 200, 200])];
        let dark_pixels =
            |image: &RgbImage| image.pixels().filter(|pixel| pixel.0[0] < 128).count();
        let options = SheetOptions::new(1, 1).with_layout(GridLayout::default().with_dpi(100));

        let plain = Composer::new(&options).compose(frames()).unwrap();
        let labelled = Composer::new(&options.clone().with_show_time(true))
            .compose(frames())
            .unwrap();

        assert_eq!(dark_pixels(&plain.image), 0);
        assert!(dark_pixels(&labelled.image) > 0);
    }

    #[test]
    fn label_sits_centred_in_the_gap_above_its_cell() {
        let options = SheetOptions::new(1, 1)
            .with_layout(GridLayout::default().with_dpi(100))
            .with_show_time(true);
        let composer = Composer::new(&options);
        let rect = composer.cell_rects()[0];
        let sheet = composer.compose(vec![solid_frame(0, [200, 200, 200])]).unwrap();

        let ink: Vec<(u32, u32)> = sheet
            .image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!ink.is_empty());
        assert!(ink.iter().all(|&(_, y)| y < rect.y));

        let left = ink.iter().map(|&(x, _)| x).min().unwrap();
        let right = ink.iter().map(|&(x, _)| x).max().unwrap();
        let centre = rect.x + rect.width / 2;
        assert!((left + right) / 2 >= centre - 3 && (left + right) / 2 <= centre + 3);
    }

    #[test]
    fn save_reports_uncreatable_file_as_io_error() {
        let directory = tempfile::tempdir().unwrap();
        let sheet = Composer::new(&small_options(1, 1)).compose(Vec::new()).unwrap();
        let result = sheet.save(directory.path().join("missing").join("sheet.png"));
        assert!(matches!(result, Err(ContactSheetError::IoError(_))));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let result = Composer::new(&SheetOptions::new(0, 3)).compose(Vec::new());
        assert!(matches!(result, Err(ContactSheetError::InvalidGrid { .. })));
    }
}
