//! Contact sheet configuration.
//!
//! [`SheetOptions`] carries everything a run needs: grid dimensions, the
//! timestamp toggle, the output path, the canvas [`GridLayout`], and the
//! [`DecodeFailurePolicy`]. Options are passed explicitly to the composer so
//! several grid sizes can be rendered in one process.
//!
//! # Example
//!
//! ```
//! use contact_sheet::{DecodeFailurePolicy, GridLayout, SheetOptions};
//!
//! let options = SheetOptions::new(4, 6)
//!     .with_show_time(true)
//!     .with_output("preview.png")
//!     .with_layout(GridLayout::default().with_dpi(100))
//!     .with_decode_failure(DecodeFailurePolicy::Error);
//! assert_eq!(options.layout.canvas_size(), (3000, 2000));
//! ```

use std::path::{Path, PathBuf};

use image::Rgb;

/// Suffix that replaces the input's extension in the default output path.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_thumbnails.png";

/// Default grid row count.
pub const DEFAULT_ROWS: u32 = 5;

/// Default grid column count.
pub const DEFAULT_COLUMNS: u32 = 5;

/// What to do when the input cannot be decoded at all, or reports no
/// frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeFailurePolicy {
    /// Log a warning and still write a sheet with every cell blank.
    #[default]
    BlankSheet,
    /// Return the error to the caller; nothing is written.
    Error,
}

/// Fixed geometry of the output canvas.
///
/// The canvas is `canvas_width_inches x canvas_height_inches` at `dpi`
/// pixels per inch. Margins are fractions of the canvas measured from its
/// left and bottom edges; spacing is a fraction of the cell width (columns)
/// or height (rows).
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct GridLayout {
    /// Canvas width in inches.
    pub canvas_width_inches: f64,
    /// Canvas height in inches.
    pub canvas_height_inches: f64,
    /// Output resolution in pixels per inch.
    pub dpi: u32,
    /// Left edge of the grid area, as a fraction of the canvas width.
    pub left: f64,
    /// Right edge of the grid area, as a fraction of the canvas width.
    pub right: f64,
    /// Bottom edge of the grid area, as a fraction of the canvas height.
    pub bottom: f64,
    /// Top edge of the grid area, as a fraction of the canvas height.
    pub top: f64,
    /// Gap between columns, as a fraction of a cell's width.
    pub horizontal_spacing: f64,
    /// Gap between rows, as a fraction of a cell's height.
    pub vertical_spacing: f64,
    /// Label font size in points.
    pub label_points: f64,
    /// Canvas and blank cell colour.
    pub background: Rgb<u8>,
    /// Label text colour.
    pub label_color: Rgb<u8>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            canvas_width_inches: 30.0,
            canvas_height_inches: 20.0,
            dpi: 300,
            left: 0.02,
            right: 0.98,
            bottom: 0.05,
            top: 0.95,
            horizontal_spacing: 0.1,
            vertical_spacing: 0.2,
            label_points: 12.0,
            background: Rgb([255, 255, 255]),
            label_color: Rgb([0, 0, 0]),
        }
    }
}

impl GridLayout {
    /// Set the output resolution. Zero is clamped to 1.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Set the canvas size in inches.
    pub fn with_canvas_inches(mut self, width: f64, height: f64) -> Self {
        self.canvas_width_inches = width;
        self.canvas_height_inches = height;
        self
    }

    /// Canvas size in pixels, never smaller than 1x1.
    pub fn canvas_size(&self) -> (u32, u32) {
        let dpi = self.dpi.max(1) as f64;
        let width = (self.canvas_width_inches * dpi).round().max(1.0) as u32;
        let height = (self.canvas_height_inches * dpi).round().max(1.0) as u32;
        (width, height)
    }

    /// Label font size in pixels per em at this resolution.
    pub fn label_pixels(&self) -> u32 {
        (self.label_points / 72.0 * self.dpi.max(1) as f64).round() as u32
    }
}

/// Options for one contact sheet run.
#[derive(Debug, Clone)]
#[must_use]
pub struct SheetOptions {
    /// Number of grid rows.
    pub rows: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Draw a `MM:SS.ss` label above each filled cell.
    pub show_time: bool,
    /// Explicit output path. `None` derives one from the input path.
    pub output: Option<PathBuf>,
    /// Canvas geometry.
    pub layout: GridLayout,
    /// Behaviour when the input cannot be decoded.
    pub decode_failure: DecodeFailurePolicy,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }
}

impl SheetOptions {
    /// Options for a `rows x columns` grid with every other setting at its
    /// default.
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            show_time: false,
            output: None,
            layout: GridLayout::default(),
            decode_failure: DecodeFailurePolicy::default(),
        }
    }

    /// Enable or disable timestamp labels.
    pub fn with_show_time(mut self, show_time: bool) -> Self {
        self.show_time = show_time;
        self
    }

    /// Write the sheet to `path` instead of the derived default.
    pub fn with_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Replace the canvas geometry.
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Choose what happens when the input cannot be decoded.
    pub fn with_decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failure = policy;
        self
    }

    /// The path the sheet for `input` will be written to.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(input))
    }
}

/// Derive the default output path: the input path with its extension
/// replaced by [`DEFAULT_OUTPUT_SUFFIX`].
///
/// ```
/// use std::path::Path;
///
/// use contact_sheet::default_output_path;
///
/// assert_eq!(
///     default_output_path(Path::new("videos/clip.mp4")),
///     Path::new("videos/clip_thumbnails.png"),
/// );
/// ```
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{DEFAULT_OUTPUT_SUFFIX}"))
}
