//! # contact_sheet
//!
//! Sample a video at an even cadence and compose the sampled frames into a
//! single grid image, a "contact sheet", for an at-a-glance preview.
//!
//! Decoding goes through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; composition
//! and PNG output through [`image`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use contact_sheet::{ContactSheet, SheetOptions};
//!
//! let options = SheetOptions::new(5, 5).with_show_time(true);
//! let summary = ContactSheet::new(options).generate("input.mp4").unwrap();
//! println!("{} -> {}", summary.input.display(), summary.output.display());
//! ```
//!
//! ## How it works
//!
//! - **Sampling**: the stride is `max(1, floor(frames / (rows * cols)))`.
//!   The stream is read once, front to back, and every frame whose index is
//!   a multiple of the stride is kept until the grid is full. A stream that
//!   ends early, or stops decoding, simply yields fewer thumbnails.
//! - **Composition**: frames fill the grid row-major on a fixed canvas
//!   (30 x 20 inches at 300 DPI by default), optionally labelled with
//!   `MM:SS.ss` timestamps. Unused cells are left blank.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod composer;
pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod frames;
pub mod label;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod sheet;

pub use composer::{CellRect, Composer, OutputImage, ThumbnailGrid};
pub use configuration::{
    DEFAULT_COLUMNS, DEFAULT_OUTPUT_SUFFIX, DEFAULT_ROWS, DecodeFailurePolicy, GridLayout,
    SheetOptions, default_output_path,
};
pub use error::ContactSheetError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frames::{FrameIterator, FrameSource};
pub use label::format_timestamp;
pub use media::MediaFile;
pub use metadata::VideoMetadata;
pub use progress::{NoOpProgress, ProgressInfo, ProgressObserver};
pub use sampler::{SampleSchedule, SampledFrame, Sampler};
pub use sheet::{ContactSheet, PreparedSheet, SheetSummary};
