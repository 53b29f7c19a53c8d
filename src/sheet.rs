//! End-to-end contact sheet generation.
//!
//! [`ContactSheet`] ties the pieces together: open the input, compute the
//! [`SampleSchedule`], sample one forward pass, compose, save. The run is
//! split into [`ContactSheet::prepare`] and [`PreparedSheet::render`] so a
//! caller can report the stream metadata before the scan starts.
//!
//! # Example
//!
//! ```no_run
//! use contact_sheet::{ContactSheet, ContactSheetError, SheetOptions};
//!
//! let summary = ContactSheet::new(SheetOptions::new(4, 4).with_show_time(true))
//!     .generate("input.mp4")?;
//! println!("saved {}", summary.output.display());
//! # Ok::<(), ContactSheetError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::composer::{Composer, OutputImage};
use crate::configuration::{DecodeFailurePolicy, SheetOptions};
use crate::error::ContactSheetError;
use crate::frames::FrameSource;
use crate::media::MediaFile;
use crate::metadata::VideoMetadata;
use crate::progress::{NoOpProgress, ProgressObserver};
use crate::sampler::{SampleSchedule, Sampler};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct SheetSummary {
    /// Input path.
    pub input: PathBuf,
    /// Path the sheet was written to.
    pub output: PathBuf,
    /// Stream metadata the schedule was computed from.
    pub metadata: VideoMetadata,
    /// Gap between sampled frames.
    pub stride: u64,
    /// Indices of the frames that made it onto the sheet.
    pub sampled_indices: Vec<u64>,
    /// Cells left blank.
    pub blank_cells: usize,
}

/// Contact sheet generator for a fixed set of [`SheetOptions`].
#[derive(Debug, Clone, Default)]
pub struct ContactSheet {
    options: SheetOptions,
}

impl ContactSheet {
    /// Create a generator.
    pub fn new(options: SheetOptions) -> Self {
        Self { options }
    }

    /// Open `input` and compute its sampling schedule.
    ///
    /// Under [`DecodeFailurePolicy::BlankSheet`] an input that cannot be
    /// opened, or that reports no frames, is logged and prepared as an empty
    /// stream so that a blank sheet is still written.
    ///
    /// # Errors
    ///
    /// [`ContactSheetError::InvalidGrid`] for a zero-sized grid. Under
    /// [`DecodeFailurePolicy::Error`], also the open error, or
    /// [`ContactSheetError::EmptyStream`] for a zero-frame stream.
    pub fn prepare<P: AsRef<Path>>(&self, input: P) -> Result<PreparedSheet, ContactSheetError> {
        let input = input.as_ref();
        // Reject a bad grid before touching the file.
        SampleSchedule::new(0, self.options.rows, self.options.columns)?;

        let media = match MediaFile::open(input) {
            Ok(media) => Some(media),
            Err(error) => match self.options.decode_failure {
                DecodeFailurePolicy::Error => return Err(error),
                DecodeFailurePolicy::BlankSheet => {
                    log::warn!("{error}; writing a blank sheet");
                    None
                }
            },
        };

        let metadata = media
            .as_ref()
            .map(|media| media.metadata().clone())
            .unwrap_or_else(VideoMetadata::empty);

        if metadata.frame_count == 0 && media.is_some() {
            match self.options.decode_failure {
                DecodeFailurePolicy::Error => {
                    return Err(ContactSheetError::EmptyStream(input.to_path_buf()));
                }
                DecodeFailurePolicy::BlankSheet => {
                    log::warn!("{} reports no frames; writing a blank sheet", input.display());
                }
            }
        }

        let schedule =
            SampleSchedule::new(metadata.frame_count, self.options.rows, self.options.columns)?;

        Ok(PreparedSheet {
            options: self.options.clone(),
            input: input.to_path_buf(),
            output: self.options.output_path_for(input),
            media,
            metadata,
            schedule,
        })
    }

    /// Prepare and render `input` without progress reporting.
    ///
    /// # Errors
    ///
    /// See [`prepare`](ContactSheet::prepare) and
    /// [`PreparedSheet::render`].
    pub fn generate<P: AsRef<Path>>(&self, input: P) -> Result<SheetSummary, ContactSheetError> {
        self.prepare(input)?.render(&NoOpProgress)
    }

    /// Sample an arbitrary [`FrameSource`] and compose the result, without
    /// saving it.
    ///
    /// # Errors
    ///
    /// [`ContactSheetError::InvalidGrid`] for a zero-sized grid.
    pub fn compose_source<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        total_frames: u64,
        observer: &dyn ProgressObserver,
    ) -> Result<OutputImage, ContactSheetError> {
        let schedule = SampleSchedule::new(total_frames, self.options.rows, self.options.columns)?;
        let frames = Sampler::new(schedule).sample_with_observer(source, observer);
        Composer::new(&self.options).compose(frames)
    }
}

/// An opened input with its schedule, ready to render.
///
/// Dropping a `PreparedSheet` closes the input.
#[derive(Debug)]
pub struct PreparedSheet {
    options: SheetOptions,
    input: PathBuf,
    output: PathBuf,
    media: Option<MediaFile>,
    metadata: VideoMetadata,
    schedule: SampleSchedule,
}

impl PreparedSheet {
    /// Input path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Resolved output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Stream metadata, empty if the input could not be opened.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// The sampling schedule.
    pub fn schedule(&self) -> &SampleSchedule {
        &self.schedule
    }

    /// Scan the input, compose the sheet and write it to
    /// [`output`](PreparedSheet::output).
    ///
    /// The input is closed before composition starts, whether the scan
    /// filled the quota, hit the end of the stream, or stopped on a decode
    /// error.
    ///
    /// # Errors
    ///
    /// A failure to save the image is returned as
    /// [`ContactSheetError::ImageError`]. Under
    /// [`DecodeFailurePolicy::Error`], a failure to set up the decoder is
    /// returned as well.
    pub fn render(mut self, observer: &dyn ProgressObserver) -> Result<SheetSummary, ContactSheetError> {
        let composer = Composer::new(&self.options);
        let sampler = Sampler::new(self.schedule);

        let frames = match self.media.take() {
            Some(mut media) => {
                let decoded = media.frames(Some(composer.cell_size()));
                match decoded {
                    Ok(mut source) => sampler.sample_with_observer(&mut source, observer),
                    Err(error) => match self.options.decode_failure {
                        DecodeFailurePolicy::Error => return Err(error),
                        DecodeFailurePolicy::BlankSheet => {
                            log::warn!("{error}; writing a blank sheet");
                            Vec::new()
                        }
                    },
                }
            }
            None => Vec::new(),
        };

        let sampled_indices: Vec<u64> = frames.iter().map(|frame| frame.index).collect();
        let sheet = composer.compose(frames)?;
        sheet.save(&self.output)?;
        log::info!("Saved contact sheet to {}", self.output.display());

        Ok(SheetSummary {
            input: self.input,
            output: self.output,
            metadata: self.metadata,
            stride: self.schedule.stride(),
            sampled_indices,
            blank_cells: sheet.blank_cells,
        })
    }
}
