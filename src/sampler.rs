//! Even-cadence frame sampling.
//!
//! A [`SampleSchedule`] turns the stream's frame count and the grid size
//! into a fixed stride. The [`Sampler`] then reads the stream once, front to
//! back, keeping every `stride`-th frame until the grid is full or the
//! stream runs out.
//!
//! # Example
//!
//! ```no_run
//! use contact_sheet::{ContactSheetError, MediaFile, SampleSchedule, Sampler};
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! let schedule = SampleSchedule::new(media.metadata().frame_count, 5, 5)?;
//! let mut frames = media.frames(None)?;
//! let sampled = Sampler::new(schedule).sample(&mut frames);
//! println!("kept {} frames every {} frames", sampled.len(), schedule.stride());
//! # Ok::<(), ContactSheetError>(())
//! ```

use image::DynamicImage;

use crate::error::ContactSheetError;
use crate::frames::FrameSource;
use crate::label::format_timestamp;
use crate::progress::{NoOpProgress, ProgressObserver, ProgressTracker};

/// How many frames to read between progress notifications.
const PROGRESS_BATCH_SIZE: u64 = 10;

/// Fixed sampling cadence for one run.
///
/// `stride = max(1, floor(total_frames / (grid_rows * grid_cols)))`. The
/// schedule is computed once from stream metadata and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSchedule {
    total_frames: u64,
    grid_rows: u32,
    grid_cols: u32,
    stride: u64,
}

impl SampleSchedule {
    /// Compute the schedule for a stream of `total_frames` frames laid out
    /// in a `grid_rows x grid_cols` grid.
    ///
    /// # Errors
    ///
    /// Returns [`ContactSheetError::InvalidGrid`] if either dimension is zero.
    pub fn new(total_frames: u64, grid_rows: u32, grid_cols: u32) -> Result<Self, ContactSheetError> {
        if grid_rows == 0 || grid_cols == 0 {
            return Err(ContactSheetError::InvalidGrid {
                rows: grid_rows,
                columns: grid_cols,
            });
        }
        let quota = grid_rows as u64 * grid_cols as u64;
        let stride = (total_frames / quota).max(1);
        log::debug!(
            "Sampling {total_frames} frames into {grid_rows}x{grid_cols} grid, stride {stride}"
        );
        Ok(Self {
            total_frames,
            grid_rows,
            grid_cols,
            stride,
        })
    }

    /// Frame count the schedule was computed from.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Grid row count.
    pub fn grid_rows(&self) -> u32 {
        self.grid_rows
    }

    /// Grid column count.
    pub fn grid_cols(&self) -> u32 {
        self.grid_cols
    }

    /// Gap, in frames, between consecutive samples. Always at least 1.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of grid cells, `grid_rows * grid_cols`.
    pub fn quota(&self) -> u64 {
        self.grid_rows as u64 * self.grid_cols as u64
    }

    /// Whether the frame at `index` falls on a stride boundary.
    pub fn is_sample_point(&self, index: u64) -> bool {
        index % self.stride == 0
    }

    /// Number of samples a stream that delivers all `total_frames` frames
    /// will yield.
    pub fn expected_samples(&self) -> u64 {
        self.total_frames.div_ceil(self.stride).min(self.quota())
    }
}

/// One frame selected for the contact sheet.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Zero-based position of the frame in the decoded stream.
    pub index: u64,
    /// Decoded pixels.
    pub image: DynamicImage,
    /// Presentation time, `index / frames_per_second`.
    pub timestamp_seconds: f64,
}

impl SampledFrame {
    /// The frame's timestamp formatted as `MM:SS.ss`.
    pub fn label(&self) -> String {
        format_timestamp(self.timestamp_seconds)
    }
}

/// Single forward pass over a [`FrameSource`] following a [`SampleSchedule`].
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    schedule: SampleSchedule,
}

impl Sampler {
    /// Create a sampler for `schedule`.
    pub fn new(schedule: SampleSchedule) -> Self {
        Self { schedule }
    }

    /// Sample `source` without progress reporting.
    pub fn sample<S: FrameSource + ?Sized>(&self, source: &mut S) -> Vec<SampledFrame> {
        self.sample_with_observer(source, &NoOpProgress)
    }

    /// Sample `source`, reporting every frame read to `observer`.
    ///
    /// Reading stops when the quota is filled, the stream ends, or the
    /// running index reaches `total_frames`. A decode error is treated as the
    /// end of the stream: the frames gathered so far are returned and the
    /// error is logged.
    pub fn sample_with_observer<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        observer: &dyn ProgressObserver,
    ) -> Vec<SampledFrame> {
        let schedule = &self.schedule;
        let quota = schedule.quota() as usize;
        let frames_per_second = source.frames_per_second();
        let mut tracker = ProgressTracker::new(
            observer,
            Some(schedule.total_frames()),
            PROGRESS_BATCH_SIZE,
        );
        let mut sampled = Vec::with_capacity(schedule.expected_samples() as usize);
        let mut index = 0_u64;

        while index < schedule.total_frames() && sampled.len() < quota {
            match source.grab() {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!(
                        "Stream ended after {index} of {} frames",
                        schedule.total_frames()
                    );
                    break;
                }
                Err(error) => {
                    log::warn!("Stopping at frame {index}: {error}");
                    break;
                }
            }

            let keep = schedule.is_sample_point(index);
            if keep {
                match source.retrieve() {
                    Ok(image) => sampled.push(SampledFrame {
                        index,
                        image,
                        timestamp_seconds: index_to_seconds(index, frames_per_second),
                    }),
                    Err(error) => {
                        log::warn!("Stopping at frame {index}: {error}");
                        break;
                    }
                }
            }

            tracker.advance(keep);
            index += 1;
        }

        tracker.finish();
        log::debug!("Sampled {} of {} frames", sampled.len(), quota);
        sampled
    }
}

/// Seconds at frame `index`; zero when the frame rate is unknown.
fn index_to_seconds(index: u64, frames_per_second: f64) -> f64 {
    if frames_per_second.is_finite() && frames_per_second > 0.0 {
        index as f64 / frames_per_second
    } else {
        0.0
    }
}
