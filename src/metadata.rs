//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`MediaFile`](crate::MediaFile) is
//! opened and drives the sampling schedule.

use std::time::Duration;

/// Metadata for the best video stream of a media file.
///
/// # Example
///
/// ```no_run
/// use contact_sheet::MediaFile;
///
/// let media = MediaFile::open("input.mp4").unwrap();
/// let video = media.metadata();
/// println!("{} frames @ {:.2} fps", video.frame_count, video.frames_per_second);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames.
    ///
    /// Taken from the stream header when the container records it, otherwise
    /// estimated from duration and frame rate. Either way it can overstate
    /// what the decoder actually delivers.
    pub frame_count: u64,
    /// Container-level duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Metadata describing a stream with no frames.
    ///
    /// Used when a file cannot be decoded and the caller asked for a blank
    /// sheet instead of an error.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            frames_per_second: 0.0,
            frame_count: 0,
            duration: Duration::ZERO,
            codec: "none".to_string(),
        }
    }
}
