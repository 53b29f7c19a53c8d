//! Core [`MediaFile`] implementation.
//!
//! `MediaFile` opens a media file through FFmpeg, locates its best video
//! stream, caches that stream's metadata and hands out a sequential
//! [`FrameIterator`] for decoding.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    conversion::rate_to_frames_per_second, error::ContactSheetError, frames::FrameIterator,
    metadata::VideoMetadata,
};

/// An opened media file with a decodable video stream.
///
/// The FFmpeg input context is closed when the `MediaFile` is dropped, so
/// every exit path of a sampling run releases the stream handle.
///
/// # Example
///
/// ```no_run
/// use contact_sheet::{ContactSheetError, MediaFile};
///
/// let mut media = MediaFile::open("input.mp4")?;
/// println!("{} frames", media.metadata().frame_count);
/// let frames = media.frames(None)?;
/// # Ok::<(), ContactSheetError>(())
/// ```
pub struct MediaFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Cached metadata of the best video stream.
    pub(crate) metadata: VideoMetadata,
    /// Index of the best video stream.
    pub(crate) video_stream_index: usize,
    /// Path the file was opened from.
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file and read its video stream metadata.
    ///
    /// Initializes FFmpeg (idempotent), opens the file and picks the best
    /// video stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContactSheetError::FileOpen`] if the file cannot be opened or
    /// its codec parameters cannot be read, and
    /// [`ContactSheetError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContactSheetError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| ContactSheetError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| ContactSheetError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(ContactSheetError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                ContactSheetError::FileOpen {
                    path: file_path.clone(),
                    reason: format!(
                        "Failed to read video codec parameters for stream {video_stream_index}: {error}"
                    ),
                }
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| ContactSheetError::FileOpen {
                    path: file_path.clone(),
                    reason: format!(
                        "Failed to create video decoder for stream {video_stream_index}: {error}"
                    ),
                })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frames_per_second = rate_to_frames_per_second(stream.avg_frame_rate())
            .or_else(|| rate_to_frames_per_second(stream.rate()))
            .unwrap_or(0.0);

        // Prefer the frame count recorded in the container; fall back to an
        // estimate from duration when the muxer left it out.
        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: video_decoder.width(),
            height: video_decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, {} frames [{}]",
            video_stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            file_path,
        })
    }

    /// Metadata of the video stream, read at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Start a sequential decode from the first frame.
    ///
    /// When `max_size` is given, frames are scaled by FFmpeg to fit inside
    /// `(width, height)` with the aspect ratio preserved; otherwise they keep
    /// the source resolution.
    ///
    /// # Errors
    ///
    /// Returns an FFmpeg error if the decoder or scaler cannot be created.
    pub fn frames(
        &mut self,
        max_size: Option<(u32, u32)>,
    ) -> Result<FrameIterator<'_>, ContactSheetError> {
        FrameIterator::new(self, max_size)
    }
}
