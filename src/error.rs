//! Error types for the `contact_sheet` crate.
//!
//! This module defines [`ContactSheetError`], the unified error type returned
//! by every fallible operation in the crate. Variants carry the path or
//! upstream message needed to diagnose the failure.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `contact_sheet` operations.
///
/// Only failures that matter to the caller surface here. A stream that ends
/// early, or a frame that fails to decode mid-stream, is absorbed by the
/// sampler and shows up as fewer thumbnails instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContactSheetError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video stream reports zero frames.
    #[error("Video stream at {0} reports no frames")]
    EmptyStream(PathBuf),

    /// A grid dimension of zero was requested.
    #[error("Invalid grid {rows}x{columns}: rows and columns must be at least 1")]
    InvalidGrid {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The embedded label font could not be parsed.
    #[error("Failed to load label font: {0}")]
    LabelFont(String),

    /// An I/O error occurred while writing the output.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while composing or saving the sheet.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for ContactSheetError {
    fn from(error: FfmpegError) -> Self {
        ContactSheetError::FfmpegError(error.to_string())
    }
}
