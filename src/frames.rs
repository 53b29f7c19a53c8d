//! Sequential frame sources.
//!
//! [`FrameSource`] is the seam between decoding and sampling: the sampler
//! only ever asks for "the next frame" and, for frames it keeps, "the pixels
//! of the frame you just read". [`FrameIterator`] is the FFmpeg-backed
//! implementation; tests drive the sampler with synthetic sources.
//!
//! # Example
//!
//! ```no_run
//! use contact_sheet::{ContactSheetError, FrameSource, MediaFile};
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! let mut frames = media.frames(Some((320, 180)))?;
//!
//! let mut index = 0;
//! while frames.grab()? {
//!     if index % 100 == 0 {
//!         frames.retrieve()?.save(format!("frame_{index}.png"))?;
//!     }
//!     index += 1;
//! }
//! # Ok::<(), ContactSheetError>(())
//! ```

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    error::EAGAIN,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::conversion::{fit_within, rgb_frame_to_image};
use crate::error::ContactSheetError;
use crate::media::MediaFile;

/// A forward-only stream of decoded video frames.
///
/// Reading is split in two so that frames the caller is not interested in
/// never pay for pixel conversion: [`grab`](FrameSource::grab) advances to
/// the next frame, [`retrieve`](FrameSource::retrieve) converts the frame
/// most recently grabbed.
pub trait FrameSource {
    /// Frame rate used to turn frame indices into timestamps.
    ///
    /// May be `0.0` when the container does not record one.
    fn frames_per_second(&self) -> f64;

    /// Advance to the next frame.
    ///
    /// Returns `Ok(false)` at end of stream.
    fn grab(&mut self) -> Result<bool, ContactSheetError>;

    /// Pixels of the frame most recently returned by [`grab`](FrameSource::grab).
    fn retrieve(&mut self) -> Result<DynamicImage, ContactSheetError>;
}

/// RGB24 scaler for one source geometry, with its own output frame.
///
/// `ScalingContext::run` only allocates an empty output frame and rejects
/// one of a different size, so the output frame is replaced together with
/// the context whenever the source geometry changes.
struct Scaler {
    context: ScalingContext,
    source: (Pixel, u32, u32),
    target: (u32, u32),
    output: VideoFrame,
}

impl Scaler {
    fn new(
        source: (Pixel, u32, u32),
        max_size: Option<(u32, u32)>,
    ) -> Result<Self, ContactSheetError> {
        let (format, width, height) = source;
        let target = match max_size {
            Some((max_width, max_height)) => fit_within(width, height, max_width, max_height),
            None => (width, height),
        };
        log::debug!(
            "Scaling {width}x{height} {format:?} frames to {}x{} RGB24",
            target.0,
            target.1
        );
        let context = ScalingContext::get(
            format,
            width,
            height,
            Pixel::RGB24,
            target.0,
            target.1,
            ScalingFlags::BILINEAR,
        )?;
        Ok(Self {
            context,
            source,
            target,
            output: VideoFrame::empty(),
        })
    }

    fn scale(&mut self, frame: &VideoFrame) -> Result<DynamicImage, ContactSheetError> {
        self.context.run(frame, &mut self.output)?;
        let (width, height) = self.target;
        rgb_frame_to_image(&self.output, width, height)
    }
}

/// The scaler in `slot`, rebuilt first if `frame` has a different format or
/// size than the one it was built for.
fn scaler_for<'s>(
    slot: &'s mut Option<Scaler>,
    frame: &VideoFrame,
    max_size: Option<(u32, u32)>,
) -> Result<&'s mut Scaler, ContactSheetError> {
    let source = (frame.format(), frame.width(), frame.height());
    if slot.as_ref().is_none_or(|scaler| scaler.source != source) {
        *slot = Some(Scaler::new(source, max_size)?);
    }
    slot.as_mut()
        .ok_or_else(|| ContactSheetError::VideoDecodeError("scaler unavailable".to_string()))
}

/// What a `receive_frame` call means for the read loop.
#[derive(Debug)]
enum Received {
    Frame,
    NeedsInput,
    Drained,
    Failed(FfmpegError),
}

impl From<Result<(), FfmpegError>> for Received {
    fn from(result: Result<(), FfmpegError>) -> Self {
        match result {
            Ok(()) => Received::Frame,
            Err(FfmpegError::Other { errno }) if errno == EAGAIN => Received::NeedsInput,
            Err(FfmpegError::Eof) => Received::Drained,
            Err(error) => Received::Failed(error),
        }
    }
}

/// FFmpeg-backed [`FrameSource`] decoding every frame of the video stream in
/// presentation order.
///
/// The iterator borrows the [`MediaFile`] mutably; dropping it releases the
/// decoder, and dropping the `MediaFile` closes the input.
pub struct FrameIterator<'a> {
    media: &'a mut MediaFile,
    decoder: VideoDecoder,
    scaler: Option<Scaler>,
    max_size: Option<(u32, u32)>,
    frames_per_second: f64,
    decoded_frame: VideoFrame,
    has_frame: bool,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameIterator<'a> {
    pub(crate) fn new(
        media: &'a mut MediaFile,
        max_size: Option<(u32, u32)>,
    ) -> Result<Self, ContactSheetError> {
        let stream = media
            .input_context
            .stream(media.video_stream_index)
            .ok_or(ContactSheetError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;
        let frames_per_second = media.metadata.frames_per_second;

        Ok(Self {
            media,
            decoder,
            scaler: None,
            max_size,
            frames_per_second,
            decoded_frame: VideoFrame::empty(),
            has_frame: false,
            eof_sent: false,
            done: false,
        })
    }
}

impl FrameSource for FrameIterator<'_> {
    fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    fn grab(&mut self) -> Result<bool, ContactSheetError> {
        self.has_frame = false;
        if self.done {
            return Ok(false);
        }

        loop {
            match Received::from(self.decoder.receive_frame(&mut self.decoded_frame)) {
                Received::Frame => {
                    self.has_frame = true;
                    return Ok(true);
                }
                Received::Drained => {
                    self.done = true;
                    return Ok(false);
                }
                Received::Failed(error) => {
                    self.done = true;
                    return Err(error.into());
                }
                Received::NeedsInput => {}
            }

            if self.eof_sent {
                self.done = true;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.media.input_context) {
                Ok(()) => {
                    if packet.stream() == self.media.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.done = true;
                            return Err(error.into());
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.done = true;
                    return Err(error.into());
                }
            }
        }
    }

    fn retrieve(&mut self) -> Result<DynamicImage, ContactSheetError> {
        if !self.has_frame {
            return Err(ContactSheetError::VideoDecodeError(
                "retrieve called without a grabbed frame".to_string(),
            ));
        }

        scaler_for(&mut self.scaler, &self.decoded_frame, self.max_size)?
            .scale(&self.decoded_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey_frame(width: u32, height: u32) -> VideoFrame {
        let mut frame = VideoFrame::new(Pixel::YUV420P, width, height);
        for plane in 0..frame.planes() {
            frame.data_mut(plane).fill(128);
        }
        frame
    }

    #[test]
    fn scaler_survives_mid_stream_resolution_change() {
        let mut slot = None;

        let first = grey_frame(64, 48);
        let image = scaler_for(&mut slot, &first, Some((32, 32)))
            .unwrap()
            .scale(&first)
            .unwrap();
        assert_eq!((image.width(), image.height()), (32, 24));

        let second = grey_frame(128, 32);
        let image = scaler_for(&mut slot, &second, Some((32, 32)))
            .unwrap()
            .scale(&second)
            .unwrap();
        assert_eq!((image.width(), image.height()), (32, 8));

        let image = scaler_for(&mut slot, &first, Some((32, 32)))
            .unwrap()
            .scale(&first)
            .unwrap();
        assert_eq!((image.width(), image.height()), (32, 24));
    }

    #[test]
    fn unbounded_scaler_keeps_source_size() {
        let mut slot = None;
        let frame = grey_frame(64, 48);
        scaler_for(&mut slot, &frame, None).unwrap().scale(&frame).unwrap();
        scaler_for(&mut slot, &frame, None).unwrap().scale(&frame).unwrap();
        assert_eq!(slot.map(|scaler| scaler.target), Some((64, 48)));
    }

    #[test]
    fn receive_results_are_classified() {
        assert!(matches!(Received::from(Ok(())), Received::Frame));
        assert!(matches!(
            Received::from(Err(FfmpegError::Other { errno: EAGAIN })),
            Received::NeedsInput
        ));
        assert!(matches!(
            Received::from(Err(FfmpegError::Eof)),
            Received::Drained
        ));
        assert!(matches!(
            Received::from(Err(FfmpegError::InvalidData)),
            Received::Failed(FfmpegError::InvalidData)
        ));
    }
}
