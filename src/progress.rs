//! Progress reporting for the frame scan.
//!
//! The sampler reports every frame it reads to a [`ProgressObserver`]. The
//! default, [`NoOpProgress`], discards everything, so the sampling loop runs
//! silently in tests and library use; the CLI plugs in a progress bar.
//!
//! # Example
//!
//! ```
//! use contact_sheet::{ProgressInfo, ProgressObserver};
//!
//! struct PrintProgress;
//!
//! impl ProgressObserver for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({:.0} frames/s)", info.frames_per_second);
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

/// A snapshot of scan progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames read so far.
    pub current: u64,
    /// Frames expected, from the stream metadata.
    pub total: Option<u64>,
    /// Thumbnails selected so far.
    pub sampled: u64,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the scan started.
    pub elapsed: Duration,
    /// Scan rate in frames per second of wall-clock time.
    pub frames_per_second: f64,
}

/// Trait for observing the frame scan.
///
/// Observers are infallible: they watch the scan but cannot stop it.
pub trait ProgressObserver: Send + Sync {
    /// Called as frames are read.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called once when the scan stops, for whatever reason.
    fn on_finish(&self, _info: &ProgressInfo) {}
}

/// An observer that discards all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressObserver for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing and batches notifications to an observer.
pub(crate) struct ProgressTracker<'a> {
    observer: &'a dyn ProgressObserver,
    total: Option<u64>,
    current: u64,
    sampled: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(observer: &'a dyn ProgressObserver, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            observer,
            total,
            current: 0,
            sampled: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one frame read, and whether it was kept as a thumbnail.
    pub(crate) fn advance(&mut self, sampled: bool) {
        self.current += 1;
        if sampled {
            self.sampled += 1;
        }
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.observer.on_progress(&self.snapshot());
            self.items_since_last_report = 0;
        }
    }

    /// Emit the final report.
    pub(crate) fn finish(&mut self) {
        self.observer.on_finish(&self.snapshot());
    }

    fn snapshot(&self) -> ProgressInfo {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let seconds = elapsed.as_secs_f64();
        let frames_per_second = if seconds > 0.0 {
            self.current as f64 / seconds
        } else {
            0.0
        };

        ProgressInfo {
            current: self.current,
            total: self.total,
            sampled: self.sampled,
            percentage,
            elapsed,
            frames_per_second,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        progress: Mutex<Vec<ProgressInfo>>,
        finished: Mutex<Option<ProgressInfo>>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.progress.lock().unwrap().push(info.clone());
        }

        fn on_finish(&self, info: &ProgressInfo) {
            *self.finished.lock().unwrap() = Some(info.clone());
        }
    }

    #[test]
    fn reports_once_per_batch() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new(&recorder, Some(10), 4);
        for index in 0..10 {
            tracker.advance(index % 5 == 0);
        }
        tracker.finish();

        let progress = recorder.progress.lock().unwrap();
        let counts: Vec<u64> = progress.iter().map(|info| info.current).collect();
        assert_eq!(counts, vec![4, 8]);

        let finished = recorder.finished.lock().unwrap().clone().unwrap();
        assert_eq!(finished.current, 10);
        assert_eq!(finished.sampled, 2);
        assert_eq!(finished.percentage, Some(100.0));
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new(&recorder, None, 0);
        tracker.advance(false);
        tracker.advance(false);

        let progress = recorder.progress.lock().unwrap();
        assert_eq!(progress.len(), 2);
        assert!(progress.iter().all(|info| info.percentage.is_none()));
    }

    #[test]
    fn unknown_or_zero_total_has_no_percentage() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new(&recorder, Some(0), 1);
        tracker.advance(true);
        assert_eq!(recorder.progress.lock().unwrap()[0].percentage, None);
    }
}
