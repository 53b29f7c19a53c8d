//! FFmpeg log level configuration.
//!
//! FFmpeg writes its own warnings to stderr, separately from the Rust
//! [`log`](https://crates.io/crates/log) facade. Broken or truncated inputs
//! can make it very chatty while the sampler scans them, so the CLI exposes
//! this as `--log-level`.
//!
//! # Example
//!
//! ```no_run
//! use contact_sheet::FfmpegLogLevel;
//!
//! let level: FfmpegLogLevel = "error".parse().unwrap();
//! contact_sheet::set_ffmpeg_log_level(level);
//! ```

use std::{fmt, str::FromStr};

use ffmpeg_next::util::log::Level;

/// FFmpeg internal log verbosity, from quietest to noisiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Unrecoverable conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing.
    Trace,
}

impl FfmpegLogLevel {
    /// Every level, quietest first.
    pub const ALL: [FfmpegLogLevel; 9] = [
        FfmpegLogLevel::Quiet,
        FfmpegLogLevel::Panic,
        FfmpegLogLevel::Fatal,
        FfmpegLogLevel::Error,
        FfmpegLogLevel::Warning,
        FfmpegLogLevel::Info,
        FfmpegLogLevel::Verbose,
        FfmpegLogLevel::Debug,
        FfmpegLogLevel::Trace,
    ];

    /// Lower-case name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }

    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl fmt::Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        if lowered == "warn" {
            return Ok(FfmpegLogLevel::Warning);
        }
        FfmpegLogLevel::ALL
            .into_iter()
            .find(|level| level.name() == lowered)
            .ok_or_else(|| {
                let names: Vec<&str> = FfmpegLogLevel::ALL.iter().map(|level| level.name()).collect();
                format!("unknown FFmpeg log level {value:?} (expected one of: {})", names.join(", "))
            })
    }
}

/// Set FFmpeg's own log verbosity. Does not affect the `log` facade.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("quiet".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Quiet));
        assert_eq!("ERROR".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Error));
        assert_eq!(" warn ".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Warning));
        assert!("loud".parse::<FfmpegLogLevel>().is_err());
    }
}
