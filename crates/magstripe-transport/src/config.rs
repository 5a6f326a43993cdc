use std::path::PathBuf;
use std::time::Duration;

/// Baud rate used when the caller does not pick one.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Baud rates that map onto a termios speed constant.
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400,
];

/// How to open a serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: PathBuf,
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Upper bound on how long a single read waits for a byte.
    ///
    /// When set, a read that sees no data within the interval fails with
    /// `ErrorKind::TimedOut` instead of blocking. Frame readers treat that as
    /// an idle tick, which is what lets a cancellation flag be observed
    /// between bytes. `None` blocks indefinitely.
    pub poll_interval: Option<Duration>,
}

impl SerialConfig {
    /// Config for `path` at `baud_rate`, blocking reads.
    pub fn new(path: impl Into<PathBuf>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            poll_interval: None,
        }
    }

    /// Set the read poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Whether `baud_rate` is one of [`SUPPORTED_BAUD_RATES`].
    pub fn is_supported_baud_rate(&self) -> bool {
        SUPPORTED_BAUD_RATES.contains(&self.baud_rate)
    }
}
