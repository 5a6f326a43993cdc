/// Errors that can occur while reading frames or decoding tracks.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer grew past the configured limit without an `ETX`.
    #[error("frame too large ({size} bytes without ETX, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An `ETX` arrived but no `STX` preceded it.
    #[error("frame terminated without a leading STX")]
    MissingStart,

    /// Bytes other than padding arrived ahead of the `STX` of a frame that
    /// must start cleanly.
    #[error("{count} unexpected byte(s) before STX")]
    LeadingBytes { count: usize },

    /// A track field holds bytes outside 7-bit ASCII.
    #[error("track {track} field {field} is not ASCII")]
    NonAscii { track: u8, field: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Why an acknowledgment did not confirm a card write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AckFailure {
    /// The stream ended before the device sent `ETX`.
    #[error("acknowledgment truncated before ETX")]
    Truncated,

    /// The acknowledgment did not begin with `STX`.
    #[error("acknowledgment does not start with STX")]
    Malformed,

    /// The acknowledgment grew past the size of the data written without an
    /// `ETX`.
    #[error("acknowledgment exceeded {max} bytes without ETX")]
    Overlong { max: usize },

    /// The echoed payload differs from the data sent.
    #[error("acknowledgment echoed {echoed_len} bytes that do not match the {sent_len} bytes written")]
    Mismatch { sent_len: usize, echoed_len: usize },
}

/// Errors returned by a card write.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Nothing left to write after trimming whitespace.
    #[error("no data specified to write")]
    NoData,

    /// The text holds a byte that cannot travel inside a data frame.
    #[error("byte 0x{byte:02X} at offset {offset} cannot be written (ASCII without control bytes only)")]
    Unframeable { offset: usize, byte: u8 },

    /// The device did not confirm the write.
    #[error("failed to write to card: {0}")]
    WriteFailed(AckFailure),

    /// The caller cancelled while waiting for the acknowledgment.
    #[error("write cancelled before acknowledgment")]
    Cancelled,

    /// Transport fault while sending or awaiting the acknowledgment.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}
