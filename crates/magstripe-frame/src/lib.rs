//! STX/ETX framing and ISO track decoding for magnetic-stripe reader/writers.
//!
//! The device speaks in frames:
//! - `STX` (0x02) opens a frame, `ETX` (0x03) closes it
//! - `CR` (0x15) padding may appear anywhere and is discarded
//! - a read frame carries up to three track sub-records (`%...?`, `;...?`,
//!   `+...?`), each split into fields on its own separator byte
//!
//! Writing a card is a `STX 0x60 ETX` command frame followed by a data frame;
//! the device answers by echoing the data it wrote.

pub mod cancel;
pub mod codec;
pub mod constants;
pub mod error;
pub mod reader;
pub mod track;
pub mod writer;

pub use cancel::CancelToken;
pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE};
pub use constants::{Constant, TrackDelimiters, TrackNumber, ARM_RAW_WRITE, CR, ETX, STX};
pub use error::{AckFailure, FrameError, Result, WriteError};
pub use reader::{FrameReader, ReadEvent};
pub use track::{decode_tracks, extract, extract_with_skip, TrackRecord, Tracks};
pub use writer::{
    encode_write_data, verify_ack, write_card, write_card_with_cancel, write_data_with_cancel,
    FrameWriter, WriteData,
};
