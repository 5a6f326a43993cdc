use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::constants::{CR, ETX, STX};
use crate::error::{FrameError, Result};
use crate::track::{decode_tracks, Tracks};

/// Default limit on bytes accumulated while waiting for `ETX`.
///
/// A full three-track ISO card is well under 300 bytes.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024;

/// One complete frame, boundary bytes and padding removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Bytes between `STX` and `ETX`.
    pub payload: Bytes,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The wire size of this frame without padding (`STX` + payload + `ETX`).
    pub fn wire_size(&self) -> usize {
        self.payload.len() + 2
    }

    /// Payload as text for the raw log. Non-ASCII bytes are replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Decode tracks 1 through 3 from the payload.
    pub fn tracks(&self) -> Result<Tracks> {
        decode_tracks(&self.payload)
    }
}

/// Encode a payload into the wire format.
///
/// ```text
/// ┌──────┬─────────────────┬──────┐
/// │ STX  │ Payload         │ ETX  │
/// │ 0x02 │ (ASCII)         │ 0x03 │
/// └──────┴─────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() + 2);
    dst.put_u8(STX);
    dst.put_slice(payload);
    dst.put_u8(ETX);
}

/// Decode one frame from an accumulation buffer.
///
/// Returns `Ok(None)` until the buffer holds an `ETX`. On success, consumes
/// everything up to and including that `ETX`, drops all `CR` padding, and
/// discards any noise ahead of the `STX`. On error the offending bytes are
/// consumed too, so the next call starts on a fresh frame.
pub fn decode_frame(src: &mut BytesMut, max_frame_size: usize) -> Result<Option<Frame>> {
    decode_frame_with(src, max_frame_size, false)
}

pub(crate) fn decode_frame_with(
    src: &mut BytesMut,
    max_frame_size: usize,
    strict_start: bool,
) -> Result<Option<Frame>> {
    let Some(etx) = src.iter().position(|&b| b == ETX) else {
        if src.len() > max_frame_size {
            let size = src.len();
            src.clear();
            return Err(FrameError::FrameTooLarge {
                size,
                max: max_frame_size,
            });
        }
        return Ok(None); // Need more data
    };

    let raw = src.split_to(etx + 1);
    if raw.len() > max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: raw.len(),
            max: max_frame_size,
        });
    }

    let cleaned: Vec<u8> = raw.iter().copied().filter(|&b| b != CR).collect();
    let stx = cleaned
        .iter()
        .position(|&b| b == STX)
        .ok_or(FrameError::MissingStart)?;
    if stx > 0 {
        if strict_start {
            return Err(FrameError::LeadingBytes { count: stx });
        }
        debug!(dropped = stx, "discarding bytes ahead of STX");
    }

    // `cleaned` ends with the ETX found above.
    let payload = Bytes::copy_from_slice(&cleaned[stx + 1..cleaned.len() - 1]);
    Ok(Some(Frame { payload }))
}

/// Configuration for frame accumulation.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum bytes buffered before an `ETX` must appear. Default: 4 KiB.
    pub max_frame_size: usize,
    /// Reject a frame when anything other than `CR` padding precedes its
    /// `STX`, instead of dropping those bytes. Default: `false`.
    pub strict_start: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            strict_start: false,
        }
    }
}
