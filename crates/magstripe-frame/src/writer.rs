use std::io::{ErrorKind, Read, Write};

use bytes::BytesMut;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::codec::{encode_frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE};
use crate::constants::{ARM_RAW_WRITE, CR, ETX, STX};
use crate::error::{AckFailure, FrameError, Result, WriteError};
use crate::reader::{FrameReader, ReadEvent};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send one frame.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.send_all(&[payload])
    }

    /// Encode several frames back to back and send them as one write.
    pub fn send_all(&mut self, payloads: &[&[u8]]) -> Result<()> {
        self.buf.clear();
        for payload in payloads {
            encode_frame(payload, &mut self.buf);
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

}

/// Card text that passed the write checks, in wire form.
///
/// Only [`encode_write_data`] builds one, so holding a `WriteData` means the
/// bytes are non-empty ASCII with no framing control bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteData(Vec<u8>);

impl WriteData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Trim `text` and check it can be carried in a data frame.
pub fn encode_write_data(text: &str) -> std::result::Result<WriteData, WriteError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(WriteError::NoData);
    }
    if let Some((offset, byte)) = trimmed
        .bytes()
        .enumerate()
        .find(|&(_, b)| !b.is_ascii() || matches!(b, STX | ETX | CR))
    {
        return Err(WriteError::Unframeable { offset, byte });
    }
    Ok(WriteData(trimmed.as_bytes().to_vec()))
}

/// Check an acknowledgment payload against the data that was written.
pub fn verify_ack(sent: &[u8], echoed: &[u8]) -> std::result::Result<(), WriteError> {
    if sent == echoed {
        return Ok(());
    }
    Err(WriteError::WriteFailed(AckFailure::Mismatch {
        sent_len: sent.len(),
        echoed_len: echoed.len(),
    }))
}

/// Write `text` to a card and wait for the device to confirm it.
///
/// Sends `STX 0x60 ETX` and `STX <text> ETX` in a single write, then blocks
/// until the acknowledgment frame arrives. Succeeds only if the device echoes
/// exactly the trimmed text. Nothing is sent when the text is empty.
pub fn write_card<T: Read + Write>(
    transport: &mut T,
    text: &str,
) -> std::result::Result<(), WriteError> {
    write_card_with_cancel(transport, text, None)
}

/// [`write_card`] that gives up with [`WriteError::Cancelled`] once `cancel`
/// fires while waiting for the acknowledgment.
pub fn write_card_with_cancel<T: Read + Write>(
    transport: &mut T,
    text: &str,
    cancel: Option<&CancelToken>,
) -> std::result::Result<(), WriteError> {
    let data = encode_write_data(text)?;
    write_data_with_cancel(transport, &data, cancel)
}

/// Send already-checked card data and wait for the device to confirm it.
///
/// The acknowledgment must be `STX <data> ETX`, with only `CR` padding
/// allowed around it.
pub fn write_data_with_cancel<T: Read + Write>(
    transport: &mut T,
    data: &WriteData,
    cancel: Option<&CancelToken>,
) -> std::result::Result<(), WriteError> {
    let data = data.as_bytes();
    FrameWriter::new(&mut *transport).send_all(&[&[ARM_RAW_WRITE][..], data])?;
    debug!(data_len = data.len(), "write request sent; awaiting acknowledgment");

    // Room for the echo plus whatever padding the device adds.
    let config = FrameConfig {
        max_frame_size: data.len().saturating_add(DEFAULT_MAX_FRAME_SIZE),
        strict_start: true,
    };
    let mut reader = FrameReader::with_config(&mut *transport, config);
    if let Some(token) = cancel {
        reader = reader.with_cancel(token.clone());
    }

    let ack = match reader.read_frame() {
        Ok(ReadEvent::Frame(frame)) => frame,
        Ok(ReadEvent::Stopped) => return Err(WriteError::Cancelled),
        Err(FrameError::ConnectionClosed) => {
            return Err(WriteError::WriteFailed(AckFailure::Truncated))
        }
        Err(FrameError::MissingStart | FrameError::LeadingBytes { .. }) => {
            return Err(WriteError::WriteFailed(AckFailure::Malformed))
        }
        Err(FrameError::FrameTooLarge { max, .. }) => {
            return Err(WriteError::WriteFailed(AckFailure::Overlong { max }))
        }
        Err(err) => return Err(err.into()),
    };

    verify_ack(data, &ack.payload)?;
    info!(data_len = data.len(), "card written");
    Ok(())
}
