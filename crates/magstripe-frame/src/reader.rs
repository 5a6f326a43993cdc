use std::io::{ErrorKind, Read};

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::codec::{decode_frame_with, Frame, FrameConfig};
use crate::constants::ETX;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Outcome of one [`FrameReader::read_frame`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A complete frame arrived.
    Frame(Frame),
    /// The cancel token fired; any partial frame was discarded.
    Stopped,
}

/// Reads complete frames from any `Read` stream, one byte at a time.
///
/// Never reads past an `ETX`, so the same stream can be handed to another
/// reader (or writer) between frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    cancel: Option<CancelToken>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            cancel: None,
        }
    }

    /// Check `token` between byte reads and stop when it fires.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Read the next complete frame (blocking).
    ///
    /// `Interrupted` and `TimedOut` reads are idle ticks: the cancel token is
    /// checked and the read is retried. Returns
    /// `Err(FrameError::ConnectionClosed)` at EOF. Any error discards the
    /// partially accumulated frame.
    pub fn read_frame(&mut self) -> Result<ReadEvent> {
        loop {
            if self.is_cancelled() {
                self.buf.clear();
                return Ok(ReadEvent::Stopped);
            }

            let mut byte = [0u8; 1];
            let read = match self.inner.read(&mut byte) {
                Ok(n) => n,
                Err(err) if is_idle_tick(&err) => continue,
                Err(err) => {
                    self.buf.clear();
                    return Err(FrameError::Io(err));
                }
            };

            if read == 0 {
                self.buf.clear();
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.put_u8(byte[0]);
            if byte[0] != ETX && self.buf.len() <= self.config.max_frame_size {
                continue;
            }

            let decoded = decode_frame_with(
                &mut self.buf,
                self.config.max_frame_size,
                self.config.strict_start,
            )?;
            if let Some(frame) = decoded {
                debug!(payload_len = frame.payload.len(), "frame received");
                return Ok(ReadEvent::Frame(frame));
            }
        }
    }

    /// Bytes accumulated toward the next frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

fn is_idle_tick(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn expect_frame(event: ReadEvent) -> Frame {
        match event {
            ReadEvent::Frame(frame) => frame,
            ReadEvent::Stopped => panic!("expected a frame, reader stopped"),
        }
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(b"\x02;1234=NAME?\x03".to_vec()));
        let frame = expect_frame(reader.read_frame().unwrap());

        assert_eq!(frame.payload.as_ref(), b";1234=NAME?");
        let tracks = frame.tracks().unwrap();
        assert_eq!(tracks.track2.unwrap().fields(), ["1234", "NAME"]);
        assert!(tracks.track1.is_none());
        assert!(tracks.track3.is_none());
    }

    #[test]
    fn read_multiple_frames() {
        let wire = b"\x02%A?\x03\x02;B?\x03\x02+C?\x03".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));

        let f1 = expect_frame(reader.read_frame().unwrap());
        let f2 = expect_frame(reader.read_frame().unwrap());
        let f3 = expect_frame(reader.read_frame().unwrap());

        assert_eq!(f1.payload.as_ref(), b"%A?");
        assert_eq!(f2.payload.as_ref(), b";B?");
        assert_eq!(f3.payload.as_ref(), b"+C?");
    }

    #[test]
    fn does_not_read_past_etx() {
        let mut cursor = Cursor::new(b"\x02;1?\x03trailing".to_vec());
        {
            let mut reader = FrameReader::new(&mut cursor);
            expect_frame(reader.read_frame().unwrap());
        }
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn padding_stripped_before_decode() {
        let wire = b"\x15\x02;12\x1534=NA\x15ME?\x03".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));
        let frame = expect_frame(reader.read_frame().unwrap());
        assert_eq!(frame.payload.as_ref(), b";1234=NAME?");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame_discards_partial() {
        let mut reader = FrameReader::new(Cursor::new(b"\x02;1234=".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn oversized_frame_then_recovers() {
        let mut wire = vec![b'A'; 17];
        wire.extend_from_slice(b"\x02;1?\x03");
        let cfg = FrameConfig {
            max_frame_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire), cfg);

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 17, max: 16 }));
        assert_eq!(reader.pending(), 0);

        let frame = expect_frame(reader.read_frame().unwrap());
        assert_eq!(frame.payload.as_ref(), b";1?");
    }

    #[test]
    fn missing_start_then_recovers() {
        let wire = b";1?\x03\x02;2?\x03".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::MissingStart));

        let frame = expect_frame(reader.read_frame().unwrap());
        assert_eq!(frame.payload.as_ref(), b";2?");
    }

    #[test]
    fn non_ascii_frame_does_not_poison_next() {
        let wire = b"\x02;\xFF?\x03\x02;OK?\x03".to_vec();
        let mut reader = FrameReader::new(Cursor::new(wire));

        let bad = expect_frame(reader.read_frame().unwrap());
        assert!(matches!(bad.tracks(), Err(FrameError::NonAscii { .. })));

        let good = expect_frame(reader.read_frame().unwrap());
        assert_eq!(good.tracks().unwrap().track2.unwrap().fields(), ["OK"]);
    }

    #[test]
    fn cancelled_before_read() {
        let token = CancelToken::new();
        token.cancel();
        let mut reader =
            FrameReader::new(Cursor::new(b"\x02;1?\x03".to_vec())).with_cancel(token);
        assert_eq!(reader.read_frame().unwrap(), ReadEvent::Stopped);
        assert_eq!(reader.get_ref().position(), 0);
    }

    #[test]
    fn cancel_observed_on_idle_tick() {
        let token = CancelToken::new();
        let source = IdleThenCancel {
            token: token.clone(),
            prefix: b"\x02;12".to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(source).with_cancel(token);

        assert_eq!(reader.read_frame().unwrap(), ReadEvent::Stopped);
        assert_eq!(reader.pending(), 0, "partial frame must be discarded");
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: b"\x02;ok?\x03".to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = expect_frame(framed.read_frame().unwrap());
        assert_eq!(frame.payload.as_ref(), b";ok?");
    }

    #[test]
    fn hard_io_error_propagates() {
        let mut reader = FrameReader::new(BrokenPipe);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn strict_start_rejects_noise_then_recovers() {
        let wire = b"X\x02;1?\x03\x02;2?\x03".to_vec();
        let cfg = FrameConfig {
            strict_start: true,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire), cfg);

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::LeadingBytes { count: 1 }));

        let frame = expect_frame(reader.read_frame().unwrap());
        assert_eq!(frame.payload.as_ref(), b";2?");
    }

    /// Yields a partial frame, then times out; the second timeout cancels.
    struct IdleThenCancel {
        token: CancelToken,
        prefix: Vec<u8>,
        pos: usize,
    }

    impl Read for IdleThenCancel {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos < self.prefix.len() {
                buf[0] = self.prefix[self.pos];
                self.pos += 1;
                return Ok(1);
            }
            if self.pos == self.prefix.len() {
                self.pos += 1;
            } else {
                self.token.cancel();
            }
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}
