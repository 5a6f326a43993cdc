//! Read and write magnetic stripe cards over a serial reader/writer.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial device transport (open, raw line setup, read/write)
//! - [`frame`]: STX/ETX framing, track 1–3 decoding, and the raw-write protocol
//!
//! ```no_run
//! use magstripe::frame::{FrameReader, ReadEvent};
//! use magstripe::transport::SerialPort;
//!
//! let mut port = SerialPort::open("/dev/ttyUSB0", 9600)?;
//! let mut reader = FrameReader::new(&mut port);
//! if let ReadEvent::Frame(frame) = reader.read_frame()? {
//!     for track in frame.tracks()?.iter() {
//!         println!("Track {}: {track}", track.track());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use magstripe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use magstripe_frame::*;
}
