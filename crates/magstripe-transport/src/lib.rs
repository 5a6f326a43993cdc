//! Serial device transport for magnetic-stripe reader/writers.
//!
//! Opens a device path at a baud rate, puts terminal devices into raw 8N1
//! mode, and exposes the handle as a plain [`std::io::Read`] +
//! [`std::io::Write`] stream. Everything protocol-shaped lives in
//! `magstripe-frame`; this crate only moves bytes.

pub mod config;
pub mod error;

#[cfg(unix)]
pub mod serial;

pub use config::{SerialConfig, DEFAULT_BAUD_RATE, SUPPORTED_BAUD_RATES};
pub use error::{Result, TransportError};

#[cfg(unix)]
pub use serial::SerialPort;
