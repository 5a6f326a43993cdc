use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};

/// An open serial device.
///
/// Terminal devices are switched to raw 8N1 at the configured speed on open.
/// Anything else that can be opened read/write (a capture file, a FIFO) is
/// used as-is, which is handy for replaying recorded device traffic.
pub struct SerialPort {
    file: File,
    path: PathBuf,
    baud_rate: u32,
    is_terminal: bool,
    poll_interval: Option<Duration>,
}

impl SerialPort {
    /// Open `path` at `baud_rate` with blocking reads.
    pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(&SerialConfig::new(path.as_ref(), baud_rate))
    }

    /// Open a device with explicit configuration.
    pub fn open_with_config(config: &SerialConfig) -> Result<Self> {
        let path = config.path.clone();
        let speed = termios_speed(config.baud_rate)
            .ok_or(TransportError::UnsupportedBaudRate(config.baud_rate))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        // SAFETY: the descriptor is open and owned by `file` for this call.
        let is_terminal = unsafe { libc::isatty(file.as_raw_fd()) } == 1;
        if is_terminal {
            configure_raw(&file, speed).map_err(|e| TransportError::Configure {
                path: path.clone(),
                source: e,
            })?;
            info!(?path, baud = config.baud_rate, "opened serial device");
        } else {
            debug!(?path, "device is not a terminal; skipping line configuration");
        }

        Ok(Self {
            file,
            path,
            baud_rate: config.baud_rate,
            is_terminal,
            poll_interval: config.poll_interval,
        })
    }

    /// The device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured line speed.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Whether the device is a terminal (and was line-configured on open).
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Flush, wait for queued output to reach the wire, and release the device.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        if self.is_terminal {
            // SAFETY: the descriptor stays open until `self` drops below.
            let rc = unsafe { libc::tcdrain(self.file.as_raw_fd()) };
            if rc != 0 {
                return Err(std::io::Error::last_os_error().into());
            }
        }
        debug!(path = ?self.path, "closed serial device");
        Ok(())
    }

    fn wait_readable(&self, interval: Duration) -> std::io::Result<()> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout = i32::try_from(interval.as_millis()).unwrap_or(i32::MAX);

        // SAFETY: `pfd` is a single valid pollfd and nfds is 1.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout) };
        match rc {
            0 => Err(std::io::Error::new(
                ErrorKind::TimedOut,
                "no data within poll interval",
            )),
            n if n < 0 => Err(std::io::Error::last_os_error()),
            _ => Ok(()),
        }
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if let Some(interval) = self.poll_interval {
            self.wait_readable(interval)?;
        }
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("is_terminal", &self.is_terminal)
            .finish()
    }
}

fn termios_speed(baud_rate: u32) -> Option<libc::speed_t> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}

fn configure_raw(file: &File, speed: libc::speed_t) -> std::io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: termios is plain old data; tcgetattr overwrites it in full.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `fd` is an open terminal descriptor and `tio` is writable.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `tio` was initialised by tcgetattr above.
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    tio.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: `tio` is a valid termios and `speed` a termios speed constant.
    if unsafe { libc::cfsetispeed(&mut tio, speed) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::cfsetospeed(&mut tio, speed) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `fd` is an open terminal descriptor and `tio` is fully populated.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
