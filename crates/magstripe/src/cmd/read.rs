use std::io::Read;

use magstripe_frame::{CancelToken, FrameError, FrameReader, ReadEvent};
use magstripe_transport::SerialPort;
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, ReadArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_card, OutputFormat};
use crate::tracklog::TrackLog;

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.device.serial_config();
    let mut port =
        SerialPort::open_with_config(&config).map_err(|err| transport_error("open failed", err))?;

    let cancel = CancelToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let tracklog = args.log.map(TrackLog::new);
    info!(device = ?port.path(), baud = port.baud_rate(), "waiting for cards");

    let code = read_cards(&mut port, cancel, tracklog.as_ref(), args.count, format)?;
    port.close()
        .map_err(|err| transport_error("close failed", err))?;
    Ok(code)
}

/// Print every card read from `source` until cancelled or `count` is reached.
///
/// Frames that fail to frame or decode are reported and skipped; the loop
/// only ends on cancellation, the count, or a transport fault.
fn read_cards<T: Read>(
    source: T,
    cancel: CancelToken,
    tracklog: Option<&TrackLog>,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut reader = FrameReader::new(source).with_cancel(cancel);
    let mut printed = 0usize;

    loop {
        let frame = match reader.read_frame() {
            Ok(ReadEvent::Frame(frame)) => frame,
            Ok(ReadEvent::Stopped) => {
                info!(cards = printed, "stopped");
                return Ok(SUCCESS);
            }
            Err(
                err @ (FrameError::MissingStart
                | FrameError::LeadingBytes { .. }
                | FrameError::FrameTooLarge { .. }),
            ) => {
                warn!(%err, "discarding malformed frame");
                continue;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        };

        if let Some(log) = tracklog {
            log.record(&frame);
        }

        let tracks = match frame.tracks() {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!(%err, "skipping undecodable card");
                continue;
            }
        };

        print_card(&tracks, &frame, format);
        printed = printed.saturating_add(1);

        if count.is_some_and(|count| printed >= count) {
            return Ok(SUCCESS);
        }
    }
}
