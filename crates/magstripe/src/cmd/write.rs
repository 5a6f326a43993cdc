use std::fs;
use std::io::Read;

use magstripe_frame::{encode_write_data, write_data_with_cancel, CancelToken};
use magstripe_transport::SerialPort;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, WriteArgs};
use crate::exit::{io_error, transport_error, write_error, CliResult, SUCCESS};
use crate::output::{print_written, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let text = resolve_text(&args)?;
    // Reject bad input before the device is touched.
    let data = encode_write_data(&text).map_err(|err| write_error("write failed", err))?;

    let config = args.device.serial_config();
    let mut port =
        SerialPort::open_with_config(&config).map_err(|err| transport_error("open failed", err))?;

    let cancel = CancelToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let len = data.as_bytes().len();
    info!(device = ?port.path(), bytes = len, "swipe a card to write");
    write_data_with_cancel(&mut port, &data, Some(&cancel))
        .map_err(|err| write_error("write failed", err))?;

    print_written(len, format);
    port.close()
        .map_err(|err| transport_error("close failed", err))?;
    Ok(SUCCESS)
}

fn resolve_text(args: &WriteArgs) -> CliResult<String> {
    if let Some(data) = &args.data {
        return Ok(data.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(text)
}
