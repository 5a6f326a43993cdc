use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use magstripe_frame::CancelToken;
use magstripe_transport::{SerialConfig, DEFAULT_BAUD_RATE};

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod constants;
pub mod read;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read cards and print their tracks until interrupted.
    Read(ReadArgs),
    /// Write one card and wait for the device to confirm it.
    Write(WriteArgs),
    /// Print the protocol byte table.
    Constants(ConstantsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Constants(args) => constants::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    #[arg(env = "MAGSTRIPE_DEVICE")]
    pub device: PathBuf,
    /// Line speed in baud.
    #[arg(long, short = 'b', env = "MAGSTRIPE_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

impl DeviceArgs {
    /// Line settings for the device, with reads that wake every
    /// `POLL_INTERVAL` so cancellation is seen on an idle line.
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(self.device.clone(), self.baud).with_poll_interval(POLL_INTERVAL)
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Append each raw frame payload to this file.
    #[arg(long, short = 'l', value_name = "FILE")]
    pub log: Option<PathBuf>,
    /// Exit after reading N cards.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Text to write. Read from stdin when neither --data nor --file is given.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the text to write from a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct ConstantsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// How often a blocked device read wakes to check for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cancel `token` on Ctrl-C.
fn install_ctrlc_handler(token: CancelToken) -> CliResult<()> {
    ctrlc::set_handler(move || {
        token.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
