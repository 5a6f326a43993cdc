mod cmd;
mod exit;
mod logging;
mod output;
mod tracklog;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "magstripe",
    version,
    about = "Read and write magnetic stripe cards over serial"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_read_subcommand() {
        let cli = Cli::try_parse_from([
            "magstripe",
            "read",
            "/dev/ttyUSB0",
            "--baud",
            "19200",
            "--log",
            "/tmp/tracks.log",
        ])
        .expect("read args should parse");

        match cli.command {
            Command::Read(args) => {
                assert_eq!(args.device.baud, 19200);
                assert_eq!(
                    args.log.as_deref(),
                    Some(std::path::Path::new("/tmp/tracks.log"))
                );
            }
            other => panic!("expected read, got {other:?}"),
        }
    }

    #[test]
    fn baud_defaults_to_9600() {
        let cli = Cli::try_parse_from(["magstripe", "write", "/dev/ttyUSB0", "--data", "x"])
            .expect("write args should parse");
        match cli.command {
            Command::Write(args) => assert_eq!(args.device.baud, 9600),
            other => panic!("expected write, got {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_write_sources() {
        let err = Cli::try_parse_from([
            "magstripe",
            "write",
            "/dev/ttyUSB0",
            "--data",
            "ABC",
            "--file",
            "card.txt",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_constants_subcommand() {
        let cli = Cli::try_parse_from(["magstripe", "--format", "json", "constants"])
            .expect("constants args should parse");
        assert!(matches!(cli.command, Command::Constants(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
