use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use magstripe_frame::{Constant, Frame, TrackNumber, Tracks};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CardOutput<'a> {
    track1: Option<&'a [String]>,
    track2: Option<&'a [String]>,
    track3: Option<&'a [String]>,
    frame_size: usize,
    timestamp: String,
}

pub fn print_card(tracks: &Tracks, frame: &Frame, format: OutputFormat) {
    let fields = |n: TrackNumber| tracks.get(n).map(|t| t.fields());

    match format {
        OutputFormat::Json => {
            let out = CardOutput {
                track1: fields(TrackNumber::One),
                track2: fields(TrackNumber::Two),
                track3: fields(TrackNumber::Three),
                frame_size: frame.wire_size(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TRACK", "FIELDS"]);
            for track in tracks.iter() {
                table.add_row(vec![track.track().to_string(), track.fields().join(" | ")]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for track in tracks.iter() {
                println!("Track {}: {track}", track.track());
            }
            println!();
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
            print_raw(b"\n");
        }
    }
}

#[derive(Serialize)]
struct WriteOutput {
    status: &'static str,
    bytes_written: usize,
}

pub fn print_written(bytes_written: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = WriteOutput {
                status: "written",
                bytes_written,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty | OutputFormat::Raw => {
            println!("Card written.");
        }
    }
}

#[derive(Serialize)]
struct ConstantOutput {
    name: &'static str,
    value: u8,
    hex: String,
    printable: String,
}

pub fn print_constants(format: OutputFormat) {
    let rows: Vec<ConstantOutput> = Constant::ALL
        .into_iter()
        .map(|c| ConstantOutput {
            name: c.name(),
            value: c.raw_byte(),
            hex: format!("0x{:02X}", c.raw_byte()),
            printable: printable(c.raw_byte()),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "DEC", "HEX", "CHAR"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.value.to_string(),
                    row.hex.clone(),
                    row.printable.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!("{:<14} {:>3} {} {}", row.name, row.value, row.hex, row.printable);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn printable(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        char::from(byte).to_string()
    } else {
        format!("\\x{byte:02x}")
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
