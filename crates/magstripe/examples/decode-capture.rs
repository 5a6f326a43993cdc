//! Decode every frame in a capture of raw device output.
//!
//! ```sh
//! cargo run -p magstripe --example decode-capture -- capture.bin
//! ```

use std::fs::File;
use std::io::BufReader;

use magstripe::frame::{FrameError, FrameReader, ReadEvent};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: decode-capture <capture-file>")?;
    let mut reader = FrameReader::new(BufReader::new(File::open(&path)?));

    loop {
        let frame = match reader.read_frame() {
            Ok(ReadEvent::Frame(frame)) => frame,
            Ok(ReadEvent::Stopped) | Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(err.into()),
        };

        match frame.tracks() {
            Ok(tracks) => {
                for track in tracks.iter() {
                    println!("Track {}: {track}", track.track());
                }
                println!();
            }
            Err(err) => eprintln!("skipping frame: {err}"),
        }
    }

    Ok(())
}
