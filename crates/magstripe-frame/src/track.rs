//! Track sub-record extraction.
//!
//! A read payload is up to three track records back to back:
//!
//! ```text
//! %B4111111111111111^DOE/JOHN^2512101?;4111111111111111=2512101?+...?
//! └──────────── track 1 ─────────────┘└──────── track 2 ───────┘└ 3 ┘
//! ```
//!
//! Any of them may be missing. Extraction runs 1 → 2 → 3, each step taking a
//! prefix off whatever the previous step left behind.

use tracing::trace;

use crate::constants::TrackNumber;
use crate::error::{FrameError, Result};

/// Decoded fields of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    track: TrackNumber,
    fields: Vec<String>,
}

impl TrackRecord {
    pub fn new(track: TrackNumber, fields: Vec<String>) -> Self {
        Self { track, fields }
    }

    pub fn track(&self) -> TrackNumber {
        self.track
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl std::fmt::Display for TrackRecord {
    /// Renders as a bracketed, quoted list: `['1234', 'NAME']`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{field}'")?;
        }
        f.write_str("]")
    }
}

/// All three tracks of one frame; absent tracks are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracks {
    pub track1: Option<TrackRecord>,
    pub track2: Option<TrackRecord>,
    pub track3: Option<TrackRecord>,
}

impl Tracks {
    pub fn get(&self, track: TrackNumber) -> Option<&TrackRecord> {
        match track {
            TrackNumber::One => self.track1.as_ref(),
            TrackNumber::Two => self.track2.as_ref(),
            TrackNumber::Three => self.track3.as_ref(),
        }
    }

    /// Present tracks in track order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackRecord> {
        [&self.track1, &self.track2, &self.track3]
            .into_iter()
            .filter_map(Option::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Extract `track` from the front of `payload`.
///
/// Returns the decoded record (or `None` when the track is absent) together
/// with the unconsumed remainder for the next track.
pub fn extract(payload: &[u8], track: TrackNumber) -> Result<(Option<TrackRecord>, &[u8])> {
    extract_with_skip(payload, track, 0)
}

/// Like [`extract`], but ignores `skip` bytes after the start byte, for
/// formats that reserve leading bytes ahead of the first field.
///
/// A track is absent when the payload does not begin with the track's start
/// byte, or when no end byte follows. Absent tracks leave `payload` untouched.
pub fn extract_with_skip(
    payload: &[u8],
    track: TrackNumber,
    skip: usize,
) -> Result<(Option<TrackRecord>, &[u8])> {
    let delimiters = track.delimiters();
    if payload.first() != Some(&delimiters.start) {
        return Ok((None, payload));
    }

    // The search includes the start byte itself; no table entry uses the
    // same byte to open and close a track.
    let Some(end) = payload.iter().position(|&b| b == delimiters.end) else {
        trace!(track = track.number(), "start byte without end byte; track absent");
        return Ok((None, payload));
    };

    let body = &payload[skip.saturating_add(1).min(end)..end];
    let fields = body
        .split(|&b| b == delimiters.separator)
        .enumerate()
        .map(|(index, segment)| decode_field(segment, track, index))
        .collect::<Result<Vec<_>>>()?;

    trace!(track = track.number(), fields = fields.len(), "extracted track");
    Ok((Some(TrackRecord::new(track, fields)), &payload[end + 1..]))
}

/// Decode tracks 1, 2, and 3 from a frame payload, in that order.
pub fn decode_tracks(payload: &[u8]) -> Result<Tracks> {
    let (track1, rest) = extract(payload, TrackNumber::One)?;
    let (track2, rest) = extract(rest, TrackNumber::Two)?;
    let (track3, rest) = extract(rest, TrackNumber::Three)?;

    if !rest.is_empty() {
        trace!(trailing = rest.len(), "bytes left after track 3");
    }

    Ok(Tracks {
        track1,
        track2,
        track3,
    })
}

fn decode_field(segment: &[u8], track: TrackNumber, index: usize) -> Result<String> {
    if !segment.is_ascii() {
        return Err(FrameError::NonAscii {
            track: track.number(),
            field: index,
        });
    }
    Ok(segment.iter().map(|&b| char::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK1: &[u8] = b"%B4111111111111111^DOE/JOHN^2512101?";
    const TRACK2: &[u8] = b";4111111111111111=2512101?";
    const TRACK3: &[u8] = b"+0123$4567?";

    fn fields(record: &Option<TrackRecord>) -> Option<Vec<&str>> {
        record
            .as_ref()
            .map(|r| r.fields().iter().map(String::as_str).collect())
    }

    #[test]
    fn track2_only() {
        let tracks = decode_tracks(b";1234=NAME?").unwrap();
        assert_eq!(tracks.track1, None);
        assert_eq!(fields(&tracks.track2), Some(vec!["1234", "NAME"]));
        assert_eq!(tracks.track3, None);
    }

    #[test]
    fn every_subset_of_tracks() {
        let parts = [TRACK1, TRACK2, TRACK3];
        for mask in 0u8..8 {
            let mut payload = Vec::new();
            for (i, part) in parts.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    payload.extend_from_slice(part);
                }
            }

            let tracks = decode_tracks(&payload).unwrap();
            assert_eq!(tracks.track1.is_some(), mask & 1 != 0, "mask {mask}");
            assert_eq!(tracks.track2.is_some(), mask & 2 != 0, "mask {mask}");
            assert_eq!(tracks.track3.is_some(), mask & 4 != 0, "mask {mask}");
        }
    }

    #[test]
    fn full_card_fields() {
        let payload = [TRACK1, TRACK2, TRACK3].concat();
        let tracks = decode_tracks(&payload).unwrap();

        assert_eq!(
            fields(&tracks.track1),
            Some(vec!["B4111111111111111", "DOE/JOHN", "2512101"])
        );
        assert_eq!(
            fields(&tracks.track2),
            Some(vec!["4111111111111111", "2512101"])
        );
        assert_eq!(fields(&tracks.track3), Some(vec!["0123", "4567"]));
    }

    #[test]
    fn empty_payload_has_no_tracks() {
        let tracks = decode_tracks(b"").unwrap();
        assert_eq!(tracks, Tracks::default());
        assert!(tracks.is_empty());
    }

    #[test]
    fn missing_end_byte_leaves_payload() {
        let payload = b"%B4111^DOE";
        let (record, rest) = extract(payload, TrackNumber::One).unwrap();
        assert_eq!(record, None);
        assert_eq!(rest, payload);

        let tracks = decode_tracks(payload).unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn missing_track1_end_borrows_later_end_byte() {
        // Track 1 runs into track 2; the first `?` closes track 1.
        let payload = b"%B4111^DOE;1234=5678?";
        let tracks = decode_tracks(payload).unwrap();
        assert_eq!(fields(&tracks.track1), Some(vec!["B4111", "DOE;1234=5678"]));
        assert_eq!(tracks.track2, None);
        assert_eq!(tracks.track3, None);
    }

    #[test]
    fn remainder_starts_after_end_byte() {
        let payload = [TRACK1, TRACK2].concat();
        let (record, rest) = extract(&payload, TrackNumber::One).unwrap();
        assert!(record.is_some());
        assert_eq!(rest, TRACK2);
    }

    #[test]
    fn wrong_order_is_absent() {
        // Track 2 data ahead of track 1 blocks track 1 but not track 2.
        let payload = [TRACK2, TRACK1].concat();
        let tracks = decode_tracks(&payload).unwrap();
        assert_eq!(tracks.track1, None);
        assert!(tracks.track2.is_some());
        assert_eq!(tracks.track3, None);
    }

    #[test]
    fn empty_track_has_one_empty_field() {
        let tracks = decode_tracks(b";?").unwrap();
        assert_eq!(fields(&tracks.track2), Some(vec![""]));
    }

    #[test]
    fn skip_offset() {
        let (record, rest) = extract_with_skip(b"%XXB123^NAME?", TrackNumber::One, 2).unwrap();
        assert_eq!(fields(&record), Some(vec!["B123", "NAME"]));
        assert!(rest.is_empty());
    }

    #[test]
    fn skip_past_end_yields_empty_field() {
        let (record, _) = extract_with_skip(b"%AB?", TrackNumber::One, 10).unwrap();
        assert_eq!(fields(&record), Some(vec![""]));
    }

    #[test]
    fn skip_of_usize_max_does_not_overflow() {
        let (record, rest) =
            extract_with_skip(b";1234=5678?", TrackNumber::Two, usize::MAX).unwrap();
        assert_eq!(fields(&record), Some(vec![""]));
        assert!(rest.is_empty());
    }

    #[test]
    fn non_ascii_field_is_error() {
        let result = decode_tracks(b";1234=N\xC3\xA9?");
        assert!(matches!(
            result,
            Err(FrameError::NonAscii { track: 2, field: 1 })
        ));
    }

    #[test]
    fn decoding_is_idempotent() {
        let payload = [TRACK1, TRACK3].concat();
        let first = decode_tracks(&payload).unwrap();
        let second = decode_tracks(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn display_like_a_list() {
        let record = TrackRecord::new(TrackNumber::Two, vec!["1234".into(), "NAME".into()]);
        assert_eq!(record.to_string(), "['1234', 'NAME']");
    }

    #[test]
    fn iter_and_get() {
        let payload = [TRACK1, TRACK3].concat();
        let tracks = decode_tracks(&payload).unwrap();
        let numbers: Vec<_> = tracks.iter().map(TrackRecord::track).collect();
        assert_eq!(numbers, vec![TrackNumber::One, TrackNumber::Three]);
        assert!(tracks.get(TrackNumber::Two).is_none());
    }
}
