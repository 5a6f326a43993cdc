//! Control and delimiter bytes shared by both directions of the protocol.
//!
//! Each named value is available as a raw byte ([`Constant::raw_byte`]) and
//! as a one-byte slice ready for transport writes ([`Constant::encoded`]).

/// Start of frame.
pub const STX: u8 = 0x02;

/// End of frame.
pub const ETX: u8 = 0x03;

/// Transport padding some devices inject; dropped before interpretation.
pub const CR: u8 = 0x15;

/// "Raw write" opcode, sent in its own frame ahead of the data frame.
pub const ARM_RAW_WRITE: u8 = 0x60;

/// Every named protocol byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Stx,
    Etx,
    Cr,
    ArmRawWrite,
    Track1Start,
    Track1Sep,
    Track1End,
    Track2Start,
    Track2Sep,
    Track2End,
    Track3Start,
    Track3Sep,
    Track3End,
}

impl Constant {
    /// All constants in table order.
    pub const ALL: [Constant; 13] = [
        Constant::Stx,
        Constant::Etx,
        Constant::Cr,
        Constant::ArmRawWrite,
        Constant::Track1Start,
        Constant::Track1Sep,
        Constant::Track1End,
        Constant::Track2Start,
        Constant::Track2Sep,
        Constant::Track2End,
        Constant::Track3Start,
        Constant::Track3Sep,
        Constant::Track3End,
    ];

    /// The numeric byte value.
    pub const fn raw_byte(self) -> u8 {
        match self {
            Constant::Stx => STX,
            Constant::Etx => ETX,
            Constant::Cr => CR,
            Constant::ArmRawWrite => ARM_RAW_WRITE,
            Constant::Track1Start => b'%',
            Constant::Track1Sep => b'^',
            Constant::Track1End => b'?',
            Constant::Track2Start => b';',
            Constant::Track2Sep => b'=',
            Constant::Track2End => b'?',
            Constant::Track3Start => b'+',
            Constant::Track3Sep => b'$',
            Constant::Track3End => b'?',
        }
    }

    /// The value as a single-byte buffer for transport writes.
    pub const fn encoded(self) -> [u8; 1] {
        [self.raw_byte()]
    }

    /// Upper-snake-case table name, e.g. `TRACK2_SEP`.
    pub const fn name(self) -> &'static str {
        match self {
            Constant::Stx => "STX",
            Constant::Etx => "ETX",
            Constant::Cr => "CR",
            Constant::ArmRawWrite => "ARM_RAW_WRITE",
            Constant::Track1Start => "TRACK1_START",
            Constant::Track1Sep => "TRACK1_SEP",
            Constant::Track1End => "TRACK1_END",
            Constant::Track2Start => "TRACK2_START",
            Constant::Track2Sep => "TRACK2_SEP",
            Constant::Track2End => "TRACK2_END",
            Constant::Track3Start => "TRACK3_START",
            Constant::Track3Sep => "TRACK3_SEP",
            Constant::Track3End => "TRACK3_END",
        }
    }
}

/// Start, separator, and end bytes for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackDelimiters {
    pub start: u8,
    pub separator: u8,
    pub end: u8,
}

/// ISO track number. Tracks are always decoded in `One`, `Two`, `Three` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackNumber {
    One,
    Two,
    Three,
}

impl TrackNumber {
    pub const ALL: [TrackNumber; 3] = [TrackNumber::One, TrackNumber::Two, TrackNumber::Three];

    pub const fn number(self) -> u8 {
        match self {
            TrackNumber::One => 1,
            TrackNumber::Two => 2,
            TrackNumber::Three => 3,
        }
    }

    pub const fn delimiters(self) -> TrackDelimiters {
        let (start, separator, end) = match self {
            TrackNumber::One => (
                Constant::Track1Start,
                Constant::Track1Sep,
                Constant::Track1End,
            ),
            TrackNumber::Two => (
                Constant::Track2Start,
                Constant::Track2Sep,
                Constant::Track2End,
            ),
            TrackNumber::Three => (
                Constant::Track3Start,
                Constant::Track3Sep,
                Constant::Track3End,
            ),
        };
        TrackDelimiters {
            start: start.raw_byte(),
            separator: separator.raw_byte(),
            end: end.raw_byte(),
        }
    }
}

impl TryFrom<u8> for TrackNumber {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(TrackNumber::One),
            2 => Ok(TrackNumber::Two),
            3 => Ok(TrackNumber::Three),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for TrackNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
