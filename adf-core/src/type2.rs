//! Decode Type 2 sentences: binary flight-plan legs behind an ASCII prefix.
//!
//! Byte layout:
//!
//! | Offset | Content                                                   |
//! |--------|-----------------------------------------------------------|
//! | 0-2    | id, `w` + two digits                                      |
//! | 3      | leg flags: 0x40 last, 0x20 active, 0x1f leg number        |
//! | 4-8    | waypoint name, ASCII                                      |
//! | 9      | latitude: 0x80 south, 0x7f degrees                        |
//! | 10     | latitude minutes (0x3f)                                   |
//! | 11     | latitude tenths of a minute (0x7f)                        |
//! | 12     | longitude: 0x80 west                                      |
//! | 13     | longitude degrees, unmasked                               |
//! | 14     | longitude minutes (0x3f)                                  |
//! | 15     | longitude tenths of a minute (0x7f)                       |
//! | 16-17  | magnetic variation, i16 big-endian, 1/16 degree           |
//!
//! A sentence of fewer than 5 bytes describes a leg with no waypoint.

use std::fmt;

use bitflags::bitflags;

use crate::types::*;

bitflags! {
    /// Status bits of the leg byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LegFlags: u8 {
        const LAST = 0x40;
        const ACTIVE = 0x20;
    }
}

const LEG_NUM_MASK: u8 = 0x1f;
const HEMISPHERE_BIT: u8 = 0x80;
const LAT_DEG_MASK: u8 = 0x7f;
const MIN_MASK: u8 = 0x3f;
const CENTIMIN_MASK: u8 = 0x7f;

/// Bytes needed before a waypoint block is present.
const WAYPOINT_MIN_LEN: usize = 5;
/// Bytes needed to decode a full waypoint block.
const FULL_LEN: usize = 18;

/// Sequence position and status of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegSeq {
    pub number: u8,
    pub flags: LegFlags,
}

impl LegSeq {
    pub fn from_byte(b: u8) -> Self {
        LegSeq {
            number: b & LEG_NUM_MASK,
            flags: LegFlags::from_bits_truncate(b),
        }
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(LegFlags::ACTIVE)
    }

    pub fn is_last(&self) -> bool {
        self.flags.contains(LegFlags::LAST)
    }
}

/// Leg number followed by a fixed-width status column.
impl fmt::Display for LegSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match (self.is_active(), self.is_last()) {
            (true, true) => " Active Last",
            (true, false) => " Active     ",
            (false, true) => "        Last",
            (false, false) => "            ",
        };
        write!(f, "{}{status}", self.number)
    }
}

/// Degrees, minutes and tenths of a minute with a hemisphere letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    pub hemisphere: char,
    pub degrees: u8,
    pub minutes: u8,
    pub tenths: u8,
}

impl Coordinate {
    fn latitude(block: &[u8]) -> Self {
        Coordinate {
            hemisphere: if block[0] & HEMISPHERE_BIT != 0 { 'S' } else { 'N' },
            degrees: block[0] & LAT_DEG_MASK,
            minutes: block[1] & MIN_MASK,
            tenths: block[2] & CENTIMIN_MASK,
        }
    }

    fn longitude(block: &[u8]) -> Self {
        Coordinate {
            hemisphere: if block[0] & HEMISPHERE_BIT != 0 { 'W' } else { 'E' },
            degrees: block[1],
            minutes: block[2] & MIN_MASK,
            tenths: block[3] & CENTIMIN_MASK,
        }
    }

    /// Minutes as a single decimal value. A raw tenths byte above 9 carries
    /// into the minutes, as the unit's own display does.
    pub fn decimal_minutes(&self) -> f64 {
        self.minutes as f64 + self.tenths as f64 / 10.0
    }
}

/// `S5° 30.5`
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}° {}",
            self.hemisphere,
            self.degrees,
            format_decimal(self.decimal_minutes())
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegWaypoint {
    pub name: String,
    pub lat: Coordinate,
    pub lon: Coordinate,
    /// Degrees, east positive.
    pub mag_var: f64,
}

/// One leg of the active flight plan.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPlanLeg {
    pub id: String,
    pub seq: LegSeq,
    pub waypoint: Option<LegWaypoint>,
}

impl FlightPlanLeg {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < 4 {
            return Err(AdfError::Truncated {
                needed: 4,
                actual: raw.len(),
            });
        }

        let id = ascii_field(raw, 0, 3)?;
        let seq = LegSeq::from_byte(raw[3]);

        if raw.len() < WAYPOINT_MIN_LEN {
            return Ok(FlightPlanLeg {
                id,
                seq,
                waypoint: None,
            });
        }

        if raw.len() < FULL_LEN {
            return Err(AdfError::Truncated {
                needed: FULL_LEN,
                actual: raw.len(),
            });
        }

        let waypoint = LegWaypoint {
            name: ascii_field(raw, 4, 9)?,
            lat: Coordinate::latitude(&raw[9..12]),
            lon: Coordinate::longitude(&raw[12..16]),
            mag_var: i16::from_be_bytes([raw[16], raw[17]]) as f64 / 16.0,
        };

        Ok(FlightPlanLeg {
            id,
            seq,
            waypoint: Some(waypoint),
        })
    }

    /// Flatten into the record layout shared with Type 1 output.
    pub fn to_record(&self) -> DecodedRecord {
        let mut record = DecodedRecord::new(SentenceType::Type2);
        record.push("Id", FieldValue::Text(self.id.clone()));
        record.push("Seq", FieldValue::Text(self.seq.to_string()));
        if let Some(wpt) = &self.waypoint {
            record.push("Wpt", FieldValue::Text(wpt.name.clone()));
            record.push("Lat", FieldValue::Text(wpt.lat.to_string()));
            record.push("Lon", FieldValue::Text(wpt.lon.to_string()));
            record.push("Mag Var", FieldValue::Float(wpt.mag_var));
        }
        record
    }
}

/// Decode one Type 2 sentence from its raw bytes.
pub fn decode_type2(raw: &[u8]) -> Result<DecodedRecord> {
    FlightPlanLeg::parse(raw).map(|leg| leg.to_record())
}

fn ascii_field(raw: &[u8], start: usize, end: usize) -> Result<String> {
    let bytes = &raw[start..end];
    match bytes.iter().position(|b| !b.is_ascii()) {
        Some(i) => Err(AdfError::Encoding { offset: start + i }),
        None => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
