//! Decode Type 1 sentences: one ASCII navigation datum per line.
//!
//! Layouts, by leading identifier:
//! - `z<feet>`                 GPS altitude
//! - `A<N|S> <dd> <mmhh>`      latitude
//! - `B<E|W> <ddd> <mmhh>`     longitude
//! - `C<deg>`                  track
//! - `D<knots>`                ground speed
//! - `E<deci-nm>`              distance to active waypoint
//! - `G<L|R><centi-nm>`        cross-track error
//! - `I<deci-deg>`             desired track
//! - `K<ccccc>`                active-leg waypoint (the manual says "destination")
//! - `L<deci-deg>`             bearing to waypoint
//! - `Q<E|W><deci-deg>`        magnetic variation
//! - `S----<N|->`              NAV valid flag
//! - `T<--------->`            warning status
//! - `l<deci-nm>`              distance to destination
//!
//! E, G, I, L and l carry `--...` while no waypoint is defined; that text is
//! passed through untouched.

use crate::sentence::Type1Id;
use crate::types::*;

/// Decode one Type 1 sentence already classified as `id`. Exactly one field
/// is set.
pub fn decode_type1(id: Type1Id, raw: &[u8]) -> Result<DecodedRecord> {
    let sentence = as_ascii(raw)?;
    let rest = sentence.get(1..).unwrap_or_default();
    let name = id.field_name();

    let value = match id {
        Type1Id::Altitude => FieldValue::Int(parse_int(name, rest)?),
        Type1Id::Latitude => {
            let dir = char_at(sentence, 1)?;
            FieldValue::Text(format!(
                "{dir} {}°{}.{}'",
                slice(sentence, 3, 5),
                slice(sentence, 6, 8),
                slice(sentence, 8, sentence.len())
            ))
        }
        Type1Id::Longitude => {
            let dir = char_at(sentence, 1)?;
            FieldValue::Text(format!(
                "{dir} {}°{}.{}'",
                slice(sentence, 3, 6),
                slice(sentence, 7, 9),
                slice(sentence, 9, sentence.len())
            ))
        }
        Type1Id::Track => FieldValue::Float(parse_float(name, rest)?),
        Type1Id::GroundSpeed => FieldValue::Int(parse_int(name, rest)?),
        Type1Id::DistanceToWaypoint
        | Type1Id::DesiredTrack
        | Type1Id::Bearing
        | Type1Id::DistanceToDestination => {
            if is_undefined(rest) {
                FieldValue::Text(rest.to_string())
            } else {
                FieldValue::Float(parse_float(name, rest)? / 10.0)
            }
        }
        Type1Id::CrossTrackError => {
            if is_undefined(rest) {
                FieldValue::Text(rest.to_string())
            } else {
                let side = char_at(sentence, 1)?;
                let nm = parse_float(name, &sentence[2..])? / 100.0;
                FieldValue::Text(format!("{side}{}", format_decimal(nm)))
            }
        }
        Type1Id::Waypoint | Type1Id::WarningStatus => FieldValue::Text(rest.to_string()),
        Type1Id::MagneticVariation => {
            let dir = char_at(sentence, 1)?;
            let deg = parse_float(name, &sentence[2..])? / 10.0;
            FieldValue::Text(format!("{dir}{}", format_decimal(deg)))
        }
        Type1Id::NavValid => FieldValue::Bool(char_at(sentence, 5)? == '-'),
    };

    let mut record = DecodedRecord::new(SentenceType::Type1);
    record.push(name, value);
    Ok(record)
}

/// Waypoint-not-defined marker.
fn is_undefined(rest: &str) -> bool {
    rest.starts_with("--")
}

fn as_ascii(raw: &[u8]) -> Result<&str> {
    match raw.iter().position(|b| !b.is_ascii()) {
        Some(offset) => Err(AdfError::Encoding { offset }),
        // ASCII is valid UTF-8
        None => std::str::from_utf8(raw).map_err(|e| AdfError::Encoding {
            offset: e.valid_up_to(),
        }),
    }
}

fn char_at(s: &str, idx: usize) -> Result<char> {
    s.as_bytes()
        .get(idx)
        .map(|&b| b as char)
        .ok_or(AdfError::Truncated {
            needed: idx + 1,
            actual: s.len(),
        })
}

/// Substring with both ends clamped to the string length.
fn slice(s: &str, start: usize, end: usize) -> &str {
    let end = end.min(s.len());
    let start = start.min(end);
    &s[start..end]
}

fn parse_int(field: &'static str, text: &str) -> Result<i64> {
    text.trim().parse().map_err(|_| AdfError::Format {
        field,
        value: text.to_string(),
    })
}

fn parse_float(field: &'static str, text: &str) -> Result<f64> {
    text.trim().parse().map_err(|_| AdfError::Format {
        field,
        value: text.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
