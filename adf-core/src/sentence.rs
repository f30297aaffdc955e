//! Split a frame into sentences and classify each by its leading bytes.

/// Leading identifier of a Type 1 (ASCII navigation) sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type1Id {
    /// `z`: GPS altitude, feet
    Altitude,
    /// `A`
    Latitude,
    /// `B`
    Longitude,
    /// `C`: track, degrees
    Track,
    /// `D`: ground speed, knots
    GroundSpeed,
    /// `E`: distance to active waypoint, deci-nm
    DistanceToWaypoint,
    /// `G`: cross-track error, centi-nm
    CrossTrackError,
    /// `I`: desired track, deci-degrees
    DesiredTrack,
    /// `K`: active-leg waypoint name
    Waypoint,
    /// `L`: bearing to waypoint, deci-degrees
    Bearing,
    /// `Q`: magnetic variation, deci-degrees
    MagneticVariation,
    /// `S`: NAV valid flag
    NavValid,
    /// `T`: warning status
    WarningStatus,
    /// `l`: distance to destination, deci-nm
    DistanceToDestination,
}

impl Type1Id {
    pub const ALL: [Type1Id; 14] = [
        Type1Id::Altitude,
        Type1Id::Latitude,
        Type1Id::Longitude,
        Type1Id::Track,
        Type1Id::GroundSpeed,
        Type1Id::DistanceToWaypoint,
        Type1Id::CrossTrackError,
        Type1Id::DesiredTrack,
        Type1Id::Waypoint,
        Type1Id::Bearing,
        Type1Id::MagneticVariation,
        Type1Id::NavValid,
        Type1Id::WarningStatus,
        Type1Id::DistanceToDestination,
    ];

    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            b'z' => Type1Id::Altitude,
            b'A' => Type1Id::Latitude,
            b'B' => Type1Id::Longitude,
            b'C' => Type1Id::Track,
            b'D' => Type1Id::GroundSpeed,
            b'E' => Type1Id::DistanceToWaypoint,
            b'G' => Type1Id::CrossTrackError,
            b'I' => Type1Id::DesiredTrack,
            b'K' => Type1Id::Waypoint,
            b'L' => Type1Id::Bearing,
            b'Q' => Type1Id::MagneticVariation,
            b'S' => Type1Id::NavValid,
            b'T' => Type1Id::WarningStatus,
            b'l' => Type1Id::DistanceToDestination,
            _ => return None,
        })
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Type1Id::Altitude => b'z',
            Type1Id::Latitude => b'A',
            Type1Id::Longitude => b'B',
            Type1Id::Track => b'C',
            Type1Id::GroundSpeed => b'D',
            Type1Id::DistanceToWaypoint => b'E',
            Type1Id::CrossTrackError => b'G',
            Type1Id::DesiredTrack => b'I',
            Type1Id::Waypoint => b'K',
            Type1Id::Bearing => b'L',
            Type1Id::MagneticVariation => b'Q',
            Type1Id::NavValid => b'S',
            Type1Id::WarningStatus => b'T',
            Type1Id::DistanceToDestination => b'l',
        }
    }

    /// Field name used in decoded records.
    pub fn field_name(self) -> &'static str {
        match self {
            Type1Id::Altitude => "GPS Altitude (ft)",
            Type1Id::Latitude => "Latitude",
            Type1Id::Longitude => "Longitude",
            Type1Id::Track => "Track (degrees)",
            Type1Id::GroundSpeed => "Ground Speed (knots)",
            Type1Id::DistanceToWaypoint => "Distance to Wpt (nm)",
            Type1Id::CrossTrackError => "XTK Error (nm)",
            Type1Id::DesiredTrack => "TRK (degrees)",
            Type1Id::Waypoint => "Wpt",
            Type1Id::Bearing => "BRG (degrees)",
            Type1Id::MagneticVariation => "Mag Var (degrees)",
            Type1Id::NavValid => "NAV Valid",
            Type1Id::WarningStatus => "Warning Status",
            Type1Id::DistanceToDestination => "Distance to Dest (nm)",
        }
    }
}

/// Sentence classification, from leading bytes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Type1(Type1Id),
    /// `w` followed by two decimal digits
    Type2,
    Unknown,
}

/// One line of a frame, without its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub raw: &'a [u8],
    pub kind: SentenceKind,
}

pub fn classify(line: &[u8]) -> SentenceKind {
    if let Some(id) = line.first().copied().and_then(Type1Id::from_byte) {
        return SentenceKind::Type1(id);
    }
    match line {
        [b'w', d1, d2, ..] if d1.is_ascii_digit() && d2.is_ascii_digit() => SentenceKind::Type2,
        _ => SentenceKind::Unknown,
    }
}

/// Iterate over lines split on `\r\n`, `\r`, or `\n`. Empty lines are kept.
pub fn lines(buf: &[u8]) -> Lines<'_> {
    Lines { rest: buf }
}

pub struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.iter().position(|&b| b == b'\r' || b == b'\n') {
            Some(i) => {
                let line = &self.rest[..i];
                let skip = if self.rest[i] == b'\r' && self.rest.get(i + 1) == Some(&b'\n') {
                    2
                } else {
                    1
                };
                self.rest = &self.rest[i + skip..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = &[];
                Some(line)
            }
        }
    }
}

/// Split a frame body into classified, non-empty sentences, in order.
pub fn split_sentences(buf: &[u8]) -> Vec<Sentence<'_>> {
    lines(buf)
        .filter(|line| !line.is_empty())
        .map(|raw| Sentence {
            raw,
            kind: classify(raw),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_type1_ids_roundtrip() {
        for id in Type1Id::ALL {
            assert_eq!(Type1Id::from_byte(id.as_byte()), Some(id));
            assert_eq!(classify(&[id.as_byte()]), SentenceKind::Type1(id));
        }
    }

    #[test]
    fn test_classify_type2() {
        assert_eq!(classify(b"w01"), SentenceKind::Type2);
        assert_eq!(classify(&[b'w', b'9', b'9', 0x85, 0x03]), SentenceKind::Type2);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify(b"x123"), SentenceKind::Unknown);
        assert_eq!(classify(b"w1"), SentenceKind::Unknown);
        assert_eq!(classify(b"wA1"), SentenceKind::Unknown);
        assert_eq!(classify(b"W01"), SentenceKind::Unknown);
        assert_eq!(classify(b""), SentenceKind::Unknown);
    }

    #[test]
    fn test_classify_uses_leading_byte_only() {
        // 'l' is Type 1 even though the rest looks like anything
        assert_eq!(
            classify(b"lw01"),
            SentenceKind::Type1(Type1Id::DistanceToDestination)
        );
    }

    #[test]
    fn test_lines_terminators() {
        let got: Vec<&[u8]> = lines(b"a\r\nb\nc\rd").collect();
        assert_eq!(
            got,
            vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice(), b"d".as_slice()]
        );

        let got: Vec<&[u8]> = lines(b"a\n\nb\r\n").collect();
        assert_eq!(got, vec![b"a".as_slice(), b"".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn test_split_sentences_order_and_kinds() {
        let body = b"z1500\r\nw01\x21\r\n\r\nx99\r\nKKAVL\r\n";
        let sentences = split_sentences(body);
        let kinds: Vec<SentenceKind> = sentences.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SentenceKind::Type1(Type1Id::Altitude),
                SentenceKind::Type2,
                SentenceKind::Unknown,
                SentenceKind::Type1(Type1Id::Waypoint),
            ]
        );
        assert_eq!(sentences[1].raw, b"w01\x21".as_slice());
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences(b"").is_empty());
        assert!(split_sentences(b"\r\n\r\n").is_empty());
    }
}
