//! Staff attributes: clefs, keys, time signatures, transpositions
//!
//! These appear at two levels: staff number 0 in the source means "part
//! default", anything else targets one staff. The part/staff types in
//! [`crate::msr::part`] hold them as plain optional values.

use serde::{Deserialize, Serialize};

// ============================================================================
// Clefs
// ============================================================================

/// Recognized clef shapes, including octave-transposing variants.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClefKind {
    Treble,
    TreblePlus8,
    TrebleMinus8,
    TreblePlus15,
    TrebleMinus15,
    /// G clef on the bottom line (French violin clef)
    TrebleLine1,
    Bass,
    BassPlus8,
    BassMinus8,
    BassPlus15,
    BassMinus15,
    Alto,
    Tenor,
    Tablature4,
    Tablature5,
    Tablature6,
    Tablature7,
    Percussion,
    None,
}

/// A clef attached to a staff or a part default.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clef {
    pub kind: ClefKind,
}

/// Map a MusicXML sign/line/octave-change triple to a clef kind.
///
/// Returns `None` for combinations outside the recognized table; the
/// caller reports and leaves the clef unset.
pub fn clef_kind_from(sign: &str, line: i32, octave_change: i32) -> Option<ClefKind> {
    let kind = match (sign, line) {
        ("G", 2) => match octave_change {
            -2 => ClefKind::TrebleMinus15,
            -1 => ClefKind::TrebleMinus8,
            0 => ClefKind::Treble,
            1 => ClefKind::TreblePlus8,
            2 => ClefKind::TreblePlus15,
            _ => return None,
        },
        ("G", 1) => ClefKind::TrebleLine1,
        ("F", 4) => match octave_change {
            -2 => ClefKind::BassMinus15,
            -1 => ClefKind::BassMinus8,
            0 => ClefKind::Bass,
            1 => ClefKind::BassPlus8,
            2 => ClefKind::BassPlus15,
            _ => return None,
        },
        ("C", 3) => ClefKind::Alto,
        ("C", 4) => ClefKind::Tenor,
        ("TAB", 4) => ClefKind::Tablature4,
        ("TAB", 5) => ClefKind::Tablature5,
        ("TAB", 6) => ClefKind::Tablature6,
        ("TAB", 7) => ClefKind::Tablature7,
        ("percussion", _) | ("PERCUSSION", _) => ClefKind::Percussion,
        ("none", _) | ("NONE", _) => ClefKind::None,
        _ => return None,
    };
    Some(kind)
}

// ============================================================================
// Keys, times, transpositions
// ============================================================================

/// Key signature: fifths on the circle, mode name, cancelled fifths.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Key {
    pub fifths: i32,
    pub mode: String,
    pub cancel: i32,
}

/// Time signature.
///
/// `senza_misura` marks unmetered music; beats/beat-type are then
/// meaningless and left at zero.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Time {
    pub beats: i32,
    pub beat_type: i32,
    pub senza_misura: bool,
}

/// Chromatic/diatonic transposition of a part or staff.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Transpose {
    pub diatonic: i32,
    pub chromatic: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treble_family() {
        assert_eq!(clef_kind_from("G", 2, 0), Some(ClefKind::Treble));
        assert_eq!(clef_kind_from("G", 2, -1), Some(ClefKind::TrebleMinus8));
        assert_eq!(clef_kind_from("G", 2, 2), Some(ClefKind::TreblePlus15));
        assert_eq!(clef_kind_from("G", 1, 0), Some(ClefKind::TrebleLine1));
    }

    #[test]
    fn test_bass_and_c_clefs() {
        assert_eq!(clef_kind_from("F", 4, 0), Some(ClefKind::Bass));
        assert_eq!(clef_kind_from("F", 4, 1), Some(ClefKind::BassPlus8));
        assert_eq!(clef_kind_from("C", 3, 0), Some(ClefKind::Alto));
        assert_eq!(clef_kind_from("C", 4, 0), Some(ClefKind::Tenor));
    }

    #[test]
    fn test_tablature_and_special() {
        assert_eq!(clef_kind_from("TAB", 6, 0), Some(ClefKind::Tablature6));
        assert_eq!(clef_kind_from("percussion", 0, 0), Some(ClefKind::Percussion));
        assert_eq!(clef_kind_from("none", 0, 0), Some(ClefKind::None));
    }

    #[test]
    fn test_unknown_combinations_rejected() {
        assert_eq!(clef_kind_from("G", 3, 0), None);
        assert_eq!(clef_kind_from("F", 4, 3), None);
        assert_eq!(clef_kind_from("X", 2, 0), None);
    }
}
