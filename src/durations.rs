//! Note-type durations as whole-note fractions
//!
//! MusicXML graphic note types ("quarter", "16th", ...) map to fractions
//! of a whole note. Used for grace-note durations (which carry no
//! `<duration>`) and metronome beat units.

use num_rational::Rational32;

/// Fraction of a whole note for a MusicXML note-type name.
///
/// Returns `None` for unknown names; callers report and recover.
pub fn note_type_fraction(name: &str) -> Option<Rational32> {
    let fraction = match name {
        "maxima" => Rational32::from_integer(8),
        "long" => Rational32::from_integer(4),
        "breve" => Rational32::from_integer(2),
        "whole" => Rational32::from_integer(1),
        "half" => Rational32::new(1, 2),
        "quarter" => Rational32::new(1, 4),
        "eighth" => Rational32::new(1, 8),
        "16th" => Rational32::new(1, 16),
        "32nd" => Rational32::new(1, 32),
        "64th" => Rational32::new(1, 64),
        "128th" => Rational32::new(1, 128),
        "256th" => Rational32::new(1, 256),
        "512th" => Rational32::new(1, 512),
        "1024th" => Rational32::new(1, 1024),
        _ => return None,
    };
    Some(fraction)
}

/// Lengthen a fraction by augmentation dots.
///
/// Each dot adds half of the previous value: one dot makes 3/2 of the
/// base, two dots 7/4, and so on.
pub fn apply_dots(fraction: Rational32, dots: u32) -> Rational32 {
    let mut total = fraction;
    let mut added = fraction;
    for _ in 0..dots {
        added /= 2;
        total += added;
    }
    total
}

/// Divisions a note-type occupies given a part's divisions per whole note.
pub fn divisions_for_type(name: &str, dots: u32, divisions_per_whole: i32) -> Option<i32> {
    let fraction = apply_dots(note_type_fraction(name)?, dots);
    let divisions = fraction * Rational32::from_integer(divisions_per_whole);
    Some(divisions.to_integer())
}
