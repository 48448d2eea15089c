//! Decorations and text attached to notes, voices and directions
//!
//! Articulations, ornaments, dynamics, slurs, wedges, words, tempo marks,
//! octave shifts, pedal marks, rehearsal marks, and lyric chunks.

use num_rational::Rational32;
use serde::{Deserialize, Serialize};

/// Above/below placement hint carried by several direction payloads.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Above,
    Below,
}

// ============================================================================
// Articulations and ornaments
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Articulation {
    Accent,
    StrongAccent,
    Staccato,
    Staccatissimo,
    Tenuto,
    DetachedLegato,
    Stress,
    Unstress,
    BreathMark,
    Caesura,
    Spiccato,
    Scoop,
    Plop,
    Doit,
    Falloff,
    Arpeggiato,
    Fermata,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrnamentKind {
    Trill,
    WavyLine,
    Turn,
    InvertedTurn,
    DelayedTurn,
    DelayedInvertedTurn,
    VerticalTurn,
    Mordent,
    InvertedMordent,
    Schleifer,
    Shake,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccidentalKind {
    Natural,
    Sharp,
    Flat,
}

/// An ornament, possibly qualified by a following accidental-mark.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ornament {
    pub kind: OrnamentKind,
    pub accidental_mark: Option<AccidentalKind>,
    pub accidental_placement: Option<Placement>,
}

impl Ornament {
    pub fn new(kind: OrnamentKind) -> Self {
        Self {
            kind,
            accidental_mark: None,
            accidental_placement: None,
        }
    }
}

// ============================================================================
// Dynamics, wedges, slurs, words
// ============================================================================

/// The full dynamics palette.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum DynamicsKind {
    F,
    FF,
    FFF,
    FFFF,
    FFFFF,
    FFFFFF,
    P,
    PP,
    PPP,
    PPPP,
    PPPPP,
    PPPPPP,
    FP,
    FZ,
    RF,
    SF,
    RFZ,
    SFZ,
    SFP,
    SFPP,
    SFFZ,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dynamics {
    pub kind: DynamicsKind,
    pub placement: Option<Placement>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WedgeKind {
    Crescendo,
    Diminuendo,
    Stop,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wedge {
    pub kind: WedgeKind,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlurKind {
    Start,
    Continue,
    Stop,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slur {
    pub number: i32,
    pub kind: SlurKind,
}

/// Free text from a direction, attached to the next note.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Words {
    pub text: String,
    pub placement: Option<Placement>,
}

// ============================================================================
// Tempo, octave shifts, pedal, rehearsal
// ============================================================================

/// Metronome mark: one beat unit equated to a per-minute count.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tempo {
    /// Beat unit as a fraction of a whole note, dots applied.
    pub beat_unit: Rational32,
    pub per_minute: i32,
    pub parenthesized: bool,
    /// Text accompanying the mark, when the direction carried words.
    pub indication: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OctaveShiftKind {
    Up,
    Down,
    Stop,
}

/// Ottava bracket: size is 8 or 15.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctaveShift {
    pub kind: OctaveShiftKind,
    pub size: i32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PedalKind {
    Start,
    Stop,
    Change,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pedal {
    pub kind: PedalKind,
    pub line: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RehearsalEnclosure {
    None,
    Rectangle,
    Oval,
    Circle,
    Bracket,
    Triangle,
    Diamond,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Rehearsal {
    pub text: String,
    pub enclosure: RehearsalEnclosure,
}

// ============================================================================
// Lyrics
// ============================================================================

/// What a lyric chunk contributes to its stanza line.
///
/// The first four come straight from `<syllabic>`; the rest are inferred
/// from context when a lyric has no text (ties, rests, melismas).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LyricsChunkKind {
    Single,
    Begin,
    Middle,
    End,
    /// Note is tied to the previous one; the syllable carries over.
    Tied,
    /// Rest under a lyric line.
    Skip,
    /// Note inside a melisma slur.
    Slur,
    /// Note after the syllable-carrying slur already ended on "end".
    SlurBeyondEnd,
}

/// One syllable (or placeholder) of a stanza.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LyricsChunk {
    pub kind: LyricsChunkKind,
    pub text: String,
    /// Duration of the owning note, in part divisions.
    pub divisions: i32,
    /// Stanza this chunk belongs to.
    pub stanza: i32,
    /// Owning note, set once the note object exists.
    pub note: Option<u32>,
}

/// A stanza: ordered chunks for one lyric line of a voice.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lyrics {
    pub number: i32,
    pub chunks: Vec<LyricsChunk>,
}

impl Lyrics {
    pub fn new(number: i32) -> Self {
        Self {
            number,
            chunks: Vec::new(),
        }
    }
}
