//! MSR — the Music Score Representation
//!
//! A pure object graph built by the converter: Score at the root, part
//! groups (possibly nested) referencing parts by ID, parts holding staves,
//! staves holding voices, voices holding ordered chunks of timeline
//! elements. The model knows nothing about XML; all containment is by
//! value, and every back-reference is an identifier, never a pointer.

pub mod attributes;
pub mod barlines;
pub mod notations;
pub mod notes;
pub mod part;
pub mod score;

pub use attributes::{clef_kind_from, Clef, ClefKind, Key, Time, Transpose};
pub use barlines::{
    BarStyle, Barline, BarlineCategory, BarlineLocation, EndingType, Repeat, RepeatDirection,
    RepeatEnding, RepeatEndingKind, RepeatWinged,
};
pub use notations::{
    AccidentalKind, Articulation, Dynamics, DynamicsKind, Lyrics, LyricsChunk, LyricsChunkKind,
    OctaveShift, OctaveShiftKind, Ornament, OrnamentKind, Pedal, PedalKind, Placement, Rehearsal,
    RehearsalEnclosure, Slur, SlurKind, Tempo, Wedge, WedgeKind, Words,
};
pub use notes::{
    Beam, BeamKind, Chord, GraceNotes, Note, NoteKind, Pitch, StemKind, TieKind, Tuplet,
    TupletElement,
};
pub use part::{Part, Staff, Voice, VoiceChunk, VoiceElement};
pub use score::{
    Creator, Identification, PageGeometry, PartGroup, PartGroupChild, PartGroupSymbol, Score,
};
