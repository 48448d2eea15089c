//! Notes, chords, tuplets and grace-note groups
//!
//! A `Note` is the unit everything else aggregates: chords collect
//! simultaneous notes, tuplets collect notes (and nested tuplets) under a
//! display ratio, grace groups collect grace notes ahead of a real note.

use serde::{Deserialize, Serialize};

use super::notations::{Articulation, Dynamics, Ornament, Slur, Wedge, Words};

// ============================================================================
// Pitch and note
// ============================================================================

/// A sounding pitch. `alter` is fractional to admit quarter tones.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Pitch {
    pub step: char,
    pub alter: f32,
    pub octave: i32,
}

/// How a note ended up being used in the timeline.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Standalone,
    Rest,
    ChordMember,
    TupletMember,
    Grace,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieKind {
    Start,
    Continue,
    Stop,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StemKind {
    Up,
    Down,
    None,
    Double,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeamKind {
    Begin,
    Continue,
    End,
    ForwardHook,
    BackwardHook,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beam {
    pub number: i32,
    pub kind: BeamKind,
}

/// A single note, rest or grace note.
///
/// `id` is assigned by the converter in appending order; it is what
/// back-references (lyric chunks, chord promotion) use instead of
/// pointers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Note {
    pub id: u32,
    pub kind: NoteKind,
    pub pitch: Option<Pitch>,
    /// Display position for unpitched notes.
    pub display_pitch: Option<Pitch>,
    /// Sounding duration in part divisions.
    pub divisions: i32,
    /// Drawn duration; differs from `divisions` inside tuplets.
    pub display_divisions: i32,
    pub dots: i32,
    /// Graphic note type name ("quarter", "16th", ...).
    pub graphic_type: Option<String>,
    pub staff: i32,
    pub voice: i32,
    pub tie: Option<TieKind>,
    pub stem: Option<StemKind>,
    pub beams: Vec<Beam>,
    pub articulations: Vec<Articulation>,
    pub ornaments: Vec<Ornament>,
    pub dynamics: Vec<Dynamics>,
    pub words: Vec<Words>,
    pub slurs: Vec<Slur>,
    pub wedges: Vec<Wedge>,
    pub has_lyrics: bool,
}

impl Note {
    pub fn is_rest(&self) -> bool {
        self.kind == NoteKind::Rest
    }
}

// ============================================================================
// Chords
// ============================================================================

/// Simultaneous notes sharing one duration.
///
/// Decorations of the member notes are lifted to chord level so
/// downstream passes can treat the chord as one event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Chord {
    pub divisions: i32,
    pub notes: Vec<Note>,
    pub tie: Option<TieKind>,
    pub articulations: Vec<Articulation>,
    pub ornaments: Vec<Ornament>,
    pub dynamics: Vec<Dynamics>,
    pub words: Vec<Words>,
    pub slurs: Vec<Slur>,
    pub wedges: Vec<Wedge>,
}

impl Chord {
    /// Start a chord from its first note, moving that note's decorations
    /// up to chord level.
    pub fn from_first_note(mut first: Note) -> Self {
        let mut chord = Self {
            divisions: first.divisions,
            notes: Vec::new(),
            tie: first.tie,
            articulations: std::mem::take(&mut first.articulations),
            ornaments: std::mem::take(&mut first.ornaments),
            dynamics: std::mem::take(&mut first.dynamics),
            words: std::mem::take(&mut first.words),
            slurs: std::mem::take(&mut first.slurs),
            wedges: std::mem::take(&mut first.wedges),
        };
        first.kind = NoteKind::ChordMember;
        chord.notes.push(first);
        chord
    }

    /// Add a member note, moving its decorations up to chord level.
    pub fn add_note(&mut self, mut note: Note) {
        note.kind = NoteKind::ChordMember;
        self.articulations.append(&mut note.articulations);
        self.ornaments.append(&mut note.ornaments);
        self.dynamics.append(&mut note.dynamics);
        self.words.append(&mut note.words);
        self.slurs.append(&mut note.slurs);
        self.wedges.append(&mut note.wedges);
        self.notes.push(note);
    }
}

// ============================================================================
// Tuplets and grace groups
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum TupletElement {
    Note(Note),
    Tuplet(Tuplet),
}

/// A tuplet: `actual_notes` in the written span of `normal_notes`.
/// Nests by holding inner tuplets as elements.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tuplet {
    pub number: i32,
    pub actual_notes: i32,
    pub normal_notes: i32,
    /// Graphic type the normal notes are written in ("eighth", ...).
    pub normal_type: Option<String>,
    pub elements: Vec<TupletElement>,
}

impl Tuplet {
    pub fn new(number: i32, actual_notes: i32, normal_notes: i32) -> Self {
        Self {
            number,
            actual_notes,
            normal_notes,
            normal_type: None,
            elements: Vec::new(),
        }
    }

    pub fn add_note(&mut self, mut note: Note) {
        note.kind = NoteKind::TupletMember;
        self.elements.push(TupletElement::Note(note));
    }

    pub fn add_tuplet(&mut self, tuplet: Tuplet) {
        self.elements.push(TupletElement::Tuplet(tuplet));
    }
}

/// Grace notes preceding a real note; flushed when that note arrives.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraceNotes {
    pub slashed: bool,
    pub notes: Vec<Note>,
}

impl GraceNotes {
    pub fn new(slashed: bool) -> Self {
        Self {
            slashed,
            notes: Vec::new(),
        }
    }
}
