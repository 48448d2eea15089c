//! Parts, staves, voices and the voice timeline
//!
//! A part holds staves by number, a staff holds voices by number, and a
//! voice is an ordered list of chunks. The current chunk is always the
//! last one; repeats take finished chunks over wholesale.
//!
//! Staff and voice lookup is get-or-create and idempotent: asking for the
//! same numbers twice yields the same objects. A staff created on demand
//! inherits the part-level attribute defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attributes::{Clef, Key, Time, Transpose};
use super::barlines::{Barline, Repeat};
use super::notations::{
    Lyrics, OctaveShift, Pedal, Rehearsal, Tempo, Words,
};
use super::notes::{Chord, GraceNotes, Note, Tuplet};

// ============================================================================
// Voice timeline
// ============================================================================

/// Anything that can sit on a voice's timeline.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum VoiceElement {
    Note(Note),
    Chord(Chord),
    Tuplet(Tuplet),
    GraceNotes(GraceNotes),
    Barline(Barline),
    Repeat(Repeat),
    Tempo(Tempo),
    Words(Words),
    OctaveShift(OctaveShift),
    Segno,
    Coda,
    Eyeglasses,
    Pedal(Pedal),
    Rehearsal(Rehearsal),
    /// System break requested by the engraving source.
    Break,
}

/// A contiguous run of voice elements.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct VoiceChunk {
    pub elements: Vec<VoiceElement>,
}

impl VoiceChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

/// One polyphonic line of a staff.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Voice {
    pub number: i32,
    /// Ordered chunks; the last one is where appends go.
    pub chunks: Vec<VoiceChunk>,
    /// Lyric stanzas keyed by lyric number.
    pub lyrics: BTreeMap<i32, Lyrics>,
}

impl Voice {
    pub fn new(number: i32) -> Self {
        Self {
            number,
            chunks: vec![VoiceChunk::new()],
            lyrics: BTreeMap::new(),
        }
    }

    /// The chunk appends currently go to.
    pub fn current_chunk_mut(&mut self) -> &mut VoiceChunk {
        if self.chunks.is_empty() {
            self.chunks.push(VoiceChunk::new());
        }
        self.chunks.last_mut().expect("voice always has a chunk")
    }

    /// Append an element to the current chunk.
    pub fn append(&mut self, element: VoiceElement) {
        self.current_chunk_mut().elements.push(element);
    }

    /// Close the current chunk and open a fresh one. The closed chunk
    /// stays in place in the voice.
    pub fn close_chunk(&mut self) {
        self.chunks.push(VoiceChunk::new());
    }

    /// Detach the current chunk (for a repeat to take over), leaving a
    /// fresh empty one in its place.
    pub fn take_current_chunk(&mut self) -> VoiceChunk {
        let chunk = self.chunks.pop().unwrap_or_default();
        self.chunks.push(VoiceChunk::new());
        chunk
    }

    /// Remove and return the last element of the current chunk.
    pub fn remove_last_element(&mut self) -> Option<VoiceElement> {
        self.current_chunk_mut().elements.pop()
    }

    /// First chunk, for splicing an implicit repeat start at the very
    /// beginning of the part.
    pub fn first_chunk_mut(&mut self) -> &mut VoiceChunk {
        if self.chunks.is_empty() {
            self.chunks.push(VoiceChunk::new());
        }
        self.chunks.first_mut().expect("voice always has a chunk")
    }

    /// Stanza by number, created on first use.
    pub fn lyrics_mut(&mut self, number: i32) -> &mut Lyrics {
        self.lyrics.entry(number).or_insert_with(|| Lyrics::new(number))
    }

    /// True when nothing was ever appended.
    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(VoiceChunk::is_empty) && self.lyrics.is_empty()
    }
}

// ============================================================================
// Staff and part
// ============================================================================

/// One staff of a part.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Staff {
    pub number: i32,
    pub clef: Option<Clef>,
    pub key: Option<Key>,
    pub time: Option<Time>,
    pub transpose: Option<Transpose>,
    pub voices: BTreeMap<i32, Voice>,
}

impl Staff {
    pub fn new(number: i32) -> Self {
        Self {
            number,
            clef: None,
            key: None,
            time: None,
            transpose: None,
            voices: BTreeMap::new(),
        }
    }

    /// Voice by number, created on first use.
    pub fn voice_mut(&mut self, number: i32) -> &mut Voice {
        self.voices.entry(number).or_insert_with(|| Voice::new(number))
    }
}

/// One performer part.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub instrument_name: String,
    /// Duration unit scale: how many `<duration>` units make a whole note.
    pub divisions_per_whole_note: i32,
    /// Measure number most recently seen, for diagnostics.
    pub measure_number: String,
    /// Part-level attribute defaults (staff number 0 in the source).
    pub clef: Option<Clef>,
    pub key: Option<Key>,
    pub time: Option<Time>,
    pub transpose: Option<Transpose>,
    pub staves: BTreeMap<i32, Staff>,
}

impl Part {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            abbreviation: String::new(),
            instrument_name: String::new(),
            // one unit per quarter note until <divisions> says otherwise
            divisions_per_whole_note: 4,
            measure_number: String::new(),
            clef: None,
            key: None,
            time: None,
            transpose: None,
            staves: BTreeMap::new(),
        }
    }

    /// Staff by number, created on first use with the part defaults.
    pub fn staff_mut(&mut self, number: i32) -> &mut Staff {
        self.staves.entry(number).or_insert_with(|| Staff {
            number,
            clef: self.clef,
            key: self.key.clone(),
            time: self.time,
            transpose: self.transpose,
            voices: BTreeMap::new(),
        })
    }

    /// Voice lookup through the staff level.
    pub fn voice_mut(&mut self, staff_number: i32, voice_number: i32) -> &mut Voice {
        self.staff_mut(staff_number).voice_mut(voice_number)
    }

    /// Set the part default clef and push it to every existing staff.
    pub fn set_default_clef(&mut self, clef: Clef) {
        self.clef = Some(clef);
        for staff in self.staves.values_mut() {
            staff.clef = Some(clef);
        }
    }

    /// Set the part default key and push it to every existing staff.
    pub fn set_default_key(&mut self, key: Key) {
        for staff in self.staves.values_mut() {
            staff.key = Some(key.clone());
        }
        self.key = Some(key);
    }

    /// Set the part default time and push it to every existing staff.
    pub fn set_default_time(&mut self, time: Time) {
        self.time = Some(time);
        for staff in self.staves.values_mut() {
            staff.time = Some(time);
        }
    }

    /// Set the part default transposition and push it to every existing
    /// staff.
    pub fn set_default_transpose(&mut self, transpose: Transpose) {
        self.transpose = Some(transpose);
        for staff in self.staves.values_mut() {
            staff.transpose = Some(transpose);
        }
    }
}
