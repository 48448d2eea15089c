//! Note assembly: standalone notes, chord promotion, the tuplet stack
//!
//! Every `<note>` builds up a transient [`NoteData`] record; the real
//! [`Note`] object is created once at the closing tag and dispatched to
//! exactly one destination: a chord, the open tuplet, a grace group, or
//! the voice itself.
//!
//! Chord promotion is retroactive: `<chord/>` appears on the *second*
//! note, so the first one has already been appended to the voice. It is
//! removed again, verified against the per-voice last-appended handle,
//! and becomes the first chord member. A mismatch there is a bug in this
//! converter's bookkeeping and aborts loudly.

use crate::errors::ConversionError;
use crate::msr::{
    AccidentalKind, Articulation, Beam, BeamKind, GraceNotes, Note, NoteKind, OrnamentKind, Pitch,
    Placement, Slur, SlurKind, StemKind, TieKind, Tuplet, VoiceElement,
};
use crate::xml_tree::ElementExt;
use crate::{durations, msr::LyricsChunkKind};

use super::{lookup_voice, MsrConverter};
use roxmltree::Node;

/// What the `<tuplet>` element said about this note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TupletEventKind {
    Start,
    Continue,
    Stop,
}

/// Transient record for the note being read; reset on every `<note>`.
pub(crate) struct NoteData {
    pub staff: i32,
    pub voice: i32,
    pub step: Option<char>,
    pub alter: f32,
    pub octave: i32,
    pub is_rest: bool,
    pub is_unpitched: bool,
    pub display_step: Option<char>,
    pub display_octave: i32,
    pub divisions: i32,
    pub dots: i32,
    pub note_type: Option<String>,
    pub is_grace: bool,
    pub grace_slash: bool,
    pub belongs_to_chord: bool,
    pub belongs_to_tuplet: bool,
    pub actual_notes: i32,
    pub normal_notes: i32,
    pub normal_type: Option<String>,
    pub tuplet_number: i32,
    pub tuplet_kind: Option<TupletEventKind>,
    pub tie: Option<TieKind>,
    pub stem: Option<StemKind>,
    pub beams: Vec<Beam>,
    pub articulations: Vec<Articulation>,
    pub ornaments: Vec<crate::msr::Ornament>,
}

impl Default for NoteData {
    fn default() -> Self {
        Self {
            staff: 1,
            voice: 1,
            step: None,
            alter: 0.0,
            octave: 0,
            is_rest: false,
            is_unpitched: false,
            display_step: None,
            display_octave: 0,
            divisions: 0,
            dots: 0,
            note_type: None,
            is_grace: false,
            grace_slash: false,
            belongs_to_chord: false,
            belongs_to_tuplet: false,
            actual_notes: 0,
            normal_notes: 0,
            normal_type: None,
            tuplet_number: 1,
            tuplet_kind: None,
            tie: None,
            stem: None,
            beams: Vec::new(),
            articulations: Vec::new(),
            ornaments: Vec::new(),
        }
    }
}

/// Articulation tags recognized inside `<articulations>`.
pub(crate) fn articulation_kind(tag: &str) -> Option<Articulation> {
    let kind = match tag {
        "accent" => Articulation::Accent,
        "strong-accent" => Articulation::StrongAccent,
        "staccato" => Articulation::Staccato,
        "staccatissimo" => Articulation::Staccatissimo,
        "tenuto" => Articulation::Tenuto,
        "detached-legato" => Articulation::DetachedLegato,
        "stress" => Articulation::Stress,
        "unstress" => Articulation::Unstress,
        "breath-mark" => Articulation::BreathMark,
        "caesura" => Articulation::Caesura,
        "spiccato" => Articulation::Spiccato,
        "scoop" => Articulation::Scoop,
        "plop" => Articulation::Plop,
        "doit" => Articulation::Doit,
        "falloff" => Articulation::Falloff,
        "arpeggiate" => Articulation::Arpeggiato,
        "fermata" => Articulation::Fermata,
        _ => return None,
    };
    Some(kind)
}

/// Ornament tags recognized inside `<ornaments>`.
pub(crate) fn ornament_kind(tag: &str) -> Option<OrnamentKind> {
    let kind = match tag {
        "trill-mark" => OrnamentKind::Trill,
        "wavy-line" => OrnamentKind::WavyLine,
        "turn" => OrnamentKind::Turn,
        "inverted-turn" => OrnamentKind::InvertedTurn,
        "delayed-turn" => OrnamentKind::DelayedTurn,
        "delayed-inverted-turn" => OrnamentKind::DelayedInvertedTurn,
        "vertical-turn" => OrnamentKind::VerticalTurn,
        "mordent" => OrnamentKind::Mordent,
        "inverted-mordent" => OrnamentKind::InvertedMordent,
        "schleifer" => OrnamentKind::Schleifer,
        "shake" => OrnamentKind::Shake,
        _ => return None,
    };
    Some(kind)
}

impl MsrConverter {
    // ------------------------------------------------------------------
    // Leaf handlers
    // ------------------------------------------------------------------

    pub(crate) fn on_note_start(&mut self) {
        self.note_data = NoteData::default();
        self.current_note_lyrics.clear();
        // the shared staff/voice numbers follow the notes: reset here,
        // updated by note-level staff/voice elements, so barlines and
        // directions after this note address the voice it played in
        self.current_staff = 1;
        self.current_voice = 1;
        self.on_going_note = true;
    }

    pub(crate) fn on_step(&mut self, node: &Node) {
        if !self.on_going_note {
            return;
        }
        let value = node.value();
        match value.chars().next() {
            Some(step @ 'A'..='G') if value.len() == 1 => self.note_data.step = Some(step),
            _ => self
                .reporter
                .error(node.line(), format!("invalid step \"{value}\"")),
        }
    }

    pub(crate) fn on_grace(&mut self, node: &Node) {
        self.note_data.is_grace = true;
        match node.attr("slash") {
            Some("yes") => self.note_data.grace_slash = true,
            Some("no") | None => {}
            Some(other) => self
                .reporter
                .error(node.line(), format!("unknown grace slash value \"{other}\"")),
        }
    }

    pub(crate) fn on_note_type(&mut self, node: &Node) {
        if !self.on_going_note {
            return;
        }
        let value = node.value();
        if durations::note_type_fraction(&value).is_none() {
            self.reporter
                .warning(node.line(), format!("unknown note type \"{value}\""));
        }
        self.note_data.note_type = Some(value);
    }

    pub(crate) fn on_stem(&mut self, node: &Node) {
        let kind = match node.value().as_str() {
            "up" => StemKind::Up,
            "down" => StemKind::Down,
            "none" => StemKind::None,
            "double" => StemKind::Double,
            other => {
                self.reporter
                    .error(node.line(), format!("unknown stem value \"{other}\""));
                return;
            }
        };
        self.note_data.stem = Some(kind);
    }

    pub(crate) fn on_beam(&mut self, node: &Node) {
        let kind = match node.value().as_str() {
            "begin" => BeamKind::Begin,
            "continue" => BeamKind::Continue,
            "end" => BeamKind::End,
            "forward hook" => BeamKind::ForwardHook,
            "backward hook" => BeamKind::BackwardHook,
            other => {
                self.reporter
                    .warning(node.line(), format!("beam value \"{other}\" ignored"));
                return;
            }
        };
        self.note_data.beams.push(Beam {
            number: node.int_attr("number").unwrap_or(1),
            kind,
        });
    }

    pub(crate) fn on_tuplet(&mut self, node: &Node) {
        self.note_data.belongs_to_tuplet = true;
        self.note_data.tuplet_number = node.int_attr("number").unwrap_or(1);
        let kind = match node.attr("type") {
            Some("start") => Some(TupletEventKind::Start),
            Some("continue") => Some(TupletEventKind::Continue),
            Some("stop") => Some(TupletEventKind::Stop),
            None => None,
            Some(other) => {
                self.reporter
                    .error(node.line(), format!("unknown tuplet type \"{other}\""));
                None
            }
        };
        if kind.is_some() {
            self.note_data.tuplet_kind = kind;
        }
    }

    pub(crate) fn on_tied(&mut self, node: &Node) {
        let kind = match node.attr("type") {
            Some("start") => TieKind::Start,
            Some("continue") => TieKind::Continue,
            Some("stop") => TieKind::Stop,
            other => {
                self.reporter.error(
                    node.line(),
                    format!("tied without a valid type ({other:?})"),
                );
                return;
            }
        };
        self.note_data.tie = Some(kind);
    }

    pub(crate) fn on_slur(&mut self, node: &Node) {
        let line = node.line();
        let kind = match node.attr("type") {
            Some("start") => SlurKind::Start,
            Some("continue") => SlurKind::Continue,
            Some("stop") => SlurKind::Stop,
            None | Some("") => {
                // tolerated while a slur is open; the engraver meant a
                // continuation
                if self.on_going_slur {
                    SlurKind::Continue
                } else {
                    self.reporter.error(line, "slur without a type");
                    return;
                }
            }
            Some(other) => {
                self.reporter
                    .error(line, format!("unknown slur type \"{other}\""));
                return;
            }
        };
        self.pending_slurs.push(Slur {
            number: node.int_attr("number").unwrap_or(1),
            kind,
        });
    }

    pub(crate) fn on_accidental_mark(&mut self, node: &Node) {
        let line = node.line();
        let kind = match node.value().as_str() {
            "natural" => AccidentalKind::Natural,
            "sharp" => AccidentalKind::Sharp,
            "flat" => AccidentalKind::Flat,
            other => {
                self.reporter
                    .error(line, format!("unknown accidental-mark \"{other}\""));
                return;
            }
        };
        let placement = match node.attr("placement") {
            Some("above") => Some(Placement::Above),
            Some("below") => Some(Placement::Below),
            _ => None,
        };
        match self.note_data.ornaments.last_mut() {
            Some(ornament) => {
                ornament.accidental_mark = Some(kind);
                ornament.accidental_placement = placement;
            }
            None => self
                .reporter
                .warning(line, "accidental-mark without a preceding ornament"),
        }
    }

    // ------------------------------------------------------------------
    // Note assembly
    // ------------------------------------------------------------------

    pub(crate) fn on_note_end(&mut self, line: usize) -> Result<(), ConversionError> {
        self.on_going_note = false;
        let mut data = std::mem::take(&mut self.note_data);
        let part_index = self.require_part(line)?;
        let divisions_per_whole = self
            .score
            .parts
            .get(part_index)
            .map(|p| p.divisions_per_whole_note)
            .unwrap_or(4);

        // grace notes carry no duration element; derive one from the type
        if data.is_grace && data.divisions == 0 {
            if let Some(name) = data.note_type.as_deref() {
                if let Some(divisions) =
                    durations::divisions_for_type(name, data.dots as u32, divisions_per_whole)
                {
                    data.divisions = divisions;
                }
            }
        }

        let mut display_divisions = data.divisions;
        if data.belongs_to_tuplet && data.actual_notes > 0 && data.normal_notes > 0 {
            display_divisions = data.divisions * data.normal_notes / data.actual_notes;
        }

        let id = self.note_counter;
        self.note_counter += 1;

        let pitch = if !data.is_rest && !data.is_unpitched {
            data.step.map(|step| Pitch {
                step,
                alter: data.alter,
                octave: data.octave,
            })
        } else {
            None
        };
        let display_pitch = data.display_step.map(|step| Pitch {
            step,
            alter: 0.0,
            octave: data.display_octave,
        });

        let kind = if data.is_grace {
            NoteKind::Grace
        } else if data.is_rest {
            NoteKind::Rest
        } else {
            NoteKind::Standalone
        };

        let mut note = Note {
            id,
            kind,
            pitch,
            display_pitch,
            divisions: data.divisions,
            display_divisions,
            dots: data.dots,
            graphic_type: data.note_type.clone(),
            staff: data.staff,
            voice: data.voice,
            tie: data.tie,
            stem: data.stem,
            beams: std::mem::take(&mut data.beams),
            articulations: std::mem::take(&mut data.articulations),
            ornaments: std::mem::take(&mut data.ornaments),
            dynamics: Vec::new(),
            words: Vec::new(),
            slurs: Vec::new(),
            wedges: Vec::new(),
            has_lyrics: !self.current_note_lyrics.is_empty(),
        };

        if data.belongs_to_chord && data.is_rest {
            self.reporter.error(line, "a rest cannot belong to a chord");
            return Ok(());
        }

        // slur events seen on this note drive melisma state below
        let slur_events: Vec<SlurKind> = self.pending_slurs.iter().map(|s| s.kind).collect();
        let first_chunk_kind = self.current_note_lyrics.first().map(|c| c.kind);

        if data.belongs_to_chord {
            self.handle_chord_member(line, part_index, note, &data)?;
        } else if data.belongs_to_tuplet {
            self.attach_pending_decorations(line, &mut note);
            self.handle_tuplet_member(line, part_index, note, &data)?;
        } else {
            self.handle_standalone(line, part_index, note, &data)?;
        }

        if !data.belongs_to_chord {
            self.on_going_chord = false;
        }
        self.last_note_in_voice
            .insert((part_index, data.staff, data.voice), id);

        // bind the lyric chunks gathered during this note
        if !self.current_note_lyrics.is_empty() {
            let chunks: Vec<_> = self.current_note_lyrics.drain(..).collect();
            let Some(voice) =
                lookup_voice(&mut self.score, Some(part_index), data.staff, data.voice)
            else {
                return Err(self.reporter.internal(line, "no voice for lyric binding"));
            };
            for mut chunk in chunks {
                chunk.note = Some(id);
                voice.lyrics_mut(chunk.stanza).chunks.push(chunk);
            }
        }

        // melisma bookkeeping follows the note, so lyrics of the note that
        // closes a slur still count as inside it
        for event in slur_events {
            match event {
                SlurKind::Start => {
                    self.on_going_slur = true;
                    self.on_going_slur_has_lyrics = note_chunk_has_text(first_chunk_kind);
                    self.first_chunk_in_slur_kind = first_chunk_kind;
                }
                SlurKind::Stop => {
                    self.on_going_slur = false;
                    self.on_going_slur_has_lyrics = false;
                    self.first_chunk_in_slur_kind = None;
                }
                SlurKind::Continue => {}
            }
        }
        Ok(())
    }

    fn handle_standalone(
        &mut self,
        line: usize,
        part_index: usize,
        mut note: Note,
        data: &NoteData,
    ) -> Result<(), ConversionError> {
        self.attach_pending_decorations(line, &mut note);

        if data.is_grace {
            let Some(voice) =
                lookup_voice(&mut self.score, Some(part_index), data.staff, data.voice)
            else {
                return Err(self.reporter.internal(line, "no voice for grace note"));
            };
            let chunk = voice.current_chunk_mut();
            match chunk.elements.last_mut() {
                Some(VoiceElement::GraceNotes(group)) if self.grace_group_open => {
                    group.notes.push(note);
                }
                _ => {
                    let mut group = GraceNotes::new(data.grace_slash);
                    group.notes.push(note);
                    chunk.elements.push(VoiceElement::GraceNotes(group));
                    self.grace_group_open = true;
                }
            }
            return Ok(());
        }

        // a real note flushes any open grace group
        self.grace_group_open = false;
        let Some(voice) = lookup_voice(&mut self.score, Some(part_index), data.staff, data.voice)
        else {
            return Err(self.reporter.internal(line, "no voice for note"));
        };
        voice.append(VoiceElement::Note(note));

        // a plain note while tuplets are open means their stops went
        // missing; close them rather than swallow the contents
        if !self.tuplet_stack.is_empty() {
            self.handle_pending_tuplets(line, data.staff, data.voice)?;
        }
        Ok(())
    }

    fn handle_tuplet_member(
        &mut self,
        line: usize,
        part_index: usize,
        mut note: Note,
        data: &NoteData,
    ) -> Result<(), ConversionError> {
        note.kind = NoteKind::TupletMember;
        self.grace_group_open = false;

        match data.tuplet_kind {
            Some(TupletEventKind::Start) => {
                let mut tuplet = Tuplet::new(
                    data.tuplet_number,
                    data.actual_notes.max(1),
                    data.normal_notes.max(1),
                );
                tuplet.normal_type = data.normal_type.clone();
                tuplet.add_note(note);
                self.tuplet_stack.push(tuplet);
                self.trace(line, format!("tuplet {} starts", data.tuplet_number));
            }
            Some(TupletEventKind::Stop) => match self.tuplet_stack.pop() {
                Some(mut tuplet) => {
                    tuplet.add_note(note);
                    self.finalize_tuplet(line, part_index, tuplet, data.staff, data.voice)?;
                }
                None => {
                    self.reporter
                        .error(line, "tuplet stop with no open tuplet");
                    self.append_plain(line, part_index, note, data)?;
                }
            },
            Some(TupletEventKind::Continue) | None => match self.tuplet_stack.last_mut() {
                Some(tuplet) => tuplet.add_note(note),
                None => {
                    self.reporter.warning(
                        line,
                        "tuplet member outside any open tuplet, treated as standalone",
                    );
                    self.append_plain(line, part_index, note, data)?;
                }
            },
        }
        Ok(())
    }

    fn append_plain(
        &mut self,
        line: usize,
        part_index: usize,
        note: Note,
        data: &NoteData,
    ) -> Result<(), ConversionError> {
        let Some(voice) = lookup_voice(&mut self.score, Some(part_index), data.staff, data.voice)
        else {
            return Err(self.reporter.internal(line, "no voice for note"));
        };
        voice.append(VoiceElement::Note(note));
        Ok(())
    }

    /// Close a finished tuplet: nest it into the enclosing one, or append
    /// it to the voice when it was outermost.
    fn finalize_tuplet(
        &mut self,
        line: usize,
        part_index: usize,
        tuplet: Tuplet,
        staff: i32,
        voice_number: i32,
    ) -> Result<(), ConversionError> {
        if let Some(parent) = self.tuplet_stack.last_mut() {
            parent.add_tuplet(tuplet);
            return Ok(());
        }
        let Some(voice) = lookup_voice(&mut self.score, Some(part_index), staff, voice_number)
        else {
            return Err(self.reporter.internal(line, "no voice for tuplet"));
        };
        voice.append(VoiceElement::Tuplet(tuplet));
        Ok(())
    }

    /// Force-close every open tuplet (backup, forward, missing stops,
    /// part end).
    pub(crate) fn handle_pending_tuplets(
        &mut self,
        line: usize,
        staff: i32,
        voice_number: i32,
    ) -> Result<(), ConversionError> {
        while let Some(tuplet) = self.tuplet_stack.pop() {
            let number = tuplet.number;
            if let Some(parent) = self.tuplet_stack.last_mut() {
                parent.add_tuplet(tuplet);
            } else {
                let part_index = self.require_part(line)?;
                let Some(voice) =
                    lookup_voice(&mut self.score, Some(part_index), staff, voice_number)
                else {
                    return Err(self.reporter.internal(line, "no voice for tuplet"));
                };
                voice.append(VoiceElement::Tuplet(tuplet));
            }
            self.trace(line, format!("tuplet {number} force-closed"));
        }
        Ok(())
    }

    fn handle_chord_member(
        &mut self,
        line: usize,
        part_index: usize,
        note: Note,
        data: &NoteData,
    ) -> Result<(), ConversionError> {
        let key = (part_index, data.staff, data.voice);

        if !self.on_going_chord {
            // promote the previously appended note to first chord member
            let Some(&expected) = self.last_note_in_voice.get(&key) else {
                return Err(self
                    .reporter
                    .internal(line, "chord member with no preceding note in its voice"));
            };
            let Some(voice) =
                lookup_voice(&mut self.score, Some(part_index), data.staff, data.voice)
            else {
                return Err(self.reporter.internal(line, "no voice for chord"));
            };
            let first = match voice.remove_last_element() {
                Some(VoiceElement::Note(first)) if first.id == expected => first,
                Some(other) => {
                    voice.append(other);
                    return Err(self.reporter.internal(
                        line,
                        "last voice element is not the expected first chord note",
                    ));
                }
                None => {
                    return Err(self
                        .reporter
                        .internal(line, "voice is empty, cannot promote a chord"));
                }
            };
            let chord = crate::msr::Chord::from_first_note(first);
            voice.append(VoiceElement::Chord(chord));
            self.on_going_chord = true;
            self.trace(line, "chord promoted from preceding note");
        }

        let Some(voice) = lookup_voice(&mut self.score, Some(part_index), data.staff, data.voice)
        else {
            return Err(self.reporter.internal(line, "no voice for chord"));
        };
        match voice.current_chunk_mut().elements.last_mut() {
            Some(VoiceElement::Chord(chord)) => {
                chord.add_note(note);
                // decorations read inside this member (slurs, dynamics)
                // sit in the pending queues; they belong to the chord
                chord.dynamics.extend(self.pending_dynamics.drain(..));
                chord.words.extend(self.pending_words.drain(..));
                chord.slurs.extend(self.pending_slurs.drain(..));
                chord.wedges.extend(self.pending_wedges.drain(..));
                Ok(())
            }
            _ => Err(self
                .reporter
                .internal(line, "open chord is not the last voice element")),
        }
    }

    /// Drain the pending decoration queues onto a finished note. Rests
    /// either hold them back (delay option) or take them with a warning.
    fn attach_pending_decorations(&mut self, line: usize, note: &mut Note) {
        let queued = self.pending_dynamics.len()
            + self.pending_words.len()
            + self.pending_slurs.len()
            + self.pending_wedges.len();
        if queued == 0 {
            return;
        }
        if note.is_rest() {
            if self.settings.delay_rest_decorations {
                return;
            }
            self.reporter
                .warning(line, "decorations attached to a rest");
        }
        note.dynamics.extend(self.pending_dynamics.drain(..));
        note.words.extend(self.pending_words.drain(..));
        note.slurs.extend(self.pending_slurs.drain(..));
        note.wedges.extend(self.pending_wedges.drain(..));
    }
}

fn note_chunk_has_text(kind: Option<LyricsChunkKind>) -> bool {
    matches!(
        kind,
        Some(LyricsChunkKind::Single)
            | Some(LyricsChunkKind::Begin)
            | Some(LyricsChunkKind::Middle)
            | Some(LyricsChunkKind::End)
    )
}
