//! Single-pass MusicXML → MSR translation
//!
//! One converter instance handles one document. The instance walks the
//! parsed element tree depth-first and dispatches every element through
//! `on_enter`/`on_exit` by tag name; all transient "current X" state lives
//! on the instance, never in globals. Recoverable problems go to the
//! reporter and translation continues; inconsistencies in the converter's
//! own bookkeeping abort with an internal error.
//!
//! The sub-modules hold the denser assembly logic:
//! - [`part_groups`]: the open part-group list and fold rules
//! - [`notes`]: note records, chord promotion, the tuplet stack
//! - [`barlines`]: the barline decision table and repeat construction
//! - [`directions`]: pending decoration queues, tempo, octave shifts
//! - [`lyrics`]: syllable chunks and melisma inference

pub mod barlines;
pub mod directions;
pub mod lyrics;
pub mod notes;
pub mod part_groups;

use std::collections::HashMap;

use roxmltree::Node;

use crate::diagnostics::{Diagnostics, Reporter};
use crate::errors::ConversionError;
use crate::msr::{
    clef_kind_from, Barline, Clef, Creator, Dynamics, Key, LyricsChunk, LyricsChunkKind,
    PartGroupSymbol, Repeat, Score, Slur, Time, Transpose, Tuplet, VoiceElement, Voice, Wedge,
    Words, Placement,
};
use crate::settings::ConversionSettings;
use crate::xml_tree::ElementExt;

use barlines::PendingBarline;
use directions::MetronomeData;
use lyrics::LyricData;
use notes::NoteData;
use part_groups::{PartGroupStack, StopOutcome};

/// The result of a successful conversion: the built score plus every
/// diagnostic collected along the way.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub score: Score,
    pub diagnostics: Diagnostics,
}

/// Convert a MusicXML document (partwise) into an MSR score.
pub fn convert(xml: &str, settings: ConversionSettings) -> Result<Conversion, ConversionError> {
    let document = roxmltree::Document::parse(xml)?;
    let root = document.root_element();
    if root.name() != "score-partwise" {
        return Err(ConversionError::UnsupportedRoot(root.name().to_string()));
    }

    let mut converter = MsrConverter::new(settings);
    converter.walk(root)?;
    Ok(converter.finish())
}

/// Voice lookup that borrows only the score, so callers can keep using
/// the reporter and the converter's other fields alongside the result.
pub(crate) fn lookup_voice(
    score: &mut Score,
    part_index: Option<usize>,
    staff_number: i32,
    voice_number: i32,
) -> Option<&mut Voice> {
    part_index.and_then(move |index| score.voice_mut(index, staff_number, voice_number))
}

// ============================================================================
// Transient per-element records
// ============================================================================

#[derive(Default)]
struct GroupData {
    number: i32,
    event: String,
    name: String,
    abbreviation: String,
    symbol: Option<PartGroupSymbol>,
    symbol_default_x: i32,
    barline: bool,
}

#[derive(Default)]
struct ScorePartData {
    id: String,
    name: String,
    abbreviation: String,
    instrument_name: String,
}

#[derive(Default)]
struct ClefData {
    number: i32,
    sign: String,
    line: i32,
    octave_change: i32,
}

#[derive(Default)]
struct KeyData {
    number: i32,
    fifths: i32,
    mode: String,
    cancel: i32,
}

#[derive(Default)]
struct TimeData {
    number: i32,
    symbol: String,
    beats: Option<i32>,
    beat_type: Option<i32>,
    senza_misura: bool,
}

#[derive(Default)]
struct TransposeData {
    number: i32,
    diatonic: i32,
    chromatic: i32,
}

// ============================================================================
// The converter
// ============================================================================

/// Stateful single-document translator. Create one per document.
pub struct MsrConverter {
    settings: ConversionSettings,
    reporter: Reporter,
    score: Score,

    // part list
    group_stack: PartGroupStack,
    current_group: Option<GroupData>,
    current_score_part: Option<ScorePartData>,

    // performance context
    current_part: Option<usize>,
    current_staff: i32,
    current_voice: i32,

    // attributes in flight
    current_clef: ClefData,
    current_key: KeyData,
    current_time: TimeData,
    current_transpose: TransposeData,
    in_page_layout: bool,

    // directions
    on_going_direction: bool,
    on_going_direction_type: bool,
    current_placement: Option<Placement>,
    current_metronome: MetronomeData,
    tempo_appended_in_direction: bool,
    pending_dynamics: Vec<Dynamics>,
    pending_words: Vec<Words>,
    pending_slurs: Vec<Slur>,
    pending_wedges: Vec<Wedge>,

    // notes
    on_going_note: bool,
    note_data: NoteData,
    note_counter: u32,
    on_going_chord: bool,
    grace_group_open: bool,
    tuplet_stack: Vec<Tuplet>,
    /// Last appended note per (part, staff, voice); chord promotion
    /// verifies removal against this.
    last_note_in_voice: HashMap<(usize, i32, i32), u32>,

    // lyrics and melisma state
    current_lyric: LyricData,
    current_note_lyrics: Vec<LyricsChunk>,
    on_going_slur: bool,
    on_going_slur_has_lyrics: bool,
    first_chunk_in_slur_kind: Option<LyricsChunkKind>,

    // barlines and repeats
    on_going_barline: bool,
    current_barline: Barline,
    pending_barlines: Vec<PendingBarline>,
    pending_repeat: Option<Repeat>,

    // backup / forward
    on_going_backup: bool,
    on_going_forward: bool,
    forward_staff: i32,
    forward_voice: i32,
}

impl MsrConverter {
    /// Create a converter for one document.
    pub fn new(settings: ConversionSettings) -> Self {
        let reporter = Reporter::new(settings.source_name.clone());
        Self {
            settings,
            reporter,
            score: Score::new(),
            group_stack: PartGroupStack::new(),
            current_group: None,
            current_score_part: None,
            current_part: None,
            current_staff: 1,
            current_voice: 1,
            current_clef: ClefData::default(),
            current_key: KeyData::default(),
            current_time: TimeData::default(),
            current_transpose: TransposeData::default(),
            in_page_layout: false,
            on_going_direction: false,
            on_going_direction_type: false,
            current_placement: None,
            current_metronome: MetronomeData::default(),
            tempo_appended_in_direction: false,
            pending_dynamics: Vec::new(),
            pending_words: Vec::new(),
            pending_slurs: Vec::new(),
            pending_wedges: Vec::new(),
            on_going_note: false,
            note_data: NoteData::default(),
            note_counter: 0,
            on_going_chord: false,
            grace_group_open: false,
            tuplet_stack: Vec::new(),
            last_note_in_voice: HashMap::new(),
            current_lyric: LyricData::default(),
            current_note_lyrics: Vec::new(),
            on_going_slur: false,
            on_going_slur_has_lyrics: false,
            first_chunk_in_slur_kind: None,
            on_going_barline: false,
            current_barline: Barline::new(0),
            pending_barlines: Vec::new(),
            pending_repeat: None,
            on_going_backup: false,
            on_going_forward: false,
            forward_staff: 1,
            forward_voice: 1,
        }
    }

    /// Consume the converter, yielding score and diagnostics.
    pub fn finish(self) -> Conversion {
        Conversion {
            score: self.score,
            diagnostics: self.reporter.into_diagnostics(),
        }
    }

    /// Depth-first traversal: enter, children, exit.
    pub fn walk(&mut self, node: Node) -> Result<(), ConversionError> {
        self.on_enter(&node)?;
        for child in node.children().filter(|c| c.is_element()) {
            self.walk(child)?;
        }
        self.on_exit(&node)
    }

    fn trace(&mut self, line: usize, message: impl Into<String>) {
        if self.settings.trace {
            self.reporter.info(line, message);
        }
    }

    fn require_part(&mut self, line: usize) -> Result<usize, ConversionError> {
        match self.current_part {
            Some(index) => Ok(index),
            None => Err(self.reporter.internal(line, "no current part")),
        }
    }

    /// Append to the voice addressed by the current staff/voice numbers.
    fn append_to_current_voice(
        &mut self,
        line: usize,
        element: VoiceElement,
    ) -> Result<(), ConversionError> {
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no current voice to append to"));
        };
        voice.append(element);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn on_enter(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        let name = node.name();

        if let Some(kind) = directions::dynamics_kind(name) {
            self.pending_dynamics.push(Dynamics {
                kind,
                placement: self.current_placement,
            });
            return Ok(());
        }
        if let Some(kind) = notes::articulation_kind(name) {
            if self.on_going_note {
                self.note_data.articulations.push(kind);
            }
            return Ok(());
        }
        if let Some(kind) = notes::ornament_kind(name) {
            if self.on_going_note {
                self.note_data.ornaments.push(crate::msr::Ornament::new(kind));
            }
            return Ok(());
        }

        match name {
            // ---- part list ----
            "part-group" => self.on_part_group_start(node),
            "group-name" => {
                if let Some(group) = &mut self.current_group {
                    group.name = node.value();
                }
            }
            "group-abbreviation" => {
                if let Some(group) = &mut self.current_group {
                    group.abbreviation = node.value();
                }
            }
            "group-symbol" => self.on_group_symbol(node),
            "group-barline" => {
                let value = node.value();
                let barline = match value.as_str() {
                    "yes" | "" => true,
                    "no" => false,
                    other => {
                        self.reporter
                            .error(line, format!("unknown group-barline value \"{other}\""));
                        true
                    }
                };
                if let Some(group) = &mut self.current_group {
                    group.barline = barline;
                }
            }
            "score-part" => {
                let id = match node.attr("id") {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => {
                        self.reporter.error(line, "score-part without an id");
                        String::new()
                    }
                };
                self.current_score_part = Some(ScorePartData {
                    id,
                    ..ScorePartData::default()
                });
            }
            "part-name" => {
                if let Some(part) = &mut self.current_score_part {
                    part.name = node.value();
                }
            }
            "part-abbreviation" => {
                if let Some(part) = &mut self.current_score_part {
                    part.abbreviation = node.value();
                }
            }
            "instrument-name" => {
                if let Some(part) = &mut self.current_score_part {
                    part.instrument_name = node.value();
                }
            }

            // ---- header ----
            "work-number" => self.score.identification.work_number = node.value(),
            "work-title" => self.score.identification.work_title = node.value(),
            "movement-number" => self.score.identification.movement_number = node.value(),
            "movement-title" => self.score.identification.movement_title = node.value(),
            "creator" => {
                let kind = node.attr("type").unwrap_or("").to_string();
                self.score.identification.creators.push(Creator {
                    kind,
                    name: node.value(),
                });
            }
            "rights" => self.score.identification.rights.push(node.value()),
            "software" => self.score.identification.software.push(node.value()),
            "encoding-date" => self.score.identification.encoding_date = node.value(),

            // ---- geometry ----
            "millimeters" => {
                if let Some(value) = node.float_value() {
                    self.score
                        .page_geometry
                        .get_or_insert_with(Default::default)
                        .millimeters = value;
                }
            }
            "tenths" => {
                if let Some(value) = node.float_value() {
                    self.score
                        .page_geometry
                        .get_or_insert_with(Default::default)
                        .tenths = value;
                }
            }
            "page-layout" => self.in_page_layout = true,
            "page-width" | "page-height" | "left-margin" | "right-margin" | "top-margin"
            | "bottom-margin" => self.on_page_dimension(node),

            // ---- score body structure ----
            "part" => self.on_part_start(node)?,
            "measure" => {
                if let Some(index) = self.current_part {
                    if let Some(part) = self.score.parts.get_mut(index) {
                        part.measure_number = node.attr("number").unwrap_or("").to_string();
                    }
                }
            }
            "print" => {
                if node.attr("new-system") == Some("yes") && self.current_part.is_some() {
                    self.append_to_current_voice(line, VoiceElement::Break)?;
                }
            }

            // ---- attributes ----
            "divisions" => self.on_divisions(node)?,
            "staves" => self.on_staves(node)?,
            "clef" => {
                self.current_clef = ClefData {
                    number: node.int_attr("number").unwrap_or(0),
                    ..ClefData::default()
                };
            }
            "sign" => self.current_clef.sign = node.value(),
            "line" => self.current_clef.line = node.int_value().unwrap_or(0),
            "clef-octave-change" => {
                self.current_clef.octave_change = node.int_value().unwrap_or(0);
            }
            "key" => {
                self.current_key = KeyData {
                    number: node.int_attr("number").unwrap_or(0),
                    ..KeyData::default()
                };
            }
            "fifths" => self.current_key.fifths = node.int_value().unwrap_or(0),
            "mode" => self.current_key.mode = node.value(),
            "cancel" => self.current_key.cancel = node.int_value().unwrap_or(0),
            "time" => {
                self.current_time = TimeData {
                    number: node.int_attr("number").unwrap_or(0),
                    symbol: node.attr("symbol").unwrap_or("").to_string(),
                    ..TimeData::default()
                };
            }
            "beats" => self.current_time.beats = node.int_value(),
            "beat-type" => self.current_time.beat_type = node.int_value(),
            "senza-misura" => self.current_time.senza_misura = true,
            "transpose" => {
                self.current_transpose = TransposeData {
                    number: node.int_attr("number").unwrap_or(0),
                    ..TransposeData::default()
                };
            }
            "diatonic" => self.current_transpose.diatonic = node.int_value().unwrap_or(0),
            "chromatic" => self.current_transpose.chromatic = node.int_value().unwrap_or(0),

            // ---- directions ----
            "direction" => self.on_direction_start(node)?,
            "direction-type" => self.on_going_direction_type = true,
            "words" => self.on_words(node),
            "metronome" => self.on_metronome_start(node),
            "beat-unit" => self.current_metronome.add_unit(node.value()),
            "beat-unit-dot" => self.current_metronome.dot_last_unit(),
            "per-minute" => self.on_per_minute(node),
            "wedge" => self.on_wedge(node),
            "octave-shift" => self.on_octave_shift(node)?,
            "segno" => self.on_segno(line)?,
            "coda" => self.on_coda(line)?,
            "eyeglasses" => self.on_eyeglasses(line)?,
            "pedal" => self.on_pedal(node)?,
            "rehearsal" => self.on_rehearsal(node)?,

            // ---- context-sensitive leaves ----
            "staff" => self.on_staff_number(node),
            "voice" => self.on_voice_number(node),
            "duration" => self.on_duration(node),
            "backup" => self.on_going_backup = true,
            "forward" => {
                self.on_going_forward = true;
                self.forward_staff = self.current_staff;
                self.forward_voice = self.current_voice;
            }

            // ---- notes ----
            "note" => self.on_note_start(),
            "step" => self.on_step(node),
            "alter" => self.note_data.alter = node.float_value().unwrap_or(0.0),
            "octave" => self.note_data.octave = node.int_value().unwrap_or(0),
            "rest" => self.note_data.is_rest = true,
            "unpitched" => self.note_data.is_unpitched = true,
            "display-step" => {
                self.note_data.display_step = node.value().chars().next();
            }
            "display-octave" => {
                self.note_data.display_octave = node.int_value().unwrap_or(0);
            }
            "grace" => self.on_grace(node),
            "chord" => self.note_data.belongs_to_chord = true,
            "type" => self.on_note_type(node),
            "dot" => self.note_data.dots += 1,
            "stem" => self.on_stem(node),
            "beam" => self.on_beam(node),
            "time-modification" => self.note_data.belongs_to_tuplet = true,
            "actual-notes" => {
                if self.on_going_note {
                    self.note_data.actual_notes = node.int_value().unwrap_or(0);
                }
            }
            "normal-notes" => {
                if self.on_going_note {
                    self.note_data.normal_notes = node.int_value().unwrap_or(0);
                }
            }
            "normal-type" => {
                if self.on_going_note {
                    self.note_data.normal_type = Some(node.value());
                }
            }
            "tuplet" => self.on_tuplet(node),
            "tied" => self.on_tied(node),
            "slur" => self.on_slur(node),
            "accidental-mark" => self.on_accidental_mark(node),

            // ---- lyrics ----
            "lyric" => self.on_lyric_start(node),
            "syllabic" => self.on_syllabic(node),
            "text" => self.current_lyric.add_text(node.value()),
            "elision" => self.current_lyric.elision = true,

            // ---- barlines ----
            "barline" => self.on_barline_start(node),
            "bar-style" => self.on_bar_style(node),
            "ending" => self.on_ending(node),
            "repeat" => self.on_repeat(node),

            _ => {}
        }
        Ok(())
    }

    fn on_exit(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        match node.name() {
            "part-group" => self.on_part_group_end(line)?,
            "score-part" => self.on_score_part_end(line),
            "part-list" => self.on_part_list_end(line),
            "part" => self.on_part_end(line)?,
            "clef" => self.on_clef_end(line)?,
            "key" => self.on_key_end(line)?,
            "time" => self.on_time_end(line)?,
            "transpose" => self.on_transpose_end(line)?,
            "page-layout" => self.in_page_layout = false,
            "direction" => self.on_direction_end(line)?,
            "direction-type" => self.on_going_direction_type = false,
            "metronome" => self.on_metronome_end(line)?,
            "note" => self.on_note_end(line)?,
            "lyric" => self.on_lyric_end(line),
            "barline" => self.on_barline_end(line)?,
            "backup" => {
                self.handle_pending_tuplets(line, self.current_staff, self.current_voice)?;
                self.on_going_backup = false;
            }
            "forward" => {
                self.handle_pending_tuplets(line, self.current_staff, self.current_voice)?;
                self.current_staff = self.forward_staff;
                self.current_voice = self.forward_voice;
                self.on_going_forward = false;
            }
            _ => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Part list
    // ------------------------------------------------------------------

    fn on_part_group_start(&mut self, node: &Node) {
        let line = node.line();
        let number = node.int_attr("number").unwrap_or(1);
        let event = node.attr("type").unwrap_or("").to_string();
        if event.is_empty() {
            self.reporter
                .error(line, format!("part-group {number} without a type"));
        }
        self.current_group = Some(GroupData {
            number,
            event,
            barline: true,
            ..GroupData::default()
        });
    }

    fn on_group_symbol(&mut self, node: &Node) {
        let line = node.line();
        let symbol = match node.value().as_str() {
            "brace" => Some(PartGroupSymbol::Brace),
            "bracket" => Some(PartGroupSymbol::Bracket),
            "line" => Some(PartGroupSymbol::Line),
            "square" => Some(PartGroupSymbol::Square),
            "none" | "" => Some(PartGroupSymbol::None),
            other => {
                self.reporter
                    .error(line, format!("unknown group-symbol \"{other}\""));
                None
            }
        };
        if let Some(group) = &mut self.current_group {
            if let Some(symbol) = symbol {
                group.symbol = Some(symbol);
            }
            group.symbol_default_x = node.float_attr("default-x").unwrap_or(0.0) as i32;
        }
    }

    fn on_part_group_end(&mut self, line: usize) -> Result<(), ConversionError> {
        let Some(group) = self.current_group.take() else {
            return Ok(());
        };
        match group.event.as_str() {
            "start" => {
                if self.group_stack.is_open(group.number) {
                    self.reporter.warning(
                        line,
                        format!("part-group {} started while already open", group.number),
                    );
                    return Ok(());
                }
                let mut open = crate::msr::PartGroup::new(group.number);
                open.name = group.name;
                open.abbreviation = group.abbreviation;
                open.symbol = group.symbol.unwrap_or(PartGroupSymbol::None);
                open.symbol_default_x = group.symbol_default_x;
                open.barline = group.barline;
                self.trace(line, format!("part-group {} starts", open.number));
                self.group_stack.start(open);
            }
            "stop" => match self.group_stack.stop(group.number) {
                StopOutcome::Unknown => {
                    self.reporter.error(
                        line,
                        format!("part-group {} stop for a group that is not open", group.number),
                    );
                }
                StopOutcome::SelfNested(_) => {
                    return Err(self.reporter.internal(
                        line,
                        format!("part-group {} would nest inside itself", group.number),
                    ));
                }
                StopOutcome::Nested => {
                    self.trace(line, format!("part-group {} folded inward", group.number));
                }
                StopOutcome::Closed(closed) => {
                    self.trace(line, format!("part-group {} closed", closed.number));
                    self.score.part_groups.push(closed);
                }
            },
            other => {
                self.reporter
                    .error(line, format!("unknown part-group type \"{other}\""));
            }
        }
        Ok(())
    }

    fn on_score_part_end(&mut self, line: usize) {
        let Some(data) = self.current_score_part.take() else {
            return;
        };
        if data.id.is_empty() {
            return;
        }

        if self.group_stack.is_empty() {
            let number = self.group_stack.start_implicit();
            self.trace(line, format!("implicit part-group {number} opened"));
        }

        let mut part = crate::msr::Part::new(data.id.clone());
        part.name = data.name;
        part.abbreviation = data.abbreviation;
        part.instrument_name = data.instrument_name;

        match self.score.add_part(part) {
            Ok(_) => {
                self.trace(line, format!("part \"{}\" registered", data.id));
            }
            Err(message) => {
                self.reporter.error(line, message);
                return;
            }
        }
        self.group_stack.add_part(data.id);

        // the implicit group wraps exactly one ungrouped part
        if let Some(number) = self.group_stack.implicit_number() {
            if let StopOutcome::Closed(closed) = self.group_stack.stop(number) {
                self.score.part_groups.push(closed);
            }
        }
    }

    fn on_part_list_end(&mut self, line: usize) {
        // close innermost first so leftovers still nest properly
        while !self.group_stack.is_empty() {
            let Some(&number) = self.group_stack.open_numbers().last() else {
                break;
            };
            self.reporter
                .warning(line, format!("part-group {number} was never stopped"));
            match self.group_stack.stop(number) {
                StopOutcome::Closed(closed) => self.score.part_groups.push(closed),
                StopOutcome::Nested => {}
                StopOutcome::SelfNested(orphan) => {
                    // keep the parts reachable even though the list is bad
                    self.score.part_groups.push(orphan);
                }
                StopOutcome::Unknown => break,
            }
        }
    }

    // ------------------------------------------------------------------
    // Score body: parts and attributes
    // ------------------------------------------------------------------

    fn on_part_start(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        let id = node.attr("id").unwrap_or("").to_string();
        let Some(index) = self.score.part_index(&id) else {
            return Err(self
                .reporter
                .internal(line, format!("part \"{id}\" is not in the part list")));
        };

        self.current_part = Some(index);
        self.current_staff = 1;
        self.current_voice = 1;
        self.on_going_chord = false;
        self.grace_group_open = false;
        self.tuplet_stack.clear();
        self.pending_barlines.clear();
        self.pending_repeat = None;
        self.trace(line, format!("part \"{id}\" begins"));
        Ok(())
    }

    fn on_part_end(&mut self, line: usize) -> Result<(), ConversionError> {
        self.handle_pending_tuplets(line, self.current_staff, self.current_voice)?;
        self.flush_pending_repeat(line)?;
        self.pending_barlines.clear();

        let pending = self.pending_dynamics.len()
            + self.pending_words.len()
            + self.pending_slurs.len()
            + self.pending_wedges.len();
        if pending > 0 {
            self.reporter.warning(
                line,
                format!("{pending} pending decorations were never attached to a note"),
            );
            self.pending_dynamics.clear();
            self.pending_words.clear();
            self.pending_slurs.clear();
            self.pending_wedges.clear();
        }
        self.current_part = None;
        Ok(())
    }

    fn on_divisions(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        let value = node.int_value().unwrap_or(0);
        if value <= 0 {
            self.reporter
                .error(line, format!("divisions must be positive, got {value}"));
            return Ok(());
        }
        let index = self.require_part(line)?;
        if let Some(part) = self.score.parts.get_mut(index) {
            // divisions are per quarter note in the source
            part.divisions_per_whole_note = value * 4;
        }
        Ok(())
    }

    fn on_staves(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        let count = node.int_value().unwrap_or(0);
        let index = self.require_part(line)?;
        if let Some(part) = self.score.parts.get_mut(index) {
            for number in 1..=count {
                part.staff_mut(number);
            }
        }
        Ok(())
    }

    fn on_clef_end(&mut self, line: usize) -> Result<(), ConversionError> {
        let data = std::mem::take(&mut self.current_clef);
        let Some(kind) = clef_kind_from(&data.sign, data.line, data.octave_change) else {
            self.reporter.error(
                line,
                format!(
                    "unknown clef: sign \"{}\", line {}, octave change {}",
                    data.sign, data.line, data.octave_change
                ),
            );
            return Ok(());
        };
        let clef = Clef { kind };
        let index = self.require_part(line)?;
        let Some(part) = self.score.parts.get_mut(index) else {
            return Ok(());
        };
        if data.number == 0 {
            part.set_default_clef(clef);
        } else {
            part.staff_mut(data.number).clef = Some(clef);
        }
        Ok(())
    }

    fn on_key_end(&mut self, line: usize) -> Result<(), ConversionError> {
        let data = std::mem::take(&mut self.current_key);
        let key = Key {
            fifths: data.fifths,
            mode: data.mode,
            cancel: data.cancel,
        };
        let index = self.require_part(line)?;
        let Some(part) = self.score.parts.get_mut(index) else {
            return Ok(());
        };
        if data.number == 0 {
            part.set_default_key(key);
        } else {
            part.staff_mut(data.number).key = Some(key);
        }
        Ok(())
    }

    fn on_time_end(&mut self, line: usize) -> Result<(), ConversionError> {
        let data = std::mem::take(&mut self.current_time);
        let time = if data.senza_misura {
            Time {
                beats: 0,
                beat_type: 0,
                senza_misura: true,
            }
        } else {
            let (Some(beats), Some(beat_type)) = (data.beats, data.beat_type) else {
                self.reporter
                    .error(line, "time signature without beats or beat-type");
                return Ok(());
            };
            Time {
                beats,
                beat_type,
                senza_misura: false,
            }
        };
        if !data.symbol.is_empty() {
            // the symbol attribute is not carried into the model
            self.trace(
                line,
                format!("time symbol \"{}\" not carried over", data.symbol),
            );
        }
        let index = self.require_part(line)?;
        let Some(part) = self.score.parts.get_mut(index) else {
            return Ok(());
        };
        if data.number == 0 {
            part.set_default_time(time);
        } else {
            part.staff_mut(data.number).time = Some(time);
        }
        Ok(())
    }

    fn on_transpose_end(&mut self, line: usize) -> Result<(), ConversionError> {
        let data = std::mem::take(&mut self.current_transpose);
        let transpose = Transpose {
            diatonic: data.diatonic,
            chromatic: data.chromatic,
        };
        let index = self.require_part(line)?;
        let Some(part) = self.score.parts.get_mut(index) else {
            return Ok(());
        };
        if data.number == 0 {
            part.set_default_transpose(transpose);
        } else {
            part.staff_mut(data.number).transpose = Some(transpose);
        }
        Ok(())
    }

    fn on_page_dimension(&mut self, node: &Node) {
        if !self.in_page_layout {
            return;
        }
        let Some(value) = node.float_value() else {
            return;
        };
        let geometry = self.score.page_geometry.get_or_insert_with(Default::default);
        let factor = geometry.millimeters_per_tenth();
        let millimeters = if factor > 0.0 { value * factor } else { value };
        match node.name() {
            "page-width" => geometry.page_width = Some(millimeters),
            "page-height" => geometry.page_height = Some(millimeters),
            "left-margin" => geometry.left_margin = Some(millimeters),
            "right-margin" => geometry.right_margin = Some(millimeters),
            "top-margin" => geometry.top_margin = Some(millimeters),
            "bottom-margin" => geometry.bottom_margin = Some(millimeters),
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Context-sensitive leaves
    // ------------------------------------------------------------------

    fn on_staff_number(&mut self, node: &Node) {
        let line = node.line();
        let mut value = node.int_value().unwrap_or(0);
        if value < 1 {
            self.reporter
                .error(line, format!("staff number {value} is not positive"));
            value = 1;
        }
        if self.on_going_forward {
            self.forward_staff = value;
        } else if self.on_going_note {
            self.note_data.staff = value;
            self.current_staff = value;
        } else if self.on_going_direction {
            self.current_staff = value;
        } else {
            self.reporter.error(line, "staff number out of context");
        }
    }

    fn on_voice_number(&mut self, node: &Node) {
        let line = node.line();
        let mut value = node.int_value().unwrap_or(0);
        if value < 1 {
            self.reporter
                .error(line, format!("voice number {value} is not positive"));
            value = 1;
        }
        if self.on_going_forward {
            self.forward_voice = value;
        } else if self.on_going_note {
            self.note_data.voice = value;
            self.current_voice = value;
        } else if self.on_going_direction {
            self.current_voice = value;
        } else {
            self.reporter.error(line, "voice number out of context");
        }
    }

    fn on_duration(&mut self, node: &Node) {
        let line = node.line();
        let value = node.int_value().unwrap_or(0);
        if self.on_going_backup || self.on_going_forward {
            // position bookkeeping only; the timeline model keeps order,
            // not offsets
        } else if self.on_going_note {
            self.note_data.divisions = value;
        } else {
            self.reporter.warning(line, "duration out of context");
        }
    }
}
