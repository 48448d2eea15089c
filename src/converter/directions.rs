//! Direction payloads and the pending decoration queues
//!
//! Dynamics, words, wedges (and slurs, which arrive inside notations) are
//! not attached where they appear: they queue up on the converter and the
//! next finished note takes them. Tempo marks, octave shifts, segno/coda,
//! pedal and rehearsal marks go straight onto the current voice.

use roxmltree::Node;

use crate::durations::{apply_dots, note_type_fraction};
use crate::errors::ConversionError;
use crate::msr::{
    DynamicsKind, OctaveShift, OctaveShiftKind, Pedal, PedalKind, Placement, Rehearsal,
    RehearsalEnclosure, Tempo, VoiceElement, WedgeKind, Words,
};
use crate::xml_tree::ElementExt;

use super::{lookup_voice, MsrConverter};

/// One beat unit of a metronome mark.
#[derive(Default)]
pub(crate) struct MetronomeUnit {
    pub name: String,
    pub dots: u32,
}

/// Transient metronome state; a mark only makes it into the score when
/// it has exactly one beat unit and a numeric per-minute value.
#[derive(Default)]
pub(crate) struct MetronomeData {
    pub units: Vec<MetronomeUnit>,
    pub per_minute: Option<i32>,
    pub parenthesized: bool,
}

impl MetronomeData {
    pub fn add_unit(&mut self, name: String) {
        self.units.push(MetronomeUnit { name, dots: 0 });
    }

    pub fn dot_last_unit(&mut self) {
        if let Some(unit) = self.units.last_mut() {
            unit.dots += 1;
        }
    }
}

/// Map a dynamics element tag to its kind.
pub(crate) fn dynamics_kind(tag: &str) -> Option<DynamicsKind> {
    let kind = match tag {
        "f" => DynamicsKind::F,
        "ff" => DynamicsKind::FF,
        "fff" => DynamicsKind::FFF,
        "ffff" => DynamicsKind::FFFF,
        "fffff" => DynamicsKind::FFFFF,
        "ffffff" => DynamicsKind::FFFFFF,
        "p" => DynamicsKind::P,
        "pp" => DynamicsKind::PP,
        "ppp" => DynamicsKind::PPP,
        "pppp" => DynamicsKind::PPPP,
        "ppppp" => DynamicsKind::PPPPP,
        "pppppp" => DynamicsKind::PPPPPP,
        "fp" => DynamicsKind::FP,
        "fz" => DynamicsKind::FZ,
        "rf" => DynamicsKind::RF,
        "sf" => DynamicsKind::SF,
        "rfz" => DynamicsKind::RFZ,
        "sfz" => DynamicsKind::SFZ,
        "sfp" => DynamicsKind::SFP,
        "sfpp" => DynamicsKind::SFPP,
        "sffz" => DynamicsKind::SFFZ,
        _ => return None,
    };
    Some(kind)
}

impl MsrConverter {
    pub(crate) fn on_direction_start(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        self.current_placement = match node.attr("placement") {
            Some("above") => Some(Placement::Above),
            Some("below") => Some(Placement::Below),
            None | Some("") => None,
            Some(other) => {
                self.reporter
                    .error(line, format!("unknown placement \"{other}\""));
                None
            }
        };
        self.on_going_direction = true;
        self.tempo_appended_in_direction = false;
        Ok(())
    }

    pub(crate) fn on_direction_end(&mut self, line: usize) -> Result<(), ConversionError> {
        // words in the same direction as a metronome mark are its
        // indication text, not note decorations
        if self.tempo_appended_in_direction && !self.pending_words.is_empty() {
            let text = self
                .pending_words
                .drain(..)
                .map(|w| w.text)
                .collect::<Vec<_>>()
                .join(" ");
            let Some(voice) = lookup_voice(
                &mut self.score,
                self.current_part,
                self.current_staff,
                self.current_voice,
            ) else {
                return Err(self.reporter.internal(line, "no voice for tempo indication"));
            };
            if let Some(VoiceElement::Tempo(tempo)) = voice.current_chunk_mut().elements.last_mut()
            {
                tempo.indication = Some(text);
            }
        }
        self.tempo_appended_in_direction = false;
        self.current_placement = None;
        self.on_going_direction = false;
        Ok(())
    }

    pub(crate) fn on_words(&mut self, node: &Node) {
        if !self.on_going_direction_type {
            return;
        }
        let text = node.value();
        if text.is_empty() {
            return;
        }
        self.pending_words.push(Words {
            text,
            placement: self.current_placement,
        });
    }

    pub(crate) fn on_metronome_start(&mut self, node: &Node) {
        self.current_metronome = MetronomeData {
            parenthesized: node.attr("parentheses") == Some("yes"),
            ..MetronomeData::default()
        };
    }

    pub(crate) fn on_per_minute(&mut self, node: &Node) {
        match node.int_value() {
            Some(value) => self.current_metronome.per_minute = Some(value),
            None => self.reporter.warning(
                node.line(),
                format!("non-numeric per-minute \"{}\"", node.value()),
            ),
        }
    }

    pub(crate) fn on_metronome_end(&mut self, line: usize) -> Result<(), ConversionError> {
        let data = std::mem::take(&mut self.current_metronome);
        if data.units.len() != 1 {
            self.reporter.warning(
                line,
                format!(
                    "metronome with {} beat units is not supported, skipped",
                    data.units.len()
                ),
            );
            return Ok(());
        }
        let unit = &data.units[0];
        let Some(base) = note_type_fraction(&unit.name) else {
            self.reporter
                .warning(line, format!("unknown beat unit \"{}\", skipped", unit.name));
            return Ok(());
        };
        let Some(per_minute) = data.per_minute else {
            self.reporter
                .warning(line, "metronome without a per-minute value, skipped");
            return Ok(());
        };

        let tempo = Tempo {
            beat_unit: apply_dots(base, unit.dots),
            per_minute,
            parenthesized: data.parenthesized,
            indication: None,
        };
        self.append_to_current_voice(line, VoiceElement::Tempo(tempo))?;
        self.tempo_appended_in_direction = true;
        Ok(())
    }

    pub(crate) fn on_wedge(&mut self, node: &Node) {
        let kind = match node.attr("type") {
            Some("crescendo") => WedgeKind::Crescendo,
            Some("diminuendo") => WedgeKind::Diminuendo,
            Some("stop") => WedgeKind::Stop,
            other => {
                self.reporter
                    .error(node.line(), format!("wedge without a valid type ({other:?})"));
                return;
            }
        };
        self.pending_wedges.push(crate::msr::Wedge { kind });
    }

    pub(crate) fn on_octave_shift(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        let size = node.int_attr("size").unwrap_or(8);
        if size != 8 && size != 15 {
            self.reporter
                .error(line, format!("octave-shift size {size} is not 8 or 15"));
            return Ok(());
        }
        let kind = match node.attr("type") {
            Some("up") => OctaveShiftKind::Up,
            Some("down") => OctaveShiftKind::Down,
            Some("stop") => OctaveShiftKind::Stop,
            other => {
                self.reporter.error(
                    line,
                    format!("octave-shift without a valid type ({other:?})"),
                );
                return Ok(());
            }
        };
        self.append_to_current_voice(line, VoiceElement::OctaveShift(OctaveShift { kind, size }))
    }

    pub(crate) fn on_segno(&mut self, line: usize) -> Result<(), ConversionError> {
        if self.on_going_barline {
            self.current_barline.has_segno = true;
            return Ok(());
        }
        self.append_to_current_voice(line, VoiceElement::Segno)
    }

    pub(crate) fn on_coda(&mut self, line: usize) -> Result<(), ConversionError> {
        if self.on_going_barline {
            self.current_barline.has_coda = true;
            return Ok(());
        }
        self.append_to_current_voice(line, VoiceElement::Coda)
    }

    pub(crate) fn on_eyeglasses(&mut self, line: usize) -> Result<(), ConversionError> {
        if self.on_going_barline {
            self.current_barline.has_eyeglasses = true;
            return Ok(());
        }
        self.append_to_current_voice(line, VoiceElement::Eyeglasses)
    }

    pub(crate) fn on_pedal(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        if self.on_going_barline {
            self.current_barline.has_pedal = true;
            return Ok(());
        }
        let kind = match node.attr("type") {
            Some("start") => PedalKind::Start,
            Some("stop") => PedalKind::Stop,
            Some("change") => PedalKind::Change,
            other => {
                self.reporter
                    .error(line, format!("pedal without a valid type ({other:?})"));
                return Ok(());
            }
        };
        let pedal = Pedal {
            kind,
            line: node.attr("line") == Some("yes"),
        };
        self.append_to_current_voice(line, VoiceElement::Pedal(pedal))
    }

    pub(crate) fn on_rehearsal(&mut self, node: &Node) -> Result<(), ConversionError> {
        let line = node.line();
        let enclosure = match node.attr("enclosure") {
            Some("none") | None => RehearsalEnclosure::None,
            Some("rectangle") | Some("square") => RehearsalEnclosure::Rectangle,
            Some("oval") => RehearsalEnclosure::Oval,
            Some("circle") => RehearsalEnclosure::Circle,
            Some("bracket") => RehearsalEnclosure::Bracket,
            Some("triangle") => RehearsalEnclosure::Triangle,
            Some("diamond") => RehearsalEnclosure::Diamond,
            Some(other) => {
                self.reporter
                    .warning(line, format!("unknown rehearsal enclosure \"{other}\""));
                RehearsalEnclosure::None
            }
        };
        let rehearsal = Rehearsal {
            text: node.value(),
            enclosure,
        };
        self.append_to_current_voice(line, VoiceElement::Rehearsal(rehearsal))
    }
}
