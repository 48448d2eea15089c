//! Barline classification and repeat construction
//!
//! A finished `<barline>` runs through an ordered decision table: the
//! first predicate that matches picks the action. Order matters: a
//! hooked ending end (ending stop, usually carrying the backward repeat
//! on the same barline) must win over a plain repeat end.
//!
//! Repeats are built from voice chunks: a repeat start closes the current
//! chunk so the body accumulates in a fresh one; the matching end (or an
//! ending end) detaches that chunk into the [`Repeat`]. When an end
//! arrives with nothing on the pending stack, an implicit repeat start is
//! spliced in at the very beginning of the part.

use roxmltree::Node;

use crate::errors::ConversionError;
use crate::msr::{
    BarStyle, Barline, BarlineCategory, BarlineLocation, EndingType, Repeat, RepeatDirection,
    RepeatEnding, RepeatEndingKind, RepeatWinged, VoiceChunk, VoiceElement,
};
use crate::xml_tree::ElementExt;

use super::{lookup_voice, MsrConverter};

/// Marker pushed when a repeat start or ending start barline goes by.
#[derive(Clone, Copy, Debug)]
pub(crate) enum PendingBarline {
    RepeatStart,
    /// Index of the ending-start barline within the chunk it was
    /// appended to; the matching end splits the chunk there.
    EndingStart { element_index: usize },
}

impl MsrConverter {
    // ------------------------------------------------------------------
    // Element handlers
    // ------------------------------------------------------------------

    pub(crate) fn on_barline_start(&mut self, node: &Node) {
        let line = node.line();
        let location = match node.attr("location") {
            Some("left") => BarlineLocation::Left,
            Some("middle") => BarlineLocation::Middle,
            Some("right") | None => BarlineLocation::Right,
            Some(other) => {
                self.reporter
                    .error(line, format!("unknown barline location \"{other}\""));
                BarlineLocation::Right
            }
        };
        let mut barline = Barline::new(line);
        barline.location = location;
        self.current_barline = barline;
        self.on_going_barline = true;
    }

    pub(crate) fn on_bar_style(&mut self, node: &Node) {
        let value = node.value();
        match BarStyle::parse(&value) {
            Some(style) => self.current_barline.style = Some(style),
            None => self
                .reporter
                .error(node.line(), format!("unknown bar-style \"{value}\"")),
        }
    }

    pub(crate) fn on_ending(&mut self, node: &Node) {
        let line = node.line();
        self.current_barline.ending_number = node.attr("number").map(str::to_string);
        match node.attr("type") {
            Some("start") => self.current_barline.ending_type = Some(EndingType::Start),
            Some("stop") => self.current_barline.ending_type = Some(EndingType::Stop),
            Some("discontinue") => {
                self.current_barline.ending_type = Some(EndingType::Discontinue)
            }
            other => self
                .reporter
                .error(line, format!("ending without a valid type ({other:?})")),
        }
    }

    pub(crate) fn on_repeat(&mut self, node: &Node) {
        let line = node.line();
        match node.attr("direction") {
            Some("forward") => {
                self.current_barline.repeat_direction = Some(RepeatDirection::Forward)
            }
            Some("backward") => {
                self.current_barline.repeat_direction = Some(RepeatDirection::Backward)
            }
            other => self
                .reporter
                .error(line, format!("repeat without a valid direction ({other:?})")),
        }
        match node.attr("winged") {
            Some("none") => self.current_barline.winged = Some(RepeatWinged::None),
            Some("straight") => self.current_barline.winged = Some(RepeatWinged::Straight),
            Some("curved") => self.current_barline.winged = Some(RepeatWinged::Curved),
            Some("double-straight") => {
                self.current_barline.winged = Some(RepeatWinged::DoubleStraight)
            }
            Some("double-curved") => {
                self.current_barline.winged = Some(RepeatWinged::DoubleCurved)
            }
            None => {}
            Some(other) => self
                .reporter
                .error(line, format!("unknown repeat winged value \"{other}\"")),
        }
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    pub(crate) fn on_barline_end(&mut self, line: usize) -> Result<(), ConversionError> {
        self.on_going_barline = false;
        let barline = std::mem::replace(&mut self.current_barline, Barline::new(0));

        // ordered decision table; first match wins
        let rules: [(fn(&Barline) -> bool, BarlineCategory); 5] = [
            (
                |b| {
                    b.location == BarlineLocation::Left
                        && b.repeat_direction == Some(RepeatDirection::Forward)
                },
                BarlineCategory::RepeatStart,
            ),
            (
                // "stop" is the hooked variant whether or not the same
                // barline also carries the backward repeat
                |b| {
                    b.location == BarlineLocation::Right
                        && b.ending_type == Some(EndingType::Stop)
                },
                BarlineCategory::HookedEndingEnd,
            ),
            (
                |b| {
                    b.location == BarlineLocation::Right
                        && b.repeat_direction == Some(RepeatDirection::Backward)
                },
                BarlineCategory::RepeatEnd,
            ),
            (
                |b| {
                    b.location == BarlineLocation::Left
                        && b.ending_type == Some(EndingType::Start)
                },
                BarlineCategory::EndingStart,
            ),
            (
                |b| {
                    b.location == BarlineLocation::Right
                        && b.ending_type == Some(EndingType::Discontinue)
                },
                BarlineCategory::HooklessEndingEnd,
            ),
        ];

        for (predicate, category) in rules {
            if predicate(&barline) {
                return match category {
                    BarlineCategory::RepeatStart => self.handle_repeat_start(line, barline),
                    BarlineCategory::HookedEndingEnd => {
                        self.handle_hooked_ending_end(line, barline)
                    }
                    BarlineCategory::RepeatEnd => self.handle_repeat_end(line, barline),
                    BarlineCategory::EndingStart => self.handle_ending_start(line, barline),
                    BarlineCategory::HooklessEndingEnd => {
                        self.handle_hookless_ending_end(line, barline)
                    }
                    BarlineCategory::Standalone => Ok(()),
                };
            }
        }

        if barline.ending_type.is_none() && barline.repeat_direction.is_none() {
            let mut barline = barline;
            barline.category = BarlineCategory::Standalone;
            self.append_to_current_voice(line, VoiceElement::Barline(barline))
        } else {
            // carries repeat/ending semantics no rule understands; dropped
            self.reporter.error(
                line,
                format!(
                    "unhandled barline: location {:?}, style {:?}, ending {:?}, repeat {:?}",
                    barline.location, barline.style, barline.ending_type, barline.repeat_direction
                ),
            );
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn handle_repeat_start(
        &mut self,
        line: usize,
        mut barline: Barline,
    ) -> Result<(), ConversionError> {
        barline.category = BarlineCategory::RepeatStart;
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no voice for repeat start"));
        };
        voice.append(VoiceElement::Barline(barline));
        // the body accumulates in a fresh chunk after the start barline
        voice.close_chunk();
        if self.pending_repeat.is_none() {
            self.pending_repeat = Some(Repeat::default());
        }
        self.pending_barlines.push(PendingBarline::RepeatStart);
        self.trace(line, "repeat starts");
        Ok(())
    }

    fn handle_ending_start(
        &mut self,
        line: usize,
        mut barline: Barline,
    ) -> Result<(), ConversionError> {
        barline.category = BarlineCategory::EndingStart;
        let number = barline.ending_number.clone().unwrap_or_default();
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no voice for ending start"));
        };
        voice.append(VoiceElement::Barline(barline));
        // no chunk split here; the matching end splits at this index
        let element_index = voice.current_chunk_mut().len() - 1;
        self.pending_barlines
            .push(PendingBarline::EndingStart { element_index });
        self.trace(line, format!("ending \"{number}\" starts"));
        Ok(())
    }

    fn handle_repeat_end(
        &mut self,
        line: usize,
        mut barline: Barline,
    ) -> Result<(), ConversionError> {
        barline.category = BarlineCategory::RepeatEnd;
        let number = barline.ending_number.clone().unwrap_or_default();
        {
            let Some(voice) = lookup_voice(
                &mut self.score,
                self.current_part,
                self.current_staff,
                self.current_voice,
            ) else {
                return Err(self.reporter.internal(line, "no voice for repeat end"));
            };
            voice.append(VoiceElement::Barline(barline));
        }

        match self.pending_barlines.pop() {
            None => {
                self.splice_implicit_repeat_start(line)?;
                self.close_repeat_body(line)?;
                self.trace(line, "repeat closed against an implicit start");
                Ok(())
            }
            Some(PendingBarline::RepeatStart) => {
                self.close_repeat_body(line)?;
                self.trace(line, "repeat closed");
                Ok(())
            }
            Some(PendingBarline::EndingStart { element_index }) => {
                // a backward repeat closing an ending that never said
                // "stop": the ending ends here, hooked, and the repeat
                // closes with it
                self.close_ending(line, element_index, RepeatEndingKind::Hooked, number, true)
            }
        }
    }

    fn handle_hooked_ending_end(
        &mut self,
        line: usize,
        mut barline: Barline,
    ) -> Result<(), ConversionError> {
        barline.category = BarlineCategory::HookedEndingEnd;
        let number = barline.ending_number.clone().unwrap_or_default();
        {
            let Some(voice) = lookup_voice(
                &mut self.score,
                self.current_part,
                self.current_staff,
                self.current_voice,
            ) else {
                return Err(self.reporter.internal(line, "no voice for ending end"));
            };
            voice.append(VoiceElement::Barline(barline));
        }

        match self.pending_barlines.pop() {
            Some(PendingBarline::EndingStart { element_index }) => {
                self.close_ending(line, element_index, RepeatEndingKind::Hooked, number, false)
            }
            Some(PendingBarline::RepeatStart) => {
                // the ending start went missing; the whole chunk is the
                // ending
                self.close_ending(line, 0, RepeatEndingKind::Hooked, number, false)
            }
            None => {
                self.splice_implicit_repeat_start(line)?;
                self.close_ending(line, 0, RepeatEndingKind::Hooked, number, true)
            }
        }
    }

    fn handle_hookless_ending_end(
        &mut self,
        line: usize,
        mut barline: Barline,
    ) -> Result<(), ConversionError> {
        barline.category = BarlineCategory::HooklessEndingEnd;
        let number = barline.ending_number.clone().unwrap_or_default();
        {
            let Some(voice) = lookup_voice(
                &mut self.score,
                self.current_part,
                self.current_staff,
                self.current_voice,
            ) else {
                return Err(self.reporter.internal(line, "no voice for ending end"));
            };
            voice.append(VoiceElement::Barline(barline));
        }

        // hookless endings always close the repeat immediately
        match self.pending_barlines.pop() {
            Some(PendingBarline::EndingStart { element_index }) => {
                self.close_ending(line, element_index, RepeatEndingKind::Hookless, number, true)
            }
            Some(PendingBarline::RepeatStart) => {
                self.close_ending(line, 0, RepeatEndingKind::Hookless, number, true)
            }
            None => {
                self.splice_implicit_repeat_start(line)?;
                self.close_ending(line, 0, RepeatEndingKind::Hookless, number, true)
            }
        }
    }

    // ------------------------------------------------------------------
    // Repeat plumbing
    // ------------------------------------------------------------------

    /// Insert the synthetic repeat start at the very beginning of the
    /// current voice.
    fn splice_implicit_repeat_start(&mut self, line: usize) -> Result<(), ConversionError> {
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no voice for implicit repeat"));
        };
        voice
            .first_chunk_mut()
            .elements
            .insert(0, VoiceElement::Barline(Barline::implicit_repeat_start(line)));
        Ok(())
    }

    /// Detach the current chunk as the repeat body and append the repeat.
    fn close_repeat_body(&mut self, line: usize) -> Result<(), ConversionError> {
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no voice for repeat"));
        };
        let body = voice.take_current_chunk();
        let mut repeat = self.pending_repeat.take().unwrap_or_default();
        merge_into_body(&mut repeat, body);
        voice.append(VoiceElement::Repeat(repeat));
        Ok(())
    }

    /// Split the current chunk at the ending start, grow the pending
    /// repeat, and either keep it pending or append it to the voice.
    fn close_ending(
        &mut self,
        line: usize,
        element_index: usize,
        kind: RepeatEndingKind,
        number: String,
        append_repeat: bool,
    ) -> Result<(), ConversionError> {
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no voice for repeat ending"));
        };
        let mut chunk = voice.take_current_chunk();
        let at = element_index.min(chunk.elements.len());
        let ending_elements = chunk.elements.split_off(at);

        let mut repeat = self.pending_repeat.take().unwrap_or_default();
        merge_into_body(&mut repeat, chunk);
        repeat.endings.push(RepeatEnding {
            kind,
            number,
            chunk: VoiceChunk {
                elements: ending_elements,
            },
        });

        if append_repeat {
            voice.append(VoiceElement::Repeat(repeat));
        } else {
            self.pending_repeat = Some(repeat);
        }
        self.trace(line, "repeat ending closed");
        Ok(())
    }

    /// At part end, a repeat that never saw its closing barline still
    /// gets attached so its music is not lost.
    pub(crate) fn flush_pending_repeat(&mut self, line: usize) -> Result<(), ConversionError> {
        let Some(mut repeat) = self.pending_repeat.take() else {
            return Ok(());
        };
        self.reporter
            .warning(line, "repeat never closed, attached at part end");
        let Some(voice) = lookup_voice(
            &mut self.score,
            self.current_part,
            self.current_staff,
            self.current_voice,
        ) else {
            return Err(self.reporter.internal(line, "no voice for pending repeat"));
        };
        if repeat.body.elements.is_empty() {
            repeat.body = voice.take_current_chunk();
        }
        voice.append(VoiceElement::Repeat(repeat));
        Ok(())
    }
}

fn merge_into_body(repeat: &mut Repeat, chunk: VoiceChunk) {
    if repeat.body.elements.is_empty() {
        repeat.body = chunk;
    } else {
        repeat.body.elements.extend(chunk.elements);
    }
}
