//! Lyric chunks and melisma inference
//!
//! Each `<lyric>` yields at most one chunk. With text, the syllabic value
//! decides the kind. Without text the kind is inferred: a tied note
//! carries its syllable over, a rest is a skip, and a note inside an open
//! slur is part of a melisma — including the case where the slur started
//! on a syllable-ending note, which reads as the melisma running beyond
//! the word.
//!
//! Chunks collect on the converter during the note and are bound to the
//! note (and filed into the voice's stanza) when the note is finished.

use roxmltree::Node;

use crate::msr::{LyricsChunk, LyricsChunkKind};
use crate::xml_tree::ElementExt;

use super::MsrConverter;

/// Transient `<lyric>` state.
#[derive(Default)]
pub(crate) struct LyricData {
    pub number: i32,
    pub syllabic: Option<LyricsChunkKind>,
    pub text: String,
    pub has_text: bool,
    pub elision: bool,
}

impl LyricData {
    /// Append a text fragment; an elision between fragments becomes a
    /// space, adjacent fragments without one concatenate directly.
    pub fn add_text(&mut self, fragment: String) {
        if fragment.is_empty() {
            return;
        }
        if self.has_text && self.elision {
            self.text.push(' ');
        }
        self.elision = false;
        self.text.push_str(&fragment);
        self.has_text = true;
    }
}

impl MsrConverter {
    pub(crate) fn on_lyric_start(&mut self, node: &Node) {
        self.current_lyric = LyricData {
            number: node.int_attr("number").unwrap_or(1),
            ..LyricData::default()
        };
    }

    pub(crate) fn on_syllabic(&mut self, node: &Node) {
        let kind = match node.value().as_str() {
            "single" => LyricsChunkKind::Single,
            "begin" => LyricsChunkKind::Begin,
            "middle" => LyricsChunkKind::Middle,
            "end" => LyricsChunkKind::End,
            other => {
                self.reporter
                    .error(node.line(), format!("unknown syllabic value \"{other}\""));
                return;
            }
        };
        self.current_lyric.syllabic = Some(kind);
    }

    pub(crate) fn on_lyric_end(&mut self, _line: usize) {
        let data = std::mem::take(&mut self.current_lyric);
        let stanza = if data.number > 0 { data.number } else { 1 };

        let (kind, text) = if data.has_text {
            let kind = data.syllabic.unwrap_or(LyricsChunkKind::Single);
            if self.on_going_slur {
                self.on_going_slur_has_lyrics = true;
            }
            (kind, data.text)
        } else if self.note_data.tie.is_some() {
            (LyricsChunkKind::Tied, String::new())
        } else if self.note_data.is_rest {
            (LyricsChunkKind::Skip, String::new())
        } else if self.on_going_slur {
            let kind = if self.first_chunk_in_slur_kind == Some(LyricsChunkKind::End) {
                LyricsChunkKind::SlurBeyondEnd
            } else {
                LyricsChunkKind::Slur
            };
            (kind, String::new())
        } else {
            // an empty lyric outside any melisma context records nothing
            return;
        };

        self.current_note_lyrics.push(LyricsChunk {
            kind,
            text,
            divisions: self.note_data.divisions,
            stanza,
            note: None,
        });
    }
}
