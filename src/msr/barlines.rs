//! Barlines, repeats and repeat endings
//!
//! A barline keeps everything the source said about it (location, style,
//! ending, repeat direction) plus the category the classifier assigned.
//! Repeats own the voice-chunk spanning their body and a list of endings,
//! each owning its own chunk.

use serde::{Deserialize, Serialize};

use super::part::VoiceChunk;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarlineLocation {
    Left,
    Middle,
    Right,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarStyle {
    Regular,
    Dotted,
    Dashed,
    Heavy,
    LightLight,
    LightHeavy,
    HeavyLight,
    HeavyHeavy,
    Tick,
    Short,
}

impl BarStyle {
    /// Parse a MusicXML bar-style value.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "regular" => Some(BarStyle::Regular),
            "dotted" => Some(BarStyle::Dotted),
            "dashed" => Some(BarStyle::Dashed),
            "heavy" => Some(BarStyle::Heavy),
            "light-light" => Some(BarStyle::LightLight),
            "light-heavy" => Some(BarStyle::LightHeavy),
            "heavy-light" => Some(BarStyle::HeavyLight),
            "heavy-heavy" => Some(BarStyle::HeavyHeavy),
            "tick" => Some(BarStyle::Tick),
            "short" => Some(BarStyle::Short),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndingType {
    Start,
    Stop,
    Discontinue,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatDirection {
    Forward,
    Backward,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatWinged {
    None,
    Straight,
    Curved,
    DoubleStraight,
    DoubleCurved,
}

/// What role the classifier decided a barline plays.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarlineCategory {
    Standalone,
    RepeatStart,
    RepeatEnd,
    EndingStart,
    HookedEndingEnd,
    HooklessEndingEnd,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Barline {
    pub location: BarlineLocation,
    pub style: Option<BarStyle>,
    pub ending_type: Option<EndingType>,
    /// Raw ending number text, e.g. "1" or "1,2".
    pub ending_number: Option<String>,
    pub repeat_direction: Option<RepeatDirection>,
    pub winged: Option<RepeatWinged>,
    pub category: BarlineCategory,
    pub has_segno: bool,
    pub has_coda: bool,
    /// Pedal mark written inside the barline element.
    pub has_pedal: bool,
    /// Eyeglasses mark written inside the barline element.
    pub has_eyeglasses: bool,
    /// 1-based source line, kept for diagnostics downstream.
    pub line: usize,
}

impl Barline {
    /// A fresh right-hand barline with nothing set; the converter fills
    /// it in as child elements arrive.
    pub fn new(line: usize) -> Self {
        Self {
            location: BarlineLocation::Right,
            style: None,
            ending_type: None,
            ending_number: None,
            repeat_direction: None,
            winged: None,
            category: BarlineCategory::Standalone,
            has_segno: false,
            has_coda: false,
            has_pedal: false,
            has_eyeglasses: false,
            line,
        }
    }

    /// The barline synthesized when a repeat end arrives with no matching
    /// start: left location, heavy-light style, forward repeat.
    pub fn implicit_repeat_start(line: usize) -> Self {
        Self {
            location: BarlineLocation::Left,
            style: Some(BarStyle::HeavyLight),
            ending_type: Some(EndingType::Start),
            ending_number: None,
            repeat_direction: Some(RepeatDirection::Forward),
            winged: None,
            category: BarlineCategory::RepeatStart,
            has_segno: false,
            has_coda: false,
            has_pedal: false,
            has_eyeglasses: false,
            line,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatEndingKind {
    /// Numbered ending closed by a backward repeat ("1." with hook).
    Hooked,
    /// Final ending that just runs on ("2." without hook).
    Hookless,
}

/// One alternative ending of a repeat.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RepeatEnding {
    pub kind: RepeatEndingKind,
    pub number: String,
    pub chunk: VoiceChunk,
}

/// A repeated span: common body plus alternative endings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Repeat {
    pub body: VoiceChunk,
    pub endings: Vec<RepeatEnding>,
}
