//! Score root: header data, part groups and parts
//!
//! The score owns every part in declaration order; part groups reference
//! parts by ID so the grouping tree and the ownership list never fight
//! over the same objects.

use serde::{Deserialize, Serialize};

use super::part::{Part, Voice};

// ============================================================================
// Header
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Creator {
    /// Creator type attribute ("composer", "lyricist", ...).
    pub kind: String,
    pub name: String,
}

/// Work/movement titles and encoding credits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Identification {
    pub work_number: String,
    pub work_title: String,
    pub movement_number: String,
    pub movement_title: String,
    pub creators: Vec<Creator>,
    pub rights: Vec<String>,
    pub software: Vec<String>,
    pub encoding_date: String,
}

/// Page dimensions in millimeters, derived from the scaling block.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct PageGeometry {
    pub millimeters: f32,
    pub tenths: f32,
    pub page_width: Option<f32>,
    pub page_height: Option<f32>,
    pub left_margin: Option<f32>,
    pub right_margin: Option<f32>,
    pub top_margin: Option<f32>,
    pub bottom_margin: Option<f32>,
}

impl PageGeometry {
    /// Millimeters per tenth, the factor page-layout values are scaled by.
    pub fn millimeters_per_tenth(&self) -> f32 {
        if self.tenths == 0.0 {
            0.0
        } else {
            self.millimeters / self.tenths
        }
    }
}

// ============================================================================
// Part groups
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartGroupSymbol {
    None,
    Brace,
    Bracket,
    Line,
    Square,
}

/// A child of a part group: either a part (by ID) or a nested group.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum PartGroupChild {
    Part(String),
    Group(PartGroup),
}

/// A bracket/brace grouping of parts, possibly nested.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PartGroup {
    pub number: i32,
    pub name: String,
    pub abbreviation: String,
    pub symbol: PartGroupSymbol,
    /// Horizontal position of the symbol; orders simultaneously open
    /// groups from outermost to innermost.
    pub symbol_default_x: i32,
    /// Whether barlines run through the whole group.
    pub barline: bool,
    pub children: Vec<PartGroupChild>,
}

impl PartGroup {
    pub fn new(number: i32) -> Self {
        Self {
            number,
            name: String::new(),
            abbreviation: String::new(),
            symbol: PartGroupSymbol::None,
            symbol_default_x: 0,
            barline: true,
            children: Vec::new(),
        }
    }

    /// The group synthesized around parts declared outside any group.
    pub fn implicit() -> Self {
        Self {
            number: 1,
            name: "Implicit".to_string(),
            abbreviation: "Impl.".to_string(),
            symbol: PartGroupSymbol::Bracket,
            symbol_default_x: 0,
            barline: true,
            children: Vec::new(),
        }
    }

    /// IDs of the parts in this group, nested groups included, in order.
    pub fn part_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for child in &self.children {
            match child {
                PartGroupChild::Part(id) => ids.push(id.as_str()),
                PartGroupChild::Group(group) => ids.extend(group.part_ids()),
            }
        }
        ids
    }
}

// ============================================================================
// Score
// ============================================================================

/// The root of the built representation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Score {
    pub identification: Identification,
    pub page_geometry: Option<PageGeometry>,
    /// Top-level part groups in the order they closed.
    pub part_groups: Vec<PartGroup>,
    /// Every part, in declaration order. Part IDs are unique.
    pub parts: Vec<Part>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of a part by ID.
    pub fn part_index(&self, id: &str) -> Option<usize> {
        self.parts.iter().position(|p| p.id == id)
    }

    /// Part lookup by ID.
    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Register a part, rejecting duplicate IDs.
    pub fn add_part(&mut self, part: Part) -> Result<usize, String> {
        if self.part_index(&part.id).is_some() {
            return Err(format!("duplicate part ID \"{}\"", part.id));
        }
        self.parts.push(part);
        Ok(self.parts.len() - 1)
    }

    /// Voice resolution through part index, staff and voice numbers.
    pub fn voice_mut(
        &mut self,
        part_index: usize,
        staff_number: i32,
        voice_number: i32,
    ) -> Option<&mut Voice> {
        self.parts
            .get_mut(part_index)
            .map(|p| p.voice_mut(staff_number, voice_number))
    }
}
