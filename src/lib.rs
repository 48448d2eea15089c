//! MusicXML to MSR translation
//!
//! MSR (Music Score Representation) is a pure object graph: a score holds
//! part groups and parts, parts hold staves, staves hold voices, voices
//! hold ordered chunks of timeline elements (notes, chords, tuplets,
//! grace groups, barlines, repeats, directions). [`convert`] builds it
//! from a partwise MusicXML document in a single pass over the element
//! tree, collecting diagnostics as it goes.
//!
//! ```no_run
//! use musicxml_msr::{convert, ConversionSettings};
//!
//! let xml = std::fs::read_to_string("score.musicxml").unwrap();
//! let conversion = convert(&xml, ConversionSettings::for_source("score.musicxml")).unwrap();
//! for record in &conversion.diagnostics.records {
//!     eprintln!("{}: {}", record.line, record.message);
//! }
//! println!("{} parts", conversion.score.parts.len());
//! ```

pub mod converter;
pub mod diagnostics;
pub mod durations;
pub mod errors;
pub mod msr;
pub mod settings;
pub mod xml_tree;

pub use converter::{convert, Conversion, MsrConverter};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, Reporter};
pub use errors::ConversionError;
pub use settings::ConversionSettings;
