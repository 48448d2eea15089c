//! Conversion options
//!
//! All knobs are explicit and travel with the converter instance; there is
//! no global option state.

use serde::{Deserialize, Serialize};

/// Options controlling a single conversion run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversionSettings {
    /// Name used to label diagnostics (file name, URL, "stdin", ...).
    pub source_name: String,
    /// Log structural events (parts, staves, voices, repeats) at info level.
    pub trace: bool,
    /// When pending dynamics/wedges/words meet a rest, hold them for the
    /// next pitched note instead of attaching them to the rest.
    pub delay_rest_decorations: bool,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            source_name: "input".to_string(),
            trace: false,
            delay_rest_decorations: false,
        }
    }
}

impl ConversionSettings {
    /// Settings labelled with a source name, everything else defaulted.
    pub fn for_source(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }
}
