//! Fatal conversion errors
//!
//! Most problems found while translating a document are recoverable and go
//! through the diagnostic reporter instead. The variants here end the
//! conversion: a document we cannot read at all, or an inconsistency in the
//! translator's own bookkeeping.

use thiserror::Error;

/// Errors that abort a conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The document root is not `<score-partwise>`.
    #[error("unsupported document root <{0}>, expected <score-partwise>")]
    UnsupportedRoot(String),

    /// The translator's own state went inconsistent. Always a bug, never
    /// bad input; reported loudly instead of being papered over.
    #[error("{source_name}:{line}: internal translation error: {message}")]
    Internal {
        source_name: String,
        line: usize,
        message: String,
    },
}
