//! Error type shared by every pipeline stage.

use thiserror::Error;

/// Failures a report pipeline can produce.
///
/// Every stage fails fast: nothing here is recovered from, and no partial
/// output is emitted once an error is returned.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Input text could not be parsed as an array of records.
    #[error("malformed input: {0}")]
    MalformedInput(#[source] serde_json::Error),

    /// A record is missing an attribute or has one of the wrong type.
    #[error("record {index}: {detail}")]
    ShapeMismatch { index: usize, detail: String },

    /// A header label that does not name a known column.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A sort order other than ascending or descending.
    #[error("unknown sort order '{0}' (try asc or desc)")]
    UnknownOrder(String),

    /// A table was requested with no columns.
    #[error("table header must name at least one column")]
    EmptyHeader,

    /// A pipeline definition that cannot be parsed or run.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// The HTML report template failed to render.
    #[error("render error: {0}")]
    Render(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
