//! Error types for the event-to-table pipeline.

use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A record lacks a field every event needs.
    #[error("record <{record}> is missing required field `{field}`")]
    MissingRequiredField {
        /// Tag of the offending record element.
        record: String,
        field: &'static str,
    },

    /// An event did not match any configured table.
    #[error("event `{event}` (categories: {categories}) matches no table")]
    UnmatchedEvent { event: String, categories: String },

    /// Fixed column widths do not leave room for the flexible column.
    #[error("column widths {fixed:?} leave no room in a {table_width}mm table")]
    InvalidColumnWidths { fixed: Vec<f32>, table_width: f32 },

    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Render(err.to_string())
    }
}
