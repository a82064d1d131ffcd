use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the climbing log pipeline.
#[derive(Error, Debug)]
pub enum ClimbLogError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file or directory does not exist.
    #[error("Could not find input {0}")]
    NotFound(PathBuf),

    /// A corpus document on disk is not a well-formed session array.
    #[error("Invalid JSON in corpus document {path}: {source}")]
    CorpusFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The session header line did not match "Month Day, Year at H:MM AM/PM".
    #[error("Invalid session header date: {header:?}")]
    DateFormat { header: String },

    /// The log document has no non-blank lines.
    #[error("Log document is empty")]
    EmptyDocument,

    /// The log document ends after the header line.
    #[error("Log document has no activity type line")]
    MissingActivityType,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClimbLogError {
    /// `true` for failures scoped to a single log document's contents.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ClimbLogError::DateFormat { .. }
                | ClimbLogError::EmptyDocument
                | ClimbLogError::MissingActivityType
        )
    }
}

/// Convenience alias used throughout the climb-log crates.
pub type Result<T> = std::result::Result<T, ClimbLogError>;
