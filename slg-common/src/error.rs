//! Common error types for SLG

use std::fmt;

use thiserror::Error;

/// Common result type for SLG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which catalogue table a name lookup ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Song,
    Artist,
    Live,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdentifierKind::Song => "song",
            IdentifierKind::Artist => "artist",
            IdentifierKind::Live => "live",
        };
        f.write_str(label)
    }
}

/// Common error types across SLG crates
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete catalogue dataset (fatal at load)
    #[error("Data error: {0}")]
    Data(String),

    /// Free-text name did not resolve to a catalogue entry
    #[error("Unknown {kind}: {name}")]
    UnknownIdentifier { kind: IdentifierKind, name: String },

    /// Song id passed to the scoring path is not in the catalogue
    #[error("Invalid guess: unknown song id {0}")]
    UnknownSong(String),

    /// Operation not allowed in the current game state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Session snapshot does not match the catalogue
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a failed name lookup
    pub fn unknown(kind: IdentifierKind, name: impl Into<String>) -> Self {
        Error::UnknownIdentifier {
            kind,
            name: name.into(),
        }
    }
}
