//! Engine error taxonomy.
//!
//! Errors here stop at the session boundary: a failed or unreadable
//! generation becomes a synthesized `Complete` carrying placeholder text, so
//! the document always settles and the reducer never sees an error value.

use thiserror::Error;

/// Errors from the generation wire and the session driver.
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP transport failure (connect, send, or body read).
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    /// The generation service answered with a non-success status.
    #[error("generation service returned status {status}")]
    Status { status: u16 },

    /// A stream line that is not a JSON generation chunk.
    #[error("malformed stream line: {line}")]
    Malformed { line: String },

    /// Configuration file could not be read.
    #[error("config io: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config parse: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The session task is gone; its command channel is closed.
    #[error("session closed")]
    Shutdown,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
