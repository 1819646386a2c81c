//! Error types for Figura
//!
//! Reconciliation itself never fails; these cover the fallible edges
//! (configuration, persistence, link commands, figure parsing).

use thiserror::Error;

/// Core Figura errors
#[derive(Error, Debug)]
pub enum FiguraError {
    // Figure errors
    #[error("Malformed figure part: {0:?}")]
    MalformedFigurePart(String),

    #[error("Unknown gender: {0:?}")]
    UnknownGender(String),

    // Link errors
    #[error("Link does not target the avatar editor: {0:?}")]
    ForeignLink(String),

    #[error("Unknown editor link command: {0:?}")]
    UnknownLinkCommand(String),

    #[error("Invalid gate object id: {0:?}")]
    InvalidObjectId(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[source] serde_json::Error),

    // Storage errors
    #[error("Look store serialization failed: {0}")]
    StoreSerialization(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Figura operations
pub type FiguraResult<T> = Result<T, FiguraError>;
