//! Error types for the world model and simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all world and simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Object id does not resolve to a live object.
    #[error("Object not found: {0}")]
    ObjectNotFound(u32),

    /// House is not part of this game.
    #[error("House not found: {0}")]
    HouseNotFound(String),

    /// Structure footprint cannot be placed at the requested location.
    #[error("Cannot place {item} at ({x}, {y})")]
    InvalidPlacement {
        /// Item being placed.
        item: String,
        /// Requested x tile.
        x: i32,
        /// Requested y tile.
        y: i32,
    },

    /// Order rejected by the simulation.
    #[error("Order rejected: {0}")]
    InvalidOrder(String),

    /// Insufficient credits.
    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits {
        /// Amount required.
        required: i32,
        /// Amount available.
        available: i32,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Save stream could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Save stream was written by an incompatible version.
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the stream.
        found: u32,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
