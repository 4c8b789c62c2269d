//! Error types for Tapeline

use thiserror::Error;

use crate::TrackId;

/// Core error type
#[derive(Error, Debug)]
pub enum TlError {
    #[error("Out of memory cloning {bytes} bytes of track {track:?}")]
    OutOfMemory { track: TrackId, bytes: usize },

    #[error("Track not found: {0:?}")]
    TrackNotFound(TrackId),

    #[error("Track {0:?} has no {1} content")]
    WrongContent(TrackId, &'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type TlResult<T> = Result<T, TlError>;
