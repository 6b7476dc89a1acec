//! Error types for giri-map.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// giri-map error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Color code outside the palette table
    #[error("Unknown color code: {0}")]
    UnknownColorCode(u8),

    /// Nothing to save or reconstruct
    #[error("Empty {0}")]
    Empty(&'static str),

    /// Surface reconstruction failed
    #[error("Reconstruction failed: {0}")]
    Reconstruction(String),

    /// Command channel closed or timed out
    #[error("Command failed: {0}")]
    Command(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
