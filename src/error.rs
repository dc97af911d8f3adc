//! Error types for the renderer

use thiserror::Error;

/// Result type alias for render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while inlining, assembling or rasterizing
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to set up the renderer (HTTP client, runtime)
    #[error("Renderer initialization failed: {0}")]
    InitializationError(String),

    /// A resource reference could not be turned into a fetchable URL
    #[error("Invalid resource URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered a resource request with a non-success status
    #[error("Fetching {url} failed with HTTP status {status}")]
    FetchStatus { url: String, status: u16 },

    /// Transport-level failure while fetching a resource
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// References could not be substituted with their payloads
    #[error("Substitution failed: {0}")]
    Substitution(String),

    /// The assembled SVG (or a data URI) could not be decoded
    #[error("Decoding failed: {0}")]
    Decode(String),

    /// Drawing the decoded image onto a surface failed
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Encoding the surface as PNG failed
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
