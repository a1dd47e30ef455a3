use thiserror::Error;

/// Errors that can occur while loading and deriving building geometry
#[derive(Error, Debug)]
pub enum OsmBuildingsError {
    /// Network-related errors during feature fetching
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Errors parsing feature data
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Geographic coordinate or origin resolution errors
    #[error("Geographic error: {0}")]
    Geographic(String),

    /// Footprint meshing errors
    #[error("Geometry error: {0}")]
    Geometry(String),
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// HTTP request failed
    #[error("HTTP request failed: {status}")]
    HttpError { status: u16 },

    /// Request timeout
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Connection error
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Invalid URL
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

pub type Result<T> = std::result::Result<T, OsmBuildingsError>;
