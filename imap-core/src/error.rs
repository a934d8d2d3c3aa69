/// Error types for the inspection map core
use thiserror::Error;

/// Main error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A drawn or received geometry is not a usable polygon
    #[error("Invalid polygon geometry: {0}")]
    GeometryInvalid(String),

    /// A color string is not a `#RRGGBB` value
    #[error("Invalid hex color: {0}")]
    InvalidColor(String),

    /// Bounding box string could not be parsed
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// Inspection status outside the backend vocabulary
    #[error("Invalid inspection status: {0}")]
    InvalidStatus(String),

    /// Named region unknown to the backend
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    /// Failed to decode a JSON payload
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Type alias for Results using the core Error
pub type Result<T> = std::result::Result<T, Error>;
