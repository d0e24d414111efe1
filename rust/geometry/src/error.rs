use thiserror::Error;

/// Result type for mesh generation
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mesh generation
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid footprint: {0}")]
    InvalidFootprint(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Invalid mesh parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported geometry for meshing: {0}")]
    UnsupportedGeometry(String),

    #[error("Table error: {0}")]
    CoreError(#[from] geolayers_core::Error),
}
