use thiserror::Error;

/// Result type for table, classification and CRS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning GeoJSON into a normalized tabular set
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Cannot reproject a table without a CRS")]
    MissingCrs,

    #[error("Unsupported CRS transformation: EPSG:{from} -> EPSG:{to}")]
    UnsupportedCrs { from: u32, to: u32 },

    #[error("Coordinate transformation failed: {0}")]
    Projection(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Self {
        Error::InvalidGeoJson(err.to_string())
    }
}
