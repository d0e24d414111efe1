// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline error types.

use thiserror::Error;

/// Result type for single-collection pipeline stages
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single collection could not be turned into a layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Batch cancelled before this collection was processed")]
    Cancelled,
}

impl Error {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Geometry(_) => "GEOMETRY_ERROR",
            Error::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Error::Cancelled => "CANCELLED",
        }
    }
}

impl From<geolayers_core::Error> for Error {
    fn from(err: geolayers_core::Error) -> Self {
        match err {
            geolayers_core::Error::SchemaMismatch(message) => Error::SchemaMismatch(message),
            other => Error::Geometry(other.to_string()),
        }
    }
}

impl From<geolayers_geometry::Error> for Error {
    fn from(err: geolayers_geometry::Error) -> Self {
        Error::Geometry(err.to_string())
    }
}

/// A collection failure tagged with its position in the request.
#[derive(Error, Debug)]
#[error("collection {index}: {source}")]
pub struct BatchError {
    pub index: usize,
    #[source]
    pub source: Error,
}

impl BatchError {
    pub fn new(index: usize, source: Error) -> Self {
        Self { index, source }
    }
}
