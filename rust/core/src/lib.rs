// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # GeoLayers Core
//!
//! Tabular view over GeoJSON feature collections, layer classification and
//! coordinate reference system normalization.
//!
//! ## Overview
//!
//! - **Tabular geometry sets**: one row per feature, one column per property
//!   name, with the geometry column kept alongside ([`TabularGeometrySet`])
//! - **Classification**: column sniffing turned into an explicit
//!   [`LayerKind`] with per-kind reserved columns
//! - **CRS normalization**: fixed per-kind EPSG policies with World Mercator
//!   reprojection ([`crs`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geolayers_core::{crs, LayerKind, TabularGeometrySet};
//!
//! let mut table = TabularGeometrySet::from_json_value(collection)?;
//! let kind = LayerKind::classify(&table);
//! kind.validate(&table)?;
//! crs::normalize(&mut table, kind)?;
//!
//! for column in kind.attribute_columns(&table) {
//!     println!("{column}");
//! }
//! ```

pub mod crs;
pub mod error;
pub mod schema;
pub mod table;

pub use crs::{CrsPolicy, Epsg, Transformer};
pub use error::{Error, Result};
pub use schema::LayerKind;
pub use table::{FeatureRow, TabularGeometrySet, GEOMETRY_COLUMN};

// Re-export geometry types for downstream crates
pub use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
