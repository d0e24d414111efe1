// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate reference system assignment and reprojection.
//!
//! Only the two systems the layer pipeline needs are supported:
//!
//! - EPSG:4326, geographic WGS84 longitude/latitude in degrees
//! - EPSG:3395, World Mercator on the WGS84 ellipsoid, in meters
//!
//! Each [`LayerKind`] carries a fixed [`CrsPolicy`]: a code that is assigned
//! to the table as-is and an optional code to reproject to afterwards.

use crate::error::{Error, Result};
use crate::schema::LayerKind;
use crate::table::TabularGeometrySet;
use geo::{Coord, MapCoords};
use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;
use std::fmt;

/// WGS84 semi-major axis (meters)
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS84 first eccentricity
const ECCENTRICITY: f64 = 0.081_819_190_842_622;

/// Latitudes are clamped to this bound before the forward projection
const MAX_LATITUDE: f64 = 85.06;

const INVERSE_MAX_ITERATIONS: usize = 15;
const INVERSE_TOLERANCE: f64 = 1e-12;

/// An EPSG coordinate reference system code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epsg(pub u32);

impl Epsg {
    /// Geographic WGS84 (lon/lat degrees).
    pub const WGS84: Epsg = Epsg(4326);
    /// World Mercator (meters).
    pub const WORLD_MERCATOR: Epsg = Epsg(3395);

    #[inline]
    pub fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// What happens to a table's CRS for a given layer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrsPolicy {
    /// Code tagged onto the table without touching coordinates.
    pub assign: Epsg,
    /// Code to reproject to after assignment, if any.
    pub reproject_to: Option<Epsg>,
}

impl LayerKind {
    pub fn crs_policy(self) -> CrsPolicy {
        match self {
            LayerKind::Buildings => CrsPolicy {
                assign: Epsg::WGS84,
                reproject_to: None,
            },
            LayerKind::Surface => CrsPolicy {
                assign: Epsg::WORLD_MERCATOR,
                reproject_to: Some(Epsg::WGS84),
            },
            LayerKind::Generic => CrsPolicy {
                assign: Epsg::WORLD_MERCATOR,
                reproject_to: None,
            },
        }
    }
}

/// Apply the kind's CRS policy to a table.
pub fn normalize(table: &mut TabularGeometrySet, kind: LayerKind) -> Result<()> {
    let policy = kind.crs_policy();
    table.set_crs(policy.assign);

    if let Some(target) = policy.reproject_to {
        table.to_crs(target)?;
    }

    tracing::debug!(kind = %kind, crs = %policy.assign, reproject_to = ?policy.reproject_to, "Normalized CRS");
    Ok(())
}

impl TabularGeometrySet {
    /// Tag the table with a CRS, leaving coordinates untouched.
    pub fn set_crs(&mut self, crs: Epsg) {
        self.set_crs_tag(crs);
    }

    /// Reproject every geometry to `target` and retag the table.
    pub fn to_crs(&mut self, target: Epsg) -> Result<()> {
        let source = self.crs().ok_or(Error::MissingCrs)?;

        if source != target {
            let transformer = Transformer::new(source, target)?;
            for geometry in self.geometries_mut() {
                *geometry = geometry.try_map_coords(|coord| transformer.convert(coord))?;
            }
        }

        self.set_crs_tag(target);
        Ok(())
    }
}

/// Converts coordinates from one EPSG system to another.
///
/// With the `proj-transforms` feature the conversion goes through PROJ;
/// without it, or when PROJ cannot build the operation, the built-in World
/// Mercator formulas are used.
pub enum Transformer {
    Formula(fn(Coord<f64>) -> Coord<f64>),
    #[cfg(feature = "proj-transforms")]
    Proj(proj::Proj),
}

impl Transformer {
    pub fn new(from: Epsg, to: Epsg) -> Result<Self> {
        #[cfg(feature = "proj-transforms")]
        {
            if from != to {
                match proj::Proj::new_known_crs(&from.to_string(), &to.to_string(), None) {
                    Ok(proj) => return Ok(Transformer::Proj(proj)),
                    Err(err) => tracing::warn!(
                        %from,
                        %to,
                        error = %err,
                        "PROJ transform unavailable, using built-in formulas"
                    ),
                }
            }
        }

        coordinate_transform(from, to).map(Transformer::Formula)
    }

    #[inline]
    pub fn convert(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        match self {
            Transformer::Formula(formula) => Ok(formula(coord)),
            #[cfg(feature = "proj-transforms")]
            Transformer::Proj(proj) => proj
                .convert((coord.x, coord.y))
                .map(|(x, y)| Coord { x, y })
                .map_err(|err| Error::Projection(err.to_string())),
        }
    }
}

/// Built-in per-coordinate function converting `from` into `to`.
pub fn coordinate_transform(from: Epsg, to: Epsg) -> Result<fn(Coord<f64>) -> Coord<f64>> {
    match (from, to) {
        (a, b) if a == b => Ok(identity),
        (Epsg::WGS84, Epsg::WORLD_MERCATOR) => Ok(geographic_to_mercator),
        (Epsg::WORLD_MERCATOR, Epsg::WGS84) => Ok(mercator_to_geographic),
        _ => Err(Error::UnsupportedCrs {
            from: from.code(),
            to: to.code(),
        }),
    }
}

#[inline]
fn identity(coord: Coord<f64>) -> Coord<f64> {
    coord
}

/// Forward ellipsoidal World Mercator: lon/lat degrees to meters.
#[inline]
pub fn geographic_to_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lambda = coord.x.to_radians();
    let phi = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let es = ECCENTRICITY * phi.sin();
    let conformal = (FRAC_PI_4 + phi / 2.0).tan() * ((1.0 - es) / (1.0 + es)).powf(ECCENTRICITY / 2.0);

    Coord {
        x: SEMI_MAJOR_AXIS * lambda,
        y: SEMI_MAJOR_AXIS * conformal.ln(),
    }
}

/// Inverse ellipsoidal World Mercator: meters to lon/lat degrees.
///
/// Latitude is recovered by fixed-point iteration on the isometric latitude.
#[inline]
pub fn mercator_to_geographic(coord: Coord<f64>) -> Coord<f64> {
    let lambda = coord.x / SEMI_MAJOR_AXIS;
    let t = (-coord.y / SEMI_MAJOR_AXIS).exp();

    let mut phi = FRAC_PI_2 - 2.0 * t.atan();
    for _ in 0..INVERSE_MAX_ITERATIONS {
        let es = ECCENTRICITY * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(ECCENTRICITY / 2.0)).atan();
        let converged = (next - phi).abs() < INVERSE_TOLERANCE;
        phi = next;
        if converged {
            break;
        }
    }

    Coord {
        x: lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}
