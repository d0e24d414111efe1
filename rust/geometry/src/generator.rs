// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh generation entry points.
//!
//! [`MeshGenerator`] is the boundary the layer pipeline talks to. The
//! bundled [`UrbanMesher`] reprojects geographic input to World Mercator
//! before meshing, so every entry it returns is in meters.

use crate::error::{Error, Result};
use crate::extrusion::{extrude_footprint, Footprint};
use crate::mesh::{Mesh, MeshEntry};
use crate::surface::{grid_surface, BoundingBox};
use geolayers_core::schema::BUILDING_ID;
use geolayers_core::{Coord, Epsg, FeatureRow, Geometry, Polygon, TabularGeometrySet, Transformer};
use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::borrow::Cow;

/// Height used for buildings without a usable `height` value (meters)
pub const DEFAULT_BUILDING_HEIGHT: f64 = 3.0;

/// Default cap on surface grid cells per axis
pub const MAX_GRID_CELLS: usize = 256;

const HEIGHT_COLUMN: &str = "height";
const MIN_HEIGHT_COLUMN: &str = "min_height";

/// The three mesh-building operations consumed by the layer pipeline.
///
/// Implementations are shared across request threads.
pub trait MeshGenerator: Send + Sync {
    /// One entry per unique `building_id`, in first-appearance order.
    fn mesh_from_buildings(&self, table: &TabularGeometrySet, detail: f64) -> Result<Vec<MeshEntry>>;

    /// A uniformly triangulated ground mesh covering `bbox`.
    ///
    /// `geographic` says whether `bbox` is in degrees; `elevation` is the
    /// constant z of the surface.
    fn create_surface_mesh(
        &self,
        bbox: BoundingBox,
        geographic: bool,
        elevation: f64,
        detail: f64,
    ) -> Result<Vec<MeshEntry>>;

    /// Exactly one entry per row, in row order.
    fn mesh_from_table(&self, table: &TabularGeometrySet) -> Result<Vec<MeshEntry>>;
}

/// Default mesh generator for building, surface and polygon layers.
#[derive(Debug, Clone)]
pub struct UrbanMesher {
    pub default_height: f64,
    pub max_grid_cells: usize,
}

impl Default for UrbanMesher {
    fn default() -> Self {
        Self {
            default_height: DEFAULT_BUILDING_HEIGHT,
            max_grid_cells: MAX_GRID_CELLS,
        }
    }
}

impl MeshGenerator for UrbanMesher {
    fn mesh_from_buildings(&self, table: &TabularGeometrySet, detail: f64) -> Result<Vec<MeshEntry>> {
        let table = in_meters(table)?;
        let groups = group_by_building(&table)?;

        tracing::debug!(rows = table.len(), buildings = groups.len(), detail, "Extruding buildings");

        groups
            .par_iter()
            .map(|rows| self.extrude_building(rows, detail).map(MeshEntry::from))
            .collect()
    }

    fn create_surface_mesh(
        &self,
        bbox: BoundingBox,
        geographic: bool,
        elevation: f64,
        detail: f64,
    ) -> Result<Vec<MeshEntry>> {
        let mut min = Coord { x: bbox.min_lon, y: bbox.min_lat };
        let mut max = Coord { x: bbox.max_lon, y: bbox.max_lat };
        if geographic {
            let transformer = Transformer::new(Epsg::WGS84, Epsg::WORLD_MERCATOR)?;
            min = transformer.convert(min)?;
            max = transformer.convert(max)?;
        }

        let mesh = grid_surface(
            Point2::new(min.x, min.y),
            Point2::new(max.x, max.y),
            elevation,
            detail,
            self.max_grid_cells,
        )?;

        Ok(vec![MeshEntry::from(mesh)])
    }

    fn mesh_from_table(&self, table: &TabularGeometrySet) -> Result<Vec<MeshEntry>> {
        let table = in_meters(table)?;

        table
            .rows()
            .par_iter()
            .enumerate()
            .map(|(index, row)| {
                flat_mesh(&row.geometry)
                    .map(MeshEntry::from)
                    .map_err(at_row(index))
            })
            .collect()
    }
}

impl UrbanMesher {
    /// Merge every part of one building into a single mesh.
    fn extrude_building(&self, rows: &[&FeatureRow], detail: f64) -> Result<Mesh> {
        let mut mesh = Mesh::new();

        for row in rows {
            let min_height = numeric(row.get(MIN_HEIGHT_COLUMN)).unwrap_or(0.0);
            let height = match numeric(row.get(HEIGHT_COLUMN)) {
                Some(height) if height > min_height => height,
                Some(height) => {
                    tracing::warn!(
                        building = %row.get(BUILDING_ID),
                        height,
                        min_height,
                        "Height does not exceed min_height, using default height"
                    );
                    min_height + self.default_height
                }
                None => min_height + self.default_height,
            };

            for polygon in areal_parts(&row.geometry)? {
                let footprint = Footprint::from_polygon(&polygon)?;
                mesh.merge(&extrude_footprint(&footprint, min_height, height, detail)?);
            }
        }

        Ok(mesh)
    }
}

/// Rows grouped by `building_id`, groups in order of first appearance.
fn group_by_building(table: &TabularGeometrySet) -> Result<Vec<Vec<&FeatureRow>>> {
    let mut slots: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<&FeatureRow>> = Vec::new();

    for (index, row) in table.rows().iter().enumerate() {
        let id = row.get(BUILDING_ID);
        if id.is_null() {
            return Err(Error::InvalidFootprint(format!("row {index} has no {BUILDING_ID}")));
        }

        let slot = *slots.entry(id.to_string()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    Ok(groups)
}

/// Flat triangulation of a row's polygons at z = 0.
fn flat_mesh(geometry: &Geometry<f64>) -> Result<Mesh> {
    let normal = Vector3::new(0.0, 0.0, 1.0);
    let mut mesh = Mesh::new();

    for polygon in areal_parts(geometry)? {
        let (points, indices) = Footprint::from_polygon(&polygon)?.triangulate()?;
        let base_index = mesh.vertex_count() as u32;

        for p in &points {
            mesh.add_vertex(Point3::new(p.x, p.y, 0.0), normal);
        }
        for tri in indices.chunks_exact(3) {
            mesh.add_triangle(
                base_index + tri[0] as u32,
                base_index + tri[1] as u32,
                base_index + tri[2] as u32,
            );
        }
    }

    Ok(mesh)
}

/// The polygons making up an areal geometry.
///
/// Collections are flattened; points and lines cannot be meshed.
pub fn areal_parts(geometry: &Geometry<f64>) -> Result<Vec<Polygon<f64>>> {
    match geometry {
        Geometry::Polygon(polygon) => Ok(vec![polygon.clone()]),
        Geometry::MultiPolygon(multi) => Ok(multi.0.clone()),
        Geometry::Rect(rect) => Ok(vec![rect.to_polygon()]),
        Geometry::Triangle(triangle) => Ok(vec![triangle.to_polygon()]),
        Geometry::GeometryCollection(collection) => {
            let mut parts = Vec::new();
            for member in &collection.0 {
                parts.extend(areal_parts(member)?);
            }
            Ok(parts)
        }
        other => Err(Error::UnsupportedGeometry(geometry_name(other).to_string())),
    }
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// The table in World Mercator meters; untagged tables are taken as metric.
fn in_meters(table: &TabularGeometrySet) -> Result<Cow<'_, TabularGeometrySet>> {
    match table.crs() {
        Some(crs) if crs != Epsg::WORLD_MERCATOR => {
            let mut metric = table.clone();
            metric.to_crs(Epsg::WORLD_MERCATOR)?;
            Ok(Cow::Owned(metric))
        }
        _ => Ok(Cow::Borrowed(table)),
    }
}

/// Numbers and numeric strings (OSM tags often carry heights as text).
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('m').trim().parse().ok(),
        _ => None,
    }
}

fn at_row(index: usize) -> impl Fn(Error) -> Error {
    move |err| Error::InvalidFootprint(format!("row {index}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geolayers_core::crs;
    use geolayers_core::LayerKind;
    use serde_json::json;

    fn square(x: f64, y: f64, size: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]]
        })
    }

    fn table(features: Vec<(Value, Value)>) -> TabularGeometrySet {
        let features: Vec<Value> = features
            .into_iter()
            .map(|(geometry, properties)| json!({ "type": "Feature", "geometry": geometry, "properties": properties }))
            .collect();

        TabularGeometrySet::from_json_value(json!({ "type": "FeatureCollection", "features": features })).unwrap()
    }

    #[test]
    fn test_buildings_one_entry_per_unique_id() {
        let mut t = table(vec![
            (square(0.0, 0.0, 0.0001), json!({ "building_id": 7, "height": 10 })),
            (square(0.001, 0.0, 0.0001), json!({ "building_id": 3, "height": "12 m" })),
            (square(0.0002, 0.0, 0.0001), json!({ "building_id": 7, "height": 20 })),
        ]);
        crs::normalize(&mut t, LayerKind::Buildings).unwrap();

        let mesher = UrbanMesher::default();
        let entries = mesher.mesh_from_buildings(&t, 5.0).unwrap();

        assert_eq!(entries.len(), 2);
        // Building 7 merges two footprints, building 3 has one
        assert!(entries[0].vertex_count() > entries[1].vertex_count());

        // Coordinates are metric: the roof of building 3 sits at 12 m
        let z_max = entries[1]
            .geometry
            .coordinates
            .chunks_exact(3)
            .map(|c| c[2])
            .fold(f64::MIN, f64::max);
        assert_relative_eq!(z_max, 12.0);
    }

    #[test]
    fn test_buildings_default_height() {
        let mut t = table(vec![(square(0.0, 0.0, 0.0001), json!({ "building_id": "a" }))]);
        crs::normalize(&mut t, LayerKind::Buildings).unwrap();

        let entries = UrbanMesher::default().mesh_from_buildings(&t, 5.0).unwrap();
        let z_max = entries[0]
            .geometry
            .coordinates
            .chunks_exact(3)
            .map(|c| c[2])
            .fold(f64::MIN, f64::max);
        assert_relative_eq!(z_max, DEFAULT_BUILDING_HEIGHT);
    }

    #[test]
    fn test_buildings_zero_height_falls_back() {
        let mut t = table(vec![
            (square(0.0, 0.0, 0.0001), json!({ "building_id": 1, "height": 0 })),
            (square(0.001, 0.0, 0.0001), json!({ "building_id": 2, "height": 4, "min_height": 6 })),
        ]);
        crs::normalize(&mut t, LayerKind::Buildings).unwrap();

        let entries = UrbanMesher::default().mesh_from_buildings(&t, 5.0).unwrap();
        let z_range = |entry: &MeshEntry| {
            entry
                .geometry
                .coordinates
                .chunks_exact(3)
                .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c[2]), hi.max(c[2])))
        };

        assert_eq!(z_range(&entries[0]), (0.0, DEFAULT_BUILDING_HEIGHT));
        assert_eq!(z_range(&entries[1]), (6.0, 6.0 + DEFAULT_BUILDING_HEIGHT));
    }

    #[test]
    fn test_buildings_reject_point_geometry() {
        let t = table(vec![(
            json!({ "type": "Point", "coordinates": [0.0, 0.0] }),
            json!({ "building_id": 1 }),
        )]);

        let result = UrbanMesher::default().mesh_from_buildings(&t, 5.0);
        assert!(matches!(result, Err(Error::UnsupportedGeometry(_))));
    }

    #[test]
    fn test_table_one_entry_per_row() {
        let mut t = table(vec![
            (square(0.0, 0.0, 10.0), json!({ "value": 1 })),
            (square(20.0, 0.0, 10.0), json!({ "value": 2 })),
            (square(40.0, 0.0, 10.0), json!({ "value": 3 })),
        ]);
        crs::normalize(&mut t, LayerKind::Generic).unwrap();

        let entries = UrbanMesher::default().mesh_from_table(&t).unwrap();

        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.vertex_count(), 4);
            assert_eq!(entry.geometry.indices.len(), 6);
            // Generic tables are already metric, coordinates pass through
            assert_relative_eq!(entry.geometry.coordinates[0], 20.0 * i as f64);
        }
    }

    #[test]
    fn test_table_error_names_row() {
        let t = table(vec![
            (square(0.0, 0.0, 10.0), json!({})),
            (json!({ "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }), json!({})),
        ]);

        let err = UrbanMesher::default().mesh_from_table(&t).unwrap_err();
        assert!(err.to_string().contains("row 1"));
        assert!(err.to_string().contains("LineString"));
    }

    #[test]
    fn test_surface_mesh_is_single_entry() {
        let bbox = BoundingBox {
            min_lat: 41.880,
            min_lon: -87.630,
            max_lat: 41.881,
            max_lon: -87.629,
        };

        let entries = UrbanMesher::default().create_surface_mesh(bbox, true, -1.0, 5.0).unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].vertex_count() > 4);
        assert_relative_eq!(entries[0].geometry.coordinates[2], -1.0);
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(numeric(&json!(4)), Some(4.0));
        assert_eq!(numeric(&json!("7.5")), Some(7.5));
        assert_eq!(numeric(&json!("12 m")), Some(12.0));
        assert_eq!(numeric(&json!(null)), None);
        assert_eq!(numeric(&json!("tall")), None);
    }
}
