// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform ground surface grids.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use geolayers_core::Coord;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Bounds of `(x = lon, y = lat)` coordinates; `None` when empty.
    pub fn from_coords(coords: impl IntoIterator<Item = Coord<f64>>) -> Option<Self> {
        coords.into_iter().fold(None, |bbox, c| {
            Some(match bbox {
                None => BoundingBox {
                    min_lat: c.y,
                    min_lon: c.x,
                    max_lat: c.y,
                    max_lon: c.x,
                },
                Some(b) => BoundingBox {
                    min_lat: b.min_lat.min(c.y),
                    min_lon: b.min_lon.min(c.x),
                    max_lat: b.max_lat.max(c.y),
                    max_lon: b.max_lon.max(c.x),
                },
            })
        })
    }

    /// `[minLat, minLon, maxLat, maxLon]`
    #[inline]
    pub fn to_array(self) -> [f64; 4] {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
    }
}

/// Triangulate the rectangle `min..max` at constant `elevation`.
///
/// Cells are `cell_size` wide; each axis is capped at `max_cells` cells, in
/// which case cells grow to cover the extent.
pub fn grid_surface(
    min: Point2<f64>,
    max: Point2<f64>,
    elevation: f64,
    cell_size: f64,
    max_cells: usize,
) -> Result<Mesh> {
    if !(cell_size > 0.0) || max_cells == 0 {
        return Err(Error::InvalidParameter(format!(
            "surface grid needs a positive cell size and cell cap, got {cell_size} / {max_cells}"
        )));
    }

    let extent = max - min;
    if !extent.x.is_finite() || !extent.y.is_finite() || extent.x < 0.0 || extent.y < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "surface bounds are inverted or not finite: {min} .. {max}"
        )));
    }

    let cells_x = ((extent.x / cell_size).ceil() as usize).clamp(1, max_cells);
    let cells_y = ((extent.y / cell_size).ceil() as usize).clamp(1, max_cells);

    let normal = Vector3::new(0.0, 0.0, 1.0);
    let mut mesh = Mesh::with_capacity((cells_x + 1) * (cells_y + 1), cells_x * cells_y * 6);

    for j in 0..=cells_y {
        let y = min.y + extent.y * j as f64 / cells_y as f64;
        for i in 0..=cells_x {
            let x = min.x + extent.x * i as f64 / cells_x as f64;
            mesh.add_vertex(Point3::new(x, y, elevation), normal);
        }
    }

    let stride = cells_x as u32 + 1;
    for j in 0..cells_y as u32 {
        for i in 0..cells_x as u32 {
            let a = j * stride + i;
            let b = a + 1;
            let c = b + stride;
            let d = a + stride;
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
        }
    }

    tracing::debug!(cells_x, cells_y, vertices = mesh.vertex_count(), "Built surface grid");
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_from_coords() {
        let bbox = BoundingBox::from_coords(vec![
            Coord { x: -87.6, y: 41.9 },
            Coord { x: -87.7, y: 41.8 },
            Coord { x: -87.5, y: 41.85 },
        ])
        .unwrap();

        assert_eq!(bbox.to_array(), [41.8, -87.7, 41.9, -87.5]);
        assert!(BoundingBox::from_coords(Vec::new()).is_none());
    }

    #[test]
    fn test_grid_cell_count() {
        let mesh = grid_surface(Point2::new(0.0, 0.0), Point2::new(10.0, 5.0), -1.0, 5.0, 256).unwrap();

        // 2 x 1 cells
        assert_eq!(mesh.vertex_count(), 3 * 2);
        assert_eq!(mesh.triangle_count(), 4);

        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.x, 0.0);
        assert_relative_eq!(max.x, 10.0);
        assert_relative_eq!(max.y, 5.0);
        assert_relative_eq!(min.z, -1.0);
    }

    #[test]
    fn test_grid_is_capped() {
        let mesh = grid_surface(Point2::new(0.0, 0.0), Point2::new(10_000.0, 10.0), 0.0, 1.0, 8).unwrap();
        assert_eq!(mesh.vertex_count(), 9 * 9);
    }

    #[test]
    fn test_degenerate_extent_is_one_cell() {
        let mesh = grid_surface(Point2::new(3.0, 3.0), Point2::new(3.0, 3.0), 0.0, 5.0, 256).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = grid_surface(Point2::new(1.0, 0.0), Point2::new(0.0, 1.0), 0.0, 5.0, 256);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
