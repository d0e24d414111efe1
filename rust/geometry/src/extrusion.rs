// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting building footprints to 3D meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::triangulation::{ring_points, signed_area2, triangulate_footprint};
use geolayers_core::Polygon;
use nalgebra::{Point2, Point3, Vector3};

/// Upper bound on wall subdivisions along either axis
const MAX_WALL_SEGMENTS: usize = 64;

/// A projected polygon ready for extrusion (meters).
#[derive(Debug, Clone)]
pub struct Footprint {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Footprint {
    /// Open rings of a polygon already in meters.
    ///
    /// Holes with fewer than three distinct vertices are ignored.
    pub fn from_polygon(polygon: &Polygon<f64>) -> Result<Self> {
        let outer = ring_points(polygon.exterior());
        if outer.len() < 3 {
            return Err(Error::InvalidFootprint(format!(
                "exterior ring has {} distinct vertices, need at least 3",
                outer.len()
            )));
        }

        let holes = polygon
            .interiors()
            .iter()
            .map(ring_points)
            .filter(|hole| hole.len() >= 3)
            .collect();

        Ok(Self { outer, holes })
    }

    /// Outer ring followed by all holes, as indexed by the triangulation.
    pub fn all_points(&self) -> Vec<Point2<f64>> {
        let mut points = self.outer.clone();
        for hole in &self.holes {
            points.extend_from_slice(hole);
        }
        points
    }

    /// Triangulate the footprint with counter-clockwise triangles.
    pub fn triangulate(&self) -> Result<(Vec<Point2<f64>>, Vec<usize>)> {
        let indices = triangulate_footprint(&self.outer, &self.holes)?;
        Ok((self.all_points(), indices))
    }
}

/// Extrude a footprint between `min_height` and `height`.
///
/// Produces a roof cap, subdivided side walls (cells no larger than
/// `detail` meters) and, for floating parts (`min_height > 0`), a floor cap.
pub fn extrude_footprint(
    footprint: &Footprint,
    min_height: f64,
    height: f64,
    detail: f64,
) -> Result<Mesh> {
    if !(detail > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "detail must be positive, got {detail}"
        )));
    }

    if !(height > min_height) {
        return Err(Error::InvalidExtrusion(format!(
            "height {height} must exceed min_height {min_height}"
        )));
    }

    let (points, indices) = footprint.triangulate()?;

    let mut mesh = Mesh::with_capacity(points.len() * 2, indices.len() * 2);

    create_cap_mesh(&points, &indices, height, Vector3::new(0.0, 0.0, 1.0), &mut mesh);
    if min_height > 0.0 {
        create_cap_mesh(&points, &indices, min_height, Vector3::new(0.0, 0.0, -1.0), &mut mesh);
    }

    create_side_walls(&footprint.outer, false, min_height, height, detail, &mut mesh);
    for hole in &footprint.holes {
        create_side_walls(hole, true, min_height, height, detail, &mut mesh);
    }

    Ok(mesh)
}

/// Flat cap at height `z`. Triangles arrive counter-clockwise; a downward
/// normal flips the winding.
#[inline]
fn create_cap_mesh(points: &[Point2<f64>], indices: &[usize], z: f64, normal: Vector3<f64>, mesh: &mut Mesh) {
    let base_index = mesh.vertex_count() as u32;

    for point in points {
        mesh.add_vertex(Point3::new(point.x, point.y, z), normal);
    }

    for tri in indices.chunks_exact(3) {
        let i0 = base_index + tri[0] as u32;
        let i1 = base_index + tri[1] as u32;
        let i2 = base_index + tri[2] as u32;

        if normal.z < 0.0 {
            mesh.add_triangle(i0, i2, i1);
        } else {
            mesh.add_triangle(i0, i1, i2);
        }
    }
}

/// Side walls for one ring, each edge a grid of `detail`-sized cells.
#[inline]
fn create_side_walls(
    ring: &[Point2<f64>],
    is_hole: bool,
    min_height: f64,
    height: f64,
    detail: f64,
    mesh: &mut Mesh,
) {
    // Walls face away from the solid: outward for the exterior, into the hole for holes
    let counter_clockwise = signed_area2(ring) > 0.0;
    let outward = if counter_clockwise != is_hole { 1.0 } else { -1.0 };

    let wall_height = height - min_height;
    let rows = segments(wall_height, detail);

    for i in 0..ring.len() {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % ring.len()];

        let edge = p1 - p0;
        // Skip degenerate edges (duplicate consecutive points)
        let normal = match Vector3::new(edge.y, -edge.x, 0.0).try_normalize(1e-10) {
            Some(n) => n * outward,
            None => continue,
        };

        let columns = segments(edge.norm(), detail);
        let base_index = mesh.vertex_count() as u32;

        for v in 0..=rows {
            let z = min_height + wall_height * v as f64 / rows as f64;
            for u in 0..=columns {
                let p = p0 + edge * (u as f64 / columns as f64);
                mesh.add_vertex(Point3::new(p.x, p.y, z), normal);
            }
        }

        let stride = columns as u32 + 1;
        for v in 0..rows as u32 {
            for u in 0..columns as u32 {
                let a = base_index + v * stride + u;
                let b = a + 1;
                let c = b + stride;
                let d = a + stride;

                if outward > 0.0 {
                    mesh.add_triangle(a, b, c);
                    mesh.add_triangle(a, c, d);
                } else {
                    mesh.add_triangle(a, c, b);
                    mesh.add_triangle(a, d, c);
                }
            }
        }
    }
}

#[inline]
fn segments(length: f64, detail: f64) -> usize {
    ((length / detail).ceil() as usize).clamp(1, MAX_WALL_SEGMENTS)
}
