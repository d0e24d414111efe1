// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint triangulation on top of earcutr.
//!
//! Rings are open (no closing duplicate). Returned indices address the outer
//! ring followed by each hole in order, and every triangle winds
//! counter-clockwise in the XY plane whatever the input ring orientation.

use crate::{Error, Point2, Result};
use geolayers_core::LineString;

/// Turns smaller than this are treated as collinear
const COLLINEAR_EPSILON: f64 = 1e-10;

/// Open ring vertices of a GeoJSON ring.
pub fn ring_points(ring: &LineString<f64>) -> Vec<Point2<f64>> {
    let mut points: Vec<Point2<f64>> = ring.coords().map(|c| Point2::new(c.x, c.y)).collect();

    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    points
}

/// Twice the signed area of a ring; positive for counter-clockwise.
#[inline]
pub fn signed_area2(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let p = &points[i];
            let q = &points[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum()
}

/// Triangulate an outer ring with optional holes.
///
/// Hole-free convex rings (most building footprints) are fanned from the
/// first vertex; everything else goes through earcut.
pub fn triangulate_footprint(outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::TriangulationError(format!(
            "outer ring has {} vertices, need at least 3",
            outer.len()
        )));
    }

    let mut flat = Vec::with_capacity(2 * (outer.len() + holes.iter().map(Vec::len).sum::<usize>()));
    let mut hole_starts = Vec::with_capacity(holes.len());
    for (ring_index, ring) in std::iter::once(outer).chain(holes.iter().map(Vec::as_slice)).enumerate() {
        if ring_index > 0 {
            hole_starts.push(flat.len() / 2);
        }
        flat.extend(ring.iter().flat_map(|p| [p.x, p.y]));
    }

    let mut indices = if holes.is_empty() && turns_one_way(outer) {
        (1..outer.len() - 1).flat_map(|i| [0, i, i + 1]).collect()
    } else {
        earcutr::earcut(&flat, &hole_starts, 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?
    };

    wind_counter_clockwise(&flat, &mut indices);
    Ok(indices)
}

/// True when every non-degenerate corner turns the same way.
fn turns_one_way(ring: &[Point2<f64>]) -> bool {
    let n = ring.len();
    let mut turns = (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            let c = ring[(i + 2) % n];
            (b - a).perp(&(c - b))
        })
        .filter(|cross| cross.abs() > COLLINEAR_EPSILON);

    match turns.next() {
        Some(first) => turns.all(|cross| cross.signum() == first.signum()),
        None => false,
    }
}

/// Swap the last two corners of every clockwise triangle in `flat` (x, y pairs).
fn wind_counter_clockwise(flat: &[f64], indices: &mut [usize]) {
    let at = |i: usize| (flat[2 * i], flat[2 * i + 1]);

    for tri in indices.chunks_exact_mut(3) {
        let (a, b, c) = (at(tri[0]), at(tri[1]), at(tri[2]));
        let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
        if cross < 0.0 {
            tri.swap(1, 2);
        }
    }
}
