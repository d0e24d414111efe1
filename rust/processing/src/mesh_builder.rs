// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kind-dependent mesh generation.

use crate::error::{Error, Result};
use geolayers_core::{Geometry, LayerKind, TabularGeometrySet};
use geolayers_geometry::{BoundingBox, MeshEntry, MeshGenerator};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Extrusion / grid detail passed to every generator call (meters)
pub const EXTRUSION_DETAIL: f64 = 5.0;

/// Ground surfaces sit just below building floors
pub const SURFACE_ELEVATION: f64 = -1.0;

/// Ordered mesh entries of one layer, addressed by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshObject {
    entries: Vec<MeshEntry>,
}

impl MeshObject {
    pub fn new(entries: Vec<MeshEntry>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&MeshEntry> {
        self.entries.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshEntry> {
        self.entries.iter()
    }

    /// Total vertices across all entries.
    pub fn vertex_count(&self) -> usize {
        self.entries.iter().map(MeshEntry::vertex_count).sum()
    }

    pub fn into_entries(self) -> Vec<MeshEntry> {
        self.entries
    }
}

impl Index<usize> for MeshObject {
    type Output = MeshEntry;

    fn index(&self, index: usize) -> &MeshEntry {
        &self.entries[index]
    }
}

/// Run the generator operation that matches `kind`.
pub fn build_mesh(
    kind: LayerKind,
    table: &TabularGeometrySet,
    generator: &dyn MeshGenerator,
) -> Result<MeshObject> {
    let entries = match kind {
        LayerKind::Buildings => generator.mesh_from_buildings(table, EXTRUSION_DETAIL)?,
        LayerKind::Surface => {
            let bbox = surface_bounds(table)?;
            generator.create_surface_mesh(bbox, true, SURFACE_ELEVATION, EXTRUSION_DETAIL)?
        }
        LayerKind::Generic => generator.mesh_from_table(table)?,
    };

    let mesh = MeshObject::new(entries);
    tracing::debug!(
        kind = %kind,
        entries = mesh.len(),
        vertices = mesh.vertex_count(),
        "Built mesh"
    );

    Ok(mesh)
}

/// Bounds of the first row's exterior ring.
///
/// Only the first polygon is considered; for a MultiPolygon that is its
/// first member.
pub fn surface_bounds(table: &TabularGeometrySet) -> Result<BoundingBox> {
    let first = table
        .row(0)
        .ok_or_else(|| Error::Geometry("surface layer has no features".to_string()))?;

    let exterior = match &first.geometry {
        Geometry::Polygon(polygon) => polygon.exterior(),
        Geometry::MultiPolygon(multi) => multi
            .0
            .first()
            .map(|polygon| polygon.exterior())
            .ok_or_else(|| Error::Geometry("surface MultiPolygon is empty".to_string()))?,
        _ => {
            return Err(Error::Geometry(
                "surface geometry must be a Polygon or MultiPolygon".to_string(),
            ))
        }
    };

    BoundingBox::from_coords(exterior.coords().copied())
        .ok_or_else(|| Error::Geometry("surface polygon has an empty exterior ring".to_string()))
}
