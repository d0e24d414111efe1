//! GeoLayers Geometry
//!
//! Mesh generation for urban GeoJSON layers using earcutr triangulation
//! and nalgebra for vertex math. Three entry points are exposed through
//! [`MeshGenerator`]: extruded buildings, a gridded ground surface and flat
//! per-row polygons.

pub mod error;
pub mod extrusion;
pub mod generator;
pub mod mesh;
pub mod surface;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use error::{Error, Result};
pub use extrusion::{extrude_footprint, Footprint};
pub use generator::{MeshGenerator, UrbanMesher, DEFAULT_BUILDING_HEIGHT, MAX_GRID_CELLS};
pub use mesh::{Mesh, MeshEntry, MeshGeometry};
pub use surface::{grid_surface, BoundingBox};
pub use triangulation::triangulate_footprint;
