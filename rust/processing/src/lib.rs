// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoJSON → render layer pipeline shared by the HTTP server and tests.
//!
//! Each collection goes through the same stages:
//!
//! 1. build a [`TabularGeometrySet`](geolayers_core::TabularGeometrySet)
//! 2. classify it into a [`LayerKind`](geolayers_core::LayerKind)
//! 3. normalize its CRS
//! 4. mesh it through a [`MeshGenerator`](geolayers_geometry::MeshGenerator)
//! 5. project attribute columns onto the mesh vertices
//! 6. assemble the [`RenderLayer`] and [`JoinedAttributeSet`]

pub mod assembler;
pub mod error;
pub mod mesh_builder;
pub mod pipeline;
pub mod projector;
pub mod types;

pub use error::{BatchError, Error, Result};
pub use mesh_builder::{build_mesh, MeshObject, EXTRUSION_DETAIL};
pub use pipeline::{process_collection, run_batch, to_layers, BatchMode};
pub use projector::{project_attributes, vertex_spans, VertexSpan};
pub use types::{
    CollectionError, JoinedAttributeSet, LayerType, LayersResponse, RenderLayer, RenderStyle,
};
