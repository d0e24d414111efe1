// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch orchestration: GeoJSON collections in, layers out.

use crate::assembler::{assemble, layer_name};
use crate::error::{BatchError, Error, Result};
use crate::mesh_builder::build_mesh;
use crate::projector::project_attributes;
use crate::types::{CollectionError, JoinedAttributeSet, LayersResponse, RenderLayer};
use geolayers_core::{crs, LayerKind, TabularGeometrySet};
use geolayers_geometry::MeshGenerator;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// What to do when one collection of a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// The first failure aborts the whole batch
    #[default]
    Strict,
    /// Failed collections are skipped and listed in `errors`
    Partial,
}

/// Turn one GeoJSON collection into its layer and attribute set.
pub fn process_collection(
    index: usize,
    geojson: Value,
    generator: &dyn MeshGenerator,
) -> Result<(RenderLayer, JoinedAttributeSet)> {
    let mut table = TabularGeometrySet::from_json_value(geojson)?;

    let kind = LayerKind::classify(&table);
    kind.validate(&table)?;
    crs::normalize(&mut table, kind)?;

    let id = layer_name(&table, index);
    let mesh = build_mesh(kind, &table, generator)?;
    let joined = project_attributes(&id, kind, &table, &mesh)?;

    tracing::debug!(
        index,
        layer = %id,
        kind = %kind,
        rows = table.len(),
        entries = mesh.len(),
        columns = joined.incoming_id.len(),
        "Processed collection"
    );

    let layer = assemble(id, kind, joined.has_attributes(), mesh);
    Ok((layer, joined))
}

/// Process a batch in request order.
pub fn to_layers(
    geojsons: Vec<Value>,
    generator: &dyn MeshGenerator,
    mode: BatchMode,
) -> std::result::Result<LayersResponse, BatchError> {
    run_batch(geojsons, generator, mode, &AtomicBool::new(false))
}

/// Like [`to_layers`], but stops before the next collection once `cancel`
/// is set. A cancelled batch fails in either mode.
pub fn run_batch(
    geojsons: Vec<Value>,
    generator: &dyn MeshGenerator,
    mode: BatchMode,
    cancel: &AtomicBool,
) -> std::result::Result<LayersResponse, BatchError> {
    let start = Instant::now();
    let total = geojsons.len();
    let mut response = LayersResponse {
        layers: Vec::with_capacity(total),
        joined_jsons: Vec::with_capacity(total),
        errors: Vec::new(),
    };

    for (index, geojson) in geojsons.into_iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            tracing::warn!(index, collections = total, "Batch cancelled");
            return Err(BatchError::new(index, Error::Cancelled));
        }

        match process_collection(index, geojson, generator) {
            Ok((layer, joined)) => {
                response.layers.push(layer);
                response.joined_jsons.push(joined);
            }
            Err(err) if mode == BatchMode::Partial => {
                tracing::warn!(index, code = err.code(), error = %err, "Skipping collection");
                response.errors.push(CollectionError {
                    index,
                    code: err.code().to_string(),
                    message: err.to_string(),
                });
            }
            Err(err) => {
                tracing::warn!(index, code = err.code(), error = %err, "Collection failed, aborting batch");
                return Err(BatchError::new(index, err));
            }
        }
    }

    tracing::info!(
        collections = total,
        layers = response.layers.len(),
        failed = response.errors.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Built layers"
    );

    Ok(response)
}
