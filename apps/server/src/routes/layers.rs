// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoJSON to render layer endpoint.

use crate::error::ApiError;
use crate::types::ToLayersRequest;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Sets the flag when dropped. The handler future is dropped when the
/// timeout fires or the client goes away, which stops the blocking batch
/// at its next collection.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// POST /toLayers - Convert GeoJSON collections into layers.
///
/// The pipeline is CPU-bound, so it runs on the blocking pool together
/// with response serialization.
pub async fn to_layers(
    State(state): State<AppState>,
    payload: Result<Json<ToLayersRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected /toLayers body");
        ApiError::from_rejection(rejection, state.config.max_body_size_mb)
    })?;

    let geojsons = request
        .geojsons
        .ok_or_else(|| ApiError::InvalidRequest("`geojsons` must be a list of GeoJSON objects".into()))?;

    let start = Instant::now();
    let collections = geojsons.len();
    let generator = Arc::clone(&state.generator);
    let mode = state.config.batch_mode();
    let cancel = Arc::new(AtomicBool::new(false));
    let _cancel_on_drop = CancelOnDrop(Arc::clone(&cancel));

    tracing::info!(collections, mode = ?mode, "Processing /toLayers request");

    let body = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let response = geolayers_processing::run_batch(geojsons, generator.as_ref(), mode, &cancel)?;
        Ok(serde_json::to_vec(&response)?)
    })
    .await??;

    tracing::info!(
        collections,
        bytes = body.len(),
        total_ms = start.elapsed().as_millis() as u64,
        "Layers ready"
    );

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
