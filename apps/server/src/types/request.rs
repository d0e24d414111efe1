// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /toLayers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToLayersRequest {
    /// GeoJSON FeatureCollections, one layer each. Absent and `null` are
    /// both rejected by the handler.
    #[serde(default)]
    pub geojsons: Option<Vec<Value>>,
}
