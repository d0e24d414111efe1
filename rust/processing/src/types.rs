// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire types of the `/toLayers` response.

use crate::mesh_builder::MeshObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-vertex values of one column, wrapped in a single timestep.
pub type Timesteps = Vec<Vec<Value>>;

/// Client rendering primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    #[serde(rename = "BUILDINGS_LAYER")]
    Buildings,
    #[serde(rename = "TRIANGLES_3D_LAYER")]
    Triangles3d,
}

/// Shader passes requested for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderStyle {
    SmoothColor,
    SmoothColorMap,
    SmoothColorMapTex,
    Picking,
}

/// A renderable layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub render_style: Vec<RenderStyle>,
    pub style_key: String,
    pub data: MeshObject,
}

/// Attribute values aligned to a layer's vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedAttributeSet {
    /// Same id as the layer it annotates
    pub id: String,
    /// Projected column names
    pub incoming_id: Vec<String>,
    /// `in_values[k][0]` holds column `incoming_id[k]`, one value per vertex
    pub in_values: Vec<Timesteps>,
}

impl JoinedAttributeSet {
    /// Per-vertex values of `column`, if it was projected.
    pub fn column(&self, column: &str) -> Option<&[Value]> {
        let k = self.incoming_id.iter().position(|c| c == column)?;
        self.in_values.get(k)?.first().map(Vec::as_slice)
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.incoming_id.is_empty()
    }
}

/// A collection that was skipped in partial mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionError {
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Response body: layers and attribute sets, index-aligned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayersResponse {
    pub layers: Vec<RenderLayer>,
    pub joined_jsons: Vec<JoinedAttributeSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CollectionError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(LayerType::Triangles3d).unwrap(),
            json!("TRIANGLES_3D_LAYER")
        );
        assert_eq!(
            serde_json::to_value(LayerType::Buildings).unwrap(),
            json!("BUILDINGS_LAYER")
        );
        assert_eq!(
            serde_json::to_value(RenderStyle::SmoothColorMapTex).unwrap(),
            json!("SMOOTH_COLOR_MAP_TEX")
        );
        assert_eq!(serde_json::to_value(RenderStyle::Picking).unwrap(), json!("PICKING"));
    }

    #[test]
    fn test_layer_field_names() {
        let layer = RenderLayer {
            id: "layer0".to_string(),
            layer_type: LayerType::Triangles3d,
            render_style: vec![RenderStyle::SmoothColor],
            style_key: "surface".to_string(),
            data: MeshObject::default(),
        };

        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "TRIANGLES_3D_LAYER");
        assert_eq!(json["renderStyle"], json!(["SMOOTH_COLOR"]));
        assert_eq!(json["styleKey"], "surface");
        assert_eq!(json["data"], json!([]));
    }

    #[test]
    fn test_empty_response_omits_errors() {
        let json = serde_json::to_value(LayersResponse::default()).unwrap();
        assert_eq!(json, json!({"layers": [], "joinedJsons": []}));
    }

    #[test]
    fn test_attribute_column_lookup() {
        let set = JoinedAttributeSet {
            id: "layer0".to_string(),
            incoming_id: vec!["height".to_string()],
            in_values: vec![vec![vec![json!(10), json!(10)]]],
        };

        assert_eq!(set.column("height"), Some(&[json!(10), json!(10)][..]));
        assert!(set.column("name").is_none());
        assert!(set.has_attributes());

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["incomingId"], json!(["height"]));
        assert_eq!(json["inValues"], json!([[[10, 10]]]));
    }
}
